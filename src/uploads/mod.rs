// src/uploads/mod.rs

pub mod armazenamento;
pub mod upload_router;
