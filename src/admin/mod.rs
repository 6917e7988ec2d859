// src/admin/mod.rs

pub mod admin_router;
pub mod admin_structs;
