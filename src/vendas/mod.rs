// src/vendas/mod.rs

pub mod vendas_router;
pub mod vendas_structs;
