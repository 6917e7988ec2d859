// src/shared/mod.rs

// Corpo de erro e situação dos registros, usados por todos os módulos
pub mod shared_structs;
