// src/usuarios/mod.rs

// Declara o submódulo que contém as definições das structs de usuários
pub mod usuario_structs;
// Declara o submódulo que contém as funções de rota relacionadas a usuários
pub mod usuario_router;
// Extratores de autenticação (Bearer JWT + papel)
pub mod auth_middleware;
// Geração e validação dos tokens
pub mod token;
