// src/categorias/categoria_structs.rs

use serde::Deserialize;

/// Corpo de `POST /api/admin/categories`.
#[derive(Deserialize)]
pub struct NovaCategoria {
    pub name: Option<String>,
}

impl NovaCategoria {
    pub fn validar(self) -> Result<String, String> {
        self.name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "Nome da categoria é obrigatório".to_string())
    }
}
