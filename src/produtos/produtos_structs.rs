// src/produtos/produtos_structs.rs

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::shared_structs::Situacao;

/// Abaixo deste estoque o produto conta como "estoque baixo" no painel.
pub const LIMITE_ESTOQUE_BAIXO: i32 = 5;

/// Produto do catálogo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Produto {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
    pub stock: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specifications: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: Situacao,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Produto {
    pub fn ativo(&self) -> bool {
        self.status == Situacao::Ativo
    }

    /// Aplica apenas os campos presentes na atualização e renova `updated_at`.
    pub fn aplicar(&mut self, alteracoes: AtualizacaoProduto, agora: DateTime<Utc>) {
        if let Some(name) = alteracoes.name {
            self.name = name.trim().to_string();
        }
        if let Some(category) = alteracoes.category {
            self.category = category.trim().to_string();
        }
        if let Some(price) = alteracoes.price {
            self.price = price;
        }
        if let Some(stock) = alteracoes.stock {
            self.stock = stock;
        }
        if let Some(description) = alteracoes.description {
            self.description = description;
        }
        if let Some(specifications) = alteracoes.specifications {
            self.specifications = specifications;
        }
        // `image: ""` remove a imagem principal.
        if let Some(image) = alteracoes.image {
            let image = image.trim();
            self.image = (!image.is_empty()).then(|| image.to_string());
        }
        if let Some(images) = alteracoes.images {
            self.images = images;
        }
        if let Some(status) = alteracoes.status {
            self.status = status;
        }
        if let Some(featured) = alteracoes.featured {
            self.featured = featured;
        }
        self.updated_at = agora;
    }

    /// Acrescenta imagens enviadas; a primeira vira a imagem principal se ainda não houver uma.
    pub fn anexar_imagens(&mut self, caminhos: Vec<String>, agora: DateTime<Utc>) {
        if self.image.is_none() {
            self.image = caminhos.first().cloned();
        }
        self.images.extend(caminhos);
        self.updated_at = agora;
    }
}

/// Corpo de `POST /api/admin/products`.
#[derive(Debug, Clone, Deserialize)]
pub struct NovoProduto {
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specifications: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: Situacao,
    #[serde(default)]
    pub featured: bool,
}

impl NovoProduto {
    pub fn validar(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.category.trim().is_empty() {
            return Err("Nome e categoria são obrigatórios".to_string());
        }
        validar_preco_e_estoque(Some(&self.price), Some(self.stock))
    }

    pub fn em_produto(self, id: i32, agora: DateTime<Utc>) -> Produto {
        Produto {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            price: self.price,
            stock: self.stock,
            description: self.description,
            specifications: self.specifications,
            image: self.image,
            images: self.images,
            status: self.status,
            featured: self.featured,
            created_at: agora,
            updated_at: agora,
        }
    }
}

/// Corpo de `PUT /api/admin/products/{id}`.
/// Só estes campos podem ser alterados; chaves desconhecidas são ignoradas.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AtualizacaoProduto {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<BigDecimal>,
    pub stock: Option<i32>,
    pub description: Option<String>,
    pub specifications: Option<Vec<String>>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub status: Option<Situacao>,
    pub featured: Option<bool>,
}

impl AtualizacaoProduto {
    pub fn validar(&self) -> Result<(), String> {
        let vazio = |v: &Option<String>| v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(false);
        if vazio(&self.name) || vazio(&self.category) {
            return Err("Nome e categoria não podem ficar vazios".to_string());
        }
        validar_preco_e_estoque(self.price.as_ref(), self.stock)
    }
}

fn validar_preco_e_estoque(price: Option<&BigDecimal>, stock: Option<i32>) -> Result<(), String> {
    if matches!(price, Some(p) if *p < BigDecimal::from(0)) {
        return Err("Preço não pode ser negativo".to_string());
    }
    if matches!(stock, Some(s) if s < 0) {
        return Err("Estoque não pode ser negativo".to_string());
    }
    Ok(())
}

/// Filtros de `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct FiltroProdutos {
    pub search: Option<String>,
    pub category: Option<String>,
    pub featured: Option<String>,
}

impl FiltroProdutos {
    /// Mantém só produtos ativos e aplica categoria, destaque e busca textual.
    /// A ordem de inserção é preservada.
    pub fn aplicar(&self, produtos: Vec<Produto>) -> Vec<Produto> {
        let busca = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let category = self.category.as_deref().filter(|c| !c.is_empty());
        let somente_destaques = self.featured.as_deref() == Some("true");

        produtos
            .into_iter()
            .filter(Produto::ativo)
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| !somente_destaques || p.featured)
            .filter(|p| {
                busca.as_deref().map_or(true, |termo| {
                    p.name.to_lowercase().contains(termo)
                        || p.description.to_lowercase().contains(termo)
                })
            })
            .collect()
    }
}
