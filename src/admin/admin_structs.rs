// src/admin/admin_structs.rs

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::produtos::produtos_structs::{Produto, LIMITE_ESTOQUE_BAIXO};
use crate::usuarios::usuario_structs::ContaPublica;
use crate::vendas::vendas_structs::{Pedido, StatusPedido};

/// Configurações da empresa (registro único).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuracoes {
    pub company_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub free_shipping_threshold: BigDecimal,
    pub shipping_cost: BigDecimal,
}

impl Default for Configuracoes {
    fn default() -> Self {
        Configuracoes {
            company_name: "EletroMáquinas".to_string(),
            email: "contato@eletromaquinas.com".to_string(),
            phone: "(11) 4000-1234".to_string(),
            address: "Av. Industrial, 1000 - São Paulo/SP".to_string(),
            free_shipping_threshold: BigDecimal::from(5000),
            shipping_cost: BigDecimal::from(150),
        }
    }
}

impl Configuracoes {
    pub fn aplicar(&mut self, alteracoes: AtualizacaoConfiguracoes) {
        if let Some(company_name) = alteracoes.company_name {
            self.company_name = company_name;
        }
        if let Some(email) = alteracoes.email {
            self.email = email;
        }
        if let Some(phone) = alteracoes.phone {
            self.phone = phone;
        }
        if let Some(address) = alteracoes.address {
            self.address = address;
        }
        if let Some(limite) = alteracoes.free_shipping_threshold {
            self.free_shipping_threshold = limite;
        }
        if let Some(frete) = alteracoes.shipping_cost {
            self.shipping_cost = frete;
        }
    }
}

/// Corpo de `PUT /api/admin/settings`. Chaves fora desta lista são descartadas.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtualizacaoConfiguracoes {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub free_shipping_threshold: Option<BigDecimal>,
    pub shipping_cost: Option<BigDecimal>,
}

impl AtualizacaoConfiguracoes {
    pub fn validar(&self) -> Result<(), String> {
        let zero = BigDecimal::from(0);
        let negativo = |v: &Option<BigDecimal>| matches!(v, Some(x) if *x < zero);
        if negativo(&self.free_shipping_threshold) || negativo(&self.shipping_cost) {
            return Err("Valores de frete não podem ser negativos".to_string());
        }
        Ok(())
    }
}

/// Números do painel, recalculados a cada requisição.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estatisticas {
    pub total_products: usize,
    pub active_products: usize,
    pub total_clients: usize,
    pub total_sales: usize,
    pub total_revenue: BigDecimal,
    pub pending_orders: usize,
    pub low_stock_products: usize,
}

impl Estatisticas {
    pub fn calcular(produtos: &[Produto], total_clients: usize, pedidos: &[Pedido]) -> Self {
        let total_revenue = pedidos
            .iter()
            .filter(|p| p.status != StatusPedido::Cancelado)
            .fold(BigDecimal::from(0), |acc, p| acc + &p.total);

        Estatisticas {
            total_products: produtos.len(),
            active_products: produtos.iter().filter(|p| p.ativo()).count(),
            total_clients,
            total_sales: pedidos.len(),
            total_revenue,
            pending_orders: pedidos
                .iter()
                .filter(|p| p.status == StatusPedido::Pendente)
                .count(),
            low_stock_products: produtos
                .iter()
                .filter(|p| p.stock < LIMITE_ESTOQUE_BAIXO)
                .count(),
        }
    }
}

/// Exportação completa, sem hashes de senha.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub exported_at: DateTime<Utc>,
    pub users: Vec<ContaPublica>,
    pub products: Vec<Produto>,
    pub categories: Vec<String>,
    pub orders: Vec<Pedido>,
    pub settings: Configuracoes,
}
