// src/vendas/vendas_structs.rs

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::admin_structs::Configuracoes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPedido {
    #[default]
    Pendente,
    Processando,
    Enviado,
    Entregue,
    Cancelado,
}

impl StatusPedido {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPedido::Pendente => "pendente",
            StatusPedido::Processando => "processando",
            StatusPedido::Enviado => "enviado",
            StatusPedido::Entregue => "entregue",
            StatusPedido::Cancelado => "cancelado",
        }
    }
}

impl std::str::FromStr for StatusPedido {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(StatusPedido::Pendente),
            "processando" => Ok(StatusPedido::Processando),
            "enviado" => Ok(StatusPedido::Enviado),
            "entregue" => Ok(StatusPedido::Entregue),
            "cancelado" => Ok(StatusPedido::Cancelado),
            _ => Err(format!("Status de pedido desconhecido: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPagamento {
    #[default]
    Pendente,
    Pago,
    Reembolsado,
}

impl StatusPagamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPagamento::Pendente => "pendente",
            StatusPagamento::Pago => "pago",
            StatusPagamento::Reembolsado => "reembolsado",
        }
    }
}

impl std::str::FromStr for StatusPagamento {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(StatusPagamento::Pendente),
            "pago" => Ok(StatusPagamento::Pago),
            "reembolsado" => Ok(StatusPagamento::Reembolsado),
            _ => Err(format!("Status de pagamento desconhecido: {}", s)),
        }
    }
}

/// Item pedido pelo cliente.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemVenda {
    pub product_id: i32,
    pub quantity: i32,
}

/// Item gravado no pedido, com nome e preço congelados no momento da compra.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemPedido {
    pub product_id: i32,
    pub quantity: i32,
    pub name: String,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pedido {
    pub id: i32,
    pub order_number: String,
    pub client_id: i32,
    pub items: Vec<ItemPedido>,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
    #[serde(default)]
    pub status: StatusPedido,
    #[serde(default)]
    pub payment_status: StatusPagamento,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pedido {
    pub fn aplicar(&mut self, alteracoes: AtualizacaoPedido, agora: DateTime<Utc>) {
        if let Some(status) = alteracoes.status {
            self.status = status;
        }
        if let Some(payment_status) = alteracoes.payment_status {
            self.payment_status = payment_status;
        }
        if let Some(notes) = alteracoes.notes {
            self.notes = Some(notes);
        }
        self.updated_at = agora;
    }
}

/// Corpo de `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovoPedido {
    pub client_id: Option<i32>,
    #[serde(default)]
    pub items: Vec<ItemVenda>,
    pub discount: Option<BigDecimal>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Pedido validado: cliente presente, itens não vazios e quantidades positivas.
#[derive(Debug, Clone)]
pub struct PedidoValido {
    pub client_id: i32,
    pub items: Vec<ItemVenda>,
    pub discount: BigDecimal,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl NovoPedido {
    pub fn validar(self) -> Result<PedidoValido, String> {
        let client_id = self.client_id.ok_or_else(|| "clientId é obrigatório".to_string())?;
        if self.items.is_empty() {
            return Err("O pedido precisa de pelo menos um item".to_string());
        }
        if self.items.iter().any(|i| i.quantity <= 0) {
            return Err("Quantidade inválida".to_string());
        }
        // A soma por produto também precisa caber em i32.
        let mut somas: Vec<(i32, i32)> = Vec::new();
        for item in &self.items {
            match somas.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantidade)) => {
                    *quantidade = quantidade
                        .checked_add(item.quantity)
                        .ok_or_else(|| "Quantidade inválida".to_string())?;
                }
                None => somas.push((item.product_id, item.quantity)),
            }
        }
        let discount = self.discount.unwrap_or_else(|| BigDecimal::from(0));
        if discount < BigDecimal::from(0) {
            return Err("Desconto não pode ser negativo".to_string());
        }

        Ok(PedidoValido {
            client_id,
            items: self.items,
            discount,
            payment_method: self.payment_method,
            notes: self.notes,
        })
    }
}

impl PedidoValido {
    /// Soma as quantidades por produto, preservando a ordem da primeira ocorrência.
    /// Assim dois itens do mesmo produto são checados contra o estoque juntos.
    pub fn quantidades_por_produto(&self) -> Vec<(i32, i32)> {
        let mut totais: Vec<(i32, i32)> = Vec::new();
        for item in &self.items {
            match totais.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantidade)) => *quantidade = quantidade.saturating_add(item.quantity),
                None => totais.push((item.product_id, item.quantity)),
            }
        }
        totais
    }
}

/// Corpo de `PUT /api/admin/orders/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtualizacaoPedido {
    pub status: Option<StatusPedido>,
    pub payment_status: Option<StatusPagamento>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totais {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
}

/// Subtotal dos itens, desconto limitado ao subtotal e frete grátis a partir do limite configurado.
pub fn calcular_totais(itens: &[ItemPedido], desconto: &BigDecimal, config: &Configuracoes) -> Totais {
    let subtotal = itens.iter().fold(BigDecimal::from(0), |acc, item| {
        acc + &item.unit_price * BigDecimal::from(item.quantity)
    });

    let discount = if *desconto > subtotal {
        subtotal.clone()
    } else {
        desconto.clone()
    };

    let shipping = if subtotal >= config.free_shipping_threshold {
        BigDecimal::from(0)
    } else {
        config.shipping_cost.clone()
    };

    let total = &subtotal - &discount + &shipping;

    Totais {
        subtotal,
        discount,
        shipping,
        total,
    }
}

/// Número do pedido: sufixo do timestamp em milissegundos mais o id.
pub fn numero_pedido(id: i32, agora: DateTime<Utc>) -> String {
    let millis = agora.timestamp_millis().to_string();
    let sufixo = &millis[millis.len().saturating_sub(8)..];
    format!("PED{}-{}", sufixo, id)
}

/// Resposta de `POST /api/orders`.
#[derive(Debug, Serialize)]
pub struct VendaResponse {
    pub success: bool,
    pub order: Pedido,
}
