// src/repositorio/banco.rs

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::RepoError;
use crate::admin::admin_structs::Configuracoes;
use crate::produtos::produtos_structs::Produto;
use crate::shared::shared_structs::Situacao;
use crate::usuarios::usuario_structs::{normalizar_email, Conta, Papel};
use crate::vendas::vendas_structs::{ItemPedido, Pedido, PedidoValido};

const IMAGEM_PADRAO: &str = "https://images.unsplash.com/photo-1581094794329-c8112a89af12?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80";

/// Conteúdo completo da loja. É o que o repositório em memória guarda
/// e o que vai para o arquivo JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banco {
    pub users: Vec<Conta>,
    pub products: Vec<Produto>,
    pub categories: Vec<String>,
    pub orders: Vec<Pedido>,
    #[serde(default)]
    pub settings: Configuracoes,
}

/// Próximo id no estilo max(existente) + 1.
pub fn proximo_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().unwrap_or(0) + 1
}

/// Confere todos os itens do pedido contra os produtos e monta os itens com preço congelado.
/// Não altera nada: quem chama só baixa o estoque se isto devolver `Ok`.
pub fn montar_itens<'a>(
    pedido: &PedidoValido,
    buscar: impl Fn(i32) -> Option<&'a Produto>,
) -> Result<Vec<ItemPedido>, RepoError> {
    for (produto_id, quantidade) in pedido.quantidades_por_produto() {
        let produto = buscar(produto_id)
            .filter(|p| p.ativo())
            .ok_or(RepoError::ProdutoIndisponivel(produto_id))?;
        if produto.stock < quantidade {
            return Err(RepoError::EstoqueInsuficiente {
                produto: produto.name.clone(),
                disponivel: produto.stock,
                solicitado: quantidade,
            });
        }
    }

    pedido
        .items
        .iter()
        .map(|item| {
            let produto = buscar(item.product_id).ok_or(RepoError::ProdutoIndisponivel(item.product_id))?;
            Ok(ItemPedido {
                product_id: produto.id,
                quantity: item.quantity,
                name: produto.name.clone(),
                unit_price: produto.price.clone(),
            })
        })
        .collect()
}

/// Dados com que a loja começa: administrador, catálogo inicial, categorias e configurações.
pub fn dados_iniciais(admin_email: &str, admin_password_hash: String) -> Banco {
    let agora = Utc::now();

    let admin = Conta {
        id: 1,
        name: "Administrador".to_string(),
        email: normalizar_email(admin_email),
        password_hash: admin_password_hash,
        role: Papel::Admin,
        phone: None,
        company: None,
        address: None,
        status: Situacao::Ativo,
        created_at: agora,
    };

    let produto = |id: i32, name: &str, category: &str, price: &str, stock: i32, description: &str, specs: &[&str], featured: bool| Produto {
        id,
        name: name.to_string(),
        category: category.to_string(),
        price: BigDecimal::from_str(price).unwrap_or_else(|_| BigDecimal::from(0)),
        stock,
        description: description.to_string(),
        specifications: specs.iter().map(|s| s.to_string()).collect(),
        image: Some(IMAGEM_PADRAO.to_string()),
        images: vec![],
        status: Situacao::Ativo,
        featured,
        created_at: agora,
        updated_at: agora,
    };

    let products = vec![
        produto(
            1,
            "Motor Elétrico Trifásico 10HP",
            "Motores",
            "2850.00",
            15,
            "Motor de alta eficiência para aplicações industriais.",
            &["10 HP", "220/380V", "1750 RPM", "Proteção IP55"],
            true,
        ),
        produto(
            2,
            "Gerador de Energia 50kVA",
            "Geradores",
            "12500.00",
            8,
            "Gerador elétrico para standby ou uso contínuo.",
            &["50 kVA", "Trifásico", "Silencioso", "Painel digital"],
            true,
        ),
        produto(
            3,
            "Transformador Industrial 100kVA",
            "Transformadores",
            "8750.00",
            5,
            "Transformador de alta potência para distribuição.",
            &["100 kVA", "Alta eficiência", "Resfriamento a óleo"],
            false,
        ),
    ];

    let categories = ["Motores", "Geradores", "Transformadores", "Compressores", "Ferramentas"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    Banco {
        users: vec![admin],
        products,
        categories,
        orders: vec![],
        settings: Configuracoes::default(),
    }
}
