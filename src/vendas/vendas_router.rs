// src/vendas/vendas_router.rs

use actix_web::{get, post, put, web, HttpResponse};
use serde_json::json;

use super::vendas_structs::{AtualizacaoPedido, NovoPedido, VendaResponse};
use crate::erros::AppError;
use crate::usuarios::auth_middleware::ContaEquipe;
use crate::AppState;

/// Rota para realizar um pedido.
///
/// A conferência de estoque e a baixa acontecem juntas dentro do repositório:
/// 1. Cada produto precisa existir, estar ativo e ter estoque para a soma das quantidades pedidas.
/// 2. Se qualquer item falhar, nada é alterado e a resposta é 400.
/// 3. Caso contrário o estoque é baixado e o pedido gravado com os totais calculados
///    a partir das configurações de frete.
#[post("/api/orders")]
pub async fn realizar_venda(
    data: web::Data<AppState>,
    pedido: web::Json<NovoPedido>,
) -> Result<HttpResponse, AppError> {
    let pedido = pedido.into_inner().validar().map_err(AppError::Validacao)?;

    let order = data.repo.criar_pedido(pedido).await.map_err(|e| {
        if e.eh_erro_de_cliente() {
            tracing::info!(motivo = %e, "Pedido recusado");
        }
        e
    })?;
    tracing::info!(
        pedido_id = order.id,
        numero = %order.order_number,
        total = %order.total,
        "Pedido criado"
    );

    Ok(HttpResponse::Created().json(VendaResponse {
        success: true,
        order,
    }))
}

/// Todos os pedidos, do mais recente para o mais antigo.
#[get("/api/admin/orders")]
pub async fn listar_pedidos(
    _equipe: ContaEquipe,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(data.repo.listar_pedidos().await?))
}

/// Atualiza status, status de pagamento e observações de um pedido.
#[put("/api/admin/orders/{id}")]
pub async fn atualizar_pedido(
    ContaEquipe(usuario): ContaEquipe,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    alteracoes: web::Json<AtualizacaoPedido>,
) -> Result<HttpResponse, AppError> {
    let order = data
        .repo
        .atualizar_pedido(path.into_inner(), alteracoes.into_inner())
        .await?
        .ok_or_else(|| AppError::NaoEncontrado("Pedido não encontrado".into()))?;
    tracing::info!(
        pedido_id = order.id,
        status = order.status.as_str(),
        usuario = %usuario.user_email,
        "Pedido atualizado"
    );

    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}
