// src/repositorio/mod.rs

//! Acesso aos dados da loja.
//!
//! Os handlers só conhecem o trait [`Repositorio`]; a implementação é escolhida na
//! inicialização: [`memoria::RepositorioMemoria`] (opcionalmente espelhada em um
//! arquivo JSON) ou [`postgres::RepositorioPostgres`].

use async_trait::async_trait;
use thiserror::Error;

use crate::admin::admin_structs::{AtualizacaoConfiguracoes, Configuracoes};
use crate::produtos::produtos_structs::{AtualizacaoProduto, NovoProduto, Produto};
use crate::usuarios::usuario_structs::{Conta, NovaConta, Papel};
use crate::vendas::vendas_structs::{AtualizacaoPedido, Pedido, PedidoValido};

pub mod banco;
pub mod memoria;
pub mod postgres;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Email já cadastrado")]
    EmailDuplicado,

    #[error("Categoria já cadastrada")]
    CategoriaDuplicada,

    #[error("Cliente com ID {0} não encontrado")]
    ClienteNaoEncontrado(i32),

    #[error("Produto com ID {0} não encontrado ou inativo")]
    ProdutoIndisponivel(i32),

    #[error("Estoque insuficiente para o produto {produto}. Disponível: {disponivel}, solicitado: {solicitado}")]
    EstoqueInsuficiente {
        produto: String,
        disponivel: i32,
        solicitado: i32,
    },

    #[error("Erro de E/S no armazenamento: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro de serialização: {0}")]
    Serializacao(#[from] serde_json::Error),

    #[error("Erro no banco de dados: {0}")]
    Banco(#[from] sqlx::Error),

    #[error("Registro corrompido: {0}")]
    Corrompido(String),
}

impl RepoError {
    /// Erros causados pela requisição (viram 400), não pelo servidor.
    pub fn eh_erro_de_cliente(&self) -> bool {
        matches!(
            self,
            RepoError::EmailDuplicado
                | RepoError::CategoriaDuplicada
                | RepoError::ClienteNaoEncontrado(_)
                | RepoError::ProdutoIndisponivel(_)
                | RepoError::EstoqueInsuficiente { .. }
        )
    }
}

/// Operações de armazenamento usadas pelas rotas.
///
/// Métodos de alteração que recebem um id devolvem `Ok(None)` quando o registro não existe.
#[async_trait]
pub trait Repositorio: Send + Sync {
    async fn listar_produtos(&self) -> Result<Vec<Produto>, RepoError>;
    async fn buscar_produto(&self, id: i32) -> Result<Option<Produto>, RepoError>;
    /// Insere o produto e registra a categoria se ela ainda não existir.
    async fn inserir_produto(&self, novo: NovoProduto) -> Result<Produto, RepoError>;
    async fn atualizar_produto(
        &self,
        id: i32,
        alteracoes: AtualizacaoProduto,
    ) -> Result<Option<Produto>, RepoError>;
    /// Exclusão lógica: o produto passa a `inativo`.
    async fn desativar_produto(&self, id: i32) -> Result<Option<Produto>, RepoError>;
    async fn anexar_imagens(
        &self,
        id: i32,
        caminhos: Vec<String>,
    ) -> Result<Option<Produto>, RepoError>;

    async fn listar_categorias(&self) -> Result<Vec<String>, RepoError>;
    async fn inserir_categoria(&self, nome: String) -> Result<Vec<String>, RepoError>;

    async fn buscar_conta(&self, id: i32) -> Result<Option<Conta>, RepoError>;
    /// `email` deve chegar normalizado.
    async fn buscar_conta_por_email(&self, email: &str) -> Result<Option<Conta>, RepoError>;
    async fn listar_contas(&self, papel: Option<Papel>) -> Result<Vec<Conta>, RepoError>;
    async fn inserir_conta(&self, nova: NovaConta) -> Result<Conta, RepoError>;

    /// Cria o pedido de forma atômica: todos os itens são conferidos antes de qualquer
    /// baixa de estoque, e nenhuma baixa acontece se algum item falhar.
    async fn criar_pedido(&self, pedido: PedidoValido) -> Result<Pedido, RepoError>;
    /// Pedidos do mais recente para o mais antigo.
    async fn listar_pedidos(&self) -> Result<Vec<Pedido>, RepoError>;
    async fn atualizar_pedido(
        &self,
        id: i32,
        alteracoes: AtualizacaoPedido,
    ) -> Result<Option<Pedido>, RepoError>;

    async fn configuracoes(&self) -> Result<Configuracoes, RepoError>;
    async fn atualizar_configuracoes(
        &self,
        alteracoes: AtualizacaoConfiguracoes,
    ) -> Result<Configuracoes, RepoError>;
}
