// src/repositorio/memoria.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::banco::{montar_itens, proximo_id, Banco};
use super::{RepoError, Repositorio};
use crate::admin::admin_structs::{AtualizacaoConfiguracoes, Configuracoes};
use crate::produtos::produtos_structs::{AtualizacaoProduto, NovoProduto, Produto};
use crate::shared::shared_structs::Situacao;
use crate::usuarios::usuario_structs::{Conta, NovaConta, Papel};
use crate::vendas::vendas_structs::{
    calcular_totais, numero_pedido, AtualizacaoPedido, Pedido, PedidoValido,
};

/// Repositório em memória protegido por um único `RwLock`.
///
/// Com um arquivo configurado, o banco inteiro é regravado em JSON após cada alteração,
/// ainda com o lock de escrita em mãos: escritores concorrentes ficam serializados.
pub struct RepositorioMemoria {
    banco: RwLock<Banco>,
    arquivo: Option<PathBuf>,
}

impl RepositorioMemoria {
    /// Repositório puramente em memória.
    pub fn novo(banco: Banco) -> Self {
        RepositorioMemoria {
            banco: RwLock::new(banco),
            arquivo: None,
        }
    }

    /// Carrega o banco do arquivo, ou grava `padrao` nele se ainda não existir.
    /// Um arquivo ilegível é renomeado para `<arquivo>.corrupt` e substituído pelo padrão.
    pub fn com_arquivo(caminho: impl Into<PathBuf>, padrao: Banco) -> Result<Self, RepoError> {
        let caminho = caminho.into();

        let banco = if caminho.exists() {
            match fs::read_to_string(&caminho).map(|s| serde_json::from_str::<Banco>(&s)) {
                Ok(Ok(banco)) => {
                    tracing::info!(arquivo = %caminho.display(), "Banco carregado do arquivo");
                    banco
                }
                Ok(Err(e)) => {
                    let copia = caminho_corrompido(&caminho);
                    tracing::warn!(
                        arquivo = %caminho.display(),
                        copia = %copia.display(),
                        error = %e,
                        "Arquivo do banco ilegível; mantendo cópia e recomeçando com dados iniciais"
                    );
                    fs::rename(&caminho, &copia)?;
                    padrao
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            tracing::info!(arquivo = %caminho.display(), "Criando arquivo do banco com dados iniciais");
            padrao
        };

        gravar(&caminho, &banco)?;

        Ok(RepositorioMemoria {
            banco: RwLock::new(banco),
            arquivo: Some(caminho),
        })
    }

    fn ler(&self) -> RwLockReadGuard<'_, Banco> {
        self.banco.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executa uma alteração sob o lock de escrita, sobre uma cópia do banco.
    /// A cópia só substitui o banco depois de espelhada no arquivo: um `Err` em qualquer
    /// etapa deixa memória e disco como estavam.
    fn alterar<T>(
        &self,
        alteracao: impl FnOnce(&mut Banco) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let mut banco = self.banco.write().unwrap_or_else(PoisonError::into_inner);
        let mut copia = banco.clone();
        let resultado = alteracao(&mut copia)?;
        if let Some(caminho) = &self.arquivo {
            gravar(caminho, &copia)?;
        }
        *banco = copia;
        Ok(resultado)
    }

    fn alterar_produto(
        &self,
        id: i32,
        mudanca: impl FnOnce(&mut Produto),
    ) -> Result<Option<Produto>, RepoError> {
        self.alterar(|banco| {
            let Some(produto) = banco.products.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            mudanca(produto);
            let produto = produto.clone();
            registrar_categoria(banco, &produto.category);
            Ok(Some(produto))
        })
    }
}

fn caminho_corrompido(caminho: &Path) -> PathBuf {
    let mut nome = caminho.as_os_str().to_owned();
    nome.push(".corrupt");
    PathBuf::from(nome)
}

/// Grava em um arquivo temporário vizinho e renomeia por cima do original.
fn gravar(caminho: &Path, banco: &Banco) -> Result<(), RepoError> {
    if let Some(dir) = caminho.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut temporario = caminho.as_os_str().to_owned();
    temporario.push(".tmp");
    let temporario = PathBuf::from(temporario);

    fs::write(&temporario, serde_json::to_vec_pretty(banco)?)?;
    fs::rename(&temporario, caminho)?;
    Ok(())
}

fn registrar_categoria(banco: &mut Banco, categoria: &str) {
    if !banco.categories.iter().any(|c| c == categoria) {
        banco.categories.push(categoria.to_string());
    }
}

#[async_trait]
impl Repositorio for RepositorioMemoria {
    async fn listar_produtos(&self) -> Result<Vec<Produto>, RepoError> {
        Ok(self.ler().products.clone())
    }

    async fn buscar_produto(&self, id: i32) -> Result<Option<Produto>, RepoError> {
        Ok(self.ler().products.iter().find(|p| p.id == id).cloned())
    }

    async fn inserir_produto(&self, novo: NovoProduto) -> Result<Produto, RepoError> {
        self.alterar(|banco| {
            let id = proximo_id(banco.products.iter().map(|p| p.id));
            let produto = novo.em_produto(id, Utc::now());
            registrar_categoria(banco, &produto.category);
            banco.products.push(produto.clone());
            Ok(produto)
        })
    }

    async fn atualizar_produto(
        &self,
        id: i32,
        alteracoes: AtualizacaoProduto,
    ) -> Result<Option<Produto>, RepoError> {
        self.alterar_produto(id, |p| p.aplicar(alteracoes, Utc::now()))
    }

    async fn desativar_produto(&self, id: i32) -> Result<Option<Produto>, RepoError> {
        self.alterar_produto(id, |p| {
            p.status = Situacao::Inativo;
            p.updated_at = Utc::now();
        })
    }

    async fn anexar_imagens(
        &self,
        id: i32,
        caminhos: Vec<String>,
    ) -> Result<Option<Produto>, RepoError> {
        self.alterar_produto(id, |p| p.anexar_imagens(caminhos, Utc::now()))
    }

    async fn listar_categorias(&self) -> Result<Vec<String>, RepoError> {
        Ok(self.ler().categories.clone())
    }

    async fn inserir_categoria(&self, nome: String) -> Result<Vec<String>, RepoError> {
        self.alterar(|banco| {
            if banco.categories.iter().any(|c| c.eq_ignore_ascii_case(&nome)) {
                return Err(RepoError::CategoriaDuplicada);
            }
            banco.categories.push(nome);
            Ok(banco.categories.clone())
        })
    }

    async fn buscar_conta(&self, id: i32) -> Result<Option<Conta>, RepoError> {
        Ok(self.ler().users.iter().find(|c| c.id == id).cloned())
    }

    async fn buscar_conta_por_email(&self, email: &str) -> Result<Option<Conta>, RepoError> {
        Ok(self.ler().users.iter().find(|c| c.email == email).cloned())
    }

    async fn listar_contas(&self, papel: Option<Papel>) -> Result<Vec<Conta>, RepoError> {
        Ok(self
            .ler()
            .users
            .iter()
            .filter(|c| papel.map_or(true, |p| c.role == p))
            .cloned()
            .collect())
    }

    async fn inserir_conta(&self, nova: NovaConta) -> Result<Conta, RepoError> {
        self.alterar(|banco| {
            if banco.users.iter().any(|c| c.email == nova.email) {
                return Err(RepoError::EmailDuplicado);
            }
            let conta = Conta {
                id: proximo_id(banco.users.iter().map(|c| c.id)),
                name: nova.name,
                email: nova.email,
                password_hash: nova.password_hash,
                role: nova.role,
                phone: nova.phone,
                company: nova.company,
                address: nova.address,
                status: Situacao::Ativo,
                created_at: Utc::now(),
            };
            banco.users.push(conta.clone());
            Ok(conta)
        })
    }

    async fn criar_pedido(&self, pedido: PedidoValido) -> Result<Pedido, RepoError> {
        self.alterar(|banco| {
            if !banco.users.iter().any(|c| c.id == pedido.client_id) {
                return Err(RepoError::ClienteNaoEncontrado(pedido.client_id));
            }

            let produtos = &banco.products;
            let itens = montar_itens(&pedido, |id| produtos.iter().find(|p| p.id == id))?;

            // Tudo conferido: agora sim baixa o estoque.
            let agora = Utc::now();
            for (produto_id, quantidade) in pedido.quantidades_por_produto() {
                if let Some(produto) = banco.products.iter_mut().find(|p| p.id == produto_id) {
                    produto.stock -= quantidade;
                    produto.updated_at = agora;
                }
            }

            let totais = calcular_totais(&itens, &pedido.discount, &banco.settings);
            let id = proximo_id(banco.orders.iter().map(|o| o.id));
            let novo = Pedido {
                id,
                order_number: numero_pedido(id, agora),
                client_id: pedido.client_id,
                items: itens,
                subtotal: totais.subtotal,
                discount: totais.discount,
                shipping: totais.shipping,
                total: totais.total,
                status: Default::default(),
                payment_status: Default::default(),
                payment_method: pedido.payment_method,
                notes: pedido.notes,
                created_at: agora,
                updated_at: agora,
            };
            banco.orders.push(novo.clone());
            Ok(novo)
        })
    }

    async fn listar_pedidos(&self) -> Result<Vec<Pedido>, RepoError> {
        let mut pedidos = self.ler().orders.clone();
        pedidos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(pedidos)
    }

    async fn atualizar_pedido(
        &self,
        id: i32,
        alteracoes: AtualizacaoPedido,
    ) -> Result<Option<Pedido>, RepoError> {
        self.alterar(|banco| {
            Ok(banco.orders.iter_mut().find(|o| o.id == id).map(|pedido| {
                pedido.aplicar(alteracoes, Utc::now());
                pedido.clone()
            }))
        })
    }

    async fn configuracoes(&self) -> Result<Configuracoes, RepoError> {
        Ok(self.ler().settings.clone())
    }

    async fn atualizar_configuracoes(
        &self,
        alteracoes: AtualizacaoConfiguracoes,
    ) -> Result<Configuracoes, RepoError> {
        self.alterar(|banco| {
            banco.settings.aplicar(alteracoes);
            Ok(banco.settings.clone())
        })
    }
}
