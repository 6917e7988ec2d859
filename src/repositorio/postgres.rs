// src/repositorio/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Executor, FromRow, Postgres, Transaction};

use super::banco::{montar_itens, Banco};
use super::{RepoError, Repositorio};
use crate::admin::admin_structs::{AtualizacaoConfiguracoes, Configuracoes};
use crate::produtos::produtos_structs::{AtualizacaoProduto, NovoProduto, Produto};
use crate::shared::shared_structs::Situacao;
use crate::usuarios::usuario_structs::{Conta, NovaConta, Papel};
use crate::vendas::vendas_structs::{
    calcular_totais, numero_pedido, AtualizacaoPedido, ItemPedido, Pedido, PedidoValido,
};

/// Esquema criado na inicialização. Todas as instruções são idempotentes.
const ESQUEMA: &str = r#"
CREATE TABLE IF NOT EXISTS contas (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    phone TEXT,
    company TEXT,
    address TEXT,
    status TEXT NOT NULL DEFAULT 'ativo',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS categorias (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS produtos (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    price NUMERIC(12, 2) NOT NULL CHECK (price >= 0),
    stock INTEGER NOT NULL CHECK (stock >= 0),
    description TEXT NOT NULL DEFAULT '',
    specifications TEXT[] NOT NULL DEFAULT '{}',
    image TEXT,
    images TEXT[] NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'ativo',
    featured BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS pedidos (
    id SERIAL PRIMARY KEY,
    order_number TEXT NOT NULL UNIQUE,
    client_id INTEGER NOT NULL REFERENCES contas (id),
    items JSONB NOT NULL,
    subtotal NUMERIC(12, 2) NOT NULL,
    discount NUMERIC(12, 2) NOT NULL,
    shipping NUMERIC(12, 2) NOT NULL,
    total NUMERIC(12, 2) NOT NULL,
    status TEXT NOT NULL,
    payment_status TEXT NOT NULL,
    payment_method TEXT,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS configuracoes (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    dados JSONB NOT NULL
);
"#;

macro_rules! colunas_produto {
    () => {
        "id, name, category, price, stock, description, specifications, image, images, status, featured, created_at, updated_at"
    };
}

macro_rules! colunas_conta {
    () => {
        "id, name, email, password_hash, role, phone, company, address, status, created_at"
    };
}

macro_rules! colunas_pedido {
    () => {
        "id, order_number, client_id, items, subtotal, discount, shipping, total, status, payment_status, payment_method, notes, created_at, updated_at"
    };
}

#[derive(FromRow)]
struct LinhaProduto {
    id: i32,
    name: String,
    category: String,
    price: BigDecimal,
    stock: i32,
    description: String,
    specifications: Vec<String>,
    image: Option<String>,
    images: Vec<String>,
    status: String,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinhaProduto> for Produto {
    type Error = RepoError;

    fn try_from(l: LinhaProduto) -> Result<Self, Self::Error> {
        Ok(Produto {
            id: l.id,
            name: l.name,
            category: l.category,
            price: l.price,
            stock: l.stock,
            description: l.description,
            specifications: l.specifications,
            image: l.image,
            images: l.images,
            status: l.status.parse().map_err(RepoError::Corrompido)?,
            featured: l.featured,
            created_at: l.created_at,
            updated_at: l.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LinhaConta {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    phone: Option<String>,
    company: Option<String>,
    address: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LinhaConta> for Conta {
    type Error = RepoError;

    fn try_from(l: LinhaConta) -> Result<Self, Self::Error> {
        Ok(Conta {
            id: l.id,
            name: l.name,
            email: l.email,
            password_hash: l.password_hash,
            role: l.role.parse().map_err(RepoError::Corrompido)?,
            phone: l.phone,
            company: l.company,
            address: l.address,
            status: l.status.parse().map_err(RepoError::Corrompido)?,
            created_at: l.created_at,
        })
    }
}

#[derive(FromRow)]
struct LinhaPedido {
    id: i32,
    order_number: String,
    client_id: i32,
    items: Json<Vec<ItemPedido>>,
    subtotal: BigDecimal,
    discount: BigDecimal,
    shipping: BigDecimal,
    total: BigDecimal,
    status: String,
    payment_status: String,
    payment_method: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinhaPedido> for Pedido {
    type Error = RepoError;

    fn try_from(l: LinhaPedido) -> Result<Self, Self::Error> {
        Ok(Pedido {
            id: l.id,
            order_number: l.order_number,
            client_id: l.client_id,
            items: l.items.0,
            subtotal: l.subtotal,
            discount: l.discount,
            shipping: l.shipping,
            total: l.total,
            status: l.status.parse().map_err(RepoError::Corrompido)?,
            payment_status: l.payment_status.parse().map_err(RepoError::Corrompido)?,
            payment_method: l.payment_method,
            notes: l.notes,
            created_at: l.created_at,
            updated_at: l.updated_at,
        })
    }
}

fn converter<L, T>(linhas: Vec<L>) -> Result<Vec<T>, RepoError>
where
    T: TryFrom<L, Error = RepoError>,
{
    linhas.into_iter().map(T::try_from).collect()
}

fn violacao_unica(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Repositório sobre PostgreSQL.
///
/// Pedidos e atualizações rodam em transação com `SELECT ... FOR UPDATE`,
/// então a conferência de estoque e a baixa não sofrem corrida entre requisições.
pub struct RepositorioPostgres {
    pool: PgPool,
}

impl RepositorioPostgres {
    pub async fn conectar(database_url: &str) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(RepositorioPostgres { pool })
    }

    /// Cria o esquema e insere os dados iniciais nas tabelas que estiverem vazias.
    pub async fn preparar(&self, inicial: Banco) -> Result<(), RepoError> {
        self.pool.execute(ESQUEMA).await?;

        let mut tx = self.pool.begin().await?;

        let contas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contas")
            .fetch_one(&mut *tx)
            .await?;
        if contas == 0 {
            for conta in &inicial.users {
                sqlx::query(
                    "INSERT INTO contas (name, email, password_hash, role, status, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(&conta.name)
                .bind(&conta.email)
                .bind(&conta.password_hash)
                .bind(conta.role.as_str())
                .bind(conta.status.as_str())
                .bind(conta.created_at)
                .execute(&mut *tx)
                .await?;
            }
            tracing::info!(quantidade = inicial.users.len(), "Contas iniciais criadas");
        }

        let produtos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM produtos")
            .fetch_one(&mut *tx)
            .await?;
        if produtos == 0 {
            for produto in &inicial.products {
                inserir_linha_produto(&mut tx, produto).await?;
            }
            tracing::info!(quantidade = inicial.products.len(), "Produtos iniciais criados");
        }

        for categoria in &inicial.categories {
            registrar_categoria(&mut tx, categoria).await?;
        }

        sqlx::query("INSERT INTO configuracoes (id, dados) VALUES (1, $1) ON CONFLICT (id) DO NOTHING")
            .bind(Json(&inicial.settings))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn alterar_produto(
        &self,
        id: i32,
        mudanca: impl FnOnce(&mut Produto) + Send,
    ) -> Result<Option<Produto>, RepoError> {
        let mut tx = self.pool.begin().await?;

        let linha = sqlx::query_as::<_, LinhaProduto>(concat!(
            "SELECT ",
            colunas_produto!(),
            " FROM produtos WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(linha) = linha else {
            return Ok(None);
        };
        let mut produto = Produto::try_from(linha)?;
        mudanca(&mut produto);

        sqlx::query(
            "UPDATE produtos SET name = $1, category = $2, price = $3, stock = $4, description = $5, specifications = $6, \
             image = $7, images = $8, status = $9, featured = $10, updated_at = $11 WHERE id = $12",
        )
        .bind(&produto.name)
        .bind(&produto.category)
        .bind(&produto.price)
        .bind(produto.stock)
        .bind(&produto.description)
        .bind(&produto.specifications)
        .bind(&produto.image)
        .bind(&produto.images)
        .bind(produto.status.as_str())
        .bind(produto.featured)
        .bind(produto.updated_at)
        .bind(produto.id)
        .execute(&mut *tx)
        .await?;

        registrar_categoria(&mut tx, &produto.category).await?;
        tx.commit().await?;
        Ok(Some(produto))
    }
}

async fn inserir_linha_produto(
    tx: &mut Transaction<'_, Postgres>,
    produto: &Produto,
) -> Result<Produto, RepoError> {
    let linha = sqlx::query_as::<_, LinhaProduto>(concat!(
        "INSERT INTO produtos (name, category, price, stock, description, specifications, image, images, status, featured, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING ",
        colunas_produto!()
    ))
    .bind(&produto.name)
    .bind(&produto.category)
    .bind(&produto.price)
    .bind(produto.stock)
    .bind(&produto.description)
    .bind(&produto.specifications)
    .bind(&produto.image)
    .bind(&produto.images)
    .bind(produto.status.as_str())
    .bind(produto.featured)
    .bind(produto.created_at)
    .bind(produto.updated_at)
    .fetch_one(&mut **tx)
    .await?;

    Produto::try_from(linha)
}

async fn registrar_categoria(tx: &mut Transaction<'_, Postgres>, nome: &str) -> Result<(), RepoError> {
    sqlx::query("INSERT INTO categorias (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(nome)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn ler_configuracoes(tx: &mut Transaction<'_, Postgres>) -> Result<Configuracoes, RepoError> {
    let dados = sqlx::query_scalar::<_, Json<Configuracoes>>("SELECT dados FROM configuracoes WHERE id = 1")
        .fetch_optional(&mut **tx)
        .await?;
    Ok(dados.map(|json| json.0).unwrap_or_default())
}

#[async_trait]
impl Repositorio for RepositorioPostgres {
    async fn listar_produtos(&self) -> Result<Vec<Produto>, RepoError> {
        let linhas = sqlx::query_as::<_, LinhaProduto>(concat!(
            "SELECT ",
            colunas_produto!(),
            " FROM produtos ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        converter(linhas)
    }

    async fn buscar_produto(&self, id: i32) -> Result<Option<Produto>, RepoError> {
        let linha = sqlx::query_as::<_, LinhaProduto>(concat!(
            "SELECT ",
            colunas_produto!(),
            " FROM produtos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        linha.map(Produto::try_from).transpose()
    }

    async fn inserir_produto(&self, novo: NovoProduto) -> Result<Produto, RepoError> {
        let mut tx = self.pool.begin().await?;
        // O id definitivo vem do SERIAL; o 0 aqui é só provisório.
        let produto = inserir_linha_produto(&mut tx, &novo.em_produto(0, Utc::now())).await?;
        registrar_categoria(&mut tx, &produto.category).await?;
        tx.commit().await?;
        Ok(produto)
    }

    async fn atualizar_produto(
        &self,
        id: i32,
        alteracoes: AtualizacaoProduto,
    ) -> Result<Option<Produto>, RepoError> {
        self.alterar_produto(id, |p| p.aplicar(alteracoes, Utc::now())).await
    }

    async fn desativar_produto(&self, id: i32) -> Result<Option<Produto>, RepoError> {
        self.alterar_produto(id, |p| {
            p.status = Situacao::Inativo;
            p.updated_at = Utc::now();
        })
        .await
    }

    async fn anexar_imagens(
        &self,
        id: i32,
        caminhos: Vec<String>,
    ) -> Result<Option<Produto>, RepoError> {
        self.alterar_produto(id, |p| p.anexar_imagens(caminhos, Utc::now())).await
    }

    async fn listar_categorias(&self) -> Result<Vec<String>, RepoError> {
        Ok(sqlx::query_scalar::<_, String>("SELECT name FROM categorias ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn inserir_categoria(&self, nome: String) -> Result<Vec<String>, RepoError> {
        let existe: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM categorias WHERE lower(name) = lower($1))",
        )
        .bind(&nome)
        .fetch_one(&self.pool)
        .await?;
        if existe {
            return Err(RepoError::CategoriaDuplicada);
        }

        match sqlx::query("INSERT INTO categorias (name) VALUES ($1)")
            .bind(&nome)
            .execute(&self.pool)
            .await
        {
            Err(e) if violacao_unica(&e) => return Err(RepoError::CategoriaDuplicada),
            resultado => {
                resultado?;
            }
        }
        self.listar_categorias().await
    }

    async fn buscar_conta(&self, id: i32) -> Result<Option<Conta>, RepoError> {
        let linha = sqlx::query_as::<_, LinhaConta>(concat!(
            "SELECT ",
            colunas_conta!(),
            " FROM contas WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        linha.map(Conta::try_from).transpose()
    }

    async fn buscar_conta_por_email(&self, email: &str) -> Result<Option<Conta>, RepoError> {
        let linha = sqlx::query_as::<_, LinhaConta>(concat!(
            "SELECT ",
            colunas_conta!(),
            " FROM contas WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        linha.map(Conta::try_from).transpose()
    }

    async fn listar_contas(&self, papel: Option<Papel>) -> Result<Vec<Conta>, RepoError> {
        let linhas = sqlx::query_as::<_, LinhaConta>(concat!(
            "SELECT ",
            colunas_conta!(),
            " FROM contas WHERE ($1::text IS NULL OR role = $1) ORDER BY id"
        ))
        .bind(papel.map(|p| p.as_str()))
        .fetch_all(&self.pool)
        .await?;
        converter(linhas)
    }

    async fn inserir_conta(&self, nova: NovaConta) -> Result<Conta, RepoError> {
        let resultado = sqlx::query_as::<_, LinhaConta>(concat!(
            "INSERT INTO contas (name, email, password_hash, role, phone, company, address, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING ",
            colunas_conta!()
        ))
        .bind(&nova.name)
        .bind(&nova.email)
        .bind(&nova.password_hash)
        .bind(nova.role.as_str())
        .bind(&nova.phone)
        .bind(&nova.company)
        .bind(&nova.address)
        .bind(Situacao::Ativo.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match resultado {
            Ok(linha) => Conta::try_from(linha),
            Err(e) if violacao_unica(&e) => Err(RepoError::EmailDuplicado),
            Err(e) => Err(e.into()),
        }
    }

    async fn criar_pedido(&self, pedido: PedidoValido) -> Result<Pedido, RepoError> {
        let mut transaction = self.pool.begin().await?;

        let cliente_existe: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM contas WHERE id = $1)")
                .bind(pedido.client_id)
                .fetch_one(&mut *transaction)
                .await?;
        if !cliente_existe {
            let _ = transaction.rollback().await;
            return Err(RepoError::ClienteNaoEncontrado(pedido.client_id));
        }

        // Bloqueia as linhas sempre na mesma ordem (id crescente) para evitar deadlock
        // entre dois pedidos com os mesmos produtos.
        let mut ids: Vec<i32> = pedido
            .quantidades_por_produto()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();

        let mut produtos = Vec::with_capacity(ids.len());
        for id in ids {
            let linha = sqlx::query_as::<_, LinhaProduto>(concat!(
                "SELECT ",
                colunas_produto!(),
                " FROM produtos WHERE id = $1 FOR UPDATE"
            ))
            .bind(id)
            .fetch_optional(&mut *transaction)
            .await?;
            if let Some(linha) = linha {
                produtos.push(Produto::try_from(linha)?);
            }
        }

        let itens = match montar_itens(&pedido, |id| produtos.iter().find(|p| p.id == id)) {
            Ok(itens) => itens,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        let agora = Utc::now();
        for (produto_id, quantidade) in pedido.quantidades_por_produto() {
            sqlx::query("UPDATE produtos SET stock = stock - $1, updated_at = $2 WHERE id = $3")
                .bind(quantidade)
                .bind(agora)
                .bind(produto_id)
                .execute(&mut *transaction)
                .await?;
        }

        let config = ler_configuracoes(&mut transaction).await?;
        let totais = calcular_totais(&itens, &pedido.discount, &config);

        let id: i32 = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('pedidos', 'id'))::int4")
            .fetch_one(&mut *transaction)
            .await?;

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

        sqlx::query(
            "INSERT INTO pedidos (id, order_number, client_id, items, subtotal, discount, shipping, total, status, payment_status, \
             payment_method, notes, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(novo.id)
        .bind(&novo.order_number)
        .bind(novo.client_id)
        .bind(Json(&novo.items))
        .bind(&novo.subtotal)
        .bind(&novo.discount)
        .bind(&novo.shipping)
        .bind(&novo.total)
        .bind(novo.status.as_str())
        .bind(novo.payment_status.as_str())
        .bind(&novo.payment_method)
        .bind(&novo.notes)
        .bind(novo.created_at)
        .bind(novo.updated_at)
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(novo)
    }

    async fn listar_pedidos(&self) -> Result<Vec<Pedido>, RepoError> {
        let linhas = sqlx::query_as::<_, LinhaPedido>(concat!(
            "SELECT ",
            colunas_pedido!(),
            " FROM pedidos ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        converter(linhas)
    }

    async fn atualizar_pedido(
        &self,
        id: i32,
        alteracoes: AtualizacaoPedido,
    ) -> Result<Option<Pedido>, RepoError> {
        let mut tx = self.pool.begin().await?;

        let linha = sqlx::query_as::<_, LinhaPedido>(concat!(
            "SELECT ",
            colunas_pedido!(),
            " FROM pedidos WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(linha) = linha else {
            return Ok(None);
        };
        let mut pedido = Pedido::try_from(linha)?;
        pedido.aplicar(alteracoes, Utc::now());

        sqlx::query(
            "UPDATE pedidos SET status = $1, payment_status = $2, notes = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(pedido.status.as_str())
        .bind(pedido.payment_status.as_str())
        .bind(&pedido.notes)
        .bind(pedido.updated_at)
        .bind(pedido.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(pedido))
    }

    async fn configuracoes(&self) -> Result<Configuracoes, RepoError> {
        let mut tx = self.pool.begin().await?;
        let config = ler_configuracoes(&mut tx).await?;
        tx.commit().await?;
        Ok(config)
    }

    async fn atualizar_configuracoes(
        &self,
        alteracoes: AtualizacaoConfiguracoes,
    ) -> Result<Configuracoes, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM configuracoes WHERE id = 1 FOR UPDATE")
            .execute(&mut *tx)
            .await?;
        let mut config = ler_configuracoes(&mut tx).await?;
        config.aplicar(alteracoes);

        sqlx::query(
            "INSERT INTO configuracoes (id, dados) VALUES (1, $1) ON CONFLICT (id) DO UPDATE SET dados = EXCLUDED.dados",
        )
        .bind(Json(&config))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(config)
    }
}
