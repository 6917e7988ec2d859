// tests/api.rs

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};

use eletromaquinas::repositorio::banco::dados_iniciais;
use eletromaquinas::repositorio::memoria::RepositorioMemoria;
use eletromaquinas::saude::rota_nao_encontrada;
use eletromaquinas::uploads::armazenamento::{
    Armazenamento, ArmazenamentoDisco, ArmazenamentoMemoria,
};
use eletromaquinas::usuarios::token::{gerar_token, ConfigToken};
use eletromaquinas::usuarios::usuario_structs::{NovaConta, Papel};
use eletromaquinas::{configurar, cors, AppState};

const ADMIN_EMAIL: &str = "admin@eletromaquinas.com";
const CUSTO_BCRYPT: u32 = 4;

fn estado() -> web::Data<AppState> {
    estado_com(Arc::new(ArmazenamentoMemoria::default()))
}

fn estado_com(armazenamento: Arc<dyn Armazenamento>) -> web::Data<AppState> {
    let hash = bcrypt::hash("admin123", CUSTO_BCRYPT).unwrap();
    web::Data::new(AppState {
        repo: Arc::new(RepositorioMemoria::novo(dados_iniciais(ADMIN_EMAIL, hash))),
        armazenamento,
        token: ConfigToken {
            segredo: "segredo-de-teste".to_string(),
            validade_horas: 1,
        },
        bcrypt_custo: CUSTO_BCRYPT,
        limite_upload: 1024,
        ambiente: "test".to_string(),
    })
}

macro_rules! app {
    ($estado:expr) => {
        test::init_service(
            App::new()
                .wrap(cors())
                .app_data($estado.clone())
                .configure(configurar)
                .default_service(web::to(rota_nao_encontrada)),
        )
        .await
    };
}

async fn token_de(estado: &web::Data<AppState>, email: &str) -> String {
    let conta = estado
        .repo
        .buscar_conta_por_email(email)
        .await
        .unwrap()
        .expect("conta existe");
    gerar_token(&conta, &estado.token).unwrap()
}

async fn criar_conta(estado: &web::Data<AppState>, email: &str, role: Papel) -> i32 {
    estado
        .repo
        .inserir_conta(NovaConta {
            name: "Conta de Teste".to_string(),
            email: email.to_string(),
            password_hash: bcrypt::hash("senha123", CUSTO_BCRYPT).unwrap(),
            role,
            phone: None,
            company: None,
            address: None,
        })
        .await
        .unwrap()
        .id
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn decimal(valor: &Value) -> BigDecimal {
    match valor {
        Value::String(s) => BigDecimal::from_str(s).unwrap(),
        outro => BigDecimal::from_str(&outro.to_string()).unwrap(),
    }
}

async fn estoque(estado: &web::Data<AppState>, id: i32) -> i32 {
    estado.repo.buscar_produto(id).await.unwrap().unwrap().stock
}

#[actix_web::test]
async fn destaque_retorna_so_produtos_ativos_em_destaque() {
    let estado = estado();
    let app = app!(estado);

    let produtos: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/products?featured=true").to_request(),
    )
    .await;

    let ids: Vec<i64> = produtos.iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(produtos
        .iter()
        .all(|p| p["featured"] == json!(true) && p["status"] == json!("ativo")));
}

#[actix_web::test]
async fn busca_ignora_maiusculas_e_olha_a_descricao() {
    let estado = estado();
    let app = app!(estado);

    let por_nome: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/products?search=GERADOR").to_request(),
    )
    .await;
    assert_eq!(por_nome.len(), 1);
    assert_eq!(por_nome[0]["id"], json!(2));

    let por_descricao: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/products?search=distribui%C3%A7%C3%A3o&category=Transformadores")
            .to_request(),
    )
    .await;
    assert_eq!(por_descricao.len(), 1);
    assert_eq!(por_descricao[0]["id"], json!(3));
}

#[actix_web::test]
async fn produto_inexistente_ou_id_invalido_da_404() {
    let estado = estado();
    let app = app!(estado);

    for uri in ["/api/products/999", "/api/products/abc"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_web::test]
async fn login_admin_devolve_usuario_sem_senha() {
    let estado = estado();
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": "admin123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["success"], json!(true));
    assert!(corpo["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(corpo["user"]["role"], json!("admin"));
    assert!(corpo["user"].get("password").is_none());
    assert!(corpo["user"].get("passwordHash").is_none());
}

#[actix_web::test]
async fn senha_errada_da_401_com_qualquer_caixa_no_email() {
    let estado = estado();
    let app = app!(estado);

    for email in [ADMIN_EMAIL, "ADMIN@EletroMaquinas.com", "Admin@eletromaquinas.COM"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/login")
                .set_json(json!({ "email": email, "password": "errada" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", email);
        let corpo: Value = test::read_body_json(resp).await;
        assert_eq!(corpo["error"], json!("Credenciais inválidas"));
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": "ADMIN@ELETROMAQUINAS.COM", "password": "admin123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn login_sem_campos_da_400() {
    let estado = estado();
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": ADMIN_EMAIL }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn cliente_nao_entra_no_painel() {
    let estado = estado();
    criar_conta(&estado, "cliente@teste.com", Papel::Cliente).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "email": "cliente@teste.com", "password": "senha123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn cadastro_duplicado_mantem_um_unico_cliente() {
    let estado = estado();
    let app = app!(estado);

    let cadastro = json!({
        "name": "Maria Souza",
        "email": "maria@cliente.com",
        "password": "segredo",
        "company": "Souza Ltda"
    });

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/clients/register")
            .set_json(&cadastro)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["client"]["role"], json!("client"));
    assert!(corpo["token"].is_string());

    let mut repetido = cadastro.clone();
    repetido["email"] = json!("MARIA@cliente.com");
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/clients/register")
            .set_json(&repetido)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let clientes = estado.repo.listar_contas(Some(Papel::Cliente)).await.unwrap();
    assert_eq!(clientes.len(), 1);
}

#[actix_web::test]
async fn cadastro_incompleto_ou_email_invalido_da_400() {
    let estado = estado();
    let app = app!(estado);

    for corpo in [
        json!({ "name": "Sem Senha", "email": "a@b.com" }),
        json!({ "name": " ", "email": "a@b.com", "password": "x" }),
        json!({ "name": "Email Ruim", "email": "sem-arroba", "password": "x" }),
    ] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/clients/register")
                .set_json(&corpo)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", corpo);
    }
}

#[actix_web::test]
async fn pedido_acima_do_estoque_nao_altera_nada() {
    let estado = estado();
    let cliente = criar_conta(&estado, "comprador@teste.com", Papel::Cliente).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "clientId": cliente,
                "items": [
                    { "productId": 1, "quantity": 1 },
                    { "productId": 3, "quantity": 6 }
                ]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(estoque(&estado, 1).await, 15);
    assert_eq!(estoque(&estado, 3).await, 5);
    assert!(estado.repo.listar_pedidos().await.unwrap().is_empty());
}

#[actix_web::test]
async fn linhas_repetidas_somam_antes_de_conferir_estoque() {
    let estado = estado();
    let cliente = criar_conta(&estado, "comprador@teste.com", Papel::Cliente).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "clientId": cliente,
                "items": [
                    { "productId": 3, "quantity": 3 },
                    { "productId": 3, "quantity": 3 }
                ]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(estoque(&estado, 3).await, 5);
}

#[actix_web::test]
async fn soma_de_quantidades_que_estoura_da_400_e_api_continua_respondendo() {
    let estado = estado();
    let cliente = criar_conta(&estado, "comprador@teste.com", Papel::Cliente).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "clientId": cliente,
                "items": [
                    { "productId": 1, "quantity": 2147483647 },
                    { "productId": 1, "quantity": 2147483647 }
                ]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/products/1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let produto: Value = test::read_body_json(resp).await;
    assert_eq!(produto["stock"], json!(15));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "clientId": cliente,
                "items": [{ "productId": 1, "quantity": 1 }]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(estoque(&estado, 1).await, 14);
}

#[actix_web::test]
async fn pedido_valido_baixa_estoque_e_renova_updated_at() {
    let estado = estado();
    let cliente = criar_conta(&estado, "comprador@teste.com", Papel::Cliente).await;
    let antes = estado.repo.buscar_produto(2).await.unwrap().unwrap();
    let app = app!(estado);

    actix_web::rt::time::sleep(Duration::from_millis(5)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "clientId": cliente,
                "items": [{ "productId": 2, "quantity": 3 }],
                "paymentMethod": "pix"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let corpo: Value = test::read_body_json(resp).await;
    let pedido = &corpo["order"];
    assert_eq!(corpo["success"], json!(true));
    assert!(pedido["orderNumber"].as_str().unwrap().starts_with("PED"));
    assert_eq!(pedido["status"], json!("pendente"));
    assert_eq!(pedido["items"][0]["name"], json!("Gerador de Energia 50kVA"));
    assert_eq!(decimal(&pedido["subtotal"]), BigDecimal::from(37500));
    assert_eq!(decimal(&pedido["shipping"]), BigDecimal::from(0));
    assert_eq!(decimal(&pedido["total"]), BigDecimal::from(37500));

    let depois = estado.repo.buscar_produto(2).await.unwrap().unwrap();
    assert_eq!(depois.stock, antes.stock - 3);
    assert!(depois.updated_at > antes.updated_at);
}

#[actix_web::test]
async fn pedido_abaixo_do_frete_gratis_cobra_frete() {
    let estado = estado();
    let cliente = criar_conta(&estado, "comprador@teste.com", Papel::Cliente).await;
    let app = app!(estado);

    let corpo: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "clientId": cliente,
                "items": [{ "productId": 1, "quantity": 1 }],
                "discount": 50
            }))
            .to_request(),
    )
    .await;

    let pedido = &corpo["order"];
    assert_eq!(decimal(&pedido["subtotal"]), BigDecimal::from(2850));
    assert_eq!(decimal(&pedido["shipping"]), BigDecimal::from(150));
    assert_eq!(decimal(&pedido["total"]), BigDecimal::from(2950));
}

#[actix_web::test]
async fn pedido_de_cliente_inexistente_da_400() {
    let estado = estado();
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({ "clientId": 42, "items": [{ "productId": 1, "quantity": 1 }] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(estoque(&estado, 1).await, 15);
}

#[actix_web::test]
async fn rotas_do_painel_exigem_token_valido_de_admin() {
    let estado = estado();
    criar_conta(&estado, "cliente@teste.com", Papel::Cliente).await;
    criar_conta(&estado, "vendedor@teste.com", Papel::Vendedor).await;
    let token_cliente = token_de(&estado, "cliente@teste.com").await;
    let token_vendedor = token_de(&estado, "vendedor@teste.com").await;
    let forjado = gerar_token(
        &estado.repo.buscar_conta(1).await.unwrap().unwrap(),
        &ConfigToken {
            segredo: "outro-segredo".to_string(),
            validade_horas: 1,
        },
    )
    .unwrap();
    let app = app!(estado);

    let cabecalhos: Vec<Option<String>> = vec![
        None,
        Some("Token abc".to_string()),
        Some("Bearer".to_string()),
        Some("Bearer nao-e-um-jwt".to_string()),
        Some(format!("Bearer {}", forjado)),
        Some(format!("Bearer {}", token_cliente)),
    ];

    for uri in ["/api/admin/stats", "/api/admin/orders", "/api/admin/backup"] {
        for cabecalho in &cabecalhos {
            let mut req = test::TestRequest::get().uri(uri);
            if let Some(valor) = cabecalho {
                req = req.insert_header((header::AUTHORIZATION, valor.clone()));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{} {:?}", uri, cabecalho);
        }
    }

    // Vendedor vê pedidos mas não exporta backup.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/orders")
            .insert_header(bearer(&token_vendedor))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/backup")
            .insert_header(bearer(&token_vendedor))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn exclusao_logica_esconde_do_catalogo_publico() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/admin/products/1")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["product"]["status"], json!("inativo"));

    let publicos: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/products").to_request(),
    )
    .await;
    assert!(publicos.iter().all(|p| p["id"] != json!(1)));

    let todos: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/products")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(todos.len(), 3);

    // Continua acessível pelo id.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/products/1").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn cadastro_e_atualizacao_de_produto() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/products")
            .insert_header(bearer(&token))
            .set_json(json!({
                "name": "Compressor de Ar 50L",
                "category": "Compressores",
                "price": "1899.90",
                "stock": 4
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["product"]["id"], json!(4));

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/admin/products/4")
            .insert_header(bearer(&token))
            .set_json(json!({ "stock": 10, "featured": true, "id": 99, "createdAt": "x" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["product"]["id"], json!(4));
    assert_eq!(corpo["product"]["stock"], json!(10));
    assert_eq!(corpo["product"]["name"], json!("Compressor de Ar 50L"));

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/admin/products/77")
            .insert_header(bearer(&token))
            .set_json(json!({ "stock": 1 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn configuracoes_ignoram_chaves_desconhecidas() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let corpo: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri("/api/admin/settings")
            .insert_header(bearer(&token))
            .set_json(json!({ "phone": "(11) 4000-0000", "isAdmin": true, "__proto__": {} }))
            .to_request(),
    )
    .await;
    assert_eq!(corpo["success"], json!(true));

    let settings: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/settings")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(settings["phone"], json!("(11) 4000-0000"));
    assert_eq!(settings["companyName"], json!("EletroMáquinas"));
    assert!(settings.get("isAdmin").is_none());
    assert!(settings.get("__proto__").is_none());
}

#[actix_web::test]
async fn estatisticas_desconsideram_pedidos_cancelados() {
    let estado = estado();
    let cliente = criar_conta(&estado, "comprador@teste.com", Papel::Cliente).await;
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    for (produto, quantidade) in [(2, 4), (1, 1)] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/orders")
                .set_json(json!({
                    "clientId": cliente,
                    "items": [{ "productId": produto, "quantity": quantidade }]
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let pedidos: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/orders")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    // Mais recente primeiro.
    assert_eq!(pedidos[0]["items"][0]["productId"], json!(1));
    let ultimo = pedidos[0]["id"].as_i64().unwrap();

    let corpo: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/admin/orders/{}", ultimo))
            .insert_header(bearer(&token))
            .set_json(json!({ "status": "cancelado", "total": 0 }))
            .to_request(),
    )
    .await;
    assert_eq!(corpo["order"]["status"], json!("cancelado"));
    assert_eq!(decimal(&corpo["order"]["total"]), BigDecimal::from(3000));

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(stats["totalProducts"], json!(3));
    assert_eq!(stats["activeProducts"], json!(3));
    assert_eq!(stats["totalClients"], json!(1));
    assert_eq!(stats["totalSales"], json!(2));
    assert_eq!(stats["pendingOrders"], json!(1));
    assert_eq!(stats["lowStockProducts"], json!(1));
    assert_eq!(decimal(&stats["totalRevenue"]), BigDecimal::from(50000));
}

#[actix_web::test]
async fn pedido_inexistente_da_404() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/admin/orders/9")
            .insert_header(bearer(&token))
            .set_json(json!({ "status": "enviado" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn vendedores_e_categorias_pelo_admin() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/vendors")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Carlos", "email": "carlos@eletromaquinas.com", "password": "vende123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["vendor"]["role"], json!("vendedor"));

    let vendedores: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/vendors")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(vendedores.len(), 1);
    assert!(vendedores[0].get("passwordHash").is_none());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Painéis" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Motores" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let categorias: Vec<String> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/categories").to_request(),
    )
    .await;
    assert_eq!(categorias.last().map(String::as_str), Some("Painéis"));
    assert_eq!(categorias.len(), 6);
}

#[actix_web::test]
async fn backup_sai_como_anexo_sem_hashes() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/backup")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposicao = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(disposicao.starts_with("attachment"));

    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["products"].as_array().unwrap().len(), 3);
    assert!(corpo["users"][0].get("passwordHash").is_none());
}

fn multipart(arquivos: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let limite = "----limite-de-teste";
    let mut corpo = Vec::new();
    for (nome, tipo, conteudo) in arquivos {
        corpo.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                limite, nome, tipo
            )
            .as_bytes(),
        );
        corpo.extend_from_slice(conteudo);
        corpo.extend_from_slice(b"\r\n");
    }
    corpo.extend_from_slice(format!("--{}--\r\n", limite).as_bytes());
    (format!("multipart/form-data; boundary={}", limite), corpo)
}

#[actix_web::test]
async fn upload_grava_e_serve_a_imagem() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let (tipo, corpo) = multipart(&[("foto.png", "image/png", &b"\x89PNG conteudo"[..])]);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/upload")
            .insert_header(bearer(&token))
            .insert_header((header::CONTENT_TYPE, tipo))
            .set_payload(corpo)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let corpo: Value = test::read_body_json(resp).await;
    let arquivo = &corpo["files"][0];
    assert_eq!(arquivo["originalName"], json!("foto.png"));
    assert_eq!(arquivo["mimetype"], json!("image/png"));
    assert!(arquivo["filename"].as_str().unwrap().ends_with(".png"));

    let caminho = arquivo["path"].as_str().unwrap().to_string();
    let resp = test::call_service(&app, test::TestRequest::get().uri(&caminho).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"\x89PNG conteudo");
}

#[actix_web::test]
async fn upload_recusa_extensao_tipo_e_tamanho() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let grande = vec![b'a'; 2048];
    let casos: [(&str, &str, &[u8]); 3] = [
        ("script.exe", "image/png", &b"x"[..]),
        ("foto.jpg", "text/plain", &b"x"[..]),
        ("enorme.jpg", "image/jpeg", &grande[..]),
    ];

    for (nome, tipo_arquivo, conteudo) in casos {
        let (tipo, corpo) = multipart(&[(nome, tipo_arquivo, conteudo)]);
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/upload")
                .insert_header(bearer(&token))
                .insert_header((header::CONTENT_TYPE, tipo))
                .set_payload(corpo)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", nome);
    }
}

#[actix_web::test]
async fn imagens_enviadas_sao_anexadas_ao_produto() {
    let estado = estado();
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let app = app!(estado);

    let (tipo, corpo) = multipart(&[
        ("frente.jpg", "image/jpeg", &b"frente"[..]),
        ("lado.webp", "image/webp", &b"lado"[..]),
    ]);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/products/3/images")
            .insert_header(bearer(&token))
            .insert_header((header::CONTENT_TYPE, tipo))
            .set_payload(corpo)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let produto = estado.repo.buscar_produto(3).await.unwrap().unwrap();
    assert_eq!(produto.images.len(), 2);
    assert!(produto.images.iter().all(|p| p.starts_with("/uploads/")));
}

#[actix_web::test]
async fn lote_com_arquivo_invalido_nao_grava_nenhum() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    let estado = estado_com(Arc::new(ArmazenamentoDisco::novo(&uploads).unwrap()));
    let token = token_de(&estado, ADMIN_EMAIL).await;
    let antes = estado.repo.buscar_produto(3).await.unwrap().unwrap();
    let app = app!(estado);

    let (tipo, corpo) = multipart(&[
        ("frente.jpg", "image/jpeg", &b"frente"[..]),
        ("script.exe", "application/octet-stream", &b"MZ"[..]),
    ]);
    for uri in ["/api/upload", "/api/admin/products/3/images"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(uri)
                .insert_header(bearer(&token))
                .insert_header((header::CONTENT_TYPE, tipo.clone()))
                .set_payload(corpo.clone())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 0);
    let depois = estado.repo.buscar_produto(3).await.unwrap().unwrap();
    assert_eq!(depois.images, antes.images);
    assert_eq!(depois.image, antes.image);
}

#[actix_web::test]
async fn arquivo_com_caminho_suspeito_da_404() {
    let estado = estado();
    let app = app!(estado);

    for uri in ["/uploads/..%2Fsegredo.png", "/uploads/inexistente.png"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_web::test]
async fn saude_e_rota_desconhecida() {
    let estado = estado();
    let app = app!(estado);

    let corpo: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(corpo["status"], json!("OK"));
    assert_eq!(corpo["service"], json!("EletroMáquinas"));

    let corpo: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/test").to_request(),
    )
    .await;
    assert_eq!(corpo["environment"], json!("test"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/nao-existe").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let corpo: Value = test::read_body_json(resp).await;
    assert_eq!(corpo["error"], json!("Endpoint não encontrado"));
}

#[actix_web::test]
async fn json_malformado_da_400() {
    let estado = estado();
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{ isto não é json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let corpo: Value = test::read_body_json(resp).await;
    assert!(corpo["error"].is_string());
}

#[actix_web::test]
async fn cors_libera_qualquer_origem() {
    let estado = estado();
    let app = app!(estado);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/products")
            .insert_header((header::ORIGIN, "http://loja.exemplo.com"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/products")
            .insert_header((header::ORIGIN, "http://loja.exemplo.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
