mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bson::oid::ObjectId;
use std::sync::Arc;
use tower::ServiceExt;

use common::harness;
use renders_backend::config::{JwtConfig, PdfConfig};
use renders_backend::handler::render_handler::RenderState;
use renders_backend::middlewares::auth_middleware::AuthState;
use renders_backend::router::quote_router::quote_router;
use renders_backend::router::user_router::user_router;
use renders_backend::service::user_service::UserServiceImpl;
use renders_backend::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use renders_backend::util::pdf::PdfRenderService;

struct TestApp {
    router: Router,
    jwt_utils: Arc<JwtTokenUtilsImpl>,
}

fn setup_app() -> TestApp {
    let h = harness();
    let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));
    let auth_state = Arc::new(AuthState {
        jwt_utils: jwt_utils.clone(),
    });
    let render_state = Arc::new(RenderState {
        flow: h.service.clone(),
        renderer: Arc::new(PdfRenderService::new(PdfConfig::default())),
    });
    let user_service = Arc::new(UserServiceImpl::new(h.user_repo.clone(), jwt_utils.clone()));

    let router = Router::new()
        .merge(quote_router(h.service.clone(), render_state, auth_state))
        .merge(user_router(user_service));

    TestApp { router, jwt_utils }
}

fn token_for(app: &TestApp, role: &str) -> String {
    app.jwt_utils
        .generate_access_token(&ObjectId::new().to_hex(), "5512345678", role)
        .expect("token")
}

fn multipart_create_body(boundary: &str) -> String {
    let json = serde_json::json!({
        "company": "alquipop",
        "client": "Botanas MX",
        "project": "Exhibidores 2026",
        "serial": "S-104",
        "brand": "Crunchis",
        "request_contact": "5512345678",
        "approval_contact": "5587654321",
        "estimated_delivery_date": "2026-09-15",
        "entries": [{
            "name": "Exhibidor",
            "sizes": "22cm x 33cm",
            "concept": "Exhibidor de piso para botanas",
            "range": "10 piezas",
            "material": "MDF",
            "unitary_cost": 100.0,
            "unitary_price": 150.0,
            "unitary_final_price": 180.0
        }]
    });
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"json\"\r\n\r\n{json}\r\n--{boundary}--\r\n"
    )
}

async fn create_quote(app: &TestApp, token: &str) -> serde_json::Value {
    let boundary = "XTESTBOUNDARY";
    let req = Request::builder()
        .method("POST")
        .uri("/quotes")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_create_body(boundary)))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn quotes_require_authentication() {
    let app = setup_app();

    let req = Request::builder()
        .method("GET")
        .uri("/quotes")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/quotes")
        .header("authorization", "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_is_role_gated() {
    let app = setup_app();

    let petitioner = token_for(&app, "PETITIONER");
    let req = Request::builder()
        .method("GET")
        .uri("/quotes")
        .header("authorization", format!("Bearer {}", petitioner))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let validator = token_for(&app, "VALIDATOR");
    let req = Request::builder()
        .method("GET")
        .uri("/quotes")
        .header("authorization", format!("Bearer {}", validator))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn multipart_create_and_validator_accept() {
    let app = setup_app();
    let petitioner = token_for(&app, "PETITIONER");

    let created = create_quote(&app, &petitioner).await;
    let id = created["info"]["_id"]["$oid"].as_str().expect("id").to_string();
    assert_eq!(created["current"]["sequence"], 1);
    assert_eq!(created["current"]["created_by_role"], "PETITIONER");

    // A provider on the validator confirmation surface is rejected
    let provider = token_for(&app, "PROVIDER");
    let req = Request::builder()
        .method("POST")
        .uri(format!("/quotes/{}/accept", id))
        .header("authorization", format!("Bearer {}", provider))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The validator may accept; petitioner-originated quotes finalize
    let validator = token_for(&app, "VALIDATOR");
    let req = Request::builder()
        .method("POST")
        .uri(format!("/quotes/{}/accept", id))
        .header("authorization", format!("Bearer {}", validator))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let accepted: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(accepted["info"]["finalized_at"].is_string());
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() {
    let app = setup_app();
    let validator = token_for(&app, "VALIDATOR");

    let req = Request::builder()
        .method("POST")
        .uri("/quotes/not-an-id/accept")
        .header("authorization", format!("Bearer {}", validator))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reject_requires_a_comment() {
    let app = setup_app();
    let petitioner = token_for(&app, "PETITIONER");
    let created = create_quote(&app, &petitioner).await;
    let id = created["info"]["_id"]["$oid"].as_str().expect("id").to_string();

    let validator = token_for(&app, "VALIDATOR");
    let req = Request::builder()
        .method("POST")
        .uri(format!("/quotes/{}/reject", id))
        .header("authorization", format!("Bearer {}", validator))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "comment": "x" }).to_string()))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_and_login_roundtrip() {
    let app = setup_app();

    let register = serde_json::json!({
        "phone": "5598765432",
        "name": "Ana Torres",
        "password": "segura123",
        "role": "PETITIONER"
    });
    let req = Request::builder()
        .method("POST")
        .uri("/users/register")
        .header("content-type", "application/json")
        .body(Body::from(register.to_string()))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let login = serde_json::json!({
        "phone": "5598765432",
        "password": "segura123"
    });
    let req = Request::builder()
        .method("POST")
        .uri("/users/login")
        .header("content-type", "application/json")
        .body(Body::from(login.to_string()))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let access = body["tokens"]["access_token"].as_str().expect("token");

    // The issued token works against the protected surface
    let req = Request::builder()
        .method("GET")
        .uri("/quotes")
        .header("authorization", format!("Bearer {}", access))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Wrong password is refused
    let bad_login = serde_json::json!({
        "phone": "5598765432",
        "password": "incorrecta1"
    });
    let req = Request::builder()
        .method("POST")
        .uri("/users/login")
        .header("content-type", "application/json")
        .body(Body::from(bad_login.to_string()))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_quote_errors_are_json_messages() {
    let app = setup_app();
    let petitioner = token_for(&app, "PETITIONER");

    // Malformed id
    let req = Request::builder()
        .method("GET")
        .uri("/api/generate-quote?quoteId=nope")
        .header("authorization", format!("Bearer {}", petitioner))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());

    // Unknown quote
    let missing = ObjectId::new().to_hex();
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/generate-quote?quoteId={}", missing))
        .header("authorization", format!("Bearer {}", petitioner))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Not finalized yet
    let created = create_quote(&app, &petitioner).await;
    let id = created["info"]["_id"]["$oid"].as_str().expect("id").to_string();
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/generate-quote?quoteId={}", id))
        .header("authorization", format!("Bearer {}", petitioner))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Quote is not finalized yet");
}
