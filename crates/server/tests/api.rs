use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use engine::Engine;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serde_json::{Value, json};
use server::{ServerState, router};
use tower::ServiceExt;

const PASSWORD: &str = "correct horse";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.seed_system_categories().await.unwrap();
    engine.seed_merchant_categories().await.unwrap();
    router(ServerState {
        engine: Arc::new(engine),
    })
}

fn basic(email: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{PASSWORD}")))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    email: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(email) = email {
        request = request.header(header::AUTHORIZATION, basic(email));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> Value {
    let (status, user) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "full_name": "Test User",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    user
}

async fn category_id(app: &Router, email: &str, name: &str) -> String {
    let (status, categories) = send(
        app,
        Method::GET,
        "/categories?category_type=expense",
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    categories
        .as_array()
        .unwrap()
        .iter()
        .find(|category| category["name"] == name)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn registration_and_basic_auth() {
    let app = app().await;
    let user = register(&app, "Asha@Example.com").await;
    assert_eq!(user["email"], "asha@example.com");
    assert_eq!(user["default_currency"], "INR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "asha@example.com",
            "full_name": "Again",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::GET, "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/me")
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("asha@example.com:wrong password")),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, me) = send(&app, Method::GET, "/me", Some("asha@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);

    let (status, scope) = send(&app, Method::GET, "/scope", Some("asha@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scope["kind"], "personal");
    assert_eq!(scope["family_id"], Value::Null);
}

#[tokio::test]
async fn budget_reports_spend_over_http() {
    let app = app().await;
    let email = "ravi@example.com";
    register(&app, email).await;
    let groceries = category_id(&app, email, "Groceries & Food").await;
    let dining = category_id(&app, email, "Dining & Restaurants").await;

    let (status, budget) = send(
        &app,
        Method::POST,
        "/budgets",
        Some(email),
        Some(json!({
            "name": "January",
            "period_start": "2025-01-01",
            "period_end": "2025-01-31",
            "total_budget_minor": 500_000,
            "category_allocations": [
                { "category_id": groceries, "allocated_minor": 200_000 }
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_id = budget["id"].as_str().unwrap().to_string();

    for (category, amount, day) in [(&groceries, 150_000, "2025-01-10"), (&dining, 80_000, "2025-01-15")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/transactions",
            Some(email),
            Some(json!({
                "amount_minor": amount,
                "transaction_type": "expense",
                "payment_method": "upi",
                "category_id": category,
                "t_date": day,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, budget) = send(
        &app,
        Method::GET,
        &format!("/budgets/{budget_id}"),
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(budget["stats"]["total_spent"], 230_000);
    assert_eq!(budget["stats"]["total_remaining"], 270_000);
    assert_eq!(budget["stats"]["overall_utilization_percent"], 46.0);
    assert_eq!(budget["stats"]["categories"][0]["spent"], 150_000);
    assert_eq!(budget["stats"]["categories"][0]["utilization_percent"], 75.0);

    let (status, active) = send(
        &app,
        Method::GET,
        "/budgets/active?date=2025-01-20",
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["id"], budget_id.as_str());

    let (status, _) = send(
        &app,
        Method::POST,
        "/budgets",
        Some(email),
        Some(json!({
            "name": "Overlap",
            "period_start": "2025-01-15",
            "period_end": "2025-02-14",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, page) = send(&app, Method::GET, "/transactions?page_size=1", Some(email), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["t_date"], "2025-01-15");

    let (status, summary) = send(
        &app,
        Method::GET,
        "/transactions/stats/summary?start_date=2025-01-01&end_date=2025-01-31",
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_expenses"], 230_000);
    assert_eq!(summary["total_income"], 0);
    assert_eq!(summary["net_savings"], -230_000);
    assert_eq!(summary["expense_count"], 2);

    let (status, code) = send(&app, Method::GET, "/merchant-categories/5411", Some(email), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(code["suggested_category_id"], groceries.as_str());
}

#[tokio::test]
async fn bad_input_is_rejected() {
    let app = app().await;
    let email = "meera@example.com";
    register(&app, email).await;
    let groceries = category_id(&app, email, "Groceries & Food").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(email),
        Some(json!({
            "amount_minor": 1_000,
            "transaction_type": "expense",
            "payment_method": "barter",
            "category_id": groceries,
            "t_date": "2025-01-10",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("barter"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/budgets",
        Some(email),
        Some(json!({
            "name": "Backwards",
            "period_start": "2025-02-01",
            "period_end": "2025-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        Method::GET,
        "/budgets/6f1c1f4e-93c5-4d8e-9a57-0c3e5f0b9d11",
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/invites/not-a-token", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        "/transactions/stats/summary?start_date=2025-02-01&end_date=2025-01-01",
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::GET, "/merchant-categories/9999", Some(email), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invite_flow_over_http() {
    let app = app().await;
    let admin = "admin@example.com";
    let guest = "guest@example.com";
    register(&app, admin).await;
    register(&app, guest).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/families",
        Some(admin),
        Some(json!({ "name": "Sharma household" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let family_id = created["family"]["id"].as_str().unwrap().to_string();

    let (status, invite) = send(
        &app,
        Method::POST,
        &format!("/families/{family_id}/invites"),
        Some(admin),
        Some(json!({ "email": guest, "role": "viewer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = invite["token"].as_str().unwrap().to_string();

    let (status, preview) = send(&app, Method::GET, &format!("/invites/{token}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["family_name"], "Sharma household");
    assert_eq!(preview["role"], "viewer");

    let (status, pending) = send(&app, Method::GET, "/me/invites", Some(guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/invites/{token}/accept"),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, family) = send(
        &app,
        Method::POST,
        &format!("/invites/{token}/accept"),
        Some(guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(family["id"], family_id.as_str());

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/invites/{token}/accept"),
        Some(guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, scope) = send(&app, Method::GET, "/scope", Some(guest), None).await;
    assert_eq!(scope["kind"], "family");
    assert_eq!(scope["family_id"], family_id.as_str());

    let (status, _) = send(
        &app,
        Method::POST,
        "/tags",
        Some(guest),
        Some(json!({ "name": "groceries" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, members) = send(
        &app,
        Method::GET,
        &format!("/families/{family_id}/members"),
        Some(guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::DELETE, "/me/active-family", Some(guest), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, active) = send(&app, Method::GET, "/me/active-family", Some(guest), None).await;
    assert_eq!(active, Value::Null);
}
