//! Router smoke tests. The MongoDB client connects lazily, so everything
//! here sticks to paths that answer before any database I/O: liveness,
//! auth rejection and id validation.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;

use karwan_api::{build_router, models::user::Claims, state::AppState};

async fn test_app() -> axum::Router {
    let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:27017")
        .await
        .expect("client from static uri");
    build_router(AppState::new(client.database("karwan_test")))
}

fn bearer_for(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: "traveler@example.com".to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret("secret".as_ref()),
    )
    .expect("token encodes");
    format!("Bearer {}", token)
}

#[tokio::test]
async fn health_answers_without_a_database() -> anyhow::Result<()> {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await?.to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["status"], "healthy");

    Ok(())
}

#[tokio::test]
async fn root_names_the_service() -> anyhow::Result<()> {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await?.to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Karwan"));

    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> anyhow::Result<()> {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/no-such-route").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn registration_routes_require_a_bearer_token() -> anyhow::Result<()> {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/registration")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "flagshipId": "64f1b2a9c3d4e5f601234567", "price": 100.0 })
                        .to_string(),
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() -> anyhow::Result<()> {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/registration/pastPassport")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_subject_fails_before_any_lookup() -> anyhow::Result<()> {
    let app = test_app().await;

    // Valid token, but the subject is not an ObjectId; the handler rejects
    // it while parsing, before the first database call.
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/registration")
                .header(header::AUTHORIZATION, bearer_for("not-an-id"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "flagshipId": "64f1b2a9c3d4e5f601234567", "price": 100.0 })
                        .to_string(),
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await?.to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Invalid ID format");

    Ok(())
}

#[tokio::test]
async fn malformed_payment_id_is_a_400_not_a_409() -> anyhow::Result<()> {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::PATCH)
                .uri("/payment/approve-payment/not-an-objectid")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

const MULTIPART_BOUNDARY: &str = "karwan-payment-fields";

/// Well-formed create-payment form with a zeroed PNG part of the given size.
fn payment_form(screenshot_len: usize) -> Vec<u8> {
    let mut body = Vec::with_capacity(screenshot_len + 1024);

    for (name, value) in [
        ("registration", "64f1b2a9c3d4e5f601234567"),
        ("bankAccount", "64f1b2a9c3d4e5f601234568"),
        ("paymentType", "fullPayment"),
        ("amount", "45000"),
    ] {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"screenshot\"; filename=\"proof.png\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.resize(body.len() + screenshot_len, 0);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    body
}

fn payment_request(body: Vec<u8>) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/payment/create-payment")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(body))?)
}

#[tokio::test]
async fn oversized_screenshot_gets_the_specific_rejection() -> anyhow::Result<()> {
    let app = test_app().await;

    // Over the screenshot cap but under the request cap, so the rejection
    // must come from the handler's own size check, not the transport.
    let response = app
        .oneshot(payment_request(payment_form(10 * 1024 * 1024 + 512 * 1024))?)
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await?.to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["error"], "Screenshot too large");

    Ok(())
}

#[tokio::test]
async fn multi_megabyte_uploads_reach_the_storage_gate() -> anyhow::Result<()> {
    // No storage service is configured, so a fully parsed submission stops
    // at the 503 gate. Getting there proves the route accepts bodies well
    // past axum's stock limit.
    let app = test_app().await;

    let response = app
        .oneshot(payment_request(payment_form(3 * 1024 * 1024))?)
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response.into_body().collect().await?.to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["error"], "Service unavailable");

    Ok(())
}

#[tokio::test]
async fn refund_body_is_validated_before_any_write() -> anyhow::Result<()> {
    let app = test_app().await;

    // Empty reason fails shape validation; nothing reaches the database.
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/payment/refund")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "registration": "64f1b2a9c3d4e5f601234567",
                        "bankDetails": "HBL 01234567890",
                        "reason": "",
                        "feedback": "fine",
                        "rating": 3
                    })
                    .to_string(),
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
