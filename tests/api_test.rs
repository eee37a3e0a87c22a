//! HTTP API tests
//!
//! Sends requests through the full router (auth, rate limiting, handlers)
//! over the in-memory store.

mod helpers;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use helpers::*;
use syncup::services::permission::MANAGE_EVENTS;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), content_type)
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body, _) = send(app, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn authed(method: Method, uri: &str, user_id: Uuid) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token(user_id)))
}

fn register_request(event_id: Uuid, user_id: Uuid, body: Option<Value>) -> Request<Body> {
    let uri = format!("/api/events/{}/registrations", event_id);
    match body {
        Some(body) => authed(Method::POST, &uri, user_id)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => authed(Method::POST, &uri, user_id).body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let app = ctx.app();

    let (status, body) = send_json(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database_healthy"], true);
    assert_eq!(body["realtime_enabled"], false);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new().await;
    let app = ctx.app();
    let uri = format!("/api/events/{}", Uuid::new_v4());

    let (status, body) = send_json(&app, Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let request = Request::get(&uri)
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_over_http() {
    let ctx = TestContext::new().await;
    let app = ctx.app();
    let event = ctx.add_event(TestEvent::new(ctx.organization_id).with_capacity(2).build());
    let user = ctx.add_user();

    let (status, body) = send_json(&app, register_request(event.id, user.id, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "registered");
    assert_eq!(body["attendee_count"], 1);
    assert_eq!(
        body["qr_code_data"],
        format!("{}/attendance/{}/{}", TEST_SITE_URL, event.id, user.id)
    );

    let uri = format!("/api/events/{}", event.id);
    let (status, body) = send_json(&app, authed(Method::GET, &uri, user.id).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendee_count"], 1);
    assert_eq!(body["registration"]["status"], "registered");
}

#[tokio::test]
async fn test_rejections_map_to_status_codes() {
    let ctx = TestContext::new().await;
    let app = ctx.app();
    let full = ctx.add_event(TestEvent::new(ctx.organization_id).with_capacity(1).build());
    let private = ctx.add_event(TestEvent::new(ctx.organization_id).members_only().build());
    let first = ctx.add_user();
    let second = ctx.add_user();

    send_json(&app, register_request(full.id, first.id, None)).await;

    let (status, body) = send_json(&app, register_request(full.id, second.id, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["state"], "rejected");
    assert_eq!(body["reason"], "event_full");
    assert_eq!(body["message"], "Event Full");

    let (status, body) = send_json(&app, register_request(private.id, second.id, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "not_member");

    let (status, body) = send_json(&app, register_request(Uuid::new_v4(), second.id, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "event_not_found");
}

#[tokio::test]
async fn test_payment_choice_then_online_checkout() {
    let ctx = TestContext::new().await;
    ctx.payments.mock_create_invoice().await;
    let app = ctx.app();
    let event = ctx.add_event(TestEvent::new(ctx.organization_id).with_fee(300).with_onsite(true).build());
    let user = ctx.add_user();

    let (status, body) = send_json(&app, register_request(event.id, user.id, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "awaiting_payment_choice");

    let choice = json!({ "payment_method": "online" });
    let (status, body) = send_json(&app, register_request(event.id, user.id, Some(choice))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "paying");
    assert_eq!(body["invoice_url"], TEST_INVOICE_URL);
    assert_eq!(body["registration"]["status"], "pending");
}

#[tokio::test]
async fn test_payment_webhook_checks_token() {
    let ctx = TestContext::new().await;
    ctx.payments.mock_create_invoice().await;
    let app = ctx.app();
    let event = ctx.add_event(TestEvent::new(ctx.organization_id).with_fee(300).build());
    let user = ctx.add_user();

    send_json(&app, register_request(event.id, user.id, None)).await;

    let payload = json!({
        "id": TEST_INVOICE_ID,
        "external_id": "event-test",
        "status": "PAID",
        "amount": 300,
    });

    let request = Request::post("/api/webhooks/payments")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-callback-token", "wrong-token")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(&ctx.store, event.id, user.id), Some(syncup::models::RegistrationStatus::Pending));

    let request = Request::post("/api/webhooks/payments")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-callback-token", TEST_CALLBACK_TOKEN)
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(body["result"], "confirmed");
    assert_eq!(status_of(&ctx.store, event.id, user.id), Some(syncup::models::RegistrationStatus::Registered));
}

#[tokio::test]
async fn test_unregister_over_http() {
    let ctx = TestContext::new().await;
    let app = ctx.app();
    let event = ctx.add_event(TestEvent::new(ctx.organization_id).build());
    let user = ctx.add_user();
    let uri = format!("/api/events/{}/registrations", event.id);

    send_json(&app, register_request(event.id, user.id, None)).await;

    let (status, body) = send_json(&app, authed(Method::DELETE, &uri, user.id).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendee_count"], 0);

    let (status, body) = send_json(&app, authed(Method::DELETE, &uri, user.id).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "registration_not_found");
}

#[tokio::test]
async fn test_csv_export() {
    let ctx = TestContext::new().await;
    let app = ctx.app();
    let event = ctx.add_event(TestEvent::new(ctx.organization_id).with_title("Leadership Summit").build());
    let user = ctx.add_user();
    let organizer = ctx.add_organizer(&[MANAGE_EVENTS]);
    let uri = format!("/api/events/{}/registrations/export", event.id);

    send_json(&app, register_request(event.id, user.id, None)).await;

    let (status, body, content_type) =
        send(&app, authed(Method::GET, &uri, organizer.id).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/csv; charset=utf-8"));

    let csv = String::from_utf8(body).unwrap();
    assert!(csv.starts_with("First Name,Last Name,Email,Status,Attendance,Registered At\n"));
    assert!(csv.contains(&user.email));

    // attendees cannot export
    let (status, _, _) = send(&app, authed(Method::GET, &uri, user.id).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_and_list_events() {
    let ctx = TestContext::new().await;
    let app = ctx.app();
    let organizer = ctx.add_organizer(&[MANAGE_EVENTS]);
    let member = ctx.add_member(&["member"], None);
    let uri = format!("/api/organizations/{}/events", ctx.organization_id);
    let starts_at = Utc::now() + Duration::days(3);

    let payload = json!({
        "title": "  General   Assembly ",
        "description": "Semester kickoff",
        "starts_at": starts_at,
        "ends_at": starts_at + Duration::hours(3),
        "location": "https://meet.example.com/kickoff",
        "capacity": 50,
        "photo_path": "kickoff.png",
    });
    let request = authed(Method::POST, &uri, organizer.id)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "General Assembly");

    let request = authed(Method::POST, &uri, member.id)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_json(&app, authed(Method::GET, &uri, member.id).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    // meeting links are not listed
    assert!(events[0]["location"].is_null());
    assert_eq!(
        events[0]["photo_url"],
        "https://storage.syncup.test/storage/v1/object/public/event-photos/kickoff.png"
    );
}

#[tokio::test]
async fn test_registration_rate_limit() {
    let ctx = TestContext::new().await;
    let mut settings = ctx.settings.clone();
    settings.rate_limit.registrations_per_minute = 2;
    let limiter = syncup::middleware::RegistrationRateLimiter::new(&settings.rate_limit).unwrap();
    let app = syncup::router(syncup::AppState::new(ctx.services.clone(), limiter));
    let event = ctx.add_event(TestEvent::new(ctx.organization_id).build());
    let user = ctx.add_user();

    let (first, _) = send_json(&app, register_request(event.id, user.id, None)).await;
    let (second, _) = send_json(&app, register_request(event.id, user.id, None)).await;
    let (third, body) = send_json(&app, register_request(event.id, user.id, None)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(third, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");
}
