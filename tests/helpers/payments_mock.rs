//! Mock payment provider for testing
//!
//! Simulates the invoice API with wiremock: invoice creation, expiry and
//! failure responses.

use serde_json::json;
use wiremock::{
    matchers::{method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_INVOICE_ID: &str = "inv_test_0001";
pub const TEST_INVOICE_URL: &str = "https://checkout.example.com/web/inv_test_0001";

/// Mock invoice API server
pub struct PaymentsMockServer {
    pub server: MockServer,
}

impl PaymentsMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn api_url(&self) -> String {
        self.server.uri()
    }

    /// Invoice creation succeeds with [`TEST_INVOICE_ID`]
    pub async fn mock_create_invoice(&self) {
        Mock::given(method("POST"))
            .and(path("/v2/invoices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": TEST_INVOICE_ID,
                "invoice_url": TEST_INVOICE_URL,
                "status": "PENDING",
                "external_id": "event-test",
            })))
            .mount(&self.server)
            .await;
    }

    /// Invoice creation fails with the given status
    pub async fn mock_create_invoice_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/v2/invoices"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error_code": "API_VALIDATION_ERROR",
                "message": "amount is invalid",
            })))
            .mount(&self.server)
            .await;
    }

    /// Invoice expiry succeeds; `expected` pins how many calls must arrive
    pub async fn mock_expire_invoice(&self, expected: u64) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/invoices/[^/]+/expire!$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": TEST_INVOICE_ID,
                "status": "EXPIRED",
            })))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
