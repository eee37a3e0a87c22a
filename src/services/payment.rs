//! Payment provider client
//!
//! Talks to a Xendit-style invoicing API: invoices are created with HTTP basic
//! auth (secret key, empty password) and settled through a webhook carrying
//! the provider's callback token.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PaymentsConfig;
use crate::database::DataStore;
use crate::models::{Payment, PaymentStatus};
use crate::utils::errors::{PaymentError, PaymentResult, Result, SyncUpError};
use crate::utils::helpers::generate_random_string;
use crate::utils::logging::{log_api_error, log_payment_event};

/// Invoice creation request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRequest {
    pub external_id: String,
    pub amount: i64,
    pub payer_email: String,
    pub description: String,
    pub currency: String,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
    /// Seconds until the provider expires the invoice
    pub invoice_duration: u64,
}

/// Invoice as returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub invoice_url: String,
    pub status: String,
    pub external_id: String,
}

/// Invoice callback body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCallback {
    pub id: String,
    pub external_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

/// Outcome carried by an invoice callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Paid,
    Expired,
    Failed,
    /// Statuses this service does not act on
    Other,
}

impl InvoiceCallback {
    pub fn outcome(&self) -> CallbackStatus {
        match self.status.trim().to_ascii_uppercase().as_str() {
            "PAID" | "SETTLED" => CallbackStatus::Paid,
            "EXPIRED" => CallbackStatus::Expired,
            "FAILED" => CallbackStatus::Failed,
            _ => CallbackStatus::Other,
        }
    }
}

/// HTTP client for the payment provider
#[derive(Clone, Debug)]
pub struct PaymentClient {
    client: Client,
    api_url: String,
    secret_key: String,
    callback_token: String,
    currency: String,
    invoice_duration: u64,
}

impl PaymentClient {
    /// Create a new PaymentClient instance
    pub fn new(config: &PaymentsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("SyncUp/1.0")
            .build()
            .map_err(SyncUpError::Http)?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            callback_token: config.callback_token.clone(),
            currency: config.currency.clone(),
            invoice_duration: config.invoice_duration_seconds,
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn invoice_duration(&self) -> u64 {
        self.invoice_duration
    }

    /// External id for a registration fee invoice
    pub fn new_external_id(&self, event_id: uuid::Uuid, user_id: uuid::Uuid) -> String {
        format!("event-{}-{}-{}", event_id, user_id, generate_random_string(8))
    }

    /// Create an invoice and return its hosted payment page
    pub async fn create_invoice(&self, request: &InvoiceRequest) -> PaymentResult<Invoice> {
        let url = format!("{}/v2/invoices", self.api_url);
        debug!(external_id = %request.external_id, amount = request.amount, "Creating invoice");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log_api_error("payments", &format!("HTTP {}", status), Some("create_invoice"));
            return Err(PaymentError::RequestFailed(format!("HTTP {}: {}", status, error_text)));
        }

        let invoice: Invoice = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        if invoice.invoice_url.is_empty() {
            return Err(PaymentError::InvalidResponse("missing invoice_url".to_string()));
        }

        log_payment_event(&invoice.id, "invoice_created", Some(request.amount));
        Ok(invoice)
    }

    /// Expire an open invoice so it can no longer be paid
    pub async fn expire_invoice(&self, invoice_id: &str) -> PaymentResult<()> {
        let url = format!("{}/invoices/{}/expire!", self.api_url, urlencoding::encode(invoice_id));

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(invoice_id = invoice_id, status = %status, "Failed to expire invoice");
            return Err(PaymentError::RequestFailed(format!("HTTP {}", status)));
        }

        info!(invoice_id = invoice_id, "Invoice expired");
        log_payment_event(invoice_id, "invoice_expired", None);
        Ok(())
    }

    /// Expire a recorded invoice at the provider and mark the payment expired.
    ///
    /// Failures are logged; the caller carries on either way.
    pub async fn cancel_payment(&self, store: &dyn DataStore, payment: &Payment) {
        if let Err(e) = self.expire_invoice(&payment.invoice_id).await {
            warn!(invoice_id = %payment.invoice_id, error = %e, "Failed to expire invoice");
        }
        if let Err(e) = store.update_payment_status(&payment.invoice_id, PaymentStatus::Expired).await {
            warn!(invoice_id = %payment.invoice_id, error = %e, "Failed to mark payment expired");
        }
    }

    /// Check the token the provider sends with every callback
    pub fn verify_callback_token(&self, token: Option<&str>) -> PaymentResult<()> {
        match token {
            Some(token) if !self.callback_token.is_empty() && token == self.callback_token => Ok(()),
            _ => Err(PaymentError::InvalidCallbackToken),
        }
    }
}

fn map_send_error(e: reqwest::Error) -> PaymentError {
    if e.is_timeout() {
        PaymentError::Timeout
    } else if e.is_connect() {
        PaymentError::ServiceUnavailable
    } else {
        PaymentError::RequestFailed(e.to_string())
    }
}
