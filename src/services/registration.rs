//! Registration workflow
//!
//! Drives a [`RegistrationFlow`] from eligibility through the payment branch
//! to a registered (or pending) row, and settles pending rows from payment
//! provider callbacks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::{DataStore, InsertOutcome};
use crate::models::activity::{ACTION_PAYMENT_STARTED, ACTION_REGISTERED, ACTION_UNREGISTERED};
use crate::models::{
    Event, EventRegistration, NewActivity, NewPayment, NewRegistration, Payment, PaymentStatus,
    RegistrationStatus, UpdateRegistrationRequest, UserProfile,
};
use crate::models::payment::TARGET_EVENT_REGISTRATION;
use crate::services::eligibility::{self, Eligibility, EligibilitySnapshot, Rejection};
use crate::services::notification::NotificationService;
use crate::services::payment::{CallbackStatus, InvoiceCallback, InvoiceRequest, PaymentClient};
use crate::services::qr::QrService;
use crate::state::{FlowState, RegistrationFlow};
use crate::utils::errors::{Result, SyncUpError};
use crate::utils::helpers::is_valid_email;
use crate::utils::logging::{log_payment_event, log_registration_action, log_registration_rejected};

/// How the attendee pays a registration fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChoice {
    Onsite,
    Online,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub payment_method: Option<PaymentChoice>,
}

/// Final state of a registration attempt plus the data the client renders
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    #[serde(flatten)]
    pub state: FlowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub registration: Option<EventRegistration>,
    pub qr_code_data: Option<String>,
    pub attendee_count: i64,
}

impl RegistrationOutcome {
    pub fn rejection(&self) -> Option<Rejection> {
        match &self.state {
            FlowState::Rejected { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// Eligibility as seen by the user right now
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    pub already_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub attendee_count: i64,
    pub capacity: Option<i32>,
    pub requires_payment: bool,
    /// True when the user must pick between paying onsite or online
    pub payment_choice_required: bool,
    #[serde(skip)]
    pub registration: Option<EventRegistration>,
    #[serde(skip)]
    pub eligibility: Eligibility,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnregisterOutcome {
    pub event_id: Uuid,
    pub attendee_count: i64,
}

/// What a payment callback did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackResult {
    Confirmed,
    Released,
    Ignored,
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn DataStore>,
    payments: PaymentClient,
    qr: QrService,
    notifications: NotificationService,
    site_url: String,
}

impl RegistrationService {
    /// Create a new RegistrationService instance
    pub fn new(
        store: Arc<dyn DataStore>,
        payments: PaymentClient,
        qr: QrService,
        notifications: NotificationService,
        site_url: &str,
    ) -> Self {
        Self {
            store,
            payments,
            qr,
            notifications,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    async fn load_event(&self, event_id: Uuid) -> Result<Event> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(SyncUpError::EventNotFound { event_id })
    }

    /// Evaluate eligibility against freshly read registration, count and membership
    pub async fn check_eligibility(&self, event: &Event, user_id: Uuid, now: DateTime<Utc>) -> Result<EligibilityReport> {
        let registration = self.store.find_registration(event.id, user_id).await?;
        let attendee_count = self.store.count_registrations(event.id).await?;
        let membership = if event.is_private() {
            self.store.find_member_access(event.organization_id, user_id).await?
        } else {
            None
        };

        let eligibility = eligibility::check(&EligibilitySnapshot {
            event,
            registration: registration.as_ref(),
            attendee_count,
            membership: membership.as_ref(),
            now,
        });

        let reason = match &eligibility {
            Eligibility::Rejected(reason) => Some(*reason),
            _ => None,
        };

        Ok(EligibilityReport {
            eligible: eligibility == Eligibility::Eligible,
            already_registered: eligibility == Eligibility::AlreadyRegistered,
            reason,
            message: reason.map(|r| r.message().to_string()),
            attendee_count,
            capacity: event.capacity,
            requires_payment: event.requires_payment(),
            payment_choice_required: event.requires_payment() && event.onsite,
            registration,
            eligibility,
        })
    }

    /// Eligibility of a user for an event, by id
    pub async fn eligibility(&self, event_id: Uuid, user_id: Uuid) -> Result<EligibilityReport> {
        let event = self.load_event(event_id).await?;
        self.check_eligibility(&event, user_id, Utc::now()).await
    }

    /// Register a user for an event
    pub async fn register(&self, event_id: Uuid, user_id: Uuid, request: RegisterRequest) -> Result<RegistrationOutcome> {
        let mut flow = RegistrationFlow::new(event_id, user_id);
        flow.begin_check()?;

        let event = self.load_event(event_id).await?;
        let report = self.check_eligibility(&event, user_id, Utc::now()).await?;

        match report.eligibility {
            Eligibility::AlreadyRegistered => {
                if let Some(existing) = report.registration {
                    return self.existing_registration(&mut flow, &event, existing).await;
                }
            }
            Eligibility::Rejected(reason) => {
                return self.rejected(&mut flow, reason, report.attendee_count);
            }
            _ => {}
        }

        if !event.requires_payment() {
            return self.register_directly(&mut flow, &event).await;
        }

        match (event.onsite, request.payment_method) {
            (true, None) => {
                flow.transition(FlowState::AwaitingPaymentChoice)?;
                Ok(RegistrationOutcome {
                    state: flow.state,
                    message: None,
                    registration: None,
                    qr_code_data: None,
                    attendee_count: report.attendee_count,
                })
            }
            (true, Some(PaymentChoice::Onsite)) => self.register_directly(&mut flow, &event).await,
            _ => self.start_online_payment(&mut flow, &event).await,
        }
    }

    async fn register_directly(&self, flow: &mut RegistrationFlow, event: &Event) -> Result<RegistrationOutcome> {
        let outcome = self
            .store
            .insert_registration(NewRegistration {
                event_id: event.id,
                user_id: flow.user_id,
                status: RegistrationStatus::Registered,
            })
            .await?;

        let registration = match outcome {
            InsertOutcome::Inserted(registration) => registration,
            InsertOutcome::AlreadyRegistered(existing) => {
                return self.existing_registration(flow, event, existing).await;
            }
            InsertOutcome::Full => {
                let count = self.store.count_registrations(event.id).await?;
                return self.rejected(flow, Rejection::EventFull, count);
            }
        };

        let qr_code_data = self.qr.ensure_qr_code(self.store.as_ref(), event, &registration).await?;
        flow.transition(FlowState::Registered)?;

        log_registration_action(event.id, flow.user_id, "registered", None);
        self.notifications.registered(event, flow.user_id).await;
        self.notifications
            .record_activity(NewActivity::new(
                event.organization_id,
                flow.user_id,
                ACTION_REGISTERED,
                json!({ "event_id": event.id, "event_title": event.title }),
            ))
            .await;

        let attendee_count = self.store.count_registrations(event.id).await?;
        Ok(RegistrationOutcome {
            state: flow.state.clone(),
            message: None,
            registration: Some(registration),
            qr_code_data,
            attendee_count,
        })
    }

    async fn load_payer(&self, user_id: Uuid) -> Result<UserProfile> {
        let payer = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(SyncUpError::UserNotFound { user_id })?;

        if !is_valid_email(&payer.email) {
            return Err(SyncUpError::InvalidInput(
                "A valid email address is required for online payment".to_string(),
            ));
        }

        Ok(payer)
    }

    async fn start_online_payment(&self, flow: &mut RegistrationFlow, event: &Event) -> Result<RegistrationOutcome> {
        let user_id = flow.user_id;
        let payer = self.load_payer(user_id).await?;

        let outcome = self
            .store
            .insert_registration(NewRegistration {
                event_id: event.id,
                user_id,
                status: RegistrationStatus::Pending,
            })
            .await?;

        let pending = match outcome {
            InsertOutcome::Inserted(registration) => registration,
            InsertOutcome::AlreadyRegistered(existing) => {
                return self.existing_registration(flow, event, existing).await;
            }
            InsertOutcome::Full => {
                let count = self.store.count_registrations(event.id).await?;
                return self.rejected(flow, Rejection::EventFull, count);
            }
        };

        self.issue_invoice(flow, event, &payer, pending).await
    }

    /// Create and record an invoice for a pending row, releasing the row on failure
    async fn issue_invoice(
        &self,
        flow: &mut RegistrationFlow,
        event: &Event,
        payer: &UserProfile,
        pending: EventRegistration,
    ) -> Result<RegistrationOutcome> {
        let user_id = pending.user_id;
        let event_url = format!("{}/events/{}", self.site_url, event.id);
        let invoice_request = InvoiceRequest {
            external_id: self.payments.new_external_id(event.id, user_id),
            amount: event.registration_fee,
            payer_email: payer.email.clone(),
            description: format!("Registration fee for {}", event.title),
            currency: self.payments.currency().to_string(),
            success_redirect_url: format!("{}?payment=success", event_url),
            failure_redirect_url: format!("{}?payment=failed", event_url),
            invoice_duration: self.payments.invoice_duration(),
        };

        let invoice = match self.payments.create_invoice(&invoice_request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                warn!(event_id = %event.id, user_id = %user_id, error = %e, "Invoice creation failed, releasing seat");
                self.release_pending(event.id, user_id).await;
                return Err(e.into());
            }
        };

        let payment = NewPayment {
            invoice_id: invoice.id.clone(),
            invoice_url: invoice.invoice_url.clone(),
            external_id: invoice.external_id.clone(),
            amount: event.registration_fee,
            target_type: TARGET_EVENT_REGISTRATION.to_string(),
            target_id: event.id,
            organization_id: event.organization_id,
            user_id,
        };

        if let Err(e) = self.store.insert_payment(payment).await {
            warn!(invoice_id = %invoice.id, error = %e, "Failed to record payment, expiring invoice");
            if let Err(expire_err) = self.payments.expire_invoice(&invoice.id).await {
                warn!(invoice_id = %invoice.id, error = %expire_err, "Failed to expire invoice");
            }
            self.release_pending(event.id, user_id).await;
            return Err(e);
        }

        flow.transition(FlowState::Paying {
            invoice_url: invoice.invoice_url.clone(),
        })?;

        log_registration_action(event.id, user_id, "payment_started", Some(&invoice.id));
        self.notifications.payment_pending(event, user_id).await;
        self.notifications
            .record_activity(NewActivity::new(
                event.organization_id,
                user_id,
                ACTION_PAYMENT_STARTED,
                json!({ "event_id": event.id, "invoice_id": invoice.id, "amount": event.registration_fee }),
            ))
            .await;

        let attendee_count = self.store.count_registrations(event.id).await?;
        Ok(RegistrationOutcome {
            state: flow.state.clone(),
            message: None,
            registration: Some(pending),
            qr_code_data: None,
            attendee_count,
        })
    }

    /// The user already holds a row: registered, or pending on an invoice
    async fn existing_registration(
        &self,
        flow: &mut RegistrationFlow,
        event: &Event,
        existing: EventRegistration,
    ) -> Result<RegistrationOutcome> {
        let (state, qr_code_data) = match existing.status {
            RegistrationStatus::Registered => {
                let qr = self.qr.ensure_qr_code(self.store.as_ref(), event, &existing).await?;
                (FlowState::Registered, qr)
            }
            RegistrationStatus::Pending => {
                match self.store.find_open_payment(event.id, existing.user_id).await? {
                    Some(payment) => (FlowState::Paying { invoice_url: payment.invoice_url }, None),
                    None => {
                        info!(event_id = %event.id, user_id = %existing.user_id, "Pending registration has no open invoice, issuing a new one");
                        let payer = self.load_payer(existing.user_id).await?;
                        return self.issue_invoice(flow, event, &payer, existing).await;
                    }
                }
            }
        };

        debug!(event_id = %event.id, user_id = %existing.user_id, state = state.name(), "User already registered");
        flow.transition(state)?;

        let attendee_count = self.store.count_registrations(event.id).await?;
        Ok(RegistrationOutcome {
            state: flow.state.clone(),
            message: Some("You are already registered for this event.".to_string()),
            registration: Some(existing),
            qr_code_data,
            attendee_count,
        })
    }

    fn rejected(&self, flow: &mut RegistrationFlow, reason: Rejection, attendee_count: i64) -> Result<RegistrationOutcome> {
        log_registration_rejected(flow.event_id, flow.user_id, reason.code());
        flow.reject(reason)?;

        Ok(RegistrationOutcome {
            state: flow.state.clone(),
            message: Some(reason.message().to_string()),
            registration: None,
            qr_code_data: None,
            attendee_count,
        })
    }

    async fn release_pending(&self, event_id: Uuid, user_id: Uuid) {
        match self.store.delete_registration(event_id, user_id).await {
            Ok(_) => log_registration_action(event_id, user_id, "pending_released", None),
            Err(e) => warn!(event_id = %event_id, user_id = %user_id, error = %e, "Failed to release pending registration"),
        }
    }

    /// Remove the user's registration and return the fresh attendee count
    pub async fn unregister(&self, event_id: Uuid, user_id: Uuid) -> Result<UnregisterOutcome> {
        let event = self.load_event(event_id).await?;

        if let Some(payment) = self.store.find_open_payment(event_id, user_id).await? {
            self.payments.cancel_payment(self.store.as_ref(), &payment).await;
        }

        let deleted = self.store.delete_registration(event_id, user_id).await?;
        if deleted == 0 {
            return Err(SyncUpError::RegistrationNotFound { event_id, user_id });
        }

        log_registration_action(event_id, user_id, "unregistered", None);
        self.notifications.unregistered(&event, user_id).await;
        self.notifications
            .record_activity(NewActivity::new(
                event.organization_id,
                user_id,
                ACTION_UNREGISTERED,
                json!({ "event_id": event.id, "event_title": event.title }),
            ))
            .await;

        let attendee_count = self.store.count_registrations(event_id).await?;
        Ok(UnregisterOutcome { event_id, attendee_count })
    }

    /// Settle a pending registration from a payment provider callback
    pub async fn handle_payment_callback(&self, callback: InvoiceCallback) -> Result<CallbackResult> {
        let Some(payment) = self.store.find_payment_by_invoice(&callback.id).await? else {
            info!(invoice_id = %callback.id, "Callback for unknown invoice ignored");
            return Ok(CallbackResult::Ignored);
        };

        if payment.target_type != TARGET_EVENT_REGISTRATION || payment.status.is_final() {
            debug!(invoice_id = %payment.invoice_id, status = %payment.status, "Callback for settled invoice ignored");
            return Ok(CallbackResult::Ignored);
        }

        match callback.outcome() {
            CallbackStatus::Paid => self.confirm_payment(&payment).await,
            CallbackStatus::Expired => self.release_payment(&payment, PaymentStatus::Expired).await,
            CallbackStatus::Failed => self.release_payment(&payment, PaymentStatus::Failed).await,
            CallbackStatus::Other => {
                debug!(invoice_id = %payment.invoice_id, status = %callback.status, "Callback status ignored");
                Ok(CallbackResult::Ignored)
            }
        }
    }

    /// The payment is marked paid last, so a failed step leaves it open and
    /// the provider's retry settles it again.
    async fn confirm_payment(&self, payment: &Payment) -> Result<CallbackResult> {
        let event_id = payment.target_id;
        let user_id = payment.user_id;
        let update = UpdateRegistrationRequest {
            status: Some(RegistrationStatus::Registered),
            attendance: None,
        };

        let Some(registration) = self.store.update_registration(event_id, user_id, update).await? else {
            warn!(invoice_id = %payment.invoice_id, event_id = %event_id, user_id = %user_id, "Paid invoice has no registration");
            self.store.update_payment_status(&payment.invoice_id, PaymentStatus::Paid).await?;
            log_payment_event(&payment.invoice_id, "paid", Some(payment.amount));
            return Ok(CallbackResult::Ignored);
        };

        let event = self.load_event(event_id).await?;
        self.qr.ensure_qr_code(self.store.as_ref(), &event, &registration).await?;

        self.store.update_payment_status(&payment.invoice_id, PaymentStatus::Paid).await?;
        log_payment_event(&payment.invoice_id, "paid", Some(payment.amount));

        log_registration_action(event_id, user_id, "registered", Some(&payment.invoice_id));
        self.notifications.registered(&event, user_id).await;
        self.notifications
            .record_activity(NewActivity::new(
                event.organization_id,
                user_id,
                ACTION_REGISTERED,
                json!({ "event_id": event.id, "event_title": event.title, "invoice_id": payment.invoice_id }),
            ))
            .await;

        Ok(CallbackResult::Confirmed)
    }

    async fn release_payment(&self, payment: &Payment, status: PaymentStatus) -> Result<CallbackResult> {
        self.store.update_payment_status(&payment.invoice_id, status).await?;
        log_payment_event(&payment.invoice_id, status.as_str(), Some(payment.amount));

        let event_id = payment.target_id;
        let user_id = payment.user_id;
        let registration = self.store.find_registration(event_id, user_id).await?;

        if let Some(registration) = registration {
            if registration.status == RegistrationStatus::Pending {
                self.release_pending(event_id, user_id).await;
                if let Some(event) = self.store.find_event(event_id).await? {
                    self.notifications.payment_failed(&event, user_id).await;
                }
            }
        }

        Ok(CallbackResult::Released)
    }
}
