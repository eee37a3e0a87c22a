//! Registration flow state machine
//!
//! A registration attempt moves through
//! `idle -> checking_eligibility -> [awaiting_payment_choice] -> [paying] -> registered | rejected`.
//! Transitions outside that graph are refused with `InvalidStateTransition`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::eligibility::Rejection;
use crate::utils::errors::{Result, SyncUpError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    CheckingEligibility,
    AwaitingPaymentChoice,
    Paying { invoice_url: String },
    Registered,
    Rejected { reason: Rejection },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::CheckingEligibility => "checking_eligibility",
            FlowState::AwaitingPaymentChoice => "awaiting_payment_choice",
            FlowState::Paying { .. } => "paying",
            FlowState::Registered => "registered",
            FlowState::Rejected { .. } => "rejected",
        }
    }

    /// States a flow ends in for this request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::AwaitingPaymentChoice
                | FlowState::Paying { .. }
                | FlowState::Registered
                | FlowState::Rejected { .. }
        )
    }

    fn can_transition_to(&self, next: &FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (Idle, CheckingEligibility)
                | (CheckingEligibility, AwaitingPaymentChoice)
                | (CheckingEligibility, Paying { .. })
                | (CheckingEligibility, Registered)
                | (CheckingEligibility, Rejected { .. })
        )
    }
}

/// One registration attempt of a user for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationFlow {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub state: FlowState,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationFlow {
    pub fn new(event_id: Uuid, user_id: Uuid) -> Self {
        Self {
            event_id,
            user_id,
            state: FlowState::Idle,
            updated_at: Utc::now(),
        }
    }

    /// Move to the next state
    pub fn transition(&mut self, next: FlowState) -> Result<()> {
        if !self.state.can_transition_to(&next) {
            return Err(SyncUpError::InvalidStateTransition {
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }

        tracing::debug!(
            event_id = %self.event_id,
            user_id = %self.user_id,
            from = self.state.name(),
            to = next.name(),
            "Registration flow transition"
        );

        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn begin_check(&mut self) -> Result<()> {
        self.transition(FlowState::CheckingEligibility)
    }

    pub fn reject(&mut self, reason: Rejection) -> Result<()> {
        self.transition(FlowState::Rejected { reason })
    }
}
