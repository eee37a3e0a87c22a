//! Registration flow state
//!
//! Explicit state machine for a single registration attempt.

pub mod flow;

pub use flow::{FlowState, RegistrationFlow};
