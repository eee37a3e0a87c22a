//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod activity;
pub mod event;
pub mod member;
pub mod payment;
pub mod registration;

// Re-export repositories
pub use activity::ActivityRepository;
pub use event::EventRepository;
pub use member::MemberRepository;
pub use payment::PaymentRepository;
pub use registration::RegistrationRepository;
