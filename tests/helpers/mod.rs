//! Test helpers module
//!
//! In-memory store, mock payment provider, database and Redis helpers, and fixtures
//! shared by the integration tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod memory_store;
pub mod payments_mock;
pub mod redis_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use memory_store::*;
pub use payments_mock::*;
pub use redis_helper::*;
pub use test_context::*;
pub use test_data::*;
