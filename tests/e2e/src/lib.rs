//! End-to-end test support for the Reverie engine
//!
//! - [`harness::TestDatabaseManager`]: isolated temporary databases wired to
//!   a query service
//! - [`mocks::TestDataFactory`]: journaling fixtures and pre-built scenarios

pub mod harness;
pub mod mocks;
