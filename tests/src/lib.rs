//! Shared helpers for purge integration tests.

pub mod mocks;
pub mod setup;
