//! Shared test utilities for lexpipe integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated service instances backed by temp directories
//! - Builders for configs and scripted collaborators

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
