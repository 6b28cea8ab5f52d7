//! HTTP API for the processing service.
//!
//! Handlers are grouped by area:
//! - `upload`: single-file and ZIP intake
//! - `process`: starting runs and querying their state
//! - `health`: liveness and run counters

pub mod error;
pub mod health;
pub mod process;
pub mod response;
pub mod router;
pub mod upload;

use std::sync::Arc;

use lexpipe::{Config, ProcessingService};

pub use error::ApiError;
pub use response::ApiResponse;
pub use router::api_router;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProcessingService>,
    pub limits: UploadLimits,
}

impl AppState {
    pub fn new(service: Arc<ProcessingService>, config: &Config) -> Self {
        Self {
            service,
            limits: UploadLimits {
                max_file_bytes: config.max_file_size_bytes(),
                max_zip_bytes: config.max_zip_size_bytes(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_zip_bytes: usize,
}
