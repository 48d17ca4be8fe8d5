//! Service layer for the matchforge engines
//!
//! This module contains the application state and the single-writer workers
//! that serialize access to each domain.

pub mod app;
pub mod worker;

pub use app::{AppState, ServiceError};
pub use worker::DomainWorker;
