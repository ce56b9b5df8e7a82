//! Shared types for the restaurant core
//!
//! Domain models, domain events and the unified error system used by
//! resto-server and its HTTP clients.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorBody, ErrorCode};
pub use message::{DomainEvent, EventType};
