//! Axum plumbing shared by every slice: the application state and the system routes.

mod health;
pub mod router;
pub mod state;

pub use state::{ApiState, ApiStateBuilder, ApiStateError};
