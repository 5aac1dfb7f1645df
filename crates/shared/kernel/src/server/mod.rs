//! HTTP plumbing shared by every slice.

mod error;
mod health;
mod router;
mod state;

pub use error::{ApiError, ErrorBody, VALIDATION_ERRORS};
pub use router::system_router;
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateErrorExt, ApiStateInner};
