//! Kernel utilities shared across slices.
//! Keep this crate lightweight: configuration loading, the shared [`server::ApiState`],
//! the JSON error envelope, and the system endpoints.
//!
//! ## Config loading
//! ```rust,no_run
//! use cape_kernel::config::load_config;
//! use cape_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(Some("server")).unwrap_or_default();
//! assert!(cfg.server.port > 0);
//! ```

pub mod config;
pub mod server;

pub use cape_domain as domain;
