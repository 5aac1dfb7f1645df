//! # Domain Models
//!
//! Pure data shared by every layer: configuration, well-known names, and the slice registry.
//! Keep it lean: no I/O, networking, or heavy logic.

pub mod config;
pub mod constants;
pub mod registry;
