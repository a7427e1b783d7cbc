//! HTTP middleware.

pub mod cors;
pub mod envelope;
pub mod logging;
