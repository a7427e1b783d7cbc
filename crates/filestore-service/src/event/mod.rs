//! Read side of the audit trail.

pub mod service;

pub use service::EventLedger;
