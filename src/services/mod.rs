//! Service layer module
//!
//! Contains the credential pool, failure classification, the resilient
//! completion client and the consultant pipeline built on it

pub mod client;
pub mod consultant;
pub mod key_pool;
pub mod rate_limit;

pub use client::*;
pub use consultant::{Answer, ConsultOptions, ConsultRequest, Consultant, Consultation};
pub use key_pool::KeyPool;
pub use rate_limit::{classify, parse_wait_hint, Backoff, FailureKind};
