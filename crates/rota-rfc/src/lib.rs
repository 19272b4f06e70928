//! RFC 5545 recurrence support for shift series.

pub mod error;
pub mod rfc;
