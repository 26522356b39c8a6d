//! ExRate Common Types
//!
//! This crate contains shared types used across ExRate, including the closed
//! currency set, rate sources and frequencies, rate observations and calendar
//! helpers.

pub mod currency;
pub mod rates;
pub mod error;
pub mod time;

pub use currency::*;
pub use rates::*;
pub use error::*;
pub use time::*;
