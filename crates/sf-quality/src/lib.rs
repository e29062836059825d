//! sf-quality - Data-quality checks for Sparkify ETL
//!
//! A check is a query returning one scalar and the value it must equal.
//! The runner evaluates every check in order, never stopping early, and
//! reports which ones failed.

pub mod error;
pub mod runner;

pub use error::QualityError;
pub use runner::{CheckOutcome, CheckReport, CheckResult, CheckRunner};
