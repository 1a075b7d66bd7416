pub mod config;
pub mod error;
pub mod general;

pub use error::{Error, Result};
pub use general::{DayMonthYear, Patch};
