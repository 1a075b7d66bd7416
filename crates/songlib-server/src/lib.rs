pub mod config;
pub mod error;
pub mod run;
pub mod stub;

pub use error::{Error, Result};
pub use run::build_state;
