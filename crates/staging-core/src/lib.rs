pub mod chart;
pub mod config;
pub mod decision;
pub mod error;
pub mod github;
pub mod io;
pub mod paths;
pub mod staging;
pub mod values;

pub use error::{Result, StagingError};
