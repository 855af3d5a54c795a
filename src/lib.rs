pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod model_store;
pub mod partition;
pub mod play_log;
pub mod play_store;
pub mod slicer;
pub mod team;
pub mod training;

pub use error::{LeadError, Result};
