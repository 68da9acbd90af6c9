pub mod constants;
pub mod paths;
pub mod progress;
pub mod statistics;

pub use constants::*;
pub use paths::{buildings_path, chart_path, map_path, precipitation_cache_path};
pub use progress::ProgressReporter;
