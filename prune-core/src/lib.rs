pub mod concurrency;
pub mod error;
pub mod file_system;
pub mod output_macros;

pub use concurrency::worker_count;
