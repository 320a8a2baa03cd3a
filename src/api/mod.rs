mod client;
mod error;
pub mod types;

pub use client::{ApiClient, SweepApi};
pub use error::{ApiError, ApiResult};
