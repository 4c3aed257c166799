//! REST client and resource managers.

mod client;
mod manager;

pub use client::{ApiClient, ApiResponse, RequestOptions};
pub use manager::{PostManager, ResourceManager};
