mod client;
mod errors;
mod retry;

pub use client::FeedApi;
pub use errors::FeedApiError;
pub use retry::RetryPolicy;
