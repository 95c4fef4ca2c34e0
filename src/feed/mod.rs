//! The scrolling feed: which record is active, which items are mounted,
//! and when another page is needed.

mod registry;

pub use registry::{ElementProvider, FeedRegistry};
