pub mod errors;

pub use errors::{ControllerError, MediaError};
