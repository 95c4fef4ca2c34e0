mod identifiers;
mod video;

pub use identifiers::{AttachmentId, VideoId};
pub use video::{FeedPage, NO_DESCRIPTION, VideoRecord};
