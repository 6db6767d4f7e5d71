pub mod record;
pub mod tag;

pub use record::{Record, ReleaseInfo};
pub use tag::{tag_color, Tag};
