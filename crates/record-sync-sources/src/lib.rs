pub mod discogs;
pub mod error;
pub mod notion;
pub mod progress;
pub mod traits;

pub use discogs::DiscogsClient;
pub use error::SourceError;
pub use notion::NotionClient;
pub use progress::ProgressTracker;
pub use traits::{RecordStore, ReleaseSource};
