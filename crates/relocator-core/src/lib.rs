pub mod config;
pub mod engine;
pub mod error;
pub mod filesystem;
pub mod marks;
pub mod model;
pub mod platform;
pub mod progress;
pub mod relocate;
pub mod roots;
pub mod scanner;
pub mod store;

pub use config::AppConfig;
pub use engine::RelocationEngine;
pub use error::Error;
pub use filesystem::{FileSystem, StdFileSystem};
pub use marks::PathMarks;
pub use model::{format_size, DirectoryEntry, DirectoryLinkRoot, Listing, RelocationStatus};
pub use progress::{ProgressReporter, RelocationAction, SilentReporter};
pub use roots::{RootDraft, RootList};
pub use store::Preferences;
