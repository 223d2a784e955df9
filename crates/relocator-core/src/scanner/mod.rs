pub mod walk;

pub use walk::{Candidates, DirectoryScanner};
