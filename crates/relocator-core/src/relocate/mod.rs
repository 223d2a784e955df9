pub mod compare;
pub mod copier;
pub mod junction;
pub mod path_map;
pub mod status;

pub use compare::structurally_equal;
pub use copier::{clear_read_only_tree, copy_tree};
pub use junction::{JunctionManager, PathClaim};
pub use path_map::{map_to_backup, map_to_original};
pub use status::classify;
