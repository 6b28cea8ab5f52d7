pub mod filesystem;
pub mod results;

pub use filesystem::{ensure_directory, FileStorage};
pub use results::ResultArchive;
