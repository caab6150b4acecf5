mod file;
mod size;
mod user;

pub use file::{FileKind, FileTypeDetector, HEADER_SNIFF_LEN};
pub use size::PreviewSize;
pub use user::{Permissions, Rule, User};
