mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from faceprep for tests
pub use faceprep::{ContrastMode, Label, ManifestRow, PrepError, Preprocessor, TargetSize};
