//! Input files, column mappings and multipart encoding
//!
//! An [`UploadBundle`] collects the three source files, the column-rename tables
//! chosen after previewing them, and the constraint toggles. It validates itself
//! locally and encodes itself as the multipart form the submission endpoint
//! expects.

mod bundle;
mod file;
mod mapping;
mod preview;

pub use bundle::UploadBundle;
pub use file::UploadFile;
pub use mapping::{ColumnDiff, ColumnMapping, Row, column_diff, column_mappings_json};
pub use preview::PreviewResponse;
