//! A single selected input file

use crate::error::Result;
use reqwest::multipart::Part;
use std::path::Path;

/// A file picked by the user: its name and its full contents
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl UploadFile {
    /// Wrap in-memory contents under the given file name
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!(path = %path.display(), size = bytes.len(), "loaded input file");
        Ok(Self { file_name, bytes })
    }

    /// File name as sent in the multipart part
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no contents
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content type derived from the extension
    pub fn mime_type(&self) -> &'static str {
        let lower = self.file_name.to_lowercase();
        if lower.ends_with(".csv") {
            "text/csv"
        } else if lower.ends_with(".xlsx") {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        } else {
            "application/octet-stream"
        }
    }

    /// Multipart part carrying this file
    pub(crate) fn to_part(&self) -> std::result::Result<Part, reqwest::Error> {
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(self.mime_type())
    }
}

// Contents can be megabytes; show only the size.
impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_path_uses_final_component_as_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.csv");
        tokio::fs::write(&path, b"Course code,Credits\nCS101,4\n")
            .await
            .unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name(), "courses.csv");
        assert_eq!(file.len(), 28);
        assert!(!file.is_empty());
    }

    #[tokio::test]
    async fn from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadFile::from_path(dir.path().join("nope.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(UploadFile::new("a.CSV", "x").mime_type(), "text/csv");
        assert!(UploadFile::new("b.xlsx", "x").mime_type().contains("spreadsheetml"));
        assert_eq!(
            UploadFile::new("c.bin", "x").mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn debug_output_omits_contents() {
        let file = UploadFile::new("secret.csv", "Name,Busy Slot\nDr. X,Mon 9\n");
        let dbg = format!("{file:?}");
        assert!(dbg.contains("secret.csv"));
        assert!(!dbg.contains("Dr. X"));
    }
}
