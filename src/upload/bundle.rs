//! The full set of inputs for one submission

use super::file::UploadFile;
use super::mapping::{ColumnMapping, column_mappings_json};
use crate::config::Config;
use crate::error::{FileIssue, FileProblem, ValidationError};
use crate::types::{SourceFile, Toggle};
use reqwest::multipart::Form;
use std::collections::BTreeMap;

/// Three source files, their column mappings and the constraint toggles
#[derive(Clone, Debug, Default)]
pub struct UploadBundle {
    files: BTreeMap<SourceFile, UploadFile>,
    column_mappings: BTreeMap<SourceFile, ColumnMapping>,
    toggles: BTreeMap<Toggle, bool>,
}

impl UploadBundle {
    /// Empty bundle: no files, no mappings, every toggle off
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_file`](Self::set_file)
    pub fn with_file(mut self, file: SourceFile, upload: UploadFile) -> Self {
        self.set_file(file, upload);
        self
    }

    /// Builder form of [`set_toggle`](Self::set_toggle)
    pub fn with_toggle(mut self, toggle: Toggle, enabled: bool) -> Self {
        self.set_toggle(toggle, enabled);
        self
    }

    /// Select `upload` for `file`, returning the previous selection
    pub fn set_file(&mut self, file: SourceFile, upload: UploadFile) -> Option<UploadFile> {
        self.files.insert(file, upload)
    }

    /// Drop the selection for `file`
    pub fn remove_file(&mut self, file: SourceFile) -> Option<UploadFile> {
        self.files.remove(&file)
    }

    /// Selected upload for `file`
    pub fn file(&self, file: SourceFile) -> Option<&UploadFile> {
        self.files.get(&file)
    }

    /// Replace the rename table for `file`
    pub fn set_mapping(&mut self, file: SourceFile, mapping: ColumnMapping) {
        self.column_mappings.insert(file, mapping);
    }

    /// Forget the rename table for `file`
    pub fn clear_mapping(&mut self, file: SourceFile) {
        self.column_mappings.remove(&file);
    }

    /// Rename table for `file`, if one was set
    pub fn mapping(&self, file: SourceFile) -> Option<&ColumnMapping> {
        self.column_mappings.get(&file)
    }

    /// Switch a constraint on or off
    pub fn set_toggle(&mut self, toggle: Toggle, enabled: bool) {
        self.toggles.insert(toggle, enabled);
    }

    /// Current value of a constraint; unset toggles are off
    pub fn toggle(&self, toggle: Toggle) -> bool {
        self.toggles.get(&toggle).copied().unwrap_or(false)
    }

    /// Check every file before anything is sent
    ///
    /// All failing files are reported, each with every problem that applies.
    pub fn validate(&self, config: &Config) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        for file in SourceFile::ALL {
            let Some(upload) = self.files.get(&file) else {
                issues.push(FileIssue {
                    file,
                    problem: FileProblem::Missing,
                });
                continue;
            };
            if upload.is_empty() {
                issues.push(FileIssue {
                    file,
                    problem: FileProblem::Empty,
                });
            }
            if !config.is_allowed_file_name(upload.file_name()) {
                issues.push(FileIssue {
                    file,
                    problem: FileProblem::UnsupportedExtension {
                        file_name: upload.file_name().to_string(),
                    },
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Text fields of the multipart body, in the order they are sent
    ///
    /// `column_mappings` comes first, then one `true`/`false` field per toggle.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(1 + Toggle::ALL.len());
        fields.push((
            "column_mappings",
            column_mappings_json(&self.column_mappings).to_string(),
        ));
        for toggle in Toggle::ALL {
            fields.push((toggle.field_name(), self.toggle(toggle).to_string()));
        }
        fields
    }

    /// Encode as the submission endpoint's multipart form
    pub(crate) fn to_form(&self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for file in SourceFile::ALL {
            if let Some(upload) = self.files.get(&file) {
                form = form.part(file.part_name(), upload.to_part()?);
            }
        }
        for (name, value) in self.form_fields() {
            form = form.text(name, value);
        }
        Ok(form)
    }
}
