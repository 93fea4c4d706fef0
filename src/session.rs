//! One user's submission in progress
//!
//! [`SubmissionSession`] holds the selected files, their previews, the
//! confirmed column mappings and the constraint toggles, and drives the whole
//! submit-then-poll run once everything is ready.

use crate::client::SubmissionClient;
use crate::config::Config;
use crate::error::{FileIssue, FileProblem, Result, ValidationError};
use crate::poller::TaskPoller;
use crate::progress::ProgressSink;
use crate::types::{SourceFile, TaskStatus, Toggle};
use crate::upload::{ColumnDiff, ColumnMapping, PreviewResponse, Row, UploadBundle, UploadFile, column_diff};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Selection, previews and mappings for one submission
#[derive(Clone, Debug, Default)]
pub struct SubmissionSession {
    bundle: UploadBundle,
    previews: BTreeMap<SourceFile, PreviewResponse>,
}

impl SubmissionSession {
    /// Session with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `upload` for `file`
    ///
    /// The old preview and mapping of `file` describe a different upload and
    /// are dropped.
    pub fn select(&mut self, file: SourceFile, upload: UploadFile) {
        tracing::debug!(
            file = file.preview_key(),
            file_name = upload.file_name(),
            bytes = upload.len(),
            "file selected"
        );
        self.bundle.set_file(file, upload);
        self.bundle.clear_mapping(file);
        self.previews.remove(&file);
    }

    /// Store the preview of `file` and return the server's column comparison
    ///
    /// A new preview invalidates any mapping confirmed for the previous one.
    pub fn record_preview(&mut self, file: SourceFile, response: PreviewResponse) -> ColumnDiff {
        if let Some(error) = &response.error {
            tracing::warn!(file = file.preview_key(), error = %error, "preview reported a problem");
        }
        let diff = response.column_diff();
        self.bundle.clear_mapping(file);
        self.previews.insert(file, response);
        diff
    }

    /// Store `mapping` for `file` and rename its preview rows accordingly
    ///
    /// Returns how the renamed columns compare with the expected set, so a UI
    /// can tell whether the mapping resolved every mismatch.
    pub fn confirm_mapping(&mut self, file: SourceFile, mapping: ColumnMapping) -> ColumnDiff {
        let diff = match self.previews.get_mut(&file) {
            Some(preview) => {
                preview.preview = preview.preview.iter().map(|row| mapping.apply(row)).collect();
                let columns = preview.columns();
                column_diff(file, &columns)
            }
            None => ColumnDiff::default(),
        };
        tracing::debug!(file = file.preview_key(), renames = mapping.len(), "column mapping confirmed");
        self.bundle.set_mapping(file, mapping);
        diff
    }

    /// Switch a constraint on or off
    pub fn set_toggle(&mut self, toggle: Toggle, enabled: bool) {
        self.bundle.set_toggle(toggle, enabled);
    }

    /// Recorded preview of `file`
    pub fn preview(&self, file: SourceFile) -> Option<&PreviewResponse> {
        self.previews.get(&file)
    }

    /// Preview rows of `file`, renamed by any confirmed mapping
    pub fn preview_rows(&self, file: SourceFile) -> &[Row] {
        self.previews
            .get(&file)
            .map(|p| p.preview.as_slice())
            .unwrap_or_default()
    }

    /// Check that the session can be submitted
    ///
    /// On top of the bundle checks, a file whose recorded preview yielded no
    /// rows is rejected.
    pub fn check_ready(&self, config: &Config) -> std::result::Result<(), ValidationError> {
        let mut issues = match self.bundle.validate(config) {
            Ok(()) => Vec::new(),
            Err(e) => e.issues,
        };
        for (file, preview) in &self.previews {
            if !preview.has_rows() {
                issues.push(FileIssue {
                    file: *file,
                    problem: FileProblem::NoData,
                });
            }
        }
        issues.sort_by_key(|issue| issue.file);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Bundle as it would be submitted
    pub fn bundle(&self) -> &UploadBundle {
        &self.bundle
    }

    /// Give up the session, keeping only the bundle
    pub fn into_bundle(self) -> UploadBundle {
        self.bundle
    }

    /// Select `upload` for `file`, preview it and record the result
    pub async fn load_preview(
        &mut self,
        client: &SubmissionClient,
        file: SourceFile,
        upload: UploadFile,
    ) -> Result<ColumnDiff> {
        let response = client.preview(file, &upload).await?;
        self.select(file, upload);
        Ok(self.record_preview(file, response))
    }

    /// Submit the session and poll the task to completion
    ///
    /// `sink` is told when the task starts, receives every status, and is told
    /// how the run ended. Nothing is sent if [`check_ready`](Self::check_ready)
    /// fails.
    pub async fn run<S>(
        &self,
        client: &SubmissionClient,
        poller: &TaskPoller,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<TaskStatus>
    where
        S: ProgressSink + ?Sized,
    {
        self.check_ready(client.config())?;
        let task = client.submit(&self.bundle).await?;

        sink.on_started(&task);
        let outcome = poller.poll_until_done(&task, client, sink, cancel).await;
        sink.on_finished(&outcome);
        outcome
    }
}
