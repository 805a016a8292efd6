//! Test doubles shared by the export and service tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::converter::{ConvertError, Converter};

/// Converter that writes a placeholder output file and records every call.
#[derive(Debug, Default)]
pub(crate) struct RecordingConverter {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    fail_extension: Option<&'static str>,
    delay: Option<Duration>,
    skip_output: bool,
}

impl RecordingConverter {
    /// Fail every conversion whose output has this extension.
    pub(crate) fn failing_for(extension: &'static str) -> Self {
        Self { fail_extension: Some(extension), ..Self::default() }
    }

    /// Take this long before writing the output.
    pub(crate) fn slow(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    /// Report success without writing anything.
    pub(crate) fn writing_nothing() -> Self {
        Self { skip_output: true, ..Self::default() }
    }

    pub(crate) fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn outputs(&self) -> Vec<String> {
        let mut outputs: Vec<String> = self
            .calls()
            .iter()
            .filter_map(|(_, out)| out.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        outputs.sort();
        outputs
    }
}

#[async_trait]
impl Converter for RecordingConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        self.calls.lock().unwrap().push((input.to_path_buf(), output.to_path_buf()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let ext = output.extension().and_then(|e| e.to_str());
        if ext.is_some() && ext == self.fail_extension {
            return Err(ConvertError::Failed {
                executable: "fake-mscore".into(),
                code: Some(1),
                stderr: "conversion failed".into(),
            });
        }

        if self.skip_output {
            return Ok(());
        }

        std::fs::write(output, format!("converted from {}", input.display())).map_err(|e| {
            ConvertError::Spawn { executable: "fake-mscore".into(), source: e }
        })
    }
}
