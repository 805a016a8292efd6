use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to launch {executable}: {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{executable} {}", describe_exit(.code, .stderr))]
    Failed { executable: String, code: Option<i32>, stderr: String },
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    };
    match stderr.lines().last() {
        Some(line) if !line.trim().is_empty() => format!("{status}: {}", line.trim()),
        _ => status,
    }
}

/// Something that turns a MuseScore file into an export file.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `input` into `output`. The output format follows from the
    /// output file's extension. Resolves once the conversion has finished.
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

#[async_trait]
impl<T: Converter + ?Sized> Converter for Arc<T> {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        (**self).convert(input, output).await
    }
}

/// The MuseScore command line, invoked as `<executable> -o <output> <input>`.
#[derive(Debug, Clone)]
pub struct MuseScoreCli {
    executable: PathBuf,
}

impl MuseScoreCli {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into() }
    }

    /// `None` when no executable is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        settings.executable().map(Self::new)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl Converter for MuseScoreCli {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        debug!(
            executable = %self.executable.display(),
            input = %input.display(),
            output = %output.display(),
            "running converter"
        );

        let result = Command::new(&self.executable)
            .arg("-o")
            .arg(output)
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ConvertError::Spawn {
                executable: self.executable.display().to_string(),
                source: e,
            })?;

        if result.status.success() {
            return Ok(());
        }

        Err(ConvertError::Failed {
            executable: self.executable.display().to_string(),
            code: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        })
    }
}
