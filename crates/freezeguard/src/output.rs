//! Step output and run summary writers

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Destination for step outputs
#[derive(Debug, Clone, Default)]
pub struct OutputWriter {
    path: Option<PathBuf>,
}

impl OutputWriter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Append every output in one write. Without an output file the values
    /// are only logged.
    pub fn write_all(&self, outputs: &[(&str, String)]) -> Result<()> {
        let Some(path) = &self.path else {
            for (name, value) in outputs {
                info!(name = *name, value = %value, "Output");
            }
            return Ok(());
        };

        let content: String = outputs
            .iter()
            .map(|(name, value)| format_output(name, value))
            .collect();
        append(path, &content)
            .with_context(|| format!("Failed to write outputs to {}", path.display()))
    }
}

/// One output entry; multi-line values use the delimiter form
pub fn format_output(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

pub fn append_summary(path: &Path, markdown: &str) -> Result<()> {
    append(path, markdown)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}

fn append(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_output() {
        assert_eq!(format_output("decision", "BLOCK"), "decision=BLOCK\n");
        assert_eq!(format_output("override_reason", ""), "override_reason=\n");
    }

    #[test]
    fn test_multi_line_output() {
        let entry = format_output("reason", "first\nsecond");
        let mut lines = entry.lines();

        let header = lines.next().unwrap();
        let delimiter = header.strip_prefix("reason<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(lines.next(), Some("first"));
        assert_eq!(lines.next(), Some("second"));
        assert_eq!(lines.next(), Some(delimiter));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_outputs_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "earlier=step\n").unwrap();

        let writer = OutputWriter::new(Some(path.clone()));
        writer
            .write_all(&[("is_frozen", "true".into()), ("decision", "WARN".into())])
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=step\nis_frozen=true\ndecision=WARN\n"
        );
    }

    #[test]
    fn test_outputs_without_file() {
        OutputWriter::new(None)
            .write_all(&[("is_frozen", "false".into())])
            .unwrap();
    }

    #[test]
    fn test_unwritable_output_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("output");
        let err = OutputWriter::new(Some(path))
            .write_all(&[("decision", "ALLOW".into())])
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write outputs"));
    }

    #[test]
    fn test_summary_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        append_summary(&path, "first\n").unwrap();
        append_summary(&path, "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
