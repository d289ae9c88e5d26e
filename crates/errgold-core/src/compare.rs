//! Golden-file comparison and diff rendering.

use colored::Colorize;
use sha2::{Digest, Sha256};
use similar::TextDiff;
use std::path::Path;

use crate::error::{HarnessError, Result};

/// Lines of unchanged context around each hunk.
const CONTEXT_LINES: usize = 3;

/// Outcome of comparing the normalized output with the golden reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Byte-for-byte equality.
    pub equal: bool,

    /// Unified diff, golden on the `-` side. Present only when not equal.
    pub diff: Option<String>,

    /// The golden file did not exist and was compared as empty.
    pub golden_missing: bool,

    /// SHA-256 of the normalized output.
    pub actual_digest: String,

    /// SHA-256 of the golden reference, if it exists.
    pub golden_digest: Option<String>,
}

/// Compares the normalized output file against the golden reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoldenComparator {
    color: bool,
}

impl GoldenComparator {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Compare `actual` against `golden`.
    ///
    /// A missing golden file is a mismatch, not an error. A missing `actual`
    /// file is an error: capture must have produced it.
    pub async fn compare(&self, golden: &Path, actual: &Path) -> Result<Comparison> {
        let actual_bytes = tokio::fs::read(actual)
            .await
            .map_err(|e| HarnessError::io(actual, e))?;

        let golden_bytes = match tokio::fs::read(golden).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(golden = %golden.display(), "Golden file missing; treating as mismatch");
                None
            }
            Err(e) => return Err(HarnessError::io(golden, e)),
        };

        let equal = golden_bytes.as_deref() == Some(actual_bytes.as_slice());
        let diff = (!equal).then(|| {
            let golden_name = golden.display().to_string();
            let actual_name = actual.display().to_string();
            let rendered = self.render_diff(
                golden_bytes.as_deref().unwrap_or_default(),
                &actual_bytes,
                &golden_name,
                &actual_name,
            );
            // Bytes that differ only where lossy decoding collapses them.
            if rendered.is_empty() {
                format!("Files {golden_name} and {actual_name} differ\n")
            } else {
                rendered
            }
        });

        Ok(Comparison {
            equal,
            diff,
            golden_missing: golden_bytes.is_none(),
            actual_digest: digest(&actual_bytes),
            golden_digest: golden_bytes.as_deref().map(digest),
        })
    }

    /// Render a unified diff between two byte buffers.
    ///
    /// Invalid UTF-8 is replaced for display only.
    pub fn render_diff(&self, old: &[u8], new: &[u8], old_name: &str, new_name: &str) -> String {
        let old = String::from_utf8_lossy(old);
        let new = String::from_utf8_lossy(new);
        let diff = TextDiff::from_lines(old.as_ref(), new.as_ref());

        let mut unified = diff.unified_diff();
        unified.context_radius(CONTEXT_LINES).header(old_name, new_name);
        let plain = unified.to_string();

        if !self.color {
            return plain;
        }

        let mut output = String::with_capacity(plain.len());
        for line in plain.split_inclusive('\n') {
            let body = line.strip_suffix('\n').unwrap_or(line);
            let painted = if body.starts_with("---") || body.starts_with("+++") {
                body.bold().to_string()
            } else if body.starts_with("@@") {
                body.cyan().to_string()
            } else if body.starts_with('-') {
                body.red().to_string()
            } else if body.starts_with('+') {
                body.green().to_string()
            } else {
                body.to_string()
            };
            output.push_str(&painted);
            if line.ends_with('\n') {
                output.push('\n');
            }
        }
        output
    }
}

fn digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_identical_files_are_equal() {
        let dir = tempfile::tempdir().unwrap();
        let golden = write(&dir, "golden_stderr", b"Error: WIDTH mismatch at line 12\n");
        let actual = write(&dir, "actual_stderr", b"Error: WIDTH mismatch at line 12\n");

        let cmp = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap();
        assert!(cmp.equal);
        assert!(cmp.diff.is_none());
        assert!(!cmp.golden_missing);
        assert_eq!(cmp.golden_digest.as_deref(), Some(cmp.actual_digest.as_str()));
    }

    #[tokio::test]
    async fn test_mismatch_renders_unified_diff() {
        let dir = tempfile::tempdir().unwrap();
        let golden = write(&dir, "golden_stderr", b"Error: WIDTH mismatch at line 12\n");
        let actual = write(&dir, "actual_stderr", b"Error: WIDTH mismatch at line 13\n");

        let cmp = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap();
        assert!(!cmp.equal);

        let diff = cmp.diff.unwrap();
        assert!(diff.contains("-Error: WIDTH mismatch at line 12"));
        assert!(diff.contains("+Error: WIDTH mismatch at line 13"));
        assert!(diff.contains("golden_stderr"));
        assert!(!diff.contains('\u{1b}'));
    }

    #[tokio::test]
    async fn test_trailing_newline_difference_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let golden = write(&dir, "golden_stderr", b"Error\n");
        let actual = write(&dir, "actual_stderr", b"Error");

        let cmp = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap();
        assert!(!cmp.equal);
    }

    #[tokio::test]
    async fn test_missing_golden_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let golden = dir.path().join("golden_stderr");
        let actual = write(&dir, "actual_stderr", b"Error: new\n");

        let cmp = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap();
        assert!(!cmp.equal);
        assert!(cmp.golden_missing);
        assert!(cmp.golden_digest.is_none());
        assert!(cmp.diff.unwrap().contains("+Error: new"));
    }

    #[tokio::test]
    async fn test_empty_golden_and_empty_actual_are_equal() {
        let dir = tempfile::tempdir().unwrap();
        let golden = write(&dir, "golden_stderr", b"");
        let actual = write(&dir, "actual_stderr", b"");

        let cmp = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap();
        assert!(cmp.equal);
    }

    #[tokio::test]
    async fn test_missing_actual_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let golden = write(&dir, "golden_stderr", b"x\n");
        let actual = dir.path().join("actual_stderr");

        let err = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }

    #[test]
    fn test_invalid_utf8_still_renders() {
        let diff = GoldenComparator::new(false).render_diff(b"ok\n", b"\xff\xfe\n", "golden", "actual");
        assert!(diff.contains("-ok"));
        assert!(diff.contains('\u{fffd}'));
    }

    #[tokio::test]
    async fn test_undecodable_difference_still_reported() {
        let dir = tempfile::tempdir().unwrap();
        let golden = write(&dir, "golden_stderr", b"x\xff\n");
        let actual = write(&dir, "actual_stderr", b"x\xfe\n");

        let cmp = GoldenComparator::new(false).compare(&golden, &actual).await.unwrap();
        assert!(!cmp.equal);
        assert_ne!(cmp.golden_digest.as_deref(), Some(cmp.actual_digest.as_str()));

        let diff = cmp.diff.unwrap();
        assert!(diff.starts_with("Files "));
        assert!(diff.contains("golden_stderr"));
        assert!(diff.contains("actual_stderr"));
        assert!(diff.trim_end().ends_with("differ"));
    }

    #[test]
    fn test_color_marks_changed_lines() {
        colored::control::set_override(true);
        let diff = GoldenComparator::new(true).render_diff(b"a\n", b"b\n", "golden", "actual");
        assert!(diff.contains('\u{1b}'));
        assert!(diff.contains("-a"));
        assert!(diff.contains("+b"));
    }
}
