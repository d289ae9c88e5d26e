//! Baseline promotion: the only code path that writes the golden file.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{HarnessError, Result};

/// Replace `golden` with the contents of `actual`.
///
/// Atomic write: the new baseline goes to a temp file next to `golden` and is
/// renamed over it, so readers see either the old or the new file. The
/// replacement keeps the permissions of the existing golden file, or takes
/// those of `actual` when there is no golden file yet.
pub fn promote(actual: &Path, golden: &Path) -> Result<()> {
    let data = std::fs::read(actual).map_err(|e| HarnessError::io(actual, e))?;

    let dir = match golden.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| HarnessError::io(dir, e))?;
    tmp.write_all(&data).map_err(|e| HarnessError::io(tmp.path(), e))?;

    let permissions = match std::fs::metadata(golden) {
        Ok(meta) => meta.permissions(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => std::fs::metadata(actual)
            .map_err(|e| HarnessError::io(actual, e))?
            .permissions(),
        Err(e) => return Err(HarnessError::io(golden, e)),
    };
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| HarnessError::io(tmp.path(), e))?;
    tmp.persist(golden)
        .map_err(|e| HarnessError::io(golden, e.error))?;

    tracing::debug!(
        golden = %golden.display(),
        bytes = data.len(),
        "Golden file replaced"
    );
    Ok(())
}
