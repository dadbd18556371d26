use std::path::Path;

use crate::errors::BenchError;
use crate::types::BenchmarkDir;

/// Find every directory under `root` (inclusive) that holds at least one `.c`
/// file.
///
/// Directories are visited depth-first with entries sorted by name, so the
/// result order is stable across runs. Symlinked directories are not followed
/// and unreadable directories are skipped silently. Returns
/// `BenchError::RootNotFound` when `root` is not a directory.
pub fn discover_benchmarks(root: &Path) -> Result<Vec<BenchmarkDir>, BenchError> {
    if !root.is_dir() {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        return Err(BenchError::RootNotFound {
            path: root.to_path_buf(),
            cwd,
        });
    }

    let mut found = Vec::new();
    walk(root, &mut found);
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<BenchmarkDir>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), %err, "skipping unreadable directory");
            return;
        }
    };

    let mut sources = Vec::new();
    let mut subdirs = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };

        let path = entry.path();
        if file_type.is_dir() {
            subdirs.push(path);
        } else if path.extension().and_then(|e| e.to_str()) == Some("c")
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            sources.push(name.to_string());
        }
    }

    if !sources.is_empty() {
        sources.sort();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        found.push(BenchmarkDir {
            name,
            dir: dir.to_path_buf(),
            sources,
        });
    }

    subdirs.sort();
    for sub in subdirs {
        walk(&sub, found);
    }
}
