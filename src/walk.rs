//! Record file discovery beneath a contribution root.

use std::path::Path;

use rc_records::RECORD_EXTENSION;
use walkdir::WalkDir;

use crate::error::Result;

/// Call `f` for every record file under `root/subdir`, in sorted path
/// order. A missing subdirectory yields no files.
pub fn walk_record_files<F>(root: &Path, subdir: impl AsRef<Path>, mut f: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    let dir = root.join(subdir);
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(&dir)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }
        f(path)?;
    }
    Ok(())
}

/// File stem of a record path (`FOO` for `.../FOO.toml`).
pub fn record_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
