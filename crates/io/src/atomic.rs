use std::fs;
use std::path::{Path, PathBuf};

/// Replace `path` with `contents` in one step: write a sibling `.tmp` file,
/// then rename it over the target. On failure the old file is untouched.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), String> {
    let tmp_path = tmp_path_for(path);

    fs::write(&tmp_path, contents)
        .map_err(|e| format!("failed to write {}: {}", tmp_path.display(), e))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(format!(
            "failed to rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        ));
    }
    Ok(())
}

/// Replace several files together. Every `.tmp` sibling is written before
/// any rename, so a write failure leaves all targets untouched and removes
/// the temps already written.
pub fn write_atomic_all(files: &[(&Path, &[u8])]) -> Result<(), String> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());

    for (path, contents) in files {
        let tmp_path = tmp_path_for(path);
        if let Err(e) = fs::write(&tmp_path, contents) {
            remove_all(&written);
            return Err(format!("failed to write {}: {}", tmp_path.display(), e));
        }
        written.push(tmp_path);
    }

    for (idx, ((path, _), tmp_path)) in files.iter().zip(&written).enumerate() {
        if let Err(e) = fs::rename(tmp_path, path) {
            remove_all(&written[idx..]);
            return Err(format!(
                "failed to rename {} to {}: {}",
                tmp_path.display(),
                path.display(),
                e
            ));
        }
    }
    Ok(())
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
