//! Handing one stage's output directory to the next stage's input directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::StageError;

/// Replace `to` with a full copy of `from`.
///
/// The copy is built in a sibling `<to>.staging` directory first. The old
/// target is then renamed aside to `<to>.old`, the copy renamed into place,
/// and the aside removed. A failure at any step leaves `to` holding either
/// its previous contents or the complete copy. Returns the number of files
/// copied.
pub fn replace_dir_with_copy(from: &Path, to: &Path) -> Result<usize, StageError> {
    let staging_failed = |source: io::Error| StageError::StagingFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let staging = sibling_path(to, "staging");
    let aside = sibling_path(to, "old");
    for leftover in [&staging, &aside] {
        if leftover.exists() {
            fs::remove_dir_all(leftover).map_err(staging_failed)?;
        }
    }

    let copied = match copy_tree(from, &staging) {
        Ok(count) => count,
        Err(e) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(staging_failed(e));
        }
    };

    let had_target = to.exists();
    if had_target && let Err(e) = fs::rename(to, &aside) {
        let _ = fs::remove_dir_all(&staging);
        return Err(staging_failed(e));
    }
    if let Err(e) = fs::rename(&staging, to) {
        if had_target {
            let _ = fs::rename(&aside, to);
        }
        let _ = fs::remove_dir_all(&staging);
        return Err(staging_failed(e));
    }
    if had_target && let Err(e) = fs::remove_dir_all(&aside) {
        // The new input is already in place; the next run clears the aside.
        tracing::warn!(path = %aside.display(), error = %e, "could not remove previous stage input");
    }

    tracing::debug!(from = %from.display(), to = %to.display(), files = copied, "staged stage input");
    Ok(copied)
}

fn sibling_path(to: &Path, suffix: &str) -> PathBuf {
    let mut name = to
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    to.with_file_name(name)
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<usize> {
    if !from.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", from.display()),
        ));
    }

    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_into_missing_target() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("crops");
        fs::create_dir_all(from.join("nested")).unwrap();
        fs::write(from.join("doc1.jpg"), "crop").unwrap();
        fs::write(from.join("nested/doc2.jpg"), "crop2").unwrap();
        let to = dir.path().join("gan_ips/testB");

        let copied = replace_dir_with_copy(&from, &to).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(to.join("doc1.jpg")).unwrap(), "crop");
        assert_eq!(fs::read_to_string(to.join("nested/doc2.jpg")).unwrap(), "crop2");
        assert!(!sibling_path(&to, "staging").exists());
    }

    #[test]
    fn test_replaces_previous_contents_wholesale() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("crops");
        fs::create_dir_all(&from).unwrap();
        fs::write(from.join("new.jpg"), "new").unwrap();

        let to = dir.path().join("testB");
        fs::create_dir_all(&to).unwrap();
        fs::write(to.join("old.jpg"), "old").unwrap();

        replace_dir_with_copy(&from, &to).unwrap();
        assert!(to.join("new.jpg").exists());
        assert!(!to.join("old.jpg").exists());
        assert!(!sibling_path(&to, "old").exists());
        assert!(!sibling_path(&to, "staging").exists());
    }

    #[test]
    fn test_missing_source_keeps_old_target() {
        let dir = tempdir().unwrap();
        let to = dir.path().join("testB");
        fs::create_dir_all(&to).unwrap();
        fs::write(to.join("old.jpg"), "old").unwrap();

        let err = replace_dir_with_copy(&dir.path().join("nope"), &to).unwrap_err();
        assert!(matches!(err, StageError::StagingFailed { .. }));
        assert_eq!(fs::read_to_string(to.join("old.jpg")).unwrap(), "old");
        assert!(!sibling_path(&to, "staging").exists());
    }

    #[test]
    fn test_leftover_staging_dir_is_discarded() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("crops");
        fs::create_dir_all(&from).unwrap();
        fs::write(from.join("doc1.jpg"), "crop").unwrap();

        let to = dir.path().join("testB");
        let leftover = sibling_path(&to, "staging");
        fs::create_dir_all(&leftover).unwrap();
        fs::write(leftover.join("partial.jpg"), "partial").unwrap();

        replace_dir_with_copy(&from, &to).unwrap();
        assert!(!to.join("partial.jpg").exists());
        assert!(to.join("doc1.jpg").exists());
    }

    #[test]
    fn test_interrupted_swap_leftover_is_discarded() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("crops");
        fs::create_dir_all(&from).unwrap();
        fs::write(from.join("doc2.jpg"), "crop").unwrap();

        let to = dir.path().join("testB");
        fs::create_dir_all(&to).unwrap();
        fs::write(to.join("doc1.jpg"), "current").unwrap();
        let aside = sibling_path(&to, "old");
        fs::create_dir_all(&aside).unwrap();
        fs::write(aside.join("doc0.jpg"), "from an earlier run").unwrap();

        replace_dir_with_copy(&from, &to).unwrap();
        assert!(to.join("doc2.jpg").exists());
        assert!(!to.join("doc1.jpg").exists());
        assert!(!to.join("doc0.jpg").exists());
        assert!(!aside.exists());
    }

    #[test]
    fn test_sibling_paths() {
        assert_eq!(
            sibling_path(Path::new("results/gan/testB"), "staging"),
            PathBuf::from("results/gan/testB.staging")
        );
        assert_eq!(
            sibling_path(Path::new("results/gan/testB"), "old"),
            PathBuf::from("results/gan/testB.old")
        );
    }
}
