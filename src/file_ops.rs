//! Copying and moving photos into destination folders
//!
//! Existing files are never overwritten: a clashing name gets a ` (1)`,
//! ` (2)`, ... suffix before the extension.

use crate::config::FileOperation;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Return a path in `dest_dir` for `file_name` that doesn't exist yet
pub fn unique_destination(dest_dir: &Path, file_name: &str) -> PathBuf {
    let base = dest_dir.join(file_name);
    if !base.exists() {
        return base;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dest_dir.join(format!("{} ({}){}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Copy or move `source` into `dest_dir`, returning the final path
///
/// The destination directory is created when missing. With `dry_run` the
/// target path is computed but nothing is touched.
pub fn place_file(
    source: &Path,
    dest_dir: &Path,
    operation: FileOperation,
    dry_run: bool,
) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid source filename: {}", source.display()),
            ))
        })?;

    let dest = unique_destination(dest_dir, file_name);
    if dry_run {
        return Ok(dest);
    }

    fs::create_dir_all(dest_dir)?;

    match operation {
        FileOperation::Copy => copy_file(source, &dest)?,
        FileOperation::Move => {
            // Try rename first (faster for same filesystem)
            if fs::rename(source, &dest).is_err() {
                // Fall back to copy + delete for cross-filesystem moves
                copy_file(source, &dest)?;
                fs::remove_file(source)?;
            }
        }
    }

    trace!(?source, ?dest, ?operation, "Placed file");
    Ok(dest)
}

/// Copy contents and permissions, keeping the source modification time
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest)?;

    if let Ok(metadata) = fs::metadata(source)
        && let Ok(mtime) = metadata.modified()
    {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_destination_adds_suffix() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            unique_destination(dir.path(), "IMG_0001.jpg"),
            dir.path().join("IMG_0001.jpg")
        );

        fs::write(dir.path().join("IMG_0001.jpg"), b"a").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "IMG_0001.jpg"),
            dir.path().join("IMG_0001 (1).jpg")
        );

        fs::write(dir.path().join("IMG_0001 (1).jpg"), b"b").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "IMG_0001.jpg"),
            dir.path().join("IMG_0001 (2).jpg")
        );
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("photo"), b"a").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "photo"),
            dir.path().join("photo (1)")
        );
    }

    #[test]
    fn test_copy_creates_directory_and_keeps_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        fs::write(&source, b"pixels").unwrap();
        let dest_dir = dir.path().join("out").join("Jiufen");

        let dest = place_file(&source, &dest_dir, FileOperation::Copy, false).unwrap();
        assert_eq!(dest, dest_dir.join("a.jpg"));
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
        assert!(source.exists());

        let src_mtime = fs::metadata(&source).unwrap().modified().unwrap();
        let dst_mtime = fs::metadata(&dest).unwrap().modified().unwrap();
        assert_eq!(src_mtime, dst_mtime);
    }

    #[test]
    fn test_copy_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let dest_dir = dir.path().join("out");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("a.jpg"), b"old").unwrap();

        let source = dir.path().join("a.jpg");
        fs::write(&source, b"new").unwrap();

        let dest = place_file(&source, &dest_dir, FileOperation::Copy, false).unwrap();
        assert_eq!(dest, dest_dir.join("a (1).jpg"));
        assert_eq!(fs::read(dest_dir.join("a.jpg")).unwrap(), b"old");
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_move_removes_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("b.jpg");
        fs::write(&source, b"pixels").unwrap();

        let dest = place_file(&source, &dir.path().join("out"), FileOperation::Move, false).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("c.jpg");
        fs::write(&source, b"pixels").unwrap();
        let dest_dir = dir.path().join("out");

        let dest = place_file(&source, &dest_dir, FileOperation::Move, true).unwrap();
        assert_eq!(dest, dest_dir.join("c.jpg"));
        assert!(source.exists());
        assert!(!dest_dir.exists());
    }
}
