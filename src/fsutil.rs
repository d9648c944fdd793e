//! Directory-tree helpers shared by the property service and site generator.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

fn walk_error(e: walkdir::Error) -> io::Error {
    let message = e.to_string();
    e.into_io_error()
        .unwrap_or_else(|| io::Error::other(message))
}

/// Copy `src` into `dst`, creating `dst` and every intermediate directory.
///
/// Existing files at the destination are overwritten. Returns the number of
/// files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(walk_error)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Regular files anywhere under `dir`. A missing directory counts as empty.
pub fn count_files(dir: &Path) -> usize {
    if !dir.is_dir() {
        return 0;
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copies_nested_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.txt"), "1").unwrap();
        fs::write(src.join("a/b/deep.txt"), "2").unwrap();

        let dst = tmp.path().join("out/dst");
        let copied = copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("a/b/deep.txt")).unwrap(), "2");
        assert!(dst.join("empty").is_dir());
        assert_eq!(count_files(&dst), 2);
    }

    #[test]
    fn missing_source_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(copy_dir_recursive(&tmp.path().join("nope"), &tmp.path().join("dst")).is_err());
    }

    #[test]
    fn count_missing_dir_is_zero() {
        assert_eq!(count_files(Path::new("/nonexistent/dir")), 0);
    }
}
