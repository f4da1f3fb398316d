//! Write-once image output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` through a `.partial` sibling and a rename, so a
/// reader never sees a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(path);
    if let Err(err) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, path)) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("images").join("2023060100_2023060112.png");

        write_atomic(&target, b"png").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"png");
        let names: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "no leftover partial file: {:?}", names);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.png");
        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");
    }

    #[test]
    fn test_partial_name() {
        assert_eq!(
            partial_path(Path::new("images/a.png")),
            PathBuf::from("images/a.png.partial")
        );
    }
}
