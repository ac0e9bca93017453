//! Browsing what earlier crawls downloaded.
//!
//! The download root holds one directory per date, each holding PDFs.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Names of the date directories under `root`, sorted.
///
/// A root that doesn't exist yet simply has no directories.
pub fn list_date_dirs(root: &Path) -> Result<Vec<String>, LibraryError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Names of the PDF files in one date directory, sorted.
pub fn list_pdf_files(root: &Path, dir: &str) -> Result<Vec<String>, LibraryError> {
    let path = date_dir(root, dir)?;
    let mut files: Vec<String> = std::fs::read_dir(&path)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(".pdf"))
        .collect();
    files.sort();
    Ok(files)
}

/// Path of a PDF inside a date directory.
pub fn pdf_path(root: &Path, dir: &str, file: &str) -> Result<PathBuf, LibraryError> {
    check_component(file)?;
    let path = date_dir(root, dir)?.join(file);
    if !path.is_file() {
        return Err(LibraryError::NotFound(path));
    }
    Ok(path)
}

fn date_dir(root: &Path, dir: &str) -> Result<PathBuf, LibraryError> {
    check_component(dir)?;
    let path = root.join(dir);
    if !path.is_dir() {
        return Err(LibraryError::NotFound(path));
    }
    Ok(path)
}

/// Reject anything that isn't a single plain path component.
fn check_component(name: &str) -> Result<(), LibraryError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if bad {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let day = root.path().join("2024-03-01");
        std::fs::create_dir_all(&day).unwrap();
        std::fs::create_dir_all(root.path().join("2024-02-29")).unwrap();
        std::fs::write(day.join("b.pdf"), b"%PDF").unwrap();
        std::fs::write(day.join("a.pdf"), b"%PDF").unwrap();
        std::fs::write(day.join("notes.txt"), b"x").unwrap();
        std::fs::write(root.path().join("stray.pdf"), b"%PDF").unwrap();
        root
    }

    #[test]
    fn test_list_date_dirs() {
        let root = fixture();
        assert_eq!(
            list_date_dirs(root.path()).unwrap(),
            vec!["2024-02-29", "2024-03-01"]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(list_date_dirs(&root.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_list_pdf_files() {
        let root = fixture();
        assert_eq!(
            list_pdf_files(root.path(), "2024-03-01").unwrap(),
            vec!["a.pdf", "b.pdf"]
        );
        assert!(list_pdf_files(root.path(), "2024-02-29").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_traversal() {
        let root = fixture();
        assert!(matches!(
            list_pdf_files(root.path(), ".."),
            Err(LibraryError::InvalidName(_))
        ));
        assert!(matches!(
            pdf_path(root.path(), "2024-03-01", "../../etc/passwd"),
            Err(LibraryError::InvalidName(_))
        ));
    }

    #[test]
    fn test_pdf_path() {
        let root = fixture();
        let path = pdf_path(root.path(), "2024-03-01", "a.pdf").unwrap();
        assert!(path.ends_with("2024-03-01/a.pdf"));

        std::fs::write(root.path().join("2024-03-01").join("Wait... what.pdf"), b"%PDF").unwrap();
        assert!(pdf_path(root.path(), "2024-03-01", "Wait... what.pdf").is_ok());
        assert!(matches!(
            pdf_path(root.path(), "2024-03-01", "zzz.pdf"),
            Err(LibraryError::NotFound(_))
        ));
    }
}
