//! Local document files for import and export

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Read an XML document chosen by the user
pub fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write an exported document, creating parent directories as needed
pub fn write_document(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to save file: {}", path.display()))?;
    tracing::info!("Exported document: {}", path.display());
    Ok(())
}

/// Name shown for a document path, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Whether a path looks like an XML document
pub fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("metadata-editor-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_write_then_read() {
        let dir = scratch_dir("io");
        let path = dir.join("nested").join("doc.xml");
        write_document(&path, "<metadata/>").unwrap();
        assert_eq!(read_document(&path).unwrap(), "<metadata/>");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_missing_has_context() {
        let path = scratch_dir("missing").join("nope.xml");
        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read file"));
    }

    #[test]
    fn test_names() {
        assert_eq!(display_name(Path::new("/tmp/a/books.xml")), "books.xml");
        assert!(is_xml(Path::new("books.XML")));
        assert!(!is_xml(Path::new("books.json")));
    }
}
