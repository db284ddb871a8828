//! Finds uploadable images on disk for batch compression.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::sniff::path_looks_like_image;

/// An image file found on disk.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl DiscoveredFile {
    /// File name as the uploader would send it.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Walks a file or directory for files with accepted image extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDiscovery;

impl FileDiscovery {
    /// A file path yields itself if accepted. A directory is walked
    /// recursively, following links, sorted by path.
    pub fn discover(path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            return match std::fs::metadata(path) {
                Ok(meta) if path_looks_like_image(path) => vec![DiscoveredFile {
                    path: path.to_path_buf(),
                    size: meta.len(),
                }],
                _ => vec![],
            };
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file() && path_looks_like_image(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: entry.into_path(),
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_directory_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.PNG"), b"12345").unwrap();
        std::fs::write(dir.path().join("a.heic"), b"123").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.jpg"), b"1").unwrap();

        let files = FileDiscovery::discover(dir.path());
        let names: Vec<String> = files.iter().map(DiscoveredFile::file_name).collect();
        assert_eq!(names, vec!["a.heic", "b.PNG", "c.jpg"]);
        assert_eq!(FileDiscovery::total_size(&files), 9);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("photo.webp");
        let other = dir.path().join("photo.pdf");
        std::fs::write(&image, b"xx").unwrap();
        std::fs::write(&other, b"xx").unwrap();

        assert_eq!(FileDiscovery::discover(&image).len(), 1);
        assert!(FileDiscovery::discover(&other).is_empty());
    }

    #[test]
    fn test_discover_missing_path() {
        assert!(FileDiscovery::discover(Path::new("/definitely/not/here")).is_empty());
    }
}
