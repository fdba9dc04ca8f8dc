// ABOUTME: Packs a build context directory into a tar archive.
// ABOUTME: The archive is the request body of the image build API.

use std::io;
use std::path::Path;

/// Tar the whole build context directory.
pub fn build_context_archive(context: &Path) -> io::Result<Vec<u8>> {
    let mut archive = tar::Builder::new(Vec::new());
    archive.follow_symlinks(false);
    archive.append_dir_all(".", context)?;
    archive.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_contains_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        std::fs::write(dir.path().join("app.txt"), "hello").unwrap();

        let bytes = build_context_archive(dir.path()).unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect();

        assert!(names.iter().any(|n| n.ends_with("Dockerfile")));
        assert!(names.iter().any(|n| n.ends_with("app.txt")));
    }

    #[test]
    fn missing_context_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(build_context_archive(&dir.path().join("absent")).is_err());
    }
}
