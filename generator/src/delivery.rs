//! Handing finished bytes to the user: saving to disk or opening a preview.

use log::{info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes `bytes` to `dir/file_name`.
///
/// The data goes to a temporary file in the same directory first and is then
/// renamed into place, so a reader never sees a partial file.
pub fn download(bytes: &[u8], file_name: &str, dir: &Path) -> io::Result<PathBuf> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;

    let target = dir.join(file_name);
    tmp.persist(&target).map_err(|e| e.error)?;
    info!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// The viewer was launched on this file.
    Opened(PathBuf),
    /// No viewer could be launched; the caller should show this link instead.
    Link(String),
}

/// Writes the document to a kept temporary file and opens it in the system browser.
pub fn preview(bytes: &[u8], file_name: &str) -> io::Result<PreviewOutcome> {
    preview_with(bytes, file_name, |url| webbrowser::open(url))
}

/// Same as [`preview`] with a custom opener.
pub fn preview_with<F>(bytes: &[u8], file_name: &str, open: F) -> io::Result<PreviewOutcome>
where
    F: FnOnce(&str) -> io::Result<()>,
{
    let suffix = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix("certificate-preview-")
        .suffix(&suffix)
        .tempfile()?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    let (_, path) = tmp.keep().map_err(|e| e.error)?;

    let url = format!("file://{}", path.display());
    match open(&url) {
        Ok(()) => Ok(PreviewOutcome::Opened(path)),
        Err(e) => {
            warn!("Could not open preview ({}), returning link instead", e);
            Ok(PreviewOutcome::Link(url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn download_lands_under_the_given_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = download(b"%PDF-1.4 test", "Certificate_Jane.pdf", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("Certificate_Jane.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4 test");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn download_replaces_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        download(b"old", "a.png", dir.path()).unwrap();
        let path = download(b"new", "a.png", dir.path()).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"new");
    }

    #[test]
    fn preview_opens_a_kept_file() {
        let outcome = preview_with(b"png", "Certificate_Jane.png", |url| {
            assert!(url.starts_with("file://"));
            assert!(url.ends_with(".png"));
            Ok(())
        })
        .unwrap();
        let PreviewOutcome::Opened(path) = outcome else {
            panic!("expected the preview to open");
        };
        assert_eq!(fs::read(&path).unwrap(), b"png");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn blocked_preview_falls_back_to_a_link() {
        let outcome = preview_with(b"pdf", "c.pdf", |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "blocked"))
        })
        .unwrap();
        let PreviewOutcome::Link(url) = outcome else {
            panic!("expected a link");
        };
        let path = url.trim_start_matches("file://");
        assert_eq!(fs::read(path).unwrap(), b"pdf");
        fs::remove_file(path).unwrap();
    }
}
