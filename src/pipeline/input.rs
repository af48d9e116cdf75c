//! Input validation: make sure a path really is a readable PDF before pdfium
//! sees it.
//!
//! pdfium reports a non-PDF or unreadable file as an opaque load failure.
//! Checking existence, permissions and the `%PDF` magic bytes up front gives
//! callers an error that says what is actually wrong.

use crate::error::FlashGenError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// True when `bytes` start with the PDF magic.
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn check_pdf(path: &Path) -> Result<(), FlashGenError> {
    if !path.exists() {
        return Err(FlashGenError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic == PDF_MAGIC => {}
                Ok(()) => {
                    return Err(FlashGenError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    })
                }
                Err(_) => {
                    return Err(FlashGenError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    })
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(FlashGenError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(FlashGenError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated PDF: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn magic_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.7\n..."));
        assert!(!is_pdf_bytes(b"PK\x03\x04"));
        assert!(!is_pdf_bytes(b"%PD"));
        assert!(!is_pdf_bytes(b""));
    }

    #[test]
    fn accepts_pdf_header() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.4\n%fake body").unwrap();
        assert!(check_pdf(f.path()).is_ok());
    }

    #[test]
    fn rejects_other_files() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        match check_pdf(f.path()) {
            Err(FlashGenError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_tiny_files() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%P").unwrap();
        assert!(matches!(
            check_pdf(f.path()),
            Err(FlashGenError::NotAPdf { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let err = check_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, FlashGenError::FileNotFound { .. }));
    }
}
