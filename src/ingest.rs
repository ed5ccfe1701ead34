//! Loading ADIF files into the contact store.
//!
//! The upload directory is scanned for `.adif` and `.adi` files. Each file is
//! read, parsed and ingested on its own, so one unreadable or unwritable file
//! does not stop the rest of the scan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parser::{looks_like_adif, parse};
use crate::store::{ContactStore, StoreError};

/// Errors while loading a single file or listing the upload directory.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list upload directory {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of loading one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Number of contacts stored, when the file loaded.
    pub stored: Option<usize>,
    /// Error message, when it did not.
    pub error: Option<String>,
}

impl FileReport {
    fn from_result(path: PathBuf, result: Result<usize, IngestError>) -> Self {
        match result {
            Ok(stored) => Self {
                path,
                stored: Some(stored),
                error: None,
            },
            Err(e) => Self {
                path,
                stored: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-file results of a directory scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub files: Vec<FileReport>,
}

impl ScanReport {
    pub fn files_loaded(&self) -> usize {
        self.files.iter().filter(|f| f.is_ok()).count()
    }

    pub fn files_failed(&self) -> usize {
        self.files.len() - self.files_loaded()
    }

    pub fn contacts_stored(&self) -> usize {
        self.files.iter().filter_map(|f| f.stored).sum()
    }
}

impl std::fmt::Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for file in &self.files {
            match (&file.stored, &file.error) {
                (Some(n), _) => writeln!(f, "  {}: {} contacts", file.path.display(), n)?,
                (None, Some(e)) => writeln!(f, "  {}: FAILED ({})", file.path.display(), e)?,
                (None, None) => {}
            }
        }
        write!(
            f,
            "{} files loaded, {} failed, {} contacts stored",
            self.files_loaded(),
            self.files_failed(),
            self.contacts_stored()
        )
    }
}

/// Check if a path has an ADIF extension (`.adif` or `.adi`, any case).
pub fn is_adif_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("adif") || ext.eq_ignore_ascii_case("adi"))
}

/// Decode bytes as UTF-8, dropping invalid sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Read, parse and store one ADIF file. Returns the number of contacts stored.
pub fn ingest_file(store: &ContactStore, path: &Path) -> Result<usize, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_lossy(&bytes);

    if !looks_like_adif(&text) {
        debug!("{} has no end-of-record marker", path.display());
    }

    Ok(store.ingest(parse(&text))?)
}

/// Load each file in turn, recording every outcome.
pub fn ingest_files<I>(store: &ContactStore, paths: I) -> ScanReport
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut report = ScanReport::default();
    for path in paths {
        let result = ingest_file(store, &path);
        match &result {
            Ok(n) => info!("Loaded {} contacts from {}", n, path.display()),
            Err(e) => warn!("Error while processing {}: {}", path.display(), e),
        }
        report.files.push(FileReport::from_result(path, result));
    }
    report
}

/// Load every ADIF file in `dir` into the store, in file name order.
///
/// The directory is created if it does not exist. Failures of individual
/// files are logged and recorded in the report; only failing to list the
/// directory is an error.
pub fn scan_directory(store: &ContactStore, dir: &Path) -> Result<ScanReport, IngestError> {
    let list_err = |source: io::Error| IngestError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(list_err)?;

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if !path.is_dir() && is_adif_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        info!("No ADIF files found in {}, nothing to load", dir.display());
    }

    Ok(ingest_files(store, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    const RECORD: &str = "<call:4>W1AW<band:3>20m<mode:3>SSB<qso_date:8>20230101<time_on:4>1200<station_callsign:5>K1ABC<EOR>\n";

    fn store_in(dir: &Path) -> ContactStore {
        ContactStore::new(&StorageConfig::with_database(dir.join("contacts.db")))
    }

    #[test]
    fn test_is_adif_file() {
        assert!(is_adif_file(Path::new("log.adif")));
        assert!(is_adif_file(Path::new("log.ADI")));
        assert!(is_adif_file(Path::new("/tmp/Field Day.AdIf")));
        assert!(!is_adif_file(Path::new("log.txt")));
        assert!(!is_adif_file(Path::new("adif")));
        assert!(!is_adif_file(Path::new("log.adif.bak")));
    }

    #[test]
    fn test_decode_lossy_drops_invalid_bytes() {
        assert_eq!(decode_lossy(b"W1\xffAW"), "W1AW");
        assert_eq!(decode_lossy("Zürich".as_bytes()), "Zürich");
        assert_eq!(decode_lossy(b""), "");
    }

    #[test]
    fn test_ingest_file_with_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let path = dir.path().join("log.adi");
        let mut bytes = b"<comment:3>\xfe\xfe\xfe".to_vec();
        bytes.extend_from_slice(RECORD.as_bytes());
        fs::write(&path, bytes).unwrap();

        assert_eq!(ingest_file(&store, &path).unwrap(), 1);
        assert_eq!(store.list_all()[0].record.contact_callsign, "W1AW");
    }

    #[test]
    fn test_ingest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let err = ingest_file(&store, &dir.path().join("nope.adif")).unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir(&uploads).unwrap();
        fs::write(uploads.join("a.adif"), RECORD.repeat(2)).unwrap();
        fs::write(uploads.join("b.ADI"), RECORD).unwrap();
        fs::write(uploads.join("notes.txt"), RECORD).unwrap();
        fs::write(uploads.join("empty.adi"), "").unwrap();

        let store = store_in(dir.path());
        let report = scan_directory(&store, &uploads).unwrap();

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.files_loaded(), 3);
        assert_eq!(report.files_failed(), 0);
        assert_eq!(report.contacts_stored(), 3);
        assert_eq!(store.list_all().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir(&uploads).unwrap();
        // A dangling symlink is listed but cannot be read.
        std::os::unix::fs::symlink(dir.path().join("gone.adif"), uploads.join("a.adif")).unwrap();
        fs::write(uploads.join("b.adif"), RECORD).unwrap();
        fs::create_dir(uploads.join("c.adif")).unwrap();

        let store = store_in(dir.path());
        let report = scan_directory(&store, &uploads).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files_failed(), 1);
        assert_eq!(report.files_loaded(), 1);
        assert!(report.files[0].error.is_some());
        assert_eq!(report.files[1].stored, Some(1));
        assert!(report.to_string().contains("FAILED"));
        assert_eq!(store.list_all().len(), 1);
    }

    #[test]
    fn test_scan_reports_store_failure() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir(&uploads).unwrap();
        fs::write(uploads.join("b.adif"), RECORD).unwrap();

        let broken = ContactStore::new(&StorageConfig::with_database(
            dir.path().join("missing/contacts.db"),
        ));
        let report = scan_directory(&broken, &uploads).unwrap();
        assert_eq!(report.files_failed(), 1);
        assert_eq!(report.contacts_stored(), 0);
    }

    #[test]
    fn test_scan_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("adif_uploads");
        let store = store_in(dir.path());

        let report = scan_directory(&store, &uploads).unwrap();
        assert!(uploads.is_dir());
        assert!(report.files.is_empty());
        assert!(!store.exists());
    }
}
