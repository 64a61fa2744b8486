//! Record sources.
//!
//! A [`RecordSource`] is a restartable producer of records: every call to
//! [`RecordSource::open`] starts again from the first record, so the size
//! estimate and the ingestion pass are two independent reads rather than one
//! shared iterator.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use subpulse_core::{AppError, AppResult};

use crate::types::ContentItem;

/// One decoded record plus its position in the archive.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub item: ContentItem,

    /// Line as it appeared in the archive, without the newline
    pub raw_line: String,

    /// Compressed bytes read from the archive so far
    pub bytes_consumed: u64,
}

/// Lazily produced records.
///
/// Items are `Err(AppError::Parse)` for a line that is not a valid record and
/// `Err(AppError::Archive)` when the archive itself cannot be read further.
pub type RecordStream<'a> = Box<dyn Iterator<Item = AppResult<SourceRecord>> + 'a>;

/// Restartable producer of archive records.
pub trait RecordSource {
    /// Human-readable identity for logs.
    fn describe(&self) -> String;

    /// Size of the archive on disk.
    fn size_bytes(&self) -> AppResult<u64>;

    /// Start a fresh pass from the first record.
    fn open(&self) -> AppResult<RecordStream<'_>>;
}

/// zstd-compressed, newline-delimited JSON archive.
#[derive(Debug, Clone)]
pub struct ZstArchive {
    path: PathBuf,
}

impl ZstArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for ZstArchive {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn size_bytes(&self) -> AppResult<u64> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| AppError::Archive(format!("Failed to stat {:?}: {}", self.path, e)))
    }

    fn open(&self) -> AppResult<RecordStream<'_>> {
        let file = File::open(&self.path)
            .map_err(|e| AppError::Archive(format!("Failed to open {:?}: {}", self.path, e)))?;

        let consumed = Rc::new(Cell::new(0u64));
        let counting = CountingReader {
            inner: file,
            count: consumed.clone(),
        };

        let mut decoder = zstd::stream::read::Decoder::new(counting).map_err(|e| {
            AppError::Archive(format!("Failed to start decoder for {:?}: {}", self.path, e))
        })?;
        // Pushshift dumps are compressed with a 2 GiB window
        decoder.window_log_max(31).map_err(|e| {
            AppError::Archive(format!("Failed to configure decoder for {:?}: {}", self.path, e))
        })?;

        Ok(Box::new(JsonLines {
            reader: BufReader::new(decoder),
            consumed,
            origin: self.describe(),
            buf: Vec::with_capacity(16 * 1024),
            line_no: 0,
            done: false,
        }))
    }
}

/// Counts bytes pulled from the wrapped reader.
struct CountingReader<R> {
    inner: R,
    count: Rc<Cell<u64>>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.set(self.count.get() + n as u64);
        Ok(n)
    }
}

/// Splits a decompressed byte stream into parsed records.
struct JsonLines<R> {
    reader: R,
    consumed: Rc<Cell<u64>>,
    origin: String,
    buf: Vec<u8>,
    line_no: u64,
    done: bool,
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = AppResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line_no += 1;
                    let line = String::from_utf8_lossy(&self.buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if line.trim().is_empty() {
                        continue;
                    }

                    let record = serde_json::from_str::<ContentItem>(line)
                        .map(|item| SourceRecord {
                            item,
                            raw_line: line.to_string(),
                            bytes_consumed: self.consumed.get(),
                        })
                        .map_err(|e| {
                            AppError::Parse(format!(
                                "{} line {}: {}",
                                self.origin, self.line_no, e
                            ))
                        });
                    return Some(record);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(AppError::Archive(format!(
                        "Failed to read {} after line {}: {}",
                        self.origin, self.line_no, e
                    ))));
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_archive;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_records_and_restarts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rust_comments.zst");
        let lines: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"author":"user{}","score":{},"body":"text {}"}}"#, i, i, i))
            .collect();
        write_archive(&path, &lines);

        let archive = ZstArchive::new(&path);
        let first: Vec<SourceRecord> = archive.open().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first[2].item.author.as_deref(), Some("user2"));
        assert_eq!(first[4].raw_line, lines[4]);
        assert!(first[4].bytes_consumed > 0);
        assert!(first[4].bytes_consumed <= archive.size_bytes().unwrap());

        // A second pass starts from the beginning again
        let second: Vec<SourceRecord> = archive.open().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].item, first[0].item);
    }

    #[test]
    fn test_malformed_line_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rust_comments.zst");
        write_archive(
            &path,
            &[
                r#"{"body":"ok"}"#.to_string(),
                "not json".to_string(),
                String::new(),
                r#"{"body":"also ok"}"#.to_string(),
            ],
        );

        let results: Vec<AppResult<SourceRecord>> =
            ZstArchive::new(&path).open().unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(AppError::Parse(_))));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_missing_archive() {
        let archive = ZstArchive::new("/nonexistent/rust_submissions.zst");
        assert!(matches!(archive.open(), Err(AppError::Archive(_))));
        assert!(matches!(archive.size_bytes(), Err(AppError::Archive(_))));
    }

    #[test]
    fn test_not_zstd_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.zst");
        std::fs::write(&path, b"{\"body\":\"plain text, not compressed\"}\n").unwrap();

        let results: Vec<AppResult<SourceRecord>> =
            ZstArchive::new(&path).open().unwrap().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(AppError::Archive(_))));
    }
}
