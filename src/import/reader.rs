//! Streaming line source for TSV files.
//!
//! The reader is pull-based: the consumer asks for the next line only after
//! it has finished with the previous one, so at most one record is in flight
//! and lines are processed in file order.

use std::path::PathBuf;
use std::str::Utf8Error;

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

const READ_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Error)]
#[error("failed to read '{}': {source}", .path.display())]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// One step of the line stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A non-blank line with its 1-based position in the file.
    Line { number: usize, content: String },
    /// A non-blank line that is not valid UTF-8. Only this line is affected.
    Undecodable { number: usize, error: Utf8Error },
    /// End of input; `lines` counts the non-blank lines seen.
    End { lines: usize },
}

#[derive(Debug, Clone)]
pub struct TsvFileReader {
    path: PathBuf,
}

impl TsvFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn open(&self) -> Result<TsvLines, FileReadError> {
        let file = File::open(&self.path).await.map_err(|source| FileReadError {
            path: self.path.clone(),
            source,
        })?;

        Ok(TsvLines {
            path: self.path.clone(),
            reader: BufReader::with_capacity(READ_CHUNK_SIZE, file),
            buf: Vec::new(),
            position: 0,
            emitted: 0,
            finished: false,
        })
    }
}

pub struct TsvLines {
    path: PathBuf,
    reader: BufReader<File>,
    buf: Vec<u8>,
    position: usize,
    emitted: usize,
    finished: bool,
}

impl TsvLines {
    /// Read up to the next non-blank line. After `End` every further call
    /// returns `End` again.
    pub async fn next_event(&mut self) -> Result<ReadEvent, FileReadError> {
        if self.finished {
            return Ok(ReadEvent::End {
                lines: self.emitted,
            });
        }

        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|source| FileReadError {
                    path: self.path.clone(),
                    source,
                })?;

            if read == 0 {
                self.finished = true;
                return Ok(ReadEvent::End {
                    lines: self.emitted,
                });
            }

            self.position += 1;
            let line = strip_line_ending(&self.buf);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            self.emitted += 1;
            let number = self.position;
            return Ok(match std::str::from_utf8(line) {
                Ok(content) => ReadEvent::Line {
                    number,
                    content: content.to_string(),
                },
                Err(error) => ReadEvent::Undecodable { number, error },
            });
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn collect(reader: &TsvFileReader) -> (Vec<(usize, String)>, usize) {
        let mut lines = reader.open().await.expect("open");
        let mut seen = Vec::new();
        loop {
            match lines.next_event().await.expect("read") {
                ReadEvent::Line { number, content } => seen.push((number, content)),
                ReadEvent::Undecodable { number, error } => {
                    panic!("line {number} is not UTF-8: {error}")
                }
                ReadEvent::End { lines } => return (seen, lines),
            }
        }
    }

    #[tokio::test]
    async fn emits_lines_in_order_then_completion() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "first\tline\r\nsecond\n\n   \nthird").expect("write");

        let reader = TsvFileReader::new(file.path());
        let (seen, total) = collect(&reader).await;

        assert_eq!(
            seen,
            vec![
                (1, "first\tline".to_string()),
                (2, "second".to_string()),
                (5, "third".to_string()),
            ]
        );
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn keeps_reporting_end_after_completion() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let mut lines = TsvFileReader::new(file.path()).open().await.expect("open");

        assert_eq!(lines.next_event().await.expect("read"), ReadEvent::End { lines: 0 });
        assert_eq!(lines.next_event().await.expect("read"), ReadEvent::End { lines: 0 });
    }

    #[tokio::test]
    async fn invalid_utf8_only_affects_its_own_line() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"good\nbad\xff\xferow\r\nalso good\n")
            .expect("write");
        let mut lines = TsvFileReader::new(file.path()).open().await.expect("open");

        assert_eq!(
            lines.next_event().await.expect("read"),
            ReadEvent::Line {
                number: 1,
                content: "good".into()
            }
        );
        assert!(matches!(
            lines.next_event().await.expect("read"),
            ReadEvent::Undecodable { number: 2, .. }
        ));
        assert_eq!(
            lines.next_event().await.expect("read"),
            ReadEvent::Line {
                number: 3,
                content: "also good".into()
            }
        );
        assert_eq!(lines.next_event().await.expect("read"), ReadEvent::End { lines: 3 });
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.tsv");

        let err = TsvFileReader::new(&path).open().await.err().expect("error");
        assert_eq!(err.path, path);
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn streams_files_larger_than_one_chunk() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let row = "x".repeat(1000);
        for _ in 0..50 {
            writeln!(file, "{row}").expect("write");
        }

        let (seen, total) = collect(&TsvFileReader::new(file.path())).await;
        assert_eq!(total, 50);
        assert!(seen.iter().all(|(_, line)| line.len() == 1000));
    }
}
