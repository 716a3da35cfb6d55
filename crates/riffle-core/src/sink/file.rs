//! A sink that appends human-readable lines to a file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use riffle_common::types::Value;
use riffle_common::utils::error::Result;

use super::{render_row, OutputSink};
use crate::execution::MatchOutputTag;

/// Writes one line per tuple: space-separated fields, then the tag name.
///
/// Continuous queries hold one of these open across mutation batches, so
/// every append is flushed through to the file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// The path this sink writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn append(&mut self, tag: MatchOutputTag, row: &[Value]) -> Result<()> {
        writeln!(self.writer, "{}", render_row(tag, row))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let mut sink = FileSink::create(&path).unwrap();
            sink.append(
                MatchOutputTag::Matched,
                &[Value::Int(0), Value::Int(1), Value::Int(3)],
            )
            .unwrap();
            sink.append(MatchOutputTag::Emerged, &[Value::Int(2), Value::Int(4)])
                .unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "0 1 3 MATCHED\n2 4 EMERGED\n");
    }
}
