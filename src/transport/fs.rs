use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::DatasetError;

/// Write-once JSONL output file.
///
/// Creation fails with `OutputExists` when the path is already taken, so an existing dataset is
/// never overwritten. Batches are serialized in full before any byte of them is written.
pub struct JsonlWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonlWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(DatasetError::OutputExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| match err.kind() {
                ErrorKind::AlreadyExists => DatasetError::OutputExists(path.to_path_buf()),
                _ => DatasetError::Io(err),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one batch, one JSON object per line.
    pub fn write_batch<T: Serialize>(&mut self, records: &[T]) -> Result<(), DatasetError> {
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }
        self.writer.write_all(&buffer)?;
        self.written += records.len();
        debug!(
            "wrote {} records to {} ({} total)",
            records.len(),
            self.path.display(),
            self.written
        );
        Ok(())
    }

    /// Flush buffered output and return the number of records written.
    pub fn finish(mut self) -> Result<usize, DatasetError> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Write `records` to a new JSONL file at `path`.
pub fn write_jsonl<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<usize, DatasetError> {
    let mut writer = JsonlWriter::create(path)?;
    writer.write_batch(records)?;
    writer.finish()
}

/// Read every line of a JSONL file; blank lines are ignored, any other bad line is an error.
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, DatasetError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|err| DatasetError::MalformedRecord {
            record: format!("{}:{}", path.display(), line_idx + 1),
            reason: err.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Replace the contents of an existing JSONL file through a sibling temp file and rename.
pub fn rewrite_jsonl<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), DatasetError> {
    let path = path.as_ref();
    let mut tmp_name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        value: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "a".into(),
                value: 1,
            },
            Row {
                id: "b".into(),
                value: 2,
            },
        ]
    }

    #[test]
    fn writer_refuses_existing_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("out.jsonl");
        fs::write(&path, "keep me\n").unwrap();
        let result = JsonlWriter::create(&path);
        assert!(matches!(result, Err(DatasetError::OutputExists(p)) if p == path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
    }

    #[test]
    fn writes_one_object_per_line_across_batches() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("out.jsonl");
        let mut writer = JsonlWriter::create(&path).unwrap();
        writer.write_batch(&rows()[..1]).unwrap();
        writer.write_batch(&rows()[1..]).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\"id\":\"a\",\"value\":1}\n{\"id\":\"b\",\"value\":2}\n");
        let back: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn reader_reports_line_of_bad_record() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.jsonl");
        fs::write(&path, "{\"id\":\"a\",\"value\":1}\n\n{\"id\":\"b\"}\n").unwrap();
        let err = read_jsonl::<Row>(&path).unwrap_err();
        match err {
            DatasetError::MalformedRecord { record, .. } => assert!(record.ends_with(":3")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rewrite_replaces_contents_in_place() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("subset.jsonl");
        write_jsonl(&path, &rows()).unwrap();
        let mut updated = rows();
        updated[0].value = 10;
        rewrite_jsonl(&path, &updated).unwrap();
        let back: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(back, updated);
        assert!(!temp.path().join("subset.jsonl.tmp").exists());
    }
}
