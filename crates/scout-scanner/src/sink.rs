//! Output sinks completed records are handed to.

use crate::error::{Result, ScanError};
use scout_core::PatentRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Stdout, Write};
use std::path::Path;
use std::sync::Mutex;

/// Destination for completed records. Called concurrently from extraction tasks.
pub trait RecordSink: Send + Sync {
    /// Persist or display one record.
    fn emit(&self, record: &PatentRecord) -> Result<()>;
}

/// Writes one JSON document per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap any writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| ScanError::Sink("writer lock poisoned".to_string()))
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Append to a file, creating it if needed.
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ScanError::Sink(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl JsonLinesSink<Stdout> {
    /// Write to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn emit(&self, record: &PatentRecord) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ScanError::Sink("writer lock poisoned".to_string()))?;

        serde_json::to_writer(&mut *writer, record).map_err(|e| ScanError::Sink(e.to_string()))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| ScanError::Sink(e.to_string()))
    }
}

/// Keeps records in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<PatentRecord>>,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record emitted so far.
    #[must_use]
    pub fn records(&self) -> Vec<PatentRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: &PatentRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| ScanError::Sink("record lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::{Claims, DetailAddress};

    fn record(number: &str) -> PatentRecord {
        PatentRecord {
            number: number.to_string(),
            title: "Catheter".to_string(),
            bibliographic: scout_core::Bibliographic::default(),
            description: String::new(),
            claims: Claims::new(String::new(), None),
            citations: None,
            legal_events: None,
            family: None,
            source_url: DetailAddress::new("https://example.test/detail/1"),
            extracted_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_json_lines_one_record_per_line() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.emit(&record("US1")).expect("emit first");
        sink.emit(&record("US2")).expect("emit second");

        let bytes = sink.into_inner().expect("writer");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first["number"], "US1");
        assert!(first["citations"].is_null());
        assert!(first["claims"].get("tree").is_none());
    }

    #[test]
    fn test_append_to_file() {
        let tmp = tempfile::TempDir::new().expect("temp dir");
        let path = tmp.path().join("records.jsonl");

        JsonLinesSink::append(&path)
            .expect("open sink")
            .emit(&record("US1"))
            .expect("emit");
        JsonLinesSink::append(&path)
            .expect("reopen sink")
            .emit(&record("US2"))
            .expect("emit");

        let contents = std::fs::read_to_string(&path).expect("read output");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        sink.emit(&record("US1")).expect("emit");
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].number, "US1");
    }
}
