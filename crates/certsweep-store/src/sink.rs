//! Streaming per-run result file.

use crate::error::Result;
use certsweep_core::CacheEntry;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Incremental writer for one run's ordered outcome sequence.
///
/// Writes a JSON array element by element, flushing after every append, so
/// a crash loses at most the in-flight batch. The file carries a `_temp`
/// name until [`finalize`](Self::finalize) closes the array and renames it
/// with the true element count — an artifact still named `_temp` is an
/// unambiguous marker of an incomplete run.
///
/// The writer owns its separator state: elements already appended are never
/// lost or reordered by a later failed append.
#[derive(Debug)]
pub struct ResultSink {
    writer: BufWriter<File>,
    dir: PathBuf,
    temp_path: PathBuf,
    subject: String,
    timestamp: String,
    start: u64,
    end: u64,
    appended: usize,
}

impl ResultSink {
    /// Create the temp-named result file and open the array.
    ///
    /// The directory is created if needed. The file is named
    /// `results_<subject>_<timestamp>_<start>_<end>_temp.json`.
    pub fn create(
        dir: impl Into<PathBuf>,
        subject: &str,
        timestamp: &str,
        start: u64,
        end: u64,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let temp_path = dir.join(format!("results_{subject}_{timestamp}_{start}_{end}_temp.json"));
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        writer.write_all(b"[\n")?;
        writer.flush()?;

        debug!(path = %temp_path.display(), "opened result sink");

        Ok(Self {
            writer,
            dir,
            temp_path,
            subject: subject.to_string(),
            timestamp: timestamp.to_string(),
            start,
            end,
            appended: 0,
        })
    }

    /// Append one outcome as the next array element and flush it.
    pub fn append(&mut self, entry: &CacheEntry) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        if self.appended > 0 {
            self.writer.write_all(b",\n")?;
        }
        write!(self.writer, "  {json}")?;
        self.writer.flush()?;
        self.appended += 1;
        Ok(())
    }

    /// Number of elements appended so far.
    #[must_use]
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Path of the in-progress artifact.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Close the array and atomically rename the artifact to its final name
    /// carrying the true element count. Returns the final path.
    pub fn finalize(mut self, total: usize) -> Result<PathBuf> {
        self.writer.write_all(b"\n]")?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;

        let final_path = self.dir.join(format!(
            "results_{}_{}_{}_{}_{}.json",
            self.subject, self.timestamp, self.start, self.end, total
        ));
        fs::rename(&self.temp_path, &final_path)?;

        info!(path = %final_path.display(), count = total, "finalized result file");
        Ok(final_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certsweep_core::Outcome;
    use serde_json::Value as JsonValue;
    use tempfile::TempDir;

    fn entry(cert_no: &str) -> CacheEntry {
        CacheEntry::new("张三", cert_no, Outcome::NoData)
    }

    #[test]
    fn test_temp_name_while_in_progress() {
        let tmp = TempDir::new().expect("create temp dir");
        let sink = ResultSink::create(tmp.path(), "张三", "20240101120000", 100, 199)
            .expect("create sink");

        assert_eq!(
            sink.temp_path().file_name().and_then(|n| n.to_str()),
            Some("results_张三_20240101120000_100_199_temp.json")
        );
        assert!(sink.temp_path().exists());
    }

    #[test]
    fn test_appended_elements_survive_without_finalize() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut sink = ResultSink::create(tmp.path(), "张三", "20240101120000", 1, 3)
            .expect("create sink");

        sink.append(&entry("1")).expect("append");
        sink.append(&entry("2")).expect("append");
        let temp_path = sink.temp_path().to_path_buf();
        drop(sink);

        // Simulated crash: the temp artifact holds exactly the appended
        // elements, recoverable by closing the array
        let contents = fs::read_to_string(&temp_path).expect("read temp artifact");
        assert!(contents.starts_with("[\n"));
        assert!(!contents.trim_end().ends_with(']'));

        let recovered: JsonValue =
            serde_json::from_str(&format!("{contents}\n]")).expect("recoverable array");
        assert_eq!(recovered.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_finalize_renames_with_count() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut sink = ResultSink::create(tmp.path(), "张三", "20240101120000", 1, 3)
            .expect("create sink");

        for cert_no in ["1", "2", "3"] {
            sink.append(&entry(cert_no)).expect("append");
        }
        let temp_path = sink.temp_path().to_path_buf();
        let final_path = sink.finalize(3).expect("finalize");

        assert!(!temp_path.exists());
        assert_eq!(
            final_path.file_name().and_then(|n| n.to_str()),
            Some("results_张三_20240101120000_1_3_3.json")
        );

        let contents = fs::read_to_string(&final_path).expect("read final artifact");
        let value: JsonValue = serde_json::from_str(&contents).expect("parse result array");
        let items = value.as_array().expect("array");
        assert_eq!(items.len(), 3);

        // Order preserved exactly as appended
        let cert_nos: Vec<&str> = items
            .iter()
            .map(|item| item["cert_no"].as_str().expect("cert_no"))
            .collect();
        assert_eq!(cert_nos, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_run_finalizes_to_valid_array() {
        let tmp = TempDir::new().expect("create temp dir");
        let sink = ResultSink::create(tmp.path(), "张三", "20240101120000", 5, 4)
            .expect("create sink");

        let final_path = sink.finalize(0).expect("finalize");
        let contents = fs::read_to_string(&final_path).expect("read final artifact");
        let value: JsonValue = serde_json::from_str(&contents).expect("parse result array");
        assert_eq!(value.as_array().map(Vec::len), Some(0));
    }
}
