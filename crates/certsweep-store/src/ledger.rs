//! Append-only ledger of discovered certificates.

use crate::error::Result;
use certsweep_core::DiscoveredRecord;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const HEADER_RULE: &str =
    "============================================================";
const HEADER_TITLE: &str = "查询到的等级证书编号";
const LINE_PREFIX: &str = "证书编号:";

/// Match the certificate number out of one ledger line.
fn line_regex() -> &'static Regex {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    LINE_RE.get_or_init(|| {
        Regex::new(r"^证书编号:\s*([^|]+?)\s*(?:\||$)").expect("valid regex")
    })
}

/// Running record of every discovered certificate, one line per certificate,
/// deduplicated by certificate number across the lifetime of the file.
///
/// Independent of the outcome cache: reloading the file reconstructs the
/// set of already-recorded numbers, so duplicates are suppressed across
/// process restarts too.
#[derive(Debug)]
pub struct CertificateLedger {
    path: PathBuf,
    seen: HashSet<String>,
}

impl CertificateLedger {
    /// Open the ledger, reconstructing the recorded-number set from the file.
    ///
    /// A missing or unreadable file yields an empty ledger; malformed lines
    /// are skipped, not fatal.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut seen = HashSet::new();

        if let Ok(contents) = fs::read_to_string(&path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with("===") {
                    continue;
                }
                if let Some(captures) = line_regex().captures(line) {
                    seen.insert(captures[1].to_string());
                } else if line.starts_with(LINE_PREFIX) {
                    warn!(line = %line, "skipping malformed ledger line");
                }
            }
            info!(count = seen.len(), path = %path.display(), "loaded certificate ledger");
        }

        Self { path, seen }
    }

    /// Whether a certificate number is already recorded.
    #[must_use]
    pub fn has(&self, cert_no: &str) -> bool {
        self.seen.contains(cert_no)
    }

    /// Number of recorded certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The file this ledger appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one discovered certificate.
    ///
    /// A no-op for records without a certificate number and for numbers
    /// already recorded. The first write to an empty file is preceded by the
    /// ledger header. Each line is flushed before returning.
    pub fn append(&mut self, record: &DiscoveredRecord) -> Result<()> {
        let cert_no = record.certificate_no.as_str();
        if cert_no.is_empty() || self.seen.contains(cert_no) {
            debug!(cert_no = %cert_no, "certificate already recorded, skipping");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if file.metadata()?.len() == 0 {
            writeln!(file, "{HEADER_RULE}")?;
            writeln!(file, "{HEADER_TITLE}")?;
            writeln!(file, "{HEADER_RULE}")?;
            writeln!(file)?;
        }

        writeln!(
            file,
            "{LINE_PREFIX} {cert_no} | {} - {} - {}",
            record.display_name(),
            record.display_rank(),
            record.display_item()
        )?;
        file.flush()?;

        self.seen.insert(cert_no.to_string());
        debug!(cert_no = %cert_no, "recorded discovered certificate");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(cert_no: &str) -> DiscoveredRecord {
        DiscoveredRecord {
            certificate_no: cert_no.to_string(),
            athlete_name: Some("张三".to_string()),
            rank_title: Some("一级运动员".to_string()),
            item: Some("田径".to_string()),
        }
    }

    #[test]
    fn test_append_writes_header_once() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("certificates.txt");

        let mut ledger = CertificateLedger::load(&path);
        ledger.append(&record("20210001")).expect("append");
        ledger.append(&record("20210002")).expect("append");

        let contents = fs::read_to_string(&path).expect("read ledger");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], HEADER_RULE);
        assert_eq!(lines[1], HEADER_TITLE);
        assert_eq!(lines[2], HEADER_RULE);
        assert_eq!(lines[3], "");
        assert_eq!(
            lines[4],
            "证书编号: 20210001 | 张三 - 一级运动员 - 田径"
        );
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_duplicate_append_is_noop() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("certificates.txt");

        let mut ledger = CertificateLedger::load(&path);
        ledger.append(&record("20210001")).expect("append");
        ledger.append(&record("20210001")).expect("append duplicate");

        let contents = fs::read_to_string(&path).expect("read ledger");
        assert_eq!(
            contents
                .lines()
                .filter(|line| line.starts_with(LINE_PREFIX))
                .count(),
            1
        );
    }

    #[test]
    fn test_dedup_survives_reload() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("certificates.txt");

        {
            let mut ledger = CertificateLedger::load(&path);
            ledger.append(&record("20210001")).expect("append");
        }

        let mut reloaded = CertificateLedger::load(&path);
        assert!(reloaded.has("20210001"));
        assert_eq!(reloaded.len(), 1);

        reloaded.append(&record("20210001")).expect("append duplicate");
        let contents = fs::read_to_string(&path).expect("read ledger");
        assert_eq!(
            contents
                .lines()
                .filter(|line| line.starts_with(LINE_PREFIX))
                .count(),
            1
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped_on_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("certificates.txt");
        fs::write(
            &path,
            "============================================================\n\
             查询到的等级证书编号\n\
             ============================================================\n\
             \n\
             证书编号: 20210001 | 张三 - 一级运动员 - 田径\n\
             some stray line\n\
             证书编号: 20210002 | 李四 - 二级运动员 - 游泳\n",
        )
        .expect("write ledger");

        let ledger = CertificateLedger::load(&path);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.has("20210001"));
        assert!(ledger.has("20210002"));
        assert!(!ledger.has("some"));
    }

    #[test]
    fn test_record_without_number_is_noop() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("certificates.txt");

        let mut ledger = CertificateLedger::load(&path);
        let empty = DiscoveredRecord {
            certificate_no: String::new(),
            athlete_name: None,
            rank_title: None,
            item: None,
        };
        ledger.append(&empty).expect("append empty");

        assert!(!path.exists());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unknown_fields_render_placeholder() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("certificates.txt");

        let mut ledger = CertificateLedger::load(&path);
        let partial = DiscoveredRecord {
            certificate_no: "20210009".to_string(),
            athlete_name: None,
            rank_title: None,
            item: None,
        };
        ledger.append(&partial).expect("append partial");

        let contents = fs::read_to_string(&path).expect("read ledger");
        assert!(contents.contains("证书编号: 20210009 | 未知 - 未知 - 未知"));
    }
}
