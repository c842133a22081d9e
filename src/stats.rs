/*!
 * Per-file transfer results and batch summaries
 */

use std::fmt;
use std::time::Duration;

const MIB: f64 = 1024.0 * 1024.0;

/// Which way a batch moves files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Local folder to bucket
    Upload,
    /// Bucket to local folder
    Download,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Upload => write!(f, "upload"),
            TransferDirection::Download => write!(f, "download"),
        }
    }
}

/// Transfer rate of a single file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throughput {
    /// MiB per second
    MibPerSecond(f64),
    /// Elapsed time was zero; only the byte count is meaningful
    Bytes(u64),
}

impl Throughput {
    pub fn compute(bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            Throughput::Bytes(bytes)
        } else {
            Throughput::MibPerSecond(bytes as f64 / secs / MIB)
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throughput::MibPerSecond(rate) => write!(f, "{:.2} MiB/s", rate),
            Throughput::Bytes(bytes) => write!(f, "{} bytes", bytes),
        }
    }
}

/// Outcome of one transferred candidate; reported, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub index: usize,
    pub source: String,
    pub destination: String,
    pub bytes: u64,
    pub elapsed: Duration,
    /// Object URL for uploads
    pub location: Option<String>,
}

impl TransferResult {
    pub fn throughput(&self) -> Throughput {
        Throughput::compute(self.bytes, self.elapsed)
    }
}

/// Everything a single `get` or `put` did
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub direction: TransferDirection,
    /// Keys examined while listing; `None` when no listing was needed
    pub scanned: Option<u64>,
    /// Listing pages requested
    pub list_calls: usize,
    /// Candidates in transfer order
    pub selected: Vec<String>,
    pub results: Vec<TransferResult>,
    pub removed: usize,
    /// Sources whose removal failed after a successful transfer
    pub removal_failures: Vec<String>,
}

impl BatchReport {
    pub fn new(direction: TransferDirection) -> Self {
        Self {
            direction,
            scanned: None,
            list_calls: 0,
            selected: Vec::new(),
            results: Vec::new(),
            removed: 0,
            removal_failures: Vec::new(),
        }
    }

    pub fn transferred(&self) -> usize {
        self.results.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.bytes).sum()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.results.iter().map(|r| r.elapsed).sum()
    }

    pub fn throughput(&self) -> Throughput {
        Throughput::compute(self.total_bytes(), self.total_elapsed())
    }

    /// Nothing was selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(bytes: u64, millis: u64) -> TransferResult {
        TransferResult {
            index: 0,
            source: "a".to_string(),
            destination: "b".to_string(),
            bytes,
            elapsed: Duration::from_millis(millis),
            location: None,
        }
    }

    #[test]
    fn test_throughput_in_mib() {
        let t = Throughput::compute(10 * 1024 * 1024, Duration::from_secs(2));
        assert_eq!(t, Throughput::MibPerSecond(5.0));
        assert_eq!(t.to_string(), "5.00 MiB/s");
    }

    #[test]
    fn test_zero_elapsed_reports_bytes() {
        let t = Throughput::compute(4096, Duration::ZERO);
        assert_eq!(t, Throughput::Bytes(4096));
        assert_eq!(t.to_string(), "4096 bytes");
    }

    #[test]
    fn test_batch_totals() {
        let mut report = BatchReport::new(TransferDirection::Upload);
        assert!(report.is_empty());
        report.selected = vec!["a".to_string(), "b".to_string()];
        report.results.push(result(1024 * 1024, 500));
        report.results.push(result(3 * 1024 * 1024, 1500));

        assert_eq!(report.transferred(), 2);
        assert_eq!(report.total_bytes(), 4 * 1024 * 1024);
        assert_eq!(report.total_elapsed(), Duration::from_secs(2));
        assert_eq!(report.throughput(), Throughput::MibPerSecond(2.0));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(TransferDirection::Download.to_string(), "download");
    }
}
