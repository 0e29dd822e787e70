//! Measurement probe - timing, memory and processor deltas around an operation

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Deltas captured around a single measured operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Wall-clock elapsed time (ms)
    pub elapsed_ms: i64,
    /// Resident memory delta (bytes, may be negative)
    pub memory_delta_bytes: i64,
    /// Total processor time delta, user + system (ms)
    pub processor_real_ms: i64,
    /// User processor time delta (ms)
    pub processor_user_ms: i64,
}

impl std::fmt::Display for MeasurementRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "time: {}ms, real: {}ms, user: {}ms, memory: {}bytes",
            self.elapsed_ms, self.processor_real_ms, self.processor_user_ms, self.memory_delta_bytes
        )
    }
}

/// Point-in-time reading of process resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSnapshot {
    /// Resident set size (bytes)
    pub rss_bytes: u64,
    /// Total processor time, user + system
    pub processor_total: Duration,
    /// User processor time
    pub processor_user: Duration,
}

/// Source of process resource readings.
///
/// Wall-clock time is always taken from [`Instant`]; only the process
/// counters are pluggable.
pub trait MetricsProbe {
    fn snapshot(&self) -> ProbeSnapshot;
}

/// Reads resource usage of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProbe;

impl MetricsProbe for ProcessProbe {
    fn snapshot(&self) -> ProbeSnapshot {
        let (processor_total, processor_user) = get_processor_times().unwrap_or_default();
        ProbeSnapshot {
            rss_bytes: get_rss_bytes().unwrap_or(0),
            processor_total,
            processor_user,
        }
    }
}

/// Run `operation` once and return its deltas along with its outcome.
///
/// Panics raised by `operation` are not caught here.
pub fn measure<F>(probe: &dyn MetricsProbe, operation: F) -> (MeasurementRecord, bool)
where
    F: FnOnce() -> bool,
{
    let before = probe.snapshot();
    let watch = Instant::now();
    let outcome = operation();
    let elapsed = watch.elapsed();
    let after = probe.snapshot();

    let record = MeasurementRecord {
        elapsed_ms: duration_ms(elapsed),
        memory_delta_bytes: after.rss_bytes as i64 - before.rss_bytes as i64,
        processor_real_ms: duration_ms(after.processor_total) - duration_ms(before.processor_total),
        processor_user_ms: duration_ms(after.processor_user) - duration_ms(before.processor_user),
    };
    (record, outcome)
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Get RSS bytes (macOS and Linux compatible)
pub fn get_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("ps")
            .args(["-o", "rss=", "-p", &std::process::id().to_string()])
            .output()
            .ok()?;

        let rss_kb: u64 = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .ok()?;

        Some(rss_kb * 1024)
    }

    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        // SAFETY: sysconf has no preconditions
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            return None;
        }
        Some(rss_pages * page_size as u64)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Get (total, user) processor time of the current process
#[cfg(unix)]
pub fn get_processor_times() -> Option<(Duration, Duration)> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::uninit();
    // SAFETY: getrusage fully initialises `usage` when it returns 0
    let usage = unsafe {
        if libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) != 0 {
            return None;
        }
        usage.assume_init()
    };

    let user = timeval_to_duration(usage.ru_utime);
    let system = timeval_to_duration(usage.ru_stime);
    Some((user + system, user))
}

#[cfg(not(unix))]
pub fn get_processor_times() -> Option<(Duration, Duration)> {
    None
}

#[cfg(unix)]
fn timeval_to_duration(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Probe returning a scripted sequence of snapshots
    struct ScriptedProbe {
        snapshots: Vec<ProbeSnapshot>,
        calls: Cell<usize>,
    }

    impl MetricsProbe for ScriptedProbe {
        fn snapshot(&self) -> ProbeSnapshot {
            let i = self.calls.get();
            self.calls.set(i + 1);
            self.snapshots[i]
        }
    }

    #[test]
    fn test_measure_computes_deltas() {
        let probe = ScriptedProbe {
            snapshots: vec![
                ProbeSnapshot {
                    rss_bytes: 4096,
                    processor_total: Duration::from_millis(30),
                    processor_user: Duration::from_millis(20),
                },
                ProbeSnapshot {
                    rss_bytes: 1024,
                    processor_total: Duration::from_millis(45),
                    processor_user: Duration::from_millis(27),
                },
            ],
            calls: Cell::new(0),
        };

        let (record, outcome) = measure(&probe, || true);

        assert!(outcome);
        assert_eq!(probe.calls.get(), 2);
        assert_eq!(record.memory_delta_bytes, -3072);
        assert_eq!(record.processor_real_ms, 15);
        assert_eq!(record.processor_user_ms, 7);
        assert!(record.elapsed_ms >= 0);
    }

    #[test]
    fn test_measure_invokes_operation_once() {
        let calls = Cell::new(0);
        let (_, outcome) = measure(&ProcessProbe, || {
            calls.set(calls.get() + 1);
            false
        });

        assert!(!outcome);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_elapsed_time_is_recorded() {
        let (record, _) = measure(&ProcessProbe, || {
            std::thread::sleep(Duration::from_millis(20));
            true
        });
        assert!(record.elapsed_ms >= 20);
    }

    #[test]
    fn test_record_display() {
        let record = MeasurementRecord {
            elapsed_ms: 12,
            memory_delta_bytes: 2048,
            processor_real_ms: 10,
            processor_user_ms: 8,
        };
        assert_eq!(
            record.to_string(),
            "time: 12ms, real: 10ms, user: 8ms, memory: 2048bytes"
        );
    }

    #[test]
    fn test_process_snapshot() {
        let snapshot = ProcessProbe.snapshot();
        assert!(snapshot.rss_bytes > 0 || cfg!(not(any(target_os = "macos", target_os = "linux"))));
        assert!(snapshot.processor_user <= snapshot.processor_total);
    }
}
