use super::Metrics;
use chrono::{SecondsFormat, Utc};
use std::time::Instant;

/// Opaque start marker of a measured call.
///
/// `finish` consumes the timer, so a marker yields exactly one [`Metrics`].
#[derive(Debug)]
pub struct PerformanceTimer {
    started: Instant,
    memory: Option<u64>,
}

impl PerformanceTimer {
    pub fn start() -> Self {
        // Memory is sampled first so the sampling itself stays outside the measured span.
        let memory = resident_memory_bytes();
        Self {
            started: Instant::now(),
            memory,
        }
    }

    pub fn finish(self, status_code: u16, payload_size_bytes: usize) -> Metrics {
        let elapsed = self.started.elapsed();
        let memory_delta_bytes = match (self.memory, resident_memory_bytes()) {
            (Some(before), Some(after)) => after as i64 - before as i64,
            _ => 0,
        };

        Metrics {
            duration_millis: elapsed.as_secs_f64() * 1000.0,
            memory_delta_bytes,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status_code,
            payload_size_bytes,
        }
    }
}

#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    vm_rss_bytes(&status)
}

/// `VmRSS` is reported in kB whatever the kernel page size.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn vm_rss_bytes(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn back_to_back_timer_is_near_zero() {
        let metrics = PerformanceTimer::start().finish(200, 0);
        assert!(metrics.duration_millis >= 0.0);
        assert!(metrics.duration_millis < 50.0);
    }

    #[test]
    fn timer_measures_elapsed_time() {
        let timer = PerformanceTimer::start();
        std::thread::sleep(Duration::from_millis(20));
        let metrics = timer.finish(0, 0);
        assert!(metrics.duration_millis >= 20.0);
        assert_eq!(metrics.status_code, 0);
        assert!(!metrics.is_success());
    }

    #[test]
    fn resident_set_is_read_in_kib() {
        let status = "Name:\tqrlink\nVmPeak:\t  20000 kB\nVmRSS:\t    5120 kB\nThreads:\t4\n";
        assert_eq!(vm_rss_bytes(status), Some(5120 * 1024));
        assert_eq!(vm_rss_bytes("Name:\tqrlink\n"), None);
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let metrics = PerformanceTimer::start().finish(201, 42);
        assert!(chrono::DateTime::parse_from_rfc3339(&metrics.timestamp).is_ok());
        assert_eq!(metrics.payload_size_bytes, 42);
        assert!(metrics.is_success());
    }
}
