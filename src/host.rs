//! Host introspection used for memory normalization and chart labeling.

use crate::error::ReportError;

use regex::Regex;
use std::fs;
use std::thread;

/// Total machine memory and core count, probed once per run. Everything
/// downstream takes the value, so tests substitute fixed numbers instead of
/// querying the real host.
#[derive(Debug, Clone, Copy)]
pub struct HostInfo {
    pub mem_total_gb: u64,
    pub cores: u64,
}

impl HostInfo {
    /// Query the local machine.
    pub fn detect() -> Result<Self, ReportError> {
        let meminfo = fs::read_to_string("/proc/meminfo")
            .map_err(|e| ReportError::HostQuery(format!("read /proc/meminfo: {e}")))?;
        let mem_total_gb = mem_total_gb(&meminfo)?;

        let cores = thread::available_parallelism()
            .map_err(|e| ReportError::HostQuery(format!("core count: {e}")))?
            .get() as u64;

        Ok(Self {
            mem_total_gb,
            cores,
        })
    }
}

/// Extract MemTotal from /proc/meminfo text, in whole GB.
fn mem_total_gb(meminfo: &str) -> Result<u64, ReportError> {
    let re = Regex::new(r"(?m)^MemTotal:\s+(\d+)\s*kB")
        .map_err(|e| ReportError::HostQuery(format!("meminfo pattern: {e}")))?;
    let caps = re
        .captures(meminfo)
        .ok_or_else(|| ReportError::HostQuery("no MemTotal line in /proc/meminfo".to_string()))?;
    let kb: u64 = caps[1]
        .parse()
        .map_err(|e| ReportError::HostQuery(format!("MemTotal value: {e}")))?;
    Ok(kb / 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MEMINFO: &str = "MemTotal:       16384000 kB\n\
                           MemFree:         1201224 kB\n\
                           MemAvailable:    931312 kB\n";

    #[test]
    fn mem_total_in_whole_gb() {
        assert_eq!(mem_total_gb(MEMINFO).unwrap(), 16);
    }

    #[test]
    fn mem_total_truncates_partial_gb() {
        // 33,554,432 kB is 33.5 GB; the report wants whole units.
        assert_eq!(mem_total_gb("MemTotal: 33554432 kB\n").unwrap(), 33);
    }

    #[test]
    fn missing_mem_total_is_host_query_error() {
        let err = mem_total_gb("MemFree: 123 kB\n").unwrap_err();
        assert!(matches!(err, ReportError::HostQuery(_)));
    }
}
