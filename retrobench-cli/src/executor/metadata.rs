//! System Metadata Collection
//!
//! Describes the machine and the effective settings a run was measured with,
//! so a JSON report can be compared against others later.
//!
//! CPU model comes from `/proc/cpuinfo` on Linux and degrades to "Unknown"
//! elsewhere. Physical memory is read through `sysconf` on unix.

use chrono::Utc;
use retrobench_report::{ReportMeta, RunSettings, SystemInfo};
use std::path::Path;

/// Report schema version written to `meta.schema_version`
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Build report metadata for a run over `benchmark_spec`
pub fn build_report_meta(benchmark_spec: &Path, settings: RunSettings) -> ReportMeta {
    ReportMeta {
        schema_version: REPORT_SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        benchmark_spec: benchmark_spec.to_path_buf(),
        settings,
        system: collect_system_info(),
    }
}

fn collect_system_info() -> SystemInfo {
    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1),
        memory_gb: memory_gb().unwrap_or(0.0),
    }
}

fn cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        // x86 reports "model name"; many ARM kernels only "Hardware" or "Model".
        ["model name", "Hardware", "Model"].iter().find_map(|key| {
            content
                .lines()
                .find(|l| l.starts_with(key))
                .and_then(|l| l.split_once(':'))
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn memory_gb() -> Option<f64> {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions.
        let (pages, page_size) =
            unsafe { (libc::sysconf(libc::_SC_PHYS_PAGES), libc::sysconf(libc::_SC_PAGESIZE)) };
        if pages <= 0 || page_size <= 0 {
            return None;
        }
        Some(pages as f64 * page_size as f64 / (1024.0 * 1024.0 * 1024.0))
    }
    #[cfg(not(unix))]
    {
        None
    }
}
