//! Output-tree provisioning and the external sampling subprocess.
//!
//! The sampler is an external collaborator: a shell script that runs the
//! batch job under per-process monitoring and drops one raw text file per
//! role under `<results>/<description>/raw/` before it returns.

use crate::Result;

use anyhow::{Context, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Script invoked once per run, blocking until the batch job completes.
const MONITOR_SCRIPT: &str = "./monitor_pipeline.sh";

/// Create `raw/`, `graphs/` and `tables/` under the run's output tree.
pub fn provision(results_root: &Path, data_description: &str) -> Result<()> {
    let base = results_root.join(data_description);
    for sub in ["raw", "graphs", "tables"] {
        let dir = base.join(sub);
        fs::create_dir_all(&dir)
            .with_context(|| format!("create output dir {}", dir.display()))?;
    }
    Ok(())
}

/// Run the monitoring script and wait for it. A failed sampler means no
/// trustworthy raw files, so the run stops here instead of surfacing a
/// confusing missing-file error three stages later.
pub fn run_sampler(
    num_proc: u32,
    data_description: &str,
    parquet_root: &Path,
    results_root: &Path,
) -> Result<()> {
    let status = Command::new("sh")
        .arg(MONITOR_SCRIPT)
        .arg(num_proc.to_string())
        .arg(data_description)
        .arg(parquet_root)
        .arg(results_root)
        .status()
        .with_context(|| format!("launch {MONITOR_SCRIPT}"))?;

    if !status.success() {
        bail!("{MONITOR_SCRIPT} exited with {status}");
    }
    Ok(())
}

/// Directory the sampler drops the per-role raw files into.
pub fn raw_dir(results_root: &Path, data_description: &str) -> PathBuf {
    results_root.join(data_description).join("raw")
}

/// `graphs/resource_usage_<n>_proc.png` under the run's output tree.
pub fn graph_path(results_root: &Path, data_description: &str, num_proc: u32) -> PathBuf {
    results_root
        .join(data_description)
        .join("graphs")
        .join(format!("resource_usage_{num_proc}_proc.png"))
}

/// `tables/resource_usage_<n>_proc.csv` under the run's output tree.
pub fn table_path(results_root: &Path, data_description: &str, num_proc: u32) -> PathBuf {
    results_root
        .join(data_description)
        .join("tables")
        .join(format!("resource_usage_{num_proc}_proc.csv"))
}
