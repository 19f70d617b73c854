//! Aggregation model: collapse raw observations into per-second series,
//! normalize memory to absolute units, join the three roles and derive the
//! run summary.

use crate::error::ReportError;
use crate::sample::{Observation, Role};

use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Resource draw of one role during one second, memory in absolute GB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleUsage {
    pub cpu_pct: f64,
    pub mem_gb: f64,
    pub read_kbps: f64,
    pub write_kbps: f64,
}

/// Per-second row of one normalized role series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageRow {
    pub seconds: u64,
    pub usage: RoleUsage,
}

/// One second sampled by all three roles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedRow {
    pub seconds: u64,
    pub pipeline: RoleUsage,
    pub server: RoleUsage,
    pub db: RoleUsage,
}

/// Per-role metric means over the merged table, one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoleAverages {
    pub cpu_pct: f64,
    pub mem_gb: f64,
    pub read_kbps: f64,
    pub write_kbps: f64,
}

/// Scalar aggregates of the merged table, consumed by the report emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total_seconds: u64,
    pub pipeline: RoleAverages,
    pub server: RoleAverages,
    pub db: RoleAverages,
}

/// Collapse raw observations into one row per second, sorted ascending.
///
/// The DB role is the total draw of all its backend processes, so
/// same-second observations are summed field-wise. Pipeline and Server are
/// single processes; should the sampler ever emit a duplicate second for
/// them, the first observation wins (summing would double a reading).
/// Negative readings are a collector artifact at measurement boundaries and
/// are clamped to zero after grouping.
pub fn aggregate_role(role: Role, observations: Vec<Observation>) -> Vec<Observation> {
    let mut by_second: BTreeMap<u64, Observation> = BTreeMap::new();

    for obs in observations {
        match by_second.entry(obs.seconds) {
            Entry::Vacant(slot) => {
                slot.insert(obs);
            }
            Entry::Occupied(mut slot) => {
                if role == Role::Db {
                    let row = slot.get_mut();
                    row.cpu_pct += obs.cpu_pct;
                    row.mem_pct += obs.mem_pct;
                    row.read_kbps += obs.read_kbps;
                    row.write_kbps += obs.write_kbps;
                }
            }
        }
    }

    by_second.into_values().map(clamp_negative).collect()
}

fn clamp_negative(mut obs: Observation) -> Observation {
    obs.cpu_pct = obs.cpu_pct.max(0.0);
    obs.mem_pct = obs.mem_pct.max(0.0);
    obs.read_kbps = obs.read_kbps.max(0.0);
    obs.write_kbps = obs.write_kbps.max(0.0);
    obs
}

/// Replace memory-percent with absolute GB.
///
/// One-shot transform: it consumes the percent-valued rows, and `UsageRow`
/// carries no percent field, so a second application does not typecheck.
pub fn normalize_memory(rows: Vec<Observation>, total_mem_gb: f64) -> Vec<UsageRow> {
    rows.into_iter()
        .map(|obs| UsageRow {
            seconds: obs.seconds,
            usage: RoleUsage {
                cpu_pct: obs.cpu_pct,
                mem_gb: obs.mem_pct / 100.0 * total_mem_gb,
                read_kbps: obs.read_kbps,
                write_kbps: obs.write_kbps,
            },
        })
        .collect()
}

/// Inner-join the three role series on elapsed second, ascending.
///
/// A second missing from any one series produces no output row: a run
/// second is reportable only when all three roles were sampled. Dropped
/// seconds (ragged run edges, sampler hiccups) are counted and reported
/// once on stderr.
pub fn merge_series(
    pipeline: &[UsageRow],
    server: &[UsageRow],
    db: &[UsageRow],
) -> Result<Vec<MergedRow>, ReportError> {
    let server_by_second: BTreeMap<u64, RoleUsage> =
        server.iter().map(|r| (r.seconds, r.usage)).collect();
    let db_by_second: BTreeMap<u64, RoleUsage> = db.iter().map(|r| (r.seconds, r.usage)).collect();

    let mut merged = Vec::new();
    for row in pipeline {
        let (Some(server_usage), Some(db_usage)) = (
            server_by_second.get(&row.seconds),
            db_by_second.get(&row.seconds),
        ) else {
            continue;
        };
        merged.push(MergedRow {
            seconds: row.seconds,
            pipeline: row.usage,
            server: *server_usage,
            db: *db_usage,
        });
    }

    if merged.is_empty() {
        return Err(ReportError::EmptyResult);
    }

    let sampled: BTreeSet<u64> = pipeline
        .iter()
        .chain(server)
        .chain(db)
        .map(|r| r.seconds)
        .collect();
    let dropped = sampled.len() - merged.len();
    if dropped > 0 {
        eprintln!("WARN: dropped {dropped} second(s) not sampled by all three roles");
    }

    Ok(merged)
}

/// Derive the run summary: total elapsed time and the twelve metric means.
///
/// Order-independent; the merged table is non-empty by construction
/// (`merge_series` rejects an empty join).
pub fn compute_summary(merged: &[MergedRow]) -> Summary {
    Summary {
        total_seconds: merged.iter().map(|r| r.seconds).max().unwrap_or(0),
        pipeline: role_averages(merged, |r| r.pipeline),
        server: role_averages(merged, |r| r.server),
        db: role_averages(merged, |r| r.db),
    }
}

fn role_averages(merged: &[MergedRow], pick: impl Fn(&MergedRow) -> RoleUsage) -> RoleAverages {
    let n = merged.len() as f64;
    let mut cpu = 0.0;
    let mut mem = 0.0;
    let mut read = 0.0;
    let mut write = 0.0;
    for row in merged {
        let usage = pick(row);
        cpu += usage.cpu_pct;
        mem += usage.mem_gb;
        read += usage.read_kbps;
        write += usage.write_kbps;
    }
    RoleAverages {
        cpu_pct: round1(cpu / n),
        mem_gb: round1(mem / n),
        read_kbps: round1(read / n),
        write_kbps: round1(write / n),
    }
}

/// One decimal, for presentation.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
