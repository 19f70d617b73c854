//! Parser for one role's raw sample file.
//!
//! The monitor script captures plain text, one block per second: a line
//! starting with `#` marks the beginning of a new one-second interval, a
//! line starting with a digit carries one process's readings as
//! whitespace-separated columns, and everything else (kernel banner,
//! averages, blank lines) is noise.

use crate::error::ReportError;
use crate::sample::row::{Observation, Role};

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Process name expected in DB-role data lines. The database file samples
/// every process the collector matched, but only the database's own backends
/// count toward the DB series.
pub const DB_PROCESS_NAME: &str = "postgres";

/// Positional contract with the collector's text format. The offsets are
/// version-locked to the collector invocation in `monitor_pipeline.sh`;
/// changing that invocation means minting a new layout, not editing V1.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    /// Minimum tokens a data line must split into. Chosen so the metric
    /// window and the end-anchored identity token cannot overlap.
    pub min_fields: usize,
    /// CPU utilization in percent.
    pub cpu: usize,
    /// Memory utilization in percent.
    pub mem: usize,
    /// kB read per second.
    pub read_kb: usize,
    /// kB written per second.
    pub write_kb: usize,
    /// Process identity token, counted from the line end (the collector
    /// prints the command as the fixed tail of the line).
    pub identity_from_end: usize,
}

/// Layout of the current collector invocation. The interval timestamp
/// splits into two tokens, which is why %CPU lands at token 8.
pub const LAYOUT_V1: ColumnLayout = ColumnLayout {
    min_fields: 20,
    cpu: 8,
    mem: 14,
    read_kb: 15,
    write_kb: 16,
    identity_from_end: 3,
};

/// Parse one role's raw sample file into per-process observations, not yet
/// collapsed by second.
pub fn parse_sample_file(path: &Path, role: Role) -> Result<Vec<Observation>, ReportError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReportError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ReportError::Io(e),
    })?;
    parse_lines(&text, role, path)
}

/// Text-level parser; `origin` only feeds error messages.
///
/// Observations between two markers all share the same `seconds` value;
/// dedup/summation by second is the aggregator's job, not the parser's.
pub fn parse_lines(text: &str, role: Role, origin: &Path) -> Result<Vec<Observation>, ReportError> {
    let layout = LAYOUT_V1;
    let mut out = Vec::new();
    let mut seconds: u64 = 0;

    for (lineno, line) in text.lines().enumerate() {
        match line.as_bytes().first() {
            // Interval boundary; carries no data.
            Some(b'#') => seconds += 1,
            Some(b) if b.is_ascii_digit() => {
                if let Some(obs) = parse_data_line(line, role, seconds, layout, origin, lineno + 1)?
                {
                    out.push(obs);
                }
            }
            _ => {}
        }
    }

    Ok(out)
}

/// Extract the metric window from one data line. Returns `Ok(None)` for DB
/// lines that belong to some other sampled process.
fn parse_data_line(
    line: &str,
    role: Role,
    seconds: u64,
    layout: ColumnLayout,
    origin: &Path,
    lineno: usize,
) -> Result<Option<Observation>, ReportError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < layout.min_fields {
        return Err(format_error(
            origin,
            lineno,
            format!(
                "expected at least {} columns, found {}",
                layout.min_fields,
                tokens.len()
            ),
        ));
    }

    // Identity is checked before the numeric window: a foreign process line
    // is dropped whole, not validated.
    if role == Role::Db {
        let identity = tokens[tokens.len() - layout.identity_from_end];
        if identity != DB_PROCESS_NAME {
            return Ok(None);
        }
    }

    let metric = |idx: usize| -> Result<f64, ReportError> {
        tokens[idx].parse().map_err(|_| {
            format_error(
                origin,
                lineno,
                format!("column {} is not a number: {:?}", idx, tokens[idx]),
            )
        })
    };

    Ok(Some(Observation {
        seconds,
        cpu_pct: metric(layout.cpu)?,
        mem_pct: metric(layout.mem)?,
        read_kbps: metric(layout.read_kb)?,
        write_kbps: metric(layout.write_kb)?,
    }))
}

fn format_error(origin: &Path, line: usize, reason: String) -> ReportError {
    ReportError::Format {
        path: origin.to_path_buf(),
        line,
        reason,
    }
}

/// Build one collector data line with the V1 layout: metric window at
/// tokens 8/14/15/16, command tail of three tokens.
#[cfg(test)]
pub(crate) fn fixture_line(cpu: f64, mem: f64, read: f64, write: f64, command: &str) -> String {
    format!(
        "10:51:01 AM  1000  4242  {cpu:.2}  1.00  0.00  0.50  {cpu:.2}  3  120.50  0.00  \
         615000  320000  {mem:.2}  {read:.2}  {write:.2}  0  {command} -D data"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;

    fn origin() -> PathBuf {
        PathBuf::from("pipeline_stats_4_proc.txt")
    }

    #[test]
    fn marker_lines_advance_the_second_counter() {
        let text = format!(
            "{}\n# Time UID PID\n{}\n",
            fixture_line(10.0, 4.0, 100.0, 50.0, "worker"),
            fixture_line(20.0, 5.0, 110.0, 60.0, "worker"),
        );
        let rows = parse_lines(&text, Role::Pipeline, &origin()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seconds, 0);
        assert_eq!(rows[0].cpu_pct, 10.0);
        assert_eq!(rows[1].seconds, 1);
        assert_eq!(rows[1].cpu_pct, 20.0);
    }

    #[test]
    fn noise_lines_are_ignored() {
        let text = format!(
            "Linux 6.1.0 (host) \t07/28/26 \t_x86_64_\n\n{}\nAverage:  all  3.1\n",
            fixture_line(10.0, 4.0, 100.0, 50.0, "worker"),
        );
        let rows = parse_lines(&text, Role::Server, &origin()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn same_interval_lines_share_a_second() {
        let text = format!(
            "# interval\n{}\n{}\n",
            fixture_line(1.0, 1.0, 5.0, 5.0, DB_PROCESS_NAME),
            fixture_line(2.0, 2.0, 6.0, 6.0, DB_PROCESS_NAME),
        );
        let rows = parse_lines(&text, Role::Db, &origin()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seconds, 1);
        assert_eq!(rows[1].seconds, 1);
    }

    #[test]
    fn db_role_keeps_only_the_database_process() {
        let text = format!(
            "{}\n{}\n",
            fixture_line(1.0, 1.0, 5.0, 5.0, DB_PROCESS_NAME),
            fixture_line(99.0, 99.0, 99.0, 99.0, "sshd"),
        );
        let rows = parse_lines(&text, Role::Db, &origin()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cpu_pct, 1.0);
    }

    #[test]
    fn other_roles_ignore_the_identity_token() {
        let text = fixture_line(7.5, 2.0, 1.0, 1.0, "anything");
        let rows = parse_lines(&text, Role::Pipeline, &origin()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cpu_pct, 7.5);
    }

    #[test]
    fn negative_readings_pass_through_the_parser() {
        // Clamping to zero happens after aggregation, not here.
        let text = fixture_line(10.0, 4.0, -5.0, 50.0, "worker");
        let rows = parse_lines(&text, Role::Pipeline, &origin()).unwrap();
        assert_eq!(rows[0].read_kbps, -5.0);
    }

    #[test]
    fn short_data_line_is_a_format_error() {
        let err = parse_lines("10:51:01 AM 1000 4242 3.0\n", Role::Pipeline, &origin())
            .unwrap_err();
        match err {
            ReportError::Format { line, .. } => assert_eq!(line, 1),
            other => panic!("expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_metric_is_a_format_error() {
        let good = fixture_line(9.0, 4.0, 5.5, 6.5, "worker");
        // 5.50 is the read-rate token, squarely inside the metric window.
        let text = format!("# interval\n{}\n", good.replace("5.50", "oops"));
        let err = parse_lines(&text, Role::Pipeline, &origin()).unwrap_err();
        match err {
            ReportError::Format { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("not a number"), "reason: {reason}");
            }
            other => panic!("expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server_stats_4_proc.txt");
        let err = parse_sample_file(&path, Role::Server).unwrap_err();
        assert!(matches!(err, ReportError::NotFound { .. }));
    }

    #[test]
    fn file_parse_matches_text_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline_stats_2_proc.txt");
        let text = format!("# t\n{}\n", fixture_line(12.0, 3.0, 7.0, 8.0, "worker"));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();

        let rows = parse_sample_file(&path, Role::Pipeline).unwrap();
        assert_eq!(rows, parse_lines(&text, Role::Pipeline, &path).unwrap());
    }
}
