//! Report emission. The model side of this module describes the chart
//! declaratively (`ChartSpec`: which series on which panel, titles,
//! annotation text); the backends draw the PNG and write the CSV and decide
//! nothing else.

pub mod chart;
pub mod csv;

use crate::host::HostInfo;
use crate::model::{MergedRow, Summary};

/// One plotted line: a label plus (second, value) points.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub label: String,
    pub points: Vec<(u64, f64)>,
}

/// One stacked panel; every series in it shares the y-axis unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub y_label: &'static str,
    /// Only the bottom panel labels the shared x axis.
    pub x_label: Option<&'static str>,
    pub series: Vec<SeriesSpec>,
}

/// Everything the drawing backend needs to know, nothing about pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub annotations: Vec<String>,
    pub panels: Vec<Panel>,
}

/// Assemble the three-panel chart description from the merged table and the
/// run summary.
pub fn chart_spec(
    merged: &[MergedRow],
    summary: &Summary,
    host: &HostInfo,
    num_proc: u32,
    data_description: &str,
) -> ChartSpec {
    let series = |label: &str, pick: fn(&MergedRow) -> f64| SeriesSpec {
        label: label.to_string(),
        points: merged.iter().map(|r| (r.seconds, pick(r))).collect(),
    };

    let cpu = Panel {
        title: "Pipeline vs Server vs Database %CPU Usage".to_string(),
        y_label: "%CPU Usage",
        x_label: None,
        series: vec![
            series("Pipeline", |r| r.pipeline.cpu_pct),
            series("Server", |r| r.server.cpu_pct),
            series("DB", |r| r.db.cpu_pct),
        ],
    };

    let mem = Panel {
        title: "Pipeline vs Server vs Database MEM Usage".to_string(),
        y_label: "MEM Usage (GB)",
        x_label: None,
        series: vec![
            series("Pipeline", |r| r.pipeline.mem_gb),
            series("Server", |r| r.server.mem_gb),
            series("DB", |r| r.db.mem_gb),
        ],
    };

    let io = Panel {
        title: "Pipeline vs Server vs DB I/O Usage".to_string(),
        y_label: "I/O Usage (kBs/s)",
        x_label: Some("Seconds Elapsed"),
        series: vec![
            series("Pipeline kBs Written / s", |r| r.pipeline.write_kbps),
            series("Server kBs Written / s", |r| r.server.write_kbps),
            series("DB kBs Written / s", |r| r.db.write_kbps),
            series("Pipeline kBs Read / s", |r| r.pipeline.read_kbps),
            series("Server kBs Read / s", |r| r.server.read_kbps),
            series("DB kBs Read / s", |r| r.db.read_kbps),
        ],
    };

    ChartSpec {
        title: format!(
            "Resource Usage of Batch Pipeline on Local Machine \
             ({} CPU, {} GB RAM, {} proc, {} data)",
            host.cores, host.mem_total_gb, num_proc, data_description
        ),
        annotations: annotation_lines(summary),
        panels: vec![cpu, mem, io],
    }
}

fn annotation_lines(summary: &Summary) -> Vec<String> {
    vec![
        "Run Summary".to_string(),
        format!("Total time: {} s", summary.total_seconds),
        format!("Avg. pipeline %CPU: {:.1}", summary.pipeline.cpu_pct),
        format!("Avg. server %CPU: {:.1}", summary.server.cpu_pct),
        format!("Avg. database %CPU: {:.1}", summary.db.cpu_pct),
        format!("Avg. pipeline MEM: {:.1} GB", summary.pipeline.mem_gb),
        format!("Avg. server MEM: {:.1} GB", summary.server.mem_gb),
        format!("Avg. database MEM: {:.1} GB", summary.db.mem_gb),
        format!("Avg. pipeline read: {:.1} kBs/s", summary.pipeline.read_kbps),
        format!("Avg. server read: {:.1} kBs/s", summary.server.read_kbps),
        format!("Avg. database read: {:.1} kBs/s", summary.db.read_kbps),
        format!("Avg. pipeline write: {:.1} kBs/s", summary.pipeline.write_kbps),
        format!("Avg. server write: {:.1} kBs/s", summary.server.write_kbps),
        format!("Avg. database write: {:.1} kBs/s", summary.db.write_kbps),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RoleAverages, RoleUsage, compute_summary};
    use pretty_assertions::assert_eq;

    fn usage(cpu: f64) -> RoleUsage {
        RoleUsage {
            cpu_pct: cpu,
            mem_gb: 1.0,
            read_kbps: 2.0,
            write_kbps: 3.0,
        }
    }

    fn merged() -> Vec<MergedRow> {
        vec![
            MergedRow {
                seconds: 0,
                pipeline: usage(10.0),
                server: usage(5.0),
                db: usage(3.0),
            },
            MergedRow {
                seconds: 1,
                pipeline: usage(20.0),
                server: usage(15.0),
                db: usage(3.0),
            },
        ]
    }

    fn host() -> HostInfo {
        HostInfo {
            mem_total_gb: 16,
            cores: 8,
        }
    }

    #[test]
    fn three_panels_with_expected_series() {
        let rows = merged();
        let spec = chart_spec(&rows, &compute_summary(&rows), &host(), 4, "small");

        assert_eq!(spec.panels.len(), 3);
        assert_eq!(spec.panels[0].series.len(), 3);
        assert_eq!(spec.panels[1].series.len(), 3);
        assert_eq!(spec.panels[2].series.len(), 6);

        // CPU series carry the per-second values in join order.
        assert_eq!(spec.panels[0].series[0].label, "Pipeline");
        assert_eq!(spec.panels[0].series[0].points, vec![(0, 10.0), (1, 20.0)]);
        assert_eq!(spec.panels[0].series[2].points, vec![(0, 3.0), (1, 3.0)]);

        // Only the bottom panel names the shared x axis.
        assert_eq!(spec.panels[0].x_label, None);
        assert_eq!(spec.panels[2].x_label, Some("Seconds Elapsed"));
    }

    #[test]
    fn title_names_host_and_run_shape() {
        let rows = merged();
        let spec = chart_spec(&rows, &compute_summary(&rows), &host(), 4, "small");
        assert_eq!(
            spec.title,
            "Resource Usage of Batch Pipeline on Local Machine \
             (8 CPU, 16 GB RAM, 4 proc, small data)"
        );
    }

    #[test]
    fn annotations_cover_total_time_and_all_twelve_means() {
        let summary = Summary {
            total_seconds: 42,
            pipeline: RoleAverages {
                cpu_pct: 15.0,
                mem_gb: 1.0,
                read_kbps: 2.0,
                write_kbps: 3.0,
            },
            server: RoleAverages {
                cpu_pct: 10.0,
                mem_gb: 1.0,
                read_kbps: 2.0,
                write_kbps: 3.0,
            },
            db: RoleAverages {
                cpu_pct: 3.0,
                mem_gb: 1.0,
                read_kbps: 2.0,
                write_kbps: 3.0,
            },
        };

        let lines = annotation_lines(&summary);

        assert_eq!(lines.len(), 14);
        assert_eq!(lines[0], "Run Summary");
        assert_eq!(lines[1], "Total time: 42 s");
        assert_eq!(lines[2], "Avg. pipeline %CPU: 15.0");
        assert_eq!(lines[13], "Avg. database write: 3.0 kBs/s");
    }
}
