use anyhow::Context as _;
use clap::Parser;
use std::path::{Path, PathBuf};

mod error;
mod host;
mod model;
mod monitor;
mod render;
mod sample;

use host::HostInfo;
use model::UsageRow;
use sample::Role;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "resource-report")]
#[command(about = "Batch pipeline resource usage reporter", long_about = None)]
struct Cli {
    /// Number of worker processes the batch job runs with.
    #[arg(long)]
    num_proc: u32,

    /// Short description of the dataset; names the output tree.
    #[arg(long)]
    data_description: String,

    /// Output root for the parquet files written by the batch job itself.
    #[arg(long, default_value = "/tmp/pipeline-batch/")]
    output_parquet_path: PathBuf,

    /// Output root for raw samples, tables and graphs.
    #[arg(long, default_value = "/tmp/pipeline-performance/")]
    output_results_path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Run the batch job under the external sampler; it populates raw/.
    monitor::provision(&cli.output_results_path, &cli.data_description)?;
    monitor::run_sampler(
        cli.num_proc,
        &cli.data_description,
        &cli.output_parquet_path,
        &cli.output_results_path,
    )?;

    // 2) Probe the host once; normalization and the chart title need it.
    let host = HostInfo::detect()?;

    // 3) Parse, aggregate and normalize each role's raw file.
    let raw_dir = monitor::raw_dir(&cli.output_results_path, &cli.data_description);
    let pipeline = build_role_series(Role::Pipeline, &raw_dir, cli.num_proc, &host)?;
    let server = build_role_series(Role::Server, &raw_dir, cli.num_proc, &host)?;
    let db = build_role_series(Role::Db, &raw_dir, cli.num_proc, &host)?;

    // 4) Join on elapsed second and summarize.
    let merged = model::merge_series(&pipeline, &server, &db)?;
    let summary = model::compute_summary(&merged);

    // 5) Emit the artifacts.
    let chart = render::chart_spec(&merged, &summary, &host, cli.num_proc, &cli.data_description);
    let graph = monitor::graph_path(&cli.output_results_path, &cli.data_description, cli.num_proc);
    render::chart::draw_png(&chart, &graph)
        .with_context(|| format!("render chart {}", graph.display()))?;
    println!("Wrote {}", graph.display());

    let table = monitor::table_path(&cli.output_results_path, &cli.data_description, cli.num_proc);
    render::csv::write_table(&merged, &table)?;
    println!("Wrote {}", table.display());

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Parse one role's raw file into its normalized per-second series.
fn build_role_series(
    role: Role,
    raw_dir: &Path,
    num_proc: u32,
    host: &HostInfo,
) -> Result<Vec<UsageRow>> {
    let path = raw_dir.join(role.raw_file_name(num_proc));
    let observations = sample::parse_sample_file(&path, role)
        .with_context(|| format!("build {} series", role.label()))?;
    let per_second = model::aggregate_role(role, observations);
    Ok(model::normalize_memory(per_second, host.mem_total_gb as f64))
}
