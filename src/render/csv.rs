//! CSV backend: the merged table with the artifact's historical column
//! labels (memory is in GB despite the bare "MEM" header).

use crate::Result;
use crate::model::MergedRow;
use crate::sample::Role;

use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_table(merged: &[MergedRow], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let mut header = vec!["Seconds Elapsed".to_string()];
    for role in [Role::Pipeline, Role::Server, Role::Db] {
        let label = role.label();
        header.push(format!("{label} %CPU"));
        header.push(format!("{label} MEM"));
        header.push(format!("{label} kBs Read / Second"));
        header.push(format!("{label} kBs Written / Second"));
    }
    writeln!(out, "{}", header.join(","))?;

    for row in merged {
        let mut fields = vec![row.seconds.to_string()];
        for usage in [row.pipeline, row.server, row.db] {
            fields.push(usage.cpu_pct.to_string());
            fields.push(usage.mem_gb.to_string());
            fields.push(usage.read_kbps.to_string());
            fields.push(usage.write_kbps.to_string());
        }
        writeln!(out, "{}", fields.join(","))?;
    }

    out.flush()?;
    Ok(())
}
