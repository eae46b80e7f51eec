//! Storeboard CLI - runs one dashboard render cycle and writes the
//! downloadable CSV artifacts.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use storeboard::{
    DashboardSession, DateRange, ExportSerializer, FilterSelection, RenderRequest,
};

#[derive(Parser, Debug)]
#[command(name = "storeboard", about = "SuperStore sales dashboard pipeline")]
struct Args {
    /// Dataset to load (csv, txt, xls, xlsx); falls back to super.xls
    input: Option<PathBuf>,

    /// Start of the date range (YYYY-MM-DD); defaults to the earliest order
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the date range (YYYY-MM-DD); defaults to the latest order
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Region selection, repeatable
    #[arg(long)]
    region: Vec<String>,

    /// State selection, repeatable
    #[arg(long)]
    state: Vec<String>,

    /// City selection, repeatable
    #[arg(long)]
    city: Vec<String>,

    /// Directory for the exported CSV artifacts
    #[arg(long, default_value = "exports")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let session = DashboardSession::open(args.input.as_deref())?;

    let date_range = match (args.start, args.end) {
        (None, None) => None,
        (start, end) => {
            let observed = session
                .default_date_range()
                .context("dataset has no rows to derive default dates from")?;
            Some(DateRange::new(
                start.unwrap_or_else(|| observed.start()),
                end.unwrap_or_else(|| observed.end()),
            )?)
        }
    };

    let request = RenderRequest {
        date_range,
        selection: FilterSelection {
            region: args.region.into_iter().collect(),
            state: args.state.into_iter().collect(),
            city: args.city.into_iter().collect(),
        },
    };

    let dashboard = session.render(&request)?;

    println!("rows (filtered):      {}", dashboard.filtered.height());
    println!("category groups:      {}", dashboard.category_sales.height());
    println!("region groups:        {}", dashboard.region_sales.height());
    println!("segment groups:       {}", dashboard.segment_sales.height());
    println!("months:               {}", dashboard.monthly_sales.height());
    println!("treemap leaves:       {}", dashboard.treemap.height());
    println!(
        "pivot:                {} sub-categories x {} months",
        dashboard.pivot.rows().len(),
        dashboard.pivot.columns().len()
    );

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    for artifact in ExportSerializer::all(&dashboard)? {
        let path = args.out_dir.join(artifact.file_name);
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {} ({})", path.display(), artifact.mime);
    }

    Ok(())
}
