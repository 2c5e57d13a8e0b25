use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use kcluster::{recommend_k, Dataset, KMeans, KMeansSettings};
use serde_json::json;
use std::path::{Path, PathBuf};
use structopt::*;
use tracing_subscriber::EnvFilter;

/// Step-wise K-means clustering of tab-delimited datasets. The first row of a
/// dataset is a header and the first column holds row labels; all other
/// entries must be numeric.
#[derive(StructOpt, Debug)]
pub enum KCluster {

    /// Shows dimension, number of vectors and column names of a dataset.
    Info {
        src : PathBuf
    },

    /// Performs n steps, alternating between assigning vectors to the nearest
    /// centroid and moving centroids to the mean of their clusters. Prints the
    /// engine state as one JSON line after each step.
    Step {
        src : PathBuf,

        #[structopt(short, default_value = "1")]
        n : usize,

        #[structopt(flatten)]
        engine : EngineOpts
    },

    /// Performs one bulk run (repetitions full cycles) and prints the final state.
    Run {
        src : PathBuf,

        #[structopt(flatten)]
        engine : EngineOpts
    },

    /// Computes the SSE of a bulk run for each K in [min, max] and recommends
    /// the K at the sharpest bend of the curve.
    Elbow {
        src : PathBuf,

        #[structopt(long, default_value = "1")]
        min : usize,

        #[structopt(long, default_value = "10")]
        max : usize,

        #[structopt(flatten)]
        engine : EngineOpts
    }

}

#[derive(StructOpt, Debug)]
pub struct EngineOpts {

    /// Number of clusters.
    #[structopt(short)]
    k : Option<usize>,

    /// Assign/update cycles per run.
    #[structopt(short, long)]
    repetitions : Option<usize>,

    /// Seed for centroid initialization.
    #[structopt(long)]
    seed : Option<u64>,

    /// JSON settings file; explicit flags take precedence over its values.
    #[structopt(long)]
    settings : Option<PathBuf>
}

impl EngineOpts {

    fn settings(&self) -> anyhow::Result<KMeansSettings> {
        let mut settings = match &self.settings {
            Some(path) => KMeansSettings::load_from_path(path)
                .with_context(|| format!("Error loading settings from {}", path.display()))?,
            None => KMeansSettings::default()
        };
        if let Some(k) = self.k {
            settings.k = k;
        }
        if let Some(r) = self.repetitions {
            settings.repetitions = r;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        Ok(settings)
    }

}

fn open_dataset(src : &Path) -> anyhow::Result<Dataset> {
    Dataset::open(src).with_context(|| format!("Error opening dataset {}", src.display()))
}

fn open_engine(src : &Path, opts : &EngineOpts) -> anyhow::Result<KMeans> {
    let settings = opts.settings()?;
    let mut km = KMeans::new(&settings)?;
    km.open_dataset(src).with_context(|| format!("Error opening dataset {}", src.display()))?;
    Ok(km)
}

/// Number of candidate K values in [min, max].
fn k_range_len(min : usize, max : usize) -> anyhow::Result<u64> {
    if min == 0 || min > max {
        bail!("Invalid K range: {}..={}", min, max);
    }
    match (max - min).checked_add(1) {
        Some(len) => Ok(len as u64),
        None => bail!("K range {}..={} is too large", min, max)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match KCluster::from_args() {
        KCluster::Info { src } => {
            let ds = open_dataset(&src)?;
            println!("{}", serde_json::to_string_pretty(&json!({
                "dimensions" : ds.dimensions(),
                "vectors" : ds.len(),
                "columns" : ds.names()
            }))?);
        },
        KCluster::Step { src, n, engine } => {
            let mut km = open_engine(&src, &engine)?;
            for step in 0..n {
                let performed = km.step()?;
                println!("{}", serde_json::to_string(&json!({
                    "step" : step,
                    "performed" : performed,
                    "state" : km.snapshot()
                }))?);
            }
        },
        KCluster::Run { src, engine } => {
            let mut km = open_engine(&src, &engine)?;
            let summary = km.run()?;
            println!("{}", serde_json::to_string_pretty(&json!({
                "summary" : summary,
                "state" : km.snapshot()
            }))?);
        },
        KCluster::Elbow { src, min, max, engine } => {
            let len = k_range_len(min, max)?;
            let settings = engine.settings()?;
            let ds = open_dataset(&src)?;
            let pb = ProgressBar::new(len);
            pb.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} {msg}"));
            let points = kcluster::sweep(&ds, min..=max, &settings, |p| {
                pb.set_message(format!("K={} SSE={:.4}", p.k, p.sse));
                pb.inc(1);
            })?;
            pb.finish_and_clear();
            println!("{}", serde_json::to_string_pretty(&json!({
                "points" : points,
                "recommended_k" : recommend_k(&points)
            }))?);
        }
    }
    Ok(())
}
