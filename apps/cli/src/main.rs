#![deny(warnings)]

//! Headless runner: load a resolved scenario, project it and report firm KPIs.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use workforce_core::demo::demo_config;
use workforce_core::{EventKind, ResolvedConfig, YearMonth};
use workforce_runtime::run_simulation;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    out: Option<PathBuf>,
    events: Option<PathBuf>,
    seed: Option<u64>,
    workers: Option<usize>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = || it.next().with_context(|| format!("missing value for {arg}"));
        match arg.as_str() {
            "--scenario" => args.scenario = Some(value()?.into()),
            "--out" => args.out = Some(value()?.into()),
            "--events" => args.events = Some(value()?.into()),
            "--seed" => args.seed = Some(value()?.parse().context("--seed expects an integer")?),
            "--workers" => {
                args.workers = Some(value()?.parse().context("--workers expects an integer")?)
            }
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(args)
}

fn load_scenario(path: &Path) -> Result<ResolvedConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let cfg = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(cfg)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "written");
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!(
        "headcount planner | build {} | {}",
        env!("GIT_SHA"),
        env!("BUILD_DATE")
    );
    let args = parse_args()?;
    let mut cfg = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => demo_config(
            &["Oslo", "Stockholm", "Helsinki"],
            YearMonth::new(2025, 1)?,
            YearMonth::new(2027, 12)?,
            42,
        ),
    };
    if let Some(seed) = args.seed {
        cfg.run.seed = seed;
    }
    if let Some(workers) = args.workers {
        cfg.run.workers = workers;
    }
    info!(scenario = ?args.scenario, seed = cfg.run.seed, "starting run");

    let result = run_simulation(&cfg)?;

    for (year, y) in &result.years {
        let f = y.firm_financials();
        println!(
            "KPI {} | months: {} | fte: {} | revenue: {} | ebitda: {} | margin: {}%",
            year,
            y.months.len(),
            y.firm_total_fte(),
            f.revenue.round_dp(0),
            f.ebitda.round_dp(0),
            (f.margin * Decimal::ONE_HUNDRED).round_dp(1)
        );
    }
    let counts = result.event_counts();
    let count = |k: EventKind| counts.get(&k).copied().unwrap_or(0);
    println!(
        "events | hired: {} | churned: {} | promoted: {} | anomalies: {}",
        count(EventKind::Hired),
        count(EventKind::Churned),
        count(EventKind::Promoted),
        result.anomalies.len()
    );

    if let Some(path) = &args.out {
        write_json(path, &result)?;
    }
    if let Some(path) = &args.events {
        write_json(path, &result.events)?;
    }
    Ok(())
}
