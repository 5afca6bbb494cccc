use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use defectscope::{
    analytics::{
        group_counts, needs_attention, partition_by, resolution_stats, summarize, trend,
        AttentionRules, Dashboard, DashboardQuery, GroupField, GroupOrder, TrendQuery,
    },
    config::{trend_query, Cli, Command},
    export::write_csv,
    ingest::ingest,
    store::{DefectStore, Snapshot},
};
use serde::Serialize;
use serde_json::json;
use std::{fs::File, io::BufWriter, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) config & store ───────────────────────────────────────────
    let cli = Cli::parse();
    let store = Arc::new(DefectStore::open(&cli.store_dir)?);
    info!(store = %store.dir().display(), "startup");

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Command::Ingest { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {:?}", &file))?;

            let report = tokio::task::spawn_blocking(move || ingest(&text)).await??;
            for err in &report.errors {
                warn!(row = err.row_number, "{}", err);
            }

            let errors = report.errors;
            let defects = report.defects;
            let writer = Arc::clone(&store);
            let snapshot =
                tokio::task::spawn_blocking(move || writer.replace(defects)).await??;

            print_json(&json!({
                "count": snapshot.defects.len(),
                "timestamp": snapshot.timestamp,
                "errors": errors,
            }))?;
        }
        Command::Group { by, order, members } => {
            let snapshot = load(&store)?;
            let by = GroupField::from(by);
            if members {
                let groups: Vec<_> = partition_by(&snapshot.defects, by)
                    .into_iter()
                    .map(|(name, defects)| json!({ "name": name, "defects": defects }))
                    .collect();
                print_json(&groups)?;
            } else {
                print_json(&group_counts(&snapshot.defects, by, order.into()))?;
            }
        }
        Command::Trend {
            period,
            from,
            to,
            analysis,
            domains,
        } => {
            let query = trend_query(period, from, to, analysis, domains)?;
            let snapshot = load(&store)?;
            print_json(&trend(&snapshot.defects, &query))?;
        }
        Command::Attention => {
            let snapshot = load(&store)?;
            print_json(&needs_attention(&snapshot.defects, &AttentionRules::default()))?;
        }
        Command::Resolution { domain } => {
            let snapshot = load(&store)?;
            print_json(&resolution_stats(&snapshot.defects, domain.as_deref()))?;
        }
        Command::Summary { today } => {
            let snapshot = load(&store)?;
            print_json(&summarize(&snapshot.defects, today.unwrap_or_else(utc_today)))?;
        }
        Command::Dashboard { today } => {
            let snapshot = load(&store)?;
            let query = DashboardQuery {
                group_by: GroupField::Severity,
                order: GroupOrder::Count,
                trend: TrendQuery::default(),
                rules: AttentionRules::default(),
                today: today.unwrap_or_else(utc_today),
            };
            print_json(&Dashboard::compute(&snapshot.defects, &query))?;
        }
        Command::Export { out } => {
            let snapshot = load(&store)?;
            match out {
                Some(path) => {
                    let file =
                        File::create(&path).with_context(|| format!("creating {:?}", &path))?;
                    write_csv(&snapshot.defects, BufWriter::new(file))?;
                    info!(records = snapshot.defects.len(), path = %path.display(), "exported");
                }
                None => write_csv(&snapshot.defects, std::io::stdout().lock())?,
            }
        }
        Command::Clear => store.clear()?,
    }

    Ok(())
}

fn load(store: &DefectStore) -> Result<Snapshot> {
    store
        .load()?
        .ok_or_else(|| anyhow!("no defects stored yet; run `defectscope ingest <FILE>` first"))
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}
