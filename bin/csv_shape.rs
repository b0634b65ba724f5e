use anyhow::{anyhow, bail, Context};
use clap::{Arg, ArgAction, ArgGroup, Command};
use csv_shape::{Configuration, ReadOptions, Table, TableOptions, TypeMap};
use regex::Regex;
use std::path::PathBuf;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("csv_shape")
        .about("Normalize a messy CSV header, convert columns, and write the result")
        .arg(Arg::new("path").value_parser(clap::value_parser!(PathBuf)))
        .arg(
            Arg::new("csv")
                .long("csv")
                .value_parser(clap::value_parser!(PathBuf))
                .conflicts_with("path"),
        )
        .group(ArgGroup::new("input").args(["path", "csv"]).required(true))
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(clap::value_parser!(PathBuf))
                .help("Write here instead of stdout"),
        )
        .arg(Arg::new("delimiter").long("delimiter").default_value(","))
        .arg(
            Arg::new("skip_lines")
                .long("skip-lines")
                .help("Drop lines matching this regex before parsing"),
        )
        .arg(
            Arg::new("columns")
                .long("columns")
                .help("Comma separated subset of columns to write"),
        )
        .arg(
            Arg::new("type_map")
                .long("type-map")
                .help("field=type pairs, comma separated; chain types with '|'"),
        )
        .arg(
            Arg::new("header_only")
                .long("header-only")
                .action(ArgAction::SetTrue)
                .conflicts_with("rows_only"),
        )
        .arg(
            Arg::new("rows_only")
                .long("rows-only")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches
        .get_one::<PathBuf>("csv")
        .or_else(|| matches.get_one::<PathBuf>("path"))
        .ok_or_else(|| anyhow!("provide a CSV path"))?;

    let delimiter = matches
        .get_one::<String>("delimiter")
        .map(String::as_str)
        .unwrap_or(",");
    let &[delimiter] = delimiter.as_bytes() else {
        bail!("delimiter must be a single byte, got {delimiter:?}");
    };

    let skip_lines = matches
        .get_one::<String>("skip_lines")
        .map(|p| Regex::new(p).with_context(|| format!("invalid --skip-lines pattern {p:?}")))
        .transpose()?;

    let read = ReadOptions {
        delimiter,
        skip_lines,
        ..Default::default()
    };
    let options = TableOptions {
        type_map: matches
            .get_one::<String>("type_map")
            .map(|s| s.parse::<TypeMap>())
            .transpose()
            .context("invalid --type-map")?
            .unwrap_or_default(),
        ..Default::default()
    };

    let table = Table::from_path(path, &read, &options, &Configuration::new())
        .await
        .with_context(|| format!("failed to shape {}", path.display()))?;

    let columns: Option<Vec<&str>> = matches
        .get_one::<String>("columns")
        .map(|s| s.split(',').map(str::trim).filter(|c| !c.is_empty()).collect());
    let columns = columns.as_deref();

    let out = if matches.get_flag("header_only") {
        table.header().to_csv(columns)?
    } else if matches.get_flag("rows_only") {
        table.rows().to_csv(columns)?
    } else {
        table.to_csv(columns)?
    };

    match matches.get_one::<PathBuf>("output") {
        Some(target) => {
            let file = tokio::fs::File::create(target)
                .await
                .with_context(|| format!("can't create {}", target.display()))?;
            let mut w = BufWriter::new(file);
            w.write_all(out.as_bytes()).await?;
            w.flush().await?;
        }
        None => {
            let mut w = BufWriter::new(tokio::io::stdout());
            w.write_all(out.as_bytes()).await?;
            w.flush().await?;
        }
    }
    Ok(())
}
