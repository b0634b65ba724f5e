use anyhow::anyhow;
use clap::{Arg, ArgAction, Command};
use crc32fast::Hasher as Crc32;
use csv_shape::{Configuration, ReadOptions, Rows, Table, TableOptions, TypeMap};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("bench")
        .arg(
            Arg::new("path")
                .long("path")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("type_map")
                .long("type-map")
                .help("field=type pairs, comma separated; chain types with '|'"),
        )
        .arg(
            Arg::new("verify")
                .long("verify")
                .help("Print a CRC32 over the serialized rows")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("fast-local")
                .long("fast-local")
                .help("Also run the mmap + parallel path for local uncompressed UTF-8 files (feature: fast_local)")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches
        .get_one::<PathBuf>("path")
        .ok_or_else(|| anyhow!("Provide --path <file>"))?;
    let type_map = match matches.get_one::<String>("type_map") {
        Some(raw) => raw.parse::<TypeMap>()?,
        None => TypeMap::new(),
    };
    let options = TableOptions {
        type_map,
        ..Default::default()
    };
    let config = Configuration::new();
    let verify = matches.get_flag("verify");

    let start = Instant::now();
    let table = Table::from_path(path, &ReadOptions::default(), &options, &config).await?;
    report("stream", path, table.rows(), start, verify)?;

    #[cfg(feature = "fast_local")]
    if matches.get_flag("fast-local") && path.extension().and_then(|s| s.to_str()) == Some("csv") {
        use csv_shape::{fast_local_matrix, Header, RowBuilder};

        let start = Instant::now();
        let mut matrix = fast_local_matrix(path, b',', b'\n')?.into_iter();
        let header = Header::with_options(matrix.next().unwrap_or_default(), &config.header)?;
        let builder = RowBuilder::new(
            header.columns().to_vec(),
            &options.type_map,
            &config.converters,
            None,
        )?;
        let raw: Vec<_> = matrix.collect();
        let rows = Rows::new_parallel(&raw, &builder)?;
        report("fast_local", path, &rows, start, verify)?;
    }

    Ok(())
}

fn report(
    label: &str,
    path: &std::path::Path,
    rows: &Rows,
    start: Instant,
    verify: bool,
) -> anyhow::Result<()> {
    let elapsed = start.elapsed().as_secs_f64();
    let rps = (rows.len() as f64) / elapsed;
    let columns: Vec<&str> = rows.columns().iter().map(|c| c.as_str()).collect();
    if verify {
        let mut crc = Crc32::new();
        crc.update(rows.to_csv(None)?.as_bytes());
        println!(
            "[{label}] source={} rows={} columns={columns:?} crc=0x{:08x}\nelapsed={elapsed:.1}s rows/sec={rps:.0}",
            path.display(),
            rows.len(),
            crc.finalize(),
        );
    } else {
        println!(
            "[{label}] source={} rows={} columns={columns:?}\nelapsed={elapsed:.1}s rows/sec={rps:.0}",
            path.display(),
            rows.len(),
        );
    }
    Ok(())
}
