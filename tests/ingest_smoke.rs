use csv_shape::{Configuration, ReadOptions, Table, TableOptions, TypeMap, Value};
use std::{fs::File, io::Write, path::PathBuf, process::Command};

#[tokio::test]
async fn shapes_gzip_file() -> anyhow::Result<()> {
    // Create small CSV with a messy header
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("tiny.csv");
    let mut f = File::create(&csv_path)?;
    writeln!(f, "SKU , Col-1,SKU")?;
    for i in 0..100_000 {
        writeln!(f, "SKU{i:06},{i},dup{i}")?;
    }

    // gzip it (use system gzip for speed)
    let gz_path: PathBuf = dir.path().join("tiny.csv.gz");
    let status = Command::new("bash")
        .arg("-lc")
        .arg(format!(
            "gzip -c {} > {}",
            csv_path.display(),
            gz_path.display()
        ))
        .status()?;
    assert!(status.success());

    let options = TableOptions {
        type_map: TypeMap::new().with("col_1", "integer!"),
        ..Default::default()
    };
    let table = Table::from_path(&gz_path, &ReadOptions::default(), &options, &Configuration::new()).await?;

    assert_eq!(table.rows().len(), 100_000);
    let columns: Vec<&str> = table.columns().iter().map(|c| c.as_str()).collect();
    assert_eq!(columns, ["sku", "col_1", "sku1"]);
    let last = table.rows().last().expect("rows");
    assert_eq!(last["col_1"], Value::Integer(99_999));
    assert_eq!(last["sku1"], Value::from("dup99999"));
    Ok(())
}

#[tokio::test]
async fn plain_file_with_skipped_lines() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("report.tsv");
    std::fs::write(
        &path,
        "Generated by export tool\r\nid\tName\r\n1\tAnn\r\nTotal: 1\r\n",
    )?;

    let read = ReadOptions {
        delimiter: b'\t',
        skip_lines: Some(regex::Regex::new(r"^(Generated|Total:)")?),
        ..Default::default()
    };
    let table = Table::from_path(&path, &read, &TableOptions::default(), &Configuration::new()).await?;
    assert_eq!(table.to_csv(None)?, "id,name\n1,Ann\n");
    Ok(())
}

#[cfg(feature = "fast_local")]
#[test]
fn fast_local_matches_streaming_reader() -> anyhow::Result<()> {
    use csv_shape::{fast_local_matrix, Header, RowBuilder, Rows};

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fast.csv");
    let mut f = File::create(&path)?;
    writeln!(f, "Id,Amount (USD),Note")?;
    for i in 0..20_000 {
        write!(f, "{i},{}.5,", i % 50)?;
        if i % 3 == 0 {
            write!(f, "n{i}")?;
        }
        if i + 1 < 20_000 {
            writeln!(f)?;
        }
    }
    drop(f);

    let config = Configuration::new();
    let type_map = TypeMap::new().with("amount_usd", "decimal");
    let mut matrix = fast_local_matrix(&path, b',', b'\n')?.into_iter();
    let header = Header::with_options(matrix.next().unwrap_or_default(), &config.header)?;
    let builder = RowBuilder::new(header.columns().to_vec(), &type_map, &config.converters, None)?;
    let raw: Vec<_> = matrix.collect();
    let fast = Rows::new_parallel(&raw, &builder)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let options = TableOptions {
        type_map,
        ..Default::default()
    };
    let streamed = runtime.block_on(Table::from_path(&path, &ReadOptions::default(), &options, &config))?;

    assert_eq!(fast.len(), 20_000);
    assert_eq!(fast.to_csv(None)?, streamed.rows().to_csv(None)?);
    Ok(())
}

#[cfg(feature = "fast_local")]
#[test]
fn fast_local_handles_empty_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("empty.csv");
    File::create(&path)?;
    assert!(csv_shape::fast_local_matrix(&path, b',', b'\n')?.is_empty());
    Ok(())
}
