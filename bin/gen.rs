use clap::{Arg, ArgAction, Command};
use std::io::{self, Write};

/// Header cells in the shape people actually type them.
const MESSY_HEADERS: &[&str] = &[
    "Order ID",
    " Customer Name ",
    "E-Mail Address",
    "Amount (USD)",
    "Created.At",
    "Paid?",
    "Order ID",
    "Notes/Comments",
];

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Write a synthetic CSV with a messy header to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("no_header")
                .long("no-header")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .value_parser(clap::value_parser!(usize))
                .default_value("6"),
        )
        .arg(Arg::new("delim").long("delim").default_value(","))
        .get_matches();

    let rows: u64 = matches.get_one::<u64>("rows").copied().unwrap_or_default();
    let cols: usize = matches.get_one::<usize>("cols").copied().unwrap_or(6).max(1);
    let delim = matches
        .get_one::<String>("delim")
        .map(String::as_str)
        .unwrap_or(",");

    let mut out = io::BufWriter::new(io::stdout().lock());

    if !matches.get_flag("no_header") {
        let header: Vec<String> = (0..cols)
            .map(|c| match MESSY_HEADERS.get(c) {
                Some(h) => h.to_string(),
                None => format!("Extra Col #{c}"),
            })
            .collect();
        writeln!(&mut out, "{}", header.join(delim))?;
    }

    // Deterministic values; every 7th row leaves the third cell empty
    for i in 0..rows {
        for c in 0..cols {
            if c > 0 {
                write!(&mut out, "{delim}")?;
            }
            match c {
                0 | 6 => write!(&mut out, "{i}")?,
                1 => write!(&mut out, "customer {}", i % 97)?,
                2 if i % 7 == 0 => {}
                2 => write!(&mut out, "user{i}@example.com")?,
                3 => write!(&mut out, "{}.{:02}", i % 1000, i % 100)?,
                4 => write!(&mut out, "2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1)?,
                5 => write!(&mut out, "{}", if i % 2 == 0 { "yes" } else { "no" })?,
                _ => write!(&mut out, "v{c}_{i}")?,
            }
        }
        writeln!(&mut out)?;
        if i % 10_000 == 0 {
            out.flush()?;
        }
    }

    out.flush()?;
    Ok(())
}
