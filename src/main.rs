use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use hst_apcor::{
    registry, select, write_csv, write_json, write_text, CalibrationTable, LoadOptions,
    RecordFilter,
};

const USAGE: &str = "\
usage: hst-apcor [--table PATH] [--config PATH] <command>

commands:
  lookup KEY                      print the calibration for KEY
  check                           load and validate the table
  list [INSTRUMENT [DETECTOR]]    list records, optionally narrowed
  export text|json|csv            write the table to stdout

Without --table the bundled reference table is used.";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Lookup(String),
    Check,
    List {
        instrument: Option<String>,
        detector: Option<String>,
    },
    Export(ExportFormat),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExportFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, PartialEq)]
struct Cli {
    table: Option<PathBuf>,
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli> {
    let mut table: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--table" => table = Some(args.next().context("--table needs a path")?.into()),
            "--config" => config = Some(args.next().context("--config needs a path")?.into()),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{USAGE}"),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("lookup") => Command::Lookup(positional.next().context("lookup needs a KEY")?),
        Some("check") => Command::Check,
        Some("list") => Command::List {
            instrument: positional.next(),
            detector: positional.next(),
        },
        Some("export") => {
            let format = match positional.next().as_deref() {
                Some("text") | Some("txt") => ExportFormat::Text,
                Some("json") => ExportFormat::Json,
                Some("csv") => ExportFormat::Csv,
                Some(other) => bail!("unknown export format '{other}'"),
                None => bail!("export needs a format (text, json or csv)"),
            };
            Command::Export(format)
        }
        Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    };

    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{extra}'");
    }

    Ok(Cli {
        table,
        config,
        command,
    })
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

fn open_table(cli: &Cli) -> Result<&'static CalibrationTable> {
    let options = match &cli.config {
        Some(path) => LoadOptions::from_file(path)
            .with_context(|| format!("reading load options from {}", path.display()))?,
        None => LoadOptions::default(),
    };

    let table = match &cli.table {
        Some(path) => registry::load_global(path, &options)
            .with_context(|| format!("loading calibration table {}", path.display()))?,
        None => registry::global_or_bundled().context("parsing bundled calibration table")?,
    };
    Ok(table)
}

fn run(cli: Cli) -> Result<()> {
    let table = open_table(&cli)?;

    match cli.command {
        Command::Lookup(key) => {
            let record = table.lookup(&key)?;
            println!("{record}");
        }
        Command::Check => {
            let instruments: Vec<String> = table
                .instruments()
                .map(|inst| {
                    let detectors: Vec<&str> = table.detectors(inst).collect();
                    format!("{inst} ({})", detectors.join(", "))
                })
                .collect();
            println!("ok: {} records", table.len());
            for line in instruments {
                println!("  {line}");
            }
        }
        Command::List {
            instrument,
            detector,
        } => {
            let filter = RecordFilter {
                instrument,
                detector,
                ..Default::default()
            };
            for record in select(table, &filter) {
                println!("{record}");
            }
        }
        Command::Export(format) => {
            let out = match format {
                ExportFormat::Text => write_text(table),
                ExportFormat::Json => write_json(table)?,
                ExportFormat::Csv => write_csv(table)?,
            };
            print!("{out}");
            if !out.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hst_apcor::load_file;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_lookup_with_table() {
        let cli = parse_args(args(&["--table", "t.txt", "lookup", "ACS_WFC_F814W"])).unwrap();
        assert_eq!(cli.table, Some(PathBuf::from("t.txt")));
        assert_eq!(cli.config, None);
        assert_eq!(cli.command, Command::Lookup("ACS_WFC_F814W".into()));
    }

    #[test]
    fn parses_list_filters() {
        let cli = parse_args(args(&["list", "ACS", "WFC"])).unwrap();
        assert_eq!(
            cli.command,
            Command::List {
                instrument: Some("ACS".into()),
                detector: Some("WFC".into())
            }
        );
        let cli = parse_args(args(&["list"])).unwrap();
        assert_eq!(
            cli.command,
            Command::List {
                instrument: None,
                detector: None
            }
        );
    }

    #[test]
    fn parses_export_and_config() {
        let cli = parse_args(args(&["export", "json", "--config", "apcor.toml"])).unwrap();
        assert_eq!(cli.command, Command::Export(ExportFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("apcor.toml")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["lookup"])).is_err());
        assert!(parse_args(args(&["export", "fits"])).is_err());
        assert!(parse_args(args(&["frobnicate"])).is_err());
        assert!(parse_args(args(&["check", "extra"])).is_err());
        assert!(parse_args(args(&["--verbose", "check"])).is_err());
        assert!(parse_args(args(&["check", "--table"])).is_err());
    }

    #[test]
    fn table_loaded_from_disk_matches_bundled_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, write_text(&CalibrationTable::bundled().unwrap())).unwrap();
        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table, CalibrationTable::bundled().unwrap());
    }
}
