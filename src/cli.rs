use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::commands::convert::{self, ConvertOptions};
use crate::commands::extract::{self, ExtractOptions};
use crate::commands::{CommandReport, normalize, status};
use crate::timeline::config::split_csv;

/// Fold dated OPML exports into one first-seen/last-seen JSON timeline.
#[derive(Debug, Parser)]
#[command(name = "opml-timeline", version, about)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge every `prefix-YYYYMMDD.opml` snapshot in a directory into a JSON file.
    Convert(ConvertArgs),
    /// Convert a single OPML file into a JSON list of observations.
    Extract(ExtractArgs),
    /// Print the comparison key used to match URLs.
    Normalize {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Show resolved configuration and environment overrides.
    Status,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    input_dir: PathBuf,
    output_json: PathBuf,
    /// Comma-separated outline titles to collect from, e.g. `Kindling,Feeds`.
    sections: Option<String>,
    /// JSON list of `{old, new}` URL renames.
    url_map: Option<PathBuf>,
    /// Ignore any existing output instead of merging into it.
    #[arg(long)]
    fresh: bool,
    /// Overwrite the existing output without keeping a numbered backup.
    #[arg(long)]
    no_backup: bool,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    opml_file: PathBuf,
    /// Write the JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Snapshot date (YYYYMMDD); defaults to the date in the file name.
    #[arg(long)]
    date: Option<String>,
    /// Comma-separated outline titles to collect from.
    #[arg(long)]
    sections: Option<String>,
    #[arg(long)]
    url_map: Option<PathBuf>,
}

fn sections_arg(raw: Option<&str>) -> Vec<String> {
    raw.map(split_csv).unwrap_or_default()
}

fn print_report(out: &mut impl Write, report: &CommandReport, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
    } else {
        write!(out, "{}", report.render_text())?;
    }
    Ok(())
}

/// Parse arguments, run the command and print its report. Returns whether
/// the report came back clean.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    // stdout belongs to the extracted JSON when no --output is given
    let report_to_stderr =
        matches!(&cli.command, Command::Extract(args) if args.output.is_none());

    let report = match cli.command {
        Command::Convert(args) => convert::run(&ConvertOptions {
            input_dir: args.input_dir,
            output: args.output_json,
            sections: sections_arg(args.sections.as_deref()),
            url_map: args.url_map,
            fresh: args.fresh,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
        })?,
        Command::Extract(args) => extract::run(&ExtractOptions {
            file: args.opml_file,
            output: args.output,
            date: args.date,
            sections: sections_arg(args.sections.as_deref()),
            url_map: args.url_map,
        })?,
        Command::Normalize { urls } => normalize::run(&urls),
        Command::Status => status::run()?,
    };

    if report_to_stderr {
        print_report(&mut io::stderr().lock(), &report, cli.json)?;
    } else {
        print_report(&mut io::stdout().lock(), &report, cli.json)?;
    }
    Ok(report.ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_takes_positional_sections_and_map() {
        let cli = Cli::try_parse_from([
            "opml-timeline",
            "convert",
            "snapshots",
            "blogs.json",
            "Kindling,Feeds",
            "map.json",
            "--no-backup",
        ])
        .expect("parse");
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(sections_arg(args.sections.as_deref()), vec!["Kindling", "Feeds"]);
        assert_eq!(args.url_map, Some(PathBuf::from("map.json")));
        assert!(args.no_backup);
        assert!(!args.fresh);
    }

    #[test]
    fn extract_output_is_an_optional_flag() {
        let cli = Cli::try_parse_from([
            "opml-timeline",
            "extract",
            "fever-20200119.opml",
            "--sections",
            "Kindling",
        ])
        .expect("parse");
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.opml_file, PathBuf::from("fever-20200119.opml"));
        assert_eq!(args.output, None);

        let with_output = Cli::try_parse_from([
            "opml-timeline",
            "extract",
            "fever-20200119.opml",
            "--output",
            "items.json",
        ])
        .expect("parse");
        let Command::Extract(args) = with_output.command else {
            panic!("expected extract");
        };
        assert_eq!(args.output, Some(PathBuf::from("items.json")));
    }
}
