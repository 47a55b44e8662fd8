use std::fs;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use unipick::catalog;
use unipick::config::{self, Config};
use unipick::group::{self, GroupName, Groups};
use unipick::option::{PickOption, SearchField};
use unipick::picker::{Picker, PickerConfig, Selection};
use unipick::search;
use unipick::ui::app::App;

#[derive(Parser, Debug)]
#[command(name = "unipick", version, about = "Searchable option picker")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the options matching a query
    Query(QueryArgs),
    /// Pick an option interactively and print its value
    ///
    /// Quitting without confirming an option prints nothing and exits with
    /// status 1, even when `--selected` supplied a starting value.
    Pick(PickArgs),
    /// Build a JSON catalog from a university logo CSV
    ImportLogos(ImportLogosArgs),
}

/// Flags shared by `query` and `pick`; each overrides the config file.
#[derive(Args, Debug)]
struct PickerFlags {
    /// Field to search (repeatable): `label` or a metadata key
    #[arg(long = "field", value_name = "NAME")]
    fields: Vec<String>,

    /// Metadata key to group results by
    #[arg(long, value_name = "KEY")]
    group: Option<String>,

    /// Maximum number of options shown
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Catalog file (.json or .toml)
    catalog: PathBuf,

    /// Search text; empty lists every option
    #[arg(default_value = "")]
    query: String,

    #[command(flatten)]
    flags: PickerFlags,

    /// Print JSON instead of tab-separated lines
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PickArgs {
    /// Catalog file (.json or .toml)
    catalog: PathBuf,

    /// Value selected when the picker starts; printed only once confirmed
    #[arg(long, value_name = "VALUE")]
    selected: Option<String>,

    /// Accept free text when nothing matches
    #[arg(long)]
    allow_custom: bool,

    #[command(flatten)]
    flags: PickerFlags,
}

#[derive(Args, Debug)]
struct ImportLogosArgs {
    /// CSV with `university_name` and `logo_url` columns
    csv: PathBuf,

    /// Write the catalog here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    unipick::logging::init(cli.verbose);

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Query(args) => handle_query(args, &config),
        Command::Pick(args) => handle_pick(args, &config),
        Command::ImportLogos(args) => handle_import_logos(args),
    }
}

fn picker_config(base: &PickerConfig, flags: &PickerFlags) -> Result<PickerConfig> {
    let mut config = base.clone();
    if !flags.fields.is_empty() {
        config.search_fields = flags.fields.iter().map(|f| SearchField::parse(f)).collect();
    }
    if let Some(group) = &flags.group {
        config.group_key = Some(group.trim().to_string()).filter(|g| !g.is_empty());
    }
    if let Some(limit) = flags.limit {
        anyhow::ensure!(limit > 0, "--limit must be at least 1");
        config.max_visible = Some(limit);
    }
    Ok(config)
}

fn load_catalog(path: &Path) -> Result<Vec<PickOption<String>>> {
    catalog::load(path).with_context(|| format!("failed to load catalog {}", path.display()))
}

#[derive(Serialize)]
struct OptionOut<'a> {
    value: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
}

impl<'a> From<&'a PickOption<String>> for OptionOut<'a> {
    fn from(option: &'a PickOption<String>) -> Self {
        Self {
            value: &option.value,
            label: &option.label,
            subtitle: option.subtitle.as_deref(),
            icon: option.icon.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct GroupOut<'a> {
    name: &'a str,
    ungrouped: bool,
    options: Vec<OptionOut<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum QueryOut<'a> {
    Flat { options: Vec<OptionOut<'a>> },
    Grouped { groups: Vec<GroupOut<'a>> },
}

fn handle_query(args: QueryArgs, config: &Config) -> Result<ExitCode> {
    let options = load_catalog(&args.catalog)?;
    let picker_config = picker_config(&config.picker, &args.flags)?;

    let mut matching = search::filter(&options, &args.query, &picker_config.search_fields);
    if let Some(cap) = picker_config.max_visible {
        matching.truncate(cap);
    }
    info!(query = %args.query, matches = matching.len(), "query finished");

    if matching.is_empty() && !args.json {
        eprintln!("No matches for \"{}\"", args.query.trim());
        return Ok(ExitCode::SUCCESS);
    }

    let groups = group::group_by(&matching, picker_config.group_key.as_deref());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.json {
        let doc = match &groups {
            Some(groups) => QueryOut::Grouped {
                groups: groups_out(groups),
            },
            None => QueryOut::Flat {
                options: matching.iter().map(|o| OptionOut::from(*o)).collect(),
            },
        };
        serde_json::to_writer_pretty(&mut out, &doc)?;
        writeln!(out)?;
        return Ok(ExitCode::SUCCESS);
    }

    match &groups {
        Some(groups) => {
            for (name, bucket) in groups.iter() {
                writeln!(out, "[{}]", name)?;
                for option in bucket {
                    write_option_line(&mut out, option)?;
                }
            }
        }
        None => {
            for option in &matching {
                write_option_line(&mut out, option)?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn groups_out<'g>(groups: &'g Groups<'_, String>) -> Vec<GroupOut<'g>> {
    groups
        .iter()
        .map(|(name, bucket)| GroupOut {
            name: name.title(),
            ungrouped: *name == GroupName::Ungrouped,
            options: bucket.iter().map(|o| OptionOut::from(*o)).collect(),
        })
        .collect()
}

fn write_option_line<W: Write>(out: &mut W, option: &PickOption<String>) -> io::Result<()> {
    match &option.subtitle {
        Some(subtitle) => writeln!(out, "{}\t{}\t{}", option.value, option.label, subtitle),
        None => writeln!(out, "{}\t{}", option.value, option.label),
    }
}

fn handle_pick(args: PickArgs, config: &Config) -> Result<ExitCode> {
    let options = load_catalog(&args.catalog)?;
    let mut picker_config = picker_config(&config.picker, &args.flags)?;
    if args.allow_custom {
        picker_config.allow_custom = true;
    }

    let initial = args.selected.map(|value| {
        if options.iter().any(|o| o.value == value) {
            Selection::Value(value)
        } else {
            Selection::Custom(value)
        }
    });

    let title = args
        .catalog
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "options".to_string());
    let picker = Picker::new(options, picker_config).with_selection(initial);

    let mut app = App::new(config, title, picker);
    match app.run()? {
        Some(Selection::Value(value)) => println!("{}", value),
        Some(Selection::Custom(text)) => println!("{}", text),
        None => return Ok(ExitCode::FAILURE),
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_import_logos(args: ImportLogosArgs) -> Result<ExitCode> {
    let file = fs::File::open(&args.csv)
        .with_context(|| format!("failed to open {}", args.csv.display()))?;
    let options = catalog::import_logos(BufReader::new(file))
        .with_context(|| format!("failed to import logos from {}", args.csv.display()))?;
    let json = catalog::to_json(&options)?;

    match &args.output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} options to {}", options.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::SUCCESS)
}
