use anyhow::{Context, Result, bail};
use argot::{ArgumentParser, ParseOutcome};
use argot_schema::{CommandSchema, ScalarType, SlotTable, ValueType, bind};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::{EnvFilter, fmt};

/// Exit status for command lines the schema rejects.
const USAGE_ERROR: u8 = 2;

const EXAMPLE_SCHEMA: &str = r#"{
  "name": "pack",
  "description": "Bundle files into an archive.",
  "version": "0.1.0",
  "args": [
    { "names": ["-v", "--verbose"], "action": "count", "help": "more output (repeatable)" },
    { "names": ["-l", "--level"], "value-type": "int", "default": 6, "help": "compression level" },
    { "names": ["--exclude"], "action": "append", "metavar": "GLOB", "help": "skip matching files" },
    { "names": ["--dry-run"], "action": "store-true", "help": "do not write anything" }
  ],
  "subcommands": [
    {
      "name": "create",
      "aliases": ["c"],
      "help": "create a new archive",
      "args": [
        { "names": ["output"], "value-type": "path" },
        { "names": ["inputs"], "value-type": "path", "nargs": "+" }
      ]
    },
    {
      "name": "list",
      "aliases": ["ls"],
      "help": "list archive contents",
      "args": [{ "names": ["archive"], "value-type": "path" }]
    }
  ],
  "subcommand-required": true
}
"#;

#[derive(Parser)]
#[command(name = "argot")]
#[command(version, about = "Try out argot command schemas", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a command line against a schema and print the values as JSON
    Check(CheckArgs),

    /// Print the help text a schema produces
    Help(HelpArgs),

    /// List the builtin value types
    Types,

    /// Write an example argot.json
    Init(InitArgs),
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the schema JSON
    #[arg(short, long, default_value = "argot.json")]
    schema: PathBuf,

    /// Command line to parse (put it after `--`)
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to the schema JSON
    #[arg(short, long, default_value = "argot.json")]
    schema: PathBuf,

    /// Show the help of this sub-command instead
    #[arg(long, value_name = "NAME")]
    sub: Option<String>,
}

#[derive(Parser)]
struct InitArgs {
    /// Target directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => check(args),
        Commands::Help(args) => help(args),
        Commands::Types => types(),
        Commands::Init(args) => init(args),
    }
}

fn load_schema(path: &Path) -> Result<CommandSchema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    CommandSchema::from_json(&text)
        .with_context(|| format!("failed to load schema: {}", path.display()))
}

fn check(args: CheckArgs) -> Result<ExitCode> {
    let schema = load_schema(&args.schema)?;
    let mut slots = SlotTable::allocate(&schema)
        .with_context(|| format!("invalid schema: {}", args.schema.display()))?;
    tracing::debug!(args = ?args.args, "parsing command line");

    let outcome = {
        let mut parser = bind(&schema, &mut slots)?;
        parser
            .parse_args(args.args)
            .map_err(|err| parser.format_error(&err))
    };

    match outcome {
        Ok(ParseOutcome::Parsed(_)) => {
            println!("{}", serde_json::to_string_pretty(&slots.to_json())?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(
            ParseOutcome::Help(text) | ParseOutcome::Usage(text) | ParseOutcome::Version(text),
        ) => {
            print!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => {
            eprint!("{report}");
            Ok(ExitCode::from(USAGE_ERROR))
        }
    }
}

fn help(args: HelpArgs) -> Result<ExitCode> {
    let schema = load_schema(&args.schema)?;
    let mut slots = SlotTable::allocate(&schema)
        .with_context(|| format!("invalid schema: {}", args.schema.display()))?;
    let mut parser = bind(&schema, &mut slots)?;

    let text = match &args.sub {
        None => parser.format_help(),
        Some(name) => {
            let Some(sub) = parser.sub_command_mut(name) else {
                bail!("schema `{}` has no sub-command `{name}`", schema.name);
            };
            let name = sub.name().to_string();
            sub_command_help(&mut parser, &name)?
        }
    };
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}

/// Sub-command help is whatever `prog <name> --help` prints.
fn sub_command_help(parser: &mut ArgumentParser<'_>, name: &str) -> Result<String> {
    match parser.parse_args([name, "--help"]) {
        Ok(ParseOutcome::Help(text)) => Ok(text),
        Ok(other) => bail!("unexpected outcome for `{name} --help`: {other:?}"),
        Err(err) => bail!("failed to render help for `{name}`: {err}"),
    }
}

fn types() -> Result<ExitCode> {
    let rows: Vec<(String, String, String)> = ScalarType::ALL
        .into_iter()
        .flat_map(|scalar| [ValueType::scalar(scalar), ValueType::list(scalar)])
        .map(|ty| {
            let rust = if ty.list {
                format!("Vec<{}>", ty.scalar.rust_type())
            } else {
                format!("Option<{}>", ty.scalar.rust_type())
            };
            (ty.to_string(), rust, ty.type_hint())
        })
        .collect();
    let width = rows.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);
    let rust_width = rows.iter().map(|(_, rust, _)| rust.len()).max().unwrap_or(0);
    for (name, rust, hint) in rows {
        println!("{name:width$}  {rust:rust_width$}  {hint}");
    }
    Ok(ExitCode::SUCCESS)
}

fn init(args: InitArgs) -> Result<ExitCode> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let schema_path = dir.join("argot.json");
    if schema_path.exists() {
        bail!("argot.json already exists in {}", dir.display());
    }
    fs::write(&schema_path, EXAMPLE_SCHEMA)
        .with_context(|| format!("failed to write {}", schema_path.display()))?;

    eprintln!("Created {}", schema_path.display());
    eprintln!();
    eprintln!("Try:");
    eprintln!("  argot help --schema {}", schema_path.display());
    eprintln!(
        "  argot check --schema {} -- -vv create out.tar a.txt b.txt",
        schema_path.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_schema_is_valid() {
        let schema = CommandSchema::from_json(EXAMPLE_SCHEMA).unwrap();
        assert_eq!(schema.subcommands.len(), 2);
        SlotTable::allocate(&schema).unwrap();
    }
}
