//! mu - course converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use mu::{
    Format, FormatTable, HtmlConfig, OlxConfig, OverwritePolicy, Registry, WriteOptions, convert,
};

#[derive(Parser)]
#[command(name = "mu")]
#[command(version, about = "Convert online courses between Markdown, HTML and OLX", long_about = None)]
#[command(after_help = "EXAMPLES:
    mu course.md course.html           Convert Markdown to HTML
    mu course.md course-olx            Convert Markdown to an OLX package
    mu -f olx export/ -t md course.md  Convert an OLX export to Markdown")]
struct Cli {
    /// Input file, or OLX package directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, or OLX package directory
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Input format (md, html, olx); detected from INPUT by default
    #[arg(short, long, value_name = "FORMAT")]
    from: Option<Format>,

    /// Output format (md, html, olx); detected from OUTPUT by default
    #[arg(short, long, value_name = "FORMAT")]
    to: Option<Format>,

    /// Replace an existing output file or package
    #[arg(long)]
    force: bool,

    /// Embed a stylesheet in HTML output
    #[arg(long)]
    styled: bool,

    /// Units down to this depth get their own OLX file
    #[arg(long, value_name = "DEPTH", default_value_t = OlxConfig::default().reference_depth)]
    reference_depth: usize,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn resolve_format(explicit: Option<Format>, path: &Path, role: &str) -> Result<Format, String> {
    explicit.or_else(|| Format::detect(path)).ok_or_else(|| {
        format!(
            "cannot detect the {role} format of {}; pass it with --{}",
            path.display(),
            if role == "input" { "from" } else { "to" }
        )
    })
}

fn run(cli: &Cli) -> Result<(), String> {
    let from = resolve_format(cli.from, &cli.input, "input")?;
    // A missing output path is a new package unless it has a file extension.
    let to = match cli.to {
        Some(to) => to,
        None if cli.output.extension().is_none() && !cli.output.exists() => Format::Olx,
        None => resolve_format(None, &cli.output, "output")?,
    };

    let options = WriteOptions {
        overwrite: if cli.force {
            OverwritePolicy::Replace
        } else {
            OverwritePolicy::Refuse
        },
        html: HtmlConfig {
            styled: cli.styled,
        },
        olx: OlxConfig {
            reference_depth: cli.reference_depth,
            ..OlxConfig::default()
        },
        ..WriteOptions::default()
    };
    let table = FormatTable::standard(options);
    let registry = Registry::standard();

    let summary = convert(&table, &registry, from, &cli.input, to, &cli.output)
        .map_err(|e| e.to_string())?;
    // Warnings were logged as they were raised.
    println!(
        "Converted \"{}\" ({} units, {} warnings) from {from} to {to}: {}",
        summary.course_title,
        summary.units,
        summary.warnings.len(),
        cli.output.display()
    );
    Ok(())
}
