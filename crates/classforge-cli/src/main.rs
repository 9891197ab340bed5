//! Classforge CLI
//!
//! Command-line front end for the generator:
//! - `generate`: diagram JSON → Java sources under an output directory
//! - `check`: run the whole pipeline, print diagnostics, write nothing
//! - `surface`: print the predicted accessor surfaces as JSON

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use classforge_codegen::{generate, predict_surfaces, Diagnostic, GeneratorConfig};
use classforge_diagram::{parse_diagram, Diagram};
use colored::Colorize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

mod report;
mod write;

#[derive(Parser)]
#[command(name = "classforge")]
#[command(
    author,
    version,
    about = "Classforge: class diagrams to layered Spring/JPA backends"
)]
struct Cli {
    /// Log verbosity (`-v` debug, `-vv` trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate entities, DTOs, mappers, repositories, services and controllers.
    Generate {
        /// Diagram JSON (`-` reads stdin)
        input: PathBuf,
        /// Output directory; artifacts land in `<out>/<kind>/<Type>.java`
        #[arg(short, long)]
        out: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
        /// Also write the diagnostics list as JSON
        #[arg(long)]
        diagnostics_json: Option<PathBuf>,
        /// Fail when any warning was recorded
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Run the pipeline and report diagnostics without writing sources.
    ///
    /// Exits non-zero when the diagram cannot be parsed, or with
    /// `--deny-warnings` when any warning was recorded.
    Check {
        /// Diagram JSON (`-` reads stdin)
        input: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
        /// Print diagnostics as JSON on stdout
        #[arg(long)]
        json: bool,
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Print the predicted entity/DTO accessor surfaces as JSON.
    Surface {
        /// Diagram JSON (`-` reads stdin)
        input: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct ConfigArgs {
    /// Generator config JSON (`basePackage`, `defaultIdType`, `derivedQueryLimit`, `apiPrefix`, `skipAncestorFields`)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base Java package (overrides the config file)
    #[arg(long)]
    package: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str::<GeneratorConfig>(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => GeneratorConfig::default(),
        };
        if let Some(package) = &self.package {
            config = config.with_base_package(package.clone());
        }
        if config.base_package.trim().is_empty() {
            return Err(anyhow!("base package must not be empty"));
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            input,
            out,
            config,
            diagnostics_json,
            deny_warnings,
        } => cmd_generate(&input, &out, &config.load()?, diagnostics_json.as_deref(), deny_warnings),
        Commands::Check {
            input,
            config,
            json,
            deny_warnings,
        } => cmd_check(&input, &config.load()?, json, deny_warnings),
        Commands::Surface { input, config, out } => cmd_surface(&input, &config.load()?, out.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_diagram(input: &Path) -> Result<Diagram> {
    let text = if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read diagram from stdin")?;
        text
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?
    };
    parse_diagram(&text).with_context(|| format!("failed to parse diagram {}", input.display()))
}

fn fail_on_warnings(diagnostics: &[Diagnostic], deny_warnings: bool) -> Result<()> {
    let warnings = report::warning_count(diagnostics);
    if deny_warnings && warnings > 0 {
        return Err(anyhow!("{warnings} warning(s) recorded and --deny-warnings is set"));
    }
    Ok(())
}

fn cmd_generate(
    input: &Path,
    out: &Path,
    config: &GeneratorConfig,
    diagnostics_json: Option<&Path>,
    deny_warnings: bool,
) -> Result<()> {
    let diagram = load_diagram(input)?;
    let output = generate(&diagram, config);

    report::print_diagnostics(&output.diagnostics);
    fail_on_warnings(&output.diagnostics, deny_warnings)?;

    let written = write::write_artifacts(out, &output.artifacts)?;
    if let Some(path) = diagnostics_json {
        write::write_json(path, &output.diagnostics)?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }

    eprintln!(
        "{} generated {} file(s) into {} ({} class(es), {} association table(s))",
        "ok".green().bold(),
        written,
        out.display(),
        diagram.classes.len(),
        diagram.association_tables.len()
    );
    report::print_summary(&output.diagnostics);
    Ok(())
}

fn cmd_check(input: &Path, config: &GeneratorConfig, json: bool, deny_warnings: bool) -> Result<()> {
    let diagram = load_diagram(input)?;
    let output = generate(&diagram, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&output.diagnostics)?);
    } else {
        report::print_diagnostics(&output.diagnostics);
        eprintln!(
            "{} {} artifact(s) would be generated",
            "ok".green().bold(),
            output.artifacts.len()
        );
        report::print_summary(&output.diagnostics);
    }
    fail_on_warnings(&output.diagnostics, deny_warnings)
}

fn cmd_surface(input: &Path, config: &GeneratorConfig, out: Option<&Path>) -> Result<()> {
    let diagram = load_diagram(input)?;
    let report = predict_surfaces(&diagram, config);
    match out {
        Some(path) => {
            write::write_json(path, &report)?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
