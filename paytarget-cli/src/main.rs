//! paytarget CLI entry point: raw targets -> classify -> output.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use paytarget_core::{
    truncate_address, AgentError, Classifier, ClassifierConfig, ExtendedKeyVersion, Network,
    OutputMode, PaymentTarget, TargetIssue, TargetKind,
};

/// Batches at least this large get a spinner in human mode.
const SPINNER_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Auto,
    Json,
    Human,
}

/// CLI-only enum to satisfy clap's ValueEnum without adding clap to core.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNetwork {
    Mainnet,
    Testnet,
}

impl CliNetwork {
    fn to_core(self) -> Network {
        match self {
            CliNetwork::Mainnet => Network::Mainnet,
            CliNetwork::Testnet => Network::Testnet,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "paytarget-cli", version)]
#[command(about = "Classify payment targets: API key, extended public key, or Bitcoin Cash address")]
struct Cli {
    /// Targets to classify. Reads stdin when neither targets nor --input are given.
    targets: Vec<String>,

    /// File with one target per line. Blank lines are skipped.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output format: auto (tty=human, pipe=agent), json (agent), human (operator).
    #[arg(long, value_enum, default_value = "auto")]
    output: OutputFormat,

    /// Network whose cashaddr prefix is tried on bare payloads.
    #[arg(long, value_enum, default_value = "mainnet")]
    network: CliNetwork,

    /// Log every rejected classification stage to stderr.
    #[arg(long, short)]
    verbose: bool,
}

/// One classified input, as emitted in agent mode.
#[derive(Debug, Serialize)]
struct Classified<'a> {
    input: &'a str,
    kind: TargetKind,
    address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    extended_key_version: Option<ExtendedKeyVersion>,
}

/// Detect output mode based on CLI flags and TTY detection.
fn detect_output_mode(output: OutputFormat) -> OutputMode {
    match output {
        OutputFormat::Human => OutputMode::Human,
        OutputFormat::Json => OutputMode::Agent,
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputMode::Human
            } else {
                OutputMode::Agent
            }
        }
    }
}

/// Logs go to stderr so agent-mode stdout stays pure JSON.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn spinner(mode: OutputMode, count: usize) -> Option<ProgressBar> {
    if mode != OutputMode::Human || count < SPINNER_THRESHOLD {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(format!("Classifying {count} targets…"));
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

fn human_header(title: &str) {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════════════════════╗".bright_white()
    );
    println!("{}", format!("║  {:<61}║", title).bright_white());
    println!(
        "{}",
        "╚═══════════════════════════════════════════════════════════════╝".bright_white()
    );
    println!();
}

fn kind_label(target: &PaymentTarget) -> String {
    match target.kind() {
        TargetKind::Invalid => format!("{} {}", "✗".red(), "Invalid".red()),
        TargetKind::ApiKey => format!("{} {}", "✓".green(), "API key".green()),
        TargetKind::ExtendedPublicKey => {
            let label = match target.extended_key_version() {
                Some(version) => format!("Extended public key ({})", version.name()),
                None => "Extended public key".to_string(),
            };
            format!("{} {}", "✓".green(), label.green())
        }
        TargetKind::Address => format!("{} {}", "✓".green(), "Address".green()),
    }
}

fn render_targets_table(inputs: &[String], targets: &[PaymentTarget]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Input").add_attribute(Attribute::Bold),
        Cell::new("Kind").add_attribute(Attribute::Bold),
        Cell::new("Canonical").add_attribute(Attribute::Bold),
    ]);

    for (i, (input, target)) in inputs.iter().zip(targets).enumerate() {
        let canonical = if target.is_valid() {
            truncate_address(target.address())
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_address(input)),
            Cell::new(kind_label(target)),
            Cell::new(canonical),
        ]);
    }

    table
}

fn emit_agent_error(err: AgentError) -> Result<()> {
    let json = serde_json::to_string(&err).context("failed to serialize agent error")?;
    eprintln!("{json}");
    Ok(())
}

fn read_targets(cli: &Cli) -> Result<Vec<String>> {
    let mut targets = cli.targets.clone();

    let text = match &cli.input {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read input file: {:?}", path))?,
        ),
        None if targets.is_empty() && !io::stdin().is_terminal() => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Some(buf)
        }
        None => None,
    };

    if let Some(text) = text {
        targets.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    Ok(targets)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mode = detect_output_mode(cli.output);
    let config = ClassifierConfig {
        network: cli.network.to_core(),
    };

    let inputs = read_targets(&cli)?;
    if inputs.is_empty() {
        match mode {
            OutputMode::Human => {
                println!("{}", "No targets given. Pass targets or --input <FILE>.".yellow())
            }
            OutputMode::Agent => emit_agent_error(AgentError {
                error: "no_input".to_string(),
                code: 2,
                details: None,
            })?,
        }
        std::process::exit(2);
    }

    let pb = spinner(mode, inputs.len());
    let classifier = Classifier::with_config(config);
    let targets: Vec<PaymentTarget> = inputs.iter().map(|raw| classifier.classify(raw)).collect();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let issues: Vec<TargetIssue> = inputs
        .iter()
        .zip(&targets)
        .enumerate()
        .filter(|(_, (_, target))| !target.is_valid())
        .map(|(i, (input, _))| TargetIssue {
            index: i + 1,
            input: input.clone(),
            message: "not an API key, extended public key or address".to_string(),
        })
        .collect();

    tracing::debug!(
        total = targets.len(),
        invalid = issues.len(),
        network = classifier.config().network.as_str(),
        "classification finished"
    );

    match mode {
        OutputMode::Human => {
            human_header("PAYTARGET — Classification");
            println!("{}", render_targets_table(&inputs, &targets));
            println!();
            if issues.is_empty() {
                println!(
                    "{} {}",
                    "✓".green(),
                    format!("All {} targets are usable.", targets.len()).green()
                );
            } else {
                println!(
                    "{} {}",
                    "✗".red(),
                    format!("{} of {} targets are invalid.", issues.len(), targets.len()).red()
                );
            }
        }
        OutputMode::Agent => {
            let results: Vec<Classified<'_>> = inputs
                .iter()
                .zip(&targets)
                .map(|(input, target)| Classified {
                    input,
                    kind: target.kind(),
                    address: target.address(),
                    extended_key_version: target.extended_key_version(),
                })
                .collect();
            let json = serde_json::to_string(&results).context("failed to serialize results")?;
            print!("{json}");
            io::stdout().flush().context("failed to flush stdout")?;

            if !issues.is_empty() {
                emit_agent_error(AgentError {
                    error: "invalid_target".to_string(),
                    code: 1,
                    details: Some(issues),
                })?;
                std::process::exit(1);
            }
        }
    }

    if targets.iter().any(|t| !t.is_valid()) {
        std::process::exit(1);
    }

    Ok(())
}
