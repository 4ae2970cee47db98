mod error_formatter;
mod formatter;
mod interactive;
mod server;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use formatter::Formatter;
use std::fs;
use std::path::{Path, PathBuf};
use triage::{builtin, clinical, Engine, Facts};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Forward-chaining rule evaluation for staged clinical decision aids.")]
#[command(
    long_about = "Triage matches observed facts against condition -> conclusion rules and selects one conclusion,\neither by priority or by walking severity categories from most to least severe.\nThe CLI evaluates rule sets from JSON files or the built-in HFMD rule sets, or serves them over HTTP."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the rule set comes from; defaults to the built-in grading set
#[derive(Args, Debug, Clone)]
struct RuleSource {
    /// Rule definition file (JSON)
    #[arg(short = 'r', long = "rules", conflicts_with = "builtin")]
    rules: Option<PathBuf>,
    /// Built-in rule set: grading or diagnosis
    #[arg(short = 'b', long)]
    builtin: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate facts against a rule set
    ///
    /// Facts come from a JSON file, from name=value arguments (which win over the file)
    /// and, with --interactive, from prompts for every input field still missing.
    Run {
        #[command(flatten)]
        source: RuleSource,
        /// Facts (format: name=value)
        ///
        /// Examples: spo2=88, temp_c=39.5, somnolent=true, symptoms=[rash,fever]
        facts: Vec<String>,
        /// JSON file holding an object of facts
        #[arg(short = 'f', long = "facts-file")]
        facts_file: Option<PathBuf>,
        /// Print the full response as JSON
        #[arg(long, conflicts_with_all = ["explain", "verbose"])]
        json: bool,
        /// Explain which rule decided and what else matched
        #[arg(short = 'e', long)]
        explain: bool,
        /// Include the evaluation trace (implies --explain)
        #[arg(short = 'v', long)]
        verbose: bool,
        /// Compute hr_no_fever and pulse_pressure from raw vitals before evaluating
        #[arg(long)]
        derive_vitals: bool,
        /// Prompt for input fields that were not given
        #[arg(short = 'i', long)]
        interactive: bool,
    },
    /// Show the rules of a rule set
    Show {
        #[command(flatten)]
        source: RuleSource,
    },
    /// Show rule set statistics
    Stats {
        #[command(flatten)]
        source: RuleSource,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all rule set files under a directory
    ///
    /// Every .json file is loaded and validated; files that fail are listed with their error.
    List {
        /// Directory to search
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Start HTTP REST API server (default: localhost:3000)
    ///
    /// API: POST /api/diagnose and POST /api/classify with {facts}, GET /api/stats, GET /health
    Server {
        /// Rule file for the diagnosis stage (default: built-in diagnosis)
        #[arg(long = "diagnosis-rules")]
        diagnosis_rules: Option<PathBuf>,
        /// Rule file for the grading stage (default: built-in grading)
        #[arg(long = "grading-rules")]
        grading_rules: Option<PathBuf>,
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port number to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    init_tracing(default_log_filter(&cli.command));

    let result = match &cli.command {
        Commands::Run {
            source,
            facts,
            facts_file,
            json,
            explain,
            verbose,
            derive_vitals,
            interactive,
        } => run_command(
            source,
            facts,
            facts_file.as_deref(),
            RunOutput::from_flags(*json, *explain, *verbose),
            *derive_vitals,
            *interactive,
        ),
        Commands::Show { source } => show_command(source),
        Commands::Stats { source, json } => stats_command(source, *json),
        Commands::List { root } => list_command(root),
        Commands::Server {
            diagnosis_rules,
            grading_rules,
            host,
            port,
        } => server_command(diagnosis_rules.as_deref(), grading_rules.as_deref(), host, *port),
    };

    if let Err(e) = result {
        if let Some(triage_err) = e.downcast_ref::<triage::TriageError>() {
            eprintln!("{}", error_formatter::format_error(triage_err));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

/// The server logs requests; one-shot commands only surface rule set warnings
fn default_log_filter(command: &Commands) -> &'static str {
    match command {
        Commands::Server { .. } => "triage=info,tower_http=info",
        _ => "triage=warn",
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutput {
    Summary,
    Explain { verbose: bool },
    Json,
}

impl RunOutput {
    fn from_flags(json: bool, explain: bool, verbose: bool) -> Self {
        if json {
            RunOutput::Json
        } else if explain || verbose {
            RunOutput::Explain { verbose }
        } else {
            RunOutput::Summary
        }
    }
}

fn run_command(
    source: &RuleSource,
    fact_args: &[String],
    facts_file: Option<&Path>,
    output: RunOutput,
    derive_vitals: bool,
    interactive: bool,
) -> Result<()> {
    let engine = load_engine(source)?;

    let mut facts = match facts_file {
        Some(path) => read_facts_file(path)?,
        None => Facts::new(),
    };

    if !fact_args.is_empty() {
        let refs: Vec<&str> = fact_args.iter().map(|s| s.as_str()).collect();
        facts.merge(&triage::parse_facts(&refs)?);
    }

    if interactive {
        let prompted = interactive::prompt_missing_facts(&engine, &facts)?;
        facts.merge(&prompted);
    }

    if derive_vitals {
        clinical::augment_vitals(&mut facts);
    }

    let response = engine.evaluate(&facts);
    let formatter = Formatter::default();
    match output {
        RunOutput::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        RunOutput::Explain { verbose } => {
            print!("{}", formatter.format_response(&response));
            println!();
            print!("{}", response.explain(verbose));
        }
        RunOutput::Summary => print!("{}", formatter.format_response(&response)),
    }

    Ok(())
}

fn show_command(source: &RuleSource) -> Result<()> {
    let engine = load_engine(source)?;
    let formatter = Formatter::default();
    print!("{}", formatter.format_rule_set(engine.rule_set()));
    Ok(())
}

fn stats_command(source: &RuleSource, json: bool) -> Result<()> {
    let engine = load_engine(source)?;
    let statistics = engine.statistics();
    if json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
    } else {
        let formatter = Formatter::default();
        print!("{}", formatter.format_statistics(&statistics, engine.warnings()));
    }
    Ok(())
}

fn list_command(root: &Path) -> Result<()> {
    println!("Searching {} for rule sets...", root.display());

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let source_id = path.to_string_lossy().to_string();
        let loaded = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| Engine::from_json(&text, &source_id).map_err(|e| e.to_string()));
        entries.push(formatter::ListEntry {
            path: source_id,
            loaded: loaded.map(|engine| engine.statistics()),
        });
    }

    println!();
    let formatter = Formatter::default();
    print!("{}", formatter.format_workspace_summary(&entries));

    Ok(())
}

fn server_command(
    diagnosis_rules: Option<&Path>,
    grading_rules: Option<&Path>,
    host: &str,
    port: u16,
) -> Result<()> {
    #[cfg(feature = "server")]
    {
        use tokio::runtime::Runtime;
        let diagnosis = match diagnosis_rules {
            Some(path) => load_file(path)?,
            None => builtin::diagnosis()?,
        };
        let grading = match grading_rules {
            Some(path) => load_file(path)?,
            None => builtin::grading()?,
        };

        let rt = Runtime::new()?;
        rt.block_on(async {
            println!(
                "Starting HTTP server with rule sets '{}' and '{}'",
                diagnosis.rule_set().name(),
                grading.rule_set().name()
            );
            server::http::start_server(diagnosis, grading, host, port).await
        })?;
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (diagnosis_rules, grading_rules, host, port);
        eprintln!("Error: Server feature not enabled");
        eprintln!("Recompile with: cargo build --features server");
        std::process::exit(1);
    }

    Ok(())
}

fn load_engine(source: &RuleSource) -> Result<Engine> {
    match (&source.rules, &source.builtin) {
        (Some(path), _) => load_file(path),
        (None, Some(name)) => Ok(builtin::by_name(name)?),
        (None, None) => Ok(builtin::grading()?),
    }
}

fn load_file(path: &Path) -> Result<Engine> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file {}", path.display()))?;
    Ok(Engine::from_json(&text, &path.to_string_lossy())?)
}

fn read_facts_file(path: &Path) -> Result<Facts> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read facts file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Facts file {} must hold a JSON object of facts", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_output_flags() {
        assert_eq!(RunOutput::from_flags(false, false, false), RunOutput::Summary);
        assert_eq!(
            RunOutput::from_flags(false, true, false),
            RunOutput::Explain { verbose: false }
        );
        assert_eq!(
            RunOutput::from_flags(false, false, true),
            RunOutput::Explain { verbose: true }
        );
        assert_eq!(RunOutput::from_flags(true, false, false), RunOutput::Json);
    }

    #[test]
    fn test_server_logs_at_info() {
        let server = Cli::parse_from(["triage", "server"]);
        assert_eq!(
            default_log_filter(&server.command),
            "triage=info,tower_http=info"
        );
        let run = Cli::parse_from(["triage", "run", "spo2=88"]);
        assert_eq!(default_log_filter(&run.command), "triage=warn");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
