use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use marks_calc::config::{load_config, validate_config, Config};
use marks_calc::ingest::{self, ColumnAliases};
use marks_calc::output;
use marks_calc::pipeline::{self, SkippedRow, DEFAULT_QUANTILES};
use marks_calc::scoring::{self, EngineError, Scope};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_INPUT: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
    Tsv,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum GroupBy {
    Shift,
    Category,
}

impl From<GroupBy> for Scope {
    fn from(group_by: GroupBy) -> Self {
        match group_by {
            GroupBy::Shift => Scope::Shift,
            GroupBy::Category => Scope::Category,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one response sheet (CSV file, saved HTML page, or https:// link)
    Score {
        source: String,
        /// Name to print on the result
        #[arg(long)]
        name: Option<String>,
        /// Medium of examination to print on the result (e.g. English)
        #[arg(long)]
        medium: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Score every candidate in a bulk response file, then normalize and rank
    Evaluate {
        source: String,
        /// Normalize raw totals within this grouping before ranking
        #[arg(long, value_enum)]
        group_by: Option<GroupBy>,
        /// Print only this candidate's scorecard
        #[arg(long)]
        candidate: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Group statistics and cutoff predictions from aggregated marks (password protected)
    Admin {
        file: String,
        /// Quantile to report per group (repeatable)
        #[arg(long = "quantile", num_args = 1)]
        quantiles: Vec<f64>,
        /// Grouping for statistics and the normalization preview (defaults to shift when present)
        #[arg(long, value_enum)]
        group_by: Option<GroupBy>,
        /// Write the report to a .json or .csv file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Create a config file interactively
    Init,
    /// Print the hash of an admin password for the config file
    HashPassword,
}

#[derive(Parser, Debug)]
#[command(name = "marks-calc")]
#[command(about = "Exam marks calculator: negative marking, shift normalization, ranks and cutoffs", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/marks-calc/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn exit_with(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

/// Fetch and parse a source. Remote failures are network errors, anything
/// else is bad input.
async fn load_table(source: &str) -> ingest::Table {
    let text = match ingest::read_source(source).await {
        Ok(t) => t,
        Err(e) => {
            let code = if ingest::remote::is_remote(source) {
                EXIT_NETWORK
            } else {
                EXIT_INPUT
            };
            exit_with(code, format!("Error: {:#}", e));
        }
    };
    match ingest::parse_document(&text) {
        Ok(table) => table,
        Err(e) => exit_with(EXIT_INPUT, format!("Error: {:#}", e)),
    }
}

fn input_error(e: EngineError) -> ! {
    exit_with(EXIT_INPUT, format!("Error: {}", e))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with(EXIT_INPUT, format!("Failed to serialize output: {}", e)),
    }
}

fn report_skipped(skipped: &[SkippedRow], use_colors: bool) {
    if !skipped.is_empty() {
        eprintln!("{}", output::format_skipped(skipped, use_colors));
    }
}

fn column_aliases(config: &Config) -> ColumnAliases {
    match ColumnAliases::from_config(&config.columns) {
        Ok(a) => a,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {}", e)),
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let start_time = Instant::now();
    let config_path = cli.config.map(PathBuf::from);

    match cli.command {
        Commands::Init => {
            if let Err(e) = marks_calc::config::init::run_init_wizard(config_path) {
                exit_with(EXIT_CONFIG, format!("Init failed: {:#}", e));
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::HashPassword => {
            match marks_calc::credentials::prompt_new_password()
                .and_then(|password| marks_calc::credentials::hash_password(&password))
            {
                Ok(hash) => println!("{}", hash),
                Err(e) => exit_with(EXIT_AUTH, format!("Error: {:#}", e)),
            }
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };
    if let Err(errors) = validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    let aliases = column_aliases(&config);
    let use_colors = output::should_use_colors();

    match cli.command {
        Commands::Score {
            source,
            name,
            medium,
            format,
        } => {
            let table = load_table(&source).await;
            let candidates =
                ingest::responses_from_table(&table, &aliases).unwrap_or_else(|e| input_error(e));
            let [candidate] = candidates.as_slice() else {
                exit_with(
                    EXIT_INPUT,
                    format!(
                        "Sheet holds {} candidates; use `marks-calc evaluate` for bulk files",
                        candidates.len()
                    ),
                );
            };
            let mut score =
                scoring::score_candidate(candidate).unwrap_or_else(|e| input_error(e));
            if name.is_some() {
                score.name = name;
            }
            let result = pipeline::student_result(score, medium, &config.scoring);

            match format {
                OutputFormat::Table => {
                    println!("{}", output::format_student_result(&result, use_colors))
                }
                OutputFormat::Json => print_json(&result),
                OutputFormat::Tsv => println!("{}", output::format_student_tsv(&result)),
            }
        }
        Commands::Evaluate {
            source,
            group_by,
            candidate,
            format,
        } => {
            let table = load_table(&source).await;
            let responses =
                ingest::responses_from_table(&table, &aliases).unwrap_or_else(|e| input_error(e));
            let bulk = scoring::score_responses(&responses);
            let run = pipeline::evaluate_population(bulk, group_by.map(Scope::from), &config.scoring)
                .unwrap_or_else(|e| input_error(e));
            let skipped: Vec<SkippedRow> = run.skipped.iter().map(SkippedRow::from).collect();
            report_skipped(&skipped, use_colors);

            if let Some(roll) = candidate {
                let card = scoring::scorecard_for(&run.population, &roll, &run.scopes)
                    .unwrap_or_else(|e| input_error(e));
                match format {
                    OutputFormat::Json => print_json(&card),
                    OutputFormat::Tsv => println!("{}", output::format_tsv(&[card])),
                    OutputFormat::Table => {
                        println!("{}", output::format_scorecard_detail(&card, use_colors))
                    }
                }
            } else {
                let cards = run.scorecards();
                match format {
                    OutputFormat::Json => print_json(&cards),
                    OutputFormat::Tsv => println!("{}", output::format_tsv(&cards)),
                    OutputFormat::Table => {
                        println!("{}", output::format_scorecard_table(&cards, use_colors))
                    }
                }
            }
        }
        Commands::Admin {
            file,
            quantiles,
            group_by,
            export,
        } => {
            if !config.admin_enabled {
                exit_with(
                    EXIT_AUTH,
                    marks_calc::credentials::AdminGateError::Disabled,
                );
            }
            let password = match marks_calc::credentials::prompt_for_password() {
                Ok(p) => p,
                Err(e) => exit_with(EXIT_AUTH, format!("Error: {:#}", e)),
            };
            if let Err(e) = marks_calc::credentials::authorize_admin(&config, &password) {
                exit_with(EXIT_AUTH, e);
            }

            let quantiles = if quantiles.is_empty() {
                DEFAULT_QUANTILES.to_vec()
            } else {
                quantiles
            };

            let table = load_table(&file).await;
            let bulk =
                ingest::scores_from_table(&table, &aliases).unwrap_or_else(|e| input_error(e));
            let report = pipeline::admin_report(
                bulk,
                &quantiles,
                group_by.map(Scope::from),
                &config.scoring,
            )
            .unwrap_or_else(|e| input_error(e));

            report_skipped(&report.skipped, use_colors);
            println!("{}", output::format_admin_report(&report, use_colors));

            if let Some(path) = export {
                match output::export_report(&path, &report) {
                    Ok(_) => println!("\nReport written to {}", path.display()),
                    Err(e) => exit_with(EXIT_INPUT, format!("Export failed: {:#}", e)),
                }
            }
        }
        Commands::Init | Commands::HashPassword => {}
    }

    log::debug!("Finished in {:?}", start_time.elapsed());
    std::process::exit(EXIT_SUCCESS);
}
