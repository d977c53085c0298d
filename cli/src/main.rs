//! newsprep CLI - news text preprocessing tool
//!
//! A command-line driver for preprocessing, summarizing and evaluating
//! Korean and English news text.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use newsprep::evaluate::{evaluate_csv, lead_summary, RougeScorer};
use newsprep::observer::{RowObserver, TracingReporter};
use newsprep::record::RowOutcome;
use newsprep::summarize::{ChatCompletionSummarizer, SummarizerConfig, SummaryJob};
use newsprep::tokenize::{Capabilities, RuleLemmatizer};
use newsprep::{write_records, CsvLoader, LoadReport, Pipeline, PreprocessOptions, Tokenizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Korean and English news text preprocessing
#[derive(Parser)]
#[command(
    name = "newsprep",
    version,
    about = "Preprocess Korean and English news text",
    long_about = "newsprep - news text preprocessing tool.\n\n\
                  Cleans and tokenizes CSV files and web articles.\n\n\
                  Usage:\n  \
                  newsprep preprocess news.csv -o out.csv     Preprocess a CSV file\n  \
                  newsprep tokenize \"<text>\"                  Tokenize one text\n  \
                  newsprep summarize news.csv                 Add an LLM summary column"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and tokenize CSV files and article URLs
    #[command(visible_alias = "prep")]
    Preprocess {
        /// CSV paths or http(s) URLs
        #[arg(required = true)]
        sources: Vec<String>,

        /// Output CSV file (default: JSON lines on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text column of CSV sources
        #[arg(long, default_value = "content")]
        column: String,

        /// Minimum number of tokens per row
        #[arg(long, default_value = "3")]
        min_tokens: usize,

        /// Classify language by Hangul ratio only
        #[arg(long)]
        no_langdetect: bool,

        /// Split Korean text on whitespace instead of detaching particles
        #[arg(long)]
        no_morph: bool,

        /// Process rows in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Tokenize a single text and print the result
    Tokenize {
        /// Text to tokenize
        text: String,
    },

    /// Add a summary column to a CSV file
    Summarize {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file (default: <stem>_with_summaries.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text column
        #[arg(long, default_value = "content")]
        column: String,

        /// Chat completion model
        #[arg(long, env = "NEWSPREP_MODEL")]
        model: Option<String>,

        /// Pause between API calls, in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,
    },

    /// Score the lead-100 baseline against reference summaries with ROUGE
    Evaluate {
        /// CSV file with full_content and target_summary columns
        input: PathBuf,

        /// Output CSV file (default: <stem>_rouge.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "newsprep=debug"
    } else if quiet {
        "newsprep=warn"
    } else {
        "newsprep=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Preprocess {
            sources,
            output,
            column,
            min_tokens,
            no_langdetect,
            no_morph,
            parallel,
        } => {
            let mut options = PreprocessOptions::default()
                .with_text_column(column)
                .with_min_tokens(min_tokens);
            if parallel {
                options = options.parallel();
            }

            let mut capabilities = Capabilities::builtin();
            if no_langdetect {
                capabilities = capabilities.without_language_identifier();
            }
            if no_morph {
                capabilities = capabilities.without_morph_analyzer();
            }

            let pipeline = Pipeline::new(CsvLoader::new(options, capabilities));
            let mut progress = ProgressObserver::new(cli.quiet);
            let records =
                pipeline.load_all_with_observer(&sources, &mut (&mut progress, TracingReporter));
            progress.finish();

            match output {
                Some(path) => {
                    write_records(&path, &records)?;
                    println!(
                        "{} Wrote {} records to {}",
                        "✓".green().bold(),
                        records.len(),
                        path.display()
                    );
                }
                None => {
                    for record in &records {
                        println!("{}", serde_json::to_string(record)?);
                    }
                }
            }
        }

        Commands::Tokenize { text } => {
            let tokenizer = Tokenizer::default();
            let cleaned = newsprep::clean_text(&text);
            let (language, tokens) = tokenizer.tokenize_with_language(&cleaned);

            println!("{}: {}", "Language".bold(), language.code());
            println!("{}: {}", "Cleaned".bold(), cleaned);
            println!("{}: {}", "Tokens".bold(), serde_json::to_string(&tokens)?);
        }

        Commands::Summarize {
            input,
            output,
            column,
            model,
            delay_ms,
        } => {
            let mut config = SummarizerConfig::from_env()?;
            if let Some(model) = model {
                config = config.with_model(model);
            }
            let summarizer = ChatCompletionSummarizer::new(config)?;

            let mut job = SummaryJob::new(&input)
                .with_text_column(column)
                .with_delay(Duration::from_millis(delay_ms));
            if let Some(output) = output {
                job = job.with_output(output);
            }

            let pb = create_bar(0, cli.quiet);
            let report = job.run_with_progress(&summarizer, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            })?;
            pb.finish_and_clear();
            summarizer.monitor().report();

            println!("{}", "Summarization Complete".green().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Output".bold(), report.output.display());
            println!("{}: {}", "Rows".bold(), report.rows);
            println!("{}: {}", "Succeeded".bold(), report.succeeded);
            if report.failed > 0 {
                println!("{}: {}", "Failed".bold(), report.failed.to_string().red());
            }
        }

        Commands::Evaluate { input, output } => {
            let output = output.unwrap_or_else(|| rouge_output_path(&input));
            let scorer = RougeScorer::with_stemmer(Arc::new(RuleLemmatizer));
            let pb = create_spinner("Scoring summaries...");

            let report = evaluate_csv(&input, &output, &scorer, &|text: &str| {
                lead_summary(text, 100)
            })?;
            pb.finish_and_clear();

            println!("{}", "ROUGE Scores".cyan().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Rows".bold(), report.rows);
            println!("{}: {:.4}", "ROUGE-1".bold(), report.rouge1_fmeasure);
            println!("{}: {:.4}", "ROUGE-2".bold(), report.rouge2_fmeasure);
            println!("{}: {:.4}", "ROUGE-L".bold(), report.rouge_l_fmeasure);
            println!("{}: {}", "Output".bold(), report.output.display());
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// Drives a progress bar from row events.
struct ProgressObserver {
    bar: ProgressBar,
    hidden: bool,
    loaded: Vec<LoadReport>,
}

impl ProgressObserver {
    fn new(hidden: bool) -> Self {
        Self {
            bar: create_bar(0, hidden),
            hidden,
            loaded: Vec::new(),
        }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
        if self.hidden {
            return;
        }
        for report in &self.loaded {
            println!(
                "  {} {} [{}] {} rows, {} kept, {} skipped, {} duplicates",
                "✓".green(),
                report.source.display(),
                report.encoding,
                report.rows,
                report.records,
                report.rejected,
                report.duplicates_removed
            );
        }
    }
}

impl RowObserver for ProgressObserver {
    fn on_rows_ready(&mut self, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
    }

    fn on_row_processed(&mut self, _row: usize, _outcome: &RowOutcome) {
        self.bar.inc(1);
    }

    fn on_load_finished(&mut self, report: &LoadReport) {
        self.loaded.push(report.clone());
    }
}

fn rouge_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}_rouge.csv", stem))
}

fn print_version() {
    println!("{} {}", "newsprep".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Korean and English news text preprocessing");
    println!();
    println!("Encodings: UTF-8 (BOM), UTF-8, CP949, EUC-KR, Latin-1");
    println!("Languages: Korean, English");
}

fn create_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.blue} [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preprocess_args() {
        let cli = Cli::parse_from([
            "newsprep",
            "preprocess",
            "a.csv",
            "https://news.example.com/1",
            "--min-tokens",
            "5",
            "--no-morph",
        ]);
        match cli.command {
            Commands::Preprocess {
                sources,
                min_tokens,
                no_morph,
                no_langdetect,
                ..
            } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(min_tokens, 5);
                assert!(no_morph);
                assert!(!no_langdetect);
            }
            _ => panic!("expected preprocess"),
        }
    }

    #[test]
    fn test_rouge_output_path() {
        assert_eq!(
            rouge_output_path(Path::new("data/eval.csv")),
            PathBuf::from("data/eval_rouge.csv")
        );
    }
}
