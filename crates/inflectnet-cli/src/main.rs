//! inflectnet CLI: Community structure and hierarchy in inflectional networks.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use inflectnet_core::config::{
    AnalysisConfig, AnalysisResult, DataType, PairSelection, ResolutionRange, ShuffleMode,
};
use inflectnet_core::output::{write_json, write_output};
use inflectnet_core::phases::simulation::simulate;
use inflectnet_core::pipeline;
use inflectnet_core::table::{language_from_path, load_table};

#[derive(Parser)]
#[command(
    name = "inflectnet",
    about = "inflectnet - Multi-resolution community structure in inflectional networks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DataTypeArg {
    Original,
    #[value(name = "typefreq_shuffled")]
    TypefreqShuffled,
    Allshuffled,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    #[value(name = "typefreq_shuffled")]
    TypefreqShuffled,
    Allshuffled,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate, build graphs, detect communities and compute hierarchy coefficients
    Analyze {
        /// Directory of {language}_formatives.json files, or a single table file
        path: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "results")]
        output: String,

        /// Comma-separated language filter
        #[arg(short, long)]
        languages: Option<String>,

        /// Data types to process
        #[arg(long, value_enum, default_value = "all")]
        data_type: DataTypeArg,

        /// Simulation seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Minimum resolution parameter
        #[arg(long, default_value = "0.0")]
        res_min: f64,

        /// Maximum resolution parameter
        #[arg(long, default_value = "2.0")]
        res_max: f64,

        /// Resolution step size
        #[arg(long, default_value = "0.1")]
        res_step: f64,

        /// Worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Key triphone nodes by cell
        #[arg(long)]
        cell_tagged: bool,

        /// Compare only neighbouring resolutions in the hierarchy analysis
        #[arg(long)]
        adjacent_only: bool,

        /// Write only the summary, not per-unit files
        #[arg(long)]
        summary_only: bool,

        /// Show per-unit timing breakdown
        #[arg(long)]
        verbose: bool,

        /// Suppress all output except errors
        #[arg(long)]
        quiet: bool,
    },
    /// Write one null-model variant of a formatives table
    Simulate {
        /// Formatives table (JSON)
        path: PathBuf,

        /// Shuffle regime
        #[arg(long, value_enum)]
        mode: ModeArg,

        /// Simulation seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            output,
            languages,
            data_type,
            seed,
            res_min,
            res_max,
            res_step,
            threads,
            cell_tagged,
            adjacent_only,
            summary_only,
            verbose,
            quiet,
        } => {
            init_logging(verbose && !quiet);

            let lang_filter = languages.map(|l| {
                l.split(',')
                    .map(|s| s.trim().to_string())
                    .collect::<Vec<_>>()
            });

            let data_types = match data_type {
                DataTypeArg::Original => vec![DataType::Original],
                DataTypeArg::TypefreqShuffled => vec![DataType::TypefreqShuffled],
                DataTypeArg::Allshuffled => vec![DataType::Allshuffled],
                DataTypeArg::All => DataType::ALL.to_vec(),
            };

            let config = AnalysisConfig {
                data_path: path.to_string_lossy().to_string(),
                output_dir: output.clone(),
                languages: lang_filter,
                data_types,
                seed,
                resolution: ResolutionRange {
                    min: res_min,
                    max: res_max,
                    step: res_step,
                },
                threads,
                cell_tagged,
                hierarchy_pairs: if adjacent_only {
                    PairSelection::Adjacent
                } else {
                    PairSelection::All
                },
                write_intermediate: !summary_only,
                verbose,
                quiet,
                ..Default::default()
            };

            let summary_path = Path::new(&output)
                .join("summary.json")
                .to_string_lossy()
                .to_string();

            let ok = if quiet {
                run_quiet(&config, &summary_path)
            } else {
                run_with_progress(&config, &summary_path, verbose)
            };
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Simulate {
            path,
            mode,
            seed,
            output,
        } => {
            init_logging(false);
            let mode = match mode {
                ModeArg::TypefreqShuffled => ShuffleMode::TypefreqShuffled,
                ModeArg::Allshuffled => ShuffleMode::Allshuffled,
            };
            let table = match load_table(&path) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error loading table: {e}");
                    std::process::exit(1);
                }
            };
            let output_path = output.unwrap_or_else(|| {
                format!("{}_formatives_{mode}.json", language_from_path(&path))
            });
            let simulated = simulate(&table, mode, seed);
            if let Err(e) = write_json(&simulated.to_file(), Path::new(&output_path)) {
                eprintln!("Error writing output: {e}");
                std::process::exit(1);
            }
            println!(
                "{} {} table written to {}",
                style("✓").green().bold(),
                mode,
                output_path
            );
        }
    }
}

fn run_quiet(config: &AnalysisConfig, summary_path: &str) -> bool {
    match pipeline::run_pipeline(config, None) {
        Ok(result) => {
            if let Err(e) = write_output(&result, summary_path) {
                eprintln!("Error writing output: {e}");
                return false;
            }
            for f in &result.failures {
                eprintln!(
                    "Failed: {} {} at {} ({}): {}",
                    f.language, f.data_type, f.stage, f.kind, f.message
                );
            }
            result.failures.is_empty()
        }
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            false
        }
    }
}

fn run_with_progress(config: &AnalysisConfig, summary_path: &str, verbose: bool) -> bool {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message("Initialising...");
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    let progress: pipeline::ProgressCallback = {
        let pb = pb.clone();
        Box::new(move |_stage, label| {
            pb.set_message(label.to_string());
        })
    };

    let start = Instant::now();
    let result = match pipeline::run_pipeline(config, Some(progress)) {
        Ok(r) => r,
        Err(e) => {
            pb.finish_and_clear();
            eprintln!("Analysis failed: {e}");
            return false;
        }
    };
    pb.finish_and_clear();

    print_summary(&result, start.elapsed().as_secs_f64() * 1000.0, verbose);

    if let Err(e) = write_output(&result, summary_path) {
        eprintln!("Error writing output: {e}");
        return false;
    }

    println!(
        "\n  {} {}",
        style("Output written to:").green(),
        config.output_dir
    );
    result.failures.is_empty()
}

fn print_summary(result: &AnalysisResult, duration_ms: f64, verbose: bool) {
    let mark = if result.failures.is_empty() {
        style("✓").green().bold()
    } else {
        style("!").yellow().bold()
    };
    println!("\n{}  inflectnet analysis", mark);
    for key in ["languages", "units", "resolutions", "hierarchy_records", "skipped_pairs"] {
        println!(
            "  {:<18} {}",
            format!("{}:", key.replace('_', " ")),
            result.stats.get(key).unwrap_or(&serde_json::json!(0))
        );
    }
    println!("  {:<18} {:.1}ms", "duration:", duration_ms);

    if verbose {
        println!("\n  Unit Timings:");
        for unit in &result.units {
            let mut stages: Vec<_> = unit.stage_timings.iter().collect();
            stages.sort_by(|a, b| a.0.cmp(b.0));
            let parts: Vec<String> = stages
                .iter()
                .map(|(stage, secs)| format!("{stage} {:.1}ms", *secs * 1000.0))
                .collect();
            println!(
                "    {:<24} {}",
                format!("{} {}", unit.language, unit.data_type),
                parts.join(", ")
            );
        }
    }

    if !result.failures.is_empty() {
        println!("\n  {}", style("Failures:").red().bold());
        for f in &result.failures {
            println!(
                "    {} {} at {} ({}): {}",
                f.language, f.data_type, f.stage, f.kind, f.message
            );
        }
    }
}
