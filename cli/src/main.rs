//! pdftree CLI - PDF to section-nested JSON

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdftree::{
    convert_file, process_files, to_json, ContentExtractor, ExtractionStats, JsonFormat, Options,
    PageSelection, ParseOptions, PdfParser, Pipeline, ProfileOptions,
};

#[derive(Parser)]
#[command(name = "pdftree")]
#[command(version)]
#[command(about = "Extract a section-nested JSON tree from PDF documents", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output JSON file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    extract: ExtractArgs,

    /// Print extraction statistics
    #[arg(long)]
    stats: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every command that builds a tree.
#[derive(Args, Clone)]
struct ExtractArgs {
    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Treat bold body-size text as a heading when bold spans outnumber
    /// plain ones at that size by more than this ratio
    #[arg(long, value_name = "RATIO", env = "PDFTREE_BOLD_RATIO")]
    bold_ratio: Option<f32>,

    /// Deepest heading level to emit
    #[arg(long, value_name = "LEVEL")]
    max_heading: Option<u8>,

    /// Disable table detection
    #[arg(long)]
    no_tables: bool,

    /// Disable image/chart detection
    #[arg(long)]
    no_images: bool,

    /// Read pages as a single column
    #[arg(long)]
    no_columns: bool,
}

impl ExtractArgs {
    fn options(&self) -> Result<Options, Box<dyn std::error::Error>> {
        let pages = match &self.pages {
            Some(p) => PageSelection::parse(p)?,
            None => PageSelection::All,
        };
        let format = if self.compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };

        Ok(Options::new()
            .with_parse(
                ParseOptions::new()
                    .with_pages(pages)
                    .with_tables(!self.no_tables)
                    .with_images(!self.no_images)
                    .with_columns(!self.no_columns),
            )
            .with_profile(
                ProfileOptions::new()
                    .with_bold_promotion(self.bold_ratio)
                    .with_max_heading_level(self.max_heading),
            )
            .with_format(format))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert several PDFs in parallel
    Batch {
        /// Input PDF files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the <stem>.json outputs
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,

        /// Print statistics summed over the converted documents
        #[arg(long)]
        stats: bool,
    },

    /// Show page count and inferred heading sizes
    Info {
        /// Input PDF file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Some(Commands::Batch {
            inputs,
            out_dir,
            extract,
            stats,
        }) => cmd_batch(&inputs, &out_dir, &extract, stats),
        Some(Commands::Info { input }) => cmd_info(&input),
        None => match (cli.input, cli.output) {
            (Some(input), Some(output)) => cmd_convert(&input, &output, &cli.extract, cli.stats),
            (Some(_), None) => Err("missing OUTPUT path".into()),
            _ => {
                println!("{}", "Usage: pdftree <INPUT> <OUTPUT>".yellow());
                println!("       pdftree --help for more information");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    args: &ExtractArgs,
    show_stats: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = args.options()?;
    log::debug!("Options: {:?}", options);

    let pb = spinner(format!("Extracting {}...", input.display()));
    let extraction = convert_file(input, output, &options);
    pb.finish_and_clear();
    let extraction = extraction?;

    println!("{} {}", "Saved to".green(), output.display());
    if !extraction.warnings.is_empty() {
        println!(
            "{} {} recovered warnings (use -v for details)",
            "Note:".yellow(),
            extraction.warnings.len()
        );
    }
    if show_stats {
        print_stats(&extraction.stats);
    }

    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    out_dir: &Path,
    args: &ExtractArgs,
    show_stats: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = args.options()?;
    fs::create_dir_all(out_dir)?;

    let pb = spinner(format!("Processing {} documents...", inputs.len()));
    let results = process_files(inputs, &options);
    pb.finish_and_clear();

    let mut failed = 0;
    let mut totals = ExtractionStats::default();
    for (input, result) in inputs.iter().zip(results) {
        let written = result.and_then(|extraction| {
            let json = to_json(&extraction.tree, options.format)?;
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            let path = out_dir.join(format!("{}.json", stem));
            fs::write(&path, json)?;
            totals.merge(&extraction.stats);
            Ok(path)
        });

        match written {
            Ok(path) => println!("  {} {}", "✓".green(), path.display()),
            Err(e) => {
                log::debug!("{}: {:?}", input.display(), e);
                failed += 1;
                println!("  {} {}: {}", "✗".red(), input.display(), e);
            }
        }
    }

    if show_stats {
        print_stats(&totals);
    }

    if failed > 0 {
        return Err(format!("{} of {} documents failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let parser = PdfParser::open(input)?;
    let profile = Pipeline::default().profile(&parser)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), parser.version());
    println!("{}: {}", "Pages".bold(), parser.page_count());

    println!();
    println!("{}", "Font Profile".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    match profile.body_size() {
        Some(size) => println!("{}: {:.1}pt", "Body size".bold(), size),
        None => println!("{}: {}", "Body size".bold(), "no text".dimmed()),
    }
    for (size, level) in profile.heading_sizes() {
        println!("  {} level {}: {:.1}pt", "├─".dimmed(), level, size);
    }

    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_stats(stats: &ExtractionStats) {
    println!();
    println!("{}", "Extraction Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Pages".bold(), stats.page_count);
    println!("{}: {}", "Sections".bold(), stats.section_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Charts".bold(), stats.chart_count);
    println!("{}: {}", "Dropped spans".bold(), stats.dropped_span_count);
    println!("{}: {}", "Warnings".bold(), stats.warning_count);
    println!("{}: {}", "Words".bold(), stats.word_count);
}
