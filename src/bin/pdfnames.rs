use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_name_filter::{
    ContentMode, FilterOptions, HeaderMode, NamesSource, OutputConfig, PageSelection,
    QualityMode, RunConfig, RunReport, SheetPreview, convert_document, filter_document,
    inspect_spreadsheet,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdfnames",
    version,
    about = "Keep the PDF pages that mention a list of names; export them as PDF, CSV and Markdown"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Filter a PDF down to the pages that mention any name.
    Filter(FilterArgs),
    /// Extract every page of a PDF to CSV and/or Markdown.
    Convert(ConvertArgs),
    /// Show the columns and first rows of a names spreadsheet.
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HeaderArg {
    First,
    Positional,
    Auto,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// How to read the first row of detected tables.
    #[arg(long, value_enum, default_value_t = HeaderArg::First)]
    header: HeaderArg,

    /// Drop low-confidence tables instead of exporting them.
    #[arg(long)]
    skip_ambiguous: bool,

    /// Never detect tables; export page text only.
    #[arg(long)]
    text_only: bool,

    /// Minimum cells required per candidate table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Share of page lines that must be table rows to export a page as tables.
    #[arg(long, default_value_t = 0.5)]
    min_table_coverage: f32,

    /// Log progress every N pages (0 disables it).
    #[arg(long, default_value_t = 50)]
    progress_every: usize,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Add a leading page column to the CSV.
    #[arg(long)]
    page_column: bool,

    /// Add a table_id column to the CSV.
    #[arg(long)]
    table_column: bool,

    /// Top-level Markdown heading.
    #[arg(long)]
    title: Option<String>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Directory for outputs without an explicit path.
    #[arg(short, long, env = "PDFNAMES_OUTPUT_DIR", default_value = "Resultados")]
    output_dir: PathBuf,

    /// CSV output path.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Markdown output path.
    #[arg(long)]
    markdown: Option<PathBuf>,

    /// Do not write the CSV file.
    #[arg(long)]
    no_csv: bool,

    /// Do not write the Markdown file.
    #[arg(long)]
    no_markdown: bool,

    /// Write a JSON run summary to this path.
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Input PDF path.
    #[arg(short, long, env = "PDFNAMES_PDF")]
    pdf: PathBuf,

    /// Spreadsheet (.xlsx, .xls, .ods, .csv) holding the names.
    #[arg(short, long, env = "PDFNAMES_NAMES", required_unless_present = "name")]
    names: Option<PathBuf>,

    /// Name column; defaults to NOME_QGC or the first column containing "nome".
    #[arg(long, requires = "names")]
    column: Option<String>,

    /// A name to search for. Repeatable; takes precedence over --names and
    /// PDFNAMES_NAMES.
    #[arg(long = "name")]
    name: Vec<String>,

    /// Filtered PDF output path.
    #[arg(long = "pdf-out")]
    pdf_out: Option<PathBuf>,

    /// Do not write the filtered PDF.
    #[arg(long)]
    no_pdf: bool,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    extract: ExtractArgs,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input PDF path.
    #[arg(short, long, env = "PDFNAMES_PDF")]
    pdf: PathBuf,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    extract: ExtractArgs,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Spreadsheet to inspect.
    #[arg(env = "PDFNAMES_NAMES")]
    names: PathBuf,
}

fn parse_options(args: &ExtractArgs) -> Result<FilterOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .context("failed to parse --pages")?;

    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }

    let mut options = FilterOptions {
        pages,
        header_mode: match args.header {
            HeaderArg::First => HeaderMode::HasHeader,
            HeaderArg::Positional => HeaderMode::NoHeader,
            HeaderArg::Auto => HeaderMode::AutoDetect,
        },
        quality_mode: if args.skip_ambiguous {
            QualityMode::SkipAmbiguous
        } else {
            QualityMode::BestEffort
        },
        content_mode: if args.text_only {
            ContentMode::TextOnly
        } else {
            ContentMode::TablesThenText
        },
        min_cols: args.min_cols,
        min_table_coverage: args.min_table_coverage,
        progress_every: args.progress_every,
        delimiter: args.delimiter as u8,
        include_page_column: args.page_column,
        include_table_column: args.table_column,
        ..FilterOptions::default()
    };
    if let Some(title) = &args.title {
        options.markdown_title.clone_from(title);
    }
    Ok(options)
}

fn output_config(args: &OutputArgs) -> OutputConfig {
    OutputConfig {
        write_csv: !args.no_csv,
        write_markdown: !args.no_markdown,
        csv_path: args.csv.clone(),
        markdown_path: args.markdown.clone(),
        summary_path: args.summary.clone(),
        ..OutputConfig::new(&args.output_dir)
    }
}

fn run_filter(args: &FilterArgs) -> Result<RunReport> {
    let names = match &args.names {
        Some(path) if args.name.is_empty() => NamesSource::Spreadsheet {
            path: path.clone(),
            column: args.column.clone(),
        },
        _ => NamesSource::Explicit(args.name.clone()),
    };

    let mut config = RunConfig::new(&args.pdf, names, &args.output.output_dir);
    config.output = OutputConfig {
        write_pdf: !args.no_pdf,
        pdf_path: args.pdf_out.clone(),
        ..output_config(&args.output)
    };
    config.options = parse_options(&args.extract)?;

    filter_document(&config)
        .with_context(|| format!("failed to filter '{}'", args.pdf.display()))
}

fn run_convert(args: &ConvertArgs) -> Result<RunReport> {
    let options = parse_options(&args.extract)?;
    convert_document(&args.pdf, &output_config(&args.output), &options)
        .with_context(|| format!("failed to convert '{}'", args.pdf.display()))
}

fn print_report(report: &RunReport, label: &str) {
    println!(
        "{label}: {} of {} pages ({} scanned)",
        report.match_count(),
        report.total_pages,
        report.scanned_pages
    );
    if let Some(column) = &report.name_column {
        println!("names: {} from column '{column}'", report.name_count);
    }
    if report.match_count() == 0 {
        println!("no matching pages; nothing written");
    }
    for output in &report.outputs {
        println!("saved {:?}: {} ({} items)", output.kind, output.path.display(), output.items);
    }
    if !report.warnings.is_empty() {
        println!("warnings: {}", report.warnings.len());
        for warning in &report.warnings {
            println!(
                "  - {:?} page={:?} table_id={:?}: {}",
                warning.code, warning.page, warning.table_id, warning.message
            );
        }
    }
    println!("done in {:.1}s", report.elapsed_ms as f64 / 1000.0);
}

fn print_preview(preview: &SheetPreview) {
    println!("columns: {:?}", preview.columns);
    println!("first {} rows:", preview.head.len());
    for row in &preview.head {
        println!("  {}", row.join(" | "));
    }
    println!("total rows: {}", preview.total_rows);
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pdf_name_filter=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Filter(args) => run_filter(args).map(|report| print_report(&report, "matched")),
        Commands::Convert(args) => {
            run_convert(args).map(|report| print_report(&report, "converted"))
        }
        Commands::Inspect(args) => inspect_spreadsheet(&args.names)
            .with_context(|| format!("failed to read '{}'", args.names.display()))
            .map(|preview| print_preview(&preview)),
    };

    // Failures are reported, not signalled: the process always ends normally.
    if let Err(error) = outcome {
        eprintln!("error: {error:#}");
    }
}
