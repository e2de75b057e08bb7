//! Certificate batch CLI tool
//!
//! A command-line tool for watermarking, merging and archiving certificate PDFs.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pdf_cert_batch::inputs::{entry_name, expand_globs, read_file};
use pdf_cert_batch::manifest::load_batch;
use pdf_cert_batch::pdf::{apply_watermark, merge_pdfs, PdfDocument};
use pdf_cert_batch::{archive, build_bundle, ArchiveEntry, BundleOptions, OutputMode};

/// Certificate batch - watermark, merge and zip certificate PDFs
#[derive(Parser)]
#[command(name = "cert-batch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Stamp a certificate with a two-line caption
    cert-batch watermark cert.pdf -o stamped.pdf --text \"Lot H-7781\\nShipment WH/OUT/0001\"

    # Merge numbered PDFs in order
    cert-batch merge -o merged.pdf \"[0-9]*.pdf\"

    # Bundle a whole batch as a ZIP
    cert-batch bundle batch.json --zip")]
struct Cli {
    /// Log debug details (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp watermark text on every page of a PDF
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text; a literal "\n" starts the second line
        #[arg(long, default_value = "")]
        text: String,
    },

    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Package PDF files into a ZIP archive, named by file name
    Archive {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output ZIP file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Bundle a batch described by a JSON manifest
    Bundle {
        /// Batch manifest (JSON)
        manifest: PathBuf,

        /// Output path (defaults to the bundle's name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Produce a ZIP of separate PDFs instead of one merged PDF
        #[arg(long)]
        zip: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Watermark { input, output, text } => cmd_watermark(&input, &output, &text),
        Commands::Merge { inputs, output } => cmd_merge(&inputs, &output),
        Commands::Archive { inputs, output } => cmd_archive(&inputs, &output),
        Commands::Bundle { manifest, output, zip } => cmd_bundle(&manifest, output, zip),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

/// Stamp watermark text on a PDF
fn cmd_watermark(input: &Path, output: &Path, text: &str) -> anyhow::Result<()> {
    let source = read_file(input)?;
    let text = text.replace("\\n", "\n");

    let stamped = apply_watermark(&source, &text)
        .with_context(|| format!("watermarking {}", input.display()))?;
    write_output(output, &stamped)?;

    info!(output = %output.display(), "Watermarked");
    Ok(())
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: &[String], output: &Path) -> anyhow::Result<()> {
    let paths = expand_globs(inputs)?;
    info!("Merging {} PDF files...", paths.len());

    let documents = paths
        .iter()
        .map(|path| read_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    let merged = merge_pdfs(&documents)?;
    write_output(output, &merged)?;

    info!(output = %output.display(), "Merged");
    Ok(())
}

/// Zip PDFs under their file names
fn cmd_archive(inputs: &[String], output: &Path) -> anyhow::Result<()> {
    let paths = expand_globs(inputs)?;
    info!("Archiving {} PDF files...", paths.len());

    let mut entries = Vec::with_capacity(paths.len());
    for path in &paths {
        entries.push(ArchiveEntry::new(entry_name(path), read_file(path)?));
    }

    let zipped = archive(&entries)?;
    write_output(output, &zipped)?;

    info!(output = %output.display(), "Archived");
    Ok(())
}

/// Build the merged PDF or ZIP for a batch manifest
fn cmd_bundle(manifest: &Path, output: Option<PathBuf>, zip: bool) -> anyhow::Result<()> {
    let batch = load_batch(manifest)
        .with_context(|| format!("loading manifest {}", manifest.display()))?;

    let options = BundleOptions {
        mode: if zip { OutputMode::Archive } else { OutputMode::Merged },
        ..Default::default()
    };
    let bundle = build_bundle(&batch, &options)?;

    let output = output.unwrap_or_else(|| PathBuf::from(bundle.file_name()));
    write_output(&output, &bundle.data)?;

    println!("{} ({}) -> {}", bundle.name, bundle.mime_type, output.display());
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> anyhow::Result<()> {
    let bytes = read_file(input)?;
    let info = PdfDocument::from_bytes(&entry_name(input), &bytes)?.info()?;

    println!("File: {}", input.display());
    println!("Pages: {}", info.page_count);

    if let Some(title) = info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = info.author {
        println!("Author: {}", author);
    }
    for page in info.pages {
        println!(
            "  Page {}: {} x {} pt, rotated {}",
            page.number,
            page.width,
            page.height,
            page.rotation.degrees()
        );
    }

    Ok(())
}
