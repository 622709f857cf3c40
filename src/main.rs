use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use utr_extract::catalog::AttributeKeys;
use utr_extract::pipeline::{extract_utrs, process_annotation, run_pipeline, write_stats_json};

const KEY_FLAGS_NOTE: &str = "Positional arguments go first: the key and feature-type flags \
take one or more values and consume every value that follows them.";

/// Classify UTRs in a GTF annotation and extract their sequences.
#[derive(Parser, Debug)]
#[command(name = "utr-extract")]
#[command(author, version, about)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-classify generic UTR rows as 5'/3' UTRs and write a processed GTF
    #[command(after_help = KEY_FLAGS_NOTE)]
    Process(ProcessArgs),

    /// Extract 5'/3' UTR sequences from a processed GTF and a reference FASTA
    Extract(ExtractArgs),

    /// Run process then extract, through an intermediate GTF
    #[command(after_help = KEY_FLAGS_NOTE)]
    Pipeline(PipelineArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input annotation (.gtf or .gtf.gz)
    input_gtf: PathBuf,

    /// Output processed GTF
    output_gtf: PathBuf,

    #[command(flatten)]
    keys: KeyArgs,

    /// Write run statistics as JSON
    #[arg(long, value_name = "PATH")]
    stats_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Processed GTF with five_prime_utr/three_prime_utr rows
    gtf: PathBuf,

    /// Reference genome (.fa or .fa.gz)
    fasta: PathBuf,

    /// Output FASTA
    output: PathBuf,

    /// Write run statistics as JSON
    #[arg(long, value_name = "PATH")]
    stats_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Input annotation (.gtf or .gtf.gz)
    input_gtf: PathBuf,

    /// Reference genome (.fa or .fa.gz)
    fasta: PathBuf,

    /// Output FASTA
    output: PathBuf,

    /// Keep the intermediate processed GTF at this path
    #[arg(long, value_name = "PATH")]
    temp_gtf: Option<PathBuf>,

    #[command(flatten)]
    keys: KeyArgs,

    /// Write run statistics as JSON
    #[arg(long, value_name = "PATH")]
    stats_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Attribute keys for gene ID (repeatable)
    #[arg(
        long = "gene-id-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["gene_id".to_string()]
    )]
    gene_id_keys: Vec<String>,

    /// Attribute keys for gene name (repeatable)
    #[arg(
        long = "gene-name-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["gene_name".to_string(), "Name".to_string()]
    )]
    gene_name_keys: Vec<String>,

    /// Attribute keys for transcript ID (repeatable)
    #[arg(
        long = "transcript-id-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["transcript_id".to_string()]
    )]
    transcript_id_keys: Vec<String>,

    /// Attribute keys for gene biotype (repeatable)
    #[arg(
        long = "gene-type-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["gene_type".to_string(), "gene_biotype".to_string()]
    )]
    gene_type_keys: Vec<String>,

    /// Attribute keys for transcript biotype (repeatable)
    #[arg(
        long = "transcript-type-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["transcript_type".to_string(), "transcript_biotype".to_string()]
    )]
    transcript_type_keys: Vec<String>,

    /// Gene/transcript types to keep (repeatable)
    #[arg(
        long = "coding-type",
        value_name = "TYPE",
        num_args = 1..,
        default_values_t = vec!["protein_coding".to_string()]
    )]
    coding_types: Vec<String>,

    /// Feature types read as unclassified UTRs (repeatable)
    #[arg(
        long = "utr-feature-type",
        value_name = "TYPE",
        num_args = 1..,
        default_values_t = vec![
            "UTR".to_string(),
            "five_prime_utr".to_string(),
            "three_prime_utr".to_string()
        ]
    )]
    utr_feature_types: Vec<String>,

    /// Feature types read as CDS (repeatable)
    #[arg(
        long = "cds-feature-type",
        value_name = "TYPE",
        num_args = 1..,
        default_values_t = vec!["CDS".to_string()]
    )]
    cds_feature_types: Vec<String>,

    /// Feature types read as exons (repeatable)
    #[arg(
        long = "exon-feature-type",
        value_name = "TYPE",
        num_args = 1..,
        default_values_t = vec!["exon".to_string()]
    )]
    exon_feature_types: Vec<String>,
}

impl From<KeyArgs> for AttributeKeys {
    fn from(args: KeyArgs) -> Self {
        AttributeKeys {
            gene_id_keys: args.gene_id_keys,
            gene_name_keys: args.gene_name_keys,
            transcript_id_keys: args.transcript_id_keys,
            gene_type_keys: args.gene_type_keys,
            transcript_type_keys: args.transcript_type_keys,
            coding_types: args.coding_types,
            utr_feature_types: args.utr_feature_types,
            cds_feature_types: args.cds_feature_types,
            exon_feature_types: args.exon_feature_types,
        }
    }
}

fn require_file(kind: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{} file not found: {}", kind, path.display());
    }
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Warn,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG still overrides
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.cmd {
        Command::Process(args) => {
            require_file("Input GTF", &args.input_gtf)?;

            let stats = process_annotation(&args.input_gtf, &args.output_gtf, args.keys.into())?;
            print!("{stats}");

            if let Some(path) = &args.stats_json {
                write_stats_json(path, &stats)?;
            }
            eprintln!("Processed GTF written to {}", args.output_gtf.display());
        }

        Command::Extract(args) => {
            require_file("GTF", &args.gtf)?;
            require_file("FASTA", &args.fasta)?;

            let stats = extract_utrs(&args.gtf, &args.fasta, &args.output)?;
            print!("{stats}");

            if let Some(path) = &args.stats_json {
                write_stats_json(path, &stats)?;
            }
            eprintln!("UTR sequences written to {}", args.output.display());
        }

        Command::Pipeline(args) => {
            require_file("Input GTF", &args.input_gtf)?;
            require_file("FASTA", &args.fasta)?;

            let stats = run_pipeline(
                &args.input_gtf,
                &args.fasta,
                &args.output,
                args.temp_gtf.as_deref(),
                args.keys.into(),
            )?;
            print!("{stats}");

            if let Some(path) = &args.stats_json {
                write_stats_json(path, &stats)?;
            }
            if let Some(tmp) = &args.temp_gtf {
                eprintln!("Intermediate GTF kept at {}", tmp.display());
            }
            eprintln!("UTR sequences written to {}", args.output.display());
        }
    }

    Ok(())
}
