use clap::Parser;
use log::info;
use rayon::ThreadPoolBuilder;
use seal::commands::{merge::run_merge, pair_reads::run_pair_reads, read_sort::run_read_sort};
use seal::config::{MergeConfig, PairReadsConfig, PairingConfig, ReadSortConfig};
use seal::pair_reducer::DEFAULT_MIN_BASES_THRESHOLD;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN))]
    threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Prepare and sort sequencing reads around alignment.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Pair the two mate reads of each fragment from qseq files
    PairReads {
        #[clap(flatten)]
        common: CommonOpts,

        /// qseq input files or directories
        #[clap(required = true, value_parser)]
        inputs: Vec<PathBuf>,

        /// Output directory (must not exist)
        #[clap(short = 'o', long, value_parser)]
        output: PathBuf,

        /// Number of output shards [default: number of threads]
        #[clap(short = 'r', long, value_parser)]
        reducers: Option<NonZeroUsize>,

        /// Minimum number of known bases a read must have
        #[clap(long, value_parser, default_value_t = DEFAULT_MIN_BASES_THRESHOLD)]
        min_bases_per_read: usize,

        /// Keep reads that did not pass the base-caller's filter
        #[clap(long, action)]
        no_drop_failed_filter: bool,
    },
    /// Sort aligned SAM records by reference coordinate into shards
    Sort {
        #[clap(flatten)]
        common: CommonOpts,

        /// Reference annotation (BWA .ann or samtools .fai)
        #[clap(short = 'a', long = "annotations", value_parser)]
        annotations: Option<PathBuf>,

        /// SAM input files or directories
        #[clap(required = true, value_parser)]
        inputs: Vec<PathBuf>,

        /// Output directory (must not exist)
        #[clap(short = 'o', long, value_parser)]
        output: PathBuf,

        /// Number of output shards [default: number of threads]
        #[clap(short = 'r', long, value_parser)]
        reducers: Option<NonZeroUsize>,
    },
    /// Merge sorted shards into a single SAM file with a header
    Merge {
        #[clap(flatten)]
        common: CommonOpts,

        /// Reference annotation (BWA .ann or samtools .fai)
        #[clap(short = 'a', long = "annotations", value_parser)]
        annotations: Option<PathBuf>,

        /// Sorted shard directory or file
        #[clap(value_parser)]
        input: PathBuf,

        /// Output SAM file (must not exist), or '-' for stdout
        #[clap(short = 'o', long, value_parser)]
        output: PathBuf,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::PairReads {
            common,
            inputs,
            output,
            reducers,
            min_bases_per_read,
            no_drop_failed_filter,
        } => {
            initialize(&common);
            let config = PairReadsConfig {
                shard_count: reducers.unwrap_or(common.threads).get(),
                threads: common.threads,
                pairing: PairingConfig {
                    min_bases_threshold: min_bases_per_read,
                    drop_failed_filter: !no_drop_failed_filter,
                },
            };
            let counters = run_pair_reads(&inputs, &output, &config)?;
            println!("{}", counters);
        }
        Args::Sort {
            common,
            annotations,
            inputs,
            output,
            reducers,
        } => {
            initialize(&common);
            let config = ReadSortConfig {
                annotation_path: annotations,
                shard_count: reducers.unwrap_or(common.threads).get(),
                threads: common.threads,
            };
            run_read_sort(&inputs, &output, &config)?;
        }
        Args::Merge {
            common,
            annotations,
            input,
            output,
        } => {
            initialize(&common);
            let config = MergeConfig {
                annotation_path: annotations,
            };
            run_merge(&input, &output, &config)?;
        }
    }

    info!("done");
    Ok(())
}

/// Initialize logger and thread pool based on common options
fn initialize(common: &CommonOpts) {
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(common.threads.into())
        .build_global()
    {
        log::warn!("Failed to configure thread pool: {}", e);
    }
}
