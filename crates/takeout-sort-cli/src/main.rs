use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use takeout_sort_core::{ArchiveOptions, MergeOptions, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR};

#[derive(Parser)]
#[command(
    name = "takeout-sort",
    version,
    about = "Merge photo export sidecars into media files and archive them by date"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pair media with their JSON sidecars and write <epoch>_<name> copies
    Merge {
        /// Directory with the exported media
        #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
        source: PathBuf,

        /// Directory with the sidecar JSON files (default: same as --source)
        #[arg(long)]
        sidecars: Option<PathBuf>,

        /// Flat output directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Ignore sidecars already in the output directory when matching
        #[arg(long)]
        source_sidecars_only: bool,
    },
    /// Move files of a flat directory into <year>/<month> folders
    Archive {
        /// Directory to archive in place
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
}

/// Log lines are "LEVEL\tmessage". Info by default, one step finer per -v.
fn configure_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}\t{}", record.level(), record.args()))
        .init();
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(0).with_style(style)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    configure_logging(cli.verbose);
    let t_total = std::time::Instant::now();

    let bar = progress_bar();
    let on_progress = |_stage: &str, current: u64, total: u64, message: &str| {
        bar.set_length(total);
        bar.set_position(current + 1);
        bar.set_message(message.to_string());
    };

    match cli.command {
        Command::Merge {
            source,
            sidecars,
            output,
            source_sidecars_only,
        } => {
            let options = MergeOptions {
                sidecar_dir: sidecars.unwrap_or_else(|| source.clone()),
                source_dir: source,
                output_dir: output,
                include_output_sidecars: !source_sidecars_only,
            };
            let report = takeout_sort_core::merge(&options, &on_progress)?;
            bar.finish_and_clear();
            eprintln!(
                "Done! {} media files: {} merged, {} without sidecar, {} without timestamp, {} already merged, {} failed ({:.2}s)",
                report.total_media,
                report.merged,
                report.no_sidecar,
                report.no_timestamp,
                report.already_merged,
                report.failed,
                t_total.elapsed().as_secs_f64()
            );
        }
        Command::Archive { output } => {
            let report = takeout_sort_core::archive(&ArchiveOptions::new(output), &on_progress)?;
            bar.finish_and_clear();
            eprintln!(
                "Done! {} media files: {} moved, {} without date, {} failed ({:.2}s)",
                report.total_media,
                report.moved,
                report.unresolved,
                report.failed,
                t_total.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
