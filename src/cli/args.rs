//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Apply named filters and key-triggered zoom snapshots to a video stream
#[derive(Parser, Debug)]
#[command(name = "camera-filters")]
#[command(version, about = "Filter pipeline with key-triggered zoom snapshots", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path (default: ~/.config/camera-filters/filters.toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the filters that would run, in order
    ListFilters {
        /// Restrict to these filters (default: every enabled filter)
        #[arg(short, long, num_args = 1..)]
        filters: Vec<String>,
    },
    /// Run the pipeline over a synthetic test pattern
    Run(RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Filters to apply, in order (default: every enabled filter)
    #[arg(short, long, num_args = 1..)]
    pub filters: Vec<String>,

    /// Frame width
    #[arg(long, default_value = "640")]
    pub width: u32,

    /// Frame height
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// Target frames per second
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Stop after this many frames (default: run until Ctrl+C)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Tap the trigger key every N frames (for runs without a keyboard)
    #[arg(long)]
    pub trigger_every: Option<u64>,

    /// Write the last processed frame to this PNG file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Do not install the global key listener
    #[arg(long)]
    pub no_hotkeys: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filters_defaults() {
        let args = Args::parse_from(["camera-filters", "list-filters"]);
        assert!(args.config.is_none());
        match args.command {
            Command::ListFilters { filters } => assert!(filters.is_empty()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_defaults() {
        let args = Args::parse_from(["camera-filters", "run"]);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!((run.width, run.height, run.fps), (640, 480, 30));
        assert!(run.frames.is_none());
        assert!(run.trigger_every.is_none());
        assert!(run.output.is_none());
        assert!(!run.no_hotkeys);
    }

    #[test]
    fn test_run_filter_list_and_global_config() {
        let args = Args::parse_from([
            "camera-filters",
            "run",
            "--filters",
            "horizontal_flip",
            "zoom_in_effect",
            "--frames",
            "10",
            "--config",
            "/tmp/f.toml",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/f.toml")));
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.filters, vec!["horizontal_flip", "zoom_in_effect"]);
        assert_eq!(run.frames, Some(10));
    }

    #[test]
    fn test_fps_out_of_range_rejected() {
        assert!(Args::try_parse_from(["camera-filters", "run", "--fps", "0"]).is_err());
    }

    #[test]
    fn test_config_actions() {
        let args = Args::parse_from(["camera-filters", "config", "init"]);
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Init
            }
        ));
    }
}
