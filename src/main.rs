mod cli;

use clap::Parser;
use cli::{Args, Command};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config_path = args.config.as_deref();

    let result: Result<(), Box<dyn std::error::Error>> = match args.command {
        Command::ListFilters { filters } => {
            cli::list_filters(config_path, &filters);
            Ok(())
        }
        Command::Config { action } => {
            cli::handle_config_action(config_path, action).map_err(|e| e.into())
        }
        Command::Run(run) => cli::run_stream(config_path, run),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
