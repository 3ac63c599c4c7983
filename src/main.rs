// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use posefit::cli::args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            if let Err(e) = posefit::cli::run::run_session(&args) {
                posefit::error!("{e}");
                std::process::exit(1);
            }
        }
    }
}
