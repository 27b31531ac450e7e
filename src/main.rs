use clap::Parser;

use gaps::cli::{self, Cli, Commands, ConfigCommands};
use gaps::logging;

fn main() {
    let args = Cli::parse();
    logging::init(args.verbose);

    let input = &args.input;
    let result = match args.command {
        Commands::Years => cli::report::years(input),
        Commands::Summary => cli::report::summary(input),
        Commands::Monthly => cli::report::monthly(input),
        Commands::Quarterly => cli::report::quarterly(input),
        Commands::Types { types } => cli::report::types(input, &types),
        Commands::Growth {
            types,
            active_types,
        } => cli::report::growth(input, &types, active_types),
        Commands::Weekly => cli::report::weekly(input),
        Commands::Companies { top } => cli::report::companies(input, top),
        Commands::Table { bucket, limit } => cli::tables::run(input, bucket, limit),
        Commands::Dashboard { types, top } => cli::report::dashboard(input, &types, top),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set { key, value } => cli::config::set(&key, &value),
            ConfigCommands::Path => cli::config::path(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
