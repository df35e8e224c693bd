use bluejay::cli::{Cli, Commands};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    bluejay::cli::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Lock {
            ref source,
            ref vault,
            ref revision,
        } => bluejay::cli::commands::lock::execute(source, vault.as_deref(), revision.as_deref()),
        Commands::Unlock {
            ref destination,
            ref vault,
            latest,
        } => bluejay::cli::commands::unlock::execute(destination, vault.as_deref(), latest),
        Commands::List {
            ref vault,
            ref format,
        } => bluejay::cli::commands::list::execute(vault.as_deref(), format),
        Commands::Completions { shell } => bluejay::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        bluejay::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
