use clap::Parser;
use prune::cli;
use prune_core::prune_error;

fn main() {
    let guard = prune_logging::init_subscriber();
    let args = cli::Args::parse();

    let result = cli::execute(args);
    // Flush the file appender before a possible exit.
    drop(guard);

    if let Err(e) = result {
        prune_error!("{e}");
        std::process::exit(1);
    }
}
