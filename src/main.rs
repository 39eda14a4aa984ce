use clap::Parser;
use tradesim::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
