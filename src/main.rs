use clap::Parser;
use trailstop::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
