use clap::Parser;
use filesorter::cli::{Args, run_cli};

fn main() {
    let args = Args::parse();
    std::process::exit(run_cli(args));
}
