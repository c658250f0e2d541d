use clap::Parser;
use log::info;

mod args;
mod plv;

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!("args: {:?}", args);

    if let Err(e) = plv::run_election_cli(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
