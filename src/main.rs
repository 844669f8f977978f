use clap::Parser;
use wallflower::cli::SubCommandExtend;
use wallflower::config::{Opts, SubCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Add(config) => config.run(&opts).await,
        SubCommand::Analyze(config) => config.run(&opts).await,
        SubCommand::Duplicates(config) => config.run(&opts).await,
        SubCommand::Similar(config) => config.run(&opts).await,
        SubCommand::Colors(config) => config.run(&opts).await,
        SubCommand::Server(config) => config.run(&opts).await,
    }
}
