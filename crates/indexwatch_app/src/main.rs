use clap::Parser;
use indexwatch_app::cli::Cli;
use indexwatch_app::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::logging::initialize(cli.log, cli.verbose);
    platform::run(cli).await
}
