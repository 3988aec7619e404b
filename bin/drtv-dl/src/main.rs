use clap::Parser;
use drtv_dl::DrtvDlArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = DrtvDlArgs::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    args.run().await
}
