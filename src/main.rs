use clap::Parser;
use homepage_app::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    homepage_app::run(args).await
}
