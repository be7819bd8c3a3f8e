mod cli;

use anyhow::Context;
use clap::Parser;

use cli::Cli;
use vitrine::Scene;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Opening scene '{}'", cli.scene.display());

    let scene = Scene::load(&cli.scene);
    vitrine::run(cli.app_config(), scene).context("viewer exited with an error")?;

    Ok(())
}
