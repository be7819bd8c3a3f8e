//! Command-line arguments for the `vitrine` binary.

use std::path::PathBuf;

use clap::Parser;
use vitrine::AppConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "vitrine")]
#[command(about = "Interactive viewer for JSON-described 3D scenes", long_about = None)]
pub struct Cli {
    /// Scene description file
    #[arg(default_value = "assets/scene.json")]
    pub scene: PathBuf,

    /// Window width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 1000)]
    pub height: u32,

    /// Window title
    #[arg(long, default_value = "Vitrine")]
    pub title: String,
}

impl Cli {
    pub fn app_config(&self) -> AppConfig {
        AppConfig::new()
            .title(self.title.clone())
            .size(self.width, self.height)
    }
}
