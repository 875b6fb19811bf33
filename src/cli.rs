use crate::{
    cli::spinner::Spinner,
    client::Client,
    config::{self, Config, ConfigError},
};
use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use indicatif::MultiProgress;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

pub mod input;
mod spinner;

/// Upload images to a configurable HTTP endpoint and print the resulting
/// URLs, one line per file.
///
/// Upload targets are read from `~/.iu`, which is created with an empty
/// placeholder target on first run.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The files to upload. Paths that don't exist are skipped.
    pub files: Vec<PathBuf>,

    /// Path to the config file (defaults to `~/.iu`)
    #[arg(short, long, env = "IU_CONFIG", hide_env = true)]
    pub config: Option<PathBuf>,

    /// Use this uploader instead of the config's `Active` one
    #[arg(short, long)]
    pub uploader: Option<String>,

    /// Give up on a request after this many seconds. Waits forever by default.
    #[arg(long)]
    pub timeout: Option<u64>,

    // Parse --verbose and --quiet flags. Default to INFO log level.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Cli {
    pub fn run(self, progress: &MultiProgress) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => config::default_path().ok_or(ConfigError::NoHome)?,
        };

        Config::ensure_exists(&config_path).with_context(|| {
            format!("Failed to initialize config at {}", config_path.display())
        })?;
        let config = Config::load_from_path(&config_path).with_context(|| {
            format!("Failed to load config from {}", config_path.display())
        })?;

        let name = self.uploader.as_deref().unwrap_or(&config.active);
        let target = config.target(name)?;
        debug!("Using uploader {name}");

        if target.url.is_empty() {
            warn!(
                "Uploader {name} has no URL; edit {} to set one",
                config_path.display()
            );
        }

        let files = input::filter_existing(&self.files);
        if files.is_empty() {
            info!("Nothing to upload");
            return Ok(());
        }

        let client = Client::new(self.timeout.map(Duration::from_secs));
        let total = files.len();
        let urls = {
            let sp = Spinner::new(progress);
            let mut index = 0;
            client.upload_all(&files, target, |path| {
                index += 1;
                sp.uploading(index, total, path);
            })
        };

        println!("{}", urls.join("\n"));
        Ok(())
    }
}
