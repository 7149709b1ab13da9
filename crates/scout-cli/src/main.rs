mod run;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use scout_core::AppConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "patent-scout",
    version,
    about = "Harvest patent records from an infinitely scrolling result list"
)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the result list and extract every new entry
    Run(RunArgs),
    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Result-list page to start from
    #[arg(long)]
    url: Option<String>,
    /// Stop after dispatching this many entries
    #[arg(short = 'n', long)]
    limit: Option<usize>,
    /// Append records as JSON lines to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

impl RunArgs {
    /// Command-line flags win over file and environment settings.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.scanning.start_url.clone_from(url);
        }
        if self.limit.is_some() {
            config.scanning.max_items = self.limit;
        }
        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as TOML
    Show,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load()?,
    };
    config.apply_env();
    Ok(config)
}

fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::config_path()?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save_to(&path)?;
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            args.apply(&mut config);
            config.validate()?;

            let summary = run::scan(config).await?;
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Config(ConfigCommand::Init { force }) => {
            let path = init_config(cli.config.as_deref(), force)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Commands::Config(ConfigCommand::Show) => {
            let config = load_config(cli.config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
