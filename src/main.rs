use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use edumate::config::API_KEY_ENV;
use edumate::logging::{self, LogTarget};
use edumate::{
    CompletionService, Config, ConversationController, MockCompletion, OpenRouterClient,
    SubmitOutcome, app,
};

#[derive(Parser)]
#[command(name = "edumate")]
#[command(version)]
#[command(about = "EduMate - your AI study buddy in the terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.edumate/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model identifier to request
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Answer locally without calling the completion service
    #[arg(long, global = true)]
    mock: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Ask a single question and print the reply
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn build_service(config: &Config, mock: bool) -> Result<Arc<dyn CompletionService>> {
    if mock {
        return Ok(Arc::new(MockCompletion::new()));
    }
    if !config.has_api_key() {
        bail!(
            "OpenRouter API key not found. Export {API_KEY_ENV}=<your key> or set api_key in the config file (run `edumate config --init` to create one)."
        );
    }
    Ok(Arc::new(OpenRouterClient::new(config)?))
}

async fn ask(controller: &mut ConversationController, question: &str) -> Result<()> {
    if controller.submit(question) == SubmitOutcome::Empty {
        bail!("Nothing to ask: the question is empty");
    }
    if let Some(reply) = controller.next_reply().await {
        println!("{}", reply.content());
    }
    Ok(())
}

fn show_config(path: Option<PathBuf>, model: Option<String>, init: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if init {
        if Config::init(&path)? {
            println!("Wrote default config to {}", path.display());
        } else {
            println!("Config already exists at {}", path.display());
        }
    }

    let mut config = if path.exists() {
        Config::load(Some(&path))?
    } else {
        Config::default()
    };
    if let Some(model) = model {
        config.model = model;
    }

    println!("# {}", path.display());
    println!("{config}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    if let Commands::Config { init } = command {
        return show_config(cli.config, cli.model, init);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    match command {
        Commands::Chat => {
            logging::init(LogTarget::File(&config.log_path()), cli.verbose)?;
            let controller = ConversationController::new(build_service(&config, cli.mock)?);
            app::run(controller).await
        }
        Commands::Ask { question } => {
            logging::init(LogTarget::Stderr, cli.verbose)?;
            let mut controller = ConversationController::new(build_service(&config, cli.mock)?);
            ask(&mut controller, &question.join(" ")).await
        }
        Commands::Config { .. } => Ok(()),
    }
}
