//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod list;
pub mod say;
pub mod settings;


use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::cli::chat::run_chat;
use crate::cli::list::list_endpoints;
use crate::cli::say::run_say;
use crate::cli::settings::{run_endpoint_command, run_model_command};
use crate::core::chat_stream::ChatClient;
use crate::core::config::data::path_display;
use crate::core::config::{ConfigStore, Configuration, FileSettingsStore};
use crate::core::constants::SETTINGS_KEY;
use crate::core::conversation::generate_title;
use crate::core::selection::{Selection, SelectionError};
use crate::logging::init_tracing;

#[derive(Parser)]
#[command(name = "sparkle", version)]
#[command(about = "Chat with Azure OpenAI deployments from the terminal")]
#[command(
    long_about = "Sparkle talks to chat deployments hosted on one or more Azure OpenAI \
endpoints. Endpoints and their models are kept in a local settings file; replies from \
streaming deployments are printed as they arrive.\n\n\
Getting started:\n\
  sparkle endpoint add Main https://my-resource.openai.azure.com --api-key <KEY>\n\
  sparkle model add Main \"GPT-4o\" gpt-4o-deployment --title-default\n\
  sparkle say \"Hello there\"\n\n\
Environment Variables:\n\
  SPARKLE_CONFIG_DIR   Directory holding the settings file\n\
  SPARKLE_API_KEY      API key for 'endpoint add' when --api-key is omitted\n\
  RUST_LOG             Overrides the diagnostic log filter"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the settings file
    #[arg(long, global = true, env = "SPARKLE_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured endpoints and their models
    List,
    /// Add, update, rename or remove endpoints
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommands,
    },
    /// Add, update, rename or remove models of an endpoint
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// Send a single prompt and print the reply
    Say {
        /// Endpoint id or name (defaults to the first endpoint)
        #[arg(short = 'e', long)]
        endpoint: Option<String>,
        /// Model id or name (defaults to the endpoint's first model)
        #[arg(short = 'm', long)]
        model: Option<String>,
        /// Prompt text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Generate a short title for a first chat message
    Title {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Start a line-oriented chat session on stdin
    Chat {
        /// Endpoint id or name (defaults to the first endpoint)
        #[arg(short = 'e', long)]
        endpoint: Option<String>,
        /// Model id or name (defaults to the endpoint's first model)
        #[arg(short = 'm', long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EndpointCommands {
    /// Add an endpoint
    Add {
        name: String,
        /// Resource URL, e.g. https://my-resource.openai.azure.com
        base_url: String,
        #[arg(long, env = "SPARKLE_API_KEY", hide_env_values = true)]
        api_key: String,
    },
    /// Change an endpoint's name, URL or key
    Update {
        /// Endpoint id or name
        endpoint: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Rename an endpoint
    Rename {
        /// Endpoint id or name
        endpoint: String,
        name: String,
    },
    /// Remove an endpoint and all of its models
    Remove {
        /// Endpoint id or name
        endpoint: String,
    },
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Add a model to an endpoint
    Add {
        /// Endpoint id or name
        endpoint: String,
        /// Display name
        name: String,
        /// Deployment name used in the request URL
        deployment: String,
        /// Read replies in one piece instead of streaming them
        #[arg(long)]
        no_streaming: bool,
        /// Use this model to generate chat titles
        #[arg(long)]
        title_default: bool,
        #[arg(long, value_name = "VERSION")]
        api_version: Option<String>,
    },
    /// Change a model's deployment or flags
    Update {
        /// Endpoint id or name
        endpoint: String,
        /// Model id or name
        model: String,
        #[arg(long)]
        deployment: Option<String>,
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        streaming: Option<bool>,
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        title_default: Option<bool>,
        #[arg(long, value_name = "VERSION")]
        api_version: Option<String>,
    },
    /// Rename a model
    Rename {
        /// Endpoint id or name
        endpoint: String,
        /// Model id or name
        model: String,
        name: String,
    },
    /// Remove a model
    Remove {
        /// Endpoint id or name
        endpoint: String,
        /// Model id or name
        model: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(err) = runtime.block_on(async_main(args)) {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let mut store = load_store(args.config_dir)?;
    let mut stdout = std::io::stdout();

    match args.command {
        Commands::List => {
            list_endpoints(store.configuration(), &mut stdout)?;
            println!();
            println!("Settings file: {}", settings_location(&store));
        }
        Commands::Endpoint { command } => {
            let message = run_endpoint_command(&mut store, command)?;
            println!("{message}");
        }
        Commands::Model { command } => {
            let message = run_model_command(&mut store, command)?;
            println!("{message}");
        }
        Commands::Say {
            endpoint,
            model,
            prompt,
        } => {
            let selection =
                resolve_selection(store.configuration(), endpoint.as_deref(), model.as_deref())?;
            run_say(&ChatClient::new(), &selection, &prompt.join(" ")).await?;
        }
        Commands::Title { message } => {
            let title =
                generate_title(&ChatClient::new(), store.configuration(), &message.join(" "))
                    .await;
            println!("{title}");
        }
        Commands::Chat { endpoint, model } => {
            let selection =
                resolve_selection(store.configuration(), endpoint.as_deref(), model.as_deref())?;
            run_chat(store.configuration(), selection).await?;
        }
    }

    Ok(())
}

fn load_store(config_dir: Option<PathBuf>) -> Result<ConfigStore<FileSettingsStore>, Box<dyn Error>> {
    let settings = match config_dir {
        Some(dir) => FileSettingsStore::new(dir),
        None => FileSettingsStore::in_default_location()
            .ok_or("Could not determine a configuration directory; pass --config-dir")?,
    };
    Ok(ConfigStore::load(settings))
}

fn settings_location(store: &ConfigStore<FileSettingsStore>) -> String {
    path_display(store.settings().path_for(SETTINGS_KEY))
}

/// Start from the first endpoint and its first model, then apply any
/// `-e`/`-m` overrides.
pub fn resolve_selection(
    config: &Configuration,
    endpoint: Option<&str>,
    model: Option<&str>,
) -> Result<Selection, SelectionError> {
    let mut selection = Selection::first_available(config);
    if let Some(endpoint) = endpoint {
        selection.select_endpoint(config, endpoint)?;
    }
    if let Some(model) = model {
        selection.select_model(model)?;
    }
    Ok(selection)
}

/// Cancel `cancel` on the first Ctrl+C. Abort the handle once the guarded
/// request has finished.
pub(crate) fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}
