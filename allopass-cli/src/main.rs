//! Allopass CLI: call any Allopass endpoint from the shell.
//!
//! Loads the same TOML configuration as the library, signs the request, and
//! prints either the verified body or the decoded document as JSON.
//!
//! ```text
//! allopass-cli --config allopass.toml call product-detail id=354926
//! allopass-cli call validate-codes site_id=127042 code=9M7QU457 code=4HT2PL99
//! allopass-cli --plain call onetime-pricing site_id=127042
//! ```

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest"
)]

mod observability;

use std::{path::PathBuf, sync::Arc};

use allopass_kit::{AllopassClient, ApiConfig, Endpoint, ParamValue, Parameters};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::observability::{LogFormat, init_observability};

#[derive(Debug, Parser)]
#[command(name = "allopass-cli")]
#[command(about = "Signed client for the Allopass billing API")]
struct Cli {
    /// Configuration file.
    #[arg(long, short, env = "ALLOPASS_CONFIG", default_value = "allopass.toml")]
    config: PathBuf,

    /// Sign with the account registered under this email.
    #[arg(long, short)]
    account: Option<String>,

    /// Print the verified body instead of the decoded document.
    #[arg(long)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Calls an endpoint with `name=value` parameters.
    ///
    /// Repeating a name sends a list.
    Call {
        /// Endpoint name, e.g. `product-detail`.
        endpoint: Endpoint,
        /// Request parameters.
        #[arg(value_name = "NAME=VALUE")]
        parameters: Vec<String>,
    },
    /// Lists the endpoints with their method and path.
    Endpoints,
    /// Loads and validates the configuration.
    CheckConfig,
}

/// Builds request parameters from `name=value` arguments.
fn parse_parameters(arguments: &[String]) -> Result<Parameters> {
    let mut parameters = Parameters::new();
    for argument in arguments {
        let Some((name, value)) = argument.split_once('=') else {
            bail!("parameter '{argument}' is not of the form name=value");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("parameter '{argument}' has an empty name");
        }

        let merged = match parameters.remove(name) {
            None => ParamValue::from(value),
            Some(ParamValue::List(mut items)) => {
                items.push(value.to_owned());
                ParamValue::List(items)
            }
            Some(previous) => ParamValue::List(vec![previous.canonical(), value.to_owned()]),
        };
        parameters.insert(name, merged);
    }
    Ok(parameters)
}

async fn call(cli: &Cli, endpoint: Endpoint, arguments: &[String]) -> Result<()> {
    let config = ApiConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let mut client = AllopassClient::new(Arc::new(config))?;
    if let Some(email) = &cli.account {
        client = client.with_account(email.clone());
    }

    let parameters = parse_parameters(arguments)?;
    debug!(%endpoint, parameters = parameters.len(), "calling endpoint");

    let response = client.call(endpoint, parameters, !cli.plain).await?;
    if let Some(mapped) = response.as_mapped() {
        println!("{}", serde_json::to_string_pretty(mapped.document())?);
    } else {
        println!("{}", String::from_utf8_lossy(response.body()));
    }
    Ok(())
}

fn list_endpoints() {
    for endpoint in Endpoint::ALL {
        let descriptor = endpoint.descriptor();
        println!("{:<26} {:<5} {}", endpoint.name(), descriptor.method.as_str(), descriptor.path);
    }
}

fn check_config(cli: &Cli) -> Result<()> {
    let config = ApiConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.resolve_account(cli.account.as_deref())?;
    println!("{} ({} account(s), {})", config.base_url(), config.accounts().len(), config.hash());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_observability(LogFormat::from_env());
    let cli = Cli::parse();

    match &cli.command {
        Commands::Call { endpoint, parameters } => call(&cli, *endpoint, parameters).await?,
        Commands::Endpoints => list_endpoints(),
        Commands::CheckConfig => check_config(&cli)?,
    }

    Ok(())
}
