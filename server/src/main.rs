mod config;
mod graphql;
mod http;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use crm::seed::seed_demo;
use crm::{CrmServices, memory_gateway};
use platform_gateway::RecordGateway;
use platform_obs::{ObsConfig, init_tracing};
use tracing::info;

use crate::{
    config::AppConfig,
    graphql::GraphqlData,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "crm-server", version, about = "CRM core server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, env = "CRM_HOST", default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, env = "CRM_PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Populate the record store with demo data before serving")]
    seed_demo: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = Arc::new(AppConfig::load()?);
    init_tracing(ObsConfig::for_service(app_config.service_name.clone()))?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::SchemaPrint { output } => schema_print(output),
    }
}

fn services() -> CrmServices {
    let gateway: Arc<dyn RecordGateway> = Arc::new(memory_gateway());
    CrmServices::new(gateway)
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let target = path.unwrap_or_else(|| PathBuf::from("schema.graphql"));
    let schema = graphql::build_schema(GraphqlData::new(services()));
    std::fs::write(&target, schema.sdl())
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(path = %target.display(), "schema snapshot written");
    Ok(())
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let services = services();
    info!("using in-memory record gateway");
    if cmd.seed_demo || config.seed_demo {
        seed_demo(&services, Utc::now())
            .await
            .context("failed to seed demo data")?;
    }
    let schema = graphql::build_schema(GraphqlData::new(services.clone()));
    let state = AppState {
        schema,
        services,
        config,
    };
    http::serve((&cmd).into(), state).await
}
