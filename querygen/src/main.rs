use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use querygen::config::{AppConfig, ConfigOverrides};
use querygen::db::{ConnectionDescriptor, MySqlConnector};
use querygen::llm::OpenRouterClient;
use querygen::sql::sanitize_sql;
use querygen::web::{self, state::AppState};
use querygen::{QueryPipeline, QueryRequest};

#[derive(Parser)]
#[command(name = "querygen")]
#[command(about = "Ask a MySQL database questions in plain language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the nearest .querygen.toml)
    #[arg(long, env = "QUERYGEN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Provider API key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model to use
    #[arg(long, env = "QUERYGEN_MODEL", global = true)]
    model: Option<String>,

    /// Chat-completion endpoint
    #[arg(long, env = "QUERYGEN_LLM_URL", global = true)]
    llm_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "QUERYGEN_HOST")]
        host: Option<String>,
        /// Port to listen on
        #[arg(long, env = "QUERYGEN_PORT")]
        port: Option<u16>,
        /// Browser origin allowed to call the API
        #[arg(long, env = "QUERYGEN_ALLOWED_ORIGIN")]
        allowed_origin: Option<String>,
    },
    /// Answer one prompt against a database and print the JSON response
    Ask {
        /// Natural-language question
        prompt: String,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Read model output from stdin and print the extracted SQL
    Sanitize,
}

#[derive(Args)]
struct ConnectionArgs {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 3306)]
    port: u16,
    #[arg(long, short)]
    user: String,
    #[arg(long, env = "QUERYGEN_DB_PASSWORD", hide_env_values = true, default_value = "")]
    password: String,
    #[arg(long, short)]
    database: String,
}

impl From<ConnectionArgs> for ConnectionDescriptor {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionDescriptor {
            host: args.host,
            port: args.port.to_string(),
            user: args.user,
            password: args.password,
            database: args.database,
        }
    }
}

/// Initialize tracing to stderr.
///
/// `RUST_LOG` replaces the default `querygen=info`; `LOG_FORMAT=json` switches
/// to structured output.
fn init_tracing() {
    let filter = default_filter(std::env::var("RUST_LOG").ok().as_deref());

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn default_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("querygen=info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    let mut overrides = ConfigOverrides {
        api_key: cli.api_key,
        model: cli.model,
        llm_url: cli.llm_url,
        ..Default::default()
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            allowed_origin,
        } => {
            overrides.host = host;
            overrides.port = port;
            overrides.allowed_origin = allowed_origin;
            let config = file_config.with_overrides(overrides);

            let llm = OpenRouterClient::new(&config.llm)?;
            if !llm.has_api_key() {
                tracing::warn!("OPENROUTER_API_KEY is not set; every query will fail until it is");
            }
            tracing::info!("Using model {} via {}", config.llm.model, config.llm.url);

            let provider_configured = llm.has_api_key();
            let state = AppState::new(Arc::new(llm), Arc::new(MySqlConnector), provider_configured);
            web::serve(&config.server, state).await?;
        }
        Commands::Ask { prompt, connection } => {
            let config = file_config.with_overrides(overrides);
            let llm = OpenRouterClient::new(&config.llm)?;
            let pipeline = QueryPipeline::new(llm, MySqlConnector);

            let request = QueryRequest {
                prompt: Some(prompt),
                connection: Some(connection.into()),
            };
            let response = pipeline.run(&request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Sanitize => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            println!("{}", sanitize_sql(&raw));
        }
    }

    Ok(())
}
