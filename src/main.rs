use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::info;

use llamagate::keys::ApiKeys;
use llamagate::proxy::config_routes;
use llamagate::util::{self, AppState, Upstream};

/// Authenticating reverse proxy for OpenAI-compatible inference servers.
#[derive(Debug, Parser)]
#[command(name = "llamagate", version, about)]
struct Args {
    /// Port to listen on (all interfaces).
    #[arg(long, env = "PROXY_PORT", default_value_t = 3000)]
    port: u16,

    /// Base URL of the upstream inference server.
    #[arg(long, env = "UPSTREAM_URL", default_value = "http://127.0.0.1:8080")]
    upstream: String,

    /// Path to the JSON credential file ({"apiKeys": [...]}).
    #[arg(long, env = "PROXY_CONFIG", default_value = "config.json")]
    config: std::path::PathBuf,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    util::init_tracing();
    let args = Args::parse();

    // Credentials are loaded before the listener binds; failing here keeps
    // the process from ever serving unauthenticated.
    let keys = ApiKeys::load(&args.config)?;
    let upstream = Upstream::parse(&args.upstream)?;

    info!(
        port = args.port,
        upstream = %upstream.authority(),
        keys = keys.len(),
        "proxy starting"
    );

    let state = web::Data::new(AppState::new(keys, upstream));
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(config_routes)
    })
    .bind(("0.0.0.0", args.port))?
    .run()
    .await?;

    Ok(())
}
