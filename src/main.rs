use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use learn_sphere::config::AppConfig;
use learn_sphere::guard;
use learn_sphere::net::client::ApiClient;
use learn_sphere::net::transport::{ApiRequest, ReqwestTransport};
use learn_sphere::net::types::Credentials;
use learn_sphere::routes::{self, ShellState};
use learn_sphere::state::auth::AuthContext;
use learn_sphere::token_store::FileTokenStore;
use learn_sphere::AuthError;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("io failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not logged in")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "learn-sphere", about = "Learn Sphere session client")]
struct Cli {
    /// Backend base URL (overrides LEARN_SPHERE_API_URL).
    #[arg(long)]
    api_url: Option<String>,

    /// Token file (overrides LEARN_SPHERE_TOKEN_FILE).
    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the issued tokens.
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted.
        #[arg(long, env = "LEARN_SPHERE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Invalidate the session and clear stored tokens.
    Logout,
    /// Print the current user.
    Whoami,
    /// Resolve the route guard for a frontend path.
    Visit { path: String },
    /// Authenticated GET against the API.
    Get { path: String },
    /// Serve the built frontend behind the cookie pre-check.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        dist: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_owned();
    }
    if let Some(token_file) = cli.token_file {
        config.token_file = token_file;
    }

    match cli.command {
        Command::Serve { port, dist } => serve(config, port, dist).await,
        Command::Login { email, password } => login(&build_context(&config)?, &email, password).await,
        Command::Logout => {
            build_context(&config)?.logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => whoami(&build_context(&config)?).await,
        Command::Visit { path } => visit(&build_context(&config)?, &path).await,
        Command::Get { path } => {
            let response = build_context(&config)?.send(ApiRequest::get(path)).await?.error_for_status()?;
            println!("{}", response.body);
            Ok(())
        }
    }
}

fn build_context(config: &AppConfig) -> Result<AuthContext, CliError> {
    let transport = ReqwestTransport::new(config.api_url.clone(), config.timeouts)?;
    let tokens = FileTokenStore::open(&config.token_file);
    tracing::debug!(api_url = %config.api_url, token_file = %tokens.path().display(), "session client ready");
    Ok(AuthContext::new(ApiClient::new(Arc::new(transport), Arc::new(tokens))))
}

async fn login(ctx: &AuthContext, email: &str, password: Option<String>) -> Result<(), CliError> {
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };
    let credentials = Credentials::parse(email, &password)?;
    let user = ctx.login(&credentials).await?;
    println!("logged in as {} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

async fn whoami(ctx: &AuthContext) -> Result<(), CliError> {
    let state = ctx.initialize().await;
    let user = state.user.ok_or(CliError::NotLoggedIn)?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

async fn visit(ctx: &AuthContext, path: &str) -> Result<(), CliError> {
    match guard::enter_path(path, ctx).await {
        Some(to) => println!("redirect {path} -> {}", to.path()),
        None => println!("render {path}"),
    }
    Ok(())
}

fn read_password() -> Result<String, CliError> {
    eprint!("password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

async fn serve(config: AppConfig, port: Option<u16>, dist: Option<PathBuf>) -> Result<(), CliError> {
    let port = port.unwrap_or(config.port);
    let dist_dir = dist.unwrap_or(config.dist_dir);
    let app = routes::app(ShellState { dist_dir: dist_dir.clone(), cookie_secure: config.cookie_secure });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(%port, dist = %dist_dir.display(), "learn-sphere frontend listening");
    axum::serve(listener, app).await?;
    Ok(())
}
