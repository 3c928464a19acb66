//! Terminal front-end for the Expensio client.
//!
//! Each subcommand stands in for one view of the web frontend. The token
//! is kept in a file (see `TOKEN_FILE`) so a login survives between runs.

use clap::{Parser, Subcommand};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use expensio_client::config::Config;
use expensio_client::error::ClientError;
use expensio_client::http::UnauthorizedHandler;
use expensio_client::router::{History, Route, Router};
use expensio_client::types::RegisterRequest;
use expensio_client::{Client, create_session};

#[derive(Parser)]
#[command(name = "expensio", version, about = "Expensio expense tracker client")]
struct Cli {
    /// Override API_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in with it.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        lastname: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Show the logged-in user's dashboard.
    Dashboard,
    /// Report whether a usable session is stored.
    Status,
    /// Forget the stored session.
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_string();
    }

    let session = create_session(&config);
    let router = Arc::new(Router::new(session.clone(), Arc::new(History::new())));

    let on_unauthorized: UnauthorizedHandler = {
        let router = router.clone();
        Arc::new(move || router.redirect_to_login())
    };
    let client = match Client::new(config, session, Some(on_unauthorized)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to start client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &client, &router).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            if let Some(location) = router.navigator().current() {
                tracing::debug!("Ended on {}", location);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // JSON for log shipping, compact text otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }
}

async fn run(command: Command, client: &Client, router: &Router<Arc<History>>) -> Result<(), ClientError> {
    match command {
        Command::Login { username, password } => {
            router.navigate(Route::Login.path());
            let auth = client.auth.scoped(router.view_token());
            auth.login(&username, &password).await?;
            println!("Logged in as {username}");
            show_dashboard(client, router).await
        }
        Command::Register {
            email,
            firstname,
            lastname,
            password,
            confirm_password,
        } => {
            router.navigate(Route::Register.path());
            let auth = client.auth.scoped(router.view_token());
            let fields = RegisterRequest {
                email,
                firstname,
                lastname,
                password,
                confirm_password,
            };
            auth.register(&fields).await?;
            println!("Account created for {}", fields.email);
            show_dashboard(client, router).await
        }
        Command::Dashboard => show_dashboard(client, router).await,
        Command::Status => {
            if client.session.is_authenticated() {
                println!("Logged in");
            } else {
                println!("Not logged in");
            }
            Ok(())
        }
        Command::Logout => {
            client.session.logout_and(|| {
                router.navigate(Route::Login.path());
            });
            println!("Logged out");
            Ok(())
        }
    }
}

async fn show_dashboard(client: &Client, router: &Router<Arc<History>>) -> Result<(), ClientError> {
    if router.navigate(Route::Dashboard.path()) != Route::Dashboard {
        return Err(ClientError::AuthRequired);
    }

    let auth = client.auth.scoped(router.view_token());
    let user = auth.current_user().await?;

    println!("[{}] {}", user.initials(), user.full_name());
    println!("    {}", user.email);
    if let Some(image) = &user.image_url {
        println!("    avatar: {image}");
    }
    Ok(())
}
