//! adminboard CLI — exercises the session core against a deployed API:
//! login, session restore, logout, and the self-service account operations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use adminboard::config::DEFAULT_API_URL;
use adminboard::{ApiConfig, ApiError, AuthClient, LoginCredentials, RegisterCredentials};

#[derive(Parser, Debug)]
#[command(name = "adminboard", about = "Admin dashboard session and account CLI")]
struct Cli {
    /// API base URL.
    #[arg(long, env = "ADMINBOARD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Credential file path.
    #[arg(long, env = "ADMINBOARD_CREDENTIALS")]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the credential pair.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show the currently signed-in user.
    Whoami,
    /// Log out of this device.
    Logout,
    /// Log out of every device.
    LogoutAll,
    /// Register a new account (requires email verification to log in).
    Signup {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Request a password reset email.
    ForgotPassword { email: String },
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = ApiConfig::from_env().with_base_url(&cli.api_url);
    if let Some(path) = cli.credentials {
        config.credentials_path = path;
    }
    let auth = AuthClient::from_config(&config)?;

    match cli.command {
        Command::Login { username, password } => {
            let user = auth.login(LoginCredentials::new(username, password)).await?;
            println!("logged in as {} ({})", user.username, user.role.as_str());
        }
        Command::Whoami => {
            if auth.restore_session().await {
                let snapshot = auth.session().snapshot();
                if let Some(user) = snapshot.user {
                    println!("{}", serde_json::to_string_pretty(&user)?);
                }
            } else {
                println!("not logged in");
            }
        }
        Command::Logout => {
            let _ = auth.restore_session().await;
            auth.logout().await;
            println!("logged out");
        }
        Command::LogoutAll => {
            if !auth.restore_session().await {
                println!("not logged in");
                return Ok(());
            }
            auth.logout_all_devices().await?;
            println!("logged out everywhere");
        }
        Command::Signup { username, email, password } => {
            let response = auth
                .register(RegisterCredentials {
                    username,
                    email,
                    password: password.clone(),
                    confirm_password: password,
                })
                .await?;
            if response.message.is_empty() {
                println!("registered; check your email to verify the account");
            } else {
                println!("{}", response.message);
            }
        }
        Command::ForgotPassword { email } => {
            let response = auth.forgot_password(&email).await?;
            if response.message.is_empty() {
                println!("reset email requested");
            } else {
                println!("{}", response.message);
            }
        }
    }

    Ok(())
}
