//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::errors::{KeepsakeError, Result};
use crate::remote::HttpRemote;
use crate::session::Client;
use crate::vault::SecretStore;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Keepsake CLI: client-side encrypted secrets vault.
#[derive(Parser)]
#[command(
    name = "keepsake",
    about = "Client-side encrypted secrets vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Remote store address (overrides .keepsake.toml)
    #[arg(long, env = "KEEPSAKE_ADDRESS", global = true)]
    pub server: Option<String>,

    /// Account login (prompted for if omitted)
    #[arg(short, long, env = "KEEPSAKE_LOGIN", global = true)]
    pub login: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create an account on the remote store
    Register,

    /// Check that your credentials open the vault
    Login,

    /// List all secrets
    List,

    /// Decrypt and show a secret
    Get {
        /// Secret id
        id: u64,
        /// Copy the secret to the clipboard instead of printing it
        #[arg(short, long)]
        copy: bool,
        /// Write a file secret's bytes to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encrypt and store a new secret
    Add {
        #[command(subcommand)]
        kind: AddKind,
    },

    /// Change a secret's title, metadata or contents
    Update {
        /// Secret id
        id: u64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New metadata
        #[arg(long)]
        metadata: Option<String>,
        /// Re-enter the secret's contents
        #[arg(long)]
        contents: bool,
        /// Replace a file secret's bytes from this path (implies --contents)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a secret
    Delete {
        /// Secret id
        id: u64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

/// Fields shared by every `add` subcommand.
#[derive(clap::Args)]
pub struct Describe {
    /// Title shown in listings
    #[arg(short, long)]
    pub title: String,
    /// Free-form, unencrypted notes
    #[arg(short, long, default_value = "")]
    pub metadata: String,
}

/// The kind of secret to add.
#[derive(clap::Subcommand)]
pub enum AddKind {
    /// A login/password pair
    Credential {
        #[command(flatten)]
        describe: Describe,
        /// The login stored in the secret (the password is prompted for)
        #[arg(long)]
        username: Option<String>,
    },

    /// Free-form text (read from stdin when piped)
    Text {
        #[command(flatten)]
        describe: Describe,
    },

    /// Payment card details
    Card {
        #[command(flatten)]
        describe: Describe,
    },

    /// A file's contents
    File {
        #[command(flatten)]
        describe: Describe,
        /// File to store
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.keepsake.toml` from the working directory and apply `--server`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Ok(Settings::load(&cwd)?.with_server_address(cli.server.as_deref()))
}

/// Build an unauthenticated client for the configured server.
pub fn client(cli: &Cli) -> Result<Client<HttpRemote>> {
    let settings = load_settings(cli)?;
    let remote = HttpRemote::new(&settings.server_address, settings.request_timeout())?;
    Ok(Client::from_settings(remote, &settings))
}

/// The account login: `--login` / `KEEPSAKE_LOGIN`, else an interactive prompt.
pub fn prompt_login(cli: &Cli) -> Result<String> {
    if let Some(login) = cli.login.as_deref().map(str::trim) {
        if !login.is_empty() {
            return Ok(login.to_string());
        }
    }

    dialoguer::Input::<String>::new()
        .with_prompt("Login")
        .interact_text()
        .map_err(|e| KeepsakeError::CommandFailed(format!("login prompt: {e}")))
}

/// Get the master password, trying in order:
/// 1. `KEEPSAKE_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("KEEPSAKE_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| KeepsakeError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used by `register`).
///
/// Also respects `KEEPSAKE_PASSWORD` for scripted usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("KEEPSAKE_PASSWORD") {
        if !pw.is_empty() {
            check_new_password(&pw)?;
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| KeepsakeError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if let Err(e) = check_new_password(&password) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(password);
    }
}

fn check_new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(KeepsakeError::CommandFailed(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Log in with the configured credentials and open the encrypted store.
pub fn open_store(cli: &Cli) -> Result<SecretStore<HttpRemote>> {
    let client = client(cli)?;
    let login = prompt_login(cli)?;
    let password = prompt_password()?;
    client.login(&CancelToken::new(), &login, &password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_new_password("short").is_err());
        assert!(check_new_password("").is_err());
        assert!(check_new_password("long-enough").is_ok());
    }

    #[test]
    fn password_length_counts_characters() {
        // Eight characters, more than eight bytes.
        assert!(check_new_password("pässwörd").is_ok());
        assert!(check_new_password("äöüäöüä").is_err());
    }

    #[test]
    fn cli_parses_add_subcommands() {
        let cli = Cli::try_parse_from([
            "keepsake", "add", "card", "--title", "Visa", "--metadata", "work",
        ])
        .unwrap();
        match cli.command {
            Commands::Add {
                kind: AddKind::Card { describe },
            } => {
                assert_eq!(describe.title, "Visa");
                assert_eq!(describe.metadata, "work");
            }
            _ => panic!("expected add card"),
        }
    }

    #[test]
    fn cli_requires_numeric_ids() {
        assert!(Cli::try_parse_from(["keepsake", "get", "abc"]).is_err());
        assert!(Cli::try_parse_from(["keepsake", "delete", "7", "--force"]).is_ok());
    }
}
