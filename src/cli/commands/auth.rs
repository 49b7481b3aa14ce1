//! `keepsake register` / `keepsake login`: account commands.
//!
//! The CLI keeps no session between invocations: every command logs in
//! again. `login` exists to check credentials and the server address.

use crate::cancel::CancelToken;
use crate::cli::output;
use crate::cli::{client, prompt_login, prompt_new_password, prompt_password, Cli};
use crate::errors::Result;

/// Execute `keepsake register`.
pub fn execute_register(cli: &Cli) -> Result<()> {
    let client = client(cli)?;
    let login = prompt_login(cli)?;
    let password = prompt_new_password()?;

    let store = client.register(&CancelToken::new(), &login, &password)?;

    output::success(&format!("Registered '{}'.", store.session().login()));
    output::tip("The master password cannot be recovered. Losing it loses your secrets.");
    Ok(())
}

/// Execute `keepsake login`.
pub fn execute_login(cli: &Cli) -> Result<()> {
    let client = client(cli)?;
    let login = prompt_login(cli)?;
    let password = prompt_password()?;

    let store = client.login(&CancelToken::new(), &login, &password)?;

    output::success(&format!(
        "Logged in as '{}' (client {}).",
        store.session().login(),
        store.session().client_id()
    ));
    Ok(())
}
