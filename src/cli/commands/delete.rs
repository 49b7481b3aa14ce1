//! `keepsake delete`: remove a secret from the remote store.

use dialoguer::Confirm;

use crate::cancel::CancelToken;
use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{KeepsakeError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: u64, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete secret #{id}?"))
            .default(false)
            .interact()
            .map_err(|e| KeepsakeError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let store = open_store(cli)?;
    store.delete(&CancelToken::new(), id)?;

    output::success(&format!("Deleted secret #{id}"));

    Ok(())
}
