//! `keepsake update`: change a stored secret.

use std::path::Path;

use crate::cancel::CancelToken;
use crate::cli::commands::add::prompt_data;
use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{KeepsakeError, Result};

/// Execute the `update` command.
pub fn execute(
    cli: &Cli,
    id: u64,
    title: Option<&str>,
    metadata: Option<&str>,
    contents: bool,
    file: Option<&Path>,
) -> Result<()> {
    let replace_contents = contents || file.is_some();
    if title.is_none() && metadata.is_none() && !replace_contents {
        return Err(KeepsakeError::InvalidInput(
            "nothing to update (use --title, --metadata, --contents or --file)".into(),
        ));
    }

    let store = open_store(cli)?;
    let cancel = CancelToken::new();
    let mut secret = store.get(&cancel, id)?;

    if let Some(title) = title {
        secret.title = title.to_string();
    }
    if let Some(metadata) = metadata {
        secret.metadata = metadata.to_string();
    }
    if replace_contents {
        let data = prompt_data(secret.secret_type, file)?;
        secret.set_data(data);
    }

    store.update(&cancel, &mut secret)?;

    output::success(&format!("Updated secret #{} '{}'", secret.id, secret.title));
    Ok(())
}
