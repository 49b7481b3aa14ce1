//! `keepsake list`: display all secrets in a table.

use crate::cancel::CancelToken;
use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let secrets = store.list(&CancelToken::new())?;

    output::info(&format!(
        "{}: {} secret(s)",
        store.session().login(),
        secrets.len()
    ));

    output::print_secrets_table(&secrets);

    Ok(())
}
