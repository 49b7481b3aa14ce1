//! `keepsake add`: encrypt and store a new secret.
//!
//! Secret contents never come from command-line arguments (they would land
//! in shell history): they are prompted for, piped on stdin, or read from
//! a file.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use dialoguer::{Input, Password};

use crate::cancel::CancelToken;
use crate::cli::output;
use crate::cli::{open_store, AddKind, Cli};
use crate::errors::{KeepsakeError, Result};
use crate::vault::{Blob, Card, Credential, Secret, SecretData, SecretType, Text};

/// Execute the `add` command.
pub fn execute(cli: &Cli, kind: &AddKind) -> Result<()> {
    let (describe, data) = match kind {
        AddKind::Credential { describe, username } => {
            (describe, prompt_credential(username.as_deref())?)
        }
        AddKind::Text { describe } => (describe, read_text()?),
        AddKind::Card { describe } => (describe, prompt_card()?),
        AddKind::File { describe, path } => (describe, read_file(path)?),
    };

    let mut secret = Secret::new(describe.title.clone(), data).with_metadata(describe.metadata.clone());

    let store = open_store(cli)?;
    store.create(&CancelToken::new(), &mut secret)?;

    output::success(&format!(
        "Added {} secret '{}' as #{}",
        secret.secret_type, secret.title, secret.id
    ));

    Ok(())
}

/// Prompt for fresh contents of the given kind.
///
/// Used by `update --contents`; `file` is required for file secrets.
pub fn prompt_data(secret_type: SecretType, file: Option<&Path>) -> Result<SecretData> {
    match secret_type {
        SecretType::Credential => prompt_credential(None),
        SecretType::Text => read_text(),
        SecretType::Card => prompt_card(),
        SecretType::Blob => match file {
            Some(path) => read_file(path),
            None => Err(KeepsakeError::InvalidInput(
                "file secrets need --file <PATH> to replace their contents".into(),
            )),
        },
    }
}

fn prompt_credential(username: Option<&str>) -> Result<SecretData> {
    let login = match username {
        Some(u) => u.to_string(),
        None => Input::<String>::new()
            .with_prompt("Login")
            .interact_text()
            .map_err(prompt_failed)?,
    };
    let password = Password::new()
        .with_prompt(format!("Password for {login}"))
        .interact()
        .map_err(prompt_failed)?;

    Ok(SecretData::Credential(Credential { login, password }))
}

/// Piped stdin if there is any, otherwise a single-line prompt.
fn read_text() -> Result<SecretData> {
    let content = if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf.trim_end().to_string()
    } else {
        Input::<String>::new()
            .with_prompt("Text")
            .interact_text()
            .map_err(prompt_failed)?
    };

    Ok(SecretData::Text(Text { content }))
}

fn prompt_card() -> Result<SecretData> {
    let number: String = Input::new()
        .with_prompt("Card number")
        .interact_text()
        .map_err(prompt_failed)?;
    let expiry_month: u32 = Input::new()
        .with_prompt("Expiry month (1-12)")
        .interact_text()
        .map_err(prompt_failed)?;
    let expiry_year: u32 = Input::new()
        .with_prompt("Expiry year")
        .interact_text()
        .map_err(prompt_failed)?;
    let cvv = Password::new()
        .with_prompt("CVV")
        .interact()
        .map_err(prompt_failed)?;
    let cvv: u32 = cvv
        .trim()
        .parse()
        .map_err(|_| KeepsakeError::InvalidInput("cvv must be numeric".into()))?;

    let card = Card {
        number: number.split_whitespace().collect(),
        expiry_year,
        expiry_month,
        cvv,
    };
    card.validate()?;
    Ok(SecretData::Card(card))
}

fn read_file(path: &Path) -> Result<SecretData> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            KeepsakeError::InvalidInput(format!("'{}' is not a file", path.display()))
        })?;

    Ok(SecretData::Blob(Blob { filename, bytes }))
}

fn prompt_failed(e: dialoguer::Error) -> KeepsakeError {
    KeepsakeError::CommandFailed(format!("input prompt: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_file_keeps_name_and_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backup-codes.txt");
        std::fs::write(&path, b"1234\n5678\n").unwrap();

        match read_file(&path).unwrap() {
            SecretData::Blob(blob) => {
                assert_eq!(blob.filename, "backup-codes.txt");
                assert_eq!(blob.bytes, b"1234\n5678\n");
            }
            other => panic!("expected blob, got {other:?}"),
        }
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            read_file(&tmp.path().join("nope")),
            Err(KeepsakeError::Io(_))
        ));
    }

    #[test]
    fn replacing_file_contents_needs_a_path() {
        assert!(matches!(
            prompt_data(SecretType::Blob, None),
            Err(KeepsakeError::InvalidInput(_))
        ));
    }
}
