//! `keepsake get`: decrypt and show a single secret.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cancel::CancelToken;
use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{KeepsakeError, Result};
use crate::vault::{Secret, SecretData};

/// Execute the `get` command.
pub fn execute(cli: &Cli, id: u64, copy: bool, out: Option<&Path>) -> Result<()> {
    let store = open_store(cli)?;
    let secret = store.get(&CancelToken::new(), id)?;

    if let Some(path) = out {
        return write_file(&secret, path);
    }

    if copy {
        let text = Zeroizing::new(secret.to_clipboard()?);
        copy_to_clipboard(&text)?;
        output::success(&format!("Copied '{}' to the clipboard", secret.title));
        return Ok(());
    }

    output::print_secret(&secret);
    Ok(())
}

/// Save a file secret's bytes to `path`.
fn write_file(secret: &Secret, path: &Path) -> Result<()> {
    match &secret.data {
        Some(SecretData::Blob(blob)) => {
            std::fs::write(path, &blob.bytes)?;
            output::success(&format!(
                "Wrote '{}' ({} bytes) to {}",
                blob.filename,
                blob.bytes.len(),
                path.display()
            ));
            Ok(())
        }
        _ => Err(KeepsakeError::InvalidInput(format!(
            "secret #{} is a {} secret, not a file",
            secret.id, secret.secret_type
        ))),
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| KeepsakeError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| KeepsakeError::Clipboard(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{Blob, Text};
    use tempfile::TempDir;

    #[test]
    fn write_file_saves_blob_bytes() {
        let tmp = TempDir::new().unwrap();
        let secret = Secret::new(
            "key",
            SecretData::Blob(Blob {
                filename: "id_ed25519".into(),
                bytes: vec![0, 1, 2, 255],
            }),
        );
        let path = tmp.path().join("out.bin");
        write_file(&secret, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0, 1, 2, 255]);
    }

    #[test]
    fn write_file_rejects_non_file_secrets() {
        let tmp = TempDir::new().unwrap();
        let secret = Secret::new(
            "note",
            SecretData::Text(Text {
                content: "hi".into(),
            }),
        );
        let path = tmp.path().join("out.txt");
        assert!(matches!(
            write_file(&secret, &path),
            Err(KeepsakeError::InvalidInput(_))
        ));
        assert!(!path.exists());
    }
}
