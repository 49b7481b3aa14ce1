//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{Secret, SecretData};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of secrets (ID, Title, Type, Metadata, Updated).
///
/// Only the unencrypted descriptive fields are shown.
pub fn print_secrets_table(secrets: &[Secret]) {
    if secrets.is_empty() {
        info("No secrets in this vault yet.");
        tip("Run `keepsake add text --title <TITLE>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Title", "Type", "Metadata", "Updated"]);

    for s in secrets {
        table.add_row(vec![
            s.id.to_string(),
            s.title.clone(),
            s.secret_type.to_string(),
            s.metadata.clone(),
            s.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print one decrypted secret, field by field.
pub fn print_secret(secret: &Secret) {
    println!("{} {}", style(&secret.title).bold(), style(format!("#{}", secret.id)).dim());
    if !secret.metadata.is_empty() {
        println!("{}", style(&secret.metadata).dim());
    }

    match &secret.data {
        Some(SecretData::Credential(c)) => {
            println!("login:    {}", c.login);
            println!("password: {}", c.password);
        }
        Some(SecretData::Text(t)) => println!("{}", t.content),
        Some(SecretData::Card(c)) => {
            println!("number: {}", c.number);
            println!("expiry: {:02}/{}", c.expiry_month, c.expiry_year);
            println!("cvv:    {}", c.cvv);
        }
        Some(SecretData::Blob(b)) => {
            println!("file:   {} ({} bytes)", b.filename, b.bytes.len());
            tip("Use --output <PATH> to save the file.");
        }
        None => warning("This secret has no contents."),
    }
}
