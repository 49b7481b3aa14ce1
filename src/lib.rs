pub mod cancel;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod remote;
pub mod session;
pub mod vault;

pub use cancel::CancelToken;
pub use errors::{KeepsakeError, Result};
pub use session::{Client, Session};
pub use vault::{Secret, SecretData, SecretStore, SecretType};
