//! Vault module: the secret model and its encrypted store.
//!
//! This module provides:
//! - `Secret`, its variants and the `SecretType` tag (`secret`)
//! - The plaintext JSON codec for variants (`codec`)
//! - `SecretStore`, which encrypts before sending and decrypts after receiving (`store`)

pub mod codec;
pub mod secret;
pub mod store;

// Re-export the most commonly used items.
pub use secret::{Blob, Card, Credential, Secret, SecretData, SecretType, Text};
pub use store::SecretStore;
