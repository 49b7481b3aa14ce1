//! The encrypted secret store.
//!
//! `SecretStore` is the one place where plaintext and ciphertext meet.
//! Outbound, it encodes the active variant, encrypts it under the session
//! key and sends only the ciphertext.  Inbound, it decrypts and decodes
//! before anything leaves this module.  It owns no storage; every
//! operation is a single round trip to the remote store.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroize;

use crate::cancel::CancelToken;
use crate::crypto::{decrypt, encrypt, SessionKey};
use crate::errors::{KeepsakeError, Operation, Result};
use crate::remote::{Call, RemoteStore, SecretRecord};
use crate::session::Session;

use super::codec;
use super::secret::{Secret, SecretType};

/// An authenticated user's view of their secrets.
///
/// All operations take `&self`; the key is immutable, so a store can be
/// shared across threads whenever the remote can.
pub struct SecretStore<R> {
    remote: R,
    session: Session,
    key: SessionKey,
}

impl<R: RemoteStore> SecretStore<R> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Assemble a store from an established session and its derived key.
    ///
    /// Normally obtained through `Client::login` / `Client::register`.
    pub fn new(remote: R, session: Session, key: SessionKey) -> Self {
        Self {
            remote,
            session,
            key,
        }
    }

    /// End the session, dropping (and wiping) the key.
    pub fn into_remote(self) -> R {
        self.remote
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Fetch, decrypt and decode one secret.
    pub fn get(&self, cancel: &CancelToken, id: u64) -> Result<Secret> {
        let record = self
            .remote
            .get_secret(self.call(cancel), id)
            .map_err(|e| remote_error(Operation::Get, Some(id), e))?;
        cancel.check()?;

        let secret = self.open(Operation::Get, record)?;
        cancel.check()?;

        tracing::debug!(id, "secret opened");
        Ok(secret)
    }

    /// Fetch, decrypt and decode every secret of the session's user.
    ///
    /// Most recently updated first, ties broken by descending id. One bad
    /// record fails the whole call; a partial list could hide corruption.
    pub fn list(&self, cancel: &CancelToken) -> Result<Vec<Secret>> {
        let records = self
            .remote
            .list_secrets(self.call(cancel))
            .map_err(|e| remote_error(Operation::List, None, e))?;

        let mut secrets = Vec::with_capacity(records.len());
        for record in records {
            cancel.check()?;
            secrets.push(self.open(Operation::List, record)?);
        }
        cancel.check()?;
        secrets.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        tracing::debug!(count = secrets.len(), "secrets listed");
        Ok(secrets)
    }

    /// Encrypt and persist a new secret.
    ///
    /// `secret.id` must be 0.  On success the server-assigned id and both
    /// timestamps are written back; on failure `secret` is untouched.
    /// `user_id` is not written back: the save response carries only the
    /// id, so the owner is known after the next `get` or `list`.
    pub fn create(&self, cancel: &CancelToken, secret: &mut Secret) -> Result<()> {
        if secret.is_persisted() {
            return Err(KeepsakeError::InvalidInput(format!(
                "secret {} already exists; use update",
                secret.id
            )));
        }

        let now = Utc::now();
        let record = self.seal(Operation::Create, secret, now, now)?;
        cancel.check()?;

        let id = self
            .remote
            .save_secret(self.call(cancel), &record)
            .map_err(|e| remote_error(Operation::Create, None, e))?;

        secret.id = id;
        secret.created_at = now;
        secret.updated_at = now;

        tracing::debug!(id, secret_type = %secret.secret_type, "secret created");
        Ok(())
    }

    /// Re-encrypt and overwrite an existing secret.
    ///
    /// Refreshes `updated_at` once the server accepts. The server keeps the
    /// stored `created_at` and owner whatever `secret` carries, so after a
    /// successful update `created_at` is whatever the next `get` returns.
    pub fn update(&self, cancel: &CancelToken, secret: &mut Secret) -> Result<()> {
        if !secret.is_persisted() {
            return Err(KeepsakeError::InvalidInput(
                "secret has no id yet; use create".into(),
            ));
        }

        let now = Utc::now();
        let record = self.seal(Operation::Update, secret, secret.created_at, now)?;
        cancel.check()?;

        self.remote
            .save_secret(self.call(cancel), &record)
            .map_err(|e| remote_error(Operation::Update, Some(secret.id), e))?;

        secret.updated_at = now;

        tracing::debug!(id = secret.id, secret_type = %secret.secret_type, "secret updated");
        Ok(())
    }

    /// `create` for unsaved secrets, `update` otherwise.
    pub fn save(&self, cancel: &CancelToken, secret: &mut Secret) -> Result<()> {
        if secret.is_persisted() {
            self.update(cancel, secret)
        } else {
            self.create(cancel, secret)
        }
    }

    /// Remove a secret.  Nothing is cached locally, so nothing else to do.
    pub fn delete(&self, cancel: &CancelToken, id: u64) -> Result<()> {
        cancel.check()?;
        self.remote
            .delete_secret(self.call(cancel), id)
            .map_err(|e| remote_error(Operation::Delete, Some(id), e))?;

        tracing::debug!(id, "secret deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Encrypt / decrypt boundary
    // ------------------------------------------------------------------

    fn call<'a>(&'a self, cancel: &'a CancelToken) -> Call<'a> {
        Call::new(self.session.metadata(), cancel)
    }

    /// Encode and encrypt `secret` into a wire record.
    fn seal(
        &self,
        op: Operation,
        secret: &Secret,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<SecretRecord> {
        let sealing_error = |source| KeepsakeError::EncodeFailed {
            op,
            id: secret.id,
            source: Box::new(source),
        };

        let mut plaintext = codec::encode(secret).map_err(sealing_error)?;
        let ciphertext = encrypt(&plaintext, self.key.as_bytes());
        plaintext.zeroize();
        let ciphertext = ciphertext.map_err(sealing_error)?;

        Ok(SecretRecord {
            id: secret.id,
            user_id: secret.user_id,
            title: secret.title.clone(),
            metadata: secret.metadata.clone(),
            secret_type: secret.secret_type.to_string(),
            payload: ciphertext.into_bytes(),
            created_at,
            updated_at,
        })
    }

    /// Decrypt and decode a wire record.
    fn open(&self, op: Operation, record: SecretRecord) -> Result<Secret> {
        let id = record.id;
        let decode_error = |source| KeepsakeError::DecodeFailed {
            op,
            id,
            source: Box::new(source),
        };
        let decrypt_error = |source| KeepsakeError::DecryptionFailed {
            op,
            id,
            source: Box::new(source),
        };

        let secret_type: SecretType = record.secret_type.parse().map_err(decode_error)?;

        let ciphertext = std::str::from_utf8(&record.payload)
            .map_err(|e| decrypt_error(KeepsakeError::InvalidEncoding(e.to_string())))?;
        let mut plaintext = decrypt(ciphertext, self.key.as_bytes()).map_err(|e| {
            tracing::warn!(op = %op, id, error = %e, "secret failed to decrypt");
            decrypt_error(e)
        })?;

        let data = codec::decode_as(secret_type, &plaintext);
        plaintext.zeroize();
        let data = data.map_err(|e| {
            tracing::warn!(op = %op, id, error = %e, "decrypted secret failed to decode");
            decode_error(e)
        })?;

        Ok(Secret {
            id,
            user_id: record.user_id,
            title: record.title,
            metadata: record.metadata,
            secret_type,
            data: Some(data),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn remote_error(op: Operation, id: Option<u64>, source: KeepsakeError) -> KeepsakeError {
    tracing::debug!(op = %op, ?id, error = %source, "remote call failed");
    KeepsakeError::RemoteCall {
        op,
        id,
        source: Box::new(source),
    }
}

impl<R> fmt::Debug for SecretStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("session", &self.session)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
