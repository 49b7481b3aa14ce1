//! Authentication and session establishment.
//!
//! `Client` is the unauthenticated entry point: it knows the remote store
//! and the KDF settings, nothing else.  A successful `login` or `register`
//! is the only way to get a `SecretStore`, and it hands the store an
//! explicit `Session` (token + client id) and a key derived exactly once
//! from the password that was just accepted.

use std::fmt;

use rand::Rng;
use zeroize::Zeroize;

use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::crypto::{derive_key_with_params, ScryptParams};
use crate::errors::{KeepsakeError, Operation, Result};
use crate::remote::{Call, CallMetadata, RemoteStore};
use crate::vault::SecretStore;

/// An authenticated identity: who we are and what we attach to each call.
pub struct Session {
    login: String,
    metadata: CallMetadata,
}

impl Session {
    pub fn new(login: impl Into<String>, access_token: impl Into<String>, client_id: u32) -> Self {
        Self {
            login: login.into(),
            metadata: CallMetadata {
                access_token: Some(access_token.into()),
                client_id,
            },
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn client_id(&self) -> u32 {
        self.metadata.client_id
    }

    pub(crate) fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(token) = self.metadata.access_token.as_mut() {
            token.zeroize();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("login", &self.login)
            .field("client_id", &self.metadata.client_id)
            .finish_non_exhaustive()
    }
}

/// Unauthenticated client.
pub struct Client<R> {
    remote: R,
    client_id: u32,
    scrypt_params: ScryptParams,
    salt: String,
}

/// The two ways a client obtains a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    fn operation(self) -> Operation {
        match self {
            AuthMode::Login => Operation::Login,
            AuthMode::Register => Operation::Register,
        }
    }
}

impl<R: RemoteStore + Clone> Client<R> {
    /// A client with default KDF parameters and an empty salt.
    pub fn new(remote: R) -> Self {
        Self::with_kdf(remote, ScryptParams::default(), "")
    }

    /// A client with explicit KDF parameters and salt.
    pub fn with_kdf(remote: R, scrypt_params: ScryptParams, salt: impl Into<String>) -> Self {
        Self {
            remote,
            client_id: rand::rng().random_range(1..=i32::MAX as u32),
            scrypt_params,
            salt: salt.into(),
        }
    }

    /// A client configured from `Settings`.
    pub fn from_settings(remote: R, settings: &Settings) -> Self {
        Self::with_kdf(remote, settings.scrypt_params(), settings.kdf_salt.clone())
    }

    /// The random numeric id sent with every authenticated call.
    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Log in and open the user's encrypted store.
    ///
    /// On any failure no store is created.
    pub fn login(&self, cancel: &CancelToken, login: &str, password: &str) -> Result<SecretStore<R>> {
        self.authenticate(AuthMode::Login, cancel, login, password)
    }

    /// Create an account and open its (empty) encrypted store.
    pub fn register(
        &self,
        cancel: &CancelToken,
        login: &str,
        password: &str,
    ) -> Result<SecretStore<R>> {
        self.authenticate(AuthMode::Register, cancel, login, password)
    }

    fn authenticate(
        &self,
        mode: AuthMode,
        cancel: &CancelToken,
        login: &str,
        password: &str,
    ) -> Result<SecretStore<R>> {
        if login.trim().is_empty() {
            return Err(KeepsakeError::InvalidInput("login must not be empty".into()));
        }
        if password.is_empty() {
            return Err(KeepsakeError::EmptyPassword);
        }

        let anonymous = CallMetadata::anonymous(self.client_id);
        let call = Call::new(&anonymous, cancel);
        let op = mode.operation();
        let token = match mode {
            AuthMode::Login => self.remote.login(call, login, password),
            AuthMode::Register => self.remote.register(call, login, password),
        }
        .map_err(|e| KeepsakeError::RemoteCall {
            op,
            id: None,
            source: Box::new(e),
        })?;

        let session = Session::new(login, token, self.client_id);
        cancel.check()?;

        let key = derive_key_with_params(password, &self.salt, &self.scrypt_params)?;
        tracing::debug!(op = %op, client_id = self.client_id, "session established");

        Ok(SecretStore::new(self.remote.clone(), session, key))
    }
}
