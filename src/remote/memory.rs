//! In-process remote store.
//!
//! Implements the server side of the contract in memory: accounts with
//! salted SHA-256 password hashes, opaque bearer tokens, per-user record
//! scoping and server-assigned ids.  It never sees plaintext, exactly like
//! a real server.
//!
//! Besides being a usable backend for embedders, it exposes a few hooks
//! (`set_available`, `tamper`, `calls`) so tests can simulate outages,
//! corrupted storage and inspect the metadata the client attached.
//!
//! Memory stays bounded: the call log keeps only the latest
//! `CALL_LOG_LEN` entries (never a token), and each user holds at most
//! `TOKENS_PER_USER` live tokens, oldest evicted first.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::{Call, CallMetadata, RemoteStore, SecretRecord};
use crate::errors::{KeepsakeError, Result};

/// Length of the random salt and of issued tokens, in bytes.
const RANDOM_LEN: usize = 16;

/// How many calls `calls()` remembers.
pub const CALL_LOG_LEN: usize = 256;

/// Live tokens per user; logging in again evicts the oldest.
pub const TOKENS_PER_USER: usize = 4;

/// A call as the server saw it, with credentials reduced to facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    /// Whether a non-empty access token was attached.
    pub token_attached: bool,
    /// The user the token resolved to, if it was valid.
    pub user_id: Option<u64>,
    pub client_id: u32,
}

struct IssuedToken {
    user_id: u64,
    serial: u64,
}

struct Account {
    user_id: u64,
    salt: [u8; RANDOM_LEN],
    password_hash: [u8; 32],
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, IssuedToken>,
    records: BTreeMap<u64, SecretRecord>,
    next_user_id: u64,
    next_secret_id: u64,
    next_token_serial: u64,
    unavailable: bool,
    calls: VecDeque<RecordedCall>,
}

/// Thread-safe in-memory `RemoteStore`.
#[derive(Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the server going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = !available;
        }
    }

    /// Mutate a stored record in place, bypassing authentication.
    ///
    /// Returns `false` if no record has that id.
    pub fn tamper<F: FnOnce(&mut SecretRecord)>(&self, id: u64, f: F) -> bool {
        match self.state.lock() {
            Ok(mut state) => match state.records.get_mut(&id) {
                Some(record) => {
                    f(record);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// A copy of a stored record, bypassing authentication.
    pub fn record(&self, id: u64) -> Option<SecretRecord> {
        self.state.lock().ok()?.records.get(&id).cloned()
    }

    /// The most recent calls (up to `CALL_LOG_LEN`), oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state
            .lock()
            .map(|state| state.calls.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Lock the state, record the call, and fail if the server is "down"
    /// or the caller gave up.
    fn enter(&self, method: &'static str, call: Call<'_>) -> Result<MutexGuard<'_, State>> {
        call.cancel.check()?;
        let mut state = self
            .state
            .lock()
            .map_err(|_| KeepsakeError::Remote("in-memory store state poisoned".into()))?;
        let token_attached = call
            .metadata
            .access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty());
        let user_id = state.authenticate(call.metadata).ok();
        if state.calls.len() == CALL_LOG_LEN {
            state.calls.pop_front();
        }
        state.calls.push_back(RecordedCall {
            method,
            token_attached,
            user_id,
            client_id: call.metadata.client_id,
        });
        if state.unavailable {
            return Err(KeepsakeError::Unavailable("in-memory store offline".into()));
        }
        Ok(state)
    }
}

impl State {
    fn authenticate(&self, metadata: &CallMetadata) -> Result<u64> {
        let token = metadata
            .access_token
            .as_deref()
            .ok_or(KeepsakeError::Unauthenticated)?;
        self.tokens
            .get(token)
            .map(|issued| issued.user_id)
            .ok_or(KeepsakeError::Unauthenticated)
    }

    fn issue_token(&mut self, user_id: u64) -> String {
        let mut live: Vec<(u64, String)> = self
            .tokens
            .iter()
            .filter(|(_, issued)| issued.user_id == user_id)
            .map(|(token, issued)| (issued.serial, token.clone()))
            .collect();
        if live.len() >= TOKENS_PER_USER {
            live.sort_unstable();
            let excess = live.len() + 1 - TOKENS_PER_USER;
            for (_, token) in live.into_iter().take(excess) {
                self.tokens.remove(&token);
            }
        }

        self.next_token_serial += 1;
        let token = hex::encode(random_bytes());
        self.tokens.insert(
            token.clone(),
            IssuedToken {
                user_id,
                serial: self.next_token_serial,
            },
        );
        token
    }

    fn owned_record_mut(&mut self, user_id: u64, id: u64) -> Result<&mut SecretRecord> {
        self.records
            .get_mut(&id)
            .filter(|r| r.user_id == user_id)
            .ok_or(KeepsakeError::NotFound(id))
    }
}

fn random_bytes() -> [u8; RANDOM_LEN] {
    let mut buf = [0u8; RANDOM_LEN];
    rand::rng().fill_bytes(&mut buf);
    buf
}

fn hash_password(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

impl RemoteStore for InMemoryRemote {
    fn login(&self, call: Call<'_>, login: &str, password: &str) -> Result<String> {
        let mut state = self.enter("login", call)?;
        let account = state
            .accounts
            .get(login)
            .ok_or(KeepsakeError::Unauthenticated)?;
        let candidate = hash_password(&account.salt, password);
        if !bool::from(candidate.ct_eq(&account.password_hash)) {
            return Err(KeepsakeError::Unauthenticated);
        }
        let user_id = account.user_id;
        Ok(state.issue_token(user_id))
    }

    fn register(&self, call: Call<'_>, login: &str, password: &str) -> Result<String> {
        let mut state = self.enter("register", call)?;
        if login.is_empty() || password.is_empty() {
            return Err(KeepsakeError::Unauthenticated);
        }
        if state.accounts.contains_key(login) {
            return Err(KeepsakeError::AlreadyExists(login.to_string()));
        }
        state.next_user_id += 1;
        let user_id = state.next_user_id;
        let salt = random_bytes();
        state.accounts.insert(
            login.to_string(),
            Account {
                user_id,
                salt,
                password_hash: hash_password(&salt, password),
            },
        );
        Ok(state.issue_token(user_id))
    }

    fn get_secret(&self, call: Call<'_>, id: u64) -> Result<SecretRecord> {
        let mut state = self.enter("get_secret", call)?;
        let user_id = state.authenticate(call.metadata)?;
        let record = state.owned_record_mut(user_id, id)?.clone();
        Ok(record)
    }

    fn list_secrets(&self, call: Call<'_>) -> Result<Vec<SecretRecord>> {
        let state = self.enter("list_secrets", call)?;
        let user_id = state.authenticate(call.metadata)?;
        Ok(state
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn save_secret(&self, call: Call<'_>, record: &SecretRecord) -> Result<u64> {
        let mut state = self.enter("save_secret", call)?;
        let user_id = state.authenticate(call.metadata)?;

        if record.id == 0 {
            state.next_secret_id += 1;
            let id = state.next_secret_id;
            let mut stored = record.clone();
            stored.id = id;
            stored.user_id = user_id;
            state.records.insert(id, stored);
            return Ok(id);
        }

        // Only the mutable fields change; ownership and creation time are
        // fixed at first persistence.
        let existing = state.owned_record_mut(user_id, record.id)?;
        existing.title = record.title.clone();
        existing.metadata = record.metadata.clone();
        existing.secret_type = record.secret_type.clone();
        existing.payload = record.payload.clone();
        existing.updated_at = record.updated_at;
        Ok(record.id)
    }

    fn delete_secret(&self, call: Call<'_>, id: u64) -> Result<()> {
        let mut state = self.enter("delete_secret", call)?;
        let user_id = state.authenticate(call.metadata)?;
        state.owned_record_mut(user_id, id)?;
        state.records.remove(&id);
        Ok(())
    }
}
