//! Blocking JSON-over-HTTP remote store client.
//!
//! Every request gets the auth headers from its `CallMetadata` (none before
//! login) and a hard timeout: the configured per-call limit, shortened to
//! whatever is left of the caller's `CancelToken` deadline.  Transport
//! failures are mapped onto the small transport error set; they never look
//! like crypto errors.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Call, RemoteStore, SecretRecord};
use crate::errors::{KeepsakeError, Result};

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct CredentialsBody<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct SaveBody<'a> {
    secret: &'a SecretRecord,
}

#[derive(Deserialize)]
struct SaveResponse {
    id: u64,
}

#[derive(Deserialize)]
struct SecretResponse {
    secret: SecretRecord,
}

#[derive(Deserialize)]
struct SecretsResponse {
    #[serde(default)]
    secrets: Vec<SecretRecord>,
}

/// What a failed request was about, for error mapping.
#[derive(Clone, Copy)]
enum Target<'a> {
    Account(&'a str),
    Secret(u64),
    Collection,
}

/// `RemoteStore` over HTTP.
#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpRemote {
    /// Build a client for `server_address`.
    ///
    /// A bare `host:port` is treated as `http://host:port`; TLS is the
    /// deployment's business (use an `https://` address).
    pub fn new(server_address: &str, timeout: Duration) -> Result<Self> {
        let trimmed = server_address.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(KeepsakeError::ConfigError(
                "server address is not set".into(),
            ));
        }
        if timeout.is_zero() {
            return Err(KeepsakeError::ConfigError(
                "request timeout must be greater than zero".into(),
            ));
        }
        let base_url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let agent = ureq::AgentBuilder::new()
            .user_agent(&format!("keepsake/{}", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            base_url,
            timeout,
            agent,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Build a request with auth headers and the effective timeout.
    fn request(&self, call: Call<'_>, method: &str, path: &str) -> Result<ureq::Request> {
        call.cancel.check()?;
        let timeout = call.cancel.call_timeout(self.timeout);
        if timeout.is_zero() {
            return Err(KeepsakeError::Timeout);
        }

        let mut req = self.agent.request(method, &self.url(path)).timeout(timeout);
        for (name, value) in call.metadata.headers() {
            req = req.set(name, &value);
        }
        Ok(req)
    }

    fn finish<T: DeserializeOwned>(
        &self,
        call: Call<'_>,
        method: &str,
        path: &str,
        target: Target<'_>,
        result: std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<T> {
        let response = result.map_err(|e| map_error(e, target))?;
        tracing::debug!(method, path, status = response.status(), "remote call");
        // The caller may have cancelled while we were blocked on the wire.
        call.cancel.check()?;
        response
            .into_json::<T>()
            .map_err(|e| KeepsakeError::Remote(format!("invalid response body: {e}")))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        call: Call<'_>,
        path: &str,
        target: Target<'_>,
    ) -> Result<T> {
        let result = self.request(call, "GET", path)?.call();
        self.finish(call, "GET", path, target, result)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        call: Call<'_>,
        path: &str,
        body: &B,
        target: Target<'_>,
    ) -> Result<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| KeepsakeError::SerializationError(e.to_string()))?;
        let result = self.request(call, "POST", path)?.send_json(body);
        self.finish(call, "POST", path, target, result)
    }
}

/// Map a ureq failure onto the transport error set.
fn map_error(err: ureq::Error, target: Target<'_>) -> KeepsakeError {
    match err {
        ureq::Error::Status(code, response) => {
            tracing::debug!(status = code, url = response.get_url(), "remote call rejected");
            match (code, target) {
                (401 | 403, _) => KeepsakeError::Unauthenticated,
                (404, Target::Secret(id)) => KeepsakeError::NotFound(id),
                (409, Target::Account(login)) => KeepsakeError::AlreadyExists(login.to_string()),
                (502..=504, _) => KeepsakeError::Unavailable(format!("server returned {code}")),
                _ => KeepsakeError::Remote(format!("server returned {code}")),
            }
        }
        ureq::Error::Transport(transport) => {
            if is_timeout(&transport) {
                KeepsakeError::Timeout
            } else {
                tracing::debug!(error = %transport, "transport failure");
                KeepsakeError::Unavailable(transport.to_string())
            }
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

impl RemoteStore for HttpRemote {
    fn login(&self, call: Call<'_>, login: &str, password: &str) -> Result<String> {
        let body = CredentialsBody { login, password };
        let response: TokenResponse =
            self.post_json(call, "/api/user/login", &body, Target::Account(login))?;
        Ok(response.access_token)
    }

    fn register(&self, call: Call<'_>, login: &str, password: &str) -> Result<String> {
        let body = CredentialsBody { login, password };
        let response: TokenResponse =
            self.post_json(call, "/api/user/register", &body, Target::Account(login))?;
        Ok(response.access_token)
    }

    fn get_secret(&self, call: Call<'_>, id: u64) -> Result<SecretRecord> {
        let path = format!("/api/secrets/{id}");
        let response: SecretResponse = self.get_json(call, &path, Target::Secret(id))?;
        Ok(response.secret)
    }

    fn list_secrets(&self, call: Call<'_>) -> Result<Vec<SecretRecord>> {
        let response: SecretsResponse =
            self.get_json(call, "/api/secrets", Target::Collection)?;
        Ok(response.secrets)
    }

    fn save_secret(&self, call: Call<'_>, record: &SecretRecord) -> Result<u64> {
        let target = match record.id {
            0 => Target::Collection,
            id => Target::Secret(id),
        };
        let response: SaveResponse =
            self.post_json(call, "/api/secrets", &SaveBody { secret: record }, target)?;
        Ok(response.id)
    }

    fn delete_secret(&self, call: Call<'_>, id: u64) -> Result<()> {
        let path = format!("/api/secrets/{id}");
        let result = self.request(call, "DELETE", &path)?.call();
        let response = result.map_err(|e| map_error(e, Target::Secret(id)))?;
        tracing::debug!(method = "DELETE", path = %path, status = response.status(), "remote call");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_addresses_get_a_scheme() {
        let remote = HttpRemote::new("127.0.0.1:50051", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(remote.base_url(), "http://127.0.0.1:50051");

        let remote = HttpRemote::new("https://vault.example.com/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(remote.base_url(), "https://vault.example.com");
    }

    #[test]
    fn empty_address_or_zero_timeout_is_a_config_error() {
        assert!(matches!(
            HttpRemote::new("  ", DEFAULT_TIMEOUT),
            Err(KeepsakeError::ConfigError(_))
        ));
        assert!(matches!(
            HttpRemote::new("localhost:1", Duration::ZERO),
            Err(KeepsakeError::ConfigError(_))
        ));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        use crate::cancel::CancelToken;
        use crate::errors::ErrorKind;
        use crate::remote::CallMetadata;

        // Port 9 (discard) on localhost is closed in any sane test box.
        let remote = HttpRemote::new("127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let meta = CallMetadata::anonymous(1);
        let cancel = CancelToken::new();
        let err = remote
            .login(Call::new(&meta, &cancel), "alice", "pw")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn cancelled_token_sends_nothing() {
        use crate::cancel::CancelToken;
        use crate::remote::CallMetadata;

        let remote = HttpRemote::new("127.0.0.1:9", DEFAULT_TIMEOUT).unwrap();
        let meta = CallMetadata::anonymous(1);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            remote.list_secrets(Call::new(&meta, &cancel)),
            Err(KeepsakeError::Cancelled)
        ));
    }
}
