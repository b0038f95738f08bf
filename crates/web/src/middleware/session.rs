//! Session middleware configuration.
//!
//! Production sessions live in `PostgreSQL` (`tower_sessions.session`);
//! tests pass an in-memory store. The session ID cookie is signed with a
//! key derived from `SUDSY_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sudsy_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

const KEY_CONTEXT: &[u8] = b"sudsy session cookie v1";

/// Cookie signing key for `secret`.
#[must_use]
pub fn session_key(secret: &SecretString) -> Key {
    let digest = Sha512::new()
        .chain_update(KEY_CONTEXT)
        .chain_update(secret.expose_secret().as_bytes())
        .finalize();
    // SHA-512 yields exactly the 64 bytes `Key` requires
    Key::from(digest.as_slice())
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S>(
    store: S,
    config: &WebConfig,
) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(session_key(&config.session_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_depends_on_secret() {
        let a = SecretString::from("k".repeat(32));
        let b = SecretString::from("j".repeat(32));

        assert_eq!(session_key(&a).master(), session_key(&a).master());
        assert_ne!(session_key(&a).master(), session_key(&b).master());
    }
}
