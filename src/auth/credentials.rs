//! Login credentials and the session identity derived from them.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::session::SessionId;

/// A username/password pair within a target-specific namespace.
///
/// The namespace keeps identically named accounts on different targets from
/// sharing a cookie file; by convention it is the target's hostname.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    namespace: String,
}

impl Credentials {
    /// Builds a credential set.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            namespace: namespace.into(),
        }
    }

    /// The account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The target namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Derives the deterministic session identity for this credential set.
    ///
    /// Equal credentials always map to the same identity, so a later process
    /// resumes the same persisted cookie session. The identity is a SHA-256
    /// digest, never the raw credentials, so it is safe to use as a file name.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        let mut hasher = Sha256::new();
        hasher.update(self.namespace.as_bytes());
        hasher.update(b":");
        hasher.update(self.username.as_bytes());
        hasher.update(b":");
        hasher.update(self.password.as_bytes());
        SessionId::new(hex_encode(&hasher.finalize()))
    }
}

// Passwords stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use fmt::Write as _;
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut output, byte| {
            let _ = write!(output, "{byte:02x}");
            output
        },
    )
}
