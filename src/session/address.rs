use sha2::{Digest, Sha256};

/// Length of the isolation key in hex characters.
pub const ISOLATION_KEY_LEN: usize = 16;

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// Navigation address with the credentials spliced into the user-info position.
///
/// Only `http://` and `https://` addresses are rewritten, and only when at least one of
/// `login`/`password` is non-empty. Both are percent-encoded so that `@`, `:` or `/`
/// inside a credential cannot shift the authority.
pub fn compose_address(base_url: &str, login: &str, password: &str) -> String {
    if login.is_empty() && password.is_empty() {
        return base_url.to_string();
    }
    for scheme in SCHEMES {
        if let Some(rest) = base_url.strip_prefix(scheme) {
            return format!(
                "{scheme}{}:{}@{rest}",
                urlencoding::encode(login),
                urlencoding::encode(password)
            );
        }
    }
    base_url.to_string()
}

/// Stable per-address key for the inner storage namespace.
///
/// Derived from the base address only; credentials never influence it.
pub fn isolation_key(base_url: &str) -> String {
    let digest = Sha256::digest(base_url.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(ISOLATION_KEY_LEN);
    key
}
