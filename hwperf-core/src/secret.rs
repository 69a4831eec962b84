use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Login secret. Never printed; wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
	pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

	pub fn expose(&self) -> &str { &self.0 }

	pub fn is_empty(&self) -> bool { self.0.is_empty() }

	/// Replace every occurrence of the secret in `text` with `<redacted>`.
	pub fn redact(&self, text: &str) -> String {
		if self.0.is_empty() { text.to_string() } else { text.replace(&self.0, REDACTED) }
	}
}

pub const REDACTED: &str = "<redacted>";
pub const EMPTY_PASSWORD: &str = "empty password provided";

impl fmt::Debug for Secret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Secret(<redacted>)") }
}

impl From<String> for Secret {
	fn from(value: String) -> Self { Self(value) }
}

/// Secret plus the number of prompts it may answer in one session.
#[derive(Debug, Clone)]
pub struct RemoteCredential {
	pub secret: Secret,
	pub max_prompts: u32,
}

impl RemoteCredential {
	pub fn new(secret: Secret, max_prompts: u32) -> Self { Self { secret, max_prompts } }

	/// An empty secret would answer every prompt with a bare newline.
	pub fn non_empty(secret: Secret, max_prompts: u32) -> crate::Result<Self> {
		if secret.is_empty() {
			return Err(crate::Error::config(EMPTY_PASSWORD));
		}
		Ok(Self::new(secret, max_prompts))
	}

	/// Read from the named environment variable; unset or empty is a configuration error.
	pub fn from_env(var: &str, max_prompts: u32) -> crate::Result<Self> {
		match std::env::var(var) {
			Ok(v) if !v.is_empty() => Ok(Self::new(Secret::new(v), max_prompts)),
			_ => Err(crate::Error::config(format!("password env var is not set: {var}"))),
		}
	}
}
