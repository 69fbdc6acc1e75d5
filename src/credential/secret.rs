//! Secure secret wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

const MASK_CHAR: char = 'x';
const VISIBLE_SUFFIX: usize = 4;

/// Redacted secret wrapper keeping API tokens and client secrets out of logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret holds no characters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Renders the secret with every character but the last four replaced by `x`.
	///
	/// Secrets of four characters or fewer are masked entirely.
	pub fn masked(&self) -> String {
		let len = self.0.chars().count();

		if len <= VISIBLE_SUFFIX {
			return MASK_CHAR.to_string().repeat(len);
		}

		let hidden = len - VISIBLE_SUFFIX;

		self.0.chars().enumerate().map(|(i, c)| if i < hidden { MASK_CHAR } else { c }).collect()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
