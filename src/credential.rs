//! Credential-domain identifiers, redacted secrets, and the service token model.

pub mod id;
pub mod secret;
pub mod service_token;

pub use id::*;
pub use secret::*;
pub use service_token::*;
