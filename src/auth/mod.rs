pub mod credential;

pub use credential::{Claims, CredentialError, CredentialSigner};
