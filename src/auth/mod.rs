mod oauth;
pub mod tokens;

pub use oauth::{CALLBACK_PORT_DEFAULT, check_auth, sign_in, sign_out};
pub use tokens::{KeyringStore, SecretStore, TokenStore};
