//! Authentication Module
//! Mission: Credential storage, password hashing, and signed bearer tokens

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod store;

pub use jwt::TokenIssuer;
pub use middleware::auth_middleware;
pub use password::PasswordHasher;
pub use store::{CredentialStore, SqliteCredentialStore};
