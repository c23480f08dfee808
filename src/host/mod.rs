//! Host platform seams
//!
//! The overlay never reaches into ambient host state. Everything it needs
//! from the content-management platform (attribute storage, permission
//! checks, anti-forgery tokens, field sanitation) comes in through the
//! traits defined here, together with reference implementations used by
//! the admin CLI and the tests.

mod authorizer;
mod file_store;
mod memory;
mod nonce;
mod sanitize;
mod traits;

pub use authorizer::{Role, RoleAuthorizer};
pub use file_store::TomlAttributeStore;
pub use memory::MemoryAttributeStore;
pub use nonce::SignedNonceService;
pub use sanitize::ProfileSanitizer;
pub use traits::*;
