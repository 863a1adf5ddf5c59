//! Request signing and token/identity authentication for end-to-end
//! encrypted storage clients.
//!
//! Three authenticators, each independent of the others:
//! [`tsv1::RequestSigner`] signs individual anonymous/identity requests,
//! [`token::TokenAuthenticator`] holds a refreshable bearer token for normal
//! storage calls, and [`identity::IdentityLogin`] runs the PKCE exchange that
//! bootstraps a storage client from a human user's credentials.

mod error;
mod identity;
mod token;
mod tsv1;

pub use error::{AuthError, TransportError};
pub use identity::{DerivedIdentity, IdentityLogin, RealmInfo};
pub use token::TokenAuthenticator;
pub use tsv1::RequestSigner;
