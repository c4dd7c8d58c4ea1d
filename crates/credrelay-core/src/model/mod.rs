// ── Domain model ──
//
// Plain data types shared by the registry, reconciler and orchestrator.
// Nothing in here performs I/O.

pub mod account;
pub mod attempt;
pub mod identifier;
pub mod site;

pub use account::{AccountId, LocalAccount, NewAccount};
pub use attempt::{AuthError, AuthResult, LoginAttempt};
pub use identifier::{IdentifierKind, is_email, login_from_email, sanitize_login};
pub use site::RemoteSite;
