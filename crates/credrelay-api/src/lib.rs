// credrelay-api: HTTP Basic-Auth probe client for remote user-info endpoints
//
// One probe = one `GET https://{site}/wp-json/wp/v2/users/me` carrying the
// submitted credentials. The client never retries; callers decide what to
// do with each `ProbeOutcome`.

pub mod error;
pub mod identity;
pub mod probe;
pub mod profile;
pub mod transport;

pub use error::Error;
pub use identity::ClientIdentity;
pub use probe::{ProbeClient, ProbeOutcome, USER_INFO_PATH};
pub use profile::UserProfile;
pub use transport::{TlsMode, TransportConfig};
