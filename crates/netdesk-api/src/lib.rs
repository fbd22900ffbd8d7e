// netdesk-api: Async Rust client for the netdesk collaborator backend
//
// One JSON/HTTP surface covers the three collaborators the console talks to:
// provisioning (inventory + policy writes), telemetry (per-port diagnostics)
// and policy enforcement (auto-block evidence). Nothing here knows about
// selection, sessions or tokens -- that lives in `netdesk-core`.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::BackendClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
