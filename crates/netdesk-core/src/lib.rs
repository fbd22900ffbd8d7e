//! State model and console runtime between `netdesk-api` and the operator CLI.
//!
//! This crate owns the business logic of the network-access console:
//!
//! - **Domain model** ([`model`]) — switches, ports, the IP-level address
//!   table, the connection point and its [`ConnectionPolicy`]. Pure data plus
//!   derived queries (rollups, binding mismatches).
//!
//! - **[`SelectionSet`]** — the global set of selected ports, always queried
//!   per switch, with tri-state "select all" logic.
//!
//! - **[`DiagnosticsSession`]** — the switch → port → tab state machine with
//!   three independent [`AsyncSlot`]s (tab data, cable test, discovery).
//!   Every request carries a monotonic [`RequestToken`]; only the settlement
//!   matching the slot's in-flight token lands.
//!
//! - **[`ConsoleState`]** — the façade. [`ConsoleState::apply`] takes a
//!   [`Command`] and returns the side-effect descriptors ([`Effect`]) it
//!   produced. It performs no I/O, so the whole state machine is testable
//!   without a runtime.
//!
//! - **[`Console`]** — the async runtime. It owns the state on one command
//!   processor task, executes effects against the collaborator traits in
//!   [`backend`], feeds settlements back in and broadcasts the read model
//!   through a `watch` channel ([`StateStream`]).

pub mod backend;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod state;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, PolicyEnforcement, Provisioning, Telemetry};
pub use command::{Command, Effect, OperationAck, ReconfigureParams};
pub use config::{ConsoleConfig, ConsoleSettings, TlsVerification};
pub use error::{CollaboratorError, CollaboratorErrorKind, CoreError};
pub use runtime::{Console, HttpConsole};
pub use selection::{SelectAllState, SelectionSet};
pub use session::{AsyncSlot, DiagnosticsSession, RequestToken, SessionId, SessionPhase, Settlement};
pub use state::{ConsoleState, Disclosure, Notice, NoticeLevel, PendingOperation, PortControl};
pub use stream::{StateStream, StateWatchStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // IP-level table
    AddressEntry,
    AddressStatus,
    AddressTable,
    // Policy
    AutoBlock,
    AutoBlockEvidence,
    BandwidthCaps,
    // Diagnostics
    CableReport,
    ChartConfig,
    ChartKind,
    // Connection point
    ConnectionPoint,
    ConnectionPolicy,
    ConnectionSummary,
    DhcpMode,
    DiscoveredDevice,
    DistributionMode,
    InternetAccess,
    IntervalStep,
    // Inventory
    Inventory,
    LeaseRecord,
    LinkState,
    MacAddress,
    PairReport,
    PairStatus,
    Port,
    PortId,
    PortRollup,
    PortStatus,
    SiteSnapshot,
    SpeedSetting,
    SpeedTier,
    Switch,
    SwitchId,
    Tab,
    TabPayload,
    TimeInterval,
    VlanNumber,
};
