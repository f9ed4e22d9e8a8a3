pub mod client;
pub mod mac;
pub mod mobility;
pub mod protocol;
pub mod registry;

pub use client::{Client, DEFAULT_APP};
pub use mac::MacAddr;
pub use mobility::{MobilityError, mobility_prediction, signal_evaluation};
pub use protocol::{
    AgentMessage, DEFAULT_AGENT_PORT, DEFAULT_SERVER_PORT, MAX_DATAGRAM_SIZE, ParseError,
    ScanEntry, ScanReport, parse_message,
};
pub use registry::{ClientRegistry, RegistryError, SharedClient};
