use roam::{DEFAULT_AGENT_PORT, DEFAULT_SERVER_PORT};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the controller listens on for agent telemetry.
    pub port: u16,
    /// Port replies are sent to on the originating agent's address.
    pub agent_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            agent_port: DEFAULT_AGENT_PORT,
        }
    }
}
