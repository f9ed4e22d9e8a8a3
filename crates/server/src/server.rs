use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::UdpSocket;

use roam::registry::lock;
use roam::{AgentMessage, ClientRegistry, MAX_DATAGRAM_SIZE, MacAddr, parse_message};

use crate::config::ServerConfig;

const ACK: &[u8] = b"ack\n";

/// The controller's UDP front end: one task owns the receive loop,
/// every datagram is handled on its own spawned task.
pub struct OffloadServer {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    config: ServerConfig,
    running: Arc<AtomicBool>,
}

impl OffloadServer {
    /// Binds the controller socket. A bind failure is fatal; the
    /// caller terminates the process.
    pub async fn bind(bind_ip: &str, config: ServerConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(format!("{}:{}", bind_ip, config.port)).await?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            registry: Arc::new(ClientRegistry::new()),
            config,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Receive loop. Never executes message logic itself: each
    /// datagram is copied out of the buffer and handed to a worker
    /// task, so a slow handler cannot stall the socket.
    pub async fn run(&self) -> io::Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        while self.running.load(Ordering::SeqCst) {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, addr)) => {
                    let payload = buf[..len].to_vec();
                    let handler = Handler {
                        socket: Arc::clone(&self.socket),
                        registry: Arc::clone(&self.registry),
                        agent_port: self.config.agent_port,
                    };
                    tokio::spawn(async move { handler.handle(payload, addr).await });
                }
                Err(e) if is_transient(e.kind()) => {
                    log::warn!("receive failed, dropping datagram: {}", e);
                }
                Err(e) => {
                    log::error!("controller socket on {} unusable: {}", self.local_addr, e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Per-datagram worker: parses the payload and runs the matching
/// handler. Failures stay local to the task; the receive loop never
/// sees them.
struct Handler {
    socket: Arc<UdpSocket>,
    registry: Arc<ClientRegistry>,
    agent_port: u16,
}

impl Handler {
    async fn handle(&self, payload: Vec<u8>, agent: SocketAddr) {
        match parse_message(&payload) {
            Ok(Some(message)) => {
                if let Err(e) = self.dispatch(message, agent).await {
                    log::warn!("handler failed for {}: {}", agent, e);
                }
            }
            Ok(None) => log::debug!("ignoring unknown message from {}", agent),
            Err(e) => log::debug!("malformed datagram from {}: {}", agent, e),
        }
    }

    async fn dispatch(&self, message: AgentMessage, agent: SocketAddr) -> io::Result<()> {
        match message {
            AgentMessage::Ping => self.receive_ping(agent),
            AgentMessage::ClientInfo { mac, ip } => {
                self.receive_client_info(agent, mac, ip).await?;
            }
            AgentMessage::AgentRate { rate } => self.receive_agent_rate(agent, rate),
            AgentMessage::ClientRate { mac, ip, rate } => {
                self.receive_client_rate(agent, mac, ip, rate);
            }
        }
        Ok(())
    }

    fn receive_ping(&self, agent: SocketAddr) {
        log::debug!("ping from agent {}", agent);
    }

    /// Registers or refreshes the client and acknowledges the agent on
    /// its callback port.
    async fn receive_client_info(
        &self,
        agent: SocketAddr,
        mac: MacAddr,
        ip: IpAddr,
    ) -> io::Result<()> {
        log::info!("client message from {}: {} - {}", agent, mac, ip);

        let client = self.registry.get_or_create(mac, ip);
        {
            let mut client = lock(&client);
            client.set_ip(ip);
            client.set_agent_addr(agent);
        }

        let reply_to = SocketAddr::new(agent.ip(), self.agent_port);
        self.socket.send_to(ACK, reply_to).await?;
        Ok(())
    }

    /// Access-point-level aggregate rate; attributed to the agent, not
    /// to any one client.
    fn receive_agent_rate(&self, agent: SocketAddr, rate: f32) {
        log::info!("agent rate message from {}: {}", agent, rate);
    }

    fn receive_client_rate(&self, agent: SocketAddr, mac: MacAddr, ip: IpAddr, rate: f32) {
        log::info!(
            "client rate message from {}: {} -- {} -- {}",
            agent,
            mac,
            ip,
            rate
        );

        let client = self.registry.get_or_create(mac, ip);
        let mut client = lock(&client);
        client.set_ip(ip);
        client.set_agent_addr(agent);
        client.update_up_rate(rate);
        client.update_down_rate(rate);
    }
}
