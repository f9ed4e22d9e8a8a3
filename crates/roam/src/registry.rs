use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::client::Client;
use crate::mac::MacAddr;
use crate::protocol::ScanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown client {0}")]
    UnknownClient(MacAddr),
}

/// A client record shared between handler tasks. Rate updates and
/// whole scan reports are applied under this lock, so each logical
/// update is atomic per client.
pub type SharedClient = Arc<Mutex<Client>>;

type ClientMap = HashMap<MacAddr, SharedClient>;

/// Single source of truth mapping hardware address to client record.
///
/// Records are created lazily on first contact and never removed.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<ClientMap>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing record or creates one. The whole
    /// lookup-or-insert runs under the write lock, so racing callers
    /// for the same address always end up sharing one record.
    pub fn get_or_create(&self, mac: MacAddr, ip: IpAddr) -> SharedClient {
        let mut clients = self.write_map();
        Arc::clone(clients.entry(mac).or_insert_with(|| {
            log::info!("registering new client {} at {}", mac, ip);
            Arc::new(Mutex::new(Client::new(mac, ip)))
        }))
    }

    pub fn get(&self, mac: MacAddr) -> Option<SharedClient> {
        self.read_map().get(&mac).map(Arc::clone)
    }

    pub fn contains(&self, mac: MacAddr) -> bool {
        self.read_map().contains_key(&mac)
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    /// Applies one throughput sample to both directions of a known
    /// client. Unknown addresses are a no-op signalled to the caller;
    /// handlers that want create-then-update call
    /// [`get_or_create`](Self::get_or_create) first.
    pub fn update_rates(&self, mac: MacAddr, rate: f32) -> Result<(), RegistryError> {
        let client = self.get(mac).ok_or(RegistryError::UnknownClient(mac))?;
        let mut client = lock(&client);
        client.update_up_rate(rate);
        client.update_down_rate(rate);
        Ok(())
    }

    /// Folds a scan report into a known client's signal history. The
    /// whole report runs under the client's lock so the padding
    /// arithmetic never interleaves with a concurrent report.
    pub fn apply_scan(&self, mac: MacAddr, report: &ScanReport) -> Result<(), RegistryError> {
        let client = self.get(mac).ok_or(RegistryError::UnknownClient(mac))?;
        lock(&client).update_location_info(report);
        Ok(())
    }

    /// One formatted line per client, for periodic status logging.
    pub fn summaries(&self) -> Vec<String> {
        self.read_map()
            .values()
            .map(|client| lock(client).to_string())
            .collect()
    }

    fn read_map(&self) -> RwLockReadGuard<'_, ClientMap> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, ClientMap> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Locks one client, recovering the record if a previous holder
/// panicked mid-update.
pub fn lock(client: &SharedClient) -> std::sync::MutexGuard<'_, Client> {
    client.lock().unwrap_or_else(PoisonError::into_inner)
}
