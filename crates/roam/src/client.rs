use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use crate::mac::MacAddr;
use crate::mobility::{self, MobilityError};
use crate::protocol::ScanReport;

/// Traffic-class label assigned until an agent reports otherwise.
pub const DEFAULT_APP: &str = "trivial";

/// One observed wireless device: identity, last-known addressing, rate
/// estimates and per-access-point signal history.
///
/// Records are process-lifetime entities owned by the
/// [`ClientRegistry`](crate::registry::ClientRegistry); identity,
/// equality and ordering are the hardware address alone.
#[derive(Debug, Clone)]
pub struct Client {
    mac: MacAddr,
    ip: IpAddr,
    app: String,
    up_rate: f32,
    down_rate: f32,
    connect_time: Instant,
    /// Datapath id of the switch this client is attached to. The
    /// switch itself is owned elsewhere; this is only a lookup key.
    switch_dpid: Option<u64>,
    /// Address of the agent serving this client, used to send replies.
    agent_addr: Option<SocketAddr>,
    /// BSSID (lowercased) -> dBm samples in arrival order.
    signal_history: HashMap<String, Vec<i32>>,
    scan_count: u32,
}

impl Client {
    pub fn new(mac: MacAddr, ip: IpAddr) -> Self {
        Self {
            mac,
            ip,
            app: DEFAULT_APP.to_string(),
            up_rate: 0.0,
            down_rate: 0.0,
            connect_time: Instant::now(),
            switch_dpid: None,
            agent_addr: None,
            signal_history: HashMap::new(),
            scan_count: 0,
        }
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn set_ip(&mut self, ip: IpAddr) {
        self.ip = ip;
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn set_app(&mut self, app: impl Into<String>) {
        self.app = app.into();
    }

    pub fn up_rate(&self) -> f32 {
        self.up_rate
    }

    pub fn down_rate(&self) -> f32 {
        self.down_rate
    }

    pub fn switch_dpid(&self) -> Option<u64> {
        self.switch_dpid
    }

    pub fn set_switch_dpid(&mut self, dpid: u64) {
        self.switch_dpid = Some(dpid);
    }

    pub fn agent_addr(&self) -> Option<SocketAddr> {
        self.agent_addr
    }

    pub fn set_agent_addr(&mut self, addr: SocketAddr) {
        self.agent_addr = Some(addr);
    }

    pub fn scan_count(&self) -> u32 {
        self.scan_count
    }

    pub fn connected_secs(&self) -> u64 {
        self.connect_time.elapsed().as_secs()
    }

    /// First sample replaces the initial zero exactly; every later
    /// sample is averaged with the stored value.
    pub fn update_up_rate(&mut self, sample: f32) {
        self.up_rate = smooth(self.up_rate, sample);
    }

    pub fn update_down_rate(&mut self, sample: f32) {
        self.down_rate = smooth(self.down_rate, sample);
    }

    /// Recorded samples for one access point, if any.
    pub fn samples(&self, bssid: &str) -> Option<&[i32]> {
        self.signal_history
            .get(&bssid.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    pub fn tracked_bssids(&self) -> impl Iterator<Item = &str> {
        self.signal_history.keys().map(String::as_str)
    }

    /// Folds one scan report into the signal history.
    ///
    /// The scan counter advances once per report. An access point seen
    /// for the first time is seeded with its level repeated for every
    /// report it missed; a known access point is padded with its own
    /// last value before the new level is appended; access points
    /// silent in this report keep their last value. After every call,
    /// each tracked BSSID's sample count equals the scan counter.
    pub fn update_location_info(&mut self, report: &ScanReport) {
        self.scan_count += 1;
        let count = self.scan_count as usize;

        for entry in &report.entries {
            let bssid = entry.bssid.to_ascii_lowercase();
            let samples = self.signal_history.entry(bssid).or_default();

            if let Some(&last) = samples.last() {
                samples.resize(count - 1, last);
                samples.push(entry.level);
            } else {
                samples.resize(count, entry.level);
            }
        }

        for samples in self.signal_history.values_mut() {
            if let Some(&last) = samples.last() {
                if samples.len() < count {
                    samples.resize(count, last);
                }
            }
        }
    }

    /// Mobility score for one access point; see [`crate::mobility`].
    pub fn mobility_prediction(&self, bssid: &str) -> Result<f32, MobilityError> {
        let key = bssid.to_ascii_lowercase();
        let samples = self
            .signal_history
            .get(&key)
            .ok_or_else(|| MobilityError::UnknownAccessPoint(key.clone()))?;
        mobility::mobility_prediction(&key, samples)
    }

    /// Offload-priority score for one access point.
    pub fn signal_evaluation(&self, bssid: &str) -> Result<f32, MobilityError> {
        let key = bssid.to_ascii_lowercase();
        let samples = self
            .signal_history
            .get(&key)
            .ok_or_else(|| MobilityError::UnknownAccessPoint(key.clone()))?;
        mobility::signal_evaluation(&key, samples)
    }
}

fn smooth(current: f32, sample: f32) -> f32 {
    if current == 0.0 {
        sample
    } else {
        (current + sample) / 2.0
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "client {}, ip={}, app={}, uprate={}, downrate={}",
            self.mac, self.ip, self.app, self.up_rate, self.down_rate
        )
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.mac == other.mac
    }
}

impl Eq for Client {}

impl PartialOrd for Client {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Client {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mac.to_u64().cmp(&other.mac.to_u64())
    }
}
