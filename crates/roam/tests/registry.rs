use std::net::IpAddr;
use std::sync::Arc;
use std::thread;

use roam::registry::lock;
use roam::{ClientRegistry, MacAddr, ScanEntry, ScanReport};

fn mac(s: &str) -> MacAddr {
    s.parse().unwrap()
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn report(bssid: &str, level: i32) -> ScanReport {
    ScanReport {
        entries: vec![ScanEntry {
            ssid: "eduroam".to_string(),
            bssid: bssid.to_string(),
            level,
        }],
    }
}

#[test]
fn test_concurrent_get_or_create_yields_one_record() {
    let registry = Arc::new(ClientRegistry::new());
    let address = mac("aa:bb:cc:00:11:22");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get_or_create(address, ip("10.0.0.1")))
        })
        .collect();

    let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.len(), 1);
    for client in &clients[1..] {
        assert!(Arc::ptr_eq(&clients[0], client));
    }
}

#[test]
fn test_concurrent_rate_updates_stay_consistent() {
    let registry = Arc::new(ClientRegistry::new());
    let address = mac("aa:bb:cc:00:11:22");
    registry.get_or_create(address, ip("10.0.0.1"));

    // Every update carries the same sample, so any serialization of
    // the read-modify-write steps must land on exactly that value. A
    // torn update would not.
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..100 {
                    registry.update_rates(address, 42.0).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let client = registry.get(address).unwrap();
    let client = lock(&client);
    assert_eq!(client.up_rate(), 42.0);
    assert_eq!(client.down_rate(), 42.0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_concurrent_scans_preserve_history_lengths() {
    let registry = Arc::new(ClientRegistry::new());
    let address = mac("aa:bb:cc:00:11:22");
    registry.get_or_create(address, ip("10.0.0.1"));

    // Each thread reports a different access point; reports interleave
    // arbitrarily, but every history must track the scan counter.
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let bssid = format!("00:1f:33:a0:00:0{}", worker);
                for round in 0..50 {
                    registry
                        .apply_scan(address, &report(&bssid, -60 - round))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let client = registry.get(address).unwrap();
    let client = lock(&client);
    assert_eq!(client.scan_count(), 200);
    for worker in 0..4 {
        let bssid = format!("00:1f:33:a0:00:0{}", worker);
        assert_eq!(client.samples(&bssid).unwrap().len(), 200);
    }
}

#[test]
fn test_distinct_addresses_get_distinct_records() {
    let registry = ClientRegistry::new();
    let first = registry.get_or_create(mac("aa:bb:cc:00:11:22"), ip("10.0.0.1"));
    let second = registry.get_or_create(mac("aa:bb:cc:00:11:23"), ip("10.0.0.2"));

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 2);
    assert!(*lock(&first) < *lock(&second));
}
