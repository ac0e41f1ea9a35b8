use anyhow::{Context, Result};
use log::info;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::runtime::port_allocator::{Port, PortAllocator};
use crate::runtime::traits::NetworkManager;

#[derive(Debug)]
struct Endpoint {
    address: String,
    /// Set when the port was taken from the local allocator.
    local_port: Option<Port>,
}

#[derive(Debug)]
struct Inner {
    allocator: PortAllocator,
    endpoints: HashMap<String, Endpoint>,
    instances: HashMap<String, usize>,
}

/// In-process [`NetworkManager`] allocating ports of one range on `127.0.0.1`.
pub struct LocalNetworkManager {
    inner: Mutex<Inner>,
}

impl LocalNetworkManager {
    pub fn new(port_range_start: Port, port_range_end: Port) -> Self {
        Self {
            inner: Mutex::new(Inner {
                allocator: PortAllocator::new(port_range_start, port_range_end),
                endpoints: HashMap::new(),
                instances: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn port_of(address: &str) -> Option<Port> {
    address.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
}

impl NetworkManager for LocalNetworkManager {
    fn reserve_port(&self, key: &str, address: Option<&str>) -> Result<String> {
        let mut inner = self.lock();
        if let Some(endpoint) = inner.endpoints.get(key) {
            return Ok(endpoint.address.clone());
        }

        let endpoint = match address {
            Some(address) => {
                let port = port_of(address);
                let local_port = port.filter(|p| inner.allocator.reserve(*p));
                Endpoint {
                    address: address.to_string(),
                    local_port,
                }
            }
            None => {
                let port = inner
                    .allocator
                    .allocate()
                    .with_context(|| format!("No free port left for '{}'", key))?;
                Endpoint {
                    address: format!("127.0.0.1:{}", port),
                    local_port: Some(port),
                }
            }
        };
        info!("Network: Reserved {} for '{}'", endpoint.address, key);
        let address = endpoint.address.clone();
        inner.endpoints.insert(key.to_string(), endpoint);
        Ok(address)
    }

    fn release_port(&self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        if let Some(endpoint) = inner.endpoints.remove(key) {
            if let Some(port) = endpoint.local_port {
                inner.allocator.release(port);
            }
            info!("Network: Released {} of '{}'", endpoint.address, key);
        }
        Ok(())
    }

    fn port(&self, key: &str) -> Option<String> {
        self.lock().endpoints.get(key).map(|e| e.address.clone())
    }

    fn registered_instances(&self, key: &str) -> usize {
        self.lock().instances.get(key).copied().unwrap_or(0)
    }

    fn register_instance(&self, key: &str) {
        *self.lock().instances.entry(key.to_string()).or_insert(0) += 1;
    }

    fn unregister_instance(&self, key: &str) {
        let mut inner = self.lock();
        if let Some(count) = inner.instances.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                inner.instances.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release() {
        let network = LocalNetworkManager::new(7000, 7001);

        let first = network.reserve_port("admin_a", None).unwrap();
        assert_eq!(first, "127.0.0.1:7000");
        // reserving again is idempotent
        assert_eq!(network.reserve_port("admin_a", None).unwrap(), first);

        assert_eq!(
            network.reserve_port("broker", Some("localhost:7001")).unwrap(),
            "localhost:7001"
        );
        assert!(network.reserve_port("admin_b", None).is_err());

        network.release_port("broker").unwrap();
        assert!(network.port("broker").is_none());
        assert_eq!(network.reserve_port("admin_b", None).unwrap(), "127.0.0.1:7001");
    }

    #[test]
    fn test_instance_counting() {
        let network = LocalNetworkManager::new(7000, 7010);
        network.register_instance("broker");
        network.register_instance("broker");
        network.unregister_instance("broker");
        assert_eq!(network.registered_instances("broker"), 1);
        network.unregister_instance("broker");
        network.unregister_instance("broker");
        assert_eq!(network.registered_instances("broker"), 0);
    }
}
