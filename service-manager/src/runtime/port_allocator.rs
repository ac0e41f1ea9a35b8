use std::collections::HashSet;
use std::ops::RangeInclusive;

pub type Port = u16;

/// Hands out ports of a fixed range.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    range: RangeInclusive<Port>,
    used_ports: HashSet<Port>,
}

impl PortAllocator {
    pub fn new(start: Port, end: Port) -> Self {
        Self {
            range: start..=end,
            used_ports: HashSet::new(),
        }
    }

    /// Marks `port` as taken. Ports outside the range are not tracked.
    pub fn reserve(&mut self, port: Port) -> bool {
        self.range.contains(&port) && self.used_ports.insert(port)
    }

    /// Takes the lowest free port.
    pub fn allocate(&mut self) -> Option<Port> {
        let port = self.range.clone().find(|p| !self.used_ports.contains(p))?;
        self.used_ports.insert(port);
        Some(port)
    }

    pub fn release(&mut self, port: Port) {
        self.used_ports.remove(&port);
    }

    pub fn in_use(&self) -> usize {
        self.used_ports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_until_exhausted() {
        let mut allocator = PortAllocator::new(9000, 9002);
        assert!(allocator.reserve(9001));
        assert!(!allocator.reserve(9001));
        assert!(!allocator.reserve(8000));

        assert_eq!(allocator.allocate(), Some(9000));
        assert_eq!(allocator.allocate(), Some(9002));
        assert_eq!(allocator.allocate(), None);

        allocator.release(9001);
        assert_eq!(allocator.allocate(), Some(9001));
        assert_eq!(allocator.in_use(), 3);
    }
}
