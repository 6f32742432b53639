//! In-memory remote memory service for testing
//!
//! Backs each data block with a plain byte array and implements the full
//! [`RemoteMemoryService`] surface, including failure injection (rejected
//! slots, failing reads/writes, link drops) and call logs so tests can assert
//! exact round-trip counts. Clones share state, letting a test keep a handle
//! while the runtime owns the service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::remote::{Endpoint, RemoteMemoryService, RemoteResult, RemoteStatus};

/// Status codes the simulator reports.
pub const SIM_ERR_REFUSED: RemoteStatus = RemoteStatus(1);
pub const SIM_ERR_NOT_CONNECTED: RemoteStatus = RemoteStatus(2);
pub const SIM_ERR_READ: RemoteStatus = RemoteStatus(3);
pub const SIM_ERR_WRITE: RemoteStatus = RemoteStatus(4);
pub const SIM_ERR_RANGE: RemoteStatus = RemoteStatus(5);

#[derive(Debug, Default)]
struct SimulatorInner {
    blocks: HashMap<u16, Vec<u8>>,
    connected: bool,
    /// Slots accepted by connect; empty means accept any
    accepted_slots: Vec<u16>,
    fail_reads: bool,
    fail_writes: bool,
    connect_calls: u32,
    /// (db_number, start, len) per read
    read_log: Vec<(u16, u32, u32)>,
    /// (db_number, start, bytes) per write
    write_log: Vec<(u16, u32, Vec<u8>)>,
}

/// Shared-state in-memory memory service.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMemoryService {
    inner: Arc<Mutex<SimulatorInner>>,
}

impl SimulatedMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a data block with the given contents.
    pub fn load_block(&self, db_number: u16, bytes: Vec<u8>) {
        self.inner.lock().unwrap().blocks.insert(db_number, bytes);
    }

    /// Create a zero-filled data block.
    pub fn create_block(&self, db_number: u16, len: usize) {
        self.load_block(db_number, vec![0; len]);
    }

    /// Restrict which slot identifiers connect will accept.
    pub fn accept_slots(&self, slots: &[u16]) {
        self.inner.lock().unwrap().accepted_slots = slots.to_vec();
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// Drop the link out from under the engine, as a cable pull would.
    pub fn drop_link(&self) {
        self.inner.lock().unwrap().connected = false;
    }

    pub fn connect_calls(&self) -> u32 {
        self.inner.lock().unwrap().connect_calls
    }

    pub fn read_log(&self) -> Vec<(u16, u32, u32)> {
        self.inner.lock().unwrap().read_log.clone()
    }

    pub fn write_log(&self) -> Vec<(u16, u32, Vec<u8>)> {
        self.inner.lock().unwrap().write_log.clone()
    }

    pub fn clear_logs(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_log.clear();
        inner.write_log.clear();
        inner.connect_calls = 0;
    }

    /// Raw block contents, for asserting written bytes.
    pub fn block(&self, db_number: u16) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().blocks.get(&db_number).cloned()
    }
}

#[async_trait]
impl RemoteMemoryService for SimulatedMemoryService {
    async fn connect(&mut self, _endpoint: &Endpoint, _rack: u16, slot: u16) -> RemoteResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.connect_calls += 1;
        if inner.accepted_slots.is_empty() || inner.accepted_slots.contains(&slot) {
            inner.connected = true;
            Ok(())
        } else {
            Err(SIM_ERR_REFUSED)
        }
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn read_bytes(&mut self, db_number: u16, start: u32, len: u32) -> RemoteResult<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SIM_ERR_NOT_CONNECTED);
        }
        inner.read_log.push((db_number, start, len));
        if inner.fail_reads {
            return Err(SIM_ERR_READ);
        }
        let block = inner.blocks.get(&db_number).ok_or(SIM_ERR_RANGE)?;
        let start = start as usize;
        let end = start + len as usize;
        if end > block.len() {
            return Err(SIM_ERR_RANGE);
        }
        Ok(block[start..end].to_vec())
    }

    async fn write_bytes(&mut self, db_number: u16, start: u32, bytes: &[u8]) -> RemoteResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SIM_ERR_NOT_CONNECTED);
        }
        inner
            .write_log
            .push((db_number, start, bytes.to_vec()));
        if inner.fail_writes {
            return Err(SIM_ERR_WRITE);
        }
        let block = inner.blocks.get_mut(&db_number).ok_or(SIM_ERR_RANGE)?;
        let start = start as usize;
        let end = start + bytes.len();
        if end > block.len() {
            return Err(SIM_ERR_RANGE);
        }
        block[start..end].copy_from_slice(bytes);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.inner.lock().unwrap().connected = false;
    }

    fn describe_error(&self, status: RemoteStatus) -> String {
        match status {
            SIM_ERR_REFUSED => "connection refused by simulator".to_string(),
            SIM_ERR_NOT_CONNECTED => "not connected".to_string(),
            SIM_ERR_READ => "injected read failure".to_string(),
            SIM_ERR_WRITE => "injected write failure".to_string(),
            SIM_ERR_RANGE => "address out of simulated block".to_string(),
            RemoteStatus(code) => format!("unknown status {code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_write_round_trip() {
        let sim = SimulatedMemoryService::new();
        sim.create_block(1, 8);
        let mut svc = sim.clone();

        let endpoint = Endpoint {
            host: "127.0.0.1".to_string(),
            port: 102,
        };
        svc.connect(&endpoint, 0, 1).await.unwrap();
        svc.write_bytes(1, 2, &[0xAB, 0xCD]).await.unwrap();
        assert_eq!(svc.read_bytes(1, 2, 2).await.unwrap(), vec![0xAB, 0xCD]);
        assert_eq!(sim.read_log(), vec![(1, 2, 2)]);
    }

    #[tokio::test]
    async fn rejects_unaccepted_slot() {
        let sim = SimulatedMemoryService::new();
        sim.accept_slots(&[2]);
        let mut svc = sim.clone();
        let endpoint = Endpoint {
            host: "127.0.0.1".to_string(),
            port: 102,
        };
        assert_eq!(
            svc.connect(&endpoint, 0, 0).await,
            Err(SIM_ERR_REFUSED)
        );
        assert!(!svc.is_connected());
        svc.connect(&endpoint, 0, 2).await.unwrap();
        assert!(svc.is_connected());
        assert_eq!(sim.connect_calls(), 2);
    }
}
