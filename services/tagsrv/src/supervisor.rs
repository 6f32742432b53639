//! Connection supervision
//!
//! Owns the link to the remote memory service and the only retry policy in
//! the system: read/write failures elsewhere are reported, never retried.
//! The state machine is driven by the runtime's tick with an explicit
//! `Instant`, so tests inject simulated time and simulated service responses
//! instead of a network.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::remote::{Endpoint, RemoteMemoryService, TransportProbe};

/// Link state owned exclusively by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// Reconnection policy: fixed cool-down between attempts, fixed pause
/// between slot candidates inside one attempt, and a hard retry ceiling.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub cooldown: Duration,
    pub candidate_pause: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(5),
            candidate_pause: Duration::from_millis(500),
            max_attempts: 10,
        }
    }
}

/// Where and what to connect to.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub endpoint: Endpoint,
    pub rack: u16,
    /// Ordered slot identifiers to try; first success wins
    pub slot_candidates: Vec<u16>,
}

/// Last-resort recovery once the reconnect budget is exhausted. The remote
/// service's internal state after repeated failures is not introspectable,
/// so recovery is deliberately coarse: restart the whole process.
pub trait RestartHandler: Send {
    fn restart(&self);
}

/// Production handler: exit and let host supervision bring the process back.
pub struct ProcessRestart;

impl RestartHandler for ProcessRestart {
    fn restart(&self) {
        error!("restarting process");
        std::process::exit(1);
    }
}

pub struct ConnectionSupervisor {
    service: Box<dyn RemoteMemoryService>,
    probe: Box<dyn TransportProbe>,
    restart: Box<dyn RestartHandler>,
    target: ConnectTarget,
    policy: ReconnectPolicy,
    state: LinkState,
    retries: u32,
    last_attempt: Option<Instant>,
    escalated: bool,
}

impl ConnectionSupervisor {
    pub fn new(
        service: Box<dyn RemoteMemoryService>,
        probe: Box<dyn TransportProbe>,
        restart: Box<dyn RestartHandler>,
        target: ConnectTarget,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            service,
            probe,
            restart,
            target,
            policy,
            state: LinkState::Disconnected,
            retries: 0,
            last_attempt: None,
            escalated: false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    /// The link handle, for the poller and writer. Callers must check
    /// [`ConnectionSupervisor::is_connected`] first.
    pub fn service_mut(&mut self) -> &mut dyn RemoteMemoryService {
        &mut *self.service
    }

    /// Advance the state machine. While connected this only verifies the
    /// service still reports the link as established; while disconnected it
    /// makes at most one reconnect attempt per elapsed cool-down.
    pub async fn tick(&mut self, now: Instant) {
        if self.state == LinkState::Connected && !self.service.is_connected() {
            warn!("remote service reports link lost");
            self.state = LinkState::Disconnected;
        }

        if self.state == LinkState::Disconnected && self.cooldown_elapsed(now) {
            self.attempt(now).await;
        }
    }

    /// Drop the session and retry on the next tick without waiting for the
    /// cool-down. Operator-initiated, so the retry budget starts fresh.
    pub async fn force_reconnect(&mut self) {
        info!("forced reconnect requested");
        self.service.disconnect().await;
        self.state = LinkState::Disconnected;
        self.last_attempt = None;
        self.retries = 0;
        self.escalated = false;
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.last_attempt
            .map_or(true, |t| now.duration_since(t) >= self.policy.cooldown)
    }

    /// One attempt cycle: preflight probe, then each slot candidate once
    /// with a fixed pause in between. Increments the retry counter whatever
    /// the outcome; success resets it.
    async fn attempt(&mut self, now: Instant) {
        self.last_attempt = Some(now);
        self.retries += 1;
        info!(
            attempt = self.retries,
            max = self.policy.max_attempts,
            endpoint = %self.target.endpoint,
            "connecting to remote memory service"
        );

        if self.probe.probe(&self.target.endpoint).await {
            for (i, &slot) in self.target.slot_candidates.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.policy.candidate_pause).await;
                }
                match self
                    .service
                    .connect(&self.target.endpoint, self.target.rack, slot)
                    .await
                {
                    Ok(()) => {
                        info!(rack = self.target.rack, slot, "connected");
                        self.state = LinkState::Connected;
                        self.retries = 0;
                        self.escalated = false;
                        return;
                    }
                    Err(status) => {
                        debug!(slot, error = %self.service.describe_error(status), "slot candidate failed");
                    }
                }
            }
            warn!("all slot candidates failed");
        } else {
            warn!(endpoint = %self.target.endpoint, "transport preflight failed, attempt abandoned");
        }

        if self.retries >= self.policy.max_attempts && !self.escalated {
            self.escalated = true;
            error!(
                attempts = self.retries,
                "reconnect budget exhausted, escalating to process restart"
            );
            self.restart.restart();
        }
    }
}
