//! S7 block-tag polling service
//!
//! Polls named process variables ("tags") out of a controller's numbered
//! data blocks and exposes them as scaled engineering values. The wire
//! protocol is an external collaborator behind [`remote::RemoteMemoryService`];
//! this crate owns address resolution ([`s7block`]), batch polling, single-tag
//! writes and connection supervision, all driven by one cooperative loop.

pub mod catalog;
pub mod config;
pub mod csv_loader;
pub mod error;
pub mod poller;
pub mod remote;
pub mod runtime;
pub mod simulator;
pub mod store;
pub mod supervisor;
pub mod writer;

pub use catalog::{TagCatalog, TagDefinition};
pub use config::TagServiceConfig;
pub use error::{Result, TagSrvError};
pub use poller::BatchReader;
pub use remote::{Endpoint, RemoteMemoryService, RemoteStatus, TransportProbe};
pub use runtime::{RuntimeHandle, ServiceStatus, TagRuntime};
pub use store::{CurrentValueStore, TagValue};
pub use supervisor::{ConnectionSupervisor, LinkState, ReconnectPolicy};
pub use writer::TagWriter;
