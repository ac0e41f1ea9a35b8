//! # Service Manager
//!
//! Control plane of an edgeflow device: keeps the catalogue of deployed artifacts, works out
//! in which order their services can start, and drives each service through its lifecycle
//! on a deployment substrate.
//!
//! ## Modules
//! - `registry`: artifacts and the service index, descriptor resolution from disk.
//! - `layout`: connector classification and the dependency scheduler.
//! - `runtime`: substrate, control stub and network manager seams with local implementations.
//! - `servers`: co-located servers shared between artifacts.
//! - `supervisor`: the lifecycle orchestrator.
//! - `api`: administrative command dispatch.

pub mod api;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod layout;
pub mod registry;
pub mod runtime;
pub mod servers;
pub mod supervisor;

pub use config::ManagerConfig;
pub use error::{ManagerError, Result};
pub use supervisor::{Collaborators, Orchestrator};
