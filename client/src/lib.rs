//! # Mimic Client
//! Reconstructs server-owned objects from incoming replication payloads,
//! buffers timestamped snapshots for smooth presentation of remote motion,
//! and pushes owner-authoritative local changes back to the server.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod client;
mod client_config;
mod error;
mod smoothing;
mod snapshot;
mod transport;

pub use client::{Client, ClientEvent, ClientObject};
pub use client_config::{ClientConfig, InterpolationConfig};
pub use error::ClientError;
pub use smoothing::MotionSmoother;
pub use snapshot::{Snapshot, SnapshotBuffer};
pub use transport::PacketSender;
