//! # wb-hub
//!
//! The live-update engine of Wassup-Board: which connections are live, how
//! posts flow from a socket into the store, and how every change fans back
//! out to the right viewers.
//!
//! Control flow: an upgraded transport is handed to
//! [`Hub::register_connection`], which pushes the current state, registers the
//! connection and spawns its ingestion loop. Loops feed two bounded queues
//! drained by exactly two workers (persistence, broadcast), which fan out
//! through the [`ConnectionRegistry`].

pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
mod ingest;
pub mod registry;
mod supervisor;
pub mod text_buffer;
mod workers;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{HubConfig, DEFAULT_INITIAL_PUSH_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
pub use connection::{Connection, ConnectionId, ConnectionReader};
pub use error::{HubError, SendError};
pub use hub::Hub;
pub use registry::{BroadcastPayload, BroadcastReport, ConnectionRegistry};
pub use supervisor::TaskKind;
pub use text_buffer::TextBuffer;
pub use workers::Signal;
