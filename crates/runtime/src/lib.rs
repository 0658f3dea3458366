//! Glove engine runtime - engine lifecycle, transport, and connection.
//!
//! This crate provides the low-level infrastructure for communicating with
//! the glove engine:
//!
//! - **Engine management**: Locating and launching the engine daemon
//! - **Transport**: Length-prefixed JSON framing over stdio or in-memory
//!   duplex pipes
//! - **Connection**: Request/response correlation and event dispatch
//! - **Sample store**: The newest device packet per glove, fed by engine
//!   `sample` events
//! - **Emulated engine**: An in-process engine implementation (the debug
//!   device) serving the same wire contract
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │    mg-rs    │  Session / Glove objects
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  mg-runtime │  This crate
//! │  ┌────────┐ │
//! │  │ Conn   │ │  Request/response correlation + sample store
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  Length-prefixed JSON framing
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Engine │ │  Daemon process or in-process emulation
//! │  └────────┘ │
//! └─────────────┘
//! ```

pub mod connection;
pub mod emulated;
pub mod error;
pub mod samples;
pub mod server;
pub mod transport;

// Re-export key types at crate root
pub use connection::{Connection, ErrorPayload, Event, Message, Request, Response};
pub use emulated::{EmulatedEngine, EmulatedEngineOptions, PROFILES_FILE};
pub use error::{Error, Result};
pub use samples::{Sample, SampleStore};
pub use server::{ENGINE_EXE, ENGINE_EXE_ENV, EngineServer, find_engine_executable};
pub use transport::{
    PipeTransport, PipeTransportReceiver, PipeTransportSender, Transport, TransportParts,
    TransportReceiver,
};
