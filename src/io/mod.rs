// src/io/mod.rs
//
// Transport layer for the HC-05 console. One driver today: a serial port
// reader/writer running on a dedicated blocking thread, reporting back to
// the UI task through a channel of link events.

pub mod serial;

use std::sync::mpsc as std_mpsc;

use crate::classify::Record;

pub use serial::{list_ports, LinkConfig, Parity, PortInfo, SerialLink};

// ============================================================================
// Link Events
// ============================================================================

/// Message from the link's read thread to the UI task.
#[derive(Debug)]
pub enum LinkEvent {
    /// Classified records parsed out of the inbound stream.
    Records(Vec<Record>),
    /// The stream ended. Reason is "disconnected", "stopped" or "error".
    Ended(String),
    /// A read error that terminates the stream.
    Error(String),
}

// ============================================================================
// Transmit Types
// ============================================================================

/// Write request handed to the read thread, which owns the port.
pub struct TransmitRequest {
    /// Encoded command bytes ready to send.
    pub data: Vec<u8>,
    /// Sync oneshot channel to send the result back.
    pub result_tx: std_mpsc::SyncSender<Result<(), String>>,
}

/// Sender type for transmit requests (sync-safe).
pub type TransmitSender = std_mpsc::SyncSender<TransmitRequest>;
