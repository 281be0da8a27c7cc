// src/io/serial/mod.rs
//
// Serial port driver for the HC-05 link.
// Opens the port, runs a blocking read loop on its own thread and services
// transmit requests between reads.

mod reader;

pub use reader::{list_ports, LinkConfig, Parity, PortInfo, SerialLink};
