// src/io/serial/reader.rs
//
// Blocking serial reader with transmit support.
//
// The serialport crate's I/O is blocking, so the whole read loop runs inside
// tokio::task::spawn_blocking. The loop owns the port: inbound bytes are fed
// through the line splitter and classifier, and queued transmit requests are
// serviced between reads over a sync channel.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity as SpParity, SerialPort, StopBits};
use tokio::sync::mpsc;

use crate::classify::{classify_chunk, classify_line, LineSplitter};
use crate::io::{LinkEvent, TransmitRequest, TransmitSender};

/// How long a transmit call waits for the read thread to report the write
/// result before giving up.
const TRANSMIT_TIMEOUT: Duration = Duration::from_millis(500);

// ============================================================================
// Configuration
// ============================================================================

/// Parity setting for the serial link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Serial link configuration. The HC-05 default is 9600 baud, 8N1.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl LinkConfig {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        LinkConfig {
            port: port.into(),
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
        }
    }
}

fn to_serialport_parity(p: Parity) -> SpParity {
    match p {
        Parity::None => SpParity::None,
        Parity::Odd => SpParity::Odd,
        Parity::Even => SpParity::Even,
    }
}

fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

fn to_serialport_stop_bits(bits: u8) -> StopBits {
    match bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}

// ============================================================================
// Serial Link
// ============================================================================

/// Handle to an open serial link. Owns the cancel flag and the transmit
/// channel; the port itself lives on the read thread. Dropping the handle
/// without calling `shutdown` leaves the thread to notice the closed event
/// channel on its next send.
pub struct SerialLink {
    port_name: String,
    cancel_flag: Arc<AtomicBool>,
    transmit_tx: TransmitSender,
    task: tokio::task::JoinHandle<()>,
}

impl SerialLink {
    /// Open the port and start the read loop. Returns the link handle and
    /// the event receiver for the UI task. An open failure returns an error
    /// and leaves nothing running — no retry.
    pub fn open(config: LinkConfig) -> Result<(SerialLink, mpsc::Receiver<LinkEvent>), String> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(to_serialport_data_bits(config.data_bits))
            .stop_bits(to_serialport_stop_bits(config.stop_bits))
            .parity(to_serialport_parity(config.parity))
            .timeout(Duration::from_millis(50))
            .open()
            .map_err(|e| format!("Failed to open {}: {}", config.port, e))?;

        tlog!(
            "[serial] Opened {} at {} baud ({}-{}-{})",
            config.port,
            config.baud_rate,
            config.data_bits,
            match config.parity {
                Parity::None => 'N',
                Parity::Odd => 'O',
                Parity::Even => 'E',
            },
            config.stop_bits
        );

        let cancel_flag = Arc::new(AtomicBool::new(false));
        let (transmit_tx, transmit_rx) = std_mpsc::sync_channel::<TransmitRequest>(32);
        let (events_tx, events_rx) = mpsc::channel::<LinkEvent>(64);

        let cancel = cancel_flag.clone();
        let port_name = config.port.clone();
        let task = tokio::task::spawn_blocking(move || {
            run_link_blocking(port, port_name, cancel, transmit_rx, events_tx);
        });

        Ok((
            SerialLink {
                port_name: config.port,
                cancel_flag,
                transmit_tx,
                task,
            },
            events_rx,
        ))
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Queue bytes for the read thread to write, and wait (bounded) for the
    /// write result.
    pub fn transmit(&self, data: &[u8]) -> Result<(), String> {
        if data.is_empty() {
            return Err("No bytes to transmit".to_string());
        }

        let (result_tx, result_rx) = std_mpsc::sync_channel(1);
        self.transmit_tx
            .try_send(TransmitRequest {
                data: data.to_vec(),
                result_tx,
            })
            .map_err(|e| format!("Failed to queue transmit request: {}", e))?;

        result_rx
            .recv_timeout(TRANSMIT_TIMEOUT)
            .map_err(|e| format!("Transmit timeout or channel closed: {}", e))?
    }

    /// Stop the read loop and release the port.
    pub async fn shutdown(self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
        let _ = self.task.await;
        tlog!("[serial] Closed {}", self.port_name);
    }
}

// ============================================================================
// Read Loop
// ============================================================================

/// Blocking read loop. Runs until cancelled, the peer disconnects, or a
/// fatal read error occurs. Read timeouts are expected (they give the loop
/// a chance to poll the cancel flag and the transmit queue) and carry no
/// data.
fn run_link_blocking(
    mut port: Box<dyn SerialPort>,
    port_name: String,
    cancel_flag: Arc<AtomicBool>,
    transmit_rx: std_mpsc::Receiver<TransmitRequest>,
    events_tx: mpsc::Sender<LinkEvent>,
) {
    let mut splitter = LineSplitter::new();
    let mut buf = [0u8; 256];

    let reason = loop {
        if cancel_flag.load(Ordering::Relaxed) {
            break "stopped";
        }

        // Service pending transmit requests (non-blocking)
        while let Ok(req) = transmit_rx.try_recv() {
            let result = port
                .write_all(&req.data)
                .and_then(|_| port.flush())
                .map_err(|e| format!("Serial write error: {}", e));
            let _ = req.result_tx.try_send(result);
        }

        match port.read(&mut buf) {
            Ok(n) if n > 0 => {
                let records = classify_chunk(&mut splitter, &buf[..n]);
                if !records.is_empty()
                    && events_tx.blocking_send(LinkEvent::Records(records)).is_err()
                {
                    // UI side went away; nothing left to report to
                    return;
                }
            }
            Ok(_) => {
                // EOF - port closed/disconnected
                break "disconnected";
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                let _ = events_tx.blocking_send(LinkEvent::Error(format!("Read error: {}", e)));
                break "error";
            }
        }
    };

    // A trailing line without a terminator still classifies at stream end
    if let Some(line) = splitter.flush() {
        let records = classify_line(&line);
        if !records.is_empty() {
            let _ = events_tx.blocking_send(LinkEvent::Records(records));
        }
    }

    tlog!("[serial] Stream from {} ended: {}", port_name, reason);
    let _ = events_tx.blocking_send(LinkEvent::Ended(reason.to_string()));
}

// ============================================================================
// Port Enumeration
// ============================================================================

/// Information about an available serial port.
#[derive(Clone, Debug, Serialize)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// List available serial ports.
///
/// On macOS, filters out /dev/tty.* devices and only shows /dev/cu.* devices.
/// The cu (calling unit) devices are non-blocking and preferred for outgoing
/// connections; the tty devices block on open waiting for carrier detect.
pub fn list_ports() -> Result<Vec<PortInfo>, String> {
    let ports =
        serialport::available_ports().map_err(|e| format!("Failed to enumerate ports: {}", e))?;

    Ok(ports
        .into_iter()
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| {
            let (port_type, manufacturer, product) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => {
                    ("USB".to_string(), info.manufacturer, info.product)
                }
                serialport::SerialPortType::BluetoothPort => {
                    ("Bluetooth".to_string(), None, None)
                }
                serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None),
                serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None),
            };
            PortInfo {
                port_name: p.port_name,
                port_type,
                manufacturer,
                product,
            }
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
impl SerialLink {
    /// Link handle with no port behind it, for session-level tests. The
    /// returned sender feeds the event channel; the transmit queue goes
    /// nowhere. Must be called from a tokio runtime.
    pub(crate) fn stub() -> (SerialLink, mpsc::Sender<LinkEvent>, mpsc::Receiver<LinkEvent>) {
        let (transmit_tx, _) = std_mpsc::sync_channel(1);
        let (events_tx, events_rx) = mpsc::channel(8);
        let task = tokio::task::spawn_blocking(|| {});
        (
            SerialLink {
                port_name: "stub".to_string(),
                cancel_flag: Arc::new(AtomicBool::new(false)),
                transmit_tx,
                task,
            },
            events_tx,
            events_rx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_config_defaults_to_8n1() {
        let config = LinkConfig::new("/dev/rfcomm0", 9600);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.stop_bits, 1);
        assert_eq!(config.parity, Parity::None);
    }

    #[test]
    fn test_parity_conversion() {
        assert!(matches!(to_serialport_parity(Parity::None), SpParity::None));
        assert!(matches!(to_serialport_parity(Parity::Odd), SpParity::Odd));
        assert!(matches!(to_serialport_parity(Parity::Even), SpParity::Even));
    }

    #[test]
    fn test_data_and_stop_bit_conversion() {
        assert!(matches!(to_serialport_data_bits(7), DataBits::Seven));
        assert!(matches!(to_serialport_data_bits(8), DataBits::Eight));
        // Out-of-range values fall back to the 8N1 defaults
        assert!(matches!(to_serialport_data_bits(9), DataBits::Eight));
        assert!(matches!(to_serialport_stop_bits(2), StopBits::Two));
        assert!(matches!(to_serialport_stop_bits(0), StopBits::One));
    }
}
