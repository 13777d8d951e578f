/// JSON output protocol for accepted probe requests.
///
/// All messages are newline-delimited JSON (NDJSON), serialized into
/// fixed-size buffers with `serde-json-core`.
use core::fmt::Write;

use heapless::{String, Vec};
use serde::Serialize;

use crate::mac::MacAddress;
use crate::record::ProbeRequest;

/// Maximum length for MAC address strings ("aa:bb:cc:dd:ee:ff")
pub type MacString = String<18>;

/// Messages emitted for consumers of the capture
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum DeviceMessage<'a> {
    /// Accepted probe request
    #[serde(rename = "probe_req")]
    ProbeRequest {
        /// Capture time, seconds since the Unix epoch
        ts: f64,
        mac: &'a MacString,
        /// Vendor name, omitted when unknown
        #[serde(skip_serializing_if = "Option::is_none")]
        vendor: Option<&'a str>,
        essid: &'a str,
    },
    /// End-of-run counters
    #[serde(rename = "summary")]
    Summary {
        /// Frames read from the capture
        frames: u64,
        /// Frames that parsed as probe requests
        probes: u64,
        /// Probe requests accepted by the display filter
        matched: u64,
        /// Probe requests that violated the frame contract
        rejected: u64,
        version: &'static str,
    },
}

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum size of a serialized JSON message. Fits a 255-byte ESSID made
/// entirely of escaped control characters.
pub const MAX_MSG_LEN: usize = 2048;

/// Buffer type for serialized JSON messages
pub type MsgBuffer = Vec<u8, MAX_MSG_LEN>;

/// Format a MAC address into its canonical string form.
pub fn format_mac(mac: &MacAddress, buf: &mut MacString) {
    buf.clear();
    let _ = write!(buf, "{mac}");
}

/// Serialize a DeviceMessage to JSON bytes and write to the output buffer.
/// Returns the number of bytes written including the trailing newline, or
/// None if the message does not fit.
pub fn serialize_message(msg: &DeviceMessage, buf: &mut [u8]) -> Option<usize> {
    let len = serde_json_core::to_slice(msg, buf).ok()?;
    // Append newline for NDJSON
    let newline = buf.get_mut(len)?;
    *newline = b'\n';
    Some(len + 1)
}

/// Encode an accepted probe request as one NDJSON line.
pub fn encode_probe(probe: &ProbeRequest) -> Option<MsgBuffer> {
    let mut mac = MacString::new();
    format_mac(&probe.source_mac(), &mut mac);

    let msg = DeviceMessage::ProbeRequest {
        ts: probe.timestamp(),
        mac: &mac,
        vendor: probe.vendor_name(),
        essid: probe.essid(),
    };
    encode(&msg)
}

/// Serialize any message into a right-sized buffer.
pub fn encode(msg: &DeviceMessage) -> Option<MsgBuffer> {
    let mut buf = MsgBuffer::new();
    buf.resize_default(MAX_MSG_LEN).ok()?;
    let len = serialize_message(msg, &mut buf)?;
    buf.truncate(len);
    Some(buf)
}
