//! probequest: passive Wi-Fi probe request extraction.
//!
//! Turns captured 802.11 frames into validated [`ProbeRequest`] records and
//! decides which of them to report. The crate performs no I/O: capture
//! drivers (the `probequest` CLI reading pcap files, or any other source of
//! raw frames) hand frames in and consume the resulting records.
//!
//! - `mac`: validated hardware addresses
//! - `oui`: immutable vendor lookup tables
//! - `record`: the [`ProbeRequest`] record and its canonical rendering
//! - `frame`: the [`Dot11Frame`] field extraction contract and its
//!   byte-level and `ieee80211` implementations
//! - `parser`: [`FrameParser`], the frame → record trust boundary
//! - `filter`: capture filter expressions and the compiled display filter
//! - `protocol`: NDJSON output messages

pub mod error;
pub mod filter;
pub mod frame;
pub mod mac;
pub mod oui;
pub mod parser;
pub mod protocol;
pub mod record;

pub use error::{Error, Result};
pub use filter::{EssidMatcher, FilterConfig, ProbeFilter};
pub use frame::{DissectedProbeRequest, Dot11Frame, ManagementSubtype, RawFrame};
pub use mac::MacAddress;
pub use oui::VendorTable;
pub use parser::{parse_frame, FrameParser};
pub use record::ProbeRequest;
