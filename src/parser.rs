/// Probe request extraction: the trust boundary between captured bytes and
/// the record model.
///
/// Parsing is a pure function of the frame, the capture timestamp and an
/// immutable vendor table, so one parser can be shared across capture
/// threads without locking.

use ieee80211::match_frames;
use ieee80211::mgmt_frame::ProbeRequestFrame;

use crate::error::{Error, Result};
use crate::frame::{DissectedProbeRequest, Dot11Frame, ManagementSubtype, RawFrame};
use crate::mac::MacAddress;
use crate::oui::VendorTable;
use crate::record::ProbeRequest;

/// Turns captured frames into [`ProbeRequest`] records.
#[derive(Debug, Clone, Copy)]
pub struct FrameParser<'v> {
    vendors: &'v VendorTable,
}

impl FrameParser<'static> {
    /// Parser resolving vendors against the built-in table.
    pub fn new() -> Self {
        Self::with_vendors(VendorTable::builtin())
    }
}

impl Default for FrameParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'v> FrameParser<'v> {
    pub fn with_vendors(vendors: &'v VendorTable) -> Self {
        Self { vendors }
    }

    /// Extract a probe request from `frame`, stamped with the capture time.
    ///
    /// Returns [`Error::NotAProbeRequest`] for every frame that is not a
    /// probe request. A probe request without a usable source address is a
    /// hard failure (`MissingField` / `InvalidAddressFormat`). A missing SSID
    /// element yields an empty ESSID; malformed SSID bytes are decoded lossily.
    pub fn parse<F: Dot11Frame + ?Sized>(&self, frame: &F, timestamp: f64) -> Result<ProbeRequest> {
        match frame.management_subtype() {
            Some(ManagementSubtype::ProbeRequest) => {}
            other => {
                log::trace!("Skipping frame: {}", other.map_or("non-management", |s| s.as_str()));
                return Err(Error::NotAProbeRequest);
            }
        }

        let source = frame.source_address_bytes().ok_or_else(|| {
            log::warn!("Probe request without a source address field");
            Error::MissingField("source_mac")
        })?;
        let source_mac = MacAddress::from_bytes(source).map_err(|e| {
            log::warn!("Probe request with malformed source address: {e}");
            e
        })?;

        let essid = frame
            .essid_element_bytes()
            .map(decode_essid)
            .unwrap_or_default();

        ProbeRequest::builder()
            .timestamp(timestamp)
            .source(source_mac)
            .essid(essid)
            .vendors(self.vendors)
            .build()
    }

    /// Parse a raw 802.11 frame (radiotap header already stripped, no FCS).
    pub fn parse_bytes(&self, frame: &[u8], timestamp: f64) -> Result<ProbeRequest> {
        self.parse(&RawFrame::new(frame), timestamp)
    }

    /// Parse a raw 802.11 frame through the `ieee80211` dissector.
    ///
    /// Anything the dissector does not accept as a probe request is reported
    /// as `NotAProbeRequest`. Accepted frames yield the same record as
    /// [`parse_bytes`](Self::parse_bytes).
    pub fn parse_dissected(&self, frame: &[u8], timestamp: f64) -> Result<ProbeRequest> {
        let result = match_frames! {
            frame,
            probe_req = ProbeRequestFrame<'_> => {
                self.parse(&DissectedProbeRequest::new(&probe_req, frame), timestamp)
            }
        };
        result.unwrap_or(Err(Error::NotAProbeRequest))
    }
}

/// Parse a raw 802.11 frame using the built-in vendor table.
pub fn parse_frame(frame: &[u8], timestamp: f64) -> Result<ProbeRequest> {
    FrameParser::new().parse_bytes(frame, timestamp)
}

/// Best-effort ESSID decoding: invalid UTF-8 becomes U+FFFD.
fn decode_essid(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
