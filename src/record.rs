//! The probe request record: one per successfully parsed frame.

use core::fmt::{self, Write};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::mac::MacAddress;
use crate::oui::VendorTable;

/// Timestamp layout used by the canonical rendering.
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// A probe request observed on the air.
///
/// Immutable once built. `essid` is empty for wildcard probes, whether the
/// frame carried an empty ESSID element or none at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    timestamp: f64,
    source_mac: MacAddress,
    vendor: Option<String>,
    essid: String,
}

impl ProbeRequest {
    /// Build a record from a textual source address, resolving the vendor
    /// against the built-in table.
    pub fn create(timestamp: f64, source_mac: &str, essid: impl Into<String>) -> Result<Self> {
        Self::builder()
            .timestamp(timestamp)
            .source_mac(source_mac)
            .essid(essid)
            .build()
    }

    pub fn builder() -> ProbeRequestBuilder<'static> {
        ProbeRequestBuilder::new()
    }

    /// Capture time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn source_mac(&self) -> MacAddress {
        self.source_mac
    }

    pub fn vendor_name(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn essid(&self) -> &str {
        &self.essid
    }

    /// True for a broadcast probe that names no network.
    pub fn is_wildcard(&self) -> bool {
        self.essid.is_empty()
    }

    /// Canonical one-line rendering:
    /// `<timestamp>: <mac> (<vendor>) -> <essid>`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}) -> {}",
            format_timestamp(self.timestamp),
            self.source_mac,
            self.vendor.as_deref().unwrap_or("None"),
            EscapedEssid(&self.essid),
        )
    }
}

/// Render a capture timestamp in UTC, independent of locale and time zone.
fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| format!("{timestamp}"))
}

/// Writes an ESSID with control characters escaped.
struct EscapedEssid<'a>(&'a str);

impl fmt::Display for EscapedEssid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if c.is_control() {
                write!(f, "{}", c.escape_default())?;
            } else {
                f.write_char(c)?;
            }
        }
        Ok(())
    }
}

/// Collects record fields; `build()` rejects anything missing.
#[derive(Debug, Clone)]
pub struct ProbeRequestBuilder<'v> {
    timestamp: Option<f64>,
    source_mac: Option<Result<MacAddress>>,
    essid: Option<String>,
    vendors: &'v VendorTable,
}

impl ProbeRequestBuilder<'static> {
    pub fn new() -> Self {
        Self {
            timestamp: None,
            source_mac: None,
            essid: None,
            vendors: VendorTable::builtin(),
        }
    }
}

impl Default for ProbeRequestBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'v> ProbeRequestBuilder<'v> {
    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Source address as text; parse errors surface from `build()`.
    pub fn source_mac(mut self, source_mac: &str) -> Self {
        self.source_mac = Some(MacAddress::parse(source_mac));
        self
    }

    pub fn source(mut self, source_mac: MacAddress) -> Self {
        self.source_mac = Some(Ok(source_mac));
        self
    }

    pub fn essid(mut self, essid: impl Into<String>) -> Self {
        self.essid = Some(essid.into());
        self
    }

    /// Resolve the vendor against `vendors` instead of the built-in table.
    pub fn vendors<'w>(self, vendors: &'w VendorTable) -> ProbeRequestBuilder<'w> {
        ProbeRequestBuilder {
            timestamp: self.timestamp,
            source_mac: self.source_mac,
            essid: self.essid,
            vendors,
        }
    }

    pub fn build(self) -> Result<ProbeRequest> {
        let timestamp = self.timestamp.ok_or(Error::MissingField("timestamp"))?;
        let source_mac = self.source_mac.ok_or(Error::MissingField("source_mac"))??;
        let essid = self.essid.ok_or(Error::MissingField("essid"))?;

        if !timestamp.is_finite() {
            return Err(Error::InvalidTimestamp(timestamp));
        }

        let vendor = self.vendors.lookup(source_mac.oui()).map(str::to_owned);

        Ok(ProbeRequest {
            timestamp,
            source_mac,
            vendor,
            essid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMESTAMP: f64 = 1517872027.0;
    const MAC: &str = "aa:bb:cc:dd:ee:ff";
    const ESSID: &str = "Test ESSID";

    // ── Construction ────────────────────────────────────────────────

    #[test]
    fn build_without_any_field_fails() {
        assert_eq!(
            ProbeRequest::builder().build(),
            Err(Error::MissingField("timestamp"))
        );
    }

    #[test]
    fn build_with_only_timestamp_fails() {
        let result = ProbeRequest::builder().timestamp(TIMESTAMP).build();
        assert_eq!(result, Err(Error::MissingField("source_mac")));
    }

    #[test]
    fn build_without_essid_fails() {
        let result = ProbeRequest::builder()
            .timestamp(TIMESTAMP)
            .source_mac(MAC)
            .build();
        assert_eq!(result, Err(Error::MissingField("essid")));
    }

    #[test]
    fn build_without_timestamp_fails() {
        let result = ProbeRequest::builder().source_mac(MAC).essid(ESSID).build();
        assert_eq!(result, Err(Error::MissingField("timestamp")));
    }

    #[test]
    fn create_with_all_fields() {
        let probe = ProbeRequest::create(TIMESTAMP, MAC, ESSID).unwrap();
        assert_eq!(probe.timestamp(), TIMESTAMP);
        assert_eq!(probe.source_mac().to_string(), MAC);
        assert_eq!(probe.essid(), ESSID);
        assert_eq!(probe.vendor_name(), None);
        assert!(!probe.is_wildcard());
    }

    #[test]
    fn create_with_bad_mac_address() {
        let result = ProbeRequest::create(TIMESTAMP, "aa:bb:cc:dd:ee", ESSID);
        assert!(matches!(result, Err(Error::InvalidAddressFormat(_))));
    }

    #[test]
    fn create_with_empty_essid_is_wildcard() {
        let probe = ProbeRequest::create(TIMESTAMP, MAC, "").unwrap();
        assert!(probe.is_wildcard());
    }

    #[test]
    fn create_rejects_non_finite_timestamp() {
        for ts in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ProbeRequest::create(ts, MAC, ESSID),
                Err(Error::InvalidTimestamp(_))
            ));
        }
    }

    // ── Vendor lookup ───────────────────────────────────────────────

    #[test]
    fn vendor_from_builtin_table() {
        let probe = ProbeRequest::create(TIMESTAMP, "b8:27:eb:12:34:56", ESSID).unwrap();
        assert_eq!(probe.vendor_name(), Some("Raspberry Pi Foundation"));
    }

    #[test]
    fn vendor_from_custom_table() {
        let table = VendorTable::from_manuf("AA:BB:CC\tAcme\tAcme Radio Works\n");
        let probe = ProbeRequest::builder()
            .timestamp(TIMESTAMP)
            .source(MacAddress::parse(MAC).unwrap())
            .essid(ESSID)
            .vendors(&table)
            .build()
            .unwrap();
        assert_eq!(probe.vendor_name(), Some("Acme Radio Works"));
    }

    // ── Rendering ───────────────────────────────────────────────────

    #[test]
    fn render_probe_request() {
        let probe = ProbeRequest::create(TIMESTAMP, MAC, ESSID).unwrap();
        let text = probe.render();
        assert!(text.contains("Mon, 05 Feb 2018 23:07:07"), "{text}");
        assert!(text.contains("aa:bb:cc:dd:ee:ff (None) -> Test ESSID"), "{text}");
        assert_eq!(
            text,
            "Mon, 05 Feb 2018 23:07:07 UTC: aa:bb:cc:dd:ee:ff (None) -> Test ESSID"
        );
    }

    #[test]
    fn render_with_vendor_and_upper_case_input() {
        let probe = ProbeRequest::create(TIMESTAMP, "B8:27:EB:00:00:01", "home").unwrap();
        assert!(probe
            .render()
            .ends_with("b8:27:eb:00:00:01 (Raspberry Pi Foundation) -> home"));
    }

    #[test]
    fn render_fractional_timestamp_truncates_to_seconds() {
        let probe = ProbeRequest::create(TIMESTAMP + 0.999, MAC, ESSID).unwrap();
        assert!(probe.render().starts_with("Mon, 05 Feb 2018 23:07:07 UTC"));
    }

    #[test]
    fn render_escapes_control_characters() {
        let probe = ProbeRequest::create(TIMESTAMP, MAC, "evil\x1b[2Jssid\n").unwrap();
        let text = probe.render();
        assert!(!text.contains('\x1b'));
        assert!(!text.contains('\n'));
        assert!(text.ends_with(r"-> evil\u{1b}[2Jssid\n"), "{text}");
        assert_eq!(probe.essid(), "evil\x1b[2Jssid\n");
    }

    #[test]
    fn render_out_of_range_timestamp_falls_back_to_number() {
        let probe = ProbeRequest::create(1e300, MAC, ESSID).unwrap();
        assert!(probe.render().starts_with("1000000000000"), "{}", probe.render());
    }
}
