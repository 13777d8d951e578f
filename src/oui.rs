/// Vendor lookup by organizationally unique identifier (OUI).
///
/// A compact built-in table covers common client vendors. Larger tables are
/// built from a Wireshark `manuf` file before capture starts and are never
/// mutated afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Built-in OUI prefixes (3-byte prefix, vendor name).
pub static OUI_VENDORS: &[([u8; 3], &str)] = &[
    // === Apple ===
    ([0x00, 0x03, 0x93], "Apple"),
    ([0x00, 0x0A, 0x95], "Apple"),
    ([0x00, 0x1B, 0x63], "Apple"),
    ([0x00, 0x1E, 0xC2], "Apple"),
    ([0x28, 0xCF, 0xE9], "Apple"),
    ([0x3C, 0x15, 0xC2], "Apple"),
    ([0xAC, 0xBC, 0x32], "Apple"),
    ([0xF0, 0x18, 0x98], "Apple"),
    // === Samsung Electronics ===
    ([0x00, 0x00, 0xF0], "Samsung Electronics"),
    ([0x00, 0x12, 0x47], "Samsung Electronics"),
    ([0x00, 0x16, 0x32], "Samsung Electronics"),
    // === Google ===
    ([0x3C, 0x5A, 0xB4], "Google"),
    ([0x54, 0x60, 0x09], "Google"),
    ([0xF4, 0xF5, 0xD8], "Google"),
    // === Intel ===
    ([0x00, 0x13, 0xE8], "Intel"),
    ([0x00, 0x1B, 0x21], "Intel"),
    // === Espressif ===
    ([0x24, 0x0A, 0xC4], "Espressif"),
    ([0x24, 0x6F, 0x28], "Espressif"),
    ([0x30, 0xAE, 0xA4], "Espressif"),
    // === Raspberry Pi ===
    ([0xB8, 0x27, 0xEB], "Raspberry Pi Foundation"),
    ([0xDC, 0xA6, 0x32], "Raspberry Pi Trading"),
    ([0xE4, 0x5F, 0x01], "Raspberry Pi Trading"),
    // === Networking ===
    ([0x00, 0x00, 0x0C], "Cisco Systems"),
    ([0x00, 0x09, 0x5B], "Netgear"),
    ([0x00, 0x14, 0x6C], "Netgear"),
    ([0x00, 0xE0, 0xFC], "Huawei Technologies"),
    ([0x50, 0xC7, 0xBF], "TP-Link"),
    // === Consumer devices ===
    ([0x00, 0x09, 0xBF], "Nintendo"),
    ([0x00, 0x17, 0xAB], "Nintendo"),
    ([0x44, 0x65, 0x0D], "Amazon Technologies"),
    ([0x64, 0x09, 0x80], "Xiaomi"),
    ([0x00, 0x50, 0xF2], "Microsoft"),
    // === Virtualisation ===
    ([0x00, 0x0C, 0x29], "VMware"),
    ([0x00, 0x50, 0x56], "VMware"),
];

static BUILTIN: OnceLock<VendorTable> = OnceLock::new();

/// Immutable OUI → vendor name mapping.
#[derive(Debug, Clone, Default)]
pub struct VendorTable {
    entries: HashMap<[u8; 3], Box<str>>,
}

impl VendorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table, initialised on first use.
    pub fn builtin() -> &'static VendorTable {
        BUILTIN.get_or_init(|| {
            let table: VendorTable = OUI_VENDORS.iter().copied().collect();
            log::debug!("Built-in vendor table loaded: {} prefixes", table.len());
            table
        })
    }

    /// Parse a Wireshark `manuf` file.
    ///
    /// Each line is `<prefix>\t<short name>[\t<long name>]`; the long name is
    /// preferred. Comments, blank lines and prefixes that are not plain
    /// 24-bit OUIs (e.g. `00:1B:C5:00:00:00/36`) are skipped.
    pub fn from_manuf(text: &str) -> Self {
        let mut table = Self::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
            let (Some(prefix), Some(short)) = (fields.next(), fields.next()) else {
                skipped += 1;
                continue;
            };
            let name = fields.next().unwrap_or(short);
            match parse_oui(prefix) {
                Some(oui) => {
                    table.entries.insert(oui, name.into());
                }
                None => skipped += 1,
            }
        }

        log::debug!(
            "manuf table parsed: {} prefixes, {} lines skipped",
            table.len(),
            skipped
        );
        table
    }

    /// Combine two tables; entries from `other` win on conflict.
    pub fn merge(mut self, other: VendorTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn lookup(&self, oui: [u8; 3]) -> Option<&str> {
        self.entries.get(&oui).map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<([u8; 3], &'a str)> for VendorTable {
    fn from_iter<I: IntoIterator<Item = ([u8; 3], &'a str)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(oui, name)| (oui, name.into())).collect(),
        }
    }
}

/// Parse a 24-bit prefix written as `00:1A:2B` or `00-1A-2B`.
fn parse_oui(prefix: &str) -> Option<[u8; 3]> {
    let mut oui = [0u8; 3];
    let mut parts = prefix.split(|c| c == ':' || c == '-');
    for octet in oui.iter_mut() {
        let part = parts.next()?;
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        *octet = u8::from_str_radix(part, 16).ok()?;
    }
    parts.next().is_none().then_some(oui)
}
