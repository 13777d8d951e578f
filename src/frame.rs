/// Field extraction from captured 802.11 frames.
///
/// [`Dot11Frame`] is the narrow contract the parser relies on. [`RawFrame`]
/// implements it directly over captured bytes and tolerates truncation.
/// [`DissectedProbeRequest`] pairs a frame accepted by the `ieee80211`
/// dissector with its raw bytes.

use ieee80211::mgmt_frame::ProbeRequestFrame;

/// Management header: frame control, duration, three addresses, sequence control.
pub const MANAGEMENT_HEADER_LEN: usize = 24;

/// HT Control field appended to the header when the Order flag is set.
const HT_CONTROL_LEN: usize = 4;

/// Offset of Address 2 (transmitter / source address).
const SOURCE_ADDRESS_OFFSET: usize = 10;

const ORDER_FLAG: u8 = 0x80;

/// Element ID of the SSID information element.
pub const ELEMENT_ID_SSID: u8 = 0;

/// 802.11 frame type from the frame control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameType {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }
}

/// Management frame subtype classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementSubtype {
    AssociationRequest,
    AssociationResponse,
    ReassociationRequest,
    ReassociationResponse,
    ProbeRequest,
    ProbeResponse,
    TimingAdvertisement,
    Beacon,
    Atim,
    Disassociation,
    Authentication,
    Deauthentication,
    Action,
    ActionNoAck,
    Reserved(u8),
}

impl ManagementSubtype {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0xF {
            0 => Self::AssociationRequest,
            1 => Self::AssociationResponse,
            2 => Self::ReassociationRequest,
            3 => Self::ReassociationResponse,
            4 => Self::ProbeRequest,
            5 => Self::ProbeResponse,
            6 => Self::TimingAdvertisement,
            8 => Self::Beacon,
            9 => Self::Atim,
            10 => Self::Disassociation,
            11 => Self::Authentication,
            12 => Self::Deauthentication,
            13 => Self::Action,
            14 => Self::ActionNoAck,
            other => Self::Reserved(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssociationRequest => "assoc_req",
            Self::AssociationResponse => "assoc_resp",
            Self::ReassociationRequest => "reassoc_req",
            Self::ReassociationResponse => "reassoc_resp",
            Self::ProbeRequest => "probe_req",
            Self::ProbeResponse => "probe_resp",
            Self::TimingAdvertisement => "timing_adv",
            Self::Beacon => "beacon",
            Self::Atim => "atim",
            Self::Disassociation => "disassoc",
            Self::Authentication => "auth",
            Self::Deauthentication => "deauth",
            Self::Action => "action",
            Self::ActionNoAck => "action_no_ack",
            Self::Reserved(_) => "reserved",
        }
    }
}

/// Access to the fields of a captured frame that probe request extraction needs.
pub trait Dot11Frame {
    /// Management subtype, or `None` when the frame is not a complete
    /// management frame.
    fn management_subtype(&self) -> Option<ManagementSubtype>;

    /// Raw source (transmitter) address field.
    fn source_address_bytes(&self) -> Option<&[u8]>;

    /// Payload of the first SSID element, if the frame carries one.
    fn essid_element_bytes(&self) -> Option<&[u8]>;
}

/// Byte-level view over a captured 802.11 frame (no radiotap header, no FCS).
///
/// Never panics: accessors return `None` for fields the bytes do not hold.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    bytes: &'a [u8],
}

impl<'a> RawFrame<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Frame type, if the frame control field is present and the protocol
    /// version is 0.
    pub fn frame_type(&self) -> Option<FrameType> {
        let fc = *self.bytes.first()?;
        if fc & 0x3 != 0 {
            return None;
        }
        Some(FrameType::from_bits(fc >> 2))
    }

    fn header_len(&self) -> usize {
        match self.bytes.get(1) {
            Some(flags) if flags & ORDER_FLAG != 0 => MANAGEMENT_HEADER_LEN + HT_CONTROL_LEN,
            _ => MANAGEMENT_HEADER_LEN,
        }
    }

    /// Frame body of a management frame whose header is complete.
    pub fn body(&self) -> Option<&'a [u8]> {
        if self.frame_type()? != FrameType::Management {
            return None;
        }
        self.bytes.get(self.header_len()..)
    }

    /// Information elements of the body. Empty for non-management frames.
    pub fn elements(&self) -> InformationElements<'a> {
        InformationElements {
            rest: self.body().unwrap_or(&[]),
        }
    }
}

impl Dot11Frame for RawFrame<'_> {
    fn management_subtype(&self) -> Option<ManagementSubtype> {
        self.body()?;
        Some(ManagementSubtype::from_bits(self.bytes[0] >> 4))
    }

    fn source_address_bytes(&self) -> Option<&[u8]> {
        self.bytes
            .get(SOURCE_ADDRESS_OFFSET..SOURCE_ADDRESS_OFFSET + crate::mac::MAC_LEN)
    }

    fn essid_element_bytes(&self) -> Option<&[u8]> {
        let element = self.elements().find(|e| e.id == ELEMENT_ID_SSID)?;
        if element.is_truncated() {
            log::debug!(
                "SSID element truncated: declared {} bytes, {} present",
                element.declared_len,
                element.payload.len()
            );
        }
        Some(element.payload)
    }
}

/// A probe request accepted by the `ieee80211` dissector.
///
/// The source address comes from the dissected header. The SSID element is
/// read from the raw bytes, since the dissector drops SSIDs that are cut
/// short or not valid UTF-8.
#[derive(Debug, Clone, Copy)]
pub struct DissectedProbeRequest<'a> {
    source: [u8; crate::mac::MAC_LEN],
    raw: RawFrame<'a>,
}

impl<'a> DissectedProbeRequest<'a> {
    pub fn new(frame: &ProbeRequestFrame<'_>, bytes: &'a [u8]) -> Self {
        Self {
            source: frame.header.transmitter_address.0,
            raw: RawFrame::new(bytes),
        }
    }
}

impl Dot11Frame for DissectedProbeRequest<'_> {
    fn management_subtype(&self) -> Option<ManagementSubtype> {
        Some(ManagementSubtype::ProbeRequest)
    }

    fn source_address_bytes(&self) -> Option<&[u8]> {
        Some(&self.source)
    }

    fn essid_element_bytes(&self) -> Option<&[u8]> {
        self.raw.essid_element_bytes()
    }
}

/// A tagged information element. `payload` is cut short when the frame ends
/// before the declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InformationElement<'a> {
    pub id: u8,
    pub declared_len: u8,
    pub payload: &'a [u8],
}

impl InformationElement<'_> {
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.declared_len as usize
    }
}

/// Iterator over `[id] [length] [payload...]` elements.
///
/// A truncated element is yielded with what remains and ends the walk; a
/// dangling single byte is ignored.
#[derive(Debug, Clone)]
pub struct InformationElements<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for InformationElements<'a> {
    type Item = InformationElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&id, tail) = self.rest.split_first()?;
        let Some((&declared_len, tail)) = tail.split_first() else {
            self.rest = &[];
            return None;
        };
        let len = (declared_len as usize).min(tail.len());
        let (payload, rest) = tail.split_at(len);
        self.rest = rest;
        Some(InformationElement {
            id,
            declared_len,
            payload,
        })
    }
}
