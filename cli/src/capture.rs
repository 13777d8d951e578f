//! Capture-file frame source.
//!
//! Reads 802.11 frames from a pcap file on a dedicated thread and hands them
//! to the parse loop over a bounded channel. Radiotap headers and trailing
//! FCS are stripped here so the parser only ever sees bare 802.11 frames.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};

use anyhow::{bail, Context, Result};
use pcap_file::pcap::PcapReader;
use pcap_file::DataLink;
use radiotap::Radiotap;

/// Frame check sequence length.
const FCS_LEN: usize = 4;

/// Link-layer encapsulation of the frames in a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// LINKTYPE_IEEE802_11 (105): bare 802.11 frames.
    Ieee80211,
    /// LINKTYPE_IEEE802_11_RADIOTAP (127): radiotap header + 802.11 frame.
    Radiotap,
}

/// One frame as delivered by the capture, with its capture time.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub data: Vec<u8>,
}

pub struct CaptureSource<R: Read> {
    reader: PcapReader<R>,
    link: LinkType,
}

impl CaptureSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("cannot read capture {}", path.display()))
    }
}

impl<R: Read> CaptureSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let reader = PcapReader::new(reader).context("invalid pcap header")?;
        let link = match reader.header().datalink {
            DataLink::IEEE802_11 => LinkType::Ieee80211,
            DataLink::IEEE802_11_RADIOTAP => LinkType::Radiotap,
            other => bail!("unsupported link type {other:?}; expected 802.11 or radiotap"),
        };
        Ok(Self { reader, link })
    }

    pub fn link_type(&self) -> LinkType {
        self.link
    }

    /// Next 802.11 frame. Packets whose radiotap header cannot be decoded are
    /// skipped; a corrupt capture file ends the stream with an error.
    pub fn next_frame(&mut self) -> Option<Result<CapturedFrame>> {
        loop {
            let packet = match self.reader.next_packet()? {
                Ok(packet) => packet,
                Err(e) => return Some(Err(e).context("corrupt capture file")),
            };
            let timestamp = packet.timestamp.as_secs_f64();

            let frame = match self.link {
                LinkType::Ieee80211 => Some(&packet.data[..]),
                LinkType::Radiotap => strip_radiotap(&packet.data),
            };

            match frame {
                Some(data) => {
                    return Some(Ok(CapturedFrame {
                        timestamp,
                        data: data.to_vec(),
                    }))
                }
                None => log::debug!("Skipping packet with undecodable radiotap header"),
            }
        }
    }
}

impl<R: Read + Send + 'static> CaptureSource<R> {
    /// Read the whole capture on a new thread. The thread returns the number
    /// of frames delivered; it stops early if the receiver hangs up.
    pub fn spawn(mut self, frame_tx: SyncSender<CapturedFrame>) -> Result<JoinHandle<Result<u64>>> {
        let handle = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                log::info!("Capture thread started ({:?})", self.link);
                let mut delivered = 0u64;
                while let Some(frame) = self.next_frame() {
                    if frame_tx.send(frame?).is_err() {
                        break;
                    }
                    delivered += 1;
                }
                log::info!("Capture thread finished: {} frames", delivered);
                Ok(delivered)
            })
            .context("cannot spawn capture thread")?;
        Ok(handle)
    }
}

/// Strip the radiotap header, and the FCS when the radiotap flags report one.
fn strip_radiotap(packet: &[u8]) -> Option<&[u8]> {
    let radiotap = Radiotap::from_bytes(packet).ok()?;
    let frame = packet.get(radiotap.header.length..)?;
    if radiotap.flags.map_or(false, |flags| flags.fcs) {
        frame.get(..frame.len().checked_sub(FCS_LEN)?)
    } else {
        Some(frame)
    }
}
