//! probequest: probe request extraction from 802.11 capture files.
//!
//! A capture thread reads the pcap file and feeds frames through a bounded
//! channel; the main thread parses, filters and prints. Frames are expected
//! to come from a capture taken with the filter printed by `--print-filter`,
//! but every frame is checked regardless.

mod capture;

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use probequest::protocol::{self, DeviceMessage, VERSION};
use probequest::{FilterConfig, FrameParser, MacAddress, ProbeFilter, ProbeRequest, VendorTable};

use capture::{CaptureSource, CapturedFrame};

/// Frames buffered between the capture thread and the parse loop.
const FRAME_QUEUE_DEPTH: usize = 64;

#[derive(Parser)]
#[command(name = "probequest")]
#[command(version, about = "Extract Wi-Fi probe requests from 802.11 capture files")]
struct Cli {
    /// Capture file (pcap, link type 802.11 or radiotap).
    #[arg(required_unless_present = "print_filter")]
    pcap: Option<PathBuf>,

    /// Only report these source MAC addresses.
    #[arg(short = 'f', long = "filter", value_name = "MAC")]
    mac_filters: Vec<MacAddress>,

    /// Never report these source MAC addresses.
    #[arg(short = 'x', long = "exclude", value_name = "MAC")]
    mac_exclusions: Vec<MacAddress>,

    /// Only report these exact ESSIDs.
    #[arg(short = 'e', long = "essid", value_name = "ESSID")]
    essids: Vec<String>,

    /// Only report ESSIDs matching this regular expression (anchored at the start).
    #[arg(short = 'r', long = "regex", value_name = "PATTERN")]
    regex: Option<String>,

    /// Case-insensitive `--regex` matching.
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Wireshark `manuf` file to extend the built-in vendor table.
    #[arg(long, value_name = "FILE")]
    oui_db: Option<PathBuf>,

    /// Append accepted probe requests to this file as NDJSON.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print NDJSON to stdout instead of text lines.
    #[arg(long)]
    json: bool,

    /// Print the capture filter expression and exit.
    #[arg(long)]
    print_filter: bool,
}

impl Cli {
    fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            mac_filters: self.mac_filters.clone(),
            mac_exclusions: self.mac_exclusions.clone(),
            essid_filters: self.essids.clone(),
            essid_regex: self.regex.clone(),
            ignore_case: self.ignore_case,
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    frames: u64,
    probes: u64,
    matched: u64,
    rejected: u64,
}

/// Where accepted records go: text or NDJSON on `out`, plus an optional
/// NDJSON file.
struct Output<W: Write> {
    out: W,
    json: bool,
    file: Option<BufWriter<File>>,
}

impl<W: Write> Output<W> {
    fn new(out: W, json: bool, path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("cannot open output file {}", path.display()))?;
                log::info!("Writing NDJSON records to {}", path.display());
                Some(BufWriter::new(file))
            }
            None => None,
        };
        Ok(Self { out, json, file })
    }

    fn write_probe(&mut self, probe: &ProbeRequest) -> Result<()> {
        let line = protocol::encode_probe(probe);
        if line.is_none() {
            log::warn!("Probe request from {} too large to encode", probe.source_mac());
        }

        if self.json {
            if let Some(line) = &line {
                self.out.write_all(line)?;
            }
        } else {
            writeln!(self.out, "{probe}")?;
        }

        if let (Some(file), Some(line)) = (self.file.as_mut(), &line) {
            file.write_all(line)?;
        }
        Ok(())
    }

    fn finish(mut self, stats: &Stats) -> Result<W> {
        if self.json {
            let summary = DeviceMessage::Summary {
                frames: stats.frames,
                probes: stats.probes,
                matched: stats.matched,
                rejected: stats.rejected,
                version: VERSION,
            };
            if let Some(line) = protocol::encode(&summary) {
                self.out.write_all(&line)?;
            }
        }
        self.out.flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(self.out)
    }
}

/// Parse, filter and report every frame until the capture is exhausted.
fn process<W: Write>(
    frames: impl IntoIterator<Item = CapturedFrame>,
    parser: &FrameParser<'_>,
    filter: &ProbeFilter,
    output: &mut Output<W>,
) -> Result<Stats> {
    let mut stats = Stats::default();
    for frame in frames {
        stats.frames += 1;
        match parser.parse_bytes(&frame.data, frame.timestamp) {
            Ok(probe) => {
                stats.probes += 1;
                if filter.matches(&probe) {
                    stats.matched += 1;
                    output.write_probe(&probe)?;
                }
            }
            Err(e) if e.is_not_a_probe_request() => {}
            Err(e) => {
                stats.rejected += 1;
                log::warn!("Dropping frame {}: {}", stats.frames, e);
            }
        }
    }
    Ok(stats)
}

fn load_vendors(path: Option<&Path>) -> Result<VendorTable> {
    let builtin = VendorTable::builtin().clone();
    let Some(path) = path else {
        return Ok(builtin);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read OUI database {}", path.display()))?;
    let table = builtin.merge(VendorTable::from_manuf(&text));
    log::info!("Vendor table loaded: {} prefixes", table.len());
    Ok(table)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    // ── Configuration (all failures surface before capture) ─────────

    let config = cli.filter_config();
    let filter = config.compile().context("invalid display filter")?;
    let capture_filter = filter.capture_filter();

    if cli.print_filter {
        println!("{capture_filter}");
        return Ok(());
    }

    log::info!("probequest v{} starting", VERSION);
    log::info!("Capture filter: {}", capture_filter);

    let vendors = load_vendors(cli.oui_db.as_deref())?;
    let parser = FrameParser::with_vendors(&vendors);

    let pcap = cli
        .pcap
        .as_deref()
        .ok_or_else(|| anyhow!("no capture file given"))?;
    let source = CaptureSource::open(pcap)?;
    let mut output = Output::new(BufWriter::new(io::stdout()), cli.json, cli.output.as_deref())?;

    // ── Capture ─────────────────────────────────────────────────────

    let (frame_tx, frame_rx) = mpsc::sync_channel(FRAME_QUEUE_DEPTH);
    let reader = source.spawn(frame_tx)?;

    let stats = process(frame_rx, &parser, &filter, &mut output)?;

    reader
        .join()
        .map_err(|_| anyhow!("capture thread panicked"))??;

    output.finish(&stats)?;
    log::info!(
        "Done: {} frames, {} probe requests, {} matched, {} rejected",
        stats.frames,
        stats.probes,
        stats.matched,
        stats.rejected,
    );
    Ok(())
}
