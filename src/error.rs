//! Error taxonomy shared by the record model, the frame parser and the
//! filter configuration.

use thiserror::Error;

/// Errors produced while turning captured frames into probe request records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The frame is not an 802.11 probe request. Expected for most traffic.
    #[error("frame is not a probe request")]
    NotAProbeRequest,

    /// A field expected to hold a hardware address is malformed.
    #[error("invalid MAC address format: {0}")]
    InvalidAddressFormat(String),

    /// A required record field was not supplied.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The capture timestamp is NaN or infinite.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    /// The ESSID regular expression does not compile.
    #[error("invalid ESSID pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl Error {
    /// True for the expected "not a probe request" rejection.
    pub fn is_not_a_probe_request(&self) -> bool {
        matches!(self, Error::NotAProbeRequest)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
