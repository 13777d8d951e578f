/// Capture-time and display-time filtering of probe requests.
///
/// [`FilterConfig`] holds the user's criteria. It renders the libpcap filter
/// expression handed to the capture tool, and compiles into a [`ProbeFilter`]
/// that is evaluated against every parsed record. Compilation happens once,
/// before capture, so a bad pattern can never fail mid-stream.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::mac::MacAddress;
use crate::record::ProbeRequest;

/// Base capture expression: management frames of the probe-request subtype.
pub const PROBE_REQUEST_FILTER: &str = "type mgt subtype probe-req";

/// Filter criteria. Empty lists impose no restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    /// Only report these source addresses.
    pub mac_filters: Vec<MacAddress>,
    /// Never report these source addresses.
    pub mac_exclusions: Vec<MacAddress>,
    /// Only report these exact ESSIDs.
    pub essid_filters: Vec<String>,
    /// Only report ESSIDs matching this pattern.
    pub essid_regex: Option<String>,
    /// Case-insensitive `essid_regex` matching.
    pub ignore_case: bool,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// libpcap filter expression selecting the frames to capture.
    pub fn generate_capture_filter(&self) -> String {
        let mut filter = String::from(PROBE_REQUEST_FILTER);

        if !self.mac_filters.is_empty() {
            filter.push_str(" and (");
            push_host_list(&mut filter, &self.mac_filters);
            filter.push(')');
        }

        if !self.mac_exclusions.is_empty() {
            filter.push_str(" and not (");
            push_host_list(&mut filter, &self.mac_exclusions);
            filter.push(')');
        }

        filter
    }

    /// Compile the ESSID pattern. `None` means every ESSID matches.
    pub fn compile_essid_matcher(&self) -> Result<Option<EssidMatcher>> {
        let pattern = match self.essid_regex.as_deref() {
            None | Some("") => return Ok(None),
            Some(pattern) => pattern,
        };

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Some(EssidMatcher { regex }))
    }

    /// Validate and compile the configuration into a display filter.
    pub fn compile(&self) -> Result<ProbeFilter> {
        let essid_matcher = self.compile_essid_matcher()?;
        log::debug!(
            "Display filter compiled: {} allowed, {} excluded, {} ESSIDs, pattern {:?}",
            self.mac_filters.len(),
            self.mac_exclusions.len(),
            self.essid_filters.len(),
            essid_matcher.as_ref().map(EssidMatcher::as_str),
        );
        Ok(ProbeFilter {
            config: self.clone(),
            essid_matcher,
        })
    }
}

/// Append `ether src host a|| ether src host b` for each address.
fn push_host_list(filter: &mut String, hosts: &[MacAddress]) {
    for (i, host) in hosts.iter().enumerate() {
        if i > 0 {
            filter.push_str("|| ");
        }
        filter.push_str("ether src host ");
        filter.push_str(&host.to_canonical_string());
    }
}

/// Compiled ESSID pattern.
///
/// An ESSID matches when the pattern matches at its first character; the
/// match need not cover the whole ESSID.
#[derive(Debug, Clone)]
pub struct EssidMatcher {
    regex: Regex,
}

impl EssidMatcher {
    pub fn is_match(&self, essid: &str) -> bool {
        self.regex.find(essid).is_some_and(|m| m.start() == 0)
    }

    /// The pattern as written by the user.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Compiled display predicate. Immutable and shareable between threads.
#[derive(Debug, Clone)]
pub struct ProbeFilter {
    config: FilterConfig,
    essid_matcher: Option<EssidMatcher>,
}

impl ProbeFilter {
    /// True when `probe` passes every configured criterion.
    pub fn matches(&self, probe: &ProbeRequest) -> bool {
        let source = probe.source_mac();
        let config = &self.config;

        (config.mac_filters.is_empty() || config.mac_filters.contains(&source))
            && !config.mac_exclusions.contains(&source)
            && (config.essid_filters.is_empty()
                || config.essid_filters.iter().any(|e| e == probe.essid()))
            && self
                .essid_matcher
                .as_ref()
                .map_or(true, |m| m.is_match(probe.essid()))
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn essid_matcher(&self) -> Option<&EssidMatcher> {
        self.essid_matcher.as_ref()
    }

    pub fn capture_filter(&self) -> String {
        self.config.generate_capture_filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: f64 = 1517872027.0;

    fn macs(list: &[&str]) -> Vec<MacAddress> {
        list.iter().map(|m| m.parse().unwrap()).collect()
    }

    fn probe(mac: &str, essid: &str) -> ProbeRequest {
        ProbeRequest::create(TS, mac, essid).unwrap()
    }

    // ── Capture filter ──────────────────────────────────────────────

    #[test]
    fn default_capture_filter() {
        let config = FilterConfig::new();
        assert_eq!(config.generate_capture_filter(), "type mgt subtype probe-req");
    }

    #[test]
    fn capture_filter_with_mac_filtering() {
        let config = FilterConfig {
            mac_filters: macs(&["a4:77:33:9a:73:5c", "b0:05:94:5d:5a:4d"]),
            ..FilterConfig::new()
        };
        assert_eq!(
            config.generate_capture_filter(),
            "type mgt subtype probe-req \
             and (ether src host a4:77:33:9a:73:5c|| ether src host b0:05:94:5d:5a:4d)"
        );
    }

    #[test]
    fn capture_filter_with_mac_exclusion() {
        let config = FilterConfig {
            mac_exclusions: macs(&["a4:77:33:9a:73:5c", "b0:05:94:5d:5a:4d"]),
            ..FilterConfig::new()
        };
        assert_eq!(
            config.generate_capture_filter(),
            "type mgt subtype probe-req \
             and not (ether src host a4:77:33:9a:73:5c|| ether src host b0:05:94:5d:5a:4d)"
        );
    }

    #[test]
    fn capture_filter_with_both_lists() {
        let config = FilterConfig {
            mac_filters: macs(&["a4:77:33:9a:73:5c"]),
            mac_exclusions: macs(&["B0-05-94-5D-5A-4D"]),
            ..FilterConfig::new()
        };
        assert_eq!(
            config.generate_capture_filter(),
            "type mgt subtype probe-req and (ether src host a4:77:33:9a:73:5c) \
             and not (ether src host b0:05:94:5d:5a:4d)"
        );
    }

    // ── ESSID matcher ───────────────────────────────────────────────

    #[test]
    fn essid_matcher_with_no_regex() {
        assert!(FilterConfig::new().compile_essid_matcher().unwrap().is_none());
        let empty = FilterConfig {
            essid_regex: Some(String::new()),
            ..FilterConfig::new()
        };
        assert!(empty.compile_essid_matcher().unwrap().is_none());
    }

    #[test]
    fn essid_matcher_case_sensitive() {
        let config = FilterConfig {
            essid_regex: Some("Free Wi-Fi".into()),
            ..FilterConfig::new()
        };
        let matcher = config.compile_essid_matcher().unwrap().unwrap();
        assert_eq!(matcher.as_str(), "Free Wi-Fi");
        assert!(matcher.is_match("Free Wi-Fi"));
        assert!(matcher.is_match("Free Wi-Fi Airport"));
        assert!(!matcher.is_match("free wi-fi"));
    }

    #[test]
    fn essid_matcher_case_insensitive() {
        let config = FilterConfig {
            essid_regex: Some("Free Wi-Fi".into()),
            ignore_case: true,
            ..FilterConfig::new()
        };
        let matcher = config.compile_essid_matcher().unwrap().unwrap();
        assert!(matcher.is_match("free wi-fi"));
        assert!(matcher.is_match("FREE WI-FI"));
    }

    #[test]
    fn essid_matcher_anchors_at_start() {
        let config = FilterConfig {
            essid_regex: Some("Wi-Fi".into()),
            ..FilterConfig::new()
        };
        let matcher = config.compile_essid_matcher().unwrap().unwrap();
        assert!(matcher.is_match("Wi-Fi Lounge"));
        assert!(!matcher.is_match("Free Wi-Fi"));
    }

    #[test]
    fn invalid_pattern_fails_at_compile_time() {
        let config = FilterConfig {
            essid_regex: Some("(unclosed".into()),
            ..FilterConfig::new()
        };
        assert!(matches!(
            config.compile_essid_matcher(),
            Err(Error::InvalidPattern { ref pattern, .. }) if pattern == "(unclosed"
        ));
        assert!(config.compile().is_err());
    }

    // ── Display predicate ───────────────────────────────────────────

    #[test]
    fn empty_config_matches_everything() {
        let filter = FilterConfig::new().compile().unwrap();
        assert!(filter.matches(&probe("aa:bb:cc:dd:ee:ff", "")));
        assert!(filter.matches(&probe("00:11:22:33:44:55", "anything")));
    }

    #[test]
    fn allow_list_restricts_sources() {
        let filter = FilterConfig {
            mac_filters: macs(&["aa:bb:cc:dd:ee:ff"]),
            ..FilterConfig::new()
        }
        .compile()
        .unwrap();
        assert!(filter.matches(&probe("AA:BB:CC:DD:EE:FF", "x")));
        assert!(!filter.matches(&probe("00:11:22:33:44:55", "x")));
    }

    #[test]
    fn deny_list_excludes_sources() {
        let filter = FilterConfig {
            mac_exclusions: macs(&["aa:bb:cc:dd:ee:ff"]),
            ..FilterConfig::new()
        }
        .compile()
        .unwrap();
        assert!(!filter.matches(&probe("aa:bb:cc:dd:ee:ff", "x")));
        assert!(filter.matches(&probe("00:11:22:33:44:55", "x")));
    }

    #[test]
    fn allow_and_deny_lists_combine() {
        let filter = FilterConfig {
            mac_filters: macs(&["aa:bb:cc:dd:ee:ff", "00:11:22:33:44:55"]),
            mac_exclusions: macs(&["00:11:22:33:44:55"]),
            ..FilterConfig::new()
        }
        .compile()
        .unwrap();
        assert!(filter.matches(&probe("aa:bb:cc:dd:ee:ff", "x")));
        assert!(!filter.matches(&probe("00:11:22:33:44:55", "x")));
        assert!(!filter.matches(&probe("66:77:88:99:aa:bb", "x")));
    }

    #[test]
    fn essid_list_requires_exact_match() {
        let filter = FilterConfig {
            essid_filters: vec!["home".into(), "office".into()],
            ..FilterConfig::new()
        }
        .compile()
        .unwrap();
        assert!(filter.matches(&probe("aa:bb:cc:dd:ee:ff", "office")));
        assert!(!filter.matches(&probe("aa:bb:cc:dd:ee:ff", "Office")));
        assert!(!filter.matches(&probe("aa:bb:cc:dd:ee:ff", "")));
    }

    #[test]
    fn pattern_and_mac_criteria_are_anded() {
        let filter = FilterConfig {
            mac_exclusions: macs(&["00:11:22:33:44:55"]),
            essid_regex: Some("^corp-".into()),
            ignore_case: true,
            ..FilterConfig::new()
        }
        .compile()
        .unwrap();
        assert!(filter.matches(&probe("aa:bb:cc:dd:ee:ff", "CORP-guest")));
        assert!(!filter.matches(&probe("aa:bb:cc:dd:ee:ff", "guest")));
        assert!(!filter.matches(&probe("00:11:22:33:44:55", "corp-guest")));
    }

    #[test]
    fn compiled_filter_exposes_config() {
        let config = FilterConfig {
            mac_filters: macs(&["a4:77:33:9a:73:5c"]),
            essid_regex: Some("x".into()),
            ..FilterConfig::new()
        };
        let filter = config.compile().unwrap();
        assert_eq!(filter.config(), &config);
        assert_eq!(filter.capture_filter(), config.generate_capture_filter());
        assert_eq!(filter.essid_matcher().map(EssidMatcher::as_str), Some("x"));
    }

    #[test]
    fn probe_filter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProbeFilter>();
    }
}
