use std::net::IpAddr;

use crate::mac::MacAddr;

/// Port the controller listens on for agent telemetry.
pub const DEFAULT_SERVER_PORT: u16 = 2819;
/// Port agents listen on for controller replies.
pub const DEFAULT_AGENT_PORT: u16 = 6777;
/// Receive buffer size; larger datagrams are truncated.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty datagram")]
    Empty,
    #[error("{verb} expects {expected} arguments, got {got}")]
    MissingArgument {
        verb: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("bad hardware address: {0}")]
    BadMac(String),
    #[error("bad ip address: {0}")]
    BadAddr(String),
    #[error("bad rate value: {0}")]
    BadRate(String),
    #[error("bad scan entry: {0}")]
    BadScanEntry(String),
    #[error("bad signal level: {0}")]
    BadLevel(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentMessage {
    Ping,
    ClientInfo {
        mac: MacAddr,
        ip: IpAddr,
    },
    AgentRate {
        rate: f32,
    },
    ClientRate {
        mac: MacAddr,
        ip: IpAddr,
        rate: f32,
    },
}

/// Parses one datagram payload: lossy-decode, trim, lowercase, split on
/// single spaces; the first token selects the message type.
///
/// Unknown message types come back as `Ok(None)` and are dropped by the
/// caller. Agents resend periodically, so the protocol stays lenient
/// about verbs this controller does not know.
pub fn parse_message(payload: &[u8]) -> Result<Option<AgentMessage>, ParseError> {
    let text = String::from_utf8_lossy(payload);
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let fields: Vec<&str> = text.split(' ').collect();

    match fields[0] {
        "ping" => Ok(Some(AgentMessage::Ping)),
        "clientinfo" => {
            expect_args("clientinfo", &fields, 2)?;
            Ok(Some(AgentMessage::ClientInfo {
                mac: parse_mac(fields[1])?,
                ip: parse_ip(fields[2])?,
            }))
        }
        "agentrate" => {
            expect_args("agentrate", &fields, 1)?;
            Ok(Some(AgentMessage::AgentRate {
                rate: parse_rate(fields[1])?,
            }))
        }
        "clientrate" => {
            expect_args("clientrate", &fields, 3)?;
            Ok(Some(AgentMessage::ClientRate {
                mac: parse_mac(fields[1])?,
                ip: parse_ip(fields[2])?,
                rate: parse_rate(fields[3])?,
            }))
        }
        _ => Ok(None),
    }
}

fn expect_args(verb: &'static str, fields: &[&str], expected: usize) -> Result<(), ParseError> {
    let got = fields.len() - 1;
    if got < expected {
        return Err(ParseError::MissingArgument {
            verb,
            expected,
            got,
        });
    }
    Ok(())
}

fn parse_mac(value: &str) -> Result<MacAddr, ParseError> {
    value.parse()
}

fn parse_ip(value: &str) -> Result<IpAddr, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::BadAddr(value.to_string()))
}

fn parse_rate(value: &str) -> Result<f32, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::BadRate(value.to_string()))
}

/// One observed access point in a scan report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub ssid: String,
    pub bssid: String,
    /// Signal level in dBm.
    pub level: i32,
}

/// One telemetry message from an agent's scanning subsystem, listing
/// the signal levels of nearby access points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
}

impl ScanReport {
    /// Wire form: `ssid1&bssid1&level1|ssid2&bssid2&level2|...`.
    /// Empty segments (trailing `|`) are skipped.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut entries = Vec::new();

        for chunk in raw.trim().split('|') {
            if chunk.is_empty() {
                continue;
            }

            let mut fields = chunk.split('&');
            let (Some(ssid), Some(bssid), Some(level)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(ParseError::BadScanEntry(chunk.to_string()));
            };
            if fields.next().is_some() {
                return Err(ParseError::BadScanEntry(chunk.to_string()));
            }

            let level = level
                .trim()
                .parse()
                .map_err(|_| ParseError::BadLevel(level.to_string()))?;

            entries.push(ScanEntry {
                ssid: ssid.to_string(),
                bssid: bssid.to_string(),
                level,
            });
        }

        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Option<AgentMessage>, ParseError> {
        parse_message(text.as_bytes())
    }

    #[test]
    fn test_parse_ping() {
        assert_eq!(parse("ping\n").unwrap(), Some(AgentMessage::Ping));
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        let msg = parse("  CLIENTINFO AA:BB:CC:DD:EE:FF 10.0.0.7\n").unwrap();
        assert_eq!(
            msg,
            Some(AgentMessage::ClientInfo {
                mac: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
                ip: "10.0.0.7".parse().unwrap(),
            })
        );
    }

    #[test]
    fn test_parse_agentrate() {
        let msg = parse("agentrate 182.5").unwrap();
        assert_eq!(msg, Some(AgentMessage::AgentRate { rate: 182.5 }));
    }

    #[test]
    fn test_parse_clientrate() {
        let msg = parse("clientrate aa:bb:cc:dd:ee:ff 10.0.0.7 64.0").unwrap();
        assert_eq!(
            msg,
            Some(AgentMessage::ClientRate {
                mac: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
                ip: "10.0.0.7".parse().unwrap(),
                rate: 64.0,
            })
        );
    }

    #[test]
    fn test_unknown_verb_is_dropped_silently() {
        assert_eq!(parse("subscribe aa:bb:cc:dd:ee:ff").unwrap(), None);
        assert_eq!(parse("pong").unwrap(), None);
    }

    #[test]
    fn test_missing_arguments_are_malformed() {
        assert!(matches!(
            parse("clientinfo aa:bb:cc:dd:ee:ff"),
            Err(ParseError::MissingArgument {
                verb: "clientinfo",
                expected: 2,
                got: 1,
            })
        ));
        assert!(parse("agentrate").is_err());
        assert!(parse("clientrate aa:bb:cc:dd:ee:ff 10.0.0.7").is_err());
    }

    #[test]
    fn test_bad_argument_values() {
        assert!(matches!(
            parse("clientinfo nonsense 10.0.0.7"),
            Err(ParseError::BadMac(_))
        ));
        assert!(matches!(
            parse("clientinfo aa:bb:cc:dd:ee:ff nowhere"),
            Err(ParseError::BadAddr(_))
        ));
        assert!(matches!(
            parse("agentrate fast"),
            Err(ParseError::BadRate(_))
        ));
    }

    #[test]
    fn test_empty_datagram_is_malformed() {
        assert_eq!(parse("").unwrap_err(), ParseError::Empty);
        assert_eq!(parse("   \n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn test_scan_report_parse() {
        let report = ScanReport::parse("eduroam&00:1F:33:A0:00:01&-72|guest&00:1f:33:a0:00:02&-85")
            .unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].ssid, "eduroam");
        assert_eq!(report.entries[0].bssid, "00:1F:33:A0:00:01");
        assert_eq!(report.entries[0].level, -72);
        assert_eq!(report.entries[1].level, -85);
    }

    #[test]
    fn test_scan_report_trailing_separator() {
        let report = ScanReport::parse("eduroam&00:1f:33:a0:00:01&-72|").unwrap();
        assert_eq!(report.entries.len(), 1);
    }

    #[test]
    fn test_scan_report_rejects_malformed_entries() {
        assert!(matches!(
            ScanReport::parse("eduroam&00:1f:33:a0:00:01"),
            Err(ParseError::BadScanEntry(_))
        ));
        assert!(matches!(
            ScanReport::parse("eduroam&bssid&-72&extra"),
            Err(ParseError::BadScanEntry(_))
        ));
        assert!(matches!(
            ScanReport::parse("eduroam&00:1f:33:a0:00:01&strong"),
            Err(ParseError::BadLevel(_))
        ));
    }
}
