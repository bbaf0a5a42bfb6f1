//! SNMPv2c trap emission.
//!
//! Traps are BER-encoded in-crate and sent over a per-call UDP socket that
//! is dropped after the send. Each trap carries the standard sysUpTime.0 and
//! snmpTrapOID.0 varbinds plus one OctetString varbind (under the configured
//! OID) with a descriptive value.
//!
//! OIDs must pass a strict dotted-numeric check before any encoding or
//! socket work happens; a malformed OID never reaches the transport layer.

use std::sync::OnceLock;
use std::time::Instant;

use log::info;
use regex::Regex;
use tokio::net::UdpSocket;

use crate::config::SNMP_TRAP_PORT;
use crate::error_handling::NotifyError;

/// sysUpTime.0 (TimeTicks since the notifying process started).
const SYS_UPTIME_OID: &str = ".1.3.6.1.2.1.1.3.0";
/// snmpTrapOID.0 (identifies which trap this is).
const SNMP_TRAP_OID: &str = ".1.3.6.1.6.3.1.1.4.1.0";

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_TIMETICKS: u8 = 0x43;
const TAG_TRAP_V2_PDU: u8 = 0xA7;

fn oid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\.\d+)+$").expect("OID pattern is valid"))
}

fn process_start() -> Instant {
    static START: OnceLock<Instant> = OnceLock::new();
    *START.get_or_init(Instant::now)
}

/// Checks an OID against the strict dotted-numeric form (`.1.3.6.1.4.1...`).
pub fn is_valid_oid(oid: &str) -> bool {
    oid_pattern().is_match(oid)
}

/// Sends one trap to `receiver` (a host, optionally `host:port`; the
/// standard trap port 162 is used when none is given).
///
/// # Errors
///
/// Returns `NotifyError::MalformedOid` for OIDs failing the format check,
/// and `NotifyError::TrapSendError` for socket failures.
pub async fn send_trap(
    receiver: &str,
    community: &str,
    oid: &str,
    value: &str,
) -> Result<(), NotifyError> {
    let uptime_ticks = (process_start().elapsed().as_millis() / 10) as u32;
    let request_id = i32::from(rand::random::<u16>());
    let pdu = build_trap(community, oid, value, request_id, uptime_ticks)?;

    let (host, port) = receiver_addr(receiver);
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.send_to(&pdu, (host.as_str(), port)).await?;
    info!("SNMP trap {oid} sent to {host}:{port}");
    Ok(())
}

/// Splits `host` / `host:port`, defaulting to the standard trap port.
fn receiver_addr(receiver: &str) -> (String, u16) {
    if let Some((host, port)) = receiver.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return (host.to_string(), port);
        }
    }
    (receiver.to_string(), SNMP_TRAP_PORT)
}

/// Builds the complete SNMPv2c trap message.
///
/// Layout: `SEQUENCE { version(1), community, [7] { request-id, 0, 0,
/// varbinds } }` with the three varbinds described in the module docs.
pub(crate) fn build_trap(
    community: &str,
    trap_oid: &str,
    value: &str,
    request_id: i32,
    uptime_ticks: u32,
) -> Result<Vec<u8>, NotifyError> {
    if !is_valid_oid(trap_oid) {
        return Err(NotifyError::MalformedOid(trap_oid.to_string()));
    }

    let mut varbinds = Vec::new();
    varbinds.extend(varbind(SYS_UPTIME_OID, &timeticks(uptime_ticks))?);
    varbinds.extend(varbind(SNMP_TRAP_OID, &tlv(TAG_OID, &oid_content(trap_oid)?))?);
    varbinds.extend(varbind(
        trap_oid,
        &tlv(TAG_OCTET_STRING, value.as_bytes()),
    )?);

    let mut pdu_content = integer(i64::from(request_id));
    pdu_content.extend(integer(0)); // error-status
    pdu_content.extend(integer(0)); // error-index
    pdu_content.extend(tlv(TAG_SEQUENCE, &varbinds));

    let mut message = integer(1); // version: SNMPv2c
    message.extend(tlv(TAG_OCTET_STRING, community.as_bytes()));
    message.extend(tlv(TAG_TRAP_V2_PDU, &pdu_content));

    Ok(tlv(TAG_SEQUENCE, &message))
}

/// One `SEQUENCE { OID, value }` varbind. `encoded_value` is already a
/// complete TLV.
fn varbind(oid: &str, encoded_value: &[u8]) -> Result<Vec<u8>, NotifyError> {
    let mut content = tlv(TAG_OID, &oid_content(oid)?);
    content.extend_from_slice(encoded_value);
    Ok(tlv(TAG_SEQUENCE, &content))
}

/// Tag-length-value wrapper.
fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    encode_length(&mut out, content.len());
    out.extend_from_slice(content);
    out
}

/// Definite-form BER length: short form below 128, long form above.
fn encode_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// Minimal two's-complement INTEGER TLV.
fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        // Drop redundant leading bytes: 0x00 before a clear sign bit,
        // 0xFF before a set one.
        let current = bytes[start];
        let next_msb_set = bytes[start + 1] & 0x80 != 0;
        if (current == 0x00 && !next_msb_set) || (current == 0xFF && next_msb_set) {
            start += 1;
        } else {
            break;
        }
    }
    tlv(TAG_INTEGER, &bytes[start..])
}

/// TimeTicks TLV: unsigned, application tag 0x43.
fn timeticks(value: u32) -> Vec<u8> {
    let bytes = u64::from(value).to_be_bytes();
    let skip = bytes
        .iter()
        .take_while(|b| **b == 0)
        .count()
        .min(bytes.len() - 1);
    let mut content = bytes[skip..].to_vec();
    if content[0] & 0x80 != 0 {
        content.insert(0, 0x00);
    }
    tlv(TAG_TIMETICKS, &content)
}

/// OID content bytes: first two arcs packed as `40 * a + b`, remaining arcs
/// base-128 with continuation bits.
fn oid_content(oid: &str) -> Result<Vec<u8>, NotifyError> {
    let arcs: Vec<u64> = oid
        .trim_start_matches('.')
        .split('.')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| NotifyError::MalformedOid(oid.to_string()))?;
    if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] > 39) {
        return Err(NotifyError::MalformedOid(oid.to_string()));
    }

    let mut out = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for &arc in &arcs[2..] {
        out.extend(base128(arc));
    }
    Ok(out)
}

fn base128(mut value: u64) -> Vec<u8> {
    let mut out = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        out.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    out.reverse();
    out
}
