//! Binary packet encoder (collectd network protocol)
//!
//! Every part is `type:u16be | length:u16be | body`, length counting the
//! 4-byte header. Identity parts are only written when they differ from the
//! previous value in the same packet; each new packet starts from scratch.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use contracts::{ContractError, Destination, ExportBatch};
use tracing::{debug, warn};

use super::{Encoded, Encoder};
use crate::template::sanitize;

/// Collector's compiled-in default buffer size
pub const DEFAULT_PAYLOAD_LENGTH: usize = 1452;

/// Part type codes
pub mod part {
    pub const HOST: u16 = 0x0000;
    pub const TIME: u16 = 0x0001;
    pub const PLUGIN: u16 = 0x0002;
    pub const PLUGIN_INSTANCE: u16 = 0x0003;
    pub const TYPE: u16 = 0x0004;
    pub const TYPE_INSTANCE: u16 = 0x0005;
    pub const VALUES: u16 = 0x0006;
    pub const INTERVAL: u16 = 0x0007;
    pub const TIME_HR: u16 = 0x0008;
    pub const INTERVAL_HR: u16 = 0x0009;
}

/// Value type codes inside a VALUES part
pub mod value_type {
    pub const COUNTER: u8 = 0;
    pub const GAUGE: u8 = 1;
    pub const DERIVE: u8 = 2;
    pub const ABSOLUTE: u8 = 3;
}

const PART_HEADER_LEN: usize = 4;
const GAUGE_TYPE_NAME: &str = "gauge";

/// Seconds to the collector's 2^-30 second resolution
pub fn to_time_hr(seconds: i64) -> u64 {
    (seconds.max(0) as u64) << 30
}

/// Identity parts already present in the packet being built
#[derive(Debug, Default, Clone)]
struct HeaderState {
    host: Option<String>,
    time: Option<u64>,
    plugin: Option<String>,
    type_name: Option<String>,
}

/// Encoder for the binary packet protocol
pub struct PacketEncoder<'a> {
    destination: &'a Destination,
}

impl<'a> PacketEncoder<'a> {
    pub fn new(destination: &'a Destination) -> Self {
        Self { destination }
    }

    /// Build the parts for one sample, skipping identity parts already in `state`
    fn build_group(
        &self,
        state: &mut HeaderState,
        time_hr: u64,
        plugin: &str,
        type_instance: &str,
        value: f64,
    ) -> BytesMut {
        let mut group = BytesMut::new();
        let host = self.destination.sender_host.as_str();

        if state.host.as_deref() != Some(host) {
            put_string_part(&mut group, part::HOST, host);
            state.host = Some(host.to_string());
        }
        if state.time != Some(time_hr) {
            put_numeric_part(&mut group, part::TIME_HR, time_hr);
            state.time = Some(time_hr);
        }
        if state.plugin.as_deref() != Some(plugin) {
            put_string_part(&mut group, part::PLUGIN, plugin);
            state.plugin = Some(plugin.to_string());
        }
        if state.type_name.as_deref() != Some(GAUGE_TYPE_NAME) {
            put_string_part(&mut group, part::TYPE, GAUGE_TYPE_NAME);
            state.type_name = Some(GAUGE_TYPE_NAME.to_string());
        }
        put_string_part(&mut group, part::TYPE_INSTANCE, type_instance);
        put_gauge_part(&mut group, value);
        group
    }
}

impl Encoder for PacketEncoder<'_> {
    fn encode(&self, batch: &ExportBatch) -> Encoded {
        let dest = self.destination;
        let mut encoded = Encoded::default();
        if !dest.send_perf {
            return encoded;
        }

        let limit = dest.payload_length;
        let time_hr = to_time_hr(batch.timestamp.saturating_add(dest.time_offset));
        let mut packet = BytesMut::with_capacity(limit);
        let mut state = HeaderState::default();

        for item in &batch.items {
            let plugin = sanitize(&item.check_alias);

            for sample in item.samples() {
                let instance = sanitize(&sample.alias);
                if !sample.value.is_finite() {
                    encoded.skipped += 1;
                    debug!(
                        destination = %dest.alias,
                        error = %ContractError::encode(&instance, "value is not finite"),
                        "Skipping sample"
                    );
                    continue;
                }

                let mut next_state = state.clone();
                let mut group =
                    self.build_group(&mut next_state, time_hr, &plugin, &instance, sample.value);

                if !packet.is_empty() && packet.len() + group.len() > limit {
                    encoded.frames.push(packet.split().freeze());
                    state = HeaderState::default();
                    next_state = HeaderState::default();
                    group = self.build_group(
                        &mut next_state,
                        time_hr,
                        &plugin,
                        &instance,
                        sample.value,
                    );
                }

                if group.len() > limit {
                    encoded.skipped += 1;
                    warn!(
                        destination = %dest.alias,
                        size = group.len(),
                        limit,
                        error = %ContractError::encode(&instance, "record exceeds payload length"),
                        "Skipping sample"
                    );
                    continue;
                }

                packet.extend_from_slice(&group);
                state = next_state;
                encoded.records += 1;
            }
        }

        if !packet.is_empty() {
            encoded.frames.push(packet.freeze());
        }
        encoded
    }
}

fn put_string_part(buf: &mut BytesMut, kind: u16, value: &str) {
    // NUL terminated
    let len = PART_HEADER_LEN + value.len() + 1;
    buf.put_u16(kind);
    buf.put_u16(len as u16);
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
}

fn put_numeric_part(buf: &mut BytesMut, kind: u16, value: u64) {
    buf.put_u16(kind);
    buf.put_u16((PART_HEADER_LEN + 8) as u16);
    buf.put_u64(value);
}

fn put_gauge_part(buf: &mut BytesMut, value: f64) {
    // header + count + one type byte + one 8-byte value
    buf.put_u16(part::VALUES);
    buf.put_u16((PART_HEADER_LEN + 2 + 1 + 8) as u16);
    buf.put_u16(1);
    buf.put_u8(value_type::GAUGE);
    buf.put_f64_le(value);
}

/// One value inside a VALUES part
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Counter(u64),
    Gauge(f64),
    Derive(i64),
    Absolute(u64),
}

/// Decoded packet part
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text { kind: u16, value: String },
    Numeric { kind: u16, value: u64 },
    Values(Vec<Value>),
    Unknown { kind: u16, body: Bytes },
}

impl Part {
    /// Part type code
    pub fn kind(&self) -> u16 {
        match self {
            Self::Text { kind, .. } | Self::Numeric { kind, .. } | Self::Unknown { kind, .. } => {
                *kind
            }
            Self::Values(_) => part::VALUES,
        }
    }
}

/// Split a datagram into parts
pub fn decode_packet(datagram: &[u8]) -> Result<Vec<Part>, ContractError> {
    let mut buf = datagram;
    let mut parts = Vec::new();

    while buf.has_remaining() {
        if buf.remaining() < PART_HEADER_LEN {
            return Err(malformed("truncated part header"));
        }
        let kind = buf.get_u16();
        let len = buf.get_u16() as usize;
        if len < PART_HEADER_LEN || len - PART_HEADER_LEN > buf.remaining() {
            return Err(malformed(format!("bad length {len} for part {kind:#06x}")));
        }
        let (mut body, tail) = buf.split_at(len - PART_HEADER_LEN);
        buf = tail;

        let decoded = match kind {
            part::HOST | part::PLUGIN | part::PLUGIN_INSTANCE | part::TYPE | part::TYPE_INSTANCE => {
                let text = body.strip_suffix(&[0]).ok_or_else(|| {
                    malformed(format!("string part {kind:#06x} not NUL terminated"))
                })?;
                let value = std::str::from_utf8(text)
                    .map_err(|e| malformed(format!("string part {kind:#06x}: {e}")))?;
                Part::Text {
                    kind,
                    value: value.to_string(),
                }
            }
            part::TIME | part::INTERVAL | part::TIME_HR | part::INTERVAL_HR => {
                if body.len() != 8 {
                    return Err(malformed(format!("numeric part {kind:#06x} length {len}")));
                }
                Part::Numeric {
                    kind,
                    value: body.get_u64(),
                }
            }
            part::VALUES => Part::Values(decode_values(&mut body)?),
            _ => Part::Unknown {
                kind,
                body: Bytes::copy_from_slice(body),
            },
        };
        parts.push(decoded);
    }

    Ok(parts)
}

fn decode_values(body: &mut &[u8]) -> Result<Vec<Value>, ContractError> {
    if body.remaining() < 2 {
        return Err(malformed("values part without count"));
    }
    let count = body.get_u16() as usize;
    if body.remaining() != count * 9 {
        return Err(malformed(format!("values part size mismatch for {count} values")));
    }
    let types = body[..count].to_vec();
    body.advance(count);

    types
        .into_iter()
        .map(|t| match t {
            value_type::COUNTER => Ok(Value::Counter(body.get_u64())),
            value_type::GAUGE => Ok(Value::Gauge(body.get_f64_le())),
            value_type::DERIVE => Ok(Value::Derive(body.get_i64())),
            value_type::ABSOLUTE => Ok(Value::Absolute(body.get_u64())),
            other => Err(malformed(format!("unknown value type {other}"))),
        })
        .collect()
}

fn malformed(message: impl Into<String>) -> ContractError {
    ContractError::Other(format!("malformed packet: {}", message.into()))
}
