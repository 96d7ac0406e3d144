//! Tagged-union message codec.
//!
//! Each [`Message`] variant is serialized as a single protobuf-style field
//! (varint length prefix at the outer, delimited level; field-tag/wire-type
//! encoding for the payload itself), the same shape a nanopb-generated
//! descriptor produces. The core thermostat variants' field numbers are
//! recovered from `secil.h`'s `secil_message_type_t` enum (`currentTemperature
//! = 2` ... `dateTime = 15`), which survived distillation; the variants this
//! port adds beyond that enum continue the numbering from 16 (see
//! `DESIGN.md`).

use crate::error::{Error, Result};

/// Compile-time upper bound on an encoded message body, excluding the
/// outer varint length prefix. `supportPackageData` (255 bytes + tag/len
/// overhead) is the largest variant.
pub const MAX_BODY_SIZE: usize = 320;

/// Upper bound on the delimited body (`varint(len) || body`), which is
/// what the frame codec's `L` measures.
pub const MAX_DELIMITED_SIZE: usize = MAX_BODY_SIZE + 2;

pub const MAX_VERSION_LEN: usize = 31;
pub const MAX_SUPPORT_PACKAGE_LEN: usize = 255;
pub const MAX_WARNING_MESSAGE_LEN: usize = 127;
pub const MAX_OTA_VERSION_LEN: usize = 31;
pub const MAX_LOOPBACK_LEN: usize = 255;

/// Version / handshake version string storage (31 bytes + room to mirror
/// the original's NUL terminator).
pub type VersionString = heapless::String<32>;
/// `supportPackageData` storage.
pub type SupportPackageString = heapless::String<256>;
/// `warning.message` storage.
pub type WarningString = heapless::String<128>;
/// `otaStatus.version` storage.
pub type OtaVersionString = heapless::String<32>;
/// `loopbackTest.data` storage.
pub type LoopbackString = heapless::String<255>;

/// Copies `s` into a fixed-capacity `heapless::String`, truncating at a
/// UTF-8 character boundary within `max_len` bytes. This is the Rust
/// analogue of the original's `strncpy`-into-fixed-buffer truncation: the
/// guarantee is "fits in capacity", not "never loses a trailing byte".
pub fn copy_truncated<const N: usize>(s: &str, max_len: usize) -> heapless::String<N> {
    let bytes = s.as_bytes();
    let mut end = max_len.min(bytes.len()).min(N);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = heapless::String::new();
    // `end` is a valid char boundary <= s.len(), so this slice is valid UTF-8.
    let _ = out.push_str(&s[..end]);
    out
}

/// The operating role a handshake message claims for its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Client,
    Server,
}

impl Mode {
    /// The role the remote end must claim for a handshake to be accepted.
    #[must_use]
    pub fn complement(self) -> Mode {
        match self {
            Mode::Client => Mode::Server,
            Mode::Server => Mode::Client,
        }
    }

    fn to_wire(self) -> u64 {
        match self {
            Mode::Client => 0,
            Mode::Server => 1,
        }
    }

    fn from_wire(v: u64) -> Result<Mode> {
        match v {
            0 => Ok(Mode::Client),
            1 => Ok(Mode::Server),
            _ => Err(Error::DecodeFailed),
        }
    }
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        /// Small, forward-compatible enumeration decoded from a single
        /// varint on the wire. An unrecognized discriminant is preserved
        /// in `Other` rather than failing the whole message, matching the
        /// "schema-defined, out of core scope" treatment these enums get
        /// in the design (see `DESIGN.md`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+,
            /// A discriminant this build does not recognize, preserved verbatim.
            Other(u8),
        }

        impl $name {
            fn to_wire(self) -> u64 {
                match self {
                    $($name::$variant => $value),+,
                    $name::Other(v) => v as u64,
                }
            }

            fn from_wire(v: u64) -> Self {
                match v {
                    $($value => $name::$variant),+,
                    other => $name::Other(other.min(u8::MAX as u64) as u8),
                }
            }
        }
    };
}

wire_enum!(PairingState {
    Unpaired = 0,
    Pairing = 1,
    Paired = 2,
    PairingFailed = 3,
});

wire_enum!(SystemStatus {
    Down = 0,
    Connecting = 1,
    Up = 2,
});

wire_enum!(ResetState {
    None = 0,
    Requested = 1,
    InProgress = 2,
});

wire_enum!(OtaState {
    Idle = 0,
    Downloading = 1,
    Verifying = 2,
    Applying = 3,
    Failed = 4,
});

wire_enum!(WarningType {
    Generic = 0,
    LowMemory = 1,
    SensorFault = 2,
    CommsDegraded = 3,
});

/// Body of the `otaStatus` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaStatus {
    pub state: OtaState,
    /// Percentage complete, always `<= 100` once constructed (clamped on
    /// both send and receive — see `DESIGN.md`'s Open Question resolution).
    pub progress: u8,
    pub version: OtaVersionString,
}

/// Body of the `warning` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningType,
    pub message: WarningString,
}

/// Body of the `handshake` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub mode: Mode,
    pub version: VersionString,
    pub needs_ack: bool,
}

/// The tagged union exchanged over the link.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    CurrentTemperature(i8),
    HeatingSetpoint(i8),
    AwayHeatingSetpoint(i8),
    CoolingSetpoint(i8),
    AwayCoolingSetpoint(i8),
    HvacMode(i8),
    LocalUiState(i8),
    RelativeHumidity(bool),
    AccessoryState(bool),
    DemandResponse(bool),
    AwayMode(bool),
    AutoWake(bool),
    DateAndTime(u64),
    SupportPackageData(SupportPackageString),
    PairingState(PairingState),
    WifiStatus(SystemStatus),
    MatterStatus(SystemStatus),
    FactoryReset(ResetState),
    OtaStatus(OtaStatus),
    Warning(Warning),
    LoopbackTest(LoopbackString),
    Handshake(Handshake),
}

impl Message {
    /// The wire tag (protobuf field number) this message will be encoded
    /// with. The first 14 match `secil.h`'s `secil_message_type_t` exactly;
    /// the rest continue that numbering (see `DESIGN.md`).
    #[must_use]
    pub fn tag(&self) -> u32 {
        match self {
            Message::CurrentTemperature(_) => 2,
            Message::HeatingSetpoint(_) => 3,
            Message::AwayHeatingSetpoint(_) => 4,
            Message::CoolingSetpoint(_) => 5,
            Message::AwayCoolingSetpoint(_) => 6,
            Message::HvacMode(_) => 7,
            Message::RelativeHumidity(_) => 8,
            Message::AccessoryState(_) => 9,
            Message::SupportPackageData(_) => 10,
            Message::DemandResponse(_) => 11,
            Message::AwayMode(_) => 12,
            Message::AutoWake(_) => 13,
            Message::LocalUiState(_) => 14,
            Message::DateAndTime(_) => 15,
            Message::PairingState(_) => 16,
            Message::WifiStatus(_) => 17,
            Message::MatterStatus(_) => 18,
            Message::FactoryReset(_) => 19,
            Message::OtaStatus(_) => 20,
            Message::Warning(_) => 21,
            Message::LoopbackTest(_) => 22,
            Message::Handshake(_) => 23,
        }
    }

    /// True for the two variants the session loop consumes internally and
    /// never hands to the caller (§4.7).
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Message::LoopbackTest(_) | Message::Handshake(_))
    }
}

// --- varint primitives -------------------------------------------------------------

const WIRE_VARINT: u8 = 0;
const WIRE_LEN: u8 = 2;

fn write_varint(mut v: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let mut byte = (v & 0x7F) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        buf[i] = byte;
        i += 1;
        if v == 0 {
            break;
        }
    }
    i
}

fn read_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return Err(Error::DecodeFailed);
        }
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(Error::DecodeFailed)
}

// --- field writer/reader ---------------------------------------------------------

struct Writer<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.offset.checked_add(bytes.len()).ok_or(Error::EncodeFailed)?;
        let dst = self.buf.get_mut(self.offset..end).ok_or(Error::EncodeFailed)?;
        dst.copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    fn write_tag(&mut self, field: u32, wire_type: u8) -> Result<()> {
        let mut tmp = [0u8; 5];
        let n = write_varint(((field as u64) << 3) | wire_type as u64, &mut tmp);
        self.write_raw(&tmp[..n])
    }

    fn write_varint_field(&mut self, field: u32, v: u64) -> Result<()> {
        self.write_tag(field, WIRE_VARINT)?;
        let mut tmp = [0u8; 10];
        let n = write_varint(v, &mut tmp);
        self.write_raw(&tmp[..n])
    }

    fn write_bool_field(&mut self, field: u32, v: bool) -> Result<()> {
        self.write_varint_field(field, v as u64)
    }

    /// Writes an `int8_t` field the way nanopb's plain `int32` fields do:
    /// sign-extended two's-complement, not ZigZag. A negative value sign-
    /// extends to a full 10-byte varint, matching a real nanopb peer.
    fn write_sint8_field(&mut self, field: u32, v: i8) -> Result<()> {
        self.write_varint_field(field, (v as i64) as u64)
    }

    fn write_bytes_field(&mut self, field: u32, bytes: &[u8]) -> Result<()> {
        self.write_tag(field, WIRE_LEN)?;
        let mut tmp = [0u8; 5];
        let n = write_varint(bytes.len() as u64, &mut tmp);
        self.write_raw(&tmp[..n])?;
        self.write_raw(bytes)
    }

    fn write_string_field(&mut self, field: u32, s: &str) -> Result<()> {
        self.write_bytes_field(field, s.as_bytes())
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn at_end(&self) -> bool {
        self.offset >= self.buf.len()
    }

    fn read_tag(&mut self) -> Result<(u32, u8)> {
        let (v, n) = read_varint(&self.buf[self.offset..])?;
        self.offset += n;
        Ok(((v >> 3) as u32, (v & 0x7) as u8))
    }

    fn read_varint(&mut self) -> Result<u64> {
        let (v, n) = read_varint(&self.buf[self.offset..])?;
        self.offset += n;
        Ok(v)
    }

    fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()? as usize;
        let start = self.offset;
        let end = start.checked_add(len).ok_or(Error::DecodeFailed)?;
        let slice = self.buf.get(start..end).ok_or(Error::DecodeFailed)?;
        self.offset = end;
        Ok(slice)
    }

    fn read_str(&mut self) -> Result<&'a str> {
        let bytes = self.read_bytes()?;
        core::str::from_utf8(bytes).map_err(|_| Error::DecodeFailed)
    }

    fn expect_varint(&mut self, wire_type: u8) -> Result<u64> {
        if wire_type != WIRE_VARINT {
            return Err(Error::DecodeFailed);
        }
        self.read_varint()
    }

    fn expect_str(&mut self, wire_type: u8) -> Result<&'a str> {
        if wire_type != WIRE_LEN {
            return Err(Error::DecodeFailed);
        }
        self.read_str()
    }

    fn expect_bytes(&mut self, wire_type: u8) -> Result<&'a [u8]> {
        if wire_type != WIRE_LEN {
            return Err(Error::DecodeFailed);
        }
        self.read_bytes()
    }
}

/// Reverses [`Writer::write_sint8_field`]: reinterpret the varint's 64-bit
/// pattern as two's-complement and narrow to `i8`.
fn read_sint8(raw: u64) -> Result<i8> {
    i8::try_from(raw as i64).map_err(|_| Error::DecodeFailed)
}

// --- nested message bodies --------------------------------------------------------

fn encode_ota_status(ota: &OtaStatus, buf: &mut [u8]) -> Result<usize> {
    let mut w = Writer::new(buf);
    w.write_varint_field(1, ota.state.to_wire())?;
    w.write_varint_field(2, ota.progress.min(100) as u64)?;
    w.write_string_field(3, &ota.version)?;
    Ok(w.offset)
}

fn decode_ota_status(buf: &[u8]) -> Result<OtaStatus> {
    let mut r = Reader::new(buf);
    let mut state = OtaState::Idle;
    let mut progress = 0u8;
    let mut version = OtaVersionString::new();
    while !r.at_end() {
        let (field, wire_type) = r.read_tag()?;
        match field {
            1 => state = OtaState::from_wire(r.expect_varint(wire_type)?),
            2 => progress = r.expect_varint(wire_type)?.min(100) as u8,
            3 => version = copy_truncated(r.expect_str(wire_type)?, MAX_OTA_VERSION_LEN),
            _ => return Err(Error::DecodeFailed),
        }
    }
    Ok(OtaStatus { state, progress, version })
}

fn encode_warning(w: &Warning, buf: &mut [u8]) -> Result<usize> {
    let mut writer = Writer::new(buf);
    writer.write_varint_field(1, w.kind.to_wire())?;
    writer.write_string_field(2, &w.message)?;
    Ok(writer.offset)
}

fn decode_warning(buf: &[u8]) -> Result<Warning> {
    let mut r = Reader::new(buf);
    let mut kind = WarningType::Generic;
    let mut message = WarningString::new();
    while !r.at_end() {
        let (field, wire_type) = r.read_tag()?;
        match field {
            1 => kind = WarningType::from_wire(r.expect_varint(wire_type)?),
            2 => message = copy_truncated(r.expect_str(wire_type)?, MAX_WARNING_MESSAGE_LEN),
            _ => return Err(Error::DecodeFailed),
        }
    }
    Ok(Warning { kind, message })
}

fn encode_handshake(h: &Handshake, buf: &mut [u8]) -> Result<usize> {
    let mut w = Writer::new(buf);
    w.write_varint_field(1, h.mode.to_wire())?;
    w.write_string_field(2, &h.version)?;
    w.write_bool_field(3, h.needs_ack)?;
    Ok(w.offset)
}

fn decode_handshake(buf: &[u8]) -> Result<Handshake> {
    let mut r = Reader::new(buf);
    let mut mode = None;
    let mut version = VersionString::new();
    let mut needs_ack = false;
    while !r.at_end() {
        let (field, wire_type) = r.read_tag()?;
        match field {
            1 => mode = Some(Mode::from_wire(r.expect_varint(wire_type)?)?),
            2 => version = copy_truncated(r.expect_str(wire_type)?, MAX_VERSION_LEN),
            3 => needs_ack = r.expect_varint(wire_type)? != 0,
            _ => return Err(Error::DecodeFailed),
        }
    }
    Ok(Handshake { mode: mode.ok_or(Error::DecodeFailed)?, version, needs_ack })
}

// --- top-level message body --------------------------------------------------------

/// Encodes `msg`'s single tagged field into `buf`, returning the number of
/// bytes written (not including the outer delimited-length varint).
pub fn encode_message(msg: &Message, buf: &mut [u8]) -> Result<usize> {
    let mut w = Writer::new(buf);
    match msg {
        Message::CurrentTemperature(v) => w.write_sint8_field(2, *v)?,
        Message::HeatingSetpoint(v) => w.write_sint8_field(3, *v)?,
        Message::AwayHeatingSetpoint(v) => w.write_sint8_field(4, *v)?,
        Message::CoolingSetpoint(v) => w.write_sint8_field(5, *v)?,
        Message::AwayCoolingSetpoint(v) => w.write_sint8_field(6, *v)?,
        Message::HvacMode(v) => w.write_sint8_field(7, *v)?,
        Message::RelativeHumidity(v) => w.write_bool_field(8, *v)?,
        Message::AccessoryState(v) => w.write_bool_field(9, *v)?,
        Message::SupportPackageData(s) => w.write_string_field(10, s)?,
        Message::DemandResponse(v) => w.write_bool_field(11, *v)?,
        Message::AwayMode(v) => w.write_bool_field(12, *v)?,
        Message::AutoWake(v) => w.write_bool_field(13, *v)?,
        Message::LocalUiState(v) => w.write_sint8_field(14, *v)?,
        Message::DateAndTime(v) => w.write_varint_field(15, *v)?,
        Message::PairingState(v) => w.write_varint_field(16, v.to_wire())?,
        Message::WifiStatus(v) => w.write_varint_field(17, v.to_wire())?,
        Message::MatterStatus(v) => w.write_varint_field(18, v.to_wire())?,
        Message::FactoryReset(v) => w.write_varint_field(19, v.to_wire())?,
        Message::OtaStatus(ota) => {
            let mut nested = [0u8; 64];
            let n = encode_ota_status(ota, &mut nested)?;
            w.write_bytes_field(20, &nested[..n])?
        }
        Message::Warning(warning) => {
            let mut nested = [0u8; MAX_WARNING_MESSAGE_LEN + 16];
            let n = encode_warning(warning, &mut nested)?;
            w.write_bytes_field(21, &nested[..n])?
        }
        Message::LoopbackTest(s) => w.write_string_field(22, s)?,
        Message::Handshake(h) => {
            let mut nested = [0u8; 64];
            let n = encode_handshake(h, &mut nested)?;
            w.write_bytes_field(23, &nested[..n])?
        }
    }
    Ok(w.offset)
}

/// Decodes a single tagged field from `buf` into a [`Message`]. Any bytes
/// left over after the one field is read are rejected: the data model
/// guarantees exactly one variant is present per message.
pub fn decode_message(buf: &[u8]) -> Result<Message> {
    let mut r = Reader::new(buf);
    let (field, wire_type) = r.read_tag()?;
    let message = match field {
        2 => Message::CurrentTemperature(read_sint8(r.expect_varint(wire_type)?)?),
        3 => Message::HeatingSetpoint(read_sint8(r.expect_varint(wire_type)?)?),
        4 => Message::AwayHeatingSetpoint(read_sint8(r.expect_varint(wire_type)?)?),
        5 => Message::CoolingSetpoint(read_sint8(r.expect_varint(wire_type)?)?),
        6 => Message::AwayCoolingSetpoint(read_sint8(r.expect_varint(wire_type)?)?),
        7 => Message::HvacMode(read_sint8(r.expect_varint(wire_type)?)?),
        8 => Message::RelativeHumidity(r.expect_varint(wire_type)? != 0),
        9 => Message::AccessoryState(r.expect_varint(wire_type)? != 0),
        10 => Message::SupportPackageData(copy_truncated(
            r.expect_str(wire_type)?,
            MAX_SUPPORT_PACKAGE_LEN,
        )),
        11 => Message::DemandResponse(r.expect_varint(wire_type)? != 0),
        12 => Message::AwayMode(r.expect_varint(wire_type)? != 0),
        13 => Message::AutoWake(r.expect_varint(wire_type)? != 0),
        14 => Message::LocalUiState(read_sint8(r.expect_varint(wire_type)?)?),
        15 => Message::DateAndTime(r.expect_varint(wire_type)?),
        16 => Message::PairingState(PairingState::from_wire(r.expect_varint(wire_type)?)),
        17 => Message::WifiStatus(SystemStatus::from_wire(r.expect_varint(wire_type)?)),
        18 => Message::MatterStatus(SystemStatus::from_wire(r.expect_varint(wire_type)?)),
        19 => Message::FactoryReset(ResetState::from_wire(r.expect_varint(wire_type)?)),
        20 => Message::OtaStatus(decode_ota_status(r.expect_bytes(wire_type)?)?),
        21 => Message::Warning(decode_warning(r.expect_bytes(wire_type)?)?),
        22 => Message::LoopbackTest(copy_truncated(r.expect_str(wire_type)?, MAX_LOOPBACK_LEN)),
        23 => Message::Handshake(decode_handshake(r.expect_bytes(wire_type)?)?),
        _ => return Err(Error::UnknownMessageType),
    };
    if !r.at_end() {
        return Err(Error::DecodeFailed);
    }
    Ok(message)
}

/// Encodes `msg` length-delimited (`varint(len) || body`), the form the
/// frame codec writes as a frame's body.
pub fn encode_delimited(msg: &Message, out: &mut [u8]) -> Result<usize> {
    let mut body = [0u8; MAX_BODY_SIZE];
    let body_len = encode_message(msg, &mut body)?;
    let mut len_buf = [0u8; 5];
    let len_size = write_varint(body_len as u64, &mut len_buf);
    let total = len_size + body_len;
    if out.len() < total {
        return Err(Error::EncodeFailed);
    }
    out[..len_size].copy_from_slice(&len_buf[..len_size]);
    out[len_size..total].copy_from_slice(&body[..body_len]);
    Ok(total)
}

/// Decodes a length-delimited body produced by [`encode_delimited`]. The
/// varint's value must equal `data.len() - varint_size` exactly — the
/// frame codec's `L` already bounds the body, so any mismatch here means
/// the body and the frame header disagree.
pub fn decode_delimited(data: &[u8]) -> Result<Message> {
    let (len, varint_len) = read_varint(data)?;
    let len = len as usize;
    if varint_len.checked_add(len) != Some(data.len()) {
        return Err(Error::DecodeFailed);
    }
    decode_message(&data[varint_len..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(msg: Message) {
        let mut buf = [0u8; MAX_DELIMITED_SIZE];
        let n = encode_delimited(&msg, &mut buf).expect("encode");
        let decoded = decode_delimited(&buf[..n]).expect("decode");
        assert_eq!(msg, decoded);
    }

    #[test]
    fn scalar_roundtrips() {
        roundtrip(Message::CurrentTemperature(22));
        roundtrip(Message::CurrentTemperature(-40));
        roundtrip(Message::HeatingSetpoint(i8::MIN));
        roundtrip(Message::HeatingSetpoint(i8::MAX));
        roundtrip(Message::RelativeHumidity(true));
        roundtrip(Message::DemandResponse(false));
        roundtrip(Message::DateAndTime(1_732_000_000));
        roundtrip(Message::AutoWake(true));
    }

    #[test]
    fn current_temperature_matches_the_pinned_wire_bytes() {
        // field 2 (secil.h's currentTemperature), wire type 0 (varint):
        // tag byte = (2 << 3) | 0 = 0x10, value byte = 22 plain, not ZigZag.
        let mut buf = [0u8; 8];
        let n = encode_message(&Message::CurrentTemperature(22), &mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x10, 22]);
    }

    #[test]
    fn negative_scalar_sign_extends_like_a_plain_nanopb_int32() {
        // A nanopb peer treats these as plain int32 varints: a negative
        // value sign-extends to all ten bytes, it does not ZigZag-fold
        // into one byte the way a `sint32` field would.
        let mut buf = [0u8; 16];
        let n = encode_message(&Message::HeatingSetpoint(-1), &mut buf).unwrap();
        assert_eq!(n, 1 /* tag */ + 10 /* varint */);
        assert!(buf[1..n].iter().all(|&b| b & 0x80 != 0 || b == 0x01));
    }

    #[test]
    fn string_field_roundtrips() {
        roundtrip(Message::SupportPackageData(
            copy_truncated("diagnostic blob", MAX_SUPPORT_PACKAGE_LEN),
        ));
        roundtrip(Message::LoopbackTest(copy_truncated("hello", MAX_LOOPBACK_LEN)));
    }

    #[test]
    fn enum_roundtrips() {
        roundtrip(Message::PairingState(PairingState::Paired));
        roundtrip(Message::WifiStatus(SystemStatus::Connecting));
        roundtrip(Message::FactoryReset(ResetState::Requested));
    }

    #[test]
    fn unknown_enum_discriminant_is_preserved_not_rejected() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        w.write_varint_field(17, 99).unwrap();
        let n = w.offset;
        let decoded = decode_message(&buf[..n]).unwrap();
        assert_eq!(decoded, Message::WifiStatus(SystemStatus::Other(99)));
    }

    #[test]
    fn ota_status_roundtrips_and_clamps_progress() {
        let msg = Message::OtaStatus(OtaStatus {
            state: OtaState::Downloading,
            progress: 255,
            version: copy_truncated("1.2.3", MAX_OTA_VERSION_LEN),
        });
        let mut buf = [0u8; MAX_DELIMITED_SIZE];
        let n = encode_delimited(&msg, &mut buf).unwrap();
        let decoded = decode_delimited(&buf[..n]).unwrap();
        match decoded {
            Message::OtaStatus(ota) => assert_eq!(ota.progress, 100),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn warning_roundtrips() {
        roundtrip(Message::Warning(Warning {
            kind: WarningType::LowMemory,
            message: copy_truncated("heap low", MAX_WARNING_MESSAGE_LEN),
        }));
    }

    #[test]
    fn handshake_roundtrips() {
        roundtrip(Message::Handshake(Handshake {
            mode: Mode::Client,
            version: copy_truncated("1.0.0", MAX_VERSION_LEN),
            needs_ack: true,
        }));
    }

    #[test]
    fn truncation_keeps_valid_utf8() {
        let s: heapless::String<4> = copy_truncated("héllo", 4);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn trailing_bytes_after_field_are_rejected() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        w.write_varint_field(8, 1).unwrap();
        w.write_raw(&[0xFF]).unwrap();
        let n = w.offset;
        assert!(matches!(decode_message(&buf[..n]), Err(Error::DecodeFailed)));
    }
}
