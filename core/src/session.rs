//! The owned session handle: the crate's main entry point.
//!
//! `Session<R, W, L, C>` replaces the historical C library's process-wide
//! global state (`STATE` in the JNI bridge this crate grew out of) with a
//! value the caller owns outright. `R`/`W` are blocking transport
//! endpoints (`FrameReader`/`FrameWriter`, blanket-implemented over
//! `embedded_io`), `L` a [`Logger`], `C` an [`OnConnect`] sink.

use crate::config::HandshakeConfig;
use crate::error::{Error, Result};
use crate::frame::{self, FRAME_SCRATCH_SIZE};
use crate::logger::{Logger, OnConnect, Severity};
use crate::message::{
    self, copy_truncated, Handshake, Message, Mode, OtaState, OtaStatus, VersionString, Warning,
    WarningType, MAX_DELIMITED_SIZE, MAX_LOOPBACK_LEN, MAX_OTA_VERSION_LEN,
    MAX_SUPPORT_PACKAGE_LEN, MAX_VERSION_LEN, MAX_WARNING_MESSAGE_LEN,
};
use crate::transport::{FrameReader, FrameWriter};

/// Longest `loopback_test` payload this session will send (one byte of
/// the `255`-byte buffer is reserved so the wire data never brushes
/// against the buffer's capacity edge — see the testable property this
/// mirrors in `DESIGN.md`).
pub const MAX_LOOPBACK_DATA_LEN: usize = MAX_LOOPBACK_LEN - 1;

/// The session's operating role. Distinct from [`Mode`] (the value
/// carried *on the wire* inside a handshake message): this is the
/// session's own local state, which starts `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Uninitialized,
    Client,
    Server,
}

impl OperatingMode {
    fn as_wire_mode(self) -> Option<Mode> {
        match self {
            OperatingMode::Client => Some(Mode::Client),
            OperatingMode::Server => Some(Mode::Server),
            OperatingMode::Uninitialized => None,
        }
    }
}

/// Owned handle over a point-to-point framed link.
pub struct Session<R, W, L, C> {
    read: R,
    write: W,
    logger: L,
    on_connect: C,
    mode: OperatingMode,
    remote_version: VersionString,
    local_version: VersionString,
    in_scratch: [u8; FRAME_SCRATCH_SIZE],
    out_scratch: [u8; FRAME_SCRATCH_SIZE],
}

impl<R, W, L, C> Session<R, W, L, C>
where
    R: FrameReader,
    W: FrameWriter,
    L: Logger,
    C: OnConnect,
{
    /// Builds a new, uninitialized session over `read`/`write`. Always
    /// succeeds — unlike the legacy façade's `init`, constructing a
    /// `Session` directly can never observe a "double init".
    pub fn new(read: R, write: W, logger: L, on_connect: C) -> Self {
        Self {
            read,
            write,
            logger,
            on_connect,
            mode: OperatingMode::Uninitialized,
            remote_version: VersionString::new(),
            local_version: VersionString::new(),
            in_scratch: [0u8; FRAME_SCRATCH_SIZE],
            out_scratch: [0u8; FRAME_SCRATCH_SIZE],
        }
    }

    /// Resets protocol state (role, remote version) back to
    /// `Uninitialized`. Idempotent. Does not affect `read`/`write` — they
    /// are released by the ordinary `Drop` of this struct, the same way
    /// any other owned resource is.
    pub fn deinit(&mut self) {
        self.mode = OperatingMode::Uninitialized;
        self.remote_version = VersionString::new();
        self.local_version = VersionString::new();
    }

    #[must_use]
    pub fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    /// The remote end's version string, recorded at the last successful
    /// handshake (initial or remote-restart).
    pub fn remote_version(&self) -> Result<&str> {
        if self.remote_version.is_empty() {
            Err(Error::NotInitialized)
        } else {
            Ok(&self.remote_version)
        }
    }

    fn log(&mut self, severity: Severity, message: &str) {
        self.logger.log(severity, message);
    }

    fn send_message(&mut self, msg: &Message) -> Result<()> {
        let mut body = [0u8; MAX_DELIMITED_SIZE];
        let n = message::encode_delimited(msg, &mut body)?;
        frame::write_frame(&mut self.write, &body[..n], &mut self.out_scratch)
    }

    /// Exposes `send_message` to the test harness below, which needs to
    /// inject a raw handshake out of band to simulate a remote restart.
    #[cfg(test)]
    fn send_message_for_test(&mut self, msg: &Message) -> Result<()> {
        self.send_message(msg)
    }

    /// Exposes `receive_raw` to the test harness below, which needs to
    /// drain exactly one frame without the interception loop in `receive`
    /// running forever waiting for a user message that never arrives.
    #[cfg(test)]
    fn receive_raw_for_test(&mut self) -> Result<Message> {
        self.receive_raw()
    }

    /// Reads and decodes exactly one frame, without any loopback/handshake
    /// interception. Used internally by [`Session::startup`] (which must
    /// see the raw handshake reply) and by [`Session::loopback_test`]
    /// (which must see the raw echo).
    fn receive_raw(&mut self) -> Result<Message> {
        let len = frame::read_frame(&mut self.read, &mut self.in_scratch)?;
        let start = frame::HEADER_SIZE;
        message::decode_delimited(&self.in_scratch[start..start + len])
    }

    /// Handles a handshake arriving after startup: the remote side has
    /// restarted. Never returns the handshake to the caller.
    fn handle_remote_restart(&mut self, remote: Handshake) -> Result<()> {
        let our_mode = self.mode.as_wire_mode().ok_or(Error::InvalidState)?;
        if remote.mode == our_mode {
            return Err(Error::InvalidState);
        }
        if remote.needs_ack {
            let ack = Handshake { mode: our_mode, version: self.local_version.clone(), needs_ack: false };
            self.send_message(&Message::Handshake(ack))?;
        }
        self.remote_version = remote.version.clone();
        self.on_connect.on_connect(remote.mode, &self.remote_version);
        self.log(Severity::Info, "remote restart observed, handshake re-ack sent");
        Ok(())
    }

    /// Receives the next user-facing message, transparently handling
    /// loopback echoes and remote-restart handshakes without returning
    /// them to the caller.
    pub fn receive(&mut self) -> Result<Message> {
        loop {
            let msg = self.receive_raw()?;
            match msg {
                Message::LoopbackTest(ref data) => {
                    self.send_message(&Message::LoopbackTest(data.clone()))?;
                }
                Message::Handshake(remote) => {
                    self.handle_remote_restart(remote)?;
                }
                other => return Ok(other),
            }
        }
    }

    fn startup_internal(&mut self, role: Mode, config: &HandshakeConfig, fail_on_mismatch: bool) -> Result<()> {
        let local_version = copy_truncated(config.local_version(), MAX_VERSION_LEN);
        let outgoing = Handshake { mode: role, version: local_version.clone(), needs_ack: true };
        self.send_message(&Message::Handshake(outgoing)).map_err(|_| Error::StartupFailed)?;

        let received = self.receive_raw().map_err(|_| Error::StartupFailed)?;
        let remote = match received {
            Message::Handshake(h) => h,
            _ => return Err(Error::StartupFailed),
        };
        if remote.mode != role.complement() {
            return Err(Error::StartupFailed);
        }

        if remote.needs_ack {
            let ack = Handshake { mode: role, version: local_version.clone(), needs_ack: false };
            self.send_message(&Message::Handshake(ack)).map_err(|_| Error::StartupFailed)?;
        }

        if fail_on_mismatch && remote.version.as_str() != local_version.as_str() {
            return Err(Error::VersionMismatch);
        }

        self.remote_version = remote.version.clone();
        self.mode = match role {
            Mode::Client => OperatingMode::Client,
            Mode::Server => OperatingMode::Server,
        };
        self.local_version = local_version;
        self.on_connect.on_connect(remote.mode, &self.remote_version);
        self.log(Severity::Info, "handshake complete");
        Ok(())
    }

    /// Runs the three-step handshake, claiming `role`. Fails with
    /// `VersionMismatch` if `config.fail_on_version_mismatch` is set (the
    /// default) and the remote's version string differs from ours.
    pub fn startup(&mut self, role: Mode, config: &HandshakeConfig) -> Result<()> {
        self.startup_internal(role, config, config.fail_on_version_mismatch)
    }

    /// Like [`Session::startup`], but never fails on a version mismatch
    /// regardless of `config`.
    pub fn startup_ignore_mismatch(&mut self, role: Mode, config: &HandshakeConfig) -> Result<()> {
        self.startup_internal(role, config, false)
    }

    /// Sends `text` as a loopback probe and waits for the peer to echo it
    /// back byte-for-byte, bypassing the ordinary handshake/loopback
    /// interception in [`Session::receive`].
    pub fn loopback_test(&mut self, text: &str) -> Result<()> {
        if text.is_empty() || text.len() > MAX_LOOPBACK_DATA_LEN {
            return Err(Error::InvalidParameter);
        }
        let data = copy_truncated(text, MAX_LOOPBACK_DATA_LEN);
        self.send_message(&Message::LoopbackTest(data.clone()))?;
        match self.receive_raw()? {
            Message::LoopbackTest(echoed) if echoed == data => Ok(()),
            Message::LoopbackTest(_) => Err(Error::ReceiveFailed),
            _ => Err(Error::UnknownMessageType),
        }
    }

    pub fn send_current_temperature(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::CurrentTemperature(value))
    }

    pub fn send_heating_setpoint(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::HeatingSetpoint(value))
    }

    pub fn send_away_heating_setpoint(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::AwayHeatingSetpoint(value))
    }

    pub fn send_cooling_setpoint(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::CoolingSetpoint(value))
    }

    pub fn send_away_cooling_setpoint(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::AwayCoolingSetpoint(value))
    }

    pub fn send_hvac_mode(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::HvacMode(value))
    }

    pub fn send_local_ui_state(&mut self, value: i8) -> Result<()> {
        self.send_message(&Message::LocalUiState(value))
    }

    pub fn send_relative_humidity(&mut self, value: bool) -> Result<()> {
        self.send_message(&Message::RelativeHumidity(value))
    }

    pub fn send_accessory_state(&mut self, value: bool) -> Result<()> {
        self.send_message(&Message::AccessoryState(value))
    }

    pub fn send_demand_response(&mut self, value: bool) -> Result<()> {
        self.send_message(&Message::DemandResponse(value))
    }

    pub fn send_away_mode(&mut self, value: bool) -> Result<()> {
        self.send_message(&Message::AwayMode(value))
    }

    pub fn send_auto_wake(&mut self, value: bool) -> Result<()> {
        self.send_message(&Message::AutoWake(value))
    }

    pub fn send_date_and_time(&mut self, unix_seconds: u64) -> Result<()> {
        self.send_message(&Message::DateAndTime(unix_seconds))
    }

    pub fn send_support_package_data(&mut self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidParameter);
        }
        let data = copy_truncated(data, MAX_SUPPORT_PACKAGE_LEN);
        self.send_message(&Message::SupportPackageData(data))
    }

    pub fn send_pairing_state(&mut self, value: message::PairingState) -> Result<()> {
        self.send_message(&Message::PairingState(value))
    }

    pub fn send_wifi_status(&mut self, value: message::SystemStatus) -> Result<()> {
        self.send_message(&Message::WifiStatus(value))
    }

    pub fn send_matter_status(&mut self, value: message::SystemStatus) -> Result<()> {
        self.send_message(&Message::MatterStatus(value))
    }

    pub fn send_factory_reset(&mut self, value: message::ResetState) -> Result<()> {
        self.send_message(&Message::FactoryReset(value))
    }

    /// `progress` is clamped to 100 before sending. `version` of `None`
    /// is treated as an empty string, matching the original's
    /// `version == NULL` handling.
    pub fn send_ota_status(&mut self, state: OtaState, progress: u8, version: Option<&str>) -> Result<()> {
        let version = copy_truncated(version.unwrap_or(""), MAX_OTA_VERSION_LEN);
        let ota = OtaStatus { state, progress: progress.min(100), version };
        self.send_message(&Message::OtaStatus(ota))
    }

    /// `message` of `None` fails with `InvalidParameter` (the Rust
    /// analogue of the original's `message == NULL` rejection); `Some("")`
    /// is permitted.
    pub fn send_warning(&mut self, kind: WarningType, message: Option<&str>) -> Result<()> {
        let message = message.ok_or(Error::InvalidParameter)?;
        let message = copy_truncated(message, MAX_WARNING_MESSAGE_LEN);
        self.send_message(&Message::Warning(Warning { kind, message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

    /// Blocking in-memory duplex pipe: a real producer/consumer channel
    /// rather than a pre-filled buffer, so two sessions can be driven
    /// from separate threads the way a handshake over a real UART would.
    struct ChannelReader(Receiver<u8>);
    struct ChannelWriter(SyncSender<u8>);

    impl FrameReader for ChannelReader {
        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            for slot in buf.iter_mut() {
                *slot = self.0.recv().map_err(|_| Error::ReadTimeout)?;
            }
            Ok(())
        }
    }

    impl FrameWriter for ChannelWriter {
        fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            for &byte in buf {
                self.0.send(byte).map_err(|_| Error::WriteFailed)?;
            }
            Ok(())
        }
    }

    type TestSession = Session<ChannelReader, ChannelWriter, (), ()>;

    fn crossed_pair() -> (TestSession, TestSession) {
        let (a_tx, a_rx) = sync_channel::<u8>(4096);
        let (b_tx, b_rx) = sync_channel::<u8>(4096);
        let client = Session::new(ChannelReader(b_rx), ChannelWriter(a_tx), (), ());
        let server = Session::new(ChannelReader(a_rx), ChannelWriter(b_tx), (), ());
        (client, server)
    }

    #[test]
    fn handshake_symmetry() {
        let (mut client, mut server) = crossed_pair();
        let cfg = HandshakeConfig::new().with_local_version("1.0.0");
        let server_cfg = cfg.clone();
        let server_thread = std::thread::spawn(move || server.startup(Mode::Server, &server_cfg).map(|_| server));
        let client_result = client.startup(Mode::Client, &cfg);
        let server = server_thread.join().unwrap();

        assert!(client_result.is_ok());
        let server = server.unwrap();
        assert_eq!(client.remote_version().unwrap(), "1.0.0");
        assert_eq!(server.remote_version().unwrap(), "1.0.0");
        assert_eq!(client.operating_mode(), OperatingMode::Client);
        assert_eq!(server.operating_mode(), OperatingMode::Server);
    }

    #[test]
    fn version_mismatch_fails_strict_startup_but_not_lenient() {
        let (mut client, mut server) = crossed_pair();
        let client_cfg = HandshakeConfig::new().with_local_version("1.0.0");
        let server_cfg = HandshakeConfig::new().with_local_version("1.0.1");
        let server_thread = std::thread::spawn(move || server.startup(Mode::Server, &server_cfg));
        let client_result = client.startup(Mode::Client, &client_cfg);
        let server_result = server_thread.join().unwrap();

        assert!(matches!(client_result, Err(Error::VersionMismatch)));
        assert!(matches!(server_result, Err(Error::VersionMismatch)));
        // A failed strict handshake must be side-effect free: the caller
        // should not be able to read a half-committed remote version.
        assert!(matches!(client.remote_version(), Err(Error::NotInitialized)));
        assert_eq!(client.operating_mode(), OperatingMode::Uninitialized);
    }

    #[test]
    fn lenient_startup_ignores_version_mismatch() {
        let (mut client, mut server) = crossed_pair();
        let client_cfg = HandshakeConfig::new().with_local_version("1.0.0");
        let server_cfg = HandshakeConfig::new().with_local_version("2.0.0");
        let server_thread =
            std::thread::spawn(move || server.startup_ignore_mismatch(Mode::Server, &server_cfg).map(|_| server));
        let client_result = client.startup_ignore_mismatch(Mode::Client, &client_cfg);
        let server = server_thread.join().unwrap().unwrap();

        assert!(client_result.is_ok());
        assert_eq!(client.remote_version().unwrap(), "2.0.0");
        assert_eq!(server.remote_version().unwrap(), "1.0.0");
    }

    #[test]
    fn loopback_echo_round_trips() {
        let (mut probe, mut echo) = crossed_pair();
        let echo_thread = std::thread::spawn(move || {
            // Mimics what `receive`'s interception does for a single
            // loopbackTest frame, without its "loop forever waiting for a
            // user message" tail — this peer never sends one.
            match echo.receive_raw_for_test().unwrap() {
                Message::LoopbackTest(data) => {
                    echo.send_message_for_test(&Message::LoopbackTest(data)).unwrap();
                }
                other => panic!("expected a loopback test, got {other:?}"),
            }
        });
        let result = probe.loopback_test("hello");
        echo_thread.join().unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn loopback_rejects_empty_and_oversize() {
        let (mut probe, _echo) = crossed_pair();
        assert!(matches!(probe.loopback_test(""), Err(Error::InvalidParameter)));
        let oversize = "x".repeat(MAX_LOOPBACK_DATA_LEN + 1);
        assert!(matches!(probe.loopback_test(&oversize), Err(Error::InvalidParameter)));
    }

    #[test]
    fn remote_restart_is_intercepted_and_reacknowledged() {
        let (mut a, mut b) = crossed_pair();
        let cfg = HandshakeConfig::new().with_local_version("1.0.0");
        let b_cfg = cfg.clone();
        let b_thread = std::thread::spawn(move || {
            b.startup(Mode::Server, &b_cfg).unwrap();
            b
        });
        a.startup(Mode::Client, &cfg).unwrap();
        let mut b = b_thread.join().unwrap();

        // `b` restarts: it re-sends its handshake mid-session instead of
        // running startup again, then sends an ordinary message.
        let cfg2 = cfg.clone();
        let restart_thread = std::thread::spawn(move || {
            let restart = Handshake {
                mode: Mode::Server,
                version: copy_truncated(cfg2.local_version(), MAX_VERSION_LEN),
                needs_ack: true,
            };
            b.send_message_for_test(&Message::Handshake(restart)).unwrap();
            b.send_message_for_test(&Message::AutoWake(true)).unwrap();
            b
        });

        // `a`'s ordinary receive loop must swallow the handshake, reply,
        // and only surface the message that follows it.
        let received = a.receive().unwrap();
        assert_eq!(received, Message::AutoWake(true));
        restart_thread.join().unwrap();
    }
}
