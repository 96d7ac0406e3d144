//! Process-wide convenience façade over a single boxed [`Session`].
//!
//! This mirrors the original C library's global-singleton shape (and the
//! `lazy_static! STATE: Arc<Mutex<ConnectionState>>` pattern the JNI
//! bridge this crate grew out of used for the same reason): a single slot
//! guarded by a mutex, reproducing the exact `AlreadyInitialized` /
//! `NotInitialized` semantics a caller porting code from the global-state
//! API expects. [`Session`] itself has no such restriction — construct as
//! many as you like. Reach for this module only when porting code that
//! already assumes one global connection.

use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::config::HandshakeConfig;
use crate::error::{Error, Result};
use crate::logger::{Logger, OnConnect, Severity};
use crate::message::{
    Message, Mode, OtaState, PairingState, ResetState, SystemStatus, WarningType,
};
use crate::session::Session;
use crate::transport::{FrameReader, FrameWriter};

/// Boxed read callback: fills `buf` completely or returns an error, same
/// contract as [`crate::transport::FrameReader::read_exact`].
pub type ReadFn = Box<dyn FnMut(&mut [u8]) -> Result<()> + Send>;
/// Boxed write callback, same contract as [`crate::transport::FrameWriter::write_all`].
pub type WriteFn = Box<dyn FnMut(&[u8]) -> Result<()> + Send>;
/// Boxed log callback.
pub type LogFn = Box<dyn FnMut(Severity, &str) + Send>;
/// Boxed on-connect callback.
pub type OnConnectFn = Box<dyn FnMut(Mode, &str) + Send>;

struct BoxedReader(ReadFn);
struct BoxedWriter(WriteFn);
struct BoxedLogger(LogFn);
struct BoxedOnConnect(OnConnectFn);

impl FrameReader for BoxedReader {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (self.0)(buf)
    }
}

impl FrameWriter for BoxedWriter {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (self.0)(buf)
    }
}

impl Logger for BoxedLogger {
    fn log(&mut self, severity: Severity, message: &str) {
        (self.0)(severity, message)
    }
}

impl OnConnect for BoxedOnConnect {
    fn on_connect(&mut self, remote_mode: Mode, remote_version: &str) {
        (self.0)(remote_mode, remote_version)
    }
}

type LegacySession = Session<BoxedReader, BoxedWriter, BoxedLogger, BoxedOnConnect>;

static STATE: Lazy<Mutex<Option<LegacySession>>> = Lazy::new(|| Mutex::new(None));

fn with_session<T>(f: impl FnOnce(&mut LegacySession) -> Result<T>) -> Result<T> {
    let mut guard = STATE.lock().expect("legacy session mutex poisoned");
    let session = guard.as_mut().ok_or(Error::NotInitialized)?;
    f(session)
}

/// Builds the process-wide session. Fails with `AlreadyInitialized` if
/// called while a previous session is still live.
pub fn init(read: ReadFn, write: WriteFn, log: Option<LogFn>, on_connect: Option<OnConnectFn>) -> Result<()> {
    let mut guard = STATE.lock().expect("legacy session mutex poisoned");
    if guard.is_some() {
        return Err(Error::AlreadyInitialized);
    }
    let log = log.unwrap_or_else(|| Box::new(|_, _| {}));
    let on_connect = on_connect.unwrap_or_else(|| Box::new(|_, _| {}));
    *guard = Some(Session::new(BoxedReader(read), BoxedWriter(write), BoxedLogger(log), BoxedOnConnect(on_connect)));
    Ok(())
}

/// Tears down the process-wide session. Fails with `NotInitialized` if
/// none is live.
pub fn deinit() -> Result<()> {
    let mut guard = STATE.lock().expect("legacy session mutex poisoned");
    match guard.take() {
        Some(_) => Ok(()),
        None => Err(Error::NotInitialized),
    }
}

pub fn startup(mode: Mode, config: &HandshakeConfig) -> Result<()> {
    with_session(|s| s.startup(mode, config))
}

pub fn startup_ignore_mismatch(mode: Mode, config: &HandshakeConfig) -> Result<()> {
    with_session(|s| s.startup_ignore_mismatch(mode, config))
}

pub fn receive() -> Result<Message> {
    with_session(Session::receive)
}

pub fn loopback_test(text: &str) -> Result<()> {
    with_session(|s| s.loopback_test(text))
}

pub fn get_remote_version() -> Result<String> {
    with_session(|s| s.remote_version().map(String::from))
}

/// `Display` of `Error`, matching the original's `error_string` design note.
#[must_use]
pub fn error_string(err: Error) -> String {
    err.to_string()
}

pub fn send_current_temperature(value: i8) -> Result<()> {
    with_session(|s| s.send_current_temperature(value))
}

pub fn send_heating_setpoint(value: i8) -> Result<()> {
    with_session(|s| s.send_heating_setpoint(value))
}

pub fn send_away_heating_setpoint(value: i8) -> Result<()> {
    with_session(|s| s.send_away_heating_setpoint(value))
}

pub fn send_cooling_setpoint(value: i8) -> Result<()> {
    with_session(|s| s.send_cooling_setpoint(value))
}

pub fn send_away_cooling_setpoint(value: i8) -> Result<()> {
    with_session(|s| s.send_away_cooling_setpoint(value))
}

pub fn send_hvac_mode(value: i8) -> Result<()> {
    with_session(|s| s.send_hvac_mode(value))
}

pub fn send_local_ui_state(value: i8) -> Result<()> {
    with_session(|s| s.send_local_ui_state(value))
}

pub fn send_relative_humidity(value: bool) -> Result<()> {
    with_session(|s| s.send_relative_humidity(value))
}

pub fn send_accessory_state(value: bool) -> Result<()> {
    with_session(|s| s.send_accessory_state(value))
}

pub fn send_demand_response(value: bool) -> Result<()> {
    with_session(|s| s.send_demand_response(value))
}

pub fn send_away_mode(value: bool) -> Result<()> {
    with_session(|s| s.send_away_mode(value))
}

pub fn send_auto_wake(value: bool) -> Result<()> {
    with_session(|s| s.send_auto_wake(value))
}

pub fn send_date_and_time(unix_seconds: u64) -> Result<()> {
    with_session(|s| s.send_date_and_time(unix_seconds))
}

pub fn send_support_package_data(data: &str) -> Result<()> {
    with_session(|s| s.send_support_package_data(data))
}

pub fn send_pairing_state(value: PairingState) -> Result<()> {
    with_session(|s| s.send_pairing_state(value))
}

pub fn send_wifi_status(value: SystemStatus) -> Result<()> {
    with_session(|s| s.send_wifi_status(value))
}

pub fn send_matter_status(value: SystemStatus) -> Result<()> {
    with_session(|s| s.send_matter_status(value))
}

pub fn send_factory_reset(value: ResetState) -> Result<()> {
    with_session(|s| s.send_factory_reset(value))
}

pub fn send_ota_status(state: OtaState, progress: u8, version: Option<&str>) -> Result<()> {
    with_session(|s| s.send_ota_status(state, progress, version))
}

pub fn send_warning(kind: WarningType, message: Option<&str>) -> Result<()> {
    with_session(|s| s.send_warning(kind, message))
}
