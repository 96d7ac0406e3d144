//! # Link Codec Core
//!
//! A point-to-point, length-framed message codec for a reliable
//! byte-oriented transport (a UART between two microcontrollers, in the
//! common case). One side runs as `CLIENT`, the other as `SERVER`; after
//! a three-step handshake they exchange small, strongly-typed control and
//! telemetry messages.
//!
//! ## Architecture
//!
//! ```text
//! caller ──send_*()──► message codec ──► frame codec ──► transport write
//! caller ◄──receive()── message codec ◄── frame codec ◄── transport read
//!                            │
//!                 handshake / loopback
//!                 handled internally,
//!                 never surfaced
//! ```
//!
//! ## Design principles
//!
//! - No process-wide state in the primary API: [`Session`] is an owned
//!   handle, not a global singleton. The [`legacy`] module is a thin
//!   convenience façade over a single process-wide `Session` for callers
//!   porting code written against the original global-singleton shape.
//! - `no_std` by default; the `std` feature (on by default) pulls in the
//!   `legacy` façade and a `log`-crate logging bridge.
//! - Every public entry point returns `Result<T, Error>`; there is no
//!   panicking path in non-test code.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod crc;
pub mod error;
pub mod frame;
#[cfg(feature = "std")]
pub mod legacy;
pub mod logger;
pub mod message;
pub mod session;
pub mod transport;

pub use config::HandshakeConfig;
pub use error::{Error, Result};
pub use logger::{Logger, OnConnect, Severity};
pub use message::{
    Handshake, Message, Mode, OtaState, OtaStatus, PairingState, ResetState, SystemStatus,
    Warning, WarningType,
};
pub use session::{OperatingMode, Session};
pub use transport::{FrameReader, FrameWriter};

/// Crate version, also the default handshake version string unless
/// overridden via [`HandshakeConfig::with_local_version`].
pub const VERSION: &str = config::LIBRARY_VERSION;
