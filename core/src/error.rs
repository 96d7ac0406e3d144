//! Error type for the link codec.
//!
//! A single `thiserror`-derived enum stands in for the C library's flat
//! `secil_error_t` integer codes; `Display` on [`Error`] is the
//! `error_string` function from the original design.

use thiserror::Error;

/// Every fallible operation in this crate returns this error type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Construction of the process-wide legacy singleton failed.
    #[error("initialization failed")]
    InitFailed,
    /// The session is not in a state that allows the requested operation.
    #[error("invalid state")]
    InvalidState,
    /// The legacy singleton was already initialized.
    #[error("already initialized")]
    AlreadyInitialized,
    /// The legacy singleton has not been initialized yet.
    #[error("not initialized")]
    NotInitialized,
    /// A caller-supplied argument was null, empty, or out of range.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The transport's `read_exact` call returned a terminal failure.
    #[error("read failed")]
    ReadFailed,
    /// The transport's `read_exact` call did not deliver the requested bytes in time.
    #[error("read timed out")]
    ReadTimeout,
    /// The transport's `write_all` call returned a terminal failure.
    #[error("write failed")]
    WriteFailed,
    /// The message codec could not encode the outgoing message.
    #[error("encode failed")]
    EncodeFailed,
    /// The frame or message codec could not decode the incoming bytes.
    #[error("decode failed")]
    DecodeFailed,
    /// The frame header claimed a body length larger than the codec's maximum.
    #[error("message too large")]
    MessageTooLarge,
    /// A received message carried a tag this codec does not recognize.
    #[error("unknown message type")]
    UnknownMessageType,
    /// Sending a message failed.
    #[error("send failed")]
    SendFailed,
    /// Receiving a message failed.
    #[error("receive failed")]
    ReceiveFailed,
    /// The handshake did not complete (role conflict, wrong message, or I/O failure).
    #[error("startup failed")]
    StartupFailed,
    /// The remote end's version string did not match ours under a strict startup.
    #[error("version mismatch")]
    VersionMismatch,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
