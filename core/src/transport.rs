//! Transport boundary: blocking byte read/write supplied by the host.
//!
//! The codec never touches a byte outside these two calls. Realized as
//! blanket impls over `embedded_io`'s blocking `Read`/`Write` traits — the
//! teacher's own dependency, used here in its blocking flavor since this
//! protocol has no async non-goal to fight (see `DESIGN.md`).

use crate::error::{Error, Result};

/// Delivers exactly `buf.len()` bytes or fails. A short read, I/O error,
/// or host-side timeout are all reported the same way: `ReadTimeout`.
pub trait FrameReader {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Writes exactly `buf.len()` bytes or fails with `WriteFailed`.
pub trait FrameWriter {
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;
}

impl<T: embedded_io::Read> FrameReader for T {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        embedded_io::Read::read_exact(self, buf).map_err(|_| Error::ReadTimeout)
    }
}

impl<T: embedded_io::Write> FrameWriter for T {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        embedded_io::Write::write_all(self, buf).map_err(|_| Error::WriteFailed)
    }
}
