//! Serial transport helpers.
//!
//! The controller only needs two things from the link: a way to ask whether a
//! byte is waiting, and a way to write advisory status lines back. Both are
//! expressed with `embedded-io` traits so any HAL UART fits.

use core::convert::Infallible;

use embassy_sync::{blocking_mutex::raw::RawMutex, pipe::Pipe};
use embedded_io::{ErrorType, Read, ReadReady, Write};

use super::protocol::LINE_ENDING;

/// Take at most one byte from `rx` without blocking.
///
/// Returns `Ok(None)` when nothing is pending (or the source reports EOF).
pub fn poll<R>(rx: &mut R) -> Result<Option<u8>, R::Error>
where
    R: Read + ReadReady,
{
    if !rx.read_ready()? {
        return Ok(None);
    }
    let mut byte = [0u8; 1];
    match rx.read(&mut byte)? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

/// Write `line` followed by `\r\n` and flush.
pub fn write_line<W: Write>(
    tx: &mut W,
    line: &str,
) -> Result<(), W::Error> {
    tx.write_all(line.as_bytes())?;
    tx.write_all(LINE_ENDING)?;
    tx.flush()
}

/// Receive side of a byte `Pipe`, for UARTs whose RX interrupt fills a buffer.
///
/// Bytes come out in the order they were written, one `read` at a time.
pub struct PipeRx<'p, M: RawMutex, const N: usize> {
    pipe: &'p Pipe<M, N>,
}

impl<'p, M: RawMutex, const N: usize> PipeRx<'p, M, N> {
    pub fn new(pipe: &'p Pipe<M, N>) -> Self {
        PipeRx { pipe }
    }
}

impl<M: RawMutex, const N: usize> ErrorType for PipeRx<'_, M, N> {
    type Error = Infallible;
}

impl<M: RawMutex, const N: usize> ReadReady for PipeRx<'_, M, N> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pipe.is_empty())
    }
}

impl<M: RawMutex, const N: usize> Read for PipeRx<'_, M, N> {
    /// Spins until at least one byte is available; check `read_ready` first.
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if let Ok(n) = self.pipe.try_read(buf) {
                return Ok(n);
            }
            core::hint::spin_loop();
        }
    }
}
