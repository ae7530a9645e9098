//! Length-prefixed, version-tagged message framing over a byte stream (spec §4.B).

use crate::error::{VoltError, VoltResult};
use crate::value::{MAX_FRAME_PAYLOAD, PROTOCOL_VERSION};
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, BufReader, BufWriter, Read, Write};

const FRAME_HEADER_SIZE: usize = 5;
const READ_BUF_SIZE: usize = 64 * 1024;
const WRITE_BUF_SIZE: usize = 16 * 1024;
const MAX_WOULD_BLOCK_RETRIES: u32 = 2;

/// Lets the frame reader re-assert blocking mode on the underlying transport
/// after an unexpected `WouldBlock` (spec §4.B, §9: "a workaround for an old
/// platform quirk"). A no-op default keeps in-memory test transports simple.
pub trait BlockingReset {
    fn reset_to_blocking(&self) -> io::Result<()> {
        Ok(())
    }
}

impl BlockingReset for std::net::TcpStream {
    fn reset_to_blocking(&self) -> io::Result<()> {
        self.set_nonblocking(false)
    }
}

/// Reads whole frames off a duplex byte stream.
pub struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: Read + BlockingReset> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: BufReader::with_capacity(READ_BUF_SIZE, inner) }
    }

    fn fill_exact(&mut self, buf: &mut [u8]) -> VoltResult<()> {
        let mut filled = 0;
        let mut would_block_retries = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(VoltError::UnexpectedEof),
                Ok(n) => {
                    filled += n;
                    would_block_retries = 0;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(VoltError::SocketTimeout),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    would_block_retries += 1;
                    if would_block_retries > MAX_WOULD_BLOCK_RETRIES {
                        return Err(VoltError::Io(e));
                    }
                    let _ = self.inner.get_ref().reset_to_blocking();
                    continue;
                }
                Err(e) => return Err(VoltError::Io(e)),
            }
        }
        Ok(())
    }

    /// Blocks until a full frame is available, validates the header, and
    /// returns the payload (exactly `len` bytes, freshly allocated).
    pub fn read_frame(&mut self) -> VoltResult<Vec<u8>> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        self.fill_exact(&mut header)?;
        let len_plus_version = BigEndian::read_u32(&header[0..4]);
        let version = header[4];
        if version != PROTOCOL_VERSION {
            return Err(VoltError::VersionMismatch { got: version, expected: PROTOCOL_VERSION });
        }
        if len_plus_version == 0 {
            return Err(VoltError::UnexpectedEof);
        }
        let payload_len = len_plus_version - 1;
        if payload_len as usize > MAX_FRAME_PAYLOAD {
            return Err(VoltError::LengthInvalid { len: payload_len, max: MAX_FRAME_PAYLOAD as u32 });
        }
        let mut payload = vec![0u8; payload_len as usize];
        self.fill_exact(&mut payload)?;
        Ok(payload)
    }
}

/// Writes whole frames to a duplex byte stream, one at a time.
///
/// Mutual exclusion across concurrent writers is the caller's
/// responsibility (the node connection guards this with a write mutex);
/// `FrameWriter` itself only guarantees a single `write_frame` call emits a
/// contiguous header+payload.
pub struct FrameWriter<W> {
    inner: BufWriter<W>,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: BufWriter::with_capacity(WRITE_BUF_SIZE, inner) }
    }

    pub fn write_frame(&mut self, payload: &[u8]) -> VoltResult<()> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(VoltError::LengthInvalid { len: payload.len() as u32, max: MAX_FRAME_PAYLOAD as u32 });
        }
        let len_plus_version = payload.len() as u32 + 1;
        let mut header = [0u8; FRAME_HEADER_SIZE];
        BigEndian::write_u32(&mut header[0..4], len_plus_version);
        header[4] = PROTOCOL_VERSION;
        self.inner.write_all(&header)?;
        self.inner.write_all(payload)?;
        self.inner.flush()?;
        Ok(())
    }
}
