//! Read- and write-side buffers for the length-prefixed message framing.
//!
//! All integers on the wire are big-endian, all strings are UTF-8 with a
//! `u32` length, all byte blocks carry a `u32` length.

use crate::{EdbError, EdbResult};
use uuid::Uuid;

// The 4-byte length that marks an absent optional value.
pub(crate) const SENTINEL_ABSENT: u32 = 0xffff_ffff;

fn short_read() -> EdbError {
    EdbError::Protocol("unexpected end of message".to_string())
}

/// Cursor over an immutable byte slice.
///
/// All pops fail with a protocol error when the slice is exhausted
/// prematurely; such short reads are fatal for the connection.
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    // Every message body must be consumed exactly; trailing bytes indicate
    // that the parser and the server disagree about the message layout.
    pub fn expect_end(&self) -> EdbResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EdbError::Protocol(format!(
                "{} unexpected trailing bytes",
                self.remaining()
            )))
        }
    }

    pub fn peek_u8(&self) -> EdbResult<u8> {
        self.buf.get(self.pos).copied().ok_or_else(short_read)
    }

    pub fn advance(&mut self, n: usize) -> EdbResult<()> {
        self.take(n).map(|_| ())
    }

    fn take(&mut self, n: usize) -> EdbResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(short_read());
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn pop_u8(&mut self) -> EdbResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn pop_u16(&mut self) -> EdbResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn pop_u32(&mut self) -> EdbResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn pop_u64(&mut self) -> EdbResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn pop_i8(&mut self) -> EdbResult<i8> {
        Ok(self.pop_u8()? as i8)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn pop_i16(&mut self) -> EdbResult<i16> {
        Ok(self.pop_u16()? as i16)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn pop_i32(&mut self) -> EdbResult<i32> {
        Ok(self.pop_u32()? as i32)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn pop_i64(&mut self) -> EdbResult<i64> {
        Ok(self.pop_u64()? as i64)
    }

    pub fn pop_f32(&mut self) -> EdbResult<f32> {
        Ok(f32::from_bits(self.pop_u32()?))
    }

    pub fn pop_f64(&mut self) -> EdbResult<f64> {
        Ok(f64::from_bits(self.pop_u64()?))
    }

    /// Pops a `u32` length followed by that many bytes.
    pub fn pop_bytes(&mut self) -> EdbResult<&'a [u8]> {
        let len = self.pop_u32()? as usize;
        self.take(len)
    }

    /// Pops a length-prefixed UTF-8 string.
    pub fn pop_str(&mut self) -> EdbResult<&'a str> {
        let bytes = self.pop_bytes()?;
        std::str::from_utf8(bytes)
            .map_err(|e| EdbError::Protocol(format!("invalid UTF-8 string on the wire: {e}")))
    }

    /// Pops all remaining bytes.
    pub fn pop_rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    /// Pops a 16-byte descriptor ID.
    pub fn pop_uuid(&mut self) -> EdbResult<Uuid> {
        let bytes = self.take(16)?;
        Uuid::from_slice(bytes).map_err(|_| EdbError::Impl("descriptor ID with wrong length"))
    }

    /// Slices one whole framed message off the stream.
    ///
    /// Reads the tag and the 4-byte length (which covers itself), yields a
    /// sub-reader over exactly `length - 4` body bytes and advances this
    /// reader past the whole frame.
    pub fn pop_message(&mut self) -> EdbResult<(u8, Reader<'a>)> {
        let tag = self.pop_u8()?;
        let len = self.pop_u32()? as usize;
        if len < 4 {
            return Err(EdbError::Protocol(format!(
                "message length {len} is shorter than the length field itself"
            )));
        }
        let body = self.take(len - 4)?;
        Ok((tag, Reader::new(body)))
    }

    /// Pops one length-prefixed value block, yielding a sub-reader over the
    /// payload, or `None` for the absent-optional sentinel.
    pub fn pop_value_block(&mut self) -> EdbResult<Option<Reader<'a>>> {
        let len = self.pop_u32()?;
        if len == SENTINEL_ABSENT {
            return Ok(None);
        }
        let body = self.take(len as usize)?;
        Ok(Some(Reader::new(body)))
    }
}

/// Append-only byte builder with deferred length back-patching.
///
/// `begin_message`/`end_message` frame a whole protocol message (the length
/// field covers itself); `begin_block`/`end_block` frame a codec value
/// envelope (the length field excludes itself). Frames nest through a stack
/// of pending positions.
#[derive(Debug, Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
    pending: Vec<PendingLength>,
}

#[derive(Debug)]
struct PendingLength {
    pos: usize,
    includes_self: bool,
}

impl Writer {
    pub fn new() -> Writer {
        Writer::default()
    }

    pub fn begin_message(&mut self, tag: u8) {
        self.buf.push(tag);
        self.reserve_length(true);
    }

    pub fn end_message(&mut self) {
        self.patch_length();
    }

    pub fn begin_block(&mut self) {
        self.reserve_length(false);
    }

    pub fn end_block(&mut self) {
        self.patch_length();
    }

    fn reserve_length(&mut self, includes_self: bool) {
        self.pending.push(PendingLength {
            pos: self.buf.len(),
            includes_self,
        });
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn patch_length(&mut self) {
        let pending = self
            .pending
            .pop()
            .expect("end_message/end_block without matching begin");
        let body = self.buf.len() - pending.pos - 4;
        let len = (if pending.includes_self { body + 4 } else { body }) as u32;
        self.buf[pending.pos..pending.pos + 4].copy_from_slice(&len.to_be_bytes());
    }

    pub fn push_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn push_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_f32(&mut self, v: f32) {
        self.push_u32(v.to_bits());
    }

    pub fn push_f64(&mut self, v: f64) {
        self.push_u64(v.to_bits());
    }

    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pushes a `u32` length followed by the bytes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.push_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes());
    }

    pub fn push_uuid(&mut self, id: Uuid) {
        self.buf.extend_from_slice(id.as_bytes());
    }

    /// Pushes the 4-byte sentinel for an absent optional value.
    pub fn push_sentinel_absent(&mut self) {
        self.push_u32(SENTINEL_ABSENT);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        debug_assert!(
            self.pending.is_empty(),
            "writer finished with unclosed frames"
        );
        self.buf
    }

    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
