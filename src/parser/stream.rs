use crate::error::{DFError, Result};

/// Cursor over a DataFlash binary buffer
pub struct DFDataStream<'a> {
    data: &'a [u8],
    pub pos: usize,
    end: usize,
}

impl<'a> DFDataStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        if self.pos < self.end {
            let byte = self.data[self.pos];
            self.pos += 1;
            Ok(byte)
        } else {
            Err(DFError::UnexpectedEof)
        }
    }

    /// Read exactly `len` bytes. On a short read the cursor moves to the end.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() >= len {
            let bytes = &self.data[self.pos..self.pos + len];
            self.pos += len;
            Ok(bytes)
        } else {
            self.pos = self.end;
            Err(DFError::UnexpectedEof)
        }
    }

    /// Advance up to `len` bytes, stopping at the end of the buffer.
    pub fn skip(&mut self, len: usize) -> usize {
        let skipped = len.min(self.remaining());
        self.pos += skipped;
        skipped
    }
}
