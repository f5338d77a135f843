//! Bit-level I/O for the archive bitstream
//!
//! Bits are packed MSB-first. The final data byte is zero-padded and followed
//! by one trailer byte holding the number of significant bits in it (1..=8),
//! or 0 when the stream carries no bits at all. The reader uses the trailer to
//! stop exactly at the last written bit, so padding never decodes as data.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use crate::error::{CofferError, CofferResult};

/// Packs bits MSB-first into whole bytes
pub struct BitWriter<W: Write> {
    inner: W,
    buffer: u8,
    bit_count: u8,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: 0,
            bit_count: 0,
            bytes_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buffer = (self.buffer << 1) | u8::from(bit);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.inner.write_all(&[self.buffer])?;
            self.bytes_written += 1;
            self.buffer = 0;
            self.bit_count = 0;
        }
        Ok(())
    }

    pub fn write_code(&mut self, code: &[bool]) -> io::Result<()> {
        for &bit in code {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Flush the zero-padded final byte and the trailer, returning the inner writer
    pub fn finish(mut self) -> io::Result<W> {
        let significant = if self.bit_count > 0 {
            let count = self.bit_count;
            self.inner.write_all(&[self.buffer << (8 - count)])?;
            count
        } else if self.bytes_written > 0 {
            8
        } else {
            0
        };
        self.inner.write_all(&[significant])?;
        Ok(self.inner)
    }
}

/// Reads bits MSB-first, honouring the trailer written by [`BitWriter`]
pub struct BitReader<R: Read> {
    inner: R,
    window: VecDeque<u8>,
    eof: bool,
    current: u8,
    remaining: u8,
    last_loaded: bool,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            window: VecDeque::with_capacity(3),
            eof: false,
            current: 0,
            remaining: 0,
            last_loaded: false,
        }
    }

    /// Read the next bit, or `None` once every significant bit was returned
    pub fn read_bit(&mut self) -> CofferResult<Option<bool>> {
        if self.remaining == 0 {
            if self.last_loaded || !self.load()? {
                return Ok(None);
            }
        }

        let bit = self.current & 0x80 != 0;
        self.current <<= 1;
        self.remaining -= 1;
        Ok(Some(bit))
    }

    /// Load the next data byte. Needs two bytes of lookahead to know whether
    /// the byte after it is the trailer.
    fn load(&mut self) -> CofferResult<bool> {
        while self.window.len() < 3 && !self.eof {
            match read_byte(&mut self.inner)? {
                Some(byte) => self.window.push_back(byte),
                None => self.eof = true,
            }
        }

        match self.window.len() {
            0 => Err(CofferError::MalformedArchive(
                "bitstream is missing its trailer byte".into(),
            )),
            1 => {
                let trailer = self.window[0];
                self.window.clear();
                self.last_loaded = true;
                if trailer == 0 {
                    Ok(false)
                } else {
                    Err(CofferError::MalformedArchive(format!(
                        "trailer claims {} bits but the bitstream is empty",
                        trailer
                    )))
                }
            }
            2 => {
                let data = self.window[0];
                let trailer = self.window[1];
                self.window.clear();
                if !(1..=8).contains(&trailer) {
                    return Err(CofferError::MalformedArchive(format!(
                        "invalid final bit count {}",
                        trailer
                    )));
                }
                self.current = data;
                self.remaining = trailer;
                self.last_loaded = true;
                Ok(true)
            }
            _ => {
                // Three bytes buffered: the front one is a full data byte
                self.current = self.window.pop_front().unwrap_or_default();
                self.remaining = 8;
                Ok(true)
            }
        }
    }
}

/// Read a single byte, `None` at end of input
pub(crate) fn read_byte<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
