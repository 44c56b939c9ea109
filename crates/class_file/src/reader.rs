use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::{error::Stage, ClassFileError, Result};

type Endian = BigEndian;

/// Forward-only big-endian cursor over a borrowed buffer.
///
/// Every read checks the remaining length first, so a short buffer surfaces as
/// [`ClassFileError::UnexpectedEof`] carrying the offset of the failed read.
pub struct Reader<'a> {
    r: Cursor<&'a [u8]>,
    stage: Stage,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_stage(buf, Stage::Header)
    }

    pub(crate) fn with_stage(buf: &'a [u8], stage: Stage) -> Self {
        Self {
            r: Cursor::new(buf),
            stage,
        }
    }

    pub fn position(&self) -> usize {
        self.r.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.r.get_ref().len().saturating_sub(self.position())
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.r.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.r.read_u16::<Endian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.r.read_u32::<Endian>()?)
    }

    /// Reads `count` consecutive u16 values.
    pub fn read_u16_vec(&mut self, count: usize) -> Result<Vec<u16>> {
        self.ensure(count * 2)?;
        let mut values = vec![0u16; count];
        self.r.read_u16_into::<Endian>(&mut values)?;
        Ok(values)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut bytes = [0u8; N];
        self.r.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Consumes `len` bytes and returns them without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let buf: &'a [u8] = *self.r.get_ref();
        let start = self.position();
        self.r.set_position((start + len) as u64);
        Ok(&buf[start..start + len])
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        let remaining = self.remaining();
        if wanted > remaining {
            return Err(ClassFileError::UnexpectedEof {
                stage: self.stage,
                offset: self.position(),
                wanted,
                remaining,
            });
        }

        Ok(())
    }
}
