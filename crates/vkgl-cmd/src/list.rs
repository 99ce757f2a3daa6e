//! Growable instruction list and its forward parser.
//!
//! Layout: a sequence of records, each an 8-byte header `{opcode: u32, size_bytes: u32}`
//! followed by the payload. `size_bytes` covers the header and is a multiple of 4, so a parser
//! can skip any record without understanding it.

use core::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::packets::Instruction;
use crate::Opcode;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct InstructionHeader {
    pub opcode: u32,
    pub size_bytes: u32,
}

impl InstructionHeader {
    pub const SIZE_BYTES: usize = 8;
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("instruction at byte {offset}: list truncated")]
    BufferTooSmall { offset: usize },
    #[error("instruction at byte {offset}: bad size_bytes {found}")]
    BadSizeBytes { offset: usize, found: u32 },
    #[error("instruction at byte {offset}: size_bytes {found} not 4-byte aligned")]
    SizeNotAligned { offset: usize, found: u32 },
    #[error("instruction at byte {offset}: unknown opcode {opcode}")]
    UnknownOpcode { offset: usize, opcode: u32 },
    #[error("{opcode:?}: payload is {found} bytes, expected at least {expected}")]
    PayloadSizeMismatch {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },
    #[error("{opcode:?}: decoded as wrong payload type")]
    UnexpectedOpcode { opcode: Opcode },
    #[error("{opcode:?}: count {count} exceeds capacity {capacity}")]
    CountExceedsCapacity {
        opcode: Opcode,
        count: u32,
        capacity: usize,
    },
}

fn align4(v: usize) -> usize {
    (v + 3) & !3
}

/// Append-only instruction buffer owned by a command buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandList {
    bytes: Vec<u8>,
    count: usize,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of externally produced bytes after validating every record header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let mut count = 0;
        for packet in Iter::new(&bytes) {
            packet?;
            count += 1;
        }
        Ok(Self { bytes, count })
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.count = 0;
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn push<I: Instruction>(&mut self, payload: &I) {
        self.push_with_tail(payload, &[]);
    }

    /// Appends a payload followed by variable trailing bytes; the record is zero-padded to 4.
    pub fn push_with_tail<I: Instruction>(&mut self, payload: &I, tail: &[u8]) {
        let body = size_of::<I>() + tail.len();
        let size = align4(InstructionHeader::SIZE_BYTES + body);
        let header = InstructionHeader {
            opcode: I::OPCODE as u32,
            size_bytes: size as u32,
        };
        let start = self.bytes.len();
        self.bytes.extend_from_slice(bytemuck::bytes_of(&header));
        self.bytes.extend_from_slice(bytemuck::bytes_of(payload));
        self.bytes.extend_from_slice(tail);
        self.bytes.resize(start + size, 0);
        self.count += 1;
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.bytes)
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = Result<Packet<'a>, DecodeError>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One decoded record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Packet<'a> {
    pub opcode: Opcode,
    /// Byte offset of the header within the list.
    pub offset: usize,
    /// Payload bytes including tail and padding.
    pub body: &'a [u8],
}

impl<'a> Packet<'a> {
    pub fn decode<I: Instruction>(&self) -> Result<I, DecodeError> {
        if I::OPCODE != self.opcode {
            return Err(DecodeError::UnexpectedOpcode {
                opcode: self.opcode,
            });
        }
        let expected = size_of::<I>();
        let bytes = self
            .body
            .get(..expected)
            .ok_or(DecodeError::PayloadSizeMismatch {
                opcode: self.opcode,
                expected,
                found: self.body.len(),
            })?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// `len` trailing bytes after the fixed payload of `I`.
    pub fn tail<I: Instruction>(&self, len: usize) -> Result<&'a [u8], DecodeError> {
        let start = size_of::<I>();
        self.body
            .get(start..start + len)
            .ok_or(DecodeError::PayloadSizeMismatch {
                opcode: self.opcode,
                expected: start + len,
                found: self.body.len(),
            })
    }
}

/// Returns the live prefix of an inline array, rejecting counts beyond its capacity.
pub fn inline_items<T, const N: usize>(
    opcode: Opcode,
    count: u32,
    items: &[T; N],
) -> Result<&[T], DecodeError> {
    items
        .get(..count as usize)
        .ok_or(DecodeError::CountExceedsCapacity {
            opcode,
            count,
            capacity: N,
        })
}

/// Forward parser over list bytes. Stops after the first error.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Iter<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            failed: false,
        }
    }

    fn next_packet(&mut self) -> Result<Packet<'a>, DecodeError> {
        let offset = self.offset;
        let rest = &self.bytes[offset..];
        let header_bytes = rest
            .get(..InstructionHeader::SIZE_BYTES)
            .ok_or(DecodeError::BufferTooSmall { offset })?;
        let header: InstructionHeader = bytemuck::pod_read_unaligned(header_bytes);
        let size_bytes = header.size_bytes;
        if (size_bytes as usize) < InstructionHeader::SIZE_BYTES {
            return Err(DecodeError::BadSizeBytes {
                offset,
                found: size_bytes,
            });
        }
        if size_bytes % 4 != 0 {
            return Err(DecodeError::SizeNotAligned {
                offset,
                found: size_bytes,
            });
        }
        let record = rest
            .get(..size_bytes as usize)
            .ok_or(DecodeError::BufferTooSmall { offset })?;
        let raw_opcode = header.opcode;
        let opcode = Opcode::from_u32(raw_opcode).ok_or(DecodeError::UnknownOpcode {
            offset,
            opcode: raw_opcode,
        })?;
        self.offset += size_bytes as usize;
        Ok(Packet {
            opcode,
            offset,
            body: &record[InstructionHeader::SIZE_BYTES..],
        })
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Packet<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let res = self.next_packet();
        self.failed = res.is_err();
        Some(res)
    }
}
