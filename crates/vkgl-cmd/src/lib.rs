//! Instruction stream shared by the command encoder and the executor.
//!
//! A [`CommandList`] is a flat byte buffer of self-sized records. The encoder appends typed
//! payloads from [`packets`]; the executor walks the list with [`Iter`] and decodes each
//! [`Packet`] back into its payload by opcode.

mod list;
mod opcode;
pub mod packets;

pub use list::{inline_items, CommandList, DecodeError, InstructionHeader, Iter, Packet};
pub use opcode::Opcode;
pub use packets::Instruction;
