//! Memory heaps and types exposed to the caller, and memory-type deduction.

use bitflags::bitflags;

use crate::error::OutOfMemoryError;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MemoryPropertyFlags: u32 {
        const DEVICE_LOCAL = 0x1;
        const HOST_VISIBLE = 0x2;
        const HOST_COHERENT = 0x4;
        const HOST_CACHED = 0x8;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryType {
    pub property_flags: MemoryPropertyFlags,
    pub heap_index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryHeap {
    /// Budget in bytes; allocations beyond it fail with out-of-memory.
    pub size: u64,
    pub device_local: bool,
}

/// Maximum number of memory types; type bits are a `u32` mask.
pub const MAX_MEMORY_TYPES: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryProperties {
    pub types: Vec<MemoryType>,
    pub heaps: Vec<MemoryHeap>,
}

impl Default for MemoryProperties {
    fn default() -> Self {
        use MemoryPropertyFlags as F;
        Self {
            types: vec![
                MemoryType {
                    property_flags: F::DEVICE_LOCAL,
                    heap_index: 0,
                },
                MemoryType {
                    property_flags: F::HOST_VISIBLE | F::HOST_COHERENT,
                    heap_index: 1,
                },
                MemoryType {
                    property_flags: F::HOST_VISIBLE | F::HOST_COHERENT | F::HOST_CACHED,
                    heap_index: 1,
                },
                MemoryType {
                    property_flags: F::DEVICE_LOCAL | F::HOST_VISIBLE | F::HOST_COHERENT,
                    heap_index: 0,
                },
            ],
            heaps: vec![
                MemoryHeap {
                    size: 256 << 20,
                    device_local: true,
                },
                MemoryHeap {
                    size: 256 << 20,
                    device_local: false,
                },
            ],
        }
    }
}

impl MemoryProperties {
    /// Mask with one bit per exposed memory type.
    pub fn all_type_bits(&self) -> u32 {
        match self.types.len() {
            n if n >= MAX_MEMORY_TYPES => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }

    /// Bits of the types lacking `HOST_VISIBLE`.
    pub fn device_only_type_bits(&self) -> u32 {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, ty)| !ty.property_flags.contains(MemoryPropertyFlags::HOST_VISIBLE))
            .fold(0, |bits, (i, _)| bits | (1 << i))
    }

    /// Lowest memory type index allowed by `type_bits` whose flags contain `required`.
    pub fn find_memory_type(
        &self,
        type_bits: u32,
        required: MemoryPropertyFlags,
    ) -> Result<u32, OutOfMemoryError> {
        self.types
            .iter()
            .enumerate()
            .take(MAX_MEMORY_TYPES)
            .find(|(i, ty)| type_bits & (1 << i) != 0 && ty.property_flags.contains(required))
            .map(|(i, _)| i as u32)
            .ok_or(OutOfMemoryError::NoCompatibleMemoryType {
                type_bits,
                required,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(flags: &[u32]) -> MemoryProperties {
        MemoryProperties {
            types: flags
                .iter()
                .map(|&bits| MemoryType {
                    property_flags: MemoryPropertyFlags::from_bits_truncate(bits),
                    heap_index: 0,
                })
                .collect(),
            heaps: vec![MemoryHeap {
                size: 1 << 20,
                device_local: true,
            }],
        }
    }

    /// Reference deduction: every candidate index, checked independently.
    fn reference(flags: &[u32], type_bits: u32, required: u32) -> Option<u32> {
        (0..flags.len() as u32)
            .filter(|&i| type_bits & (1 << i) != 0)
            .filter(|&i| flags[i as usize] & required == required)
            .min()
    }

    #[test]
    fn deduction_matches_reference_on_all_small_tables() {
        // Every table of up to three types over the four property bits, every mask and every
        // request.
        for len in 0..=3usize {
            let combos = 16usize.pow(len as u32);
            for combo in 0..combos {
                let flags: Vec<u32> = (0..len).map(|i| ((combo >> (4 * i)) & 0xf) as u32).collect();
                let props = table(&flags);
                for type_bits in 0..(1u32 << len) {
                    for required in 0..16u32 {
                        let required_flags = MemoryPropertyFlags::from_bits_truncate(required);
                        let got = props.find_memory_type(type_bits, required_flags).ok();
                        assert_eq!(
                            got,
                            reference(&flags, type_bits, required),
                            "flags={flags:?} bits={type_bits:#x} required={required:#x}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn no_match_is_out_of_memory() {
        let props = MemoryProperties::default();
        let err = props
            .find_memory_type(0b0001, MemoryPropertyFlags::HOST_VISIBLE)
            .unwrap_err();
        assert_eq!(
            err,
            OutOfMemoryError::NoCompatibleMemoryType {
                type_bits: 0b0001,
                required: MemoryPropertyFlags::HOST_VISIBLE,
            }
        );
    }

    #[test]
    fn default_table_prefers_lowest_index() {
        let props = MemoryProperties::default();
        let all = props.all_type_bits();
        assert_eq!(all, 0b1111);
        assert_eq!(
            props.find_memory_type(all, MemoryPropertyFlags::HOST_VISIBLE),
            Ok(1)
        );
        assert_eq!(
            props.find_memory_type(all, MemoryPropertyFlags::DEVICE_LOCAL),
            Ok(0)
        );
        assert_eq!(
            props.find_memory_type(
                all,
                MemoryPropertyFlags::DEVICE_LOCAL | MemoryPropertyFlags::HOST_VISIBLE
            ),
            Ok(3)
        );
        assert_eq!(props.device_only_type_bits(), 0b0001);
    }
}
