use pretty_assertions::assert_eq;
use vkgl_gl::{GlCall, RecordedSource, RecordingGl};
use vkgl_runtime::{
    Allocation, Buffer, BufferDesc, BufferImageCopy, BufferUsage, Device, DeviceConfig, Error,
    Extent3d, Format, Image, ImageAspects, ImageDesc, ImageSubresourceLayers, MemoryHeap,
    MemoryProperties, MemoryPropertyFlags, MemoryType, ValidationError, WHOLE_SIZE,
};

const HOST_COHERENT_TYPE: u32 = 1;

/// One 4096-byte allocation holding a 1024-byte buffer at 0 and a 2048-byte image at 1024.
struct Shared {
    device: Device,
    gl: RecordingGl,
    memory: Allocation,
    buffer: Buffer,
    image: Image,
}

fn shared() -> Shared {
    shared_with(DeviceConfig::default(), HOST_COHERENT_TYPE)
}

fn shared_with(config: DeviceConfig, memory_type: u32) -> Shared {
    let gl = RecordingGl::new();
    let device = Device::new(Box::new(gl.clone()), config);
    let memory = device.allocate(4096, memory_type).unwrap();
    let buffer = device
        .create_buffer(BufferDesc {
            size: 1024,
            usage: BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST,
        })
        .unwrap();
    let image = device
        .create_image(ImageDesc::new_2d(Format::R8G8B8A8Unorm, 16, 32))
        .unwrap();
    assert_eq!(device.image_memory_requirements(&image).unwrap().size, 2048);

    device.bind_buffer_memory(&buffer, &memory, 0).unwrap();
    device.bind_image_memory(&image, &memory, 1024).unwrap();
    Shared {
        device,
        gl,
        memory,
        buffer,
        image,
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 + 1).collect()
}

fn buffer_uploads(calls: &[GlCall]) -> Vec<(u64, Vec<u8>)> {
    calls
        .iter()
        .filter_map(|c| match c {
            GlCall::BufferSubData { offset, data, .. } => Some((*offset, data.clone())),
            _ => None,
        })
        .collect()
}

fn texture_uploads(calls: &[GlCall]) -> Vec<Vec<u8>> {
    calls
        .iter()
        .filter_map(|c| match c {
            GlCall::TexSubImage {
                source: RecordedSource::Bytes(bytes),
                ..
            } => Some(bytes.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn both_bindings_round_trip_through_one_allocation() {
    let s = shared();
    let bytes = pattern(4096);
    s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap();
    s.device.write_mapped(&s.memory, 0, &bytes).unwrap();
    s.device.flush(&s.memory, 0, WHOLE_SIZE).unwrap();

    s.device.write_mapped(&s.memory, 0, &[0; 4096]).unwrap();
    s.device.invalidate(&s.memory, 0, WHOLE_SIZE).unwrap();

    let mut out = vec![0xffu8; 4096];
    s.device.read_mapped(&s.memory, 0, &mut out).unwrap();
    assert_eq!(&out[..3072], &bytes[..3072]);
    // Nothing is bound past the image, so the host bytes stay as written.
    assert_eq!(&out[3072..], &[0u8; 1024][..]);
}

#[test]
fn non_overlapping_bindings_are_independent() {
    let s = shared();
    let bytes = pattern(1024);
    s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap();
    s.device.write_mapped(&s.memory, 0, &bytes).unwrap();

    s.gl.clear_calls();
    s.device.flush(&s.memory, 0, 1024).unwrap();
    let calls = s.gl.take_calls();
    assert_eq!(buffer_uploads(&calls), vec![(0, bytes)]);
    assert!(texture_uploads(&calls).is_empty());

    s.device.flush(&s.memory, 1024, 2048).unwrap();
    let calls = s.gl.take_calls();
    assert!(buffer_uploads(&calls).is_empty());
    assert_eq!(texture_uploads(&calls), vec![vec![0u8; 2048]]);
}

#[test]
fn flush_spanning_two_bindings() {
    let s = shared();
    let bytes = pattern(4096);
    s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap();
    s.device.write_mapped(&s.memory, 0, &bytes).unwrap();

    s.gl.clear_calls();
    s.device.flush(&s.memory, 512, 1024).unwrap();
    let calls = s.gl.take_calls();
    assert_eq!(buffer_uploads(&calls), vec![(512, bytes[512..1024].to_vec())]);
    // Only the first eight 64-byte rows of the image are covered.
    assert_eq!(texture_uploads(&calls), vec![bytes[1024..1536].to_vec()]);

    s.device.write_mapped(&s.memory, 0, &[0; 4096]).unwrap();
    s.device.invalidate(&s.memory, 0, 1536).unwrap();
    let mut out = vec![0u8; 1536];
    s.device.read_mapped(&s.memory, 0, &mut out).unwrap();
    assert_eq!(&out[..512], &[0u8; 512][..]);
    assert_eq!(&out[512..], &bytes[512..1536]);
}

#[test]
fn invalidate_leaves_bytes_outside_the_range() {
    let s = shared();
    let bytes = pattern(1024);
    s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap();
    s.device.write_mapped(&s.memory, 0, &bytes).unwrap();
    s.device.flush(&s.memory, 0, 1024).unwrap();

    s.device.write_mapped(&s.memory, 0, &[7; 1024]).unwrap();
    s.device.invalidate(&s.memory, 256, 256).unwrap();
    let mut out = vec![0u8; 1024];
    s.device.read_mapped(&s.memory, 0, &mut out).unwrap();
    assert_eq!(&out[..256], &[7u8; 256][..]);
    assert_eq!(&out[256..512], &bytes[256..512]);
    assert_eq!(&out[512..], &[7u8; 512][..]);
}

#[test]
fn unmap_flushes_coherent_writes() {
    let s = shared();
    let bytes = pattern(64);
    s.device.map(&s.memory, 0, 1024).unwrap();
    s.device.write_mapped(&s.memory, 128, &bytes).unwrap();
    s.gl.clear_calls();
    assert!(s.device.unmap(&s.memory).unwrap());
    assert_eq!(buffer_uploads(&s.gl.take_calls()), vec![(128, bytes)]);
}

#[test]
fn host_writes_around_a_binding_leave_its_device_contents() {
    let gl = RecordingGl::new();
    let device = Device::new(Box::new(gl.clone()), DeviceConfig::default());
    let memory = device.allocate(4096, HOST_COHERENT_TYPE).unwrap();
    let buffers: Vec<Buffer> = (0..3)
        .map(|i| {
            let buffer = device
                .create_buffer(BufferDesc {
                    size: 1024,
                    usage: BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST,
                })
                .unwrap();
            device.bind_buffer_memory(&buffer, &memory, i * 1024).unwrap();
            buffer
        })
        .collect();

    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.update_buffer(&buffers[1], 0, &[0xab; 1024]).unwrap();
    cb.end().unwrap();
    device.queue().submit(&[&cb], None).unwrap();
    device.wait_idle().unwrap();

    device.map(&memory, 0, WHOLE_SIZE).unwrap();
    device.write_mapped(&memory, 0, &[1; 4]).unwrap();
    device.write_mapped(&memory, 4000, &[2; 4]).unwrap();
    gl.clear_calls();
    device.unmap(&memory).unwrap();
    assert_eq!(buffer_uploads(&gl.take_calls()), vec![(0, vec![1; 4])]);

    device.map(&memory, 0, WHOLE_SIZE).unwrap();
    device.invalidate(&memory, 1024, 1024).unwrap();
    let mut out = vec![0u8; 1024];
    device.read_mapped(&memory, 1024, &mut out).unwrap();
    assert_eq!(out, vec![0xab; 1024]);
}

#[test]
fn partial_image_flush_keeps_device_written_rows() {
    let s = shared();
    let texels = pattern(1024);
    s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap();
    s.device.write_mapped(&s.memory, 0, &texels).unwrap();
    s.device.flush(&s.memory, 0, 1024).unwrap();

    // The device fills the first 16 of the image's 32 rows.
    let mut cb = s.device.create_command_buffer();
    cb.begin().unwrap();
    cb.copy_buffer_to_image(
        &s.buffer,
        &s.image,
        &[BufferImageCopy {
            buffer_offset: 0,
            row_length: 0,
            image_height: 0,
            subresource: ImageSubresourceLayers::new(ImageAspects::COLOR, 0),
            offset: [0; 3],
            extent: Extent3d::new(16, 16, 1),
        }],
    )
    .unwrap();
    cb.end().unwrap();
    let report = s.device.queue().submit(&[&cb], None).unwrap();
    assert!(report.is_ok(), "{report:?}");

    // Eight bytes inside row 20.
    let row_20 = 1024 + 20 * 64;
    s.device.write_mapped(&s.memory, row_20, &[9; 8]).unwrap();
    s.gl.clear_calls();
    s.device.flush(&s.memory, row_20, 8).unwrap();
    let uploads: Vec<_> = s
        .gl
        .take_calls()
        .into_iter()
        .filter_map(|c| match c {
            GlCall::TexSubImage { offset, extent, .. } => Some((offset, extent)),
            _ => None,
        })
        .collect();
    assert_eq!(uploads, vec![([0, 20, 0], [16, 1, 1])]);

    s.device.invalidate(&s.memory, 1024, 2048).unwrap();
    let mut out = vec![0u8; 2048];
    s.device.read_mapped(&s.memory, 1024, &mut out).unwrap();
    assert_eq!(&out[..1024], &texels[..]);
    assert_eq!(&out[20 * 64..20 * 64 + 8], &[9u8; 8][..]);
    assert_eq!(&out[20 * 64 + 8..21 * 64], &[0u8; 56][..]);
}

#[test]
fn non_coherent_writes_wait_for_an_explicit_flush() {
    let config = DeviceConfig {
        memory: MemoryProperties {
            types: vec![MemoryType {
                property_flags: MemoryPropertyFlags::HOST_VISIBLE
                    | MemoryPropertyFlags::HOST_CACHED,
                heap_index: 0,
            }],
            heaps: vec![MemoryHeap {
                size: 1 << 20,
                device_local: false,
            }],
        },
        ..DeviceConfig::default()
    };
    let s = shared_with(config, 0);
    s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap();
    s.device.write_mapped(&s.memory, 0, &pattern(16)).unwrap();
    s.gl.clear_calls();
    assert!(s.device.unmap(&s.memory).unwrap());
    assert!(buffer_uploads(&s.gl.take_calls()).is_empty());
}

#[test]
fn binding_twice_is_rejected() {
    let s = shared();
    let other = s.device.allocate(1024, HOST_COHERENT_TYPE).unwrap();
    assert_eq!(
        s.device.bind_buffer_memory(&s.buffer, &other, 0).unwrap_err(),
        Error::Validation(ValidationError::AlreadyBound {
            kind: Buffer::KIND,
            id: s.buffer.id(),
        })
    );
}

#[test]
fn image_offsets_follow_alignment_and_size() {
    let s = shared();
    let image = s
        .device
        .create_image(ImageDesc::new_2d(Format::R8G8B8A8Unorm, 16, 32))
        .unwrap();
    assert_eq!(
        s.device.bind_image_memory(&image, &s.memory, 100).unwrap_err(),
        Error::Validation(ValidationError::Misaligned {
            offset: 100,
            alignment: 256,
        })
    );
    assert_eq!(
        s.device.bind_image_memory(&image, &s.memory, 3072).unwrap_err(),
        Error::Validation(ValidationError::OutOfRange {
            offset: 3072,
            size: 2048,
            limit: 4096,
        })
    );
    // Aliasing the existing bindings is allowed.
    s.device.bind_image_memory(&image, &s.memory, 2048).unwrap();
}

#[test]
fn memory_type_must_be_allowed() {
    let gl = RecordingGl::new();
    let device = Device::new(Box::new(gl), DeviceConfig::default());
    let mut desc = ImageDesc::new_2d(Format::R8G8B8A8Unorm, 16, 16);
    desc.samples = 4;
    let image = device.create_image(desc).unwrap();
    let reqs = device.image_memory_requirements(&image).unwrap();
    let host = device.allocate(reqs.size, HOST_COHERENT_TYPE).unwrap();
    assert_eq!(
        device.bind_image_memory(&image, &host, 0).unwrap_err(),
        Error::Validation(ValidationError::IncompatibleMemoryType {
            type_index: HOST_COHERENT_TYPE,
            type_bits: reqs.type_bits,
        })
    );
}

#[test]
fn freeing_memory_unbinds_its_resources() {
    let s = shared();
    let live = s.gl.live_buffers();
    s.device.free(&s.memory).unwrap();
    assert_eq!(s.gl.live_buffers(), live - 1);

    let fresh = s.device.allocate(4096, HOST_COHERENT_TYPE).unwrap();
    s.device.bind_buffer_memory(&s.buffer, &fresh, 0).unwrap();
    s.device.bind_image_memory(&s.image, &fresh, 1024).unwrap();
    assert_eq!(
        s.device.map(&s.memory, 0, WHOLE_SIZE).unwrap_err(),
        Error::Validation(ValidationError::UnknownHandle {
            kind: Allocation::KIND,
            id: s.memory.id(),
        })
    );
}

#[test]
fn memory_type_deduction() {
    let gl = RecordingGl::new();
    let device = Device::new(Box::new(gl), DeviceConfig::default());
    let all = device.memory_properties().all_type_bits();
    assert_eq!(
        device
            .find_memory_type(all, MemoryPropertyFlags::HOST_VISIBLE)
            .unwrap(),
        1
    );
    assert_eq!(
        device
            .find_memory_type(all, MemoryPropertyFlags::HOST_CACHED)
            .unwrap(),
        2
    );
    assert_eq!(
        device
            .find_memory_type(0b1001, MemoryPropertyFlags::HOST_VISIBLE)
            .unwrap(),
        3
    );
    assert!(matches!(
        device.find_memory_type(0b0001, MemoryPropertyFlags::HOST_VISIBLE),
        Err(Error::OutOfMemory(_))
    ));
}
