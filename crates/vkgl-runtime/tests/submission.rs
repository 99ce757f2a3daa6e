use pretty_assertions::assert_eq;
use vkgl_gl::{GlCall, GlProgram, RecordingGl};
use vkgl_runtime::{
    AttachmentDescription, Buffer, BufferCopy, BufferDesc, BufferImageCopy, BufferUsage,
    ClearColorValue, ClearValue, CommandBuffer, Device, DeviceConfig, Error, Extent3d, Format,
    Framebuffer, FramebufferDesc, Image, ImageAspects, ImageDesc, ImageSubresourceLayers,
    ImageViewDesc, LoadOp, PipelineDesc, PrimitiveTopology, Rect2d, RenderPass, RenderPassDesc,
    StoreOp, SubpassDescription, ValidationError, Viewport, WHOLE_SIZE,
};

const DEVICE_LOCAL: u32 = 0;
const HOST_COHERENT: u32 = 1;

fn device() -> (Device, RecordingGl) {
    let gl = RecordingGl::new();
    (Device::new(Box::new(gl.clone()), DeviceConfig::default()), gl)
}

fn bound_buffer(device: &Device, size: u64, memory_type: u32) -> Buffer {
    let buffer = device
        .create_buffer(BufferDesc {
            size,
            usage: BufferUsage::all(),
        })
        .unwrap();
    let reqs = device.buffer_memory_requirements(&buffer).unwrap();
    let memory = device.allocate(reqs.size, memory_type).unwrap();
    device.bind_buffer_memory(&buffer, &memory, 0).unwrap();
    buffer
}

fn bound_image(device: &Device, desc: ImageDesc) -> Image {
    let image = device.create_image(desc).unwrap();
    let reqs = device.image_memory_requirements(&image).unwrap();
    let memory = device.allocate(reqs.size, DEVICE_LOCAL).unwrap();
    device.bind_image_memory(&image, &memory, 0).unwrap();
    image
}

struct Target {
    render_pass: RenderPass,
    framebuffer: Framebuffer,
}

fn color_target(device: &Device, image: &Image) -> Target {
    let render_pass = device
        .create_render_pass(RenderPassDesc::single(
            vec![AttachmentDescription::new(
                Format::R8G8B8A8Unorm,
                LoadOp::Clear,
                StoreOp::Store,
            )],
            SubpassDescription {
                color: vec![0],
                ..Default::default()
            },
        ))
        .unwrap();
    let view = device
        .create_image_view(ImageViewDesc {
            image: image.clone(),
            aspects: ImageAspects::COLOR,
            level: 0,
            base_layer: 0,
            layer_count: 1,
        })
        .unwrap();
    let framebuffer = device
        .create_framebuffer(FramebufferDesc {
            render_pass: render_pass.clone(),
            attachments: vec![view],
            width: 16,
            height: 16,
            layers: 1,
        })
        .unwrap();
    Target {
        render_pass,
        framebuffer,
    }
}

fn record_draw(device: &Device, target: &Target, vertices: &Buffer) -> CommandBuffer {
    let pipeline = device
        .create_pipeline(PipelineDesc::graphics(
            GlProgram(7),
            PrimitiveTopology::TriangleList,
            &[12],
        ))
        .unwrap();
    let area = Rect2d {
        x: 0,
        y: 0,
        width: 16,
        height: 16,
    };
    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.bind_pipeline(&pipeline).unwrap();
    cb.bind_vertex_buffers(0, &[(vertices, 0)]).unwrap();
    cb.begin_render_pass(
        &target.render_pass,
        &target.framebuffer,
        area,
        &[ClearValue::Color(ClearColorValue::Float([0.0, 0.0, 0.0, 1.0]))],
    )
    .unwrap();
    cb.set_viewports(
        0,
        &[Viewport {
            x: 0.0,
            y: 0.0,
            width: 16.0,
            height: 16.0,
            min_depth: 0.0,
            max_depth: 1.0,
        }],
    )
    .unwrap();
    cb.draw(3, 1, 0, 0).unwrap();
    cb.end_render_pass().unwrap();
    cb.end().unwrap();
    cb
}

#[test]
fn replaying_twice_issues_identical_calls() {
    let (device, gl) = device();
    let image = bound_image(&device, ImageDesc::new_2d(Format::R8G8B8A8Unorm, 16, 16));
    let target = color_target(&device, &image);
    let vertices = bound_buffer(&device, 36, DEVICE_LOCAL);
    let cb = record_draw(&device, &target, &vertices);

    gl.clear_calls();
    let first = device.queue().submit(&[&cb], None).unwrap();
    let first_calls = gl.take_calls();
    let second = device.queue().submit(&[&cb], None).unwrap();
    let second_calls = gl.take_calls();

    assert!(first.is_ok(), "{first:?}");
    assert_eq!(first, second);
    assert_eq!(first_calls, second_calls);
    assert!(first_calls.iter().any(|c| matches!(
        c,
        GlCall::DrawArrays {
            count: 3,
            instances: 1,
            ..
        }
    )));
    assert!(first_calls.iter().any(|c| matches!(
        c,
        GlCall::BindVertexBuffer {
            binding: 0,
            buffer: Some(_),
            offset: 0,
            stride: 12,
        }
    )));
    assert_eq!(device.stats().submissions, 2);
}

#[test]
fn coherent_writes_reach_copies_without_a_flush() {
    let (device, _gl) = device();
    let src = device
        .create_buffer(BufferDesc {
            size: 64,
            usage: BufferUsage::TRANSFER_SRC,
        })
        .unwrap();
    let dst = device
        .create_buffer(BufferDesc {
            size: 64,
            usage: BufferUsage::TRANSFER_DST,
        })
        .unwrap();
    let memory = device.allocate(128, HOST_COHERENT).unwrap();
    device.bind_buffer_memory(&src, &memory, 0).unwrap();
    device.bind_buffer_memory(&dst, &memory, 64).unwrap();

    let bytes: Vec<u8> = (0..32).collect();
    device.map(&memory, 0, WHOLE_SIZE).unwrap();
    device.write_mapped(&memory, 8, &bytes).unwrap();

    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.copy_buffer(
        &src,
        &dst,
        &[BufferCopy {
            src_offset: 8,
            dst_offset: 0,
            size: 32,
        }],
    )
    .unwrap();
    cb.end().unwrap();
    assert!(device.queue().submit(&[&cb], None).unwrap().is_ok());

    device.invalidate(&memory, 64, 64).unwrap();
    let mut out = vec![0u8; 32];
    device.read_mapped(&memory, 64, &mut out).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn update_and_fill_write_buffer_contents() {
    let (device, _gl) = device();
    let buffer = device
        .create_buffer(BufferDesc {
            size: 32,
            usage: BufferUsage::TRANSFER_DST,
        })
        .unwrap();
    let memory = device.allocate(32, HOST_COHERENT).unwrap();
    device.bind_buffer_memory(&buffer, &memory, 0).unwrap();

    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.fill_buffer(&buffer, 0, WHOLE_SIZE, 0xaabb_ccdd).unwrap();
    cb.update_buffer(&buffer, 4, &[1, 2, 3, 4]).unwrap();
    cb.end().unwrap();
    assert!(device.queue().submit(&[&cb], None).unwrap().is_ok());

    device.map(&memory, 0, WHOLE_SIZE).unwrap();
    device.invalidate(&memory, 0, WHOLE_SIZE).unwrap();
    let mut out = vec![0u8; 12];
    device.read_mapped(&memory, 0, &mut out).unwrap();
    assert_eq!(
        out,
        vec![0xdd, 0xcc, 0xbb, 0xaa, 1, 2, 3, 4, 0xdd, 0xcc, 0xbb, 0xaa]
    );
}

#[test]
fn buffer_image_copies_round_trip() {
    let (device, _gl) = device();
    let image = bound_image(&device, ImageDesc::new_2d(Format::R8G8B8A8Unorm, 4, 4));
    let staging = device
        .create_buffer(BufferDesc {
            size: 128,
            usage: BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST,
        })
        .unwrap();
    let memory = device.allocate(128, HOST_COHERENT).unwrap();
    device.bind_buffer_memory(&staging, &memory, 0).unwrap();

    let texels: Vec<u8> = (0..64).map(|i| i * 3).collect();
    device.map(&memory, 0, WHOLE_SIZE).unwrap();
    device.write_mapped(&memory, 0, &texels).unwrap();

    let region = |buffer_offset| BufferImageCopy {
        buffer_offset,
        row_length: 0,
        image_height: 0,
        subresource: ImageSubresourceLayers::new(ImageAspects::COLOR, 0),
        offset: [0; 3],
        extent: Extent3d::new(4, 4, 1),
    };
    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.copy_buffer_to_image(&staging, &image, &[region(0)]).unwrap();
    cb.copy_image_to_buffer(&image, &staging, &[region(64)]).unwrap();
    cb.end().unwrap();
    let report = device.queue().submit(&[&cb], None).unwrap();
    assert!(report.is_ok(), "{report:?}");

    device.invalidate(&memory, 64, 64).unwrap();
    let mut out = vec![0u8; 64];
    device.read_mapped(&memory, 64, &mut out).unwrap();
    assert_eq!(out, texels);
}

#[test]
fn submission_validates_before_executing() {
    let (device, gl) = device();
    let buffer = bound_buffer(&device, 16, HOST_COHERENT);

    let mut recording = device.create_command_buffer();
    recording.begin().unwrap();
    assert_eq!(
        device.queue().submit(&[&recording], None).unwrap_err(),
        Error::Validation(ValidationError::NotExecutable)
    );

    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.fill_buffer(&buffer, 0, 16, 0).unwrap();
    cb.end().unwrap();
    device.destroy_buffer(&buffer).unwrap();

    gl.clear_calls();
    assert_eq!(
        device.queue().submit(&[&cb], None).unwrap_err(),
        Error::Validation(ValidationError::UnknownHandle {
            kind: Buffer::KIND,
            id: buffer.id(),
        })
    );
    assert!(gl.calls().is_empty());
}

#[test]
fn fences_signal_after_submission() {
    let (device, _gl) = device();
    let fence = device.create_fence(false);
    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.end().unwrap();

    device.queue().submit(&[&cb], Some(&fence)).unwrap();
    assert_eq!(
        device.queue().submit(&[&cb], Some(&fence)).unwrap_err(),
        Error::Validation(ValidationError::FenceInUse(fence.id()))
    );
    assert!(device.wait_for_fence(&fence, u64::MAX).unwrap());
    assert!(device.fence_status(&fence).unwrap());

    device.reset_fence(&fence).unwrap();
    assert!(!device.fence_status(&fence).unwrap());
    device.queue().submit(&[&cb], Some(&fence)).unwrap();
    device.queue().wait_idle().unwrap();
    assert!(device.fence_status(&fence).unwrap());
}
