use anyhow::{ensure, Result};
use bytemuck::{Pod, Zeroable};
use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;
use vkgl::gl::{GlCall, GlProgram, RecordingGl};
use vkgl::{
    AccessFlags, Allocation, AttachmentDescription, Buffer, BufferDesc, BufferImageCopy,
    BufferUsage, ClearColorValue, ClearValue, Device, DeviceConfig, Extent3d, Format,
    FramebufferDesc, ImageAspects, ImageDesc, ImageSubresourceLayers, ImageViewDesc, IndexType,
    LoadOp, MemoryBarrier, MemoryPropertyFlags, PipelineDesc, PipelineStageFlags,
    PrimitiveTopology, Rect2d, RenderPassDesc, StoreOp, SubpassDescription, Viewport, WHOLE_SIZE,
};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const VERTICES: [Vertex; 4] = [
    Vertex {
        position: [-1.0, -1.0],
        uv: [0.0, 0.0],
    },
    Vertex {
        position: [1.0, -1.0],
        uv: [1.0, 0.0],
    },
    Vertex {
        position: [1.0, 1.0],
        uv: [1.0, 1.0],
    },
    Vertex {
        position: [-1.0, 1.0],
        uv: [0.0, 1.0],
    },
];
const INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn host_buffer(device: &Device, size: u64, usage: BufferUsage) -> Result<(Buffer, Allocation)> {
    let buffer = device.create_buffer(BufferDesc { size, usage })?;
    let reqs = device.buffer_memory_requirements(&buffer)?;
    let type_index =
        device.find_memory_type(reqs.type_bits, MemoryPropertyFlags::HOST_VISIBLE)?;
    let memory = device.allocate(reqs.size, type_index)?;
    device.bind_buffer_memory(&buffer, &memory, 0)?;
    Ok((buffer, memory))
}

#[test]
fn textured_quad_frame() -> Result<()> {
    init_tracing();
    let _span = tracing::info_span!("textured_quad_frame").entered();
    let gl = RecordingGl::new();
    let device = Device::new(Box::new(gl.clone()), DeviceConfig::from_env());

    let vertex_bytes = bytemuck::cast_slice::<Vertex, u8>(&VERTICES);
    let index_bytes = bytemuck::cast_slice::<u16, u8>(&INDICES);
    let (vertices, vertex_memory) =
        host_buffer(&device, vertex_bytes.len() as u64, BufferUsage::VERTEX)?;
    let (indices, index_memory) = host_buffer(&device, 16, BufferUsage::INDEX)?;
    device.map(&vertex_memory, 0, WHOLE_SIZE)?;
    device.write_mapped(&vertex_memory, 0, vertex_bytes)?;
    device.unmap(&vertex_memory)?;
    device.map(&index_memory, 0, WHOLE_SIZE)?;
    device.write_mapped(&index_memory, 0, index_bytes)?;
    device.unmap(&index_memory)?;

    let texels: Vec<u8> = (0..8 * 8 * 4).map(|i| (i * 7 % 256) as u8).collect();
    let (staging, staging_memory) = host_buffer(
        &device,
        2 * texels.len() as u64,
        BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST,
    )?;
    device.map(&staging_memory, 0, WHOLE_SIZE)?;
    device.write_mapped(&staging_memory, 0, &texels)?;

    let texture = device.create_image(ImageDesc::new_2d(Format::R8G8B8A8Unorm, 8, 8))?;
    let target = device.create_image(ImageDesc::new_2d(Format::B8G8R8A8Unorm, 32, 32))?;
    for image in [&texture, &target] {
        let reqs = device.image_memory_requirements(image)?;
        let type_index =
            device.find_memory_type(reqs.type_bits, MemoryPropertyFlags::DEVICE_LOCAL)?;
        let memory = device.allocate(reqs.size, type_index)?;
        device.bind_image_memory(image, &memory, 0)?;
    }

    let render_pass = device.create_render_pass(RenderPassDesc::single(
        vec![AttachmentDescription::new(Format::B8G8R8A8Unorm, LoadOp::Clear, StoreOp::Store)],
        SubpassDescription {
            color: vec![0],
            ..Default::default()
        },
    ))?;
    let view = device.create_image_view(ImageViewDesc {
        image: target.clone(),
        aspects: ImageAspects::COLOR,
        level: 0,
        base_layer: 0,
        layer_count: 1,
    })?;
    let framebuffer = device.create_framebuffer(FramebufferDesc {
        render_pass: render_pass.clone(),
        attachments: vec![view],
        width: 32,
        height: 32,
        layers: 1,
    })?;
    let pipeline = device.create_pipeline(PipelineDesc::graphics(
        GlProgram(3),
        PrimitiveTopology::TriangleList,
        &[std::mem::size_of::<Vertex>() as u32],
    ))?;

    let texel_region = |buffer_offset| BufferImageCopy {
        buffer_offset,
        row_length: 0,
        image_height: 0,
        subresource: ImageSubresourceLayers::new(ImageAspects::COLOR, 0),
        offset: [0; 3],
        extent: Extent3d::new(8, 8, 1),
    };
    let area = Rect2d {
        x: 0,
        y: 0,
        width: 32,
        height: 32,
    };

    let mut cb = device.create_command_buffer();
    cb.begin()?;
    cb.begin_debug_label("upload")?;
    cb.copy_buffer_to_image(&staging, &texture, &[texel_region(0)])?;
    cb.end_debug_label()?;
    cb.pipeline_barrier(
        PipelineStageFlags::TRANSFER,
        PipelineStageFlags::FRAGMENT_SHADER,
        &[MemoryBarrier::new(AccessFlags::TRANSFER_WRITE, AccessFlags::SHADER_READ)],
    )?;
    cb.begin_render_pass(
        &render_pass,
        &framebuffer,
        area,
        &[ClearValue::Color(ClearColorValue::Float([0.1, 0.2, 0.3, 1.0]))],
    )?;
    cb.bind_pipeline(&pipeline)?;
    cb.bind_vertex_buffers(0, &[(&vertices, 0)])?;
    cb.bind_index_buffer(&indices, 0, IndexType::Uint16)?;
    cb.set_viewports(
        0,
        &[Viewport {
            x: 0.0,
            y: 0.0,
            width: 32.0,
            height: 32.0,
            min_depth: 0.0,
            max_depth: 1.0,
        }],
    )?;
    cb.set_scissors(0, &[area])?;
    cb.push_constants(0, bytemuck::bytes_of(&[1.0f32, 0.5, 0.25, 1.0]))?;
    cb.draw_indexed(INDICES.len() as u32, 1, 0, 0, 0)?;
    cb.end_render_pass()?;
    cb.copy_image_to_buffer(&texture, &staging, &[texel_region(texels.len() as u64)])?;
    cb.end()?;

    let fence = device.create_fence(false);
    gl.clear_calls();
    let report = device.queue().submit(&[&cb], Some(&fence))?;
    ensure!(report.is_ok(), "replay failed: {report:?}");
    ensure!(device.wait_for_fence(&fence, 1_000_000_000)?, "fence did not signal");
    device.check_status()?;

    let calls = gl.take_calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        GlCall::DrawElements {
            count: 6,
            instances: 1,
            ..
        }
    )));
    assert!(calls.contains(&GlCall::PushDebugGroup("upload".to_owned())));

    device.invalidate(&staging_memory, texels.len() as u64, texels.len() as u64)?;
    let mut readback = vec![0u8; texels.len()];
    device.read_mapped(&staging_memory, texels.len() as u64, &mut readback)?;
    assert_eq!(readback, texels);

    let stats = device.stats();
    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.framebuffers_created, 1);
    assert_eq!(stats.driver_errors, 0);
    ensure!(stats.instructions_replayed == report.instructions_replayed());
    Ok(())
}

#[test]
fn compute_dispatch_reads_back_through_a_fence() -> Result<()> {
    init_tracing();
    let gl = RecordingGl::new();
    let device = Device::new(Box::new(gl.clone()), DeviceConfig::default());
    let (storage, memory) = host_buffer(
        &device,
        256,
        BufferUsage::STORAGE | BufferUsage::TRANSFER_DST | BufferUsage::TRANSFER_SRC,
    )?;
    let pipeline = device.create_pipeline(PipelineDesc::compute(GlProgram(9)))?;

    let mut cb = device.create_command_buffer();
    cb.begin()?;
    cb.fill_buffer(&storage, 0, WHOLE_SIZE, 0x0102_0304)?;
    cb.bind_pipeline(&pipeline)?;
    cb.dispatch(4, 2, 1)?;
    cb.pipeline_barrier(
        PipelineStageFlags::COMPUTE_SHADER,
        PipelineStageFlags::HOST,
        &[MemoryBarrier::new(AccessFlags::SHADER_WRITE, AccessFlags::HOST_READ)],
    )?;
    cb.end()?;

    let fence = device.create_fence(false);
    let report = device.queue().submit(&[&cb], Some(&fence))?;
    ensure!(report.is_ok(), "replay failed: {report:?}");
    ensure!(device.wait_for_fence(&fence, u64::MAX)?);
    assert!(gl.calls().contains(&GlCall::DispatchCompute([4, 2, 1])));

    device.map(&memory, 0, WHOLE_SIZE)?;
    device.invalidate(&memory, 0, WHOLE_SIZE)?;
    let mut words = [0u8; 8];
    device.read_mapped(&memory, 0, &mut words)?;
    assert_eq!(words, [4, 3, 2, 1, 4, 3, 2, 1]);

    device.destroy_fence(&fence)?;
    device.free(&memory)?;
    Ok(())
}
