//! Device buffers for one resident dataset

use crate::device::GpuContext;
use crate::types::{FrameUniform, GpuSplat};
use nalgebra::Matrix4;
use splatsort_core::{Error, Result, SplatSet};

/// Every per-dataset device buffer plus the bind group exposing them.
///
/// Dropping the value releases the buffers, so a dataset switch is just
/// building a new `SplatBuffers` and replacing the old one.
pub struct SplatBuffers {
    pub len: u32,
    pub frame: wgpu::Buffer,
    pub splats: wgpu::Buffer,
    /// Clip-space positions for the draw pass
    pub clip_positions: wgpu::Buffer,
    pub depths: wgpu::Buffer,
    /// Drawing order, also bindable as a vertex/index source
    pub indices: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl SplatBuffers {
    pub fn new(ctx: &GpuContext, layout: &wgpu::BindGroupLayout, splats: &SplatSet) -> Result<Self> {
        let len = u32::try_from(splats.len())
            .map_err(|_| Error::InvalidData(format!("{} splats exceed the u32 index range", splats.len())))?;

        let splat_bytes = (splats.len() * std::mem::size_of::<GpuSplat>()) as u64;
        if splat_bytes > ctx.max_storage_binding() {
            return Err(Error::Unsupported(format!(
                "{} splats need {} bytes of storage but the device binds at most {}",
                splats.len(),
                splat_bytes,
                ctx.max_storage_binding()
            )));
        }

        // zero-sized bindings are invalid, so an empty set still gets one slot
        let slots = splats.len().max(1);

        let mut gpu_splats: Vec<GpuSplat> = splats.iter().map(GpuSplat::from).collect();
        gpu_splats.resize(slots, bytemuck::Zeroable::zeroed());
        let identity: Vec<u32> = (0..slots as u32).collect();

        let frame = ctx.create_buffer_init(
            "Frame Uniform",
            &[FrameUniform::new(&Matrix4::identity(), len)],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let splats_buffer = ctx.create_buffer_init(
            "Splats",
            &gpu_splats,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );
        let clip_positions = ctx.create_buffer(
            "Clip Positions",
            (slots * std::mem::size_of::<[f32; 4]>()) as u64,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_SRC,
        );
        let depths = ctx.create_buffer(
            "Depths",
            (slots * std::mem::size_of::<f32>()) as u64,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        );
        let indices = ctx.create_buffer_init(
            "Sorted Indices",
            &identity,
            wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::INDEX
                | wgpu::BufferUsages::COPY_SRC,
        );

        let bind_group = ctx.create_bind_group(
            "Depth Sort Dataset",
            layout,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: splats_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: clip_positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: depths.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: indices.as_entire_binding(),
                },
            ],
        );

        Ok(Self {
            len,
            frame,
            splats: splats_buffer,
            clip_positions,
            depths,
            indices,
            bind_group,
        })
    }

    /// Upload this frame's view-projection
    pub fn write_frame(&self, queue: &wgpu::Queue, view_proj: &Matrix4<f32>) {
        queue.write_buffer(&self.frame, 0, bytemuck::bytes_of(&FrameUniform::new(view_proj, self.len)));
    }

    /// Bytes of live depth values (excludes the placeholder slot of an empty set)
    pub fn depth_bytes(&self) -> u64 {
        self.len as u64 * std::mem::size_of::<f32>() as u64
    }

    /// Bytes of live indices
    pub fn index_bytes(&self) -> u64 {
        self.len as u64 * std::mem::size_of::<u32>() as u64
    }
}
