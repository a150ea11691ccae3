//! GPU depth transform and bitonic sort.
//!
//! Each frame records one transform pass followed by one compute pass per
//! planned stage into a single command buffer. Separate passes give the
//! barrier between stages: stage `s + 1` reads the indices stage `s` wrote.
//! The compare patterns are uploaded once per dataset into a single uniform
//! buffer, one aligned slot per stage, each with its own bind group.

use crate::buffers::SplatBuffers;
use crate::device::{storage_entry, uniform_entry, GpuContext};
use crate::readback::{read_order, ReadbackOracle};
use crate::types::SortParams;
use nalgebra::Matrix4;
use splatsort_algorithms::SortPlan;
use splatsort_core::{DepthSorter, Error, Result, SortConfig, SplatSet, VerificationReport, VerifyMode};

const DEPTH_SORT_SHADER: &str = include_str!("shaders/depth_sort.wgsl");

/// Highest workgroup count per dispatch dimension guaranteed by wgpu
const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// Reject workgroup sizes the shader cannot be compiled with on this device
pub fn check_workgroup_size(workgroup_size: u32, limits: &wgpu::Limits) -> Result<()> {
    if workgroup_size == 0 {
        return Err(Error::InvalidData("workgroup size must be at least 1".to_string()));
    }
    let max = limits
        .max_compute_invocations_per_workgroup
        .min(limits.max_compute_workgroup_size_x);
    if workgroup_size > max {
        return Err(Error::Unsupported(format!(
            "workgroup size {} exceeds the device limit of {} invocations",
            workgroup_size, max
        )));
    }
    Ok(())
}

/// Pipelines and layouts, independent of the dataset
pub struct SortPipelines {
    pub dataset_layout: wgpu::BindGroupLayout,
    pub stage_layout: wgpu::BindGroupLayout,
    pub transform: wgpu::ComputePipeline,
    pub sort: wgpu::ComputePipeline,
}

impl SortPipelines {
    pub fn new(ctx: &GpuContext, workgroup_size: u32) -> Self {
        let source = DEPTH_SORT_SHADER.replace("WORKGROUP_SIZE", &workgroup_size.to_string());
        let shader = ctx.create_shader_module("Depth Sort", &source);

        let dataset_layout = ctx.create_bind_group_layout(
            "Depth Sort Dataset",
            &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
                storage_entry(3, false),
                storage_entry(4, false),
            ],
        );
        let stage_layout = ctx.create_bind_group_layout("Depth Sort Stage", &[uniform_entry(0)]);

        let transform = ctx.create_compute_pipeline("Depth Transform", &[&dataset_layout], &shader, "transform_main");
        let sort = ctx.create_compute_pipeline(
            "Bitonic Sort Stage",
            &[&dataset_layout, &stage_layout],
            &shader,
            "sort_main",
        );

        Self {
            dataset_layout,
            stage_layout,
            transform,
            sort,
        }
    }
}

/// A sort plan resident on the device
pub struct GpuSortPlan {
    pub plan: SortPlan,
    pub params: Option<wgpu::Buffer>,
    pub stage_bind_groups: Vec<wgpu::BindGroup>,
}

impl GpuSortPlan {
    pub fn new(ctx: &GpuContext, layout: &wgpu::BindGroupLayout, plan: SortPlan) -> Self {
        if plan.stage_count() == 0 {
            return Self {
                plan,
                params: None,
                stage_bind_groups: Vec::new(),
            };
        }

        let param_size = std::mem::size_of::<SortParams>() as u64;
        let alignment = ctx.device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = param_size.div_ceil(alignment) * alignment;

        let mut bytes = vec![0u8; stride as usize * plan.stage_count()];
        for (slot, stage) in bytes.chunks_exact_mut(stride as usize).zip(plan.iter()) {
            let params = SortParams {
                compare_pattern: stage.compare_pattern,
                count: plan.len() as u32,
                _padding: [0; 2],
            };
            slot[..param_size as usize].copy_from_slice(bytemuck::bytes_of(&params));
        }
        let params = ctx.create_buffer_init("Sort Stage Params", &bytes, wgpu::BufferUsages::UNIFORM);

        let stage_bind_groups = (0..plan.stage_count() as u64)
            .map(|stage| {
                ctx.create_bind_group(
                    "Sort Stage",
                    layout,
                    &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &params,
                            offset: stage * stride,
                            size: wgpu::BufferSize::new(param_size),
                        }),
                    }],
                )
            })
            .collect();

        Self {
            plan,
            params: Some(params),
            stage_bind_groups,
        }
    }
}

/// Everything that lives and dies with one dataset
struct DatasetResources {
    buffers: SplatBuffers,
    plan: GpuSortPlan,
}

/// Keeps a dataset resident on the GPU and sorts it each frame.
///
/// The sorted order stays on the device in [`GpuDepthSorter::index_buffer`]
/// for the draw pass; the host only sees it through verification readbacks.
pub struct GpuDepthSorter<'ctx> {
    ctx: &'ctx GpuContext,
    config: SortConfig,
    pipelines: SortPipelines,
    resources: Option<DatasetResources>,
    readback: ReadbackOracle,
    unverified_sort: bool,
}

impl<'ctx> GpuDepthSorter<'ctx> {
    /// Build the pipelines for `config`, failing if the device cannot run them
    pub fn new(ctx: &'ctx GpuContext, config: SortConfig) -> Result<Self> {
        check_workgroup_size(config.workgroup_size, &ctx.device.limits())?;
        let pipelines = pollster::block_on(ctx.scoped(|| SortPipelines::new(ctx, config.workgroup_size)))?;
        Ok(Self {
            ctx,
            config,
            pipelines,
            resources: None,
            readback: ReadbackOracle::new(),
            unverified_sort: false,
        })
    }

    /// Drawing order for the current frame, valid until the next sort is submitted
    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.resources.as_ref().map(|r| &r.buffers.indices)
    }

    /// Clip-space positions written by the transform pass
    pub fn clip_position_buffer(&self) -> Option<&wgpu::Buffer> {
        self.resources.as_ref().map(|r| &r.buffers.clip_positions)
    }

    pub fn plan(&self) -> Option<&SortPlan> {
        self.resources.as_ref().map(|r| &r.plan.plan)
    }

    /// Record the transform and every sort stage into `encoder`
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, view_proj: &Matrix4<f32>) {
        let Some(resources) = self.resources.as_ref() else {
            return;
        };
        let buffers = &resources.buffers;
        if buffers.len == 0 {
            return;
        }
        buffers.write_frame(&self.ctx.queue, view_proj);
        let workgroups = self.dispatch_size(buffers.len as usize);

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Depth Transform Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.transform);
            pass.set_bind_group(0, &buffers.bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
        }

        for stage_bind_group in &resources.plan.stage_bind_groups {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Bitonic Sort Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.sort);
            pass.set_bind_group(0, &buffers.bind_group, &[]);
            pass.set_bind_group(1, stage_bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
        }
    }

    /// Split the workgroup count over x and y to respect the per-dimension limit
    fn dispatch_size(&self, count: usize) -> (u32, u32) {
        let groups = self.config.workgroups_for(count).max(1);
        let x = groups.min(MAX_WORKGROUPS_PER_DIMENSION);
        (x, groups.div_ceil(x))
    }

    /// Sort and submit, waiting for device-side validation of the submission
    pub async fn sort_async(&mut self, view_proj: &Matrix4<f32>) -> Result<()> {
        let ctx = self.ctx;
        let submitted = ctx
            .scoped(|| {
                let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Depth Sort"),
                });
                self.encode(&mut encoder, view_proj);
                ctx.queue.submit(std::iter::once(encoder.finish()));
            })
            .await;

        match submitted {
            Ok(()) => {
                self.unverified_sort = true;
                log::debug!("gpu sorter: submitted {} splats", self.len());
                Ok(())
            }
            Err(e) => {
                log::warn!("gpu sorter: sort failed, keeping previous order: {}", e);
                Err(e)
            }
        }
    }

    /// Read the current depths and order back, waiting for the device
    pub async fn read_back(&self) -> Result<(Vec<f32>, Vec<u32>)> {
        match self.resources.as_ref() {
            Some(resources) => read_order(self.ctx, &resources.buffers).await,
            None => Ok((Vec::new(), Vec::new())),
        }
    }
}

impl DepthSorter for GpuDepthSorter<'_> {
    fn backend_name(&self) -> &'static str {
        "gpu"
    }

    fn load(&mut self, splats: &SplatSet) -> Result<()> {
        let plan = SortPlan::new(splats.len())?;
        let stage_count = plan.stage_count();
        let ctx = self.ctx;
        let pipelines = &self.pipelines;
        let (buffers, plan) = pollster::block_on(ctx.scoped(|| -> Result<_> {
            let buffers = SplatBuffers::new(ctx, &pipelines.dataset_layout, splats)?;
            Ok((buffers, GpuSortPlan::new(ctx, &pipelines.stage_layout, plan)))
        }))??;

        // old buffers are released only once the new set is complete
        self.resources = Some(DatasetResources { buffers, plan });
        self.readback = ReadbackOracle::new();
        self.unverified_sort = false;
        log::info!("gpu sorter: loaded {} splats, {} bitonic stages", splats.len(), stage_count);
        Ok(())
    }

    fn len(&self) -> usize {
        self.resources.as_ref().map_or(0, |r| r.buffers.len as usize)
    }

    fn sort(&mut self, view_proj: &Matrix4<f32>) -> Result<()> {
        pollster::block_on(self.sort_async(view_proj))
    }

    fn verify(&mut self, mode: VerifyMode) -> Result<Option<VerificationReport>> {
        if mode == VerifyMode::Off {
            return Ok(None);
        }
        if !self.readback.is_pending() && self.unverified_sort {
            if let Some(resources) = self.resources.as_ref() {
                self.readback.begin(self.ctx, &resources.buffers, mode);
                self.unverified_sort = false;
            }
        }
        self.readback.poll(self.ctx, false)
    }

    fn finish_verification(&mut self) -> Result<Option<VerificationReport>> {
        self.readback.poll(self.ctx, true)
    }
}
