//! Readback of depths and drawing order for the correctness oracle
//!
//! The frame loop uses [`ReadbackOracle`], which copies the buffers into a
//! staging buffer, maps it asynchronously and picks the result up on a later
//! frame through a channel. At most one readback is in flight. Tests and
//! one-shot checks use [`read_order`], which waits for the device.

use crate::buffers::SplatBuffers;
use crate::device::GpuContext;
use splatsort_algorithms::verify_order;
use splatsort_core::{Error, Result, VerificationReport, VerifyMode};

struct PendingReadback {
    staging: wgpu::Buffer,
    mode: VerifyMode,
    len: usize,
    receiver: flume::Receiver<std::result::Result<(), wgpu::BufferAsyncError>>,
}

/// Non-blocking verification of GPU sort results
#[derive(Default)]
pub struct ReadbackOracle {
    pending: Option<PendingReadback>,
}

impl ReadbackOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Queue a copy of the current depths and order and start mapping it.
    ///
    /// Returns `false` without doing anything while a previous readback is
    /// still outstanding.
    pub fn begin(&mut self, ctx: &GpuContext, buffers: &SplatBuffers, mode: VerifyMode) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let staging = copy_to_staging(ctx, buffers);
        let (sender, receiver) = flume::bounded(1);
        staging.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            // the oracle may have been dropped together with its dataset
            let _ = sender.send(result);
        });

        self.pending = Some(PendingReadback {
            staging,
            mode,
            len: buffers.len as usize,
            receiver,
        });
        true
    }

    /// Check for a finished readback and verify it.
    ///
    /// With `wait` the device is polled until the mapping completes; otherwise
    /// the call returns `Ok(None)` immediately if the copy is still running.
    pub fn poll(&mut self, ctx: &GpuContext, wait: bool) -> Result<Option<VerificationReport>> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };

        let maintain = if wait { wgpu::Maintain::Wait } else { wgpu::Maintain::Poll };
        // completion is reported through the channel, not the queue state
        let _ = ctx.device.poll(maintain);

        let mapped = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(flume::TryRecvError::Empty) => return Ok(None),
            Err(flume::TryRecvError::Disconnected) => {
                self.pending = None;
                return Err(Error::Gpu("readback mapping was abandoned".to_string()));
            }
        };

        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        mapped?;

        let report = {
            let data = pending.staging.slice(..).get_mapped_range();
            let (depths, order) = split_staging(&data, pending.len);
            verify_order(pending.mode, depths, order)
        };
        pending.staging.unmap();
        report
    }
}

/// Read the current depths and drawing order back to the host, waiting for the device.
pub async fn read_order(ctx: &GpuContext, buffers: &SplatBuffers) -> Result<(Vec<f32>, Vec<u32>)> {
    if buffers.len == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let staging = copy_to_staging(ctx, buffers);
    let buffer_slice = staging.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
        let _ = sender.send(v);
    });

    // the oneshot resolves once the mapping callback has run
    let _ = ctx.device.poll(wgpu::Maintain::Wait);

    match receiver.receive().await {
        Some(Ok(())) => {
            let result = {
                let data = buffer_slice.get_mapped_range();
                let (depths, order) = split_staging(&data, buffers.len as usize);
                (depths.to_vec(), order.to_vec())
            };
            staging.unmap();
            Ok(result)
        }
        Some(Err(e)) => Err(e.into()),
        None => Err(Error::Gpu("Failed to read GPU results".to_string())),
    }
}

fn copy_to_staging(ctx: &GpuContext, buffers: &SplatBuffers) -> wgpu::Buffer {
    let depth_bytes = buffers.depth_bytes();
    let index_bytes = buffers.index_bytes();
    // an empty dataset still maps a minimal buffer so the flow stays uniform
    let staging = ctx.create_buffer(
        "Order Readback Staging",
        (depth_bytes + index_bytes).max(8),
        wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
    );

    let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Order Readback"),
    });
    if depth_bytes > 0 {
        encoder.copy_buffer_to_buffer(&buffers.depths, 0, &staging, 0, depth_bytes);
        encoder.copy_buffer_to_buffer(&buffers.indices, 0, &staging, depth_bytes, index_bytes);
    }
    ctx.queue.submit(std::iter::once(encoder.finish()));
    staging
}

fn split_staging(data: &[u8], len: usize) -> (&[f32], &[u32]) {
    let depth_end = len * std::mem::size_of::<f32>();
    let index_end = depth_end + len * std::mem::size_of::<u32>();
    (
        bytemuck::cast_slice(&data[..depth_end]),
        bytemuck::cast_slice(&data[depth_end..index_end]),
    )
}
