//! Submission: validation, coherent flushes, replay and fence signalling.

use std::collections::BTreeSet;

use crate::context::Context;
use crate::device::Device;
use crate::encode::{CommandBuffer, RecordingState, ResourceRef};
use crate::error::{Result, ValidationError};
use crate::execute::{replay, ReplayReport};
use crate::resource::{Buffer, Fence, Framebuffer, Image, Pipeline};

/// Per-buffer replay reports of one submission, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub replays: Vec<ReplayReport>,
}

impl SubmitReport {
    pub fn is_ok(&self) -> bool {
        self.replays.iter().all(ReplayReport::is_ok)
    }

    pub fn instructions_replayed(&self) -> u64 {
        self.replays
            .iter()
            .map(|r| u64::from(r.instructions_replayed))
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Queue<'a> {
    device: &'a Device,
}

fn check_referenced(ctx: &Context, refs: &BTreeSet<ResourceRef>) -> Result<(), ValidationError> {
    for r in refs {
        match *r {
            ResourceRef::Buffer(id) => {
                if ctx.buffer_entry(id)?.gl.is_none() {
                    return Err(ValidationError::NotBound {
                        kind: Buffer::KIND,
                        id,
                    });
                }
            }
            ResourceRef::Image(id) => {
                if ctx.image_entry(id)?.gl.is_none() {
                    return Err(ValidationError::NotBound {
                        kind: Image::KIND,
                        id,
                    });
                }
            }
            ResourceRef::Pipeline(id) => {
                if !ctx.pipelines.contains_key(&id) {
                    return Err(ValidationError::UnknownHandle {
                        kind: Pipeline::KIND,
                        id,
                    });
                }
            }
            ResourceRef::Framebuffer(id) => {
                let entry = ctx.framebuffers.get(&id).ok_or(ValidationError::UnknownHandle {
                    kind: Framebuffer::KIND,
                    id,
                })?;
                if ctx.framebuffer_cache.lookup(&entry.cached).is_none() {
                    return Err(ValidationError::StaleFramebuffer(id));
                }
            }
        }
    }
    Ok(())
}

impl<'a> Queue<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    /// Replays `buffers` in order and, when given, arms `fence` to signal after the last one.
    ///
    /// Every buffer is validated before anything executes: all must be executable and every
    /// handle they recorded must still be alive and bound. Writes to coherent memory are
    /// flushed before replay. Instruction failures during replay do not fail the submission;
    /// they are returned in the report.
    pub fn submit(
        &self,
        buffers: &[&CommandBuffer],
        fence: Option<&Fence>,
    ) -> Result<SubmitReport> {
        if buffers
            .iter()
            .any(|cb| cb.state() != RecordingState::Executable)
        {
            return Err(ValidationError::NotExecutable.into());
        }

        let mut ctx = self.device.context();
        for cb in buffers {
            check_referenced(&ctx, cb.referenced())?;
        }
        if let Some(fence) = fence {
            let entry = ctx
                .fences
                .get(&fence.id())
                .ok_or(ValidationError::UnknownHandle {
                    kind: Fence::KIND,
                    id: fence.id(),
                })?;
            if entry.sync.is_some() && !entry.signaled {
                return Err(ValidationError::FenceInUse(fence.id()).into());
            }
        }

        ctx.flush_coherent()?;

        let mut report = SubmitReport::default();
        for cb in buffers {
            let replayed = replay(&mut ctx, cb.commands());
            tracing::trace!(
                command_buffer = cb.id(),
                instructions = replayed.instructions_replayed,
                events = replayed.events.len(),
                "replayed"
            );
            report.replays.push(replayed);
        }

        if let Some(fence) = fence {
            let Context { gl, fences, .. } = &mut *ctx;
            let sync = gl.fence_sync();
            if let Some(entry) = fences.get_mut(&fence.id()) {
                if let Some(stale) = entry.sync.replace(sync) {
                    gl.delete_sync(stale);
                }
                entry.signaled = false;
            }
        }
        ctx.gl.flush();
        ctx.stats.inc_submissions();

        tracing::debug!(
            command_buffers = buffers.len(),
            instructions = report.instructions_replayed(),
            ok = report.is_ok(),
            "submitted"
        );
        Ok(report)
    }

    /// Blocks until everything submitted so far has executed.
    pub fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }
}
