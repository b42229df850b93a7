//! Frame submission protocol.
//!
//! [`submit_frame`] drives one frame through a [`FrameBackend`] in a fixed
//! order and owns the only recovery path the renderer has: rebuilding the
//! swapchain when the surface goes stale. Everything else a backend reports
//! is fatal and propagates to the caller.
//!
//! # Per-slot state machine
//!
//! ```text
//! Idle (fence signaled) --record--> Recording --submit--> Submitted
//!   ^                                                        |
//!   +--------------------- fence signals --------------------+
//! ```
//!
//! [`submit_frame_retrying`] is the caller side of the recovery path: after a
//! stale acquire it submits the same payload once more on the rebuilt
//! swapchain.
//!
//! The fence wait precedes both re-recording and the uniform upload, so the
//! CPU never touches a command buffer or uniform buffer the GPU may still be
//! reading.

use tracing::debug;

use ripples_rhi::RhiResult;

use crate::ubo::Ubo;

/// Result of asking the swapchain for the next image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquire {
    /// The image at this index is ours once its acquire semaphore signals.
    /// A suboptimal swapchain still hands out usable images.
    Image(u32),
    /// The surface changed; no image was acquired.
    OutOfDate,
}

/// Result of queueing an image for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Present {
    Presented,
    /// The image was queued (or dropped), but the swapchain is out of date
    /// or suboptimal and must be rebuilt before the next frame.
    NeedsRecreate,
}

/// What happened to one call of [`submit_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame reached the presentation engine.
    Presented,
    /// Acquisition found a stale swapchain. It has been rebuilt, nothing was
    /// drawn, and the caller should submit again.
    Retry,
    /// The frame was presented and the swapchain rebuilt afterwards.
    Recreated,
}

/// GPU-side steps of a frame, one method per step of [`submit_frame`].
///
/// `image_index` always names the slot returned by the preceding
/// [`acquire`](Self::acquire).
pub trait FrameBackend {
    fn acquire(&mut self) -> RhiResult<Acquire>;

    /// Blocks until the slot's previous submission has finished on the GPU.
    fn wait_for_slot(&mut self, image_index: u32) -> RhiResult<()>;

    /// Re-records the slot's command buffer.
    fn record(&mut self, image_index: u32) -> RhiResult<()>;

    /// Overwrites the slot's uniform buffer with `ubo`.
    fn upload(&mut self, image_index: u32, ubo: &Ubo) -> RhiResult<()>;

    /// Submits the slot's command buffer, signalling its fence and
    /// render-finished semaphore.
    fn submit(&mut self, image_index: u32) -> RhiResult<()>;

    fn present(&mut self, image_index: u32) -> RhiResult<Present>;

    /// Rebuilds the swapchain and everything derived from it.
    fn recreate_swapchain(&mut self) -> RhiResult<()>;
}

/// Drives one frame: acquire, wait, record, upload, submit, present.
pub fn submit_frame<B>(backend: &mut B, ubo: &Ubo) -> RhiResult<FrameStatus>
where
    B: FrameBackend + ?Sized,
{
    let image_index = match backend.acquire()? {
        Acquire::Image(index) => index,
        Acquire::OutOfDate => {
            debug!("Swapchain out of date during acquire, recreating");
            backend.recreate_swapchain()?;
            return Ok(FrameStatus::Retry);
        }
    };

    backend.wait_for_slot(image_index)?;
    backend.record(image_index)?;
    backend.upload(image_index, ubo)?;
    backend.submit(image_index)?;

    match backend.present(image_index)? {
        Present::Presented => Ok(FrameStatus::Presented),
        Present::NeedsRecreate => {
            debug!("Swapchain stale after present, recreating");
            backend.recreate_swapchain()?;
            Ok(FrameStatus::Recreated)
        }
    }
}

/// Like [`submit_frame`], but a [`FrameStatus::Retry`] is followed by exactly
/// one more attempt with the same `ubo`.
///
/// Returns `Retry` only if the rebuilt swapchain is stale again on the second
/// acquire; the frame is then dropped and the next one starts fresh.
pub fn submit_frame_retrying<B>(backend: &mut B, ubo: &Ubo) -> RhiResult<FrameStatus>
where
    B: FrameBackend + ?Sized,
{
    match submit_frame(backend, ubo)? {
        FrameStatus::Retry => {
            debug!("Retrying frame on the rebuilt swapchain");
            submit_frame(backend, ubo)
        }
        status => Ok(status),
    }
}
