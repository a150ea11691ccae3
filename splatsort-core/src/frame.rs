//! Per-frame sort scheduling

use crate::config::{ResortPolicy, SortConfig, VerifyMode};

/// What the frame loop should do this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameDecision {
    pub sort: bool,
    pub verify: bool,
}

/// Decides when to sort and verify, and tracks frames drawn with a stale order.
///
/// The scheduler is owned by the single-threaded frame loop; sorts of two
/// frames never overlap.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    resort: ResortPolicy,
    verify: VerifyMode,
    verify_interval: u32,
    frame: u64,
    completed_sorts: u64,
    pending_sort: bool,
    retry_verify: bool,
    stale_frames: u64,
}

impl FrameScheduler {
    pub fn new(config: &SortConfig) -> Self {
        Self {
            resort: config.resort,
            verify: config.verify,
            verify_interval: config.verify_interval.max(1),
            frame: 0,
            completed_sorts: 0,
            pending_sort: true,
            retry_verify: false,
            stale_frames: 0,
        }
    }

    /// Start a frame; `camera_moved` comes from the input layer.
    pub fn begin_frame(&mut self, camera_moved: bool) -> FrameDecision {
        self.frame += 1;
        let sort = self.pending_sort || camera_moved || self.resort == ResortPolicy::EveryFrame;
        let verify = sort
            && self.verify != VerifyMode::Off
            && (self.retry_verify || self.completed_sorts % self.verify_interval as u64 == 0);
        if verify {
            self.retry_verify = false;
        }
        FrameDecision { sort, verify }
    }

    /// The readback behind a verification failed; sort and verify again next frame.
    pub fn verification_failed(&mut self) {
        self.pending_sort = true;
        self.retry_verify = true;
    }

    /// A new dataset was installed; the old order is meaningless.
    pub fn dataset_changed(&mut self) {
        self.pending_sort = true;
        self.retry_verify = false;
        self.completed_sorts = 0;
    }

    pub fn sort_completed(&mut self) {
        self.pending_sort = false;
        self.completed_sorts += 1;
    }

    /// The frame keeps drawing with the previous order and retries next frame.
    pub fn sort_failed(&mut self) {
        self.pending_sort = true;
        self.stale_frames += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn completed_sorts(&self) -> u64 {
        self.completed_sorts
    }

    /// Frames that fell back to a previous order after a failed sort
    pub fn stale_frames(&self) -> u64 {
        self.stale_frames
    }
}
