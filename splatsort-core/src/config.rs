//! Depth sort configuration

/// How a completed sort is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyMode {
    /// No verification
    Off,
    /// Depths read in drawing order must be non-decreasing
    #[default]
    Monotonic,
    /// Monotonic check plus comparison against the sequential reference sort
    Reference,
}

/// When a new sort is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResortPolicy {
    /// Only after the camera moved, the dataset changed or a re-sort was forced
    #[default]
    OnChange,
    EveryFrame,
}

/// Configuration shared by the CPU and GPU depth sorters
#[derive(Debug, Clone)]
pub struct SortConfig {
    pub verify: VerifyMode,
    /// Verify every `verify_interval` sorted frames (1 = every frame)
    pub verify_interval: u32,
    /// Compute workgroup size for the GPU transform and sort passes
    pub workgroup_size: u32,
    pub resort: ResortPolicy,
}

impl SortConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_verify_interval(mut self, interval: u32) -> Self {
        self.verify_interval = interval.max(1);
        self
    }

    pub fn with_workgroup_size(mut self, workgroup_size: u32) -> Self {
        self.workgroup_size = workgroup_size;
        self
    }

    pub fn with_resort(mut self, resort: ResortPolicy) -> Self {
        self.resort = resort;
        self
    }

    /// Number of workgroups needed to cover `count` invocations
    pub fn workgroups_for(&self, count: usize) -> u32 {
        count.div_ceil(self.workgroup_size.max(1) as usize) as u32
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            verify: VerifyMode::default(),
            verify_interval: 1,
            workgroup_size: 256,
            resort: ResortPolicy::default(),
        }
    }
}
