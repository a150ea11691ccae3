//! CPU depth sorter backend

use crate::depth::transform_depths;
use crate::executor::execute_plan;
use crate::oracle::verify_order;
use crate::plan::SortPlan;
use nalgebra::Matrix4;
use splatsort_core::{
    DepthSorter, IndexPermutation, Result, SortConfig, Splat, SplatSet, VerificationReport, VerifyMode,
};

/// Keeps a dataset resident in host memory and sorts it with the rayon
/// bitonic executor.
#[derive(Debug, Clone)]
pub struct CpuDepthSorter {
    config: SortConfig,
    splats: Vec<Splat>,
    plan: SortPlan,
    depths: Vec<f32>,
    order: IndexPermutation,
    sorted: bool,
}

impl CpuDepthSorter {
    pub fn new(config: SortConfig) -> Result<Self> {
        Ok(Self {
            config,
            splats: Vec::new(),
            plan: SortPlan::new(0)?,
            depths: Vec::new(),
            order: IndexPermutation::default(),
            sorted: false,
        })
    }

    /// Current drawing order, valid until the next sort
    pub fn order(&self) -> &IndexPermutation {
        &self.order
    }

    /// Depth keys from the most recent transform
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    pub fn plan(&self) -> &SortPlan {
        &self.plan
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }
}

impl DepthSorter for CpuDepthSorter {
    fn backend_name(&self) -> &'static str {
        "cpu"
    }

    fn load(&mut self, splats: &SplatSet) -> Result<()> {
        let plan = SortPlan::new(splats.len())?;
        let order = IndexPermutation::identity(splats.len())?;

        log::info!(
            "cpu sorter: loaded {} splats, {} bitonic stages",
            splats.len(),
            plan.stage_count()
        );
        self.splats = splats.as_slice().to_vec();
        self.depths = vec![0.0; splats.len()];
        self.plan = plan;
        self.order = order;
        self.sorted = false;
        Ok(())
    }

    fn len(&self) -> usize {
        self.splats.len()
    }

    fn sort(&mut self, view_proj: &Matrix4<f32>) -> Result<()> {
        self.sorted = false;
        transform_depths(&self.splats, view_proj, &mut self.depths)?;
        // start from the previous frame's order; small camera moves leave little to swap
        execute_plan(&self.plan, &self.depths, &mut self.order)?;
        debug_assert!(self.order.is_bijection(), "bitonic stages produced a non-permutation");
        self.sorted = true;
        log::debug!("cpu sorter: sorted {} splats", self.splats.len());
        Ok(())
    }

    fn verify(&mut self, mode: VerifyMode) -> Result<Option<VerificationReport>> {
        if !self.sorted {
            return Ok(None);
        }
        verify_order(mode, &self.depths, self.order.as_slice())
    }
}
