//! Headless frame loop: orbit the camera, sort, verify and keep statistics.

use anyhow::{bail, Result};
use splatsort_core::{
    ArcballCamera, CameraInput, DepthSorter, Error, FrameScheduler, SortConfig, SplatSet, Vector2,
    VerificationReport,
};
use std::time::{Duration, Instant};

/// Simulated frame time fed to the camera
const FRAME_DT: f32 = 1.0 / 60.0;

/// How the simulated user moves the camera
#[derive(Debug, Clone, Copy)]
pub struct Orbit {
    /// Horizontal mouse drag per frame, in pixels
    pub drag: f32,
    /// Hold the camera still every `pause_every` frames (0 = never)
    pub pause_every: u64,
}

impl Orbit {
    fn input(&self, frame: u64) -> CameraInput {
        let paused = self.drag == 0.0 || (self.pause_every > 0 && frame % self.pause_every == 0);
        if paused {
            return CameraInput::default();
        }
        CameraInput {
            mouse_delta: Vector2::new(self.drag, 0.0),
            dragging: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStats {
    pub frames: u64,
    pub sorts: u64,
    pub verifications: u64,
    /// Verification readbacks lost to device errors and retried
    pub failed_readbacks: u64,
    pub datasets: u64,
    pub stale_frames: u64,
    pub sort_time: Duration,
}

impl SessionStats {
    pub fn mean_sort_ms(&self) -> f64 {
        if self.sorts == 0 {
            return 0.0;
        }
        self.sort_time.as_secs_f64() * 1000.0 / self.sorts as f64
    }
}

/// Drives one backend through `frames` frames.
pub struct Session<'a> {
    sorter: &'a mut dyn DepthSorter,
    camera: ArcballCamera,
    scheduler: FrameScheduler,
    config: SortConfig,
    stats: SessionStats,
}

impl<'a> Session<'a> {
    pub fn new(sorter: &'a mut dyn DepthSorter, camera: ArcballCamera, config: SortConfig) -> Self {
        Self {
            sorter,
            camera,
            scheduler: FrameScheduler::new(&config),
            config,
            stats: SessionStats::default(),
        }
    }

    /// Install a new dataset between frames and re-center the camera on it
    pub fn switch_dataset(&mut self, splats: &SplatSet) -> Result<()> {
        self.sorter.load(splats)?;
        self.scheduler.dataset_changed();
        self.camera.center = splats.centroid();
        self.camera.update();
        self.stats.datasets += 1;
        Ok(())
    }

    /// Run `frames` frames and wait for the last verification
    pub fn run(mut self, frames: u64, orbit: Orbit) -> Result<SessionStats> {
        self.run_frames(frames, orbit)?;
        self.finish()
    }

    pub fn run_frames(&mut self, frames: u64, orbit: Orbit) -> Result<()> {
        for _ in 0..frames {
            let input = orbit.input(self.scheduler.frame() + 1);
            self.frame(&input)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<SessionStats> {
        let outcome = self.sorter.finish_verification();
        self.record_verification(outcome)?;
        self.stats.stale_frames = self.scheduler.stale_frames();
        Ok(self.stats)
    }

    fn frame(&mut self, input: &CameraInput) -> Result<()> {
        let moved = self.camera.apply_input(input, FRAME_DT);
        let decision = self.scheduler.begin_frame(moved);
        self.stats.frames += 1;
        if !decision.sort {
            return Ok(());
        }

        let started = Instant::now();
        match self.sorter.sort(&self.camera.view_projection()) {
            Ok(()) => {
                self.stats.sort_time += started.elapsed();
                self.stats.sorts += 1;
                self.scheduler.sort_completed();
            }
            Err(e) if e.is_transient() => {
                log::warn!("frame {}: drawing with the previous order: {}", self.scheduler.frame(), e);
                self.scheduler.sort_failed();
                return Ok(());
            }
            Err(e) => return Err(diagnose(e)),
        }

        if decision.verify {
            let outcome = self.sorter.verify(self.config.verify);
            self.record_verification(outcome)?;
        }
        Ok(())
    }

    /// Count a finished check; device errors schedule a retry, anything else ends the run.
    fn record_verification(&mut self, outcome: splatsort_core::Result<Option<VerificationReport>>) -> Result<()> {
        match outcome {
            Ok(Some(report)) => {
                log::debug!("verified {} splats ({:?})", report.checked, report.mode);
                self.stats.verifications += 1;
            }
            Ok(None) => {}
            Err(e) if e.is_transient() => {
                log::warn!("frame {}: verification readback failed, retrying: {}", self.scheduler.frame(), e);
                self.stats.failed_readbacks += 1;
                self.scheduler.verification_failed();
            }
            Err(e) => return Err(diagnose(e)),
        }
        Ok(())
    }
}

/// A wrong order is a bug, not a frame to skip.
fn diagnose(e: Error) -> anyhow::Error {
    match e {
        Error::InvariantViolation(msg) => anyhow::anyhow!("sort produced an invalid order: {}", msg),
        other => other.into(),
    }
}

/// A run that never managed to sort has measured nothing
pub fn check_stats(stats: &SessionStats, frames: u64) -> Result<()> {
    if frames > 0 && stats.sorts == 0 {
        bail!("no frame was sorted in {} frames", frames);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatsort_algorithms::CpuDepthSorter;
    use splatsort_core::{CameraConfig, Matrix4, Point3f, ResortPolicy, Splat, Vector3f, VerifyMode};
    use std::collections::VecDeque;

    /// Backend that replays queued failures before succeeding
    #[derive(Default)]
    struct ScriptedSorter {
        len: usize,
        sort_errors: VecDeque<Error>,
        verify_errors: VecDeque<Error>,
        sorts: u64,
        loads: u64,
    }

    impl DepthSorter for ScriptedSorter {
        fn backend_name(&self) -> &'static str {
            "scripted"
        }

        fn load(&mut self, splats: &SplatSet) -> splatsort_core::Result<()> {
            self.len = splats.len();
            self.loads += 1;
            Ok(())
        }

        fn len(&self) -> usize {
            self.len
        }

        fn sort(&mut self, _view_proj: &Matrix4<f32>) -> splatsort_core::Result<()> {
            match self.sort_errors.pop_front() {
                Some(e) => Err(e),
                None => {
                    self.sorts += 1;
                    Ok(())
                }
            }
        }

        fn verify(&mut self, mode: VerifyMode) -> splatsort_core::Result<Option<VerificationReport>> {
            match self.verify_errors.pop_front() {
                Some(e) => Err(e),
                None => Ok(Some(VerificationReport { mode, checked: self.len })),
            }
        }
    }

    const STILL: Orbit = Orbit { drag: 0.0, pause_every: 0 };

    fn grid(n: usize) -> SplatSet {
        (0..n)
            .map(|i| {
                let t = i as f32;
                Splat::new(Point3f::new(t % 7.0, (t / 7.0).floor() % 5.0, t * 0.01), Vector3f::repeat(0.05))
            })
            .collect()
    }

    #[test]
    fn test_orbit_sorts_every_moving_frame() {
        let config = SortConfig::default().with_verify(VerifyMode::Reference);
        let mut sorter = CpuDepthSorter::new(config.clone()).unwrap();
        let set = grid(200);
        sorter.load(&set).unwrap();
        let camera = ArcballCamera::new(set.centroid(), CameraConfig::default());

        let stats = Session::new(&mut sorter, camera, config)
            .run(10, Orbit { drag: 4.0, pause_every: 0 })
            .unwrap();
        assert_eq!(stats.frames, 10);
        assert_eq!(stats.sorts, 10);
        assert_eq!(stats.verifications, 10);
        assert_eq!(stats.stale_frames, 0);
        check_stats(&stats, 10).unwrap();
    }

    #[test]
    fn test_still_camera_sorts_once() {
        let config = SortConfig::default().with_verify_interval(3);
        let mut sorter = CpuDepthSorter::new(config.clone()).unwrap();
        sorter.load(&grid(50)).unwrap();

        let stats = Session::new(&mut sorter, ArcballCamera::default(), config)
            .run(6, Orbit { drag: 0.0, pause_every: 0 })
            .unwrap();
        assert_eq!(stats.sorts, 1);
        assert_eq!(stats.verifications, 1);
    }

    #[test]
    fn test_every_frame_policy_ignores_pauses() {
        let config = SortConfig::default()
            .with_verify(VerifyMode::Off)
            .with_resort(ResortPolicy::EveryFrame);
        let mut sorter = CpuDepthSorter::new(config.clone()).unwrap();
        sorter.load(&grid(33)).unwrap();

        let stats = Session::new(&mut sorter, ArcballCamera::default(), config)
            .run(8, Orbit { drag: 2.0, pause_every: 2 })
            .unwrap();
        assert_eq!(stats.sorts, 8);
        assert_eq!(stats.verifications, 0);
    }

    #[test]
    fn test_transient_sort_failures_keep_previous_order() {
        let mut sorter = ScriptedSorter {
            len: 4,
            sort_errors: VecDeque::from([Error::Gpu("lost".into()), Error::Gpu("lost".into())]),
            ..Default::default()
        };

        let stats = Session::new(&mut sorter, ArcballCamera::default(), SortConfig::default())
            .run(5, STILL)
            .unwrap();
        assert_eq!(stats.stale_frames, 2);
        // retried on the third frame, then the still camera needs nothing more
        assert_eq!(stats.sorts, 1);
        assert_eq!(stats.verifications, 1);
        assert_eq!(sorter.sorts, 1);
    }

    #[test]
    fn test_invalid_order_ends_the_run() {
        let mut sorter = ScriptedSorter {
            len: 4,
            sort_errors: VecDeque::from([Error::InvariantViolation("perm[1] out of order".into())]),
            ..Default::default()
        };

        let err = Session::new(&mut sorter, ArcballCamera::default(), SortConfig::default())
            .run(3, STILL)
            .unwrap_err();
        assert!(err.to_string().contains("invalid order"));
        assert_eq!(sorter.sorts, 0);
    }

    #[test]
    fn test_failed_readback_is_retried() {
        let mut sorter = ScriptedSorter {
            len: 8,
            verify_errors: VecDeque::from([Error::Gpu("mapping failed".into())]),
            ..Default::default()
        };

        let stats = Session::new(&mut sorter, ArcballCamera::default(), SortConfig::default())
            .run(3, STILL)
            .unwrap();
        assert_eq!(stats.failed_readbacks, 1);
        assert_eq!(stats.sorts, 2);
        assert_eq!(stats.verifications, 1);
        assert_eq!(stats.stale_frames, 0);
    }

    #[test]
    fn test_wrong_verification_ends_the_run() {
        let mut sorter = ScriptedSorter {
            len: 8,
            verify_errors: VecDeque::from([Error::InvariantViolation("not monotonic".into())]),
            ..Default::default()
        };

        let result = Session::new(&mut sorter, ArcballCamera::default(), SortConfig::default()).run(3, STILL);
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_switch_resorts_still_camera() {
        let config = SortConfig::default().with_verify(VerifyMode::Reference);
        let mut sorter = CpuDepthSorter::new(config.clone()).unwrap();
        let first = grid(40);
        let second = grid(90);
        let mut session = Session::new(&mut sorter, ArcballCamera::default(), config);

        session.switch_dataset(&first).unwrap();
        session.run_frames(3, STILL).unwrap();
        session.switch_dataset(&second).unwrap();
        session.run_frames(3, STILL).unwrap();
        let stats = session.finish().unwrap();

        assert_eq!(stats.datasets, 2);
        assert_eq!(stats.sorts, 2);
        assert_eq!(stats.verifications, 2);
        assert_eq!(sorter.len(), 90);
    }
}
