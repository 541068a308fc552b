use crate::coords::Viewport;
use crate::core::{AppControl, FrameCtx};
use crate::fx::{Composer, SceneView};
use crate::input::{InputFrame, InputState};
use crate::scene::{OrbitControls, PerspectiveCamera, Scene};
use crate::time::FrameTime;

use super::shutdown::ShutdownToken;

/// Everything one frame reads or mutates, constructed once at startup.
pub struct Stage {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub composer: Composer,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    /// Before the first step.
    Idle,
    Running,
    /// Shutdown was observed; no further frames are produced.
    Stopped,
}

/// Result of the CPU half of a step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepOutcome {
    Render,
    Stop,
}

/// Drives one [`Stage`]. Each running step updates the camera controls, then
/// renders the composer into the window surface.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    shutdown: ShutdownToken,
    elapsed: f32,
    frames: u64,
}

impl FrameDriver {
    pub fn new(shutdown: ShutdownToken) -> Self {
        Self {
            state: DriverState::Idle,
            shutdown,
            elapsed: 0.0,
            frames: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Seconds elapsed at the last running step.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of running steps taken.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Checks for shutdown and advances time and camera controls.
    pub fn advance(
        &mut self,
        stage: &mut Stage,
        time: FrameTime,
        input: &InputState,
        frame: &InputFrame,
        viewport: Viewport,
    ) -> StepOutcome {
        if self.shutdown.is_requested() {
            if self.state != DriverState::Stopped {
                log::info!("frame driver stopping after {} frames", self.frames);
                self.state = DriverState::Stopped;
            }
            return StepOutcome::Stop;
        }
        if self.state == DriverState::Idle {
            log::info!("frame driver running");
            self.state = DriverState::Running;
        }

        // Clock time is monotonic already; guard against a reset clock anyway.
        self.elapsed = self.elapsed.max(time.elapsed);
        self.frames += 1;

        stage.controls.handle_input(input, frame, viewport, &stage.camera);
        stage.controls.update(&mut stage.camera);
        StepOutcome::Render
    }

    /// One full step: [`advance`](Self::advance), then render.
    pub fn step(&mut self, stage: &mut Stage, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.advance(stage, ctx.time, ctx.input, ctx.input_frame, ctx.viewport) == StepOutcome::Stop {
            return AppControl::Exit;
        }

        let view = SceneView {
            scene: &stage.scene,
            camera: &stage.camera,
            elapsed: self.elapsed,
        };
        let composer = &mut stage.composer;
        ctx.render(|rctx, target| match composer.render(rctx, target, view) {
            Ok(()) => AppControl::Continue,
            Err(err) => {
                log::error!("pipeline failed: {err}");
                AppControl::Exit
            }
        })
    }

    /// Propagates a viewport change to the camera and the composer.
    pub fn resize(&mut self, stage: &mut Stage, viewport: Viewport) {
        if !viewport.is_valid() {
            return;
        }
        stage.camera.set_aspect(viewport.aspect());
        stage.composer.resize(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GpuCapabilities;
    use crate::fx::{build_pipeline, PipelineConfig};
    use crate::input::MouseButton;
    use crate::scene::CameraConfig;
    use crate::time::FrameClock;
    use glam::Vec3;

    fn stage(viewport: Viewport) -> Stage {
        let composer = build_pipeline(
            &PipelineConfig::default(),
            viewport,
            GpuCapabilities { multisample: true },
            None,
        )
        .unwrap();
        Stage {
            scene: Scene::new(),
            camera: PerspectiveCamera::new(&CameraConfig::default(), viewport.aspect()),
            controls: OrbitControls::new(Vec3::ZERO),
            composer,
        }
    }

    fn tick(driver: &mut FrameDriver, stage: &mut Stage, clock: &mut FrameClock, frame: &InputFrame) -> StepOutcome {
        let viewport = stage.composer.viewport();
        driver.advance(stage, clock.tick(), &InputState::default(), frame, viewport)
    }

    // ── state machine ────────────────────────────────────────────────────

    #[test]
    fn idle_until_first_step() {
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        let mut stage = stage(viewport);
        let mut driver = FrameDriver::new(ShutdownToken::new());
        let mut clock = FrameClock::new();
        assert_eq!(driver.state(), DriverState::Idle);

        assert_eq!(tick(&mut driver, &mut stage, &mut clock, &InputFrame::default()), StepOutcome::Render);
        assert_eq!(driver.state(), DriverState::Running);
        tick(&mut driver, &mut stage, &mut clock, &InputFrame::default());
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(driver.frames(), 2);
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut stage = stage(Viewport::new(800.0, 600.0, 1.0));
        let token = ShutdownToken::new();
        let mut driver = FrameDriver::new(token.clone());
        let mut clock = FrameClock::new();

        tick(&mut driver, &mut stage, &mut clock, &InputFrame::default());
        token.request();
        assert_eq!(tick(&mut driver, &mut stage, &mut clock, &InputFrame::default()), StepOutcome::Stop);
        assert_eq!(driver.state(), DriverState::Stopped);
        assert_eq!(tick(&mut driver, &mut stage, &mut clock, &InputFrame::default()), StepOutcome::Stop);
        assert_eq!(driver.frames(), 1);
    }

    #[test]
    fn shutdown_before_first_step_never_runs() {
        let mut stage = stage(Viewport::new(800.0, 600.0, 1.0));
        let token = ShutdownToken::new();
        token.request();
        let mut driver = FrameDriver::new(token);
        let mut clock = FrameClock::new();
        assert_eq!(tick(&mut driver, &mut stage, &mut clock, &InputFrame::default()), StepOutcome::Stop);
        assert_eq!(driver.state(), DriverState::Stopped);
    }

    #[test]
    fn elapsed_never_decreases() {
        let mut stage = stage(Viewport::new(800.0, 600.0, 1.0));
        let mut driver = FrameDriver::new(ShutdownToken::new());
        let mut clock = FrameClock::new();

        let mut last = 0.0;
        for _ in 0..5 {
            tick(&mut driver, &mut stage, &mut clock, &InputFrame::default());
            assert!(driver.elapsed() >= last);
            last = driver.elapsed();
        }
    }

    // ── controls ─────────────────────────────────────────────────────────

    #[test]
    fn drag_moves_the_camera_over_several_steps() {
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        let mut stage = stage(viewport);
        let mut driver = FrameDriver::new(ShutdownToken::new());
        let start = stage.camera.position;

        let mut input = InputState::default();
        input.buttons_down.insert(MouseButton::Left);
        let frame = InputFrame { pointer_delta: (40.0, 0.0), ..InputFrame::default() };
        driver.advance(&mut stage, FrameClock::new().tick(), &input, &frame, viewport);
        let after_drag = stage.camera.position;
        assert_ne!(after_drag, start);

        // Damping keeps the camera moving without further input.
        let mut clock = FrameClock::new();
        tick(&mut driver, &mut stage, &mut clock, &InputFrame::default());
        assert_ne!(stage.camera.position, after_drag);
        let distance = (stage.camera.position - stage.controls.target).length();
        assert!((distance - start.length()).abs() < 1e-3);
    }

    // ── resize ───────────────────────────────────────────────────────────

    #[test]
    fn resize_updates_camera_and_composer() {
        let mut stage = stage(Viewport::new(800.0, 600.0, 1.0));
        let mut driver = FrameDriver::new(ShutdownToken::new());

        let wide = Viewport::new(1600.0, 400.0, 1.0);
        driver.resize(&mut stage, wide);
        assert_eq!(stage.camera.aspect, 4.0);
        assert_eq!(stage.composer.viewport(), wide);
        assert_eq!(stage.composer.target().size(), (1600, 400));
    }

    #[test]
    fn degenerate_resize_is_ignored() {
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        let mut stage = stage(viewport);
        let mut driver = FrameDriver::new(ShutdownToken::new());
        driver.resize(&mut stage, Viewport::new(0.0, 600.0, 1.0));
        assert_eq!(stage.composer.viewport(), viewport);
    }
}
