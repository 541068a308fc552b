use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;
use winit::event::WindowEvent;

use prism_engine::assets::{load_gltf, CubeMapData, ModelData, NormalMap, Pending};
use prism_engine::coords::Viewport;
use prism_engine::core::{App, AppControl, FrameCtx, StartCtx};
use prism_engine::driver::{FrameDriver, ShutdownToken, Stage};
use prism_engine::fx::{build_pipeline, ParamRegistry, TARGET_FORMAT};
use prism_engine::scene::{OrbitControls, PerspectiveCamera, Placement, Scene};

use crate::config::StudioConfig;
use crate::panel::Panel;

/// The viewer: owns the stage, the frame driver and in-flight asset loads.
pub struct StudioApp {
    config: StudioConfig,
    shutdown: ShutdownToken,
    driver: FrameDriver,
    stage: Option<Stage>,
    panel: Option<Panel>,
    model: Option<Pending<ModelData>>,
    environment: Option<Pending<CubeMapData>>,
}

impl StudioApp {
    pub fn new(config: StudioConfig) -> Self {
        let shutdown = ShutdownToken::new();
        Self {
            config,
            driver: FrameDriver::new(shutdown.clone()),
            shutdown,
            stage: None,
            panel: None,
            model: None,
            environment: None,
        }
    }

    fn spawn_loads(&mut self) {
        let assets = &self.config.assets;

        let path = assets.model.clone();
        log::info!("loading model {}", path.display());
        self.model = Some(Pending::spawn("model", move || load_gltf(path)));

        let dir = assets.environment.clone();
        let faces = assets.environment_faces.clone();
        log::info!("loading environment map from {}", dir.display());
        self.environment = Some(Pending::spawn("environment map", move || CubeMapData::load(dir, &faces)));
    }

    /// Moves finished loads into the scene. Failures leave the scene without that asset.
    fn poll_loads(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };

        if let Some(result) = self.environment.as_mut().and_then(Pending::poll) {
            match result {
                Ok(cube) => {
                    log::info!("environment map ready ({}px faces)", cube.face_size());
                    stage.scene.set_environment(Some(Arc::new(cube)));
                }
                Err(err) => log::error!("environment map unavailable: {err}"),
            }
            self.environment = None;
        }

        if let Some(result) = self.model.as_mut().and_then(Pending::poll) {
            match result {
                Ok(model) => {
                    let placement = Placement {
                        scale: self.config.model.scale,
                        rotation_y: self.config.model.rotation_y,
                        translation: Vec3::ZERO,
                    };
                    let model = model.place(placement.matrix());
                    log::info!("model ready: {} meshes", model.nodes.len());
                    stage.scene.extend(model.nodes);
                    let updated = stage.scene.update_all_materials(self.config.model.env_map_intensity);
                    log::debug!("updated {updated} materials");
                }
                Err(err) => log::error!("model unavailable: {err}"),
            }
            self.model = None;
        }
    }
}

impl App for StudioApp {
    fn on_start(&mut self, ctx: StartCtx<'_, '_>) -> Result<()> {
        let normal_map = match NormalMap::load(&self.config.assets.normal_map) {
            Ok(map) => Some(map),
            Err(err) => {
                log::error!("{err}");
                None
            }
        };

        let caps = ctx.gpu.capabilities(TARGET_FORMAT);
        let composer = build_pipeline(&self.config.pipeline, ctx.viewport, caps, normal_map.as_ref())
            .context("invalid effect pipeline")?;

        let mut scene = Scene::new();
        scene.add_light(self.config.light.clone());

        let camera = PerspectiveCamera::new(&self.config.camera, ctx.viewport.aspect());
        let mut controls = OrbitControls::new(Vec3::from_array(self.config.camera.target));
        controls.enable_damping = true;
        controls.damping_factor = self.config.orbit_damping;

        self.panel = Some(Panel::new(ParamRegistry::from_composer(&composer)));
        self.stage = Some(Stage { scene, camera, controls, composer });
        self.spawn_loads();

        log::info!("press F1 to list parameters, Tab to select, Space/arrows to change");
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::CloseRequested = event {
            self.shutdown.request();
        }
        AppControl::Continue
    }

    fn on_resize(&mut self, viewport: Viewport) {
        if let Some(stage) = self.stage.as_mut() {
            self.driver.resize(stage, viewport);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.poll_loads();

        let Some(stage) = self.stage.as_mut() else {
            return AppControl::Continue;
        };
        if let Some(panel) = self.panel.as_mut() {
            panel.handle_input(ctx.input, ctx.input_frame, &mut stage.composer, &self.shutdown);
        }
        self.driver.step(stage, ctx)
    }
}
