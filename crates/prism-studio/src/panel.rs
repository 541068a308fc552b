//! Keyboard control surface over the parameter registry.
//!
//! Tab / Shift+Tab select a binding, Space flips toggles, Left / Right step
//! numbers by their step size, F1 logs every binding, Escape quits.

use prism_engine::driver::ShutdownToken;
use prism_engine::fx::{BindingKind, Composer, ParamBinding, ParamRegistry};
use prism_engine::input::{InputFrame, InputState, Key};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PanelAction {
    Next,
    Previous,
    Toggle,
    Step(i32),
    Dump,
    Quit,
}

impl PanelAction {
    pub fn from_key(key: Key, shift: bool) -> Option<Self> {
        match key {
            Key::Tab if shift => Some(PanelAction::Previous),
            Key::Tab => Some(PanelAction::Next),
            Key::Space => Some(PanelAction::Toggle),
            Key::ArrowLeft => Some(PanelAction::Step(-1)),
            Key::ArrowRight => Some(PanelAction::Step(1)),
            Key::F1 => Some(PanelAction::Dump),
            Key::Escape => Some(PanelAction::Quit),
            _ => None,
        }
    }
}

/// Keys in the order a frame's presses are applied.
const KEYS: [Key; 6] = [Key::Escape, Key::F1, Key::Tab, Key::Space, Key::ArrowLeft, Key::ArrowRight];

pub struct Panel {
    registry: ParamRegistry,
    selected: usize,
}

impl Panel {
    pub fn new(registry: ParamRegistry) -> Self {
        Self { registry, selected: 0 }
    }

    pub fn selected(&self) -> Option<&ParamBinding> {
        self.registry.bindings().get(self.selected)
    }

    /// Applies this frame's key presses.
    pub fn handle_input(
        &mut self,
        input: &InputState,
        frame: &InputFrame,
        composer: &mut Composer,
        shutdown: &ShutdownToken,
    ) {
        for key in KEYS {
            if !frame.key_pressed(key) {
                continue;
            }
            if let Some(action) = PanelAction::from_key(key, input.modifiers.shift) {
                self.apply(action, composer, shutdown);
            }
        }
    }

    pub fn apply(&mut self, action: PanelAction, composer: &mut Composer, shutdown: &ShutdownToken) {
        let count = self.registry.len();
        match action {
            PanelAction::Quit => {
                log::info!("escape pressed; shutting down");
                shutdown.request();
            }
            PanelAction::Dump => self.log_bindings(composer),
            PanelAction::Next | PanelAction::Previous if count == 0 => {}
            PanelAction::Next => {
                self.selected = (self.selected + 1) % count;
                self.log_selection(composer);
            }
            PanelAction::Previous => {
                self.selected = (self.selected + count - 1) % count;
                self.log_selection(composer);
            }
            PanelAction::Toggle => self.nudge(composer, true, 1),
            PanelAction::Step(steps) => self.nudge(composer, false, steps),
        }
    }

    /// Nudges the selection when its kind matches: a toggle for Space, a number for the arrows.
    fn nudge(&self, composer: &mut Composer, toggle: bool, steps: i32) {
        let Some(binding) = self.selected() else {
            return;
        };
        if (binding.kind == BindingKind::Toggle) != toggle {
            return;
        }
        match self.registry.nudge(composer, self.selected, steps) {
            Ok(value) => log::info!("{} = {value}", binding.label),
            Err(err) => log::warn!("{err}"),
        }
    }

    fn log_selection(&self, composer: &Composer) {
        if let Some(binding) = self.selected() {
            match self.registry.get(composer, self.selected) {
                Ok(value) => log::info!("[{}] {} = {value}", self.selected, binding.label),
                Err(err) => log::warn!("{err}"),
            }
        }
    }

    fn log_bindings(&self, composer: &Composer) {
        for (index, binding) in self.registry.bindings().iter().enumerate() {
            let marker = if index == self.selected { ">" } else { " " };
            let value = match self.registry.get(composer, index) {
                Ok(value) => value.to_string(),
                Err(err) => err.to_string(),
            };
            match binding.range() {
                Some(r) => log::info!("{marker} {} = {value}  [{}, {}] step {}", binding.label, r.min, r.max, r.step),
                None => log::info!("{marker} {} = {value}", binding.label),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_engine::coords::Viewport;
    use prism_engine::device::GpuCapabilities;
    use prism_engine::fx::{build_pipeline, ParamValue, PassSlot, PipelineConfig};

    fn setup() -> (Panel, Composer) {
        let composer = build_pipeline(
            &PipelineConfig::default(),
            Viewport::new(640.0, 480.0, 2.0),
            GpuCapabilities { multisample: false },
            None,
        )
        .unwrap();
        (Panel::new(ParamRegistry::from_composer(&composer)), composer)
    }

    fn value(panel: &Panel, composer: &Composer) -> ParamValue {
        panel.registry.get(composer, panel.selected).unwrap()
    }

    #[test]
    fn key_mapping() {
        assert_eq!(PanelAction::from_key(Key::Tab, false), Some(PanelAction::Next));
        assert_eq!(PanelAction::from_key(Key::Tab, true), Some(PanelAction::Previous));
        assert_eq!(PanelAction::from_key(Key::ArrowLeft, false), Some(PanelAction::Step(-1)));
        assert_eq!(PanelAction::from_key(Key::Enter, false), None);
    }

    #[test]
    fn selection_wraps_both_ways() {
        let (mut panel, mut composer) = setup();
        let shutdown = ShutdownToken::new();
        panel.apply(PanelAction::Previous, &mut composer, &shutdown);
        assert_eq!(panel.selected, panel.registry.len() - 1);
        panel.apply(PanelAction::Next, &mut composer, &shutdown);
        assert_eq!(panel.selected, 0);
    }

    #[test]
    fn space_toggles_the_selected_pass() {
        let (mut panel, mut composer) = setup();
        let shutdown = ShutdownToken::new();
        assert_eq!(panel.selected().unwrap().label, "dotScreenPass");

        panel.apply(PanelAction::Toggle, &mut composer, &shutdown);
        assert!(composer.pass(PassSlot::DotScreen).unwrap().enabled());
        // Arrows leave toggles alone.
        panel.apply(PanelAction::Step(1), &mut composer, &shutdown);
        assert_eq!(value(&panel, &composer), ParamValue::Bool(true));
    }

    #[test]
    fn arrows_step_numbers_and_space_ignores_them() {
        let (mut panel, mut composer) = setup();
        let shutdown = ShutdownToken::new();
        while panel.selected().unwrap().label != "UnrealBloomPassProperties/strength" {
            panel.apply(PanelAction::Next, &mut composer, &shutdown);
        }

        panel.apply(PanelAction::Step(1), &mut composer, &shutdown);
        let ParamValue::Number(v) = value(&panel, &composer) else {
            panic!("expected a number");
        };
        assert!((v - 0.301).abs() < 1e-6);

        panel.apply(PanelAction::Toggle, &mut composer, &shutdown);
        assert_eq!(value(&panel, &composer), ParamValue::Number(v));
    }

    #[test]
    fn escape_requests_shutdown() {
        let (mut panel, mut composer) = setup();
        let shutdown = ShutdownToken::new();
        let frame = InputFrame { keys_pressed: [Key::Escape].into_iter().collect(), ..InputFrame::default() };
        panel.handle_input(&InputState::default(), &frame, &mut composer, &shutdown);
        assert!(shutdown.is_requested());
    }
}
