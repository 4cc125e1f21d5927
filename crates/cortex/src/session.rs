//! Game session: the state the actions act on
//!
//! The session owns the current game state, the phase validator, the latest
//! debounced board and the settings managers. Everything the render loop
//! needs to know is announced as a [`GameEvent`] or published in the next
//! snapshot; the render loop never touches the session.

use crate::actions::ActionContext;
use crate::config::CortexConfig;
use crate::managers::{
    AudioLevel, BrightnessControl, BrightnessOverlay, ColorControl, ColorFilter, ColorMode, VolumeControl,
};
use crate::zones::Screen;
use circuitfarm_kernel::{ObjectMapping, PhaseCatalog, PhaseConfig, PhaseValidator, PhaseVerdict, ZoneObjects};
use crossbeam_channel::Sender;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameState {
    Menu,
    Tutorial { step: usize },
    Phase { id: u32 },
}

impl GameState {
    pub fn screen(&self) -> Screen {
        match self {
            GameState::Menu => Screen::Menu,
            GameState::Tutorial { .. } => Screen::Tutorial,
            GameState::Phase { .. } => Screen::Phase,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Opacity(u8),
    Volume(f32),
    Color(ColorMode),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    StateChanged { from: GameState, to: GameState },
    ExitRequested,
    NarrationRepeated(GameState),
    PhaseValidated(PhaseVerdict),
    SettingChanged(Setting),
}

pub struct GameSession {
    state: GameState,
    running: bool,
    tutorial_steps: Vec<String>,
    start_phase: u32,
    catalog: PhaseCatalog,
    validator: PhaseValidator,
    object_mapping: ObjectMapping,
    zone_objects: ZoneObjects,
    last_verdict: Option<PhaseVerdict>,
    brightness_levels: BTreeMap<String, i32>,
    volume_levels: BTreeMap<String, f32>,
    color_modes: BTreeMap<String, ColorMode>,
    brightness: Box<dyn BrightnessControl>,
    volume: Box<dyn VolumeControl>,
    color: Box<dyn ColorControl>,
    events: Option<Sender<GameEvent>>,
}

impl GameSession {
    pub fn new(config: &CortexConfig, catalog: PhaseCatalog) -> Self {
        Self {
            state: GameState::Menu,
            running: true,
            tutorial_steps: config.tutorial_steps.clone(),
            start_phase: config.start_phase,
            catalog,
            validator: PhaseValidator::new(),
            object_mapping: config.object_mapping.clone(),
            zone_objects: ZoneObjects::new(),
            last_verdict: None,
            brightness_levels: config.brightness_levels.clone(),
            volume_levels: config.volume_levels.clone(),
            color_modes: config.color_modes.clone(),
            brightness: Box::new(BrightnessOverlay::new(config.default_opacity())),
            volume: Box::new(AudioLevel::new(config.default_volume())),
            color: Box::new(ColorFilter::new(config.default_color_mode())),
            events: None,
        }
    }

    /// Swap in the renderer's and mixer's own managers.
    pub fn with_managers(
        mut self,
        brightness: Box<dyn BrightnessControl>,
        volume: Box<dyn VolumeControl>,
        color: Box<dyn ColorControl>,
    ) -> Self {
        self.brightness = brightness;
        self.volume = volume;
        self.color = color;
        self
    }

    pub fn connect_events(&mut self, tx: Sender<GameEvent>) {
        self.events = Some(tx);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tutorial_step_name(&self) -> Option<&str> {
        match self.state {
            GameState::Tutorial { step } => self.tutorial_steps.get(step).map(String::as_str),
            _ => None,
        }
    }

    pub fn current_phase(&self) -> Option<&PhaseConfig> {
        match self.state {
            GameState::Phase { .. } => self.validator.current_phase(),
            _ => None,
        }
    }

    pub fn catalog(&self) -> &PhaseCatalog {
        &self.catalog
    }

    pub fn last_verdict(&self) -> Option<&PhaseVerdict> {
        self.last_verdict.as_ref()
    }

    pub fn should_show_results(&self) -> bool {
        self.validator.should_show_results()
    }

    pub fn zone_objects(&self) -> &ZoneObjects {
        &self.zone_objects
    }

    /// Latest debounced board (zone -> physical label).
    pub fn set_zone_objects(&mut self, objects: ZoneObjects) {
        if objects != self.zone_objects {
            log::info!("Board changed: {:?}", objects);
            self.zone_objects = objects;
        }
    }

    pub fn opacity(&self) -> u8 {
        self.brightness.opacity()
    }

    pub fn brightness_percentage(&self) -> f32 {
        self.brightness.brightness_percentage()
    }

    pub fn volume(&self) -> f32 {
        self.volume.volume()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.mode()
    }

    fn emit(&self, event: GameEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.send(event) {
                log::debug!("Render loop gone, dropping event: {}", e);
            }
        }
    }

    fn transition(&mut self, to: GameState) {
        if let GameState::Phase { id } = to {
            let Some(phase) = self.catalog.get(id).cloned() else {
                log::warn!("Phase {} is not in the catalog, staying in {:?}", id, self.state);
                return;
            };
            if let Err(e) = self.validator.set_phase(phase) {
                log::warn!("Phase {} rejected: {}", id, e);
                return;
            }
            self.last_verdict = None;
        }

        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        log::info!("Game state: {:?} -> {:?}", from, to);
        self.emit(GameEvent::StateChanged { from, to });
    }
}

impl ActionContext for GameSession {
    fn start_game(&mut self) {
        self.transition(GameState::Phase { id: self.start_phase });
    }

    fn open_tutorial(&mut self) {
        self.transition(GameState::Tutorial { step: 0 });
    }

    fn exit_game(&mut self) {
        log::info!("Exiting the game");
        self.running = false;
        self.emit(GameEvent::ExitRequested);
    }

    fn return_to_menu(&mut self) {
        self.transition(GameState::Menu);
    }

    fn validate_circuit(&mut self) {
        if !matches!(self.state, GameState::Phase { .. }) {
            log::debug!("No circuit to validate in {:?}", self.state);
            return;
        }
        let verdict = self.validator.validate_phase(&self.zone_objects, &self.object_mapping);
        log::info!("Validation: {}", verdict.message);
        self.last_verdict = Some(verdict.clone());
        self.emit(GameEvent::PhaseValidated(verdict));
    }

    fn repeat_narration(&mut self) {
        self.emit(GameEvent::NarrationRepeated(self.state));
    }

    fn tutorial_next(&mut self) {
        if let GameState::Tutorial { step } = self.state {
            if step + 1 < self.tutorial_steps.len() {
                self.transition(GameState::Tutorial { step: step + 1 });
            } else {
                self.start_game();
            }
        }
    }

    fn tutorial_previous(&mut self) {
        if let GameState::Tutorial { step } = self.state {
            self.transition(GameState::Tutorial {
                step: step.saturating_sub(1),
            });
        }
    }

    fn tutorial_skip(&mut self) {
        if matches!(self.state, GameState::Tutorial { .. }) {
            self.start_game();
        }
    }

    fn change_brightness(&mut self, object: &str) {
        let Some(&opacity) = self.brightness_levels.get(object) else {
            log::warn!("No brightness level for '{}'", object);
            return;
        };
        if i32::from(self.brightness.opacity()) == opacity.clamp(0, 255) {
            log::debug!("Brightness already at {}", opacity);
            return;
        }
        self.brightness.set_opacity(opacity);
        self.emit(GameEvent::SettingChanged(Setting::Opacity(self.brightness.opacity())));
    }

    fn change_volume(&mut self, object: &str) {
        let Some(&volume) = self.volume_levels.get(object) else {
            log::warn!("No volume level for '{}'", object);
            return;
        };
        if (self.volume.volume() - volume.clamp(0.0, 1.0)).abs() < f32::EPSILON {
            log::debug!("Volume already at {:.2}", volume);
            return;
        }
        self.volume.set_volume(volume);
        self.emit(GameEvent::SettingChanged(Setting::Volume(self.volume.volume())));
    }

    fn change_color(&mut self, object: &str) {
        let Some(&mode) = self.color_modes.get(object) else {
            log::warn!("No color mode for '{}'", object);
            return;
        };
        if self.color.mode() == mode {
            log::debug!("Color mode already {}", mode);
            return;
        }
        self.color.set_mode(mode);
        self.emit(GameEvent::SettingChanged(Setting::Color(mode)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};

    fn session() -> (GameSession, Receiver<GameEvent>) {
        let config = CortexConfig::default();
        let mut session = GameSession::new(&config, PhaseCatalog::builtin());
        let (tx, rx) = unbounded();
        session.connect_events(tx);
        (session, rx)
    }

    fn solved_board() -> ZoneObjects {
        [("INPUT1", "clock"), ("INPUT2", "remote"), ("GATE1", "orange"), ("GATE2", "scissors")]
            .iter()
            .map(|(z, l)| (z.to_string(), Some(l.to_string())))
            .collect()
    }

    #[test]
    fn menu_to_phase_and_back() {
        let (mut s, rx) = session();
        s.start_game();
        assert_eq!(s.state(), GameState::Phase { id: 1 });
        assert_eq!(s.current_phase().map(|p| p.id), Some(1));
        s.return_to_menu();
        assert_eq!(s.state(), GameState::Menu);
        assert!(s.current_phase().is_none());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                GameEvent::StateChanged {
                    from: GameState::Menu,
                    to: GameState::Phase { id: 1 }
                },
                GameEvent::StateChanged {
                    from: GameState::Phase { id: 1 },
                    to: GameState::Menu
                },
            ]
        );
    }

    #[test]
    fn tutorial_navigation() {
        let (mut s, _rx) = session();
        s.tutorial_next();
        assert_eq!(s.state(), GameState::Menu);

        s.open_tutorial();
        assert_eq!(s.tutorial_step_name(), Some("cutscene1"));
        s.tutorial_previous();
        assert_eq!(s.state(), GameState::Tutorial { step: 0 });
        s.tutorial_next();
        s.tutorial_next();
        assert_eq!(s.state(), GameState::Tutorial { step: 2 });
        s.tutorial_previous();
        assert_eq!(s.state(), GameState::Tutorial { step: 1 });

        for _ in 0..10 {
            s.tutorial_next();
        }
        assert_eq!(s.state(), GameState::Phase { id: 1 });

        s.return_to_menu();
        s.open_tutorial();
        s.tutorial_skip();
        assert_eq!(s.state(), GameState::Phase { id: 1 });
    }

    #[test]
    fn validate_uses_the_board() {
        let (mut s, rx) = session();
        s.validate_circuit();
        assert!(s.last_verdict().is_none());

        s.start_game();
        s.set_zone_objects(solved_board());
        s.validate_circuit();
        let verdict = s.last_verdict().unwrap();
        assert!(verdict.success);
        assert!(s.should_show_results());
        assert!(rx.try_iter().any(|e| matches!(e, GameEvent::PhaseValidated(v) if v.success)));
    }

    #[test]
    fn changers_skip_redundant_writes() {
        let (mut s, rx) = session();
        assert_eq!(s.opacity(), 0);
        s.change_brightness("cup");
        s.change_brightness("book");
        s.change_brightness("book");
        s.change_brightness("unknown");
        assert_eq!(s.opacity(), 180);

        s.change_volume("apple");
        s.change_volume("mouse");
        assert_eq!(s.volume(), 0.5);

        s.change_color("teddy bear");
        s.change_color("toothbrush");
        assert_eq!(s.color_mode(), ColorMode::Grayscale);

        let settings: Vec<_> = rx
            .try_iter()
            .filter_map(|e| match e {
                GameEvent::SettingChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            settings,
            vec![
                Setting::Opacity(180),
                Setting::Volume(0.5),
                Setting::Color(ColorMode::Grayscale)
            ]
        );
    }

    #[test]
    fn exit_stops_the_session() {
        let (mut s, rx) = session();
        s.exit_game();
        assert!(!s.is_running());
        assert_eq!(rx.try_recv().ok(), Some(GameEvent::ExitRequested));
    }

    #[test]
    fn missing_phase_keeps_state() {
        let mut config = CortexConfig::default();
        config.start_phase = 9;
        let mut s = GameSession::new(&config, PhaseCatalog::builtin());
        s.start_game();
        assert_eq!(s.state(), GameState::Menu);
    }
}
