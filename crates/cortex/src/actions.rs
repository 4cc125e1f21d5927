//! Actions and the per-screen routing table
//!
//! An [`Action`] knows which recognition names trigger it and what it does to
//! an [`ActionContext`]. The set of actions is closed; routing from a
//! (screen, zone) pair to candidate actions is plain data, kept in authored
//! order because the first matching action wins.

use crate::config::CortexConfig;
use crate::types::RecognitionKind;
use crate::zones::Screen;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub const GESTURE_ZONE: &str = "GESTOS";
pub const VOLUME_ZONE: &str = "SOM";
pub const BRIGHTNESS_ZONE: &str = "BRILHO";
pub const COLOR_ZONE: &str = "CORES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionId {
    StartGame,
    OpenTutorial,
    ExitGame,
    ReturnMenu,
    ValidateCircuit,
    RepeatNarration,
    TutorialNext,
    TutorialPrevious,
    TutorialSkip,
    ChangeBrightness,
    ChangeVolume,
    ChangeColor,
}

impl ActionId {
    pub const ALL: [ActionId; 12] = [
        ActionId::StartGame,
        ActionId::OpenTutorial,
        ActionId::ExitGame,
        ActionId::ReturnMenu,
        ActionId::ValidateCircuit,
        ActionId::RepeatNarration,
        ActionId::TutorialNext,
        ActionId::TutorialPrevious,
        ActionId::TutorialSkip,
        ActionId::ChangeBrightness,
        ActionId::ChangeVolume,
        ActionId::ChangeColor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::StartGame => "START_GAME",
            ActionId::OpenTutorial => "OPEN_TUTORIAL",
            ActionId::ExitGame => "EXIT_GAME",
            ActionId::ReturnMenu => "RETURN_MENU",
            ActionId::ValidateCircuit => "VALIDATE_CIRCUIT",
            ActionId::RepeatNarration => "REPEAT_NARRATION",
            ActionId::TutorialNext => "TUTORIAL_NEXT",
            ActionId::TutorialPrevious => "TUTORIAL_PREVIOUS",
            ActionId::TutorialSkip => "TUTORIAL_SKIP",
            ActionId::ChangeBrightness => "CHANGE_BRIGHTNESS",
            ActionId::ChangeVolume => "CHANGE_VOLUME",
            ActionId::ChangeColor => "CHANGE_COLOR",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What actions can do to the game. Implemented by the game session.
pub trait ActionContext {
    fn start_game(&mut self);
    fn open_tutorial(&mut self);
    fn exit_game(&mut self);
    fn return_to_menu(&mut self);
    fn validate_circuit(&mut self);
    fn repeat_narration(&mut self);
    fn tutorial_next(&mut self);
    fn tutorial_previous(&mut self);
    fn tutorial_skip(&mut self);
    /// `object` is the physical label selecting the level
    fn change_brightness(&mut self, object: &str);
    fn change_volume(&mut self, object: &str);
    fn change_color(&mut self, object: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: ActionId,
    pub kind: RecognitionKind,
    pub names: BTreeSet<String>,
    pub description: String,
}

impl Action {
    pub fn new(id: ActionId, kind: RecognitionKind, names: &[&str], description: &str) -> Self {
        Self {
            id,
            kind,
            names: names.iter().map(|s| s.to_string()).collect(),
            description: description.to_string(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn execute(&self, ctx: &mut dyn ActionContext, name: &str) {
        match self.id {
            ActionId::StartGame => ctx.start_game(),
            ActionId::OpenTutorial => ctx.open_tutorial(),
            ActionId::ExitGame => ctx.exit_game(),
            ActionId::ReturnMenu => ctx.return_to_menu(),
            ActionId::ValidateCircuit => ctx.validate_circuit(),
            ActionId::RepeatNarration => ctx.repeat_narration(),
            ActionId::TutorialNext => ctx.tutorial_next(),
            ActionId::TutorialPrevious => ctx.tutorial_previous(),
            ActionId::TutorialSkip => ctx.tutorial_skip(),
            ActionId::ChangeBrightness => ctx.change_brightness(name),
            ActionId::ChangeVolume => ctx.change_volume(name),
            ActionId::ChangeColor => ctx.change_color(name),
        }
    }
}

/// Every action, keyed by id. Read-only once built.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    actions: HashMap<ActionId, Action>,
}

impl ActionRegistry {
    pub fn from_config(config: &CortexConfig) -> Self {
        use RecognitionKind::{Gesture, Object};

        let brightness: Vec<&str> = config.brightness_levels.keys().map(String::as_str).collect();
        let volume: Vec<&str> = config.volume_levels.keys().map(String::as_str).collect();
        let color: Vec<&str> = config.color_modes.keys().map(String::as_str).collect();

        let actions = [
            Action::new(ActionId::StartGame, Gesture, &["ILoveYou"], "Start the game"),
            Action::new(ActionId::OpenTutorial, Gesture, &["Closed_Fist"], "Open the tutorial"),
            Action::new(ActionId::ExitGame, Gesture, &["Victory"], "Exit the game"),
            Action::new(ActionId::ReturnMenu, Gesture, &["Victory"], "Return to the menu"),
            Action::new(ActionId::ValidateCircuit, Gesture, &["Open_Palm"], "Check the circuit"),
            Action::new(ActionId::RepeatNarration, Gesture, &["Pointing_Up"], "Repeat the narration"),
            Action::new(ActionId::TutorialNext, Gesture, &["Thumb_Up"], "Next tutorial step"),
            Action::new(ActionId::TutorialPrevious, Gesture, &["Thumb_Down"], "Previous tutorial step"),
            Action::new(ActionId::TutorialSkip, Gesture, &["ILoveYou"], "Skip the tutorial"),
            Action::new(ActionId::ChangeBrightness, Object, &brightness, "Change brightness"),
            Action::new(ActionId::ChangeVolume, Object, &volume, "Change volume"),
            Action::new(ActionId::ChangeColor, Object, &color, "Change color mode"),
        ];

        Self {
            actions: actions.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(&id)
    }

    /// Names accepted by any of `ids` for the given recognition kind.
    pub fn names_for(&self, ids: &[ActionId], kind: RecognitionKind) -> BTreeSet<String> {
        ids.iter()
            .filter_map(|id| self.get(*id))
            .filter(|a| a.kind == kind)
            .flat_map(|a| a.names.iter().cloned())
            .collect()
    }
}

/// (screen, zone) -> candidate actions, in priority order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<(Screen, String), Vec<ActionId>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The game's routing: navigation gestures in the gesture zone, settings
    /// objects in their zones on every screen.
    pub fn standard() -> Self {
        use ActionId::*;

        let mut table = Self::new();
        table.insert(Screen::Menu, GESTURE_ZONE, &[StartGame, OpenTutorial, ExitGame]);
        table.insert(
            Screen::Tutorial,
            GESTURE_ZONE,
            &[TutorialNext, TutorialPrevious, TutorialSkip, ReturnMenu, RepeatNarration],
        );
        table.insert(Screen::Phase, GESTURE_ZONE, &[ValidateCircuit, ReturnMenu, RepeatNarration]);
        for screen in Screen::ALL {
            table.insert(screen, BRIGHTNESS_ZONE, &[ChangeBrightness]);
            table.insert(screen, VOLUME_ZONE, &[ChangeVolume]);
            table.insert(screen, COLOR_ZONE, &[ChangeColor]);
        }
        table
    }

    pub fn insert(&mut self, screen: Screen, zone: &str, actions: &[ActionId]) {
        self.routes.insert((screen, zone.to_string()), actions.to_vec());
    }

    pub fn actions_for(&self, screen: Screen, zone: &str) -> &[ActionId] {
        self.routes
            .get(&(screen, zone.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
