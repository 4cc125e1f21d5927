//! Action dispatch
//!
//! Routes a committed recognition to the first matching action of its
//! (screen, zone) and runs it. A second cooldown, keyed by (name, zone)
//! regardless of which entity fired, keeps two hands or two objects from
//! triggering the same zone action back to back.

use crate::actions::{ActionContext, ActionId, ActionRegistry, RouteTable};
use crate::recognition::Recognition;
use crate::types::{EntityKey, RecognitionKind};
use crate::zones::Screen;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// One entry of the recent-recognitions list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionRecord {
    pub kind: RecognitionKind,
    pub name: String,
    pub zone: String,
    pub entity: EntityKey,
    #[serde(skip)]
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Same (name, zone) fired too recently
    CoolingDown,
    /// Nothing routed here accepts the name
    NoMatch,
    Executed(ActionId),
}

pub struct ActionDispatcher {
    registry: ActionRegistry,
    routes: RouteTable,
    cooldown: Duration,
    last_fired: HashMap<(String, String), Instant>,
    history: VecDeque<RecognitionRecord>,
    capacity: usize,
}

impl ActionDispatcher {
    pub fn new(registry: ActionRegistry, routes: RouteTable, cooldown: Duration, capacity: usize) -> Self {
        Self {
            registry,
            routes,
            cooldown,
            last_fired: HashMap::new(),
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn execute_action(
        &mut self,
        recognition: &Recognition,
        screen: Screen,
        ctx: &mut dyn ActionContext,
    ) -> DispatchOutcome {
        let now = recognition.at;
        let key = (recognition.name.clone(), recognition.zone.clone());
        if self.is_on_cooldown(&key, now) {
            log::debug!("{} | {} on cooldown", recognition.name, recognition.zone);
            return DispatchOutcome::CoolingDown;
        }

        self.push_history(recognition);
        log::info!(
            "Action detected ({}): {} | {} | {} | screen {:?}",
            recognition.kind,
            recognition.name,
            recognition.zone,
            recognition.entity,
            screen
        );

        let routed = self.routes.actions_for(screen, &recognition.zone);
        let matched = routed
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .find(|action| action.kind == recognition.kind && action.matches(&recognition.name));

        let outcome = match matched {
            Some(action) => {
                log::info!("Executing {}: {}", action.id, action.description);
                action.execute(ctx, &recognition.name);
                DispatchOutcome::Executed(action.id)
            }
            None if routed.is_empty() => {
                log::debug!("Zone {} has no actions on screen {:?}", recognition.zone, screen);
                DispatchOutcome::NoMatch
            }
            None => {
                log::warn!(
                    "{} '{}' has no action in zone {} on screen {:?}",
                    recognition.kind,
                    recognition.name,
                    recognition.zone,
                    screen
                );
                DispatchOutcome::NoMatch
            }
        };

        self.last_fired.insert(key, now);
        outcome
    }

    fn is_on_cooldown(&self, key: &(String, String), now: Instant) -> bool {
        self.last_fired
            .get(key)
            .map(|&last| now.saturating_duration_since(last) < self.cooldown)
            .unwrap_or(false)
    }

    fn push_history(&mut self, recognition: &Recognition) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(RecognitionRecord {
            kind: recognition.kind,
            name: recognition.name.clone(),
            zone: recognition.zone.clone(),
            entity: recognition.entity.clone(),
            at: recognition.at,
        });
    }

    pub fn recognition_history(&self) -> Vec<RecognitionRecord> {
        self.history.iter().cloned().collect()
    }

    pub fn gesture_history(&self) -> Vec<RecognitionRecord> {
        self.history
            .iter()
            .filter(|r| r.kind == RecognitionKind::Gesture)
            .cloned()
            .collect()
    }
}
