//! Input event router
//!
//! Looks every raw event up in a `(category, code) → InputAction` table built
//! from the mapping config for the session's controller kind, then applies
//! the action to the servo bank or the session. Every event is also written
//! to the `controller_events` log target.

use std::collections::HashMap;
use std::time::Instant;

use joyservo_core::config::{ControllerConfig, MappingEntry};
use joyservo_core::error::JoyservoError;
use joyservo_core::{ControllerKind, EventCategory, InputAction};

use super::exit::ExitPhase;
use super::names::{axis_name, button_name};
use super::servo_bank::ServoBank;
use super::servo_state::AngleUpdate;
use super::session::ControllerSession;
use crate::messages::InputEvent;

/// Log target for the raw controller event log
pub const EVENT_LOG_TARGET: &str = "controller_events";

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// What a single event did
#[derive(Debug, PartialEq)]
pub enum RouteOutcome {
    /// Sync markers, stray releases, autorepeat, unmapped codes, `Ignore` actions
    Ignored,
    /// A held button was let go
    Released(u16),
    /// Servo angles changed
    Moved(Vec<AngleUpdate>),
    /// A move was suppressed by lock or hold
    Suppressed,
    Hold { channel: u8, hold: bool },
    Lock(bool),
    Speed(f32),
    Exit(ExitPhase),
    /// The action could not be applied (unknown channel, stopped bank)
    Rejected(String),
}

impl RouteOutcome {
    /// Whether observers should see a refreshed status
    pub fn changed_state(&self) -> bool {
        !matches!(
            self,
            RouteOutcome::Ignored | RouteOutcome::Suppressed | RouteOutcome::Rejected(_)
        )
    }
}

pub struct InputRouter {
    kind: ControllerKind,
    table: HashMap<(EventCategory, u16), InputAction>,
}

impl InputRouter {
    pub fn new(kind: ControllerKind, mapping: &[MappingEntry]) -> Self {
        let table = mapping
            .iter()
            .map(|m| ((m.category, m.code), m.action))
            .collect();
        Self { kind, table }
    }

    /// Router for a controller kind using the configured (or built-in) table
    pub fn for_kind(kind: ControllerKind, config: &ControllerConfig) -> Self {
        Self::new(kind, &config.mapping_for(kind))
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn action_for(&self, category: EventCategory, code: u16) -> Option<InputAction> {
        self.table.get(&(category, code)).copied()
    }

    fn log_event(&self, event: &InputEvent) {
        match event.category {
            EventCategory::Key => {
                let state = match event.value {
                    KEY_RELEASE => "Released",
                    KEY_PRESS => "Pressed",
                    _ => "Held",
                };
                tracing::debug!(
                    target: EVENT_LOG_TARGET,
                    "BUTTON - {} - {} - Code: {}",
                    button_name(self.kind, event.code),
                    state,
                    event.code
                );
            }
            EventCategory::Absolute => {
                tracing::debug!(
                    target: EVENT_LOG_TARGET,
                    "AXIS - {} - Value: {}",
                    axis_name(self.kind, event.code),
                    event.value
                );
            }
            EventCategory::Sync | EventCategory::Other(_) => {}
        }
    }

    /// Apply one event
    ///
    /// The caller holds the servo lock for the duration of the call.
    pub fn dispatch(
        &self,
        event: &InputEvent,
        servos: &mut ServoBank,
        session: &mut ControllerSession,
        now: Instant,
    ) -> RouteOutcome {
        self.log_event(event);
        session.exit_mut().expire(now);

        let action = match event.category {
            EventCategory::Key => {
                match event.value {
                    KEY_PRESS => session.press(event.code),
                    KEY_RELEASE => {
                        return if session.release(event.code) {
                            RouteOutcome::Released(event.code)
                        } else {
                            RouteOutcome::Ignored
                        };
                    }
                    _ => return RouteOutcome::Ignored,
                }
                self.action_for(EventCategory::Key, event.code)
            }
            EventCategory::Absolute => self.action_for(EventCategory::Absolute, event.code),
            EventCategory::Sync | EventCategory::Other(_) => return RouteOutcome::Ignored,
        };

        let Some(action) = action else {
            tracing::debug!(
                target: EVENT_LOG_TARGET,
                "INFO - unmapped {:?} code {}",
                event.category,
                event.code
            );
            return RouteOutcome::Ignored;
        };

        // Button-style actions bound to an absolute input (hat switches)
        // fire on deflection only
        if event.category == EventCategory::Absolute
            && !matches!(action, InputAction::Axis { .. })
            && event.value == 0
        {
            return RouteOutcome::Ignored;
        }

        let result = match action {
            InputAction::Axis { channel } => {
                if event.category != EventCategory::Absolute {
                    return RouteOutcome::Ignored;
                }
                servos
                    .move_from_axis(channel, event.value)
                    .map(|update| match update {
                        Some(update) => RouteOutcome::Moved(vec![update]),
                        None => RouteOutcome::Suppressed,
                    })
            }
            InputAction::ToggleHold { channel } => servos
                .toggle_hold(channel)
                .map(|hold| RouteOutcome::Hold { channel, hold }),
            InputAction::AdjustSpeed { delta } => servos.adjust_speed(delta).map(|speed| {
                tracing::info!("Speed set to {:.1}x", speed);
                RouteOutcome::Speed(speed)
            }),
            InputAction::MoveAll { angle } => servos.move_all_to(angle as i64).map(|updates| {
                if updates.is_empty() {
                    RouteOutcome::Suppressed
                } else {
                    RouteOutcome::Moved(updates)
                }
            }),
            InputAction::ToggleLock => servos.toggle_lock().map(|lock| {
                tracing::info!("Servo lock {}", if lock { "engaged" } else { "released" });
                RouteOutcome::Lock(lock)
            }),
            InputAction::Exit => {
                let phase = session.exit_mut().press(now);
                match phase {
                    ExitPhase::Armed => tracing::info!("Press exit again to confirm"),
                    ExitPhase::Exiting => tracing::info!("Exit confirmed from controller"),
                    ExitPhase::Idle => {}
                }
                Ok(RouteOutcome::Exit(phase))
            }
            InputAction::Ignore => Ok(RouteOutcome::Ignored),
        };

        result.unwrap_or_else(|e: JoyservoError| {
            tracing::warn!("Controller action {:?} rejected: {}", action, e);
            RouteOutcome::Rejected(e.to_string())
        })
    }
}
