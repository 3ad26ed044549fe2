//! View controller state machine.
//!
//! Owns the UI state of the kiosk and the three timers that drive it:
//! - the idle-detector, reset by every accepted activity signal
//! - the modal auto-close countdown, restarted whenever a guide modal opens
//! - the return timer, started when the idle warning is shown
//!
//! Phases: `Idle` (main screen), `Viewing` (guide modal open) and
//! `ViewingWithIdleWarning` (modal open, return to the main screen pending).

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::config::Config;
use crate::domain::{ActivityKind, FormCatalog, FormDescriptor, FormId};
use crate::timer::{TimerHandle, TimerService};

/// Elapse values of the controller's timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    IdleDetectorElapsed,
    ReturnTimerElapsed,
    ModalAutoCloseElapsed,
}

/// Phase of the view, derived from [`UiState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    Idle,
    Viewing,
    ViewingWithIdleWarning,
}

/// State consumed by the presentation surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub selected_form: Option<FormDescriptor>,
    pub idle_notification_visible: bool,
}

impl UiState {
    pub fn phase(&self) -> ViewPhase {
        match (&self.selected_form, self.idle_notification_visible) {
            (None, _) => ViewPhase::Idle,
            (Some(_), false) => ViewPhase::Viewing,
            (Some(_), true) => ViewPhase::ViewingWithIdleWarning,
        }
    }
}

/// Errors from view operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    #[error("Unknown form: {0}")]
    UnknownForm(String),
}

/// Single-owner controller for the kiosk view.
pub struct ViewController<C: Clock> {
    clock: C,
    catalog: FormCatalog,
    config: Config,
    state: UiState,
    timers: TimerService<TimerEvent>,
    idle_detector: TimerHandle,
    modal_auto_close: TimerHandle,
    idle_return: TimerHandle,
    torn_down: bool,
}

impl<C: Clock> ViewController<C> {
    /// Create a controller on the main screen with the idle-detector running.
    pub fn new(config: Config, catalog: FormCatalog, clock: C) -> Self {
        let mut timers = TimerService::new();
        let idle_detector = timers.create(
            "idle-detector",
            config.idle_timeout(),
            TimerEvent::IdleDetectorElapsed,
            clock.now(),
        );
        let modal_auto_close = timers.register(
            "modal-auto-close",
            config.modal_auto_close(),
            TimerEvent::ModalAutoCloseElapsed,
        );
        let idle_return = timers.register(
            "idle-return",
            config.idle_return(),
            TimerEvent::ReturnTimerElapsed,
        );

        Self {
            clock,
            catalog,
            config,
            state: UiState::default(),
            timers,
            idle_detector,
            modal_auto_close,
            idle_return,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn phase(&self) -> ViewPhase {
        self.state.phase()
    }

    pub fn catalog(&self) -> &FormCatalog {
        &self.catalog
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Register a user activity signal.
    ///
    /// Returns false if the kind is not a configured activity (or the
    /// controller is torn down); the idle-detector is left untouched then.
    pub fn activity(&mut self, kind: ActivityKind) -> bool {
        if self.torn_down || !self.config.is_activity(kind) {
            trace!("Ignoring input '{}'", kind.as_str());
            return false;
        }

        self.timers.reset(&self.idle_detector, self.clock.now());
        true
    }

    /// Open the guide modal for a form.
    ///
    /// Supersedes any open modal: its countdown restarts and a pending idle
    /// return is dropped.
    pub fn select(&mut self, id: &FormId) -> Result<(), ViewError> {
        let form = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| ViewError::UnknownForm(id.as_str().to_string()))?;

        if self.torn_down {
            return Ok(());
        }

        debug!("{:?} -> Viewing '{}'", self.phase(), form.id.as_str());
        let now = self.clock.now();
        self.timers.cancel(&self.idle_return);
        self.timers.reset(&self.modal_auto_close, now);
        self.state.selected_form = Some(form);
        self.state.idle_notification_visible = false;
        Ok(())
    }

    /// Close the guide modal and return to the main screen.
    pub fn close(&mut self) {
        if self.torn_down {
            return;
        }

        if self.state.selected_form.is_some() {
            debug!("{:?} -> Idle (closed)", self.phase());
        }
        self.return_to_idle();
    }

    /// Apply every timer elapse due at the current instant.
    ///
    /// Returns the number of elapses that changed the state.
    pub fn poll_timers(&mut self) -> usize {
        let now = self.clock.now();
        let mut transitions = 0;

        while let Some(event) = self.timers.pop_due(now) {
            if self.on_timer(event) {
                transitions += 1;
            }
        }

        transitions
    }

    /// Earliest instant at which [`poll_timers`](Self::poll_timers) has work.
    pub fn next_deadline(&self) -> Option<tokio::time::Instant> {
        self.timers.next_deadline()
    }

    /// Whole seconds left on the modal countdown, rounded up.
    pub fn countdown_secs(&self) -> Option<u64> {
        self.state.selected_form.as_ref()?;
        let remaining = self
            .timers
            .remaining(&self.modal_auto_close, self.clock.now())?;
        Some(remaining.as_millis().div_ceil(1000).try_into().unwrap_or(u64::MAX))
    }

    /// Cancel every timer. The controller ignores all input afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }

        self.timers.cancel_all();
        self.torn_down = true;
        info!("View controller torn down");
    }

    fn on_timer(&mut self, event: TimerEvent) -> bool {
        if self.torn_down {
            return false;
        }

        match (event, self.phase()) {
            (TimerEvent::IdleDetectorElapsed, ViewPhase::Viewing) => {
                debug!("Viewing -> ViewingWithIdleWarning");
                self.state.idle_notification_visible = true;
                self.timers.reset(&self.idle_return, self.clock.now());
                true
            }
            (TimerEvent::ReturnTimerElapsed, ViewPhase::ViewingWithIdleWarning) => {
                info!("Returning to main screen after inactivity");
                self.return_to_idle();
                true
            }
            (
                TimerEvent::ModalAutoCloseElapsed,
                ViewPhase::Viewing | ViewPhase::ViewingWithIdleWarning,
            ) => {
                debug!("{:?} -> Idle (auto-close)", self.phase());
                self.return_to_idle();
                true
            }
            (event, phase) => {
                trace!("Ignoring {:?} in {:?}", event, phase);
                false
            }
        }
    }

    fn return_to_idle(&mut self) {
        self.timers.cancel(&self.modal_auto_close);
        self.timers.cancel(&self.idle_return);
        self.state.selected_form = None;
        self.state.idle_notification_visible = false;
    }
}

impl<C: Clock> Drop for ViewController<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
