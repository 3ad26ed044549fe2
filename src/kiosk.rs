//! Kiosk event loop.
//!
//! A single task owns the [`ViewController`] and multiplexes input, the
//! earliest timer deadline, and shutdown. Input is polled before deadlines, so
//! an activity signal arriving at the same instant as an idle deadline wins.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::clock::TokioClock;
use crate::domain::ActivityKind;
use crate::input::{InputSource, KioskInput};
use crate::present::{Presenter, ViewSnapshot};
use crate::view::ViewController;

/// How often the countdown is re-rendered while a modal is open.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Run the kiosk until `shutdown` is cancelled.
///
/// The controller is torn down before returning.
pub async fn run<S, P>(
    mut view: ViewController<TokioClock>,
    mut source: S,
    mut presenter: P,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: InputSource,
    P: Presenter,
{
    let mut last = ViewSnapshot::capture(&view);
    presenter.present(&last, view.catalog())?;

    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut input_open = true;

    info!("Kiosk started, waiting for input...");

    loop {
        let deadline = view.next_deadline();

        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                info!("Shutdown requested");
                break;
            }

            input = source.next_input(), if input_open => {
                match input {
                    Ok(Some(input)) => handle_input(&mut view, input),
                    Ok(None) => {
                        info!("Input closed; timers keep running until shutdown");
                        input_open = false;
                    }
                    Err(e) => {
                        error!("Input error: {}", e);
                        input_open = false;
                    }
                }
            }

            () = wait_for(deadline) => {
                let transitions = view.poll_timers();
                debug!("Timer deadline reached ({} transitions)", transitions);
            }

            _ = refresh.tick() => {}
        }

        let snapshot = ViewSnapshot::capture(&view);
        if snapshot != last {
            presenter.present(&snapshot, view.catalog())?;
            last = snapshot;
        }
    }

    view.teardown();
    Ok(())
}

/// Apply one input to the controller.
///
/// Card and close taps are touches themselves, so they also count as a
/// click activity.
fn handle_input(view: &mut ViewController<TokioClock>, input: KioskInput) {
    match input {
        KioskInput::Activity(kind) => {
            view.activity(kind);
        }
        KioskInput::Select(id) => {
            view.activity(ActivityKind::Click);
            if let Err(e) = view.select(&id) {
                warn!("Ignoring selection: {}", e);
            }
        }
        KioskInput::Close => {
            view.activity(ActivityKind::Click);
            view.close();
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Running kiosk loop.
///
/// Dropping the handle stops the loop.
pub struct KioskHandle {
    task: JoinHandle<Result<()>>,
    token: CancellationToken,
    _stop_on_drop: DropGuard,
}

/// Start [`run`] on a new task.
pub fn spawn<S, P>(view: ViewController<TokioClock>, source: S, presenter: P) -> KioskHandle
where
    S: InputSource + 'static,
    P: Presenter + 'static,
{
    let token = CancellationToken::new();
    let task = tokio::spawn(run(view, source, presenter, token.clone()));

    KioskHandle {
        task,
        _stop_on_drop: token.clone().drop_guard(),
        token,
    }
}

impl KioskHandle {
    /// Token that stops the loop when cancelled.
    pub fn stop_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the loop to finish.
    pub async fn join(self) -> Result<()> {
        self.task.await.context("Kiosk loop panicked")?
    }

    /// Stop the loop and wait for teardown.
    pub async fn shutdown(self) -> Result<()> {
        self.token.cancel();
        self.join().await
    }
}
