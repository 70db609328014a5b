use crate::terminal::{KeyAction, TerminalPresenter, key_action};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use spanav_experiment::{SessionEvent, SessionStateMachine, Transport};
use spanav_timing::{HighPrecisionTimer, Timer};
use std::time::Duration;

/// Deadlines closer than this are slept to instead of polled for.
const PRECISE_WAIT_NS: u64 = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Aborted,
}

/// Live session in the terminal, polled on the high-precision clock.
pub struct App<X: Transport> {
    session: SessionStateMachine<HighPrecisionTimer, X>,
    presenter: TerminalPresenter,
    poll_interval: Duration,
}

impl<X: Transport> App<X> {
    pub fn new(session: SessionStateMachine<HighPrecisionTimer, X>, presenter: TerminalPresenter) -> Self {
        Self {
            session,
            presenter,
            poll_interval: Duration::from_millis(5),
        }
    }

    pub fn into_session(self) -> SessionStateMachine<HighPrecisionTimer, X> {
        self.session
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        self.presenter.enter()?;
        let result = self.event_loop();
        if let Err(e) = self.presenter.leave() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
        result
    }

    fn event_loop(&mut self) -> Result<RunOutcome> {
        self.session.start(&mut self.presenter);

        while !self.session.is_finished() {
            if let Some(deadline) = self.imminent_deadline() {
                self.session.timer().sleep_until(deadline);
            } else if event::poll(self.poll_timeout())? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key_action(&key)) {
                        return Ok(RunOutcome::Aborted);
                    }
                }
            }
            let events = self.session.update(&mut self.presenter);
            log_events(&events);
        }

        // Leave the summary up until the participant dismisses it.
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key_action(&key).is_some() {
                    break;
                }
            }
        }
        Ok(RunOutcome::Completed)
    }

    /// Returns true when the session should be aborted.
    fn handle_key(&mut self, action: Option<KeyAction>) -> bool {
        match action {
            Some(KeyAction::Abort) => {
                tracing::warn!("session aborted by operator");
                return true;
            }
            Some(KeyAction::Continue) => {
                let events = self.session.acknowledge(&mut self.presenter);
                log_events(&events);
            }
            Some(KeyAction::Respond(direction)) => {
                if self.presenter.is_capturing() {
                    self.session.respond(direction, &mut self.presenter);
                }
            }
            None => {}
        }
        false
    }

    fn imminent_deadline(&self) -> Option<u64> {
        let deadline = self.session.next_deadline()?;
        let remaining = deadline.saturating_sub(self.session.timer().now());
        (remaining <= PRECISE_WAIT_NS).then_some(deadline)
    }

    /// Poll until the next trial deadline comes within sleeping range.
    fn poll_timeout(&self) -> Duration {
        match self.session.next_deadline() {
            Some(deadline) => {
                let now = self.session.timer().now();
                let remaining = deadline.saturating_sub(now).saturating_sub(PRECISE_WAIT_NS);
                Duration::from_nanos(remaining).min(self.poll_interval)
            }
            None => self.poll_interval,
        }
    }
}

pub fn log_events(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::TrialCompleted(r) | SessionEvent::PracticeTrialCompleted(r) => {
                tracing::debug!(
                    block = %r.block,
                    trial = r.trial,
                    stimulus = %r.stimulus_id,
                    response = %r.response,
                    accuracy = r.accuracy,
                    rt = ?r.rt,
                    "trial recorded"
                );
            }
            SessionEvent::TrialSkipped { block, trial } => {
                tracing::debug!(%block, trial, "trial skipped");
            }
            other => tracing::debug!(event = ?other, "session event"),
        }
    }
}
