//! Raw-mode terminal front end: screens drawn with crossterm, arrow keys
//! mapped to responses.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{cursor, execute, queue, terminal};
use spanav_core::{Direction, Stimulus};
use spanav_experiment::{Feedback, Interstitial, Presenter, SessionSummary, TrainingPrompt};
use std::io::{self, Stdout, Write, stdout};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Respond(Direction),
    Continue,
    Abort,
}

pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    match key.code {
        KeyCode::Up => Some(KeyAction::Respond(Direction::Up)),
        KeyCode::Down => Some(KeyAction::Respond(Direction::Down)),
        KeyCode::Left => Some(KeyAction::Respond(Direction::Left)),
        KeyCode::Right => Some(KeyAction::Respond(Direction::Right)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(KeyAction::Continue),
        KeyCode::Esc => Some(KeyAction::Abort),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Abort)
        }
        _ => None,
    }
}

pub struct TerminalPresenter {
    out: Stdout,
    media_root: PathBuf,
    capture: bool,
}

impl TerminalPresenter {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            out: stdout(),
            media_root: media_root.into(),
            capture: false,
        }
    }

    pub fn enter(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, terminal::EnterAlternateScreen, cursor::Hide)
    }

    pub fn leave(&mut self) -> io::Result<()> {
        execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture
    }

    fn draw(&mut self, color: Color, lines: &[String]) {
        if let Err(e) = self.try_draw(color, lines) {
            tracing::warn!(error = %e, "terminal draw failed");
        }
    }

    fn try_draw(&mut self, color: Color, lines: &[String]) -> io::Result<()> {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let top = rows.saturating_sub(lines.len() as u16) / 2;
        queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        for (i, line) in lines.iter().enumerate() {
            let width = line.chars().count() as u16;
            let x = cols.saturating_sub(width) / 2;
            queue!(
                self.out,
                cursor::MoveTo(x, top + i as u16),
                SetForegroundColor(color),
                Print(line),
                ResetColor
            )?;
        }
        self.out.flush()
    }
}

impl Presenter for TerminalPresenter {
    fn show_fixation(&mut self) {
        self.draw(Color::White, &["+".to_string()]);
    }

    fn show_stimulus(&mut self, stimulus: &Stimulus) {
        let mut lines = vec![format!("[ {} ]", stimulus.id), stimulus.file.clone()];
        if !stimulus.arrows.is_empty() {
            lines.push(stimulus.arrows.iter().map(Direction::arrow).collect());
        }
        self.draw(Color::Cyan, &lines);
    }

    fn show_catch_instruction(&mut self, text: &str) {
        self.draw(Color::Yellow, &[text.to_string()]);
    }

    fn set_response_capture(&mut self, enabled: bool) {
        self.capture = enabled;
    }

    fn show_training(&mut self, prompt: &TrainingPrompt) {
        let mut lines = vec![
            "Press the arrow key shown".to_string(),
            String::new(),
            prompt.target.arrow().to_string(),
            String::new(),
            format!("{} / {}", prompt.completed, prompt.total),
        ];
        let color = match prompt.missed {
            Some(missed) => {
                lines.push(format!("That was {}, try again", missed.arrow()));
                Color::Red
            }
            None => Color::White,
        };
        self.draw(color, &lines);
    }

    fn show_feedback(&mut self, feedback: &Feedback) {
        let expected = |d: &Option<Direction>| {
            d.map(|d| format!("The correct answer was {}", d.arrow()))
                .unwrap_or_default()
        };
        match feedback {
            Feedback::Correct => self.draw(Color::Green, &["Correct!".to_string()]),
            Feedback::Incorrect { given, expected: e } => self.draw(
                Color::Red,
                &[
                    format!("Incorrect ({})", given.arrow()),
                    expected(e),
                ],
            ),
            Feedback::TooSlow { expected: e } => {
                self.draw(Color::Red, &["Too slow!".to_string(), expected(e)])
            }
        }
    }

    fn show_interstitial(&mut self, screen: &Interstitial) {
        let mut lines = vec![screen.title()];
        match screen {
            Interstitial::PracticeNavType(nav) | Interstitial::BlockIntro { nav_type: nav, .. } => {
                lines.push(format!("Answer from the {} perspective.", nav.title()));
            }
            Interstitial::PracticeComplete => {
                lines.push("The main experiment starts next. No more feedback.".to_string());
            }
            Interstitial::PracticeIntro { .. } => {
                lines.push("Use the arrow keys to respond.".to_string());
            }
        }
        lines.push(String::new());
        lines.push("Press ENTER to continue".to_string());
        self.draw(Color::White, &lines);
    }

    fn show_summary(&mut self, summary: &SessionSummary) {
        let pct = |v: Option<f64>| v.map_or("-".to_string(), |p| format!("{p:.1}%"));
        self.draw(
            Color::White,
            &[
                "Thank you for participating!".to_string(),
                format!("Trials: {}", summary.total_trials),
                format!("Accuracy: {}", pct(summary.overall_accuracy_pct)),
                format!(
                    "Mean RT: {}",
                    summary.mean_rt_ms.map_or("-".to_string(), |m| format!("{m} ms"))
                ),
            ],
        );
    }

    fn preload(&mut self, files: &[String]) {
        let missing = files
            .iter()
            .filter(|f| !self.media_root.join(f).is_file())
            .count();
        if missing > 0 {
            tracing::warn!(missing, total = files.len(), root = %self.media_root.display(), "stimulus media not found");
        } else {
            tracing::debug!(total = files.len(), "stimulus media present");
        }
    }
}
