//! Operator-facing console output.
//!
//! Human-readable step lines with the classic check/warn/cross glyphs.
//! Colors drop out when stdout is not a terminal, when `--no-color` is
//! given, or when `NO_COLOR` is set. Diagnostics go through `tracing`;
//! this module only renders the report the operator reads.

use std::io::IsTerminal;

use nu_ansi_term::Color;

use mpt_compose::ServiceState;

/// Console renderer.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
}

impl Console {
    /// Create a renderer, honoring `--no-color` and `NO_COLOR`.
    pub fn new(no_color_flag: bool) -> Self {
        let color = !no_color_flag
            && std::env::var_os("NO_COLOR").is_none()
            && std::io::stdout().is_terminal();
        Self { color }
    }

    /// Create a renderer with color forced on or off.
    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.color {
            color.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Section heading.
    pub fn heading(&self, text: &str) {
        println!();
        println!("{}", self.paint(Color::Cyan, text));
    }

    /// Progress step.
    pub fn step(&self, text: &str) {
        println!("{} {text}", self.paint(Color::Blue, "›"));
    }

    pub fn ok(&self, text: &str) {
        println!("{} {text}", self.paint(Color::Green, "✓"));
    }

    pub fn warn(&self, text: &str) {
        println!("{} {text}", self.paint(Color::Yellow, "⚠"));
    }

    pub fn fail(&self, text: &str) {
        println!("{} {text}", self.paint(Color::Red, "✗"));
    }

    /// Indented plain line, aligned under the glyph lines.
    pub fn line(&self, text: &str) {
        println!("  {text}");
    }

    /// Render a service state in its conventional color.
    pub fn state(&self, state: &ServiceState) -> String {
        let color = match state {
            ServiceState::Up => Color::Green,
            ServiceState::Restarting | ServiceState::Created | ServiceState::Paused => {
                Color::Yellow
            }
            ServiceState::Exited | ServiceState::Dead => Color::Red,
            ServiceState::Unknown(_) => Color::Yellow,
        };
        self.paint(color, state.as_str())
    }
}
