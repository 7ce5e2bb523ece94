//! Controller modes and session kinds

use std::fmt;

/// The kind of a timed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Work,
    Rest,
}

impl SessionKind {
    /// The session that follows this one when it runs to completion
    pub fn next(self) -> Self {
        match self {
            SessionKind::Work => SessionKind::Rest,
            SessionKind::Rest => SessionKind::Work,
        }
    }

    /// Name shown to the user in prompts
    pub fn display_name(self) -> &'static str {
        match self {
            SessionKind::Work => "Pomodoro",
            SessionKind::Rest => "Rest",
        }
    }

    /// Short lowercase label used in log lines
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::Rest => "rest",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the controller is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Idle,
    Work,
    Rest,
}

impl Mode {
    /// The session kind backing this mode, if any
    pub fn session_kind(self) -> Option<SessionKind> {
        match self {
            Mode::Idle => None,
            Mode::Work => Some(SessionKind::Work),
            Mode::Rest => Some(SessionKind::Rest),
        }
    }

    pub fn is_idle(self) -> bool {
        self == Mode::Idle
    }
}

impl From<SessionKind> for Mode {
    fn from(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Work => Mode::Work,
            SessionKind::Rest => Mode::Rest,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Idle => f.write_str("idle"),
            Mode::Work => f.write_str("work"),
            Mode::Rest => f.write_str("rest"),
        }
    }
}

/// One of the two external control inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    StopStart,
    PauseResume,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::StopStart => f.write_str("stop/start"),
            Trigger::PauseResume => f.write_str("pause/resume"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_alternate() {
        assert_eq!(SessionKind::Work.next(), SessionKind::Rest);
        assert_eq!(SessionKind::Rest.next(), SessionKind::Work);
    }

    #[test]
    fn mode_round_trips_through_kind() {
        assert_eq!(Mode::from(SessionKind::Work).session_kind(), Some(SessionKind::Work));
        assert_eq!(Mode::from(SessionKind::Rest).session_kind(), Some(SessionKind::Rest));
        assert_eq!(Mode::Idle.session_kind(), None);
    }
}
