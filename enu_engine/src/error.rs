use enu_schema::Milliseconds;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    Parse,
    IO,
    TimeMap,
    Validation,
}

impl CodecErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            "E1001" | "E1002" | "E1003" | "E1004" | "E1005" | "E1006" => Self::Parse,

            "E2001" => Self::IO,

            "E3001" | "E3003" => Self::TimeMap,

            "E4001" | "E4002" | "E4003" | "E4004" => Self::Validation,

            _ => Self::Parse,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message} (line {line})")]
pub struct CodecError {
    pub code: &'static str,
    pub kind: CodecErrorKind,
    pub message: String,
    /// 1-based line number in the beatmap text, 0 when not tied to a row.
    pub line: usize,

    pub file: Option<String>,
    pub time: Option<Milliseconds>,
    pub context: Option<String>,
}

impl CodecError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: CodecErrorKind::from_code(code),
            message: message.into(),
            line,

            file: None,
            time: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_time(mut self, time: Milliseconds) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Why an editor mutation was refused. The beatmap is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    #[error("no line is active at {0}ms")]
    NoActiveLine(Milliseconds),
    #[error("no line starts at or before {0}ms")]
    NoLine(Milliseconds),
    #[error("the first line still has syllables")]
    NonEmptyFirstLine,
    #[error("no syllable to delete around {0}ms")]
    NoSyllable(Milliseconds),
    #[error("bpm must be within (0, 3000]")]
    InvalidBpm,
    #[error("no timing point at or before {0}ms")]
    NoTimingPoint(Milliseconds),
    #[error("cannot delete the last timing point")]
    LastTimingPoint,
    #[error("end marker at {0}ms would precede content")]
    EndBeforeContent(Milliseconds),
    #[error("{0}ms is at or past the end of the map")]
    PastEnd(Milliseconds),
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ScoreError {
    #[error("speed cannot be negative (got {0})")]
    NegativeSpeed(f64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("invalid replay timestamp {value:?} (line {line})")]
    InvalidTimestamp { line: usize, value: String },
}
