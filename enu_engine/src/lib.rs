use std::{fs, path::Path};

use enu_schema::{Beatmap, Milliseconds, RespellingConfig};

pub mod clock;
pub mod codec;
pub mod editor;
mod error;
pub mod kana;
pub mod replay;
pub mod score;
pub mod stats;
pub mod time_index;
pub mod typing;

pub use clock::Playback;
pub use codec::{parse, serialize};
pub use editor::Editor;
pub use error::{CodecError, CodecErrorKind, EditError, ReplayError, ScoreError};
pub use kana::{romanizations, InputLayout};
pub use time_index::{LineCursor, SnapDirection};
pub use typing::{GameState, KeyOutcome, Mode, Stats, TypingMachine};

/// Reads and parses a beatmap file.
pub fn parse_file(
    path: impl AsRef<Path>,
    duration: Milliseconds,
    config: &RespellingConfig,
) -> Result<Beatmap, CodecError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        CodecError::new("E2001", format!("failed to read beatmap: {e}"), 0)
            .with_file(path.display().to_string())
    })?;
    parse(&src, duration, config).map_err(|e| e.with_file(path.display().to_string()))
}
