use enu_schema::{Beatmap, Config, KeyEvent};
use tracing::debug;

use crate::typing::{GameState, TypingMachine};
use crate::ReplayError;

pub const REPLAY_HEADER: &str = "enuTyping replay format v1";
const FIELD_SEPARATOR: &str = "|@|";

pub fn serialize_replay(events: &[KeyEvent]) -> String {
    let mut out = String::from(REPLAY_HEADER);
    out.push('\n');
    for event in events {
        out.push_str(&event.key);
        out.push_str(FIELD_SEPARATOR);
        out.push_str(&event.timestamp.to_string());
        out.push('\n');
    }
    out
}

/// Rows that are not `key|@|timestamp` (the header included) are skipped.
pub fn deserialize_replay(src: &str) -> Result<Vec<KeyEvent>, ReplayError> {
    let mut events = Vec::new();
    for (i, row) in src.lines().enumerate() {
        let fields: Vec<&str> = row.split(FIELD_SEPARATOR).collect();
        let [key, timestamp] = fields.as_slice() else {
            continue;
        };
        let timestamp = timestamp
            .trim()
            .parse()
            .map_err(|_| ReplayError::InvalidTimestamp {
                line: i + 1,
                value: timestamp.to_string(),
            })?;
        events.push(KeyEvent::new(*key, timestamp));
    }
    Ok(events)
}

/// Replays `events` against a fresh game, ending lines in chronological
/// order with the keystrokes exactly as live play would.
pub fn simulate_replay(
    beatmap: &Beatmap,
    config: &Config,
    score_multiplier: f64,
    events: &[KeyEvent],
) -> GameState {
    let mut state = GameState::new(beatmap, config);
    let machine = TypingMachine::new(score_multiplier);
    let mut events = events.iter().peekable();

    for (i, line) in beatmap.lines.iter().enumerate() {
        while let Some(event) = events.next_if(|e| e.timestamp < line.end_time) {
            machine.process_key(&mut state, &event.key, event.timestamp);
        }
        state.end_line(i + 1);
    }

    debug!(
        hits = state.stats.hits,
        misses = state.stats.misses,
        score = state.stats.score,
        "replay simulated"
    );
    state
}
