//! Keypresses-per-minute figures for lines, whole beatmaps and a live game.

use enu_schema::{Beatmap, Line, Milliseconds};

use crate::kana::{min_keypresses, InputLayout};
use crate::typing::GameState;

const MS_IN_MINUTE: f64 = 60_000.0;

pub fn line_keypresses(line: &Line, layout: InputLayout) -> usize {
    line.syllables
        .iter()
        .flat_map(|s| &s.kana)
        .map(|k| min_keypresses(k, layout))
        .sum()
}

pub fn line_kana_count(line: &Line) -> usize {
    line.syllables.iter().map(|s| s.kana.len()).sum()
}

pub fn line_kpm(line: &Line, layout: InputLayout) -> f64 {
    per_minute(line_keypresses(line, layout), line.duration())
}

/// Average over the time spent inside lines.
pub fn beatmap_kpm(beatmap: &Beatmap, layout: InputLayout) -> f64 {
    let mut keypresses = 0;
    let mut drain: Milliseconds = 0;
    for line in &beatmap.lines {
        keypresses += line_keypresses(line, layout);
        drain += line.duration();
    }
    per_minute(keypresses, drain)
}

/// Player KPM so far, counting only time spent in lines that need typing.
pub fn current_kpm(state: &GameState, t: Milliseconds) -> f64 {
    let mut drain: Milliseconds = 0;
    for line in &state.source {
        if line_keypresses(line, state.layout) == 0 {
            continue;
        }
        if line.end_time > t {
            drain += (t - line.start_time).max(0);
            break;
        }
        drain += line.duration();
    }
    per_minute(state.stats.hits as usize, drain)
}

fn per_minute(count: usize, elapsed: Milliseconds) -> f64 {
    if elapsed <= 0 {
        return 0.0;
    }
    count as f64 * MS_IN_MINUTE / elapsed as f64
}
