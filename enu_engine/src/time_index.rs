use enu_schema::{Line, Milliseconds, Syllable, TimingPoint};

const MS_IN_MINUTE: f64 = 60_000.0;

/// Where a timestamp falls relative to the lines of a beatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCursor {
    /// Before the first line starts, or the map has no lines.
    Before,
    At(usize),
    /// At or after the end of the last line.
    Past,
}

impl LineCursor {
    /// `-1` before, the line index, or `lines.len()` past the end.
    pub fn as_index(self, line_count: usize) -> isize {
        match self {
            Self::Before => -1,
            Self::At(i) => i as isize,
            Self::Past => line_count as isize,
        }
    }

    pub fn line(self) -> Option<usize> {
        match self {
            Self::At(i) => Some(i),
            Self::Before | Self::Past => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapDirection {
    #[default]
    Nearest,
    Forward,
    Backward,
}

/// First index whose key is strictly greater than `t`, or `items.len()`.
///
/// An item whose key equals `t` sorts before the returned position, so
/// "the item currently under `t`" is always `index - 1`.
pub fn lower_bound_exclusive<T>(
    items: &[T],
    t: Milliseconds,
    key: impl Fn(&T) -> Milliseconds,
) -> usize {
    items.partition_point(|item| key(item) <= t)
}

/// Ties on a line's end go to the next line.
pub fn time_to_line_index(lines: &[Line], t: Milliseconds) -> LineCursor {
    match lines.first() {
        None => LineCursor::Before,
        Some(first) if t < first.start_time => LineCursor::Before,
        Some(_) => match lower_bound_exclusive(lines, t, |l| l.end_time) {
            i if i == lines.len() => LineCursor::Past,
            i => LineCursor::At(i),
        },
    }
}

pub fn time_to_syllable_index(syllables: &[Syllable], t: Milliseconds) -> usize {
    lower_bound_exclusive(syllables, t, |s| s.time)
}

pub fn time_to_timing_point_index(points: &[TimingPoint], t: Milliseconds) -> usize {
    lower_bound_exclusive(points, t, |p| p.time)
}

/// Index of the timing point governing `t`; times before the first point use
/// the first point.
pub fn active_timing_point_index(points: &[TimingPoint], t: Milliseconds) -> Option<usize> {
    if points.is_empty() {
        return None;
    }
    Some(time_to_timing_point_index(points, t).saturating_sub(1))
}

pub fn beat_length(point: &TimingPoint, divisor: u32) -> f64 {
    MS_IN_MINUTE / (point.bpm * divisor.max(1) as f64)
}

/// Beat number of `t` under `point`, subdivided by `divisor`.
///
/// Without `round` the result is the beat at or before `t`, except that a
/// `t` which rounds onto a beat time yields exactly that beat, so
/// `time_of_beat(time_to_beat_number(t)) == round(t)` holds for beat times.
pub fn time_to_beat_number(point: &TimingPoint, divisor: u32, t: f64, round: bool) -> i64 {
    let beats = (t - point.time as f64) / beat_length(point, divisor);
    if round {
        return js_round(beats) as i64;
    }
    let ceil = beats.ceil() as i64;
    if time_of_beat(point, divisor, ceil) == js_round(t) as Milliseconds {
        ceil
    } else {
        beats.floor() as i64
    }
}

pub fn time_of_beat(point: &TimingPoint, divisor: u32, beat: i64) -> Milliseconds {
    js_round(point.time as f64 + beat as f64 * beat_length(point, divisor)) as Milliseconds
}

/// Beat-snapped seek target from `t`, clamped to `[0, duration]`.
///
/// Forward never crosses the next timing point without stopping on it;
/// backward from a timing point continues on the previous point's grid.
pub fn snap(
    points: &[TimingPoint],
    divisor: u32,
    t: Milliseconds,
    direction: SnapDirection,
    duration: Milliseconds,
) -> Milliseconds {
    let Some(i) = active_timing_point_index(points, t) else {
        return t.clamp(0, duration.max(0));
    };

    let target = match direction {
        SnapDirection::Nearest => {
            let point = &points[i];
            time_of_beat(point, divisor, time_to_beat_number(point, divisor, t as f64, true))
        }
        SnapDirection::Forward => {
            let point = &points[i];
            let beat = time_to_beat_number(point, divisor, t as f64, false);
            let next = time_of_beat(point, divisor, beat + 1);
            match points.get(i + 1) {
                Some(boundary) if next > boundary.time && t < boundary.time => boundary.time,
                _ => next,
            }
        }
        SnapDirection::Backward => {
            let section = if t <= points[i].time && i > 0 { i - 1 } else { i };
            let point = &points[section];
            let beat = time_to_beat_number(point, divisor, t as f64, false);
            if time_of_beat(point, divisor, beat) >= t {
                time_of_beat(point, divisor, beat - 1)
            } else {
                time_of_beat(point, divisor, beat)
            }
        }
    };

    target.clamp(0, duration.max(0))
}

/// `Math.round`: halves round towards positive infinity.
fn js_round(x: f64) -> f64 {
    (x + 0.5).floor()
}
