//! Cursor-driven beatmap authoring.
//!
//! Every mutation either applies completely and returns the new beatmap text,
//! or returns an [`EditError`] and leaves the beatmap exactly as it was.

use enu_schema::{Beatmap, Config, Line, Milliseconds, Syllable, TimingPoint};
use tracing::debug;

use crate::codec;
use crate::kana;
use crate::time_index::{
    lower_bound_exclusive, snap, time_to_line_index, time_to_syllable_index,
    time_to_timing_point_index, SnapDirection,
};
use crate::typing::{GameState, Mode};
use crate::{CodecError, EditError};

pub const MAX_BPM: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Editor {
    beatmap: Beatmap,
    config: Config,
}

impl Editor {
    pub fn new(beatmap: Beatmap, config: Config) -> Self {
        Self { beatmap, config }
    }

    pub fn from_text(text: &str, duration: Milliseconds, config: Config) -> Result<Self, CodecError> {
        let beatmap = codec::parse(text, duration, &config.respelling)?;
        Ok(Self::new(beatmap, config))
    }

    pub fn beatmap(&self) -> &Beatmap {
        &self.beatmap
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_beatmap(self) -> Beatmap {
        self.beatmap
    }

    pub fn text(&self) -> String {
        codec::serialize(&self.beatmap)
    }

    /// Starts a line at `t`, or renames the line already starting there.
    ///
    /// A line containing `t` is split at `t` and keeps the syllables before
    /// it. Past the last line, the last line stretches to `t` and the new
    /// line runs to the end of the track, dropping any end marker.
    pub fn insert_line(&mut self, t: Milliseconds, lyric: &str) -> Result<String, EditError> {
        let content_end = self.beatmap.content_end();
        let duration = self.beatmap.duration;
        let lines = &mut self.beatmap.lines;
        if let Some(line) = lines.iter_mut().find(|l| l.start_time == t) {
            line.lyric = lyric.to_string();
            return Ok(self.commit("insert_line"));
        }

        let i = lower_bound_exclusive(lines, t, |l| l.start_time);
        let Some(prev_index) = i.checked_sub(1) else {
            let end = match lines.first() {
                Some(first) => first.start_time,
                None => content_end,
            };
            if end <= t {
                return Err(refuse("insert_line", EditError::PastEnd(t)));
            }
            lines.insert(0, Line::new(t, end, lyric));
            return Ok(self.commit("insert_line"));
        };

        let prev = &lines[prev_index];
        let past_last = t >= prev.end_time && i == lines.len();
        let mut line = if t < prev.end_time {
            Line::new(t, prev.end_time, lyric)
        } else {
            let end = match lines.get(i) {
                Some(next) => next.start_time,
                None => duration,
            };
            if end <= t {
                return Err(refuse("insert_line", EditError::PastEnd(t)));
            }
            Line::new(t, end, lyric)
        };

        let prev = &mut lines[prev_index];
        let split = prev.syllables.partition_point(|s| s.time < t);
        line.syllables = prev.syllables.split_off(split);
        prev.end_time = t;
        kana::annotate_line(prev, &self.config.respelling);
        kana::annotate_line(&mut line, &self.config.respelling);
        lines.insert(i, line);

        if past_last {
            self.beatmap.end_time = None;
        }
        Ok(self.commit("insert_line"))
    }

    /// Adds a syllable to the line active at `t`, or retexts the syllable
    /// already at `t`.
    pub fn insert_syllable(&mut self, t: Milliseconds, text: &str) -> Result<String, EditError> {
        let line = active_line(&mut self.beatmap.lines, t, "insert_syllable")?;
        match line.syllables.iter_mut().find(|s| s.time == t) {
            Some(syllable) => syllable.text = text.to_string(),
            None => {
                let at = time_to_syllable_index(&line.syllables, t);
                line.syllables.insert(
                    at,
                    Syllable {
                        time: t,
                        text: text.to_string(),
                        kana: Vec::new(),
                    },
                );
            }
        }
        kana::annotate_line(line, &self.config.respelling);
        Ok(self.commit("insert_syllable"))
    }

    pub fn insert_timing_point(&mut self, t: Milliseconds, bpm: f64) -> Result<String, EditError> {
        if !bpm.is_finite() || bpm <= 0.0 || bpm > MAX_BPM {
            return Err(refuse("insert_timing_point", EditError::InvalidBpm));
        }
        let points = &mut self.beatmap.timing_points;
        match points.iter_mut().find(|p| p.time == t) {
            Some(point) => point.bpm = bpm,
            None => {
                let at = time_to_timing_point_index(points, t);
                points.insert(at, TimingPoint { time: t, bpm });
            }
        }
        Ok(self.commit("insert_timing_point"))
    }

    /// Removes the last line starting at or before `t`. Its time and
    /// syllables fold into the previous line; its lyric is discarded. The
    /// first line can only go once it has no syllables.
    pub fn delete_line(&mut self, t: Milliseconds) -> Result<String, EditError> {
        let lines = &mut self.beatmap.lines;
        let i = lower_bound_exclusive(lines, t, |l| l.start_time);
        let Some(index) = i.checked_sub(1) else {
            return Err(refuse("delete_line", EditError::NoLine(t)));
        };

        if index == 0 {
            if !lines[0].syllables.is_empty() {
                return Err(refuse("delete_line", EditError::NonEmptyFirstLine));
            }
            lines.remove(0);
            return Ok(self.commit("delete_line"));
        }

        let removed = lines.remove(index);
        let prev = &mut lines[index - 1];
        prev.end_time = removed.end_time;
        prev.syllables.extend(removed.syllables);
        kana::annotate_line(prev, &self.config.respelling);
        Ok(self.commit("delete_line"))
    }

    /// Removes the syllable at or before `t` in the active line.
    pub fn delete_previous_syllable(&mut self, t: Milliseconds) -> Result<String, EditError> {
        let line = active_line(&mut self.beatmap.lines, t, "delete_previous_syllable")?;
        let Some(at) = time_to_syllable_index(&line.syllables, t).checked_sub(1) else {
            return Err(refuse("delete_previous_syllable", EditError::NoSyllable(t)));
        };
        line.syllables.remove(at);
        kana::annotate_line(line, &self.config.respelling);
        Ok(self.commit("delete_previous_syllable"))
    }

    /// Removes the first syllable after `t` in the active line.
    pub fn delete_next_syllable(&mut self, t: Milliseconds) -> Result<String, EditError> {
        let line = active_line(&mut self.beatmap.lines, t, "delete_next_syllable")?;
        let at = time_to_syllable_index(&line.syllables, t);
        if at >= line.syllables.len() {
            return Err(refuse("delete_next_syllable", EditError::NoSyllable(t)));
        }
        line.syllables.remove(at);
        kana::annotate_line(line, &self.config.respelling);
        Ok(self.commit("delete_next_syllable"))
    }

    pub fn delete_timing_point(&mut self, t: Milliseconds) -> Result<String, EditError> {
        let points = &mut self.beatmap.timing_points;
        let Some(at) = time_to_timing_point_index(points, t).checked_sub(1) else {
            return Err(refuse("delete_timing_point", EditError::NoTimingPoint(t)));
        };
        if points.len() == 1 {
            return Err(refuse("delete_timing_point", EditError::LastTimingPoint));
        }
        points.remove(at);
        Ok(self.commit("delete_timing_point"))
    }

    /// Places the end marker, closing the last line at `t`.
    pub fn set_end(&mut self, t: Milliseconds) -> Result<String, EditError> {
        if let Some(last) = self.beatmap.lines.last_mut() {
            let content = last.syllables.last().map_or(last.start_time, |s| s.time);
            if t <= content {
                return Err(refuse("set_end", EditError::EndBeforeContent(t)));
            }
            last.end_time = t;
        }
        self.beatmap.end_time = Some(t);
        Ok(self.commit("set_end"))
    }

    /// Beat-snapped seek target from `t`.
    pub fn seek(&self, t: Milliseconds, divisor: u32, direction: SnapDirection) -> Milliseconds {
        snap(
            &self.beatmap.timing_points,
            divisor,
            t,
            direction,
            self.beatmap.duration,
        )
    }

    /// Test-play state starting at `t`. Dropping it ends the test; the
    /// beatmap is never touched by play.
    pub fn start_test(&self, t: Milliseconds) -> GameState {
        GameState::at(&self.beatmap, t, &self.config, Mode::Edit)
    }

    fn commit(&self, op: &str) -> String {
        debug!(
            op,
            lines = self.beatmap.lines.len(),
            timing_points = self.beatmap.timing_points.len(),
            "edit applied"
        );
        codec::serialize(&self.beatmap)
    }
}

/// The line whose span contains `t`; gaps between lines have none.
fn active_line<'a>(lines: &'a mut [Line], t: Milliseconds, op: &str) -> Result<&'a mut Line, EditError> {
    match time_to_line_index(lines, t).line() {
        Some(i) if lines[i].start_time <= t => Ok(&mut lines[i]),
        _ => Err(refuse(op, EditError::NoActiveLine(t))),
    }
}

fn refuse(op: &str, err: EditError) -> EditError {
    debug!(op, %err, "edit refused");
    err
}
