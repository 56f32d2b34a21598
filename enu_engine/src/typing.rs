//! Live typing state: which kana the player is on, what they have typed so
//! far, and the running statistics.

use enu_schema::{Beatmap, Config, Kana, KeyEvent, Line, Milliseconds};
use serde::Serialize;
use tracing::{debug, trace};

use crate::kana::{min_keypresses, InputLayout};
use crate::score::{self, keystroke_score};
use crate::time_index::{time_to_line_index, time_to_syllable_index, LineCursor};

#[derive(Debug, Clone, PartialEq)]
pub struct KanaState {
    pub kana: Kana,
    /// Correct keystrokes typed so far.
    pub prefix: String,
    /// One way to finish the kana after `prefix`.
    pub suffix: String,
    pub min_keypresses: usize,
    pub score: f64,
    pub misses: u32,
}

impl KanaState {
    fn new(kana: Kana, typed: bool, layout: InputLayout) -> Self {
        let full = layout.options(&kana).first().cloned().unwrap_or_default();
        let min_keypresses = min_keypresses(&kana, layout);
        let (prefix, suffix) = if typed {
            (full, String::new())
        } else {
            (String::new(), full)
        };
        Self {
            kana,
            prefix,
            suffix,
            min_keypresses,
            score: 0.0,
            misses: 0,
        }
    }

    pub fn is_typed(&self) -> bool {
        self.suffix.is_empty()
    }

    fn is_n(&self) -> bool {
        matches!(self.kana.text.as_str(), "ん" | "ン")
    }

    /// The state after typing `key`, if some option still matches.
    fn extend(&self, key: &str, layout: InputLayout) -> Option<KanaState> {
        let prefix = format!("{}{key}", self.prefix);
        let option = layout
            .options(&self.kana)
            .iter()
            .find(|o| o.starts_with(&prefix))?;
        Some(KanaState {
            suffix: option[prefix.len()..].to_string(),
            prefix,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyllableState {
    pub time: Milliseconds,
    pub text: String,
    /// Index of the kana being typed; `kana.len()` once finished.
    pub position: usize,
    pub kana: Vec<KanaState>,
}

impl SyllableState {
    pub fn current(&self) -> Option<&KanaState> {
        self.kana.get(self.position)
    }

    /// What the player has typed followed by the suggested completion.
    pub fn romanization(&self) -> String {
        self.kana
            .iter()
            .flat_map(|k| [k.prefix.as_str(), k.suffix.as_str()])
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineState {
    /// Index of the syllable being typed; `syllables.len()` once finished.
    pub position: usize,
    pub syllables: Vec<SyllableState>,
}

impl LineState {
    fn at(line: &Line, t: Milliseconds, layout: InputLayout, mode: Mode) -> Self {
        let syllables = line
            .syllables
            .iter()
            .map(|s| {
                let elapsed = s.time < t;
                let kana: Vec<KanaState> = s
                    .kana
                    .iter()
                    .map(|k| KanaState::new(k.clone(), elapsed, layout))
                    .collect();
                let position = if mode == Mode::Edit && t >= s.time {
                    kana.len()
                } else {
                    0
                };
                SyllableState {
                    time: s.time,
                    text: s.text.clone(),
                    position,
                    kana,
                }
            })
            .collect();

        Self {
            position: line.syllables.iter().filter(|s| s.time < t).count(),
            syllables,
        }
    }

    fn kana_at(&self, syllable: usize) -> Option<&KanaState> {
        self.syllables.get(syllable)?.current()
    }

    pub fn kana_count(&self) -> usize {
        self.syllables.iter().map(|s| s.kana.len()).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.syllables.len()
    }
}

/// A completed ん typed as a single `n`, waiting to see whether the next key
/// is a second `n` that belongs to it.
///
/// Only the next typeable key in a line with kana left resolves it; ignored
/// keys leave it pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingN {
    #[default]
    None,
    At {
        line: usize,
        syllable: usize,
        kana: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Stats {
    pub hits: u32,
    pub misses: u32,
    pub kana_hits: u32,
    /// Kana left untyped in lines that have already ended.
    pub kana_misses: u32,
    /// Kana in lines that have already ended.
    pub total_kana: u32,
    pub score: f64,
}

impl Stats {
    pub fn accuracy(&self) -> f64 {
        score::accuracy(self.hits, self.misses)
    }

    pub fn kana_accuracy(&self) -> f64 {
        score::accuracy(self.kana_hits, self.kana_misses)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Play,
    /// Editor playback: syllables already passed count as fully typed.
    Edit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Lines as authored; index-aligned with `lines`.
    pub source: Vec<Line>,
    pub lines: Vec<LineState>,
    pub stats: Stats,
    pub pending_n: PendingN,
    pub key_log: Vec<KeyEvent>,
    pub layout: InputLayout,
    cursor: LineCursor,
}

impl GameState {
    pub fn new(beatmap: &Beatmap, config: &Config) -> Self {
        Self::at(beatmap, 0, config, Mode::Play)
    }

    /// Fresh state for playback resuming at `t`.
    pub fn at(beatmap: &Beatmap, t: Milliseconds, config: &Config, mode: Mode) -> Self {
        let layout = InputLayout::from_config(config);
        Self {
            source: beatmap.lines.clone(),
            lines: beatmap
                .lines
                .iter()
                .map(|line| LineState::at(line, t, layout, mode))
                .collect(),
            stats: Stats::default(),
            pending_n: PendingN::None,
            key_log: Vec::new(),
            layout,
            cursor: time_to_line_index(&beatmap.lines, t),
        }
    }

    pub fn line_at(&self, t: Milliseconds) -> LineCursor {
        time_to_line_index(&self.source, t)
    }

    /// Advances the clock; ends every line the cursor moved past.
    pub fn tick(&mut self, t: Milliseconds) {
        let count = self.lines.len();
        let cursor = self.line_at(t);
        let next = cursor.as_index(count);
        if next > self.cursor.as_index(count) && next > 0 {
            self.end_line(next as usize);
        }
        self.cursor = cursor;
    }

    /// Settles kana statistics once every line before `next_line` is over.
    pub fn end_line(&mut self, next_line: usize) {
        let elapsed = next_line.min(self.lines.len());
        let total: usize = self.lines[..elapsed].iter().map(LineState::kana_count).sum();
        self.stats.total_kana = total as u32;
        self.stats.kana_misses = self.stats.total_kana.saturating_sub(self.stats.kana_hits);
        debug!(
            next_line,
            total_kana = self.stats.total_kana,
            kana_misses = self.stats.kana_misses,
            "line ended"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KeyOutcome {
    /// No line is active, the line is finished, or the key is not typeable.
    Ignored,
    /// Second `n` of a ん that had already completed.
    Absorbed,
    Hit {
        line: usize,
        syllable: usize,
        kana: usize,
        hits: u32,
        completed: bool,
        score: f64,
    },
    Miss {
        line: usize,
        score: f64,
    },
}

/// Applies keystrokes to a [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypingMachine {
    /// Speed and mod multiplier applied to every keystroke's score.
    pub score_multiplier: f64,
}

impl Default for TypingMachine {
    fn default() -> Self {
        Self {
            score_multiplier: 1.0,
        }
    }
}

impl TypingMachine {
    pub fn new(score_multiplier: f64) -> Self {
        Self { score_multiplier }
    }

    pub fn process_key(&self, state: &mut GameState, key: &str, timestamp: Milliseconds) -> KeyOutcome {
        state.key_log.push(KeyEvent::new(key, timestamp));
        let layout = state.layout;

        let Some(li) = state.line_at(timestamp).line() else {
            return KeyOutcome::Ignored;
        };
        if !is_typeable(key, layout) {
            return KeyOutcome::Ignored;
        }

        if state.lines[li].kana_at(state.lines[li].position).is_none() {
            return KeyOutcome::Ignored;
        }

        if let PendingN::At {
            line: pending_line,
            syllable,
            kana,
        } = state.pending_n
        {
            state.pending_n = PendingN::None;
            if layout == InputLayout::Romaji && key == "n" && pending_line == li {
                state.lines[li].syllables[syllable].kana[kana].prefix.push('n');
                trace!(line = li, syllable, kana, "absorbed second n");
                return KeyOutcome::Absorbed;
            }
        }

        let line = &state.lines[li];
        let s_pos = line.position;
        let Some(current) = line.kana_at(s_pos) else {
            return KeyOutcome::Ignored;
        };

        let mut accepted = current.extend(key, layout).map(|k| (s_pos, k));
        if accepted.is_none() {
            // syllables before this index have started; the last of them is included
            let started = time_to_syllable_index(&state.source[li].syllables, timestamp);
            accepted = (s_pos + 1..started)
                .find_map(|pos| line.kana_at(pos)?.extend(key, layout).map(|k| (pos, k)));
        }

        let Some((pos, new_kana)) = accepted else {
            let error = (timestamp - line.syllables[s_pos].time) as f64;
            let earned = keystroke_score(0, 1, error) * self.score_multiplier;
            let line = &mut state.lines[li];
            let syllable = &mut line.syllables[s_pos];
            let k_pos = syllable.position;
            syllable.kana[k_pos].misses += 1;
            syllable.kana[k_pos].score += earned;
            state.stats.misses += 1;
            state.stats.score += earned;
            trace!(line = li, key, timestamp, "miss");
            return KeyOutcome::Miss {
                line: li,
                score: earned,
            };
        };

        let completed = new_kana.is_typed();
        let mut hits = 0;
        if new_kana.prefix.chars().count() == 1 {
            hits = 1;
        }
        if completed {
            hits += new_kana.min_keypresses.saturating_sub(1) as u32;
        }

        let line = &mut state.lines[li];
        // catching up is timed against the syllable that fell behind
        let error = (timestamp - line.syllables[s_pos].time) as f64;
        let earned = keystroke_score(hits, 0, error) * self.score_multiplier;

        state.stats.hits += hits;
        state.stats.score += earned;
        if completed {
            state.stats.kana_hits += 1;
        }

        let syllable = &mut line.syllables[pos];
        let k_pos = syllable.position;
        let starts_pending = completed && new_kana.prefix == "n" && new_kana.is_n();
        syllable.kana[k_pos] = KanaState {
            score: new_kana.score + earned,
            ..new_kana
        };

        line.position = pos;
        if completed {
            state.pending_n = if starts_pending {
                PendingN::At {
                    line: li,
                    syllable: pos,
                    kana: k_pos,
                }
            } else {
                PendingN::None
            };
            syllable.position += 1;
            if syllable.position >= syllable.kana.len() {
                line.position = pos + 1;
            }
        }

        trace!(line = li, syllable = pos, kana = k_pos, key, hits, completed, "hit");
        KeyOutcome::Hit {
            line: li,
            syllable: pos,
            kana: k_pos,
            hits,
            completed,
            score: earned,
        }
    }
}

fn is_typeable(key: &str, layout: InputLayout) -> bool {
    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return false;
    };
    match layout {
        InputLayout::Romaji => c.is_ascii_graphic(),
        InputLayout::Kana => !c.is_control() && !c.is_whitespace(),
    }
}
