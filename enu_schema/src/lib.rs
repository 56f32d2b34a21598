use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Milliseconds = i64;

pub const BEATMAP_HEADER: &str = "ishpytoing file format v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingPoint {
    pub time: Milliseconds,
    pub bpm: f64,
}

/// One typeable unit of a syllable: a mora, a mora with a small kana, or
/// either of those behind a small tsu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Kana {
    pub text: String,
    /// Accepted romaji spellings; index 0 is the canonical one.
    pub romanizations: Vec<String>,
    /// Keystrokes on a kana-native keyboard layout.
    #[serde(default)]
    pub hiraganizations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Syllable {
    pub time: Milliseconds,
    pub text: String,
    /// Derived from `text`; recomputed whenever the config changes.
    #[serde(default)]
    pub kana: Vec<Kana>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    pub start_time: Milliseconds,
    pub end_time: Milliseconds,
    pub lyric: String,
    pub syllables: Vec<Syllable>,
}

impl Line {
    pub fn new(start_time: Milliseconds, end_time: Milliseconds, lyric: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            lyric: lyric.into(),
            syllables: Vec::new(),
        }
    }

    pub fn duration(&self) -> Milliseconds {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Beatmap {
    pub timing_points: Vec<TimingPoint>,
    pub lines: Vec<Line>,
    /// Authored end of playable content (the `E` record).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Milliseconds>,
    /// Length of the backing track.
    pub duration: Milliseconds,
}

impl Beatmap {
    /// Time at which the last line closes when no end marker is present.
    pub fn content_end(&self) -> Milliseconds {
        self.end_time.unwrap_or(self.duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub timestamp: Milliseconds,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, timestamp: Milliseconds) -> Self {
        Self {
            key: key.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ModCombo {
    pub hidden: bool,
}

impl ModCombo {
    const HIDDEN: u32 = 1;

    pub fn from_flag(flag: u32) -> Self {
        Self {
            hidden: flag & Self::HIDDEN == Self::HIDDEN,
        }
    }

    pub fn flag(&self) -> u32 {
        if self.hidden {
            Self::HIDDEN
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RespellingConfig {
    /// Preferred spelling per mora, typed first and shown as canonical.
    pub kana_spellings: BTreeMap<String, String>,
    /// Also accept spellings that type small kana separately (`kixyo`, `xtsu`).
    pub type_polygraphs: bool,
}

impl Default for RespellingConfig {
    fn default() -> Self {
        let kana_spellings = [
            ("し", "shi"),
            ("ち", "chi"),
            ("つ", "tsu"),
            ("じ", "ji"),
            ("しゃ", "sha"),
            ("しょ", "sho"),
            ("しゅ", "shu"),
            ("じゃ", "ja"),
            ("じょ", "jo"),
            ("じゅ", "ju"),
            ("か", "ka"),
            ("く", "ku"),
            ("こ", "ko"),
            ("せ", "se"),
            ("ふ", "fu"),
            ("づ", "du"),
            ("ん", "n"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            kana_spellings,
            type_polygraphs: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    #[serde(flatten)]
    pub respelling: RespellingConfig,
    pub localize_metadata: bool,
    pub use_kana_layout: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Metadata {
    pub title: String,
    pub title_original: String,
    pub artist: String,
    pub artist_original: String,
}

impl Metadata {
    pub fn display_title(&self, config: &Config) -> &str {
        if config.localize_metadata {
            &self.title
        } else {
            &self.title_original
        }
    }

    pub fn display_artist(&self, config: &Config) -> &str {
        if config.localize_metadata {
            &self.artist
        } else {
            &self.artist_original
        }
    }
}
