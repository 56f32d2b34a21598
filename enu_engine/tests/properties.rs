//! Property-based tests for the codec, the beat grid and the typing engine.

use proptest::prelude::*;

use enu_engine::kana::{self, annotate_beatmap, romanizations};
use enu_engine::stats::line_keypresses;
use enu_engine::time_index::{time_of_beat, time_to_beat_number, time_to_line_index};
use enu_engine::{parse, serialize, Editor, GameState, TypingMachine};
use enu_schema::{Beatmap, Config, Line, Milliseconds, RespellingConfig, Syllable, TimingPoint};

const KANA: &[&str] = &[
    "あ", "か", "し", "つ", "ん", "きょ", "しゃ", "ちゅ", "じょ", "っか", "っちゃ", "ふぁ", "ー",
    "を", "づ", "ぴゃ", "ゔ", "ゃ", "っ",
];

const LYRICS: &[&str] = &["", "さくら", "one, two", "今日は 晴れ"];

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_syllable_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(KANA), 1..4).prop_map(|parts| parts.concat())
}

/// (syllable gaps, syllable texts, trailing gap, lyric)
fn arb_line_shape() -> impl Strategy<Value = (Vec<(Milliseconds, String)>, Milliseconds, &'static str)> {
    (
        prop::collection::vec((0i64..400, arb_syllable_text()), 0..5),
        1i64..2000,
        prop::sample::select(LYRICS),
    )
}

fn arb_beatmap() -> impl Strategy<Value = Beatmap> {
    (
        prop::collection::vec((1i64..5000, 1.0f64..400.0), 0..4),
        0i64..2000,
        prop::collection::vec(arb_line_shape(), 0..5),
        any::<bool>(),
    )
        .prop_map(|(points, first_start, shapes, with_end)| {
            let mut beatmap = Beatmap::default();

            let mut t = -1000;
            for (step, bpm) in points {
                t += step;
                beatmap.timing_points.push(TimingPoint { time: t, bpm });
            }

            let mut cursor = first_start;
            for (syllables, tail, lyric) in shapes {
                let mut line = Line::new(cursor, cursor, lyric);
                let mut s = cursor;
                for (i, (gap, text)) in syllables.into_iter().enumerate() {
                    s += if i == 0 { gap } else { gap + 1 };
                    line.syllables.push(Syllable {
                        time: s,
                        text,
                        kana: Vec::new(),
                    });
                }
                line.end_time = s + tail;
                cursor = line.end_time;
                beatmap.lines.push(line);
            }

            beatmap.duration = cursor + 1000;
            if with_end {
                beatmap.end_time = Some(cursor);
            } else if let Some(last) = beatmap.lines.last_mut() {
                last.end_time = beatmap.duration;
            }

            annotate_beatmap(&mut beatmap, &RespellingConfig::default());
            beatmap
        })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn codec_round_trips(beatmap in arb_beatmap()) {
        let text = serialize(&beatmap);
        let back = parse(&text, beatmap.duration, &RespellingConfig::default()).unwrap();
        prop_assert_eq!(&back, &beatmap);
        prop_assert_eq!(serialize(&back), text);
    }

    #[test]
    fn beat_time_and_number_are_inverse(
        bpm in 20.0f64..1000.0,
        origin in -10_000i64..10_000,
        divisor in prop::sample::select(vec![1u32, 2, 3, 4, 6, 8, 12, 16]),
        beat in -1000i64..1000,
    ) {
        let point = TimingPoint { time: origin, bpm };
        let t = time_of_beat(&point, divisor, beat);
        prop_assert_eq!(time_to_beat_number(&point, divisor, t as f64, false), beat);
    }

    #[test]
    fn line_index_is_monotonic(beatmap in arb_beatmap(), a in -1000i64..20_000, b in -1000i64..20_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let count = beatmap.lines.len();
        let lo_index = time_to_line_index(&beatmap.lines, lo).as_index(count);
        let hi_index = time_to_line_index(&beatmap.lines, hi).as_index(count);
        prop_assert!(lo_index <= hi_index);
        prop_assert!((-1..=count as isize).contains(&lo_index));
    }

    #[test]
    fn romanizations_are_non_empty_and_configured_first(
        k in prop::sample::select(KANA),
        polygraphs in any::<bool>(),
    ) {
        let config = RespellingConfig {
            type_polygraphs: polygraphs,
            ..RespellingConfig::default()
        };
        let options = romanizations(k, &config);
        prop_assert!(!options.is_empty());
        prop_assert!(options.iter().all(|o| !o.is_empty()));
        if let Some(preferred) = config.kana_spellings.get(k) {
            prop_assert_eq!(&options[0], preferred);
        }
    }

    #[test]
    fn typing_canonical_spellings_never_misses(beatmap in arb_beatmap()) {
        let config = Config::default();
        let machine = TypingMachine::default();
        let mut state = GameState::new(&beatmap, &config);

        for line in &beatmap.lines {
            for syllable in &line.syllables {
                for k in &syllable.kana {
                    for c in k.romanizations[0].chars() {
                        machine.process_key(&mut state, &c.to_string(), syllable.time);
                    }
                }
            }
        }

        let expected_hits: usize = beatmap
            .lines
            .iter()
            .map(|l| line_keypresses(l, state.layout))
            .sum();
        let expected_kana: usize = beatmap
            .lines
            .iter()
            .flat_map(|l| &l.syllables)
            .map(|s| s.kana.len())
            .sum();
        prop_assert_eq!(state.stats.misses, 0);
        prop_assert_eq!(state.stats.hits as usize, expected_hits);
        prop_assert_eq!(state.stats.kana_hits as usize, expected_kana);
        for line in &state.lines {
            prop_assert!(line.is_finished());
        }
    }

    #[test]
    fn editor_insert_at_existing_syllable_overwrites(beatmap in arb_beatmap(), pick in any::<prop::sample::Index>()) {
        let syllables: Vec<Milliseconds> = beatmap
            .lines
            .iter()
            .flat_map(|l| l.syllables.iter().map(|s| s.time))
            .collect();
        prop_assume!(!syllables.is_empty());
        let t = syllables[pick.index(syllables.len())];

        let mut editor = Editor::new(beatmap.clone(), Config::default());
        editor.insert_syllable(t, "ら").unwrap();

        let after: usize = editor.beatmap().lines.iter().map(|l| l.syllables.len()).sum();
        prop_assert_eq!(after, syllables.len());
        let edited = editor
            .beatmap()
            .lines
            .iter()
            .flat_map(|l| &l.syllables)
            .find(|s| s.time == t)
            .unwrap();
        prop_assert_eq!(edited.text.as_str(), "ら");
    }
}

#[test]
fn segmentation_never_produces_empty_kana() {
    for a in KANA {
        for b in KANA {
            let text = format!("{a}{b}");
            for k in kana::parse_kana(&text, None, &RespellingConfig::default()) {
                assert!(!k.text.is_empty());
                assert!(!k.romanizations.is_empty(), "{text}");
            }
        }
    }
}
