//! Kana segmentation and romanization.
//!
//! A syllable's text is split into [`Kana`] units, each carrying every
//! keystroke sequence the player may use to type it. Order matters: the
//! first option is canonical and is what the typing engine suggests first.

use enu_schema::{Beatmap, Config, Kana, Line, RespellingConfig};

const SMALL_KANA: [char; 8] = ['ょ', 'ゃ', 'ゅ', 'ぃ', 'ぇ', 'ぁ', 'ぉ', 'ぅ'];

const VOICED: &str = "がぎぐげござじずぜぞだぢづでどばびぶべぼゔ";
const VOICED_BASE: &str = "かきくけこさしすせそたちつてとはひふへほう";
const SEMI_VOICED: &str = "ぱぴぷぺぽ";
const SEMI_VOICED_BASE: &str = "はひふへほ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputLayout {
    #[default]
    Romaji,
    Kana,
}

impl InputLayout {
    pub fn from_config(config: &Config) -> Self {
        if config.use_kana_layout {
            Self::Kana
        } else {
            Self::Romaji
        }
    }

    pub fn options(self, kana: &Kana) -> &[String] {
        match self {
            Self::Romaji => &kana.romanizations,
            Self::Kana => &kana.hiraganizations,
        }
    }
}

/// Fewest keystrokes that complete `kana` on `layout`.
pub fn min_keypresses(kana: &Kana, layout: InputLayout) -> usize {
    layout
        .options(kana)
        .iter()
        .map(|s| s.chars().count())
        .min()
        .unwrap_or(0)
}

/// Every accepted spelling of a single kana unit, canonical first.
pub fn romanizations(kana: &str, config: &RespellingConfig) -> Vec<String> {
    let folded: Vec<char> = kana.chars().map(fold_katakana).collect();
    let text: String = folded.iter().collect();

    let mut out = Vec::new();
    match folded.as_slice() {
        [] => out.push(String::new()),
        [_] => out.extend(spelling_options(&text, config)),
        ['っ', rest @ ..] => {
            let rest: String = rest.iter().collect();
            for r in romanizations(&rest, config) {
                let head: String = r.chars().take(1).collect();
                out.push(format!("{head}{r}"));
                if config.type_polygraphs {
                    out.push(format!("xtu{r}"));
                    out.push(format!("xtsu{r}"));
                }
            }
        }
        [base, modifier, ..] => {
            out.extend(spelling_options(&text, config));
            if config.type_polygraphs {
                let modifier = small_romaji(*modifier).unwrap_or_default();
                for b in romanizations(&base.to_string(), config) {
                    out.push(format!("{b}x{modifier}"));
                }
            }
        }
    }

    dedup_in_order(out)
}

/// Splits a syllable into kana units and resolves each one.
///
/// `next_syllable` is the text that follows in the same line; `None` at the
/// end of a line.
pub fn parse_kana(
    syllable: &str,
    next_syllable: Option<&str>,
    config: &RespellingConfig,
) -> Vec<Kana> {
    let chars: Vec<char> = syllable.chars().collect();
    let mut kana = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let mut len = 1;
        if fold_katakana(chars[pos]) == 'っ' && pos + 1 < chars.len() {
            len += 1;
        }
        if chars
            .get(pos + len)
            .is_some_and(|c| SMALL_KANA.contains(&fold_katakana(*c)))
        {
            len += 1;
        }

        let text: String = chars[pos..pos + len].iter().collect();
        let mut options = romanizations(&text, config);
        if fold_katakana(chars[pos]) == 'ん' {
            let rest: String = chars[pos + len..].iter().collect();
            let following = if rest.is_empty() {
                next_syllable.unwrap_or("")
            } else {
                rest.as_str()
            };
            if needs_double_n(following) {
                options = vec!["nn".to_string()];
            }
        }

        kana.push(Kana {
            hiraganizations: vec![hiraganize(&text)],
            text,
            romanizations: options,
        });
        pos += len;
    }

    kana
}

/// Recomputes derived kana for every syllable of `line`.
pub fn annotate_line(line: &mut Line, config: &RespellingConfig) {
    let texts: Vec<String> = line.syllables.iter().map(|s| s.text.clone()).collect();
    for (i, syllable) in line.syllables.iter_mut().enumerate() {
        let next = texts.get(i + 1).map(String::as_str);
        syllable.kana = parse_kana(&syllable.text, next, config);
    }
}

pub fn annotate_beatmap(beatmap: &mut Beatmap, config: &RespellingConfig) {
    for line in &mut beatmap.lines {
        annotate_line(line, config);
    }
}

/// Hepburn reading of an arbitrary kana run. Characters that are not kana
/// pass through unchanged.
pub fn to_romaji(text: &str) -> String {
    let chars: Vec<char> = text.chars().map(fold_katakana).collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == 'っ' && i + 1 < chars.len() {
            let rest: String = chars[i + 1..].iter().collect();
            match to_romaji(&rest).chars().next() {
                Some(head) if head.is_ascii_alphabetic() && !is_vowel(head) => out.push(head),
                _ => out.push_str("xtsu"),
            }
            i += 1;
            continue;
        }
        if let Some(&small) = chars.get(i + 1) {
            if SMALL_KANA.contains(&small) {
                out.push_str(&combo_romaji(c, small));
                i += 2;
                continue;
            }
        }
        out.push_str(&mora_romaji(c));
        i += 1;
    }

    out
}

/// Keystrokes for a kana-native keyboard: voicing marks are separate keys.
pub fn hiraganize(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars().map(fold_katakana) {
        if let Some(i) = VOICED.chars().position(|v| v == c) {
            out.extend(VOICED_BASE.chars().nth(i));
            out.push('゛');
        } else if let Some(i) = SEMI_VOICED.chars().position(|v| v == c) {
            out.extend(SEMI_VOICED_BASE.chars().nth(i));
            out.push('゜');
        } else {
            out.push(c);
        }
    }
    out
}

fn needs_double_n(following: &str) -> bool {
    match to_romaji(following).chars().next() {
        None => true,
        Some(c) => matches!(c, 'a' | 'i' | 'u' | 'e' | 'o' | 'y' | 'n'),
    }
}

fn spelling_options(text: &str, config: &RespellingConfig) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(preferred) = config.kana_spellings.get(text) {
        out.push(preferred.clone());
    }
    let table = respellings(text);
    if table.is_empty() {
        out.push(to_romaji(text));
    } else {
        out.extend(table.iter().map(|s| s.to_string()));
    }
    out
}

fn respellings(text: &str) -> &'static [&'static str] {
    match text {
        "し" => &["shi", "si", "ci"],
        "ち" => &["chi", "ti"],
        "つ" => &["tsu", "tu"],
        "じ" => &["ji", "zi"],
        "ぢ" => &["ji", "di"],
        "づ" => &["zu", "du"],
        "か" => &["ka", "ca"],
        "く" => &["ku", "cu", "qu"],
        "こ" => &["ko", "co"],
        "せ" => &["se", "ce"],
        "ふ" => &["fu", "hu"],
        "ん" => &["n", "nn"],
        "っ" => &["xtsu", "xtu"],
        "しゃ" => &["sha", "sya"],
        "しゅ" => &["shu", "syu"],
        "しょ" => &["sho", "syo"],
        "しぇ" => &["she", "sye"],
        "じゃ" => &["ja", "jya", "zya"],
        "じゅ" => &["ju", "jyu", "zyu"],
        "じょ" => &["jo", "jyo", "zyo"],
        "じぇ" => &["je", "jye", "zye"],
        "ちゃ" => &["cha", "tya", "cya"],
        "ちゅ" => &["chu", "tyu", "cyu"],
        "ちょ" => &["cho", "tyo", "cyo"],
        "ちぇ" => &["che", "tye", "cye"],
        _ => &[],
    }
}

#[rustfmt::skip]
fn mora_romaji(c: char) -> String {
    let s = match c {
        'あ' => "a", 'い' => "i", 'う' => "u", 'え' => "e", 'お' => "o",
        'か' => "ka", 'き' => "ki", 'く' => "ku", 'け' => "ke", 'こ' => "ko",
        'が' => "ga", 'ぎ' => "gi", 'ぐ' => "gu", 'げ' => "ge", 'ご' => "go",
        'さ' => "sa", 'し' => "shi", 'す' => "su", 'せ' => "se", 'そ' => "so",
        'ざ' => "za", 'じ' => "ji", 'ず' => "zu", 'ぜ' => "ze", 'ぞ' => "zo",
        'た' => "ta", 'ち' => "chi", 'つ' => "tsu", 'て' => "te", 'と' => "to",
        'だ' => "da", 'ぢ' => "ji", 'づ' => "zu", 'で' => "de", 'ど' => "do",
        'な' => "na", 'に' => "ni", 'ぬ' => "nu", 'ね' => "ne", 'の' => "no",
        'は' => "ha", 'ひ' => "hi", 'ふ' => "fu", 'へ' => "he", 'ほ' => "ho",
        'ば' => "ba", 'び' => "bi", 'ぶ' => "bu", 'べ' => "be", 'ぼ' => "bo",
        'ぱ' => "pa", 'ぴ' => "pi", 'ぷ' => "pu", 'ぺ' => "pe", 'ぽ' => "po",
        'ま' => "ma", 'み' => "mi", 'む' => "mu", 'め' => "me", 'も' => "mo",
        'や' => "ya", 'ゆ' => "yu", 'よ' => "yo",
        'ら' => "ra", 'り' => "ri", 'る' => "ru", 'れ' => "re", 'ろ' => "ro",
        'わ' => "wa", 'ゐ' => "wi", 'ゑ' => "we", 'を' => "wo", 'ん' => "n",
        'ゔ' => "vu",
        'ぁ' => "xa", 'ぃ' => "xi", 'ぅ' => "xu", 'ぇ' => "xe", 'ぉ' => "xo",
        'ゃ' => "xya", 'ゅ' => "xyu", 'ょ' => "xyo", 'ゎ' => "xwa", 'っ' => "xtsu",
        'ー' => "-", '、' => ",", '。' => ".", '「' => "[", '」' => "]",
        '・' => "/", '〜' => "~", '　' => " ",
        // fullwidth ASCII block
        '\u{FF01}'..='\u{FF5E}' => {
            return char::from_u32(c as u32 - 0xFEE0)
                .map(String::from)
                .unwrap_or_else(|| c.to_string());
        }
        _ => return c.to_string(),
    };
    s.to_string()
}

/// Romaji of a small kana when it modifies the mora before it.
fn small_romaji(c: char) -> Option<&'static str> {
    match fold_katakana(c) {
        'ゃ' => Some("ya"),
        'ゅ' => Some("yu"),
        'ょ' => Some("yo"),
        'ぁ' => Some("a"),
        'ぃ' => Some("i"),
        'ぅ' => Some("u"),
        'ぇ' => Some("e"),
        'ぉ' => Some("o"),
        _ => None,
    }
}

fn combo_romaji(base: char, small: char) -> String {
    let stem = match base {
        'き' => Some("ky"),
        'ぎ' => Some("gy"),
        'し' => Some("sh"),
        'じ' => Some("j"),
        'ち' => Some("ch"),
        'ぢ' => Some("dy"),
        'に' => Some("ny"),
        'ひ' => Some("hy"),
        'び' => Some("by"),
        'ぴ' => Some("py"),
        'み' => Some("my"),
        'り' => Some("ry"),
        _ => None,
    };
    if let Some(stem) = stem {
        let vowel = match small {
            'ゃ' => Some("a"),
            'ゅ' => Some("u"),
            'ょ' => Some("o"),
            'ぇ' if matches!(base, 'し' | 'じ' | 'ち') => Some("e"),
            _ => None,
        };
        if let Some(vowel) = vowel {
            return format!("{stem}{vowel}");
        }
    }

    let special = match (base, small) {
        ('ふ', 'ぁ') => Some("fa"),
        ('ふ', 'ぃ') => Some("fi"),
        ('ふ', 'ぇ') => Some("fe"),
        ('ふ', 'ぉ') => Some("fo"),
        ('ふ', 'ゅ') => Some("fyu"),
        ('う', 'ぃ') => Some("wi"),
        ('う', 'ぇ') => Some("we"),
        ('う', 'ぉ') => Some("who"),
        ('ゔ', 'ぁ') => Some("va"),
        ('ゔ', 'ぃ') => Some("vi"),
        ('ゔ', 'ぇ') => Some("ve"),
        ('ゔ', 'ぉ') => Some("vo"),
        ('て', 'ぃ') => Some("thi"),
        ('で', 'ぃ') => Some("dhi"),
        ('と', 'ぅ') => Some("twu"),
        ('ど', 'ぅ') => Some("dwu"),
        ('い', 'ぇ') => Some("ye"),
        ('つ', 'ぁ') => Some("tsa"),
        ('つ', 'ぃ') => Some("tsi"),
        ('つ', 'ぇ') => Some("tse"),
        ('つ', 'ぉ') => Some("tso"),
        ('く', 'ぁ') => Some("kwa"),
        ('ぐ', 'ぁ') => Some("gwa"),
        _ => None,
    };
    match special {
        Some(s) => s.to_string(),
        None => format!(
            "{}x{}",
            mora_romaji(base),
            small_romaji(small).unwrap_or_default()
        ),
    }
}

fn fold_katakana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

fn dedup_in_order(options: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(options.len());
    for option in options {
        if !out.contains(&option) {
            out.push(option);
        }
    }
    out
}
