use enu_schema::{Beatmap, Line, Milliseconds, RespellingConfig, Syllable, TimingPoint, BEATMAP_HEADER};
use tracing::debug;

use crate::kana;
use crate::CodecError;

const TIMING_POINTS_SECTION: &str = "[TimingPoints]";
const LINES_SECTION: &str = "[Lines]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    TimingPoints,
    Lines,
}

/// Parses beatmap text. Lines without a trailing `E` record close at
/// `duration`.
pub fn parse(
    src: &str,
    duration: Milliseconds,
    config: &RespellingConfig,
) -> Result<Beatmap, CodecError> {
    let mut beatmap = Beatmap {
        duration,
        ..Beatmap::default()
    };
    let mut section = Section::Preamble;
    let mut open: Option<Line> = None;
    let mut saw_header = false;

    for (i, raw_line) in src.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw_line.trim();

        if !saw_header {
            if trimmed != BEATMAP_HEADER {
                return Err(CodecError::new(
                    "E1001",
                    format!("expected header {BEATMAP_HEADER:?}"),
                    line_no,
                )
                .with_context(raw_line.to_string()));
            }
            saw_header = true;
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        if trimmed == TIMING_POINTS_SECTION {
            section = Section::TimingPoints;
            continue;
        }
        if trimmed == LINES_SECTION {
            section = Section::Lines;
            continue;
        }
        if trimmed.starts_with('[') {
            return Err(CodecError::new(
                "E1002",
                format!("unknown section: {trimmed}"),
                line_no,
            ));
        }

        match section {
            Section::Preamble => {
                return Err(CodecError::new(
                    "E1002",
                    "content outside a section",
                    line_no,
                )
                .with_context(raw_line.to_string()));
            }
            Section::TimingPoints => {
                let point = parse_timing_point(trimmed, line_no)?;
                if let Some(prev) = beatmap.timing_points.last() {
                    if point.time <= prev.time {
                        return Err(CodecError::new(
                            "E4003",
                            "timing points must be strictly ascending",
                            line_no,
                        )
                        .with_time(point.time));
                    }
                }
                beatmap.timing_points.push(point);
            }
            Section::Lines => {
                parse_record(raw_line, line_no, &mut beatmap, &mut open, config)?;
            }
        }
    }

    if !saw_header {
        return Err(CodecError::new("E1001", "missing header", 0));
    }

    if let Some(mut line) = open.take() {
        line.end_time = duration;
        kana::annotate_line(&mut line, config);
        beatmap.lines.push(line);
    }

    debug!(
        timing_points = beatmap.timing_points.len(),
        lines = beatmap.lines.len(),
        end_time = ?beatmap.end_time,
        "parsed beatmap"
    );
    Ok(beatmap)
}

/// Writes the text form. `parse(serialize(b))` reproduces `b` for any
/// beatmap whose lines are contiguous.
pub fn serialize(beatmap: &Beatmap) -> String {
    let mut rows = vec![
        BEATMAP_HEADER.to_string(),
        String::new(),
        TIMING_POINTS_SECTION.to_string(),
    ];

    if beatmap.timing_points.is_empty() {
        rows.push(String::new());
    }
    for point in &beatmap.timing_points {
        rows.push(format!("{},{}", point.time, point.bpm));
    }

    rows.push(String::new());
    rows.push(LINES_SECTION.to_string());

    for line in &beatmap.lines {
        rows.push(format!("L,{},{}", line.start_time, line.lyric));
        for syllable in &line.syllables {
            rows.push(format!("S,{},{}", syllable.time, syllable.text));
        }
    }
    if let Some(end_time) = beatmap.end_time {
        rows.push(format!("E,{end_time}"));
    }

    let mut out = rows.join("\n");
    out.push('\n');
    out
}

fn parse_timing_point(trimmed: &str, line_no: usize) -> Result<TimingPoint, CodecError> {
    let Some((time, bpm)) = trimmed.split_once(',') else {
        return Err(CodecError::new(
            "E1003",
            format!("timing point must be time,bpm (context={trimmed})"),
            line_no,
        )
        .with_context(trimmed.to_string()));
    };

    let time = parse_time(time, line_no)?;
    let bpm: f64 = bpm.trim().parse().map_err(|_| {
        CodecError::new("E3003", format!("invalid bpm: {}", bpm.trim()), line_no).with_time(time)
    })?;
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(CodecError::new("E3003", "bpm must be > 0", line_no).with_time(time));
    }

    Ok(TimingPoint { time, bpm })
}

fn parse_record(
    raw_line: &str,
    line_no: usize,
    beatmap: &mut Beatmap,
    open: &mut Option<Line>,
    config: &RespellingConfig,
) -> Result<(), CodecError> {
    // only the first two commas delimit; text keeps the rest verbatim
    let mut parts = raw_line.splitn(3, ',');
    let kind = parts.next().unwrap_or("").trim();
    let Some(time) = parts.next() else {
        return Err(CodecError::new(
            "E1004",
            format!("record needs a time (context={raw_line})"),
            line_no,
        )
        .with_context(raw_line.to_string()));
    };
    let time = parse_time(time, line_no)?;
    let text = parts.next().unwrap_or("");

    match kind {
        "L" => {
            if let Some(line) = open.take() {
                close_line(line, time, line_no, beatmap, config)?;
            } else if let Some(prev) = beatmap.lines.last() {
                if time < prev.end_time {
                    return Err(CodecError::new(
                        "E4002",
                        "line starts before the previous line ends",
                        line_no,
                    )
                    .with_time(time));
                }
            }
            *open = Some(Line::new(time, time, text));
        }
        "S" => {
            let Some(line) = open.as_mut() else {
                return Err(CodecError::new("E1006", "syllable before any line", line_no)
                    .with_time(time));
            };
            if time < line.start_time {
                return Err(CodecError::new(
                    "E4001",
                    format!("syllable precedes its line start ({})", line.start_time),
                    line_no,
                )
                .with_time(time));
            }
            if line.syllables.last().is_some_and(|s| time <= s.time) {
                return Err(CodecError::new(
                    "E4002",
                    "syllables must be strictly ascending",
                    line_no,
                )
                .with_time(time));
            }
            line.syllables.push(Syllable {
                time,
                text: text.to_string(),
                kana: Vec::new(),
            });
        }
        "E" => {
            if let Some(line) = open.take() {
                close_line(line, time, line_no, beatmap, config)?;
            }
            beatmap.end_time = Some(time);
        }
        other => {
            return Err(CodecError::new(
                "E1005",
                format!("unknown record type: {other}"),
                line_no,
            )
            .with_context(raw_line.to_string()));
        }
    }
    Ok(())
}

fn close_line(
    mut line: Line,
    end_time: Milliseconds,
    line_no: usize,
    beatmap: &mut Beatmap,
    config: &RespellingConfig,
) -> Result<(), CodecError> {
    if end_time <= line.start_time {
        return Err(CodecError::new(
            "E4002",
            format!("line at {} closes at or before its start", line.start_time),
            line_no,
        )
        .with_time(end_time));
    }
    if line.syllables.last().is_some_and(|s| s.time >= end_time) {
        return Err(CodecError::new(
            "E4004",
            format!("line at {} closes before its last syllable", line.start_time),
            line_no,
        )
        .with_time(end_time));
    }
    line.end_time = end_time;
    kana::annotate_line(&mut line, config);
    beatmap.lines.push(line);
    Ok(())
}

fn parse_time(s: &str, line_no: usize) -> Result<Milliseconds, CodecError> {
    s.trim().parse().map_err(|_| {
        CodecError::new("E3001", format!("invalid time: {}", s.trim()), line_no)
            .with_context(s.to_string())
    })
}
