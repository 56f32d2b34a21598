use enu_engine::{stats, GameState, InputLayout};
use enu_schema::Beatmap;

pub fn print_replay_report(state: &GameState, key_count: usize) {
    if state.lines.is_empty() {
        println!("Beatmap is empty.");
        return;
    }

    println!("Replay ({} keys, {} lines)", key_count, state.lines.len());
    println!("Time(ms) | Kana  | Typed | Miss | Score    | Text");
    println!("---------|-------|-------|------|----------|------------------");

    for (line, source) in state.lines.iter().zip(&state.source) {
        let kana = line.syllables.iter().flat_map(|s| &s.kana);
        let total = kana.clone().count();
        let typed = kana.clone().filter(|k| k.is_typed()).count();
        let misses: u32 = kana.clone().map(|k| k.misses).sum();
        let score: f64 = kana.map(|k| k.score).sum();
        let text: String = line.syllables.iter().map(|s| s.text.as_str()).collect();

        println!(
            "{:8} | {:5} | {:5} | {:4} | {:8.1} | {}",
            source.start_time, total, typed, misses, score, text
        );
    }

    let end = state.source.last().map_or(0, |l| l.end_time);
    let totals = &state.stats;
    println!();
    println!("hits:          {}", totals.hits);
    println!("misses:        {}", totals.misses);
    println!("accuracy:      {:.2}%", totals.accuracy());
    println!("kana accuracy: {:.2}%", totals.kana_accuracy());
    println!("kpm:           {:.0}", stats::current_kpm(state, end));
    println!("score:         {:.0}", totals.score);
}

pub fn print_beatmap_info(beatmap: &Beatmap, layout: InputLayout) {
    println!("Lines: {}", beatmap.lines.len());
    println!("Time(ms) | Kana | Keys | KPM   | Text");
    println!("---------|------|------|-------|------------------");

    for line in &beatmap.lines {
        println!(
            "{:8} | {:4} | {:4} | {:5.0} | {}",
            line.start_time,
            stats::line_kana_count(line),
            stats::line_keypresses(line, layout),
            stats::line_kpm(line, layout),
            line.lyric
        );
    }

    println!();
    println!("kpm: {:.0}", stats::beatmap_kpm(beatmap, layout));
}
