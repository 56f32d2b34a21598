use enu_schema::Milliseconds;

/// Maps caller-supplied system time (ms) to song time at a playback speed.
///
/// Song time is extrapolated from the last anchor, so the clock never reads
/// the system clock itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    speed: f64,
    anchor_song_time: f64,
    anchor_system_time: f64,
    playing: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Playback {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            anchor_song_time: 0.0,
            anchor_system_time: 0.0,
            playing: false,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn start(&mut self, system_now: f64) {
        if self.playing {
            return;
        }
        self.anchor_system_time = system_now;
        self.playing = true;
    }

    pub fn pause(&mut self, system_now: f64) {
        self.anchor_song_time = self.extrapolate(system_now);
        self.playing = false;
    }

    /// Jumps to `song_time`; playback continues from there if running.
    pub fn seek(&mut self, song_time: Milliseconds, system_now: f64) {
        self.anchor_song_time = song_time as f64;
        self.anchor_system_time = system_now;
    }

    pub fn song_time(&self, system_now: f64) -> Milliseconds {
        (self.extrapolate(system_now) + 0.5).floor() as Milliseconds
    }

    fn extrapolate(&self, system_now: f64) -> f64 {
        if !self.playing {
            return self.anchor_song_time;
        }
        self.anchor_song_time + (system_now - self.anchor_system_time) * self.speed
    }
}
