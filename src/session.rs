use std::time::{Duration, Instant};

/// Rate used when the user has not expressed a preference yet.
pub const DEFAULT_WPM: u32 = 600;

/// Playback half of the reader: Idle between runs, Playing while the cadence
/// timer is armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Playback {
    Idle,
    Playing,
}

/// Repeating deadline that drives word advancement. One of these exists
/// exactly while the session is Playing; it is armed on entry and dropped on
/// every exit path.
#[derive(Clone, Copy, Debug)]
struct CadenceTimer {
    period: Duration,
    deadline: Instant,
}

impl CadenceTimer {
    fn arm(now: Instant, period: Duration) -> Self {
        Self {
            period,
            deadline: now + period,
        }
    }

    fn due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Re-arm relative to the previous deadline so polling jitter does not
    /// accumulate into drift.
    fn rearm(&mut self) {
        self.deadline += self.period;
    }
}

/// Outcome of polling the session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// No deadline elapsed.
    Quiet,
    /// The displayed word changed.
    Advanced,
    /// The last word was reached and playback ended.
    Finished,
}

/// One reading session: the pasted text, the configured rate, and the
/// playback cursor into the text's words.
#[derive(Debug)]
pub struct ReadingSession {
    text: String,
    wpm: u32,
    position: usize,
    playback: Playback,
    fullscreen: bool,
    timer: Option<CadenceTimer>,
}

impl ReadingSession {
    pub fn new(text: String, wpm: u32) -> Self {
        debug_assert!(wpm > 0, "rate must be validated before reaching the session");
        Self {
            text,
            wpm,
            position: 0,
            playback: Playback::Idle,
            fullscreen: false,
            timer: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback == Playback::Playing
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Words of the current text, derived on demand so the same split rule
    /// backs playback, the word count, and the duration estimate.
    pub fn words(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Estimated total reading time in seconds at the current rate.
    pub fn reading_time_secs(&self) -> f64 {
        self.word_count() as f64 / f64::from(self.wpm) * 60.0
    }

    /// Word under the playback cursor, if the text has one there.
    pub fn current_word(&self) -> Option<&str> {
        self.words().get(self.position).copied()
    }

    /// Interval between cadence ticks at the current rate. Fractional
    /// milliseconds are kept: the period is exactly 60000/wpm ms.
    pub fn cadence(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.wpm))
    }

    /// Replace the text wholesale. Refused while Playing.
    pub fn set_text(&mut self, text: String) -> bool {
        if self.is_playing() {
            return false;
        }
        self.text = text;
        true
    }

    /// Append a typed character to the text. Refused while Playing.
    pub fn push_char(&mut self, c: char) -> bool {
        if self.is_playing() {
            return false;
        }
        self.text.push(c);
        true
    }

    /// Append pasted input to the text. Refused while Playing.
    pub fn push_input(&mut self, input: &str) -> bool {
        if self.is_playing() {
            return false;
        }
        self.text.push_str(input);
        true
    }

    /// Delete the last character of the text. Refused while Playing.
    pub fn pop_char(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.text.pop().is_some()
    }

    /// Change the rate. Refuses zero and any change while Playing.
    pub fn set_wpm(&mut self, wpm: u32) -> bool {
        if self.is_playing() || wpm == 0 {
            return false;
        }
        self.wpm = wpm;
        true
    }

    /// Display toggle, independent of playback state.
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    /// Enter Playing: the cursor rewinds to the first word and the cadence
    /// timer is armed. Starting on empty text is permitted; the first tick
    /// then ends playback without displaying anything.
    pub fn start(&mut self, now: Instant) {
        self.position = 0;
        self.playback = Playback::Playing;
        self.timer = Some(CadenceTimer::arm(now, self.cadence()));
    }

    /// Leave Playing, discarding progress: the cursor rewinds to 0. A
    /// terminal advance, by contrast, leaves the cursor on the last word.
    pub fn stop(&mut self) {
        self.playback = Playback::Idle;
        self.position = 0;
        self.timer = None;
    }

    /// Fire every cadence deadline that `now` has passed. A late poll may
    /// advance several words in one call. Reaching the last word ends
    /// playback, releases the timer, and leaves the cursor where it is.
    pub fn on_tick(&mut self, now: Instant) -> Tick {
        let mut outcome = Tick::Quiet;
        while self.timer.map_or(false, |t| t.due(now)) {
            if self.position + 1 < self.words().len() {
                self.position += 1;
                if let Some(timer) = self.timer.as_mut() {
                    timer.rearm();
                }
                outcome = Tick::Advanced;
            } else {
                self.playback = Playback::Idle;
                self.timer = None;
                outcome = Tick::Finished;
            }
        }
        outcome
    }
}
