//! Playback state machine and emission bookkeeping
//!
//! States: `Stopped → Playing → {Paused ⇄ Playing} → Stopped`.
//! While playing, an emission window of `duration` seconds governs
//! whether new particles may spawn; the window either completes once
//! (non-looping) or wraps and re-opens (looping). Time accumulators
//! are f64 so rate bookkeeping does not drift over long runs.

/// Playback status of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Result of a `play()` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTransition {
    /// Fresh start: accumulators were reset
    Started,
    /// Resumed from pause without resetting anything
    Resumed,
}

/// Emission-window event produced while advancing time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// A non-looping window ran out; no further spawning
    EmissionComplete,
    /// A looping window wrapped; payload is the new loop count
    Loop(u32),
}

/// Time accumulators and emission flags for one emitter
#[derive(Debug, Clone, Default)]
pub struct Playback {
    state: PlaybackState,
    has_started: bool,
    is_emitting: bool,
    has_finished_emission: bool,
    /// Total playing time since the last fresh start
    time: f64,
    /// Time within the current emission window
    emission_time: f64,
    /// Watermark for drift-free rate-based spawning
    last_emission_time: f64,
    loop_count: u32,
    burst_fired: bool,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn is_emitting(&self) -> bool {
        self.is_emitting
    }

    pub fn has_finished_emission(&self) -> bool {
        self.has_finished_emission
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn emission_time(&self) -> f64 {
        self.emission_time
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Start playing, or resume if merely paused. Returns `None` when
    /// already playing.
    pub fn play(&mut self) -> Option<PlayTransition> {
        match self.state {
            PlaybackState::Playing => None,
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                Some(PlayTransition::Resumed)
            }
            PlaybackState::Stopped => {
                self.state = PlaybackState::Playing;
                self.has_started = true;
                self.is_emitting = true;
                self.has_finished_emission = false;
                self.time = 0.0;
                self.emission_time = 0.0;
                self.last_emission_time = 0.0;
                self.loop_count = 0;
                self.burst_fired = false;
                Some(PlayTransition::Started)
            }
        }
    }

    /// Freeze playback. Accumulated time and particle ages are untouched.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        self.state = PlaybackState::Playing;
        true
    }

    /// Return to `Stopped`, resetting every accumulator
    pub fn stop(&mut self) -> bool {
        if self.state == PlaybackState::Stopped && !self.has_started {
            return false;
        }
        *self = Self::default();
        true
    }

    /// Advance the emission window by `delta` seconds. Must only be
    /// called while `Playing`.
    pub fn advance(&mut self, delta: f64, looping: bool, duration: f64) -> Option<WindowEvent> {
        debug_assert_eq!(self.state, PlaybackState::Playing);
        self.time += delta;
        self.emission_time += delta;

        if self.emission_time < duration {
            return None;
        }
        if looping {
            self.emission_time = 0.0;
            self.is_emitting = true;
            self.has_finished_emission = false;
            self.burst_fired = false;
            self.last_emission_time = self.time;
            self.loop_count += 1;
            Some(WindowEvent::Loop(self.loop_count))
        } else if !self.has_finished_emission {
            self.is_emitting = false;
            self.has_finished_emission = true;
            Some(WindowEvent::EmissionComplete)
        } else {
            None
        }
    }

    /// How many particles the current tick may spawn.
    ///
    /// Burst mode fires the whole batch once per emission window, at
    /// its start. Rate mode computes
    /// `floor((time - last_emission_time) * rate)` and advances the
    /// watermark by `count / rate`, using the computed count rather
    /// than the availability-capped one, so a full pool cannot build
    /// a backlog.
    pub fn spawn_budget(&mut self, burst: bool, burst_count: u32, rate: f64) -> u32 {
        if !self.is_emitting || self.state != PlaybackState::Playing {
            return 0;
        }
        if burst {
            if self.burst_fired {
                return 0;
            }
            self.burst_fired = true;
            burst_count
        } else {
            if rate <= 0.0 {
                return 0;
            }
            let count = ((self.time - self.last_emission_time) * rate).floor();
            if count <= 0.0 {
                return 0;
            }
            let count = count.min(u32::MAX as f64);
            self.last_emission_time += count / rate;
            count as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_playback_is_stopped() {
        let pb = Playback::new();
        assert_eq!(pb.state(), PlaybackState::Stopped);
        assert!(!pb.has_started());
        assert!(!pb.is_emitting());
    }

    #[test]
    fn play_pause_resume_stop_transitions() {
        let mut pb = Playback::new();
        assert_eq!(pb.play(), Some(PlayTransition::Started));
        assert_eq!(pb.state(), PlaybackState::Playing);
        assert!(pb.has_started());

        assert!(pb.pause());
        assert_eq!(pb.state(), PlaybackState::Paused);
        assert!(!pb.pause()); // already paused

        assert!(pb.resume());
        assert_eq!(pb.state(), PlaybackState::Playing);

        assert!(pb.stop());
        assert_eq!(pb.state(), PlaybackState::Stopped);
        assert!(!pb.has_started());
        assert_eq!(pb.time(), 0.0);
    }

    #[test]
    fn play_from_pause_resumes_without_reset() {
        let mut pb = Playback::new();
        pb.play();
        pb.advance(1.5, true, 10.0);
        pb.pause();
        assert_eq!(pb.play(), Some(PlayTransition::Resumed));
        assert!((pb.time() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn non_looping_window_completes_once() {
        let mut pb = Playback::new();
        pb.play();
        assert_eq!(pb.advance(0.5, false, 1.0), None);
        assert_eq!(pb.advance(0.6, false, 1.0), Some(WindowEvent::EmissionComplete));
        assert!(pb.has_finished_emission());
        assert!(!pb.is_emitting());
        // No second completion event
        assert_eq!(pb.advance(1.0, false, 1.0), None);
    }

    #[test]
    fn looping_window_wraps_and_counts() {
        let mut pb = Playback::new();
        pb.play();
        assert_eq!(pb.advance(1.0, true, 1.0), Some(WindowEvent::Loop(1)));
        assert!(pb.is_emitting());
        assert!((pb.emission_time() - 0.0).abs() < 1e-12);
        assert_eq!(pb.advance(1.0, true, 1.0), Some(WindowEvent::Loop(2)));
        assert_eq!(pb.loop_count(), 2);
    }

    #[test]
    fn burst_budget_fires_once_per_window() {
        let mut pb = Playback::new();
        pb.play();
        pb.advance(0.01, false, 1.0);
        assert_eq!(pb.spawn_budget(true, 50, 0.0), 50);
        assert_eq!(pb.spawn_budget(true, 50, 0.0), 0);

        // A loop wrap re-arms the burst
        let mut pb = Playback::new();
        pb.play();
        pb.advance(0.01, true, 1.0);
        assert_eq!(pb.spawn_budget(true, 8, 0.0), 8);
        pb.advance(1.0, true, 1.0);
        assert_eq!(pb.spawn_budget(true, 8, 0.0), 8);
    }

    #[test]
    fn rate_budget_has_no_drift_over_1000_ticks() {
        let mut pb = Playback::new();
        pb.play();
        let rate = 30.0;
        let dt = 1.0 / 60.0;
        let mut emitted: u64 = 0;
        let mut prev_total = 0;
        for _ in 0..1000 {
            pb.advance(dt, true, 1e9);
            let n = pb.spawn_budget(false, 0, rate) as u64;
            emitted += n;
            assert!(emitted >= prev_total); // monotonic non-decreasing
            prev_total = emitted;
        }
        // 1000 ticks of 1/60s at 30/s → 500 particles, within ±1
        let expected = (rate * dt * 1000.0).floor() as i64;
        assert!((emitted as i64 - expected).abs() <= 1, "emitted {emitted}");
    }

    #[test]
    fn no_budget_while_not_emitting() {
        let mut pb = Playback::new();
        pb.play();
        pb.advance(2.0, false, 1.0); // window complete
        assert_eq!(pb.spawn_budget(false, 0, 100.0), 0);
        assert_eq!(pb.spawn_budget(true, 10, 0.0), 0);
    }
}
