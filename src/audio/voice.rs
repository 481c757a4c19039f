use super::{ToneEnvelope, Wave};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeState {
    Attack,
    Decay,
    Hold,
    Release,
    Done,
}

/// Stage boundaries in seconds for a tone of `duration`, kept in order even
/// when the tone is shorter than the attack.
fn breakpoints(env: &ToneEnvelope, duration: f32) -> [f32; 4] {
    let attack_end = env.attack.min(duration);
    let decay_end = (env.decay_at * duration).max(attack_end);
    let hold_end = (env.hold_until * duration).max(decay_end);
    [attack_end, decay_end, hold_end, duration.max(hold_end)]
}

pub fn envelope_state(env: &ToneEnvelope, time: f32, duration: f32) -> EnvelopeState {
    let [attack_end, decay_end, hold_end, end] = breakpoints(env, duration);
    if time < attack_end {
        EnvelopeState::Attack
    } else if time < decay_end {
        EnvelopeState::Decay
    } else if time < hold_end {
        EnvelopeState::Hold
    } else if time < end {
        EnvelopeState::Release
    } else {
        EnvelopeState::Done
    }
}

fn lerp(from: f32, to: f32, start: f32, end: f32, time: f32) -> f32 {
    if end <= start {
        return to;
    }
    from + (to - from) * ((time - start) / (end - start))
}

pub fn calculate_envelope(env: &ToneEnvelope, time: f32, duration: f32) -> f32 {
    let [attack_end, decay_end, hold_end, end] = breakpoints(env, duration);
    match envelope_state(env, time, duration) {
        EnvelopeState::Attack => lerp(0.0, env.peak, 0.0, attack_end, time),
        EnvelopeState::Decay => lerp(env.peak, env.decay_level, attack_end, decay_end, time),
        EnvelopeState::Hold => lerp(env.decay_level, env.hold_level, decay_end, hold_end, time),
        EnvelopeState::Release => {
            let start = env.hold_level.max(env.floor);
            let progress = (time - hold_end) / (end - hold_end);
            start * (env.floor / start).powf(progress)
        }
        EnvelopeState::Done => 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct Voice {
    pub frequency: f32,
    pub duration: f32,
    pub elapsed: f32,
    pub phase: f32,
}

impl Voice {
    pub fn new(frequency: f32, duration: f32) -> Self {
        Self {
            frequency,
            duration,
            elapsed: 0.0,
            phase: 0.0,
        }
    }

    pub fn is_finished(&self, env: &ToneEnvelope) -> bool {
        envelope_state(env, self.elapsed, self.duration) == EnvelopeState::Done
    }

    pub fn render_sample(&mut self, wave: Wave, env: &ToneEnvelope, sample_rate: f32) -> f32 {
        let level = calculate_envelope(env, self.elapsed, self.duration);
        let sample = wave.sample(self.phase) * level;

        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        self.elapsed += 1.0 / sample_rate;

        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn follows_the_default_curve() {
        let env = ToneEnvelope::default();
        assert!(close(calculate_envelope(&env, 0.0, 1.0), 0.0));
        assert!(close(calculate_envelope(&env, 0.01, 1.0), 0.15));
        assert!(close(calculate_envelope(&env, 0.1, 1.0), 0.2));
        assert!(close(calculate_envelope(&env, 0.8, 1.0), 0.15));
        assert!(calculate_envelope(&env, 0.999, 1.0) < 0.002);
        assert_eq!(calculate_envelope(&env, 1.0, 1.0), 0.0);
    }

    #[test]
    fn stages_progress_in_order() {
        let env = ToneEnvelope::default();
        assert_eq!(envelope_state(&env, 0.0, 2.0), EnvelopeState::Attack);
        assert_eq!(envelope_state(&env, 0.1, 2.0), EnvelopeState::Decay);
        assert_eq!(envelope_state(&env, 1.0, 2.0), EnvelopeState::Hold);
        assert_eq!(envelope_state(&env, 1.8, 2.0), EnvelopeState::Release);
        assert_eq!(envelope_state(&env, 2.0, 2.0), EnvelopeState::Done);
    }

    #[test]
    fn very_short_tones_stay_bounded() {
        let env = ToneEnvelope::default();
        for i in 0..10 {
            let level = calculate_envelope(&env, i as f32 * 0.001, 0.01);
            assert!(level.is_finite());
            assert!((0.0..=env.peak).contains(&level));
        }
    }

    #[test]
    fn voice_finishes_after_its_duration() {
        let env = ToneEnvelope::default();
        let mut voice = Voice::new(440.0, 0.01);
        let sample_rate = 1000.0;
        for _ in 0..10 {
            assert!(!voice.is_finished(&env));
            voice.render_sample(Wave::Triangle, &env, sample_rate);
        }
        voice.render_sample(Wave::Triangle, &env, sample_rate);
        assert!(voice.is_finished(&env));
    }
}
