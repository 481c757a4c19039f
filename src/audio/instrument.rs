use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Wave {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Wave {
    /// One sample at `phase` in [0, 1).
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Wave::Sine => (phase * 2.0 * std::f32::consts::PI).sin(),
            Wave::Square => {
                if phase < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            Wave::Saw => phase * 2.0 - 1.0,
            Wave::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// Gain curve applied to every tone, scaled to the tone's length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneEnvelope {
    /// Seconds to reach `peak`
    pub attack: f32,
    pub peak: f32,
    /// Fraction of the tone length
    pub decay_at: f32,
    pub decay_level: f32,
    /// Fraction of the tone length
    pub hold_until: f32,
    pub hold_level: f32,
    /// Level reached exponentially at the end of the tone
    pub floor: f32,
}

impl Default for ToneEnvelope {
    fn default() -> Self {
        Self {
            attack: 0.02,
            peak: 0.3,
            decay_at: 0.1,
            decay_level: 0.2,
            hold_until: 0.8,
            hold_level: 0.15,
            floor: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub wave: Wave,
    /// 0.0 -> 1.0
    pub volume: f32,
    pub envelope: ToneEnvelope,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            wave: Wave::Triangle,
            volume: 1.0,
            envelope: ToneEnvelope::default(),
        }
    }
}
