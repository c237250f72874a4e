use std::fmt;

use serde::{Deserialize, Serialize};

/// Equal-tempered reference pitch: A above middle C.
pub const A4_HZ: f32 = 440.0;

/// The twelve equal-tempered pitch classes, octave-independent.
///
/// Serializes as the note name ("C", "C#", ...) so the note→hue table in the
/// config file is keyed by plain note names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl PitchClass {
    /// Chromatic scale starting at C, matching semitone indices 0..=11.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nearest equal-tempered pitch class for a frequency.
///
/// Semitone offset from A4 is `round(12 * log2(f / 440))`; the offset is folded
/// into a single octave starting at C. Returns `None` for frequencies at or
/// below zero (a silent frame resolves to the 0 Hz bin) and for non-finite
/// values, so downstream consumers can treat "no pitch" as an explicit no-op
/// rather than an error.
pub fn classify(frequency: f32) -> Option<PitchClass> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }

    let semitones_from_a4 = (12.0 * (frequency / A4_HZ).log2()).round() as i64;
    // A sits 9 semitones above C within the octave.
    let index = (semitones_from_a4 + 9).rem_euclid(12) as usize;
    Some(PitchClass::ALL[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pitch_is_a() {
        assert_eq!(classify(440.0), Some(PitchClass::A));
    }

    #[test]
    fn one_semitone_up_is_a_sharp() {
        let a_sharp = 440.0 * 2f32.powf(1.0 / 12.0);
        assert_eq!(classify(a_sharp), Some(PitchClass::ASharp));
    }

    #[test]
    fn octaves_collapse_to_the_same_class() {
        assert_eq!(classify(220.0), Some(PitchClass::A));
        assert_eq!(classify(880.0), Some(PitchClass::A));
        assert_eq!(classify(110.0), Some(PitchClass::A));
    }

    #[test]
    fn middle_c_is_c() {
        assert_eq!(classify(261.63), Some(PitchClass::C));
    }

    #[test]
    fn nearest_neighbor_rounding() {
        // 450 Hz is ~0.39 semitones above A4, still nearest to A.
        assert_eq!(classify(450.0), Some(PitchClass::A));
        // 453.08 Hz is the A/A# midpoint; just above it rounds to A#.
        assert_eq!(classify(454.0), Some(PitchClass::ASharp));
    }

    #[test]
    fn degenerate_frequencies_have_no_pitch() {
        assert_eq!(classify(0.0), None);
        assert_eq!(classify(-42.0), None);
        assert_eq!(classify(f32::NAN), None);
        assert_eq!(classify(f32::INFINITY), None);
    }

    #[test]
    fn names_round_trip_through_serde() {
        let json = serde_json::to_string(&PitchClass::CSharp).unwrap();
        assert_eq!(json, "\"C#\"");
        let back: PitchClass = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PitchClass::CSharp);
    }
}
