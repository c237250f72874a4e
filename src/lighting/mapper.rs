use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::bridge::LightState;
use crate::audio::pitch::{self, PitchClass};

/// A target state for one light, built fresh per dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightCommand {
    pub light_id: u32,
    pub state: LightState,
}

/// Feature→light mapping tunables.
///
/// Every threshold is overridable from the config file; the defaults give a
/// usable room setup out of the box. The note→hue table is configuration data,
/// not logic: replace it wholesale to re-key the color wheel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Loudness at or below this maps to minimum brightness.
    pub min_volume: f32,
    /// Loudness at or above this maps to maximum brightness.
    pub max_volume: f32,
    pub min_brightness: u8,
    pub max_brightness: u8,
    /// Receives the partial updates (brightness-only, hue-only).
    pub primary_light: u32,
    /// Receives full merged states so partial updates never regress fields.
    pub secondary_light: u32,
    /// When set, resolved to an id via the bridge at startup.
    pub primary_light_name: Option<String>,
    pub secondary_light_name: Option<String>,
    /// Note→hue table spanning the color wheel, keyed by note name.
    pub note_colors: HashMap<PitchClass, u16>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            min_volume: 70.0,
            max_volume: 3000.0,
            min_brightness: 13, // 5% of the 254-step brightness range
            max_brightness: 254,
            primary_light: 2,
            secondary_light: 1,
            primary_light_name: None,
            secondary_light_name: None,
            note_colors: default_note_colors(),
        }
    }
}

pub fn default_note_colors() -> HashMap<PitchClass, u16> {
    HashMap::from([
        (PitchClass::C, 65535),      // soft red
        (PitchClass::CSharp, 6000),  // warm orange
        (PitchClass::D, 12000),      // gold
        (PitchClass::DSharp, 17500), // light green
        (PitchClass::E, 22000),      // soft green
        (PitchClass::F, 26500),      // turquoise
        (PitchClass::FSharp, 31000), // light blue
        (PitchClass::G, 35500),      // soft blue
        (PitchClass::GSharp, 40000), // lavender
        (PitchClass::A, 44500),      // light pink
        (PitchClass::ASharp, 50000), // soft pink
        (PitchClass::B, 55000),      // rose
    ])
}

/// Translates feature values into light commands.
///
/// The mapper is pure given its inputs and the retained last-commanded state;
/// dispatching the returned commands is the caller's business. One
/// last-commanded state is retained per light id so the merged updates sent to
/// the secondary light never regress fields a partial update didn't touch.
pub struct LightingMapper {
    config: MappingConfig,
    last_commanded: HashMap<u32, LightState>,
}

impl LightingMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            config,
            last_commanded: HashMap::new(),
        }
    }

    /// Smoothed loudness → brightness.
    ///
    /// Clamps to [min_volume, max_volume], normalizes, and rescales into
    /// [min_brightness, max_brightness]. The primary light gets the brightness
    /// alone; the secondary light gets its full merged state.
    pub fn map_volume(&mut self, volume: f32) -> Vec<LightCommand> {
        let update = LightState {
            on: Some(true),
            bri: Some(self.brightness_for(volume)),
            hue: None,
        };

        vec![
            self.partial_command(self.config.primary_light, update),
            self.merged_command(self.config.secondary_light, update),
        ]
    }

    /// Dominant frequency → hue via the note table.
    ///
    /// A frequency with no pitch (silent frame) or a note missing from the
    /// table produces no commands at all; that is a deliberate no-op, not an
    /// error.
    pub fn map_frequency(&mut self, frequency: f32) -> Vec<LightCommand> {
        let Some(note) = pitch::classify(frequency) else {
            return Vec::new();
        };
        let Some(&hue) = self.config.note_colors.get(&note) else {
            debug!("no color configured for note {note}");
            return Vec::new();
        };

        let update = LightState {
            on: Some(true),
            bri: None,
            hue: Some(hue),
        };

        // Hue goes to the primary light; the retained secondary state absorbs
        // it too so later merged updates carry the color.
        let command = self.partial_command(self.config.primary_light, update);
        self.retained(self.config.secondary_light).merge(&update);
        vec![command]
    }

    fn brightness_for(&self, volume: f32) -> u8 {
        let volume_range = self.config.max_volume - self.config.min_volume;
        let brightness_range = (self.config.max_brightness - self.config.min_brightness) as f32;
        let normalized = ((volume - self.config.min_volume) / volume_range).clamp(0.0, 1.0);
        (normalized * brightness_range + self.config.min_brightness as f32).round() as u8
    }

    fn partial_command(&mut self, light_id: u32, update: LightState) -> LightCommand {
        self.retained(light_id).merge(&update);
        LightCommand {
            light_id,
            state: update,
        }
    }

    fn merged_command(&mut self, light_id: u32, update: LightState) -> LightCommand {
        let retained = self.retained(light_id);
        retained.merge(&update);
        LightCommand {
            light_id,
            state: *retained,
        }
    }

    fn retained(&mut self, light_id: u32) -> &mut LightState {
        self.last_commanded.entry(light_id).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> LightingMapper {
        LightingMapper::new(MappingConfig::default())
    }

    fn brightness_of(commands: &[LightCommand], light_id: u32) -> u8 {
        commands
            .iter()
            .find(|c| c.light_id == light_id)
            .and_then(|c| c.state.bri)
            .unwrap()
    }

    #[test]
    fn quiet_input_clamps_to_minimum_brightness() {
        let mut mapper = mapper();
        for volume in [0.0, 42.0, 70.0] {
            let commands = mapper.map_volume(volume);
            assert_eq!(brightness_of(&commands, 2), 13, "volume {volume}");
        }
    }

    #[test]
    fn loud_input_clamps_to_maximum_brightness() {
        let mut mapper = mapper();
        for volume in [3000.0, 10_000.0] {
            let commands = mapper.map_volume(volume);
            assert_eq!(brightness_of(&commands, 2), 254, "volume {volume}");
        }
    }

    #[test]
    fn midpoint_volume_lands_mid_range() {
        let mut mapper = mapper();
        let commands = mapper.map_volume(1535.0);
        // Halfway through [70, 3000]: 0.5 * 241 + 13, rounded.
        assert_eq!(brightness_of(&commands, 2), 134);
    }

    #[test]
    fn brightness_is_monotonic_in_loudness() {
        let mut mapper = mapper();
        let mut previous = 0;
        for step in 0..100 {
            let volume = step as f32 * 40.0;
            let brightness = brightness_of(&mapper.map_volume(volume), 2);
            assert!(brightness >= previous, "volume {volume}");
            previous = brightness;
        }
    }

    #[test]
    fn volume_commands_cover_both_lights() {
        let mut mapper = mapper();
        let commands = mapper.map_volume(500.0);

        assert_eq!(commands.len(), 2);
        let primary = &commands[0];
        assert_eq!(primary.light_id, 2);
        assert_eq!(primary.state.hue, None);
        let secondary = &commands[1];
        assert_eq!(secondary.light_id, 1);
        assert_eq!(secondary.state.on, Some(true));
    }

    #[test]
    fn pitch_maps_to_the_configured_hue() {
        let mut mapper = mapper();
        let commands = mapper.map_frequency(440.0);

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].light_id, 2);
        assert_eq!(commands[0].state.hue, Some(44_500));
        assert_eq!(commands[0].state.bri, None);
    }

    #[test]
    fn merged_update_preserves_retained_hue() {
        let mut mapper = mapper();
        // Pitch path sets A's hue, then a brightness-only update follows.
        mapper.map_frequency(440.0);
        let commands = mapper.map_volume(1000.0);

        let secondary = commands.iter().find(|c| c.light_id == 1).unwrap();
        assert_eq!(secondary.state.hue, Some(44_500));
        assert!(secondary.state.bri.is_some());
    }

    #[test]
    fn no_pitch_means_no_commands() {
        let mut mapper = mapper();
        assert!(mapper.map_frequency(0.0).is_empty());
        assert!(mapper.map_frequency(-100.0).is_empty());
    }

    #[test]
    fn unmapped_note_means_no_commands() {
        let mut config = MappingConfig::default();
        config.note_colors.remove(&PitchClass::A);
        let mut mapper = LightingMapper::new(config);
        assert!(mapper.map_frequency(440.0).is_empty());
    }
}
