use serde::Deserialize;

fn default_sample_rate() -> u32 {
    48_000
}

fn default_duration() -> f64 {
    60.0
}

fn default_num_voices() -> usize {
    4
}

fn default_max_voices() -> usize {
    16
}

fn default_min_osc_freq() -> f32 {
    120.0
}

fn default_max_osc_freq() -> f32 {
    1200.0
}

fn default_min_lfo_freq() -> f32 {
    0.01
}

fn default_max_lfo_freq() -> f32 {
    0.1
}

fn default_stereo_width() -> f32 {
    1.0
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionData {
    #[serde(alias = "globalSettings", alias = "global")]
    pub global_settings: GlobalSettings,
    #[serde(alias = "droneSettings", alias = "voices")]
    pub drone: DroneSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GlobalSettings {
    #[serde(default = "default_sample_rate", alias = "sampleRate")]
    pub sample_rate: u32,
    /// Render length in seconds when generating to a file.
    #[serde(default = "default_duration", alias = "durationSeconds")]
    pub duration: f64,
    #[serde(default, alias = "outputFilename")]
    pub output_filename: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DroneSettings {
    #[serde(default = "default_num_voices", alias = "numVoices")]
    pub num_voices: usize,
    #[serde(default = "default_max_voices", alias = "maxVoices")]
    pub max_voices: usize,
    #[serde(default = "default_min_osc_freq", alias = "minOscFreq")]
    pub min_osc_freq: f32,
    #[serde(default = "default_max_osc_freq", alias = "maxOscFreq")]
    pub max_osc_freq: f32,
    #[serde(default = "default_min_lfo_freq", alias = "minLfoFreq")]
    pub min_lfo_freq: f32,
    #[serde(default = "default_max_lfo_freq", alias = "maxLfoFreq")]
    pub max_lfo_freq: f32,
    #[serde(default, alias = "lfoRate")]
    pub lfo_rate: f32,
    #[serde(default = "default_stereo_width", alias = "stereoWidth")]
    pub stereo_width: f32,
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self {
            num_voices: default_num_voices(),
            max_voices: default_max_voices(),
            min_osc_freq: default_min_osc_freq(),
            max_osc_freq: default_max_osc_freq(),
            min_lfo_freq: default_min_lfo_freq(),
            max_lfo_freq: default_max_lfo_freq(),
            lfo_rate: 0.0,
            stereo_width: default_stereo_width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_session() {
        let json = r#"{
            "globalSettings": {
                "sampleRate": 44100,
                "durationSeconds": 30.0,
                "outputFilename": "out.wav"
            },
            "droneSettings": {
                "numVoices": 6,
                "maxVoices": 12,
                "minOscFreq": 200.0,
                "maxOscFreq": 800.0,
                "lfoRate": 0.3,
                "stereoWidth": 0.5
            }
        }"#;
        let session: SessionData = serde_json::from_str(json).unwrap();
        assert_eq!(session.global_settings.sample_rate, 44_100);
        assert_eq!(session.global_settings.duration, 30.0);
        assert_eq!(
            session.global_settings.output_filename.as_deref(),
            Some("out.wav")
        );
        assert_eq!(session.drone.num_voices, 6);
        assert_eq!(session.drone.max_voices, 12);
        assert_eq!(session.drone.min_osc_freq, 200.0);
        assert_eq!(session.drone.lfo_rate, 0.3);
        assert_eq!(session.drone.stereo_width, 0.5);
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let json = r#"{ "global": {}, "voices": {} }"#;
        let session: SessionData = serde_json::from_str(json).unwrap();
        assert_eq!(session.global_settings.sample_rate, 48_000);
        assert_eq!(session.global_settings.duration, 60.0);
        assert!(session.global_settings.output_filename.is_none());
        assert_eq!(session.drone.num_voices, 4);
        assert_eq!(session.drone.max_voices, 16);
        assert_eq!(session.drone.min_lfo_freq, 0.01);
        assert_eq!(session.drone.max_lfo_freq, 0.1);
        assert_eq!(session.drone.lfo_rate, 0.0);
        assert_eq!(session.drone.stereo_width, 1.0);
    }
}
