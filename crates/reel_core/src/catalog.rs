use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub avatar_id: String,
    #[serde(default)]
    pub avatar_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_video_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_audio: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Drops avatars whose gender the backend could not determine.
pub fn usable_avatars(avatars: Vec<Avatar>) -> Vec<Avatar> {
    avatars
        .into_iter()
        .filter(|avatar| avatar.gender != UNKNOWN)
        .collect()
}

/// Drops voices with unknown language or gender and lower-cases the gender.
pub fn usable_voices(voices: Vec<Voice>) -> Vec<Voice> {
    voices
        .into_iter()
        .filter(|voice| voice.language != UNKNOWN && voice.gender != UNKNOWN)
        .map(|mut voice| {
            voice.gender = voice.gender.to_lowercase();
            voice
        })
        .collect()
}

/// Language / gender filter for the voice picker. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceFilter {
    pub language: Option<String>,
    pub gender: Option<String>,
}

impl VoiceFilter {
    pub fn matches(&self, voice: &Voice) -> bool {
        let language_ok = self
            .language
            .as_deref()
            .is_none_or(|language| voice.language == language);
        let gender_ok = self
            .gender
            .as_deref()
            .is_none_or(|gender| voice.gender == gender.to_lowercase());
        language_ok && gender_ok
    }

    pub fn apply<'a>(&self, voices: &'a [Voice]) -> Vec<&'a Voice> {
        voices.iter().filter(|voice| self.matches(voice)).collect()
    }
}
