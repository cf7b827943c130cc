//! Local device controls: microphone, camera, and output sound.

use serde::{Deserialize, Serialize};

/// One of the user-facing toggle switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Local audio capture, forwarded to the voice client.
    Microphone,
    /// Local video preview.
    Camera,
    /// Playback of the agent's audio.
    OutputSound,
}

impl Control {
    /// Returns the string label for this control.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::Camera => "camera",
            Self::OutputSound => "output_sound",
        }
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Control {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "microphone" => Ok(Self::Microphone),
            "camera" => Ok(Self::Camera),
            "output_sound" | "output-sound" => Ok(Self::OutputSound),
            _ => Err(ParseControlError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown control name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown control: {0}")]
pub struct ParseControlError(pub String);

/// Current position of every toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceControls {
    /// Microphone capture. On by default.
    pub microphone: bool,
    /// Camera preview. Off by default.
    pub camera: bool,
    /// Agent audio playback. On by default.
    pub output_sound: bool,
}

impl Default for DeviceControls {
    fn default() -> Self {
        Self {
            microphone: true,
            camera: false,
            output_sound: true,
        }
    }
}

impl DeviceControls {
    /// Returns the position of a single toggle.
    pub fn get(&self, control: Control) -> bool {
        match control {
            Control::Microphone => self.microphone,
            Control::Camera => self.camera,
            Control::OutputSound => self.output_sound,
        }
    }

    /// Sets a single toggle, returning its previous position.
    pub fn set(&mut self, control: Control, enabled: bool) -> bool {
        let slot = match control {
            Control::Microphone => &mut self.microphone,
            Control::Camera => &mut self.camera,
            Control::OutputSound => &mut self.output_sound,
        };
        std::mem::replace(slot, enabled)
    }
}
