//! The in-memory mirror of the device state.
//!
//! A reply to `{"getData": 1}` is a flat JSON object. [`ExoyOneState`] decodes
//! it field for field; the serde names below are a contract with the device
//! firmware and keep its original casing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::ModePacks;
use crate::error::Result;

/// Physical device shapes, as reported in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    InfinityObject,
    Hypercube,
    UltraDenseHypercube,
    Dodecahedron,
    UltraDenseDodecahedron,
    Mirror,
    UltraDenseMirror,
    Icosahedron,
    UltraDenseIcosahedron,
    Tetrahedron,
    UltraDenseTetrahedron,
    Hexagon,
    UltraDenseHexagon,
    SoundVisualiser,
    UltraDenseSoundVisualiser,
}

impl DeviceType {
    pub fn from_wire(value: i64) -> Option<Self> {
        let device_type = match value {
            0 => DeviceType::InfinityObject,
            1 => DeviceType::Hypercube,
            2 => DeviceType::UltraDenseHypercube,
            3 => DeviceType::Dodecahedron,
            4 => DeviceType::UltraDenseDodecahedron,
            5 => DeviceType::Mirror,
            6 => DeviceType::UltraDenseMirror,
            7 => DeviceType::Icosahedron,
            8 => DeviceType::UltraDenseIcosahedron,
            9 => DeviceType::Tetrahedron,
            10 => DeviceType::UltraDenseTetrahedron,
            11 => DeviceType::Hexagon,
            12 => DeviceType::UltraDenseHexagon,
            13 => DeviceType::SoundVisualiser,
            14 => DeviceType::UltraDenseSoundVisualiser,
            _ => return None,
        };
        Some(device_type)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::InfinityObject => "Infinity Object",
            DeviceType::Hypercube => "Hypercube",
            DeviceType::UltraDenseHypercube => "Ultra Dense Hypercube",
            DeviceType::Dodecahedron => "Dodecahedron",
            DeviceType::UltraDenseDodecahedron => "Ultra Dense Dodecahedron",
            DeviceType::Mirror => "Mirror",
            DeviceType::UltraDenseMirror => "Ultra Dense Mirror",
            DeviceType::Icosahedron => "Icosahedron",
            DeviceType::UltraDenseIcosahedron => "Ultra Dense Icosahedron",
            DeviceType::Tetrahedron => "Tetrahedron",
            DeviceType::UltraDenseTetrahedron => "Ultra Dense Tetrahedron",
            DeviceType::Hexagon => "Hexagon",
            DeviceType::UltraDenseHexagon => "Ultra Dense Hexagon",
            DeviceType::SoundVisualiser => "Sound Visualiser",
            DeviceType::UltraDenseSoundVisualiser => "Ultra Dense Sound Visualiser",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Last known full state of the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExoyOneState {
    pub mdns_name: String,
    /// Raw device type; see [`ExoyOneState::device_type`].
    #[serde(rename = "type")]
    pub device_type_id: i64,
    pub brightness: i64,
    /// Pack index, may be negative when the device has no valid selection.
    pub current_modpack: i64,
    pub mode_index: i64,
    pub speed: i64,
    pub hue: i64,
    pub saturation: i64,
    pub auto_change: bool,
    pub music_sync: bool,
    /// Power state. The firmware calls it `fadingOff`; `true` means on.
    pub fading_off: bool,
    pub button_enabled: bool,
    pub scene_generation: bool,
    pub lock_color_wheel: bool,
    pub force_music_sync: bool,
    pub selected_pattern: i64,
    pub selected_render_mode: i64,
    pub selected_color_mode: i64,
    pub selected_palette: i64,
    pub user_defined_name: String,
    /// Seconds between effect changes while mode cycle is on.
    pub cycle_speed: i64,
    /// Seconds until shutdown, 0 when disabled.
    pub shutdown_timer: i64,
    pub direction: bool,
    #[serde(rename = "connectedToWiFi")]
    pub connected_to_wifi: bool,
    pub firmware_version: String,
    pub powered_by_powerbank: bool,
}

impl ExoyOneState {
    /// Decodes a `getData` reply that was already parsed into JSON.
    pub fn from_wire(payload: Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }

    /// Decodes a raw `getData` reply datagram.
    pub fn from_slice(datagram: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(datagram)?)
    }

    /// The state as the device would send it.
    pub fn to_wire_field_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct of plain scalars always serializes to an object.
            _ => Map::new(),
        }
    }

    pub fn device_type(&self) -> Option<DeviceType> {
        DeviceType::from_wire(self.device_type_id)
    }

    /// Catalog indices, or `None` when the device reports an invalid pair.
    pub fn effect_indices(&self) -> Option<(usize, usize)> {
        let pack_index = usize::try_from(self.current_modpack).ok()?;
        let effect_index = usize::try_from(self.mode_index).ok()?;
        Some((pack_index, effect_index))
    }

    pub fn pack_name(&self, catalog: &ModePacks) -> Option<&'static str> {
        let (pack_index, _) = self.effect_indices()?;
        catalog.pack_name(pack_index).ok()
    }

    pub fn effect_name(&self, catalog: &ModePacks) -> Option<&'static str> {
        let (pack_index, effect_index) = self.effect_indices()?;
        catalog.effect_name(pack_index, effect_index).ok()
    }

    /// Shutdown timer in whole minutes.
    pub fn shutdown_timer_minutes(&self) -> i64 {
        self.shutdown_timer / 60
    }

    /// Display projection grouped into hardware, device, effect and options.
    pub fn friendly(&self, catalog: &ModePacks) -> FriendlyView {
        let device_name = if self.user_defined_name.is_empty() {
            "Not Set".to_string()
        } else {
            self.user_defined_name.clone()
        };
        let device_type = self
            .device_type()
            .map(|device_type| device_type.label().to_string())
            .unwrap_or_else(|| format!("Unknown ({})", self.device_type_id));
        let shutdown_timer = if self.shutdown_timer > 0 {
            format!("{} minutes", self.shutdown_timer_minutes())
        } else {
            "Disabled".to_string()
        };
        let cycle_speed = if self.auto_change {
            format!("{} seconds", self.cycle_speed)
        } else {
            "Disabled".to_string()
        };
        let direction = if self.direction { "Left" } else { "Right" };

        FriendlyView {
            sections: vec![
                FriendlySection::new(
                    "Hardware Details",
                    vec![
                        ("mDNS Name", self.mdns_name.clone()),
                        ("Device Type", device_type),
                        ("Firmware Version", self.firmware_version.clone()),
                    ],
                ),
                FriendlySection::new(
                    "Device Details",
                    vec![
                        ("Device Name", device_name),
                        ("Power", on_off(self.fading_off)),
                        ("Powerbank Mode", on_off(self.powered_by_powerbank)),
                        ("Shutdown Timer", shutdown_timer),
                    ],
                ),
                FriendlySection::new(
                    "Effect Details",
                    vec![
                        (
                            "Color",
                            format!("({}, {}, {})", self.hue, self.saturation, self.brightness),
                        ),
                        (
                            "Mode Pack",
                            self.pack_name(catalog).unwrap_or("Unknown").to_string(),
                        ),
                        (
                            "Effect",
                            self.effect_name(catalog).unwrap_or("Unknown").to_string(),
                        ),
                        ("Effect Speed", self.speed.to_string()),
                        ("Effect Direction", direction.to_string()),
                    ],
                ),
                FriendlySection::new(
                    "Effect Options",
                    vec![
                        ("Music Sync", on_off(self.music_sync)),
                        ("Scene Generation", on_off(self.scene_generation)),
                        ("Mode Cycle", on_off(self.auto_change)),
                        ("Mode Cycle Speed", cycle_speed),
                    ],
                ),
            ],
        }
    }
}

// The trailing space is kept for output compatibility with existing consumers.
fn on_off(value: bool) -> String {
    let label = if value { "On " } else { "Off " };
    label.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendlyView {
    pub sections: Vec<FriendlySection>,
}

impl FriendlyView {
    pub fn section(&self, title: &str) -> Option<&FriendlySection> {
        self.sections.iter().find(|section| section.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendlySection {
    pub title: &'static str,
    pub fields: Vec<FriendlyField>,
}

impl FriendlySection {
    fn new(title: &'static str, fields: Vec<(&'static str, String)>) -> Self {
        FriendlySection {
            title,
            fields: fields
                .into_iter()
                .map(|(label, value)| FriendlyField { label, value })
                .collect(),
        }
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendlyField {
    pub label: &'static str,
    pub value: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::ExoyOneError;

    pub(crate) fn sample_payload() -> Value {
        json!({
            "mdnsName": "exoyone12345",
            "type": 4,
            "brightness": 200,
            "currentModpack": 6,
            "modeIndex": 2,
            "speed": 10,
            "hue": 120,
            "saturation": 255,
            "autoChange": false,
            "musicSync": true,
            "fadingOff": true,
            "buttonEnabled": true,
            "sceneGeneration": false,
            "lockColorWheel": false,
            "forceMusicSync": false,
            "selectedPattern": 1,
            "selectedRenderMode": 1,
            "selectedColorMode": 1,
            "selectedPalette": 1,
            "userDefinedName": "",
            "cycleSpeed": 20,
            "shutdownTimer": 1800,
            "direction": true,
            "connectedToWiFi": true,
            "firmwareVersion": "2.1",
            "poweredByPowerbank": false
        })
    }

    #[test]
    fn test_from_wire_decodes_all_fields() {
        let state = ExoyOneState::from_wire(sample_payload()).unwrap();
        assert_eq!(state.mdns_name, "exoyone12345");
        assert_eq!(state.device_type(), Some(DeviceType::UltraDenseDodecahedron));
        assert_eq!(state.effect_indices(), Some((6, 2)));
        assert!(state.connected_to_wifi);
        assert_eq!(state.shutdown_timer_minutes(), 30);
    }

    #[test]
    fn test_from_wire_rejects_missing_field() {
        let mut payload = sample_payload();
        payload.as_object_mut().unwrap().remove("connectedToWiFi");
        assert_matches!(
            ExoyOneState::from_wire(payload),
            Err(ExoyOneError::Decoding(_))
        );
    }

    #[test]
    fn test_from_wire_rejects_wrong_type() {
        let mut payload = sample_payload();
        payload["musicSync"] = json!("yes");
        assert_matches!(
            ExoyOneState::from_wire(payload),
            Err(ExoyOneError::Decoding(_))
        );
        assert_matches!(
            ExoyOneState::from_slice(b"not json"),
            Err(ExoyOneError::Decoding(_))
        );
    }

    #[test]
    fn test_from_wire_keeps_out_of_range_integers() {
        let mut payload = sample_payload();
        payload["hue"] = json!(300);
        payload["currentModpack"] = json!(-1);
        let state = ExoyOneState::from_wire(payload).unwrap();
        assert_eq!(state.hue, 300);
        assert_eq!(state.effect_indices(), None);
        assert_eq!(state.pack_name(&ModePacks::new()), None);
    }

    #[test]
    fn test_wire_field_map_uses_device_casing() {
        let payload = sample_payload();
        let state = ExoyOneState::from_wire(payload.clone()).unwrap();
        assert_eq!(Value::Object(state.to_wire_field_map()), payload);
    }

    #[test]
    fn test_friendly_view_formats_values() {
        let catalog = ModePacks::new();
        let state = ExoyOneState::from_wire(sample_payload()).unwrap();
        let view = state.friendly(&catalog);

        let titles: Vec<&str> = view.sections.iter().map(|section| section.title).collect();
        assert_eq!(
            titles,
            vec![
                "Hardware Details",
                "Device Details",
                "Effect Details",
                "Effect Options"
            ]
        );

        let device = view.section("Device Details").unwrap();
        assert_eq!(device.value("Device Name"), Some("Not Set"));
        assert_eq!(device.value("Power"), Some("On "));
        assert_eq!(device.value("Powerbank Mode"), Some("Off "));
        assert_eq!(device.value("Shutdown Timer"), Some("30 minutes"));

        let effect = view.section("Effect Details").unwrap();
        assert_eq!(effect.value("Color"), Some("(120, 255, 200)"));
        assert_eq!(effect.value("Mode Pack"), Some("Nature"));
        assert_eq!(effect.value("Effect"), Some("Aurora"));

        let options = view.section("Effect Options").unwrap();
        assert_eq!(options.value("Mode Cycle Speed"), Some("Disabled"));
    }

    #[test]
    fn test_friendly_view_disabled_timer_and_active_cycle() {
        let mut state = ExoyOneState::from_wire(sample_payload()).unwrap();
        state.shutdown_timer = 0;
        state.auto_change = true;
        state.mode_index = 40;
        let view = state.friendly(&ModePacks::new());

        let device = view.section("Device Details").unwrap();
        assert_eq!(device.value("Shutdown Timer"), Some("Disabled"));
        let options = view.section("Effect Options").unwrap();
        assert_eq!(options.value("Mode Cycle Speed"), Some("20 seconds"));
        let effect = view.section("Effect Details").unwrap();
        assert_eq!(effect.value("Effect"), Some("Unknown"));
    }
}
