//! A stand-in for a real ExoyOne.
//!
//! [`MockDevice`] speaks the same UDP protocol as the firmware: it answers
//! `{"getData": 1}` with its full state and applies every other request as a
//! set of commands, without replying. It backs the integration tests and the
//! `exoyone mock serve` command.

use std::net::SocketAddr;
use std::time::Duration;

use log::{error, info, warn};
use rand::Rng;
use serde_json::{Map, Value};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::Result;
use crate::state::ExoyOneState;

const MAX_DATAGRAM_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Stored as sent.
    Value,
    /// Stored as a boolean.
    Flag,
    /// `{"hours": h, "minutes": m}` stored as seconds.
    Timer,
    /// Accepted, no visible effect.
    Ignored,
}

/// Command name -> wire field it changes. Must follow the firmware field names.
const COMMAND_FIELDS: &[(&str, &str, FieldKind)] = &[
    ("setBrightness", "brightness", FieldKind::Value),
    ("setModPack", "currentModpack", FieldKind::Value),
    ("setEffect", "modeIndex", FieldKind::Value),
    ("setSpeed", "speed", FieldKind::Value),
    ("setHue", "hue", FieldKind::Value),
    ("setSaturation", "saturation", FieldKind::Value),
    ("toggleModeCycle", "autoChange", FieldKind::Flag),
    ("toggleMusicSync", "musicSync", FieldKind::Flag),
    ("togglePower", "fadingOff", FieldKind::Flag),
    ("toggleSceneGeneration", "sceneGeneration", FieldKind::Flag),
    ("toggleDirection", "direction", FieldKind::Flag),
    ("setName", "userDefinedName", FieldKind::Value),
    ("setCycleSpeed", "cycleSpeed", FieldKind::Value),
    ("setShutdownTimer", "shutdownTimer", FieldKind::Timer),
    ("poweredByPowerbank", "poweredByPowerbank", FieldKind::Flag),
    ("setPattern", "selectedPattern", FieldKind::Value),
    ("setRenderMode", "selectedRenderMode", FieldKind::Value),
    ("setColorMode", "selectedColorMode", FieldKind::Value),
    ("setPalette", "selectedPalette", FieldKind::Value),
    ("connectToWifi", "", FieldKind::Ignored),
    ("restartInApMode", "", FieldKind::Ignored),
];

pub struct MockDevice {
    socket: UdpSocket,
    state: Map<String, Value>,
    reply_delay: Option<Duration>,
}

impl MockDevice {
    /// Binds the mock to `address`, e.g. `127.0.0.1:8888` or `127.0.0.1:0`.
    pub async fn bind(address: &str) -> Result<Self> {
        let socket = UdpSocket::bind(address).await?;
        let mdns_name = format!("exoyone{:05}", rand::thread_rng().gen_range(12345..=67890));
        Ok(MockDevice {
            socket,
            state: Self::default_state(&mdns_name).to_wire_field_map(),
            reply_delay: None,
        })
    }

    /// Waits this long before answering each query.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    /// Starts from a specific state instead of the defaults.
    pub fn with_state(mut self, state: &ExoyOneState) -> Self {
        self.state = state.to_wire_field_map();
        self
    }

    /// Factory state: an ultra dense dodecahedron, powered off, first effect.
    pub fn default_state(mdns_name: &str) -> ExoyOneState {
        ExoyOneState {
            mdns_name: mdns_name.to_string(),
            device_type_id: 4,
            brightness: 0,
            current_modpack: 0,
            mode_index: 0,
            speed: 10,
            hue: 0,
            saturation: 255,
            auto_change: false,
            music_sync: false,
            fading_off: false,
            button_enabled: true,
            scene_generation: false,
            lock_color_wheel: false,
            force_music_sync: false,
            selected_pattern: 1,
            selected_render_mode: 1,
            selected_color_mode: 1,
            selected_palette: 1,
            user_defined_name: String::new(),
            cycle_speed: 20,
            shutdown_timer: 0,
            direction: true,
            connected_to_wifi: true,
            firmware_version: "2.1".to_string(),
            powered_by_powerbank: false,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Current backing state.
    pub fn state(&self) -> Result<ExoyOneState> {
        ExoyOneState::from_wire(Value::Object(self.state.clone()))
    }

    /// Serves requests until the socket fails.
    pub async fn serve(mut self) -> Result<()> {
        info!("MockDevice started serving on {}", self.local_addr()?);
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (received, peer) = self.socket.recv_from(&mut buffer).await?;
            let reply = self.handle_datagram(&buffer[..received]);
            if let Some(reply) = reply {
                if let Some(delay) = self.reply_delay {
                    sleep(delay).await;
                }
                info!("Sending state to {}", peer);
                if let Err(e) = self.socket.send_to(&reply, peer).await {
                    error!("Failed to reply to {}: {}", peer, e);
                }
            }
        }
    }

    /// Runs [`MockDevice::serve`] on the current runtime.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.serve())
    }

    /// Applies one request. Returns the reply for queries, `None` otherwise.
    fn handle_datagram(&mut self, datagram: &[u8]) -> Option<Vec<u8>> {
        let request: Map<String, Value> = match serde_json::from_slice(datagram) {
            Ok(request) => request,
            Err(e) => {
                error!("Discarding malformed request: {}", e);
                return None;
            }
        };

        if request.get("getData").and_then(Value::as_i64) == Some(1) {
            return serde_json::to_vec(&self.state).ok();
        }

        for (command, value) in &request {
            self.apply(command, value);
        }
        None
    }

    fn apply(&mut self, command: &str, value: &Value) {
        let Some((_, field, kind)) = COMMAND_FIELDS.iter().find(|(name, _, _)| *name == command)
        else {
            warn!("Ignoring unknown command {}", command);
            return;
        };

        let new_value = match kind {
            FieldKind::Value => value.clone(),
            FieldKind::Flag => Value::Bool(is_truthy(value)),
            FieldKind::Timer => {
                let part = |key: &str| value.get(key).and_then(Value::as_i64).unwrap_or(0);
                Value::from(part("hours") * 3600 + part("minutes") * 60)
            }
            FieldKind::Ignored => {
                info!("Accepted {} = {}", command, value);
                return;
            }
        };

        info!(
            "Changing {} from {} to {}",
            field,
            self.state.get(*field).unwrap_or(&Value::Null),
            new_value
        );
        self.state.insert(field.to_string(), new_value);
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
