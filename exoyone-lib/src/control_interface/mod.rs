use std::time::Duration;

use derivative::Derivative;
use log::{debug, warn};
use serde_json::{json, Value};

use crate::catalog::ModePacks;
use crate::error::{ExoyOneError, Result};
use crate::state::ExoyOneState;
use crate::util::truthy::Switch;

pub mod transport;

pub use transport::{
    RetryPolicy, Transport, DEFAULT_PORT, DEFAULT_TIMEOUT, MAX_ATTEMPTS, MIN_BACKOFF_FACTOR,
};

pub const MAX_NAME_LENGTH: usize = 39;
pub const MAX_WIFI_CREDENTIAL_LENGTH: usize = 31;
pub const MIN_SHUTDOWN_MINUTES: i64 = 5;
pub const MAX_SHUTDOWN_MINUTES: i64 = 480;

/// An effect given either by name or by catalog position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectSelector {
    Name(String),
    Indices(usize, usize),
}

impl From<&str> for EffectSelector {
    fn from(name: &str) -> Self {
        EffectSelector::Name(name.to_string())
    }
}

impl From<String> for EffectSelector {
    fn from(name: String) -> Self {
        EffectSelector::Name(name)
    }
}

impl From<(usize, usize)> for EffectSelector {
    fn from((pack_index, effect_index): (usize, usize)) -> Self {
        EffectSelector::Indices(pack_index, effect_index)
    }
}

/// Client for a single ExoyOne light.
///
/// Holds the last state read from the device. Every setter sends its command,
/// reads the full state back and swaps it in, so [`ExoyOne::state`] always
/// reflects one complete reply. Setters take `&mut self`: one request in flight
/// per instance.
///
/// Two instances compare equal when they point at the same device and hold the
/// same state; timeouts and retry settings are ignored.
#[derive(Derivative)]
#[derivative(Debug, PartialEq)]
pub struct ExoyOne {
    #[derivative(PartialEq(compare_with = "same_endpoint"))]
    transport: Transport,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    catalog: ModePacks,
    state: Option<ExoyOneState>,
}

fn same_endpoint(a: &Transport, b: &Transport) -> bool {
    a.host() == b.host() && a.port() == b.port()
}

impl ExoyOne {
    /// Creates a client without talking to the device yet.
    pub fn new(host: &str, port: u16, catalog: ModePacks) -> Self {
        ExoyOne {
            transport: Transport::new(host, port),
            catalog,
            state: None,
        }
    }

    /// Creates a client and reads the initial state.
    pub async fn connect(host: &str, port: u16, catalog: ModePacks) -> Result<Self> {
        let mut exoyone = ExoyOne::new(host, port, catalog);
        exoyone.refresh().await?;
        Ok(exoyone)
    }

    /// Per-attempt timeout for every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.with_timeout(timeout);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.transport = self.transport.with_retry_policy(retry_policy);
        self
    }

    pub fn host(&self) -> &str {
        self.transport.host()
    }

    pub fn port(&self) -> u16 {
        self.transport.port()
    }

    pub fn catalog(&self) -> &ModePacks {
        &self.catalog
    }

    /// The last state read from the device, `None` before the first query.
    pub fn state(&self) -> Option<&ExoyOneState> {
        self.state.as_ref()
    }

    /// User-defined name if set, otherwise the mDNS name.
    pub fn name(&self) -> Option<&str> {
        self.state.as_ref().map(|state| {
            if state.user_defined_name.is_empty() {
                state.mdns_name.as_str()
            } else {
                state.user_defined_name.as_str()
            }
        })
    }

    pub fn device_type_label(&self) -> Option<&'static str> {
        self.state
            .as_ref()
            .and_then(ExoyOneState::device_type)
            .map(|device_type| device_type.label())
    }

    pub fn active_pack_name(&self) -> Option<&'static str> {
        self.state.as_ref()?.pack_name(&self.catalog)
    }

    pub fn active_effect_name(&self) -> Option<&'static str> {
        self.state.as_ref()?.effect_name(&self.catalog)
    }

    /// Reads the full state from the device.
    pub async fn refresh(&mut self) -> Result<()> {
        let state = self.transport.query().await?;
        self.state = Some(state);
        Ok(())
    }

    /// Refreshes and returns the new state.
    pub async fn get_state(&mut self) -> Result<&ExoyOneState> {
        let state = self.transport.query().await?;
        Ok(&*self.state.insert(state))
    }

    async fn set_data(&mut self, request: Value) -> Result<()> {
        debug!("Sending {} to {}", request, self.host());
        let state = self.transport.send_and_refresh(&request).await?;
        self.state = Some(state);
        Ok(())
    }

    async fn set_flag(&mut self, command: &str, value: Switch) -> Result<()> {
        let value = value.to_wire()?;
        self.set_data(json!({ command: value })).await
    }

    /// Restarts the device as a Wi-Fi access point. It is gone right after,
    /// so there is no read-back.
    pub async fn restart_in_ap_mode(&mut self) -> Result<()> {
        self.transport
            .send(&json!({ "restartInApMode": true }))
            .await
    }

    pub async fn toggle_power(&mut self, state: impl Into<Switch>) -> Result<()> {
        self.set_flag("togglePower", state.into()).await
    }

    pub async fn toggle_direction(&mut self, state: impl Into<Switch>) -> Result<()> {
        self.set_flag("toggleDirection", state.into()).await
    }

    /// Turns automatic effect changes on or off.
    pub async fn toggle_mode_cycle(&mut self, state: impl Into<Switch>) -> Result<()> {
        self.set_flag("toggleModeCycle", state.into()).await
    }

    pub async fn toggle_music_sync(&mut self, state: impl Into<Switch>) -> Result<()> {
        self.set_flag("toggleMusicSync", state.into()).await
    }

    pub async fn toggle_scene_generation(&mut self, state: impl Into<Switch>) -> Result<()> {
        self.set_flag("toggleSceneGeneration", state.into()).await
    }

    /// Reduces power consumption when running on a battery.
    pub async fn powered_by_powerbank(&mut self, state: impl Into<Switch>) -> Result<()> {
        self.set_flag("poweredByPowerbank", state.into()).await
    }

    /// Sets hue, saturation and brightness in one command. Each channel is
    /// clamped into `0..=255`.
    pub async fn set_color(&mut self, hue: i64, saturation: i64, brightness: i64) -> Result<()> {
        self.set_data(json!({
            "setHue": clamp_channel(hue),
            "setSaturation": clamp_channel(saturation),
            "setBrightness": clamp_channel(brightness),
        }))
        .await
    }

    pub async fn set_hue(&mut self, hue: i64) -> Result<()> {
        self.set_data(json!({ "setHue": clamp_channel(hue) })).await
    }

    pub async fn set_saturation(&mut self, saturation: i64) -> Result<()> {
        self.set_data(json!({ "setSaturation": clamp_channel(saturation) }))
            .await
    }

    pub async fn set_brightness(&mut self, brightness: i64) -> Result<()> {
        self.set_data(json!({ "setBrightness": clamp_channel(brightness) }))
            .await
    }

    /// Effect speed, clamped into `0..=255`.
    pub async fn set_speed(&mut self, speed: i64) -> Result<()> {
        self.set_data(json!({ "setSpeed": clamp_channel(speed) }))
            .await
    }

    /// Seconds between effect changes while mode cycle is on.
    pub async fn set_cycle_speed(&mut self, seconds: i64) -> Result<()> {
        self.set_data(json!({ "setCycleSpeed": seconds })).await
    }

    /// Switches pack and effect.
    ///
    /// A name that is not in the catalog sends nothing and returns `Ok(())`;
    /// the device keeps its current effect. Callers that need to reject
    /// unknown names must check [`ModePacks::indices_from_effect_name`] first.
    pub async fn set_effect(&mut self, effect: impl Into<EffectSelector>) -> Result<()> {
        let (pack_index, effect_index) = match effect.into() {
            EffectSelector::Indices(pack_index, effect_index) => (pack_index, effect_index),
            EffectSelector::Name(name) => match self.catalog.indices_from_effect_name(&name) {
                Some(indices) => indices,
                None => {
                    warn!("Unknown effect {:?}, nothing sent", name);
                    return Ok(());
                }
            },
        };

        self.set_data(json!({
            "setModPack": pack_index,
            "setEffect": effect_index,
        }))
        .await
    }

    /// Sets the user-defined name, truncated to 39 characters.
    pub async fn set_name(&mut self, name: &str) -> Result<()> {
        let name = truncate_name(name);
        self.set_data(json!({ "setName": name })).await
    }

    /// Shutdown timer in minutes; 0 disables it, anything else is kept within
    /// 5..=480 minutes.
    pub async fn set_shutdown_timer(&mut self, minutes: i64) -> Result<()> {
        let (hours, minutes) = shutdown_timer_parts(minutes);
        self.set_data(json!({
            "setShutdownTimer": { "hours": hours, "minutes": minutes }
        }))
        .await
    }

    /// Hands new Wi-Fi credentials to the device.
    pub async fn connect_to_wifi(&mut self, ssid: &str, password: &str) -> Result<()> {
        validate_wifi_credentials(ssid, password)?;
        self.set_data(json!({
            "connectToWifi": { "ssid": ssid, "password": password }
        }))
        .await
    }

    pub async fn set_pattern(&mut self, value: i64) -> Result<()> {
        self.set_data(json!({ "setPattern": value })).await
    }

    pub async fn set_palette(&mut self, value: i64) -> Result<()> {
        self.set_data(json!({ "setPalette": value })).await
    }

    pub async fn set_render_mode(&mut self, value: i64) -> Result<()> {
        self.set_data(json!({ "setRenderMode": value })).await
    }

    pub async fn set_color_mode(&mut self, value: i64) -> Result<()> {
        self.set_data(json!({ "setColorMode": value })).await
    }
}

fn clamp_channel(value: i64) -> i64 {
    value.clamp(0, 255)
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_LENGTH {
        return name.to_string();
    }
    let truncated: String = name.chars().take(MAX_NAME_LENGTH).collect();
    warn!("Name truncated to maximum allowed length: {}", truncated);
    truncated
}

/// Splits a shutdown timer into the `(hours, minutes)` pair the device expects.
fn shutdown_timer_parts(minutes: i64) -> (i64, i64) {
    let minutes = match minutes {
        m if m <= 0 => {
            debug!("Disabling shutdown timer");
            0
        }
        m if m < MIN_SHUTDOWN_MINUTES => {
            debug!("Shutdown timer raised to {} minutes", MIN_SHUTDOWN_MINUTES);
            MIN_SHUTDOWN_MINUTES
        }
        m if m > MAX_SHUTDOWN_MINUTES => {
            debug!("Shutdown timer capped at {} minutes", MAX_SHUTDOWN_MINUTES);
            MAX_SHUTDOWN_MINUTES
        }
        m => m,
    };
    (minutes / 60, minutes % 60)
}

fn validate_wifi_credentials(ssid: &str, password: &str) -> Result<()> {
    if ssid.is_empty() || password.is_empty() {
        return Err(ExoyOneError::Validation(
            "Both SSID and password must be set to change WiFi credentials".to_string(),
        ));
    }
    if ssid.chars().count() > MAX_WIFI_CREDENTIAL_LENGTH {
        return Err(ExoyOneError::Validation(format!(
            "SSID is longer than maximum allowed length of {} characters",
            MAX_WIFI_CREDENTIAL_LENGTH
        )));
    }
    if password.chars().count() > MAX_WIFI_CREDENTIAL_LENGTH {
        return Err(ExoyOneError::Validation(format!(
            "Password is longer than the maximum allowed length of {} characters",
            MAX_WIFI_CREDENTIAL_LENGTH
        )));
    }
    Ok(())
}
