use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;

use exoyone_lib::catalog::ModePacks;
use exoyone_lib::control_interface::{ExoyOne, DEFAULT_PORT, MAX_NAME_LENGTH};
use exoyone_lib::util::mock_device::MockDevice;

mod render;

const MIN_CYCLE_SECONDS: i64 = 5;
const MAX_CYCLE_SECONDS: i64 = 43_200;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    handle_cli(cli).await
}

/// This struct defines the command line interface of the application
#[derive(Parser)]
#[clap(name = "exoyone", about = "ExoyOne Command-Line Interface (CLI)", version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// How to reach the device.
#[derive(Args)]
pub struct Connection {
    /// Hostname or IP address of your ExoyOne
    #[clap(short = 'H', long, env = "EXOYONE_HOST")]
    host: String,

    /// UDP port of your ExoyOne
    #[clap(short, long, env = "EXOYONE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Timeout per attempt in milliseconds
    #[clap(short, long, default_value_t = 3000)]
    timeout: u64,
}

impl Connection {
    async fn connect(&self, catalog: ModePacks) -> Result<ExoyOne> {
        debug!("Querying {}:{}", self.host, self.port);
        let mut exoyone = ExoyOne::new(&self.host, self.port, catalog)
            .with_timeout(Duration::from_millis(self.timeout));
        exoyone.refresh().await?;
        Ok(exoyone)
    }
}

/// Supported output formats for `get everything`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Plain text tables.
    Plaintext,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

/// Subcommands available for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Get information from your ExoyOne
    Get {
        #[clap(flatten)]
        connection: Connection,

        #[clap(subcommand)]
        action: GetAction,
    },
    /// Change things on your ExoyOne
    Set {
        #[clap(flatten)]
        connection: Connection,

        #[clap(subcommand)]
        action: SetAction,
    },
    /// List the effects of one mode pack, or of all of them
    Effects {
        /// Name of a mode pack
        #[clap(long)]
        mode_pack: Option<String>,
    },
    /// Run a mock ExoyOne for testing without hardware
    Mock {
        #[clap(subcommand)]
        action: MockAction,
    },
}

#[derive(Subcommand)]
pub enum GetAction {
    /// Get the power state (on/off)
    #[clap(name = "power-state")]
    PowerState,
    /// Get music sync state (on/off)
    #[clap(name = "music-sync")]
    MusicSync,
    /// Get scene generation state (on/off)
    #[clap(name = "scene-generation")]
    SceneGeneration,
    /// Get powered by powerbank state (on/off)
    #[clap(name = "powerbank-mode")]
    PowerbankMode,
    /// Get mode cycle state (on/off)
    #[clap(name = "mode-cycle")]
    ModeCycle,
    /// Get the mode cycle speed
    #[clap(name = "cycle-speed")]
    CycleSpeed,
    /// Get the effect direction (left/right)
    #[clap(name = "direction")]
    Direction,
    /// Get the current effect speed
    #[clap(name = "effect-speed")]
    EffectSpeed,
    /// Get the current shutdown timer
    #[clap(name = "shutdown-timer")]
    ShutdownTimer,
    /// Get the device name
    #[clap(name = "device-name")]
    DeviceName,
    /// Get the current hue, saturation and brightness values
    #[clap(name = "color")]
    Color,
    /// Get the state and value of all the things
    #[clap(name = "everything")]
    Everything {
        /// Output format (plaintext, json, yaml)
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Plaintext)]
        output: OutputFormat,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    Off,
    On,
}

impl Toggle {
    fn word(self) -> &'static str {
        match self {
            Toggle::Off => "off",
            Toggle::On => "on",
        }
    }
}

/// There are only two directions; the names are interchangeable aliases.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Left,
    Right,
    In,
    Out,
    Up,
    Down,
    Forwards,
    Backwards,
    Clockwise,
    Counterclockwise,
}

impl Direction {
    fn to_wire(self) -> i64 {
        match self {
            Direction::Left
            | Direction::In
            | Direction::Up
            | Direction::Forwards
            | Direction::Clockwise => 1,
            Direction::Right
            | Direction::Out
            | Direction::Down
            | Direction::Backwards
            | Direction::Counterclockwise => 0,
        }
    }
}

#[derive(Subcommand)]
pub enum SetAction {
    /// Restart the ExoyOne to enable its Wi-Fi access point
    #[clap(name = "restart-in-ap-mode")]
    RestartInApMode,
    /// Set the color by changing the hue, saturation and brightness
    #[clap(name = "color", allow_negative_numbers = true)]
    Color {
        /// Hue value between 0 and 255
        hue: i64,
        /// Saturation value between 0 and 255
        saturation: i64,
        /// Brightness value between 0 and 255
        brightness: i64,
    },
    /// Set the shutdown timer duration
    #[clap(name = "shutdown-timer")]
    ShutdownTimer {
        /// Duration of shutdown timer from 5 to 480 minutes, 0 to disable
        #[clap(value_parser = clap::value_parser!(i64).range(0..=480))]
        minutes: i64,
    },
    /// Change the active effect
    #[clap(name = "effect")]
    Effect {
        /// Name of the effect
        name: String,
    },
    /// Set the speed of the effect
    #[clap(name = "effect-speed")]
    EffectSpeed {
        #[clap(value_parser = clap::value_parser!(i64).range(0..=255))]
        speed: i64,
    },
    /// Turn scene generation off or on
    #[clap(name = "scene-generation")]
    SceneGeneration {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Turn mode cycle off or on
    #[clap(name = "mode-cycle")]
    ModeCycle {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Set the mode cycle duration in seconds
    #[clap(name = "cycle-speed")]
    CycleSpeed {
        /// Delay in seconds between cycles when mode cycle is on (5 to 43200)
        seconds: i64,
    },
    /// Turn music sync off or on
    #[clap(name = "music-sync")]
    MusicSync {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Turn power state off or on
    #[clap(name = "power-state")]
    PowerState {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Turn powered by powerbank mode off or on
    #[clap(name = "powerbank-mode")]
    PowerbankMode {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Set the device name of the ExoyOne
    #[clap(name = "device-name")]
    DeviceName {
        /// Custom name for the ExoyOne, at most 39 characters
        name: String,
    },
    /// Set a direction for the active effect
    #[clap(name = "direction")]
    Direction {
        #[clap(value_enum)]
        direction: Direction,
    },
    /// Hand new Wi-Fi credentials to the ExoyOne
    #[clap(name = "wifi")]
    Wifi { ssid: String, password: String },
    /// Experimental: select a pattern
    #[clap(name = "pattern")]
    Pattern { value: i64 },
    /// Experimental: select a palette
    #[clap(name = "palette")]
    Palette { value: i64 },
    /// Experimental: select a render mode
    #[clap(name = "render-mode")]
    RenderMode { value: i64 },
    /// Experimental: select a color mode
    #[clap(name = "color-mode")]
    ColorMode { value: i64 },
}

#[derive(Subcommand)]
pub enum MockAction {
    /// Start answering requests like a real ExoyOne
    Serve {
        /// Address to listen on
        #[clap(long, default_value = "127.0.0.1:8888")]
        bind: String,

        /// Delay every reply by this many milliseconds
        #[clap(long)]
        delay_ms: Option<u64>,
    },
}

async fn handle_cli(cli: Cli) -> Result<()> {
    let catalog = ModePacks::new();

    match cli.command {
        Commands::Get { connection, action } => {
            let exoyone = connection.connect(catalog).await?;
            handle_get(&exoyone, action)?;
        }
        Commands::Set { connection, action } => {
            let mut exoyone = connection.connect(catalog).await?;
            let description = handle_set(&mut exoyone, action).await?;
            println!("{}: DONE", description);
        }
        Commands::Effects { mode_pack } => match mode_pack {
            Some(name) => {
                let pack_index = catalog
                    .pack_index_from_name(&name)
                    .ok_or_else(|| anyhow!("Invalid mode pack: {}", name))?;
                render::print_pack(&catalog.packs()[pack_index]);
            }
            None => {
                for pack in catalog.packs() {
                    render::print_pack(pack);
                }
            }
        },
        Commands::Mock { action } => match action {
            MockAction::Serve { bind, delay_ms } => {
                let mut device = MockDevice::bind(&bind).await?;
                if let Some(delay_ms) = delay_ms {
                    device = device.with_reply_delay(Duration::from_millis(delay_ms));
                }
                device.serve().await?;
            }
        },
    }

    Ok(())
}

fn handle_get(exoyone: &ExoyOne, action: GetAction) -> Result<()> {
    let state = exoyone
        .state()
        .ok_or_else(|| anyhow!("No state received from {}", exoyone.host()))?;

    match action {
        GetAction::PowerState => println!("Power state: {}", render::on_off(state.fading_off)),
        GetAction::MusicSync => println!("Music sync: {}", render::on_off(state.music_sync)),
        GetAction::SceneGeneration => {
            println!("Scene generation: {}", render::on_off(state.scene_generation))
        }
        GetAction::PowerbankMode => println!(
            "Powered by powerbank mode: {}",
            render::on_off(state.powered_by_powerbank)
        ),
        GetAction::ModeCycle => println!("Mode cycle: {}", render::on_off(state.auto_change)),
        GetAction::CycleSpeed => println!("Current mode cycle speed: {}", state.cycle_speed),
        GetAction::Direction => {
            let direction = if state.direction { "LEFT" } else { "RIGHT" };
            println!("Effect direction: {}", direction);
        }
        GetAction::EffectSpeed => println!("Current effect speed: {}", state.speed),
        GetAction::ShutdownTimer => {
            if state.shutdown_timer > 0 {
                println!("Shutdown timer: {} minutes", state.shutdown_timer_minutes());
            } else {
                println!("Shutdown timer: Disabled");
            }
        }
        GetAction::DeviceName => {
            let name = if state.user_defined_name.is_empty() {
                "Unset"
            } else {
                state.user_defined_name.as_str()
            };
            println!("Device name: {}", name);
            println!("mDNS address: {}", state.mdns_name);
        }
        GetAction::Color => render::print_color(state),
        GetAction::Everything { output } => {
            let view = state.friendly(exoyone.catalog());
            match output {
                OutputFormat::Plaintext => render::print_friendly_view(&view),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&view)?),
            }
        }
    }

    Ok(())
}

/// Runs one setter and returns what was done, for the confirmation line.
async fn handle_set(exoyone: &mut ExoyOne, action: SetAction) -> Result<String> {
    let description = match action {
        SetAction::RestartInApMode => {
            exoyone.restart_in_ap_mode().await?;
            "Restarting in access point mode".to_string()
        }
        SetAction::Color {
            hue,
            saturation,
            brightness,
        } => {
            exoyone.set_color(hue, saturation, brightness).await?;
            format!("Setting HSB to {}, {}, {}", hue, saturation, brightness)
        }
        SetAction::ShutdownTimer { minutes } => {
            exoyone.set_shutdown_timer(minutes).await?;
            if minutes == 0 {
                "Disabling the shutdown timer".to_string()
            } else {
                format!("Setting shutdown timer to {} minutes", minutes)
            }
        }
        SetAction::Effect { name } => {
            let catalog = *exoyone.catalog();
            let Some(effect) = catalog.canonical_effect_name(&name) else {
                bail!("Invalid effect: {}", name);
            };
            let (pack_index, _) = catalog
                .indices_from_effect_name(effect)
                .ok_or_else(|| anyhow!("Invalid effect: {}", name))?;
            exoyone.set_effect(effect).await?;
            format!(
                "Changing mode pack to {} and effect to {}",
                catalog.pack_name(pack_index)?,
                effect
            )
        }
        SetAction::EffectSpeed { speed } => {
            exoyone.set_speed(speed).await?;
            format!("Setting effect speed to {}", speed)
        }
        SetAction::SceneGeneration { state } => {
            exoyone.toggle_scene_generation(state.word()).await?;
            format!("Turning scene generation {}", state.word())
        }
        SetAction::ModeCycle { state } => {
            exoyone.toggle_mode_cycle(state.word()).await?;
            format!("Turning mode cycle {}", state.word())
        }
        SetAction::CycleSpeed { seconds } => {
            let seconds = seconds.clamp(MIN_CYCLE_SECONDS, MAX_CYCLE_SECONDS);
            exoyone.set_cycle_speed(seconds).await?;
            format!("Setting mode cycle speed to {} seconds", seconds)
        }
        SetAction::MusicSync { state } => {
            exoyone.toggle_music_sync(state.word()).await?;
            format!("Turning music sync {}", state.word())
        }
        SetAction::PowerState { state } => {
            exoyone.toggle_power(state.word()).await?;
            format!("Turning power state {}", state.word())
        }
        SetAction::PowerbankMode { state } => {
            exoyone.powered_by_powerbank(state.word()).await?;
            format!("Turning powered by powerbank mode {}", state.word())
        }
        SetAction::DeviceName { name } => {
            exoyone.set_name(&name).await?;
            device_name_description(&name)
        }
        SetAction::Direction { direction } => {
            exoyone.toggle_direction(direction.to_wire()).await?;
            format!("Setting effect direction to {:?}", direction)
        }
        SetAction::Wifi { ssid, password } => {
            exoyone.connect_to_wifi(&ssid, &password).await?;
            format!("Sending Wi-Fi credentials for {}", ssid)
        }
        SetAction::Pattern { value } => {
            exoyone.set_pattern(value).await?;
            format!("Setting pattern to {}", value)
        }
        SetAction::Palette { value } => {
            exoyone.set_palette(value).await?;
            format!("Setting palette to {}", value)
        }
        SetAction::RenderMode { value } => {
            exoyone.set_render_mode(value).await?;
            format!("Setting render mode to {}", value)
        }
        SetAction::ColorMode { value } => {
            exoyone.set_color_mode(value).await?;
            format!("Setting color mode to {}", value)
        }
    };

    Ok(description)
}

/// Describes the name as sent, after truncation.
fn device_name_description(name: &str) -> String {
    if name.is_empty() {
        return "Clearing device name".to_string();
    }
    let sent: String = name.chars().take(MAX_NAME_LENGTH).collect();
    format!("Setting device name to {}", sent)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_color_with_negative_hue() {
        let cli = Cli::try_parse_from([
            "exoyone", "set", "--host", "10.0.0.2", "color", "-10", "300", "12",
        ])
        .unwrap();
        match cli.command {
            Commands::Set {
                connection,
                action:
                    SetAction::Color {
                        hue,
                        saturation,
                        brightness,
                    },
            } => {
                assert_eq!(connection.host, "10.0.0.2");
                assert_eq!(connection.port, DEFAULT_PORT);
                assert_eq!((hue, saturation, brightness), (-10, 300, 12));
            }
            _ => panic!("expected set color"),
        }
    }

    #[test]
    fn test_shutdown_timer_range_is_enforced() {
        let result = Cli::try_parse_from([
            "exoyone", "set", "-H", "10.0.0.2", "shutdown-timer", "481",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_direction_aliases() {
        assert_eq!(Direction::Clockwise.to_wire(), 1);
        assert_eq!(Direction::Backwards.to_wire(), 0);
    }

    #[test]
    fn test_device_name_description() {
        assert_eq!(device_name_description(""), "Clearing device name");
        assert_eq!(
            device_name_description("Desk"),
            "Setting device name to Desk"
        );
        assert_eq!(
            device_name_description("exoyone1A-exoyone1B-exoyone1C-exoyone1D-exoyone1E"),
            "Setting device name to exoyone1A-exoyone1B-exoyone1C-exoyone1D"
        );
    }
}
