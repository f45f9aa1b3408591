//! Clap derive structures for the `freesleep` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use freesleep_core::{Side, TapAction, TapGesture, VibrationPattern};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// freesleep -- control a free-sleep pod from the command line
#[derive(Debug, Parser)]
#[command(
    name = "freesleep",
    version,
    about = "Monitor and control free-sleep pods from the command line",
    long_about = "Reads pod state from the free-sleep server running on the pod's\n\
        local network address and sends temperature, alarm and maintenance\n\
        commands to it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Pod profile to use
    #[arg(long, short = 'p', env = "FREESLEEP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Pod host name or IP (overrides profile)
    #[arg(long, short = 'H', env = "FREESLEEP_HOST", global = true)]
    pub host: Option<String>,

    /// free-sleep server port (overrides profile)
    #[arg(long, env = "FREESLEEP_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FREESLEEP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FREESLEEP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Shared value enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(s: SideArg) -> Self {
        match s {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PatternArg {
    Double,
    Rise,
}

impl From<PatternArg> for VibrationPattern {
    fn from(p: PatternArg) -> Self {
        match p {
            PatternArg::Double => VibrationPattern::Double,
            PatternArg::Rise => VibrationPattern::Rise,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GestureArg {
    Double,
    Triple,
    Quad,
}

impl From<GestureArg> for TapGesture {
    fn from(g: GestureArg) -> Self {
        match g {
            GestureArg::Double => TapGesture::Double,
            GestureArg::Triple => TapGesture::Triple,
            GestureArg::Quad => TapGesture::Quad,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TapActionArg {
    /// Raise the target temperature by one degree
    Warmer,
    /// Lower the target temperature by one degree
    Cooler,
    /// Stop a ringing alarm
    Dismiss,
    /// Snooze a ringing alarm
    Snooze,
}

impl From<TapActionArg> for TapAction {
    fn from(a: TapActionArg) -> Self {
        match a {
            TapActionArg::Warmer => TapAction::IncreaseTemperature,
            TapActionArg::Cooler => TapAction::DecreaseTemperature,
            TapActionArg::Dismiss => TapAction::DismissAlarm,
            TapActionArg::Snooze => TapAction::SnoozeAlarm,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show pod and side state
    #[command(alias = "st")]
    Status,

    /// Poll the pod and print every change until interrupted
    Watch(WatchArgs),

    /// Change a side or pod setting
    Set(SetArgs),

    /// Edit today's alarm for a side
    Alarm(AlarmArgs),

    /// Assign an action to a tap gesture
    Tap(TapArgs),

    /// Start priming the water system now
    Prime,

    /// Reboot the pod
    Reboot,

    /// Update the free-sleep server on the pod
    Update,

    /// Vibrate the alarm on one side immediately
    TriggerAlarm(TriggerAlarmArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommand,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Turn a side on or off
    Power { side: SideArg, state: Toggle },

    /// Set a side's target temperature (°F, 55-110)
    #[command(alias = "temperature")]
    Temp { side: SideArg, fahrenheit: u16 },

    /// Put a side in or out of away mode
    Away { side: SideArg, state: Toggle },

    /// Set the pod LED brightness (0-100)
    Led { brightness: u8 },

    /// Enable or disable daily priming
    PrimeDaily {
        state: Toggle,
        /// Daily priming time (HH:MM)
        #[arg(long)]
        time: Option<String>,
    },

    /// Enable or disable biometrics collection
    Biometrics { state: Toggle },

    /// Enable or disable the daily reboot
    RebootDaily { state: Toggle },

    /// Pause (on) or resume (off) a side's temperature schedule until noon
    ScheduleOffTonight { side: SideArg, state: Toggle },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALARM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlarmArgs {
    #[command(subcommand)]
    pub command: AlarmCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlarmCommand {
    /// Show today's alarm for both sides
    Show,

    /// Enable today's alarm
    Enable { side: SideArg },

    /// Disable today's alarm
    Disable { side: SideArg },

    /// Set today's alarm time (HH:MM)
    Time { side: SideArg, time: String },

    /// Set vibration intensity (1-100)
    Intensity { side: SideArg, value: u8 },

    /// Set vibration duration in seconds (0-180)
    Duration { side: SideArg, seconds: u16 },

    /// Set the vibration pattern
    Pattern { side: SideArg, pattern: PatternArg },

    /// Skip (on) or restore (off) tonight's alarm
    SkipTonight { side: SideArg, state: Toggle },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TAP / TRIGGER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TapArgs {
    pub side: SideArg,
    pub gesture: GestureArg,
    pub action: TapActionArg,
}

#[derive(Debug, Args)]
pub struct TriggerAlarmArgs {
    pub side: SideArg,

    /// Vibration intensity (1-100)
    #[arg(long, default_value = "50")]
    pub intensity: u8,

    #[arg(long, default_value = "rise")]
    pub pattern: PatternArg,

    /// Vibration duration in seconds (0-180)
    #[arg(long, default_value = "10")]
    pub duration: u16,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile
    Init {
        /// Pod host name or IP
        #[arg(long)]
        host: String,

        /// free-sleep server port
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,
    },

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
