use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mg_protocol::DeviceType;

#[derive(Parser, Debug)]
#[command(name = "mg")]
#[command(about = "Glove engine CLI - device inspection and calibration from the command line")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use the in-process emulated engine instead of the native daemon
    #[arg(long, global = true)]
    pub emulated: bool,

    /// Profile storage directory for the emulated engine
    #[arg(long, global = true, value_name = "DIR", requires = "emulated")]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device selector (clap-compatible enum)
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Left,
    Right,
}

impl From<DeviceArg> for DeviceType {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Left => DeviceType::Left,
            DeviceArg::Right => DeviceType::Right,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connection, battery, and signal status for both gloves
    Status,

    /// Fetch and print one skeletal hand sample
    Hand {
        /// Which glove to sample
        #[arg(value_enum)]
        device: DeviceArg,

        /// Print raw IMU and flex-sensor data instead of joint positions
        #[arg(long)]
        raw: bool,

        /// Print joint rotations instead of joint positions
        #[arg(long, conflicts_with = "raw")]
        quat: bool,

        /// How long to wait for a fresh sample, in milliseconds
        #[arg(long, default_value_t = 500)]
        timeout_ms: u64,
    },

    /// Drive a glove's vibration motor
    Vibrate {
        /// Which glove to vibrate
        #[arg(value_enum)]
        device: DeviceArg,

        /// Motor power, 0 to 1
        #[arg(default_value_t = 0.5)]
        power: f64,

        /// Duration in milliseconds
        #[arg(default_value_t = 150)]
        duration_ms: u16,
    },

    /// Manage user calibration profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },

    /// Print the engine error-code table
    Errors,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesAction {
    /// List all profiles
    List,
    /// Show the currently selected profile
    Show,
    /// Select the profile at an index
    Select { index: u32 },
    /// Create a new profile and select it
    Create { name: String },
    /// Commit working copies to durable storage
    Commit,
    /// Revert working copies to durable storage
    Revert,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn hand_defaults() {
        let cli = Cli::try_parse_from(["mg", "hand", "left"]).unwrap();
        match cli.command {
            Commands::Hand {
                device,
                raw,
                quat,
                timeout_ms,
            } => {
                assert_eq!(device, DeviceArg::Left);
                assert!(!raw);
                assert!(!quat);
                assert_eq!(timeout_ms, 500);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn raw_and_quat_conflict() {
        assert!(Cli::try_parse_from(["mg", "hand", "left", "--raw", "--quat"]).is_err());
    }

    #[test]
    fn storage_dir_requires_emulated() {
        assert!(Cli::try_parse_from(["mg", "--storage-dir", "/tmp/p", "status"]).is_err());
        assert!(
            Cli::try_parse_from(["mg", "--emulated", "--storage-dir", "/tmp/p", "status"]).is_ok()
        );
    }

    #[test]
    fn unknown_device_is_rejected() {
        assert!(Cli::try_parse_from(["mg", "hand", "middle"]).is_err());
    }

    #[test]
    fn profiles_subcommands_parse() {
        let cli = Cli::try_parse_from(["mg", "profiles", "select", "2"]).unwrap();
        match cli.command {
            Commands::Profiles {
                action: ProfilesAction::Select { index },
            } => assert_eq!(index, 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
