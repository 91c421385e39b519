//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::CharacterSet;

/// Live webcam preview rendered as glyphs in the terminal.
///
/// Options left unset fall back to the config file, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "glyphcam")]
#[command(version, about = "Webcam to terminal glyph renderer", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Video device node (default: /dev/video0)
    #[arg(short, long)]
    pub device: Option<PathBuf>,

    /// Worker threads per transform stage (default: 1)
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Capture buffers to request from the driver (default: 4)
    #[arg(long, value_parser = clap::value_parser!(u32).range(2..))]
    pub buffers: Option<u32>,

    /// Give up when no frame arrives within this many milliseconds (default: 1000)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Glyph character set
    #[arg(long)]
    pub charset: Option<CharacterSet>,

    /// Invert brightness (for light terminals)
    #[arg(long)]
    pub invert: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["glyphcam"]);
        assert!(args.device.is_none());
        assert!(args.threads.is_none());
        assert!(args.buffers.is_none());
        assert!(args.timeout_ms.is_none());
        assert!(args.charset.is_none());
        assert!(!args.invert);
        assert!(args.config.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_device_option() {
        let args = Args::parse_from(["glyphcam", "--device", "/dev/video2"]);
        assert_eq!(args.device, Some(PathBuf::from("/dev/video2")));

        let args = Args::parse_from(["glyphcam", "-d", "/dev/video1"]);
        assert_eq!(args.device, Some(PathBuf::from("/dev/video1")));
    }

    #[test]
    fn test_args_threads_option() {
        let args = Args::parse_from(["glyphcam", "-j", "4"]);
        assert_eq!(args.threads, Some(4));

        let args = Args::parse_from(["glyphcam", "--threads", "1"]);
        assert_eq!(args.threads, Some(1));
    }

    #[test]
    fn test_args_zero_threads_rejected() {
        assert!(Args::try_parse_from(["glyphcam", "--threads", "0"]).is_err());
    }

    #[test]
    fn test_args_single_buffer_rejected() {
        assert!(Args::try_parse_from(["glyphcam", "--buffers", "1"]).is_err());
        let args = Args::parse_from(["glyphcam", "--buffers", "2"]);
        assert_eq!(args.buffers, Some(2));
    }

    #[test]
    fn test_args_timeout_option() {
        let args = Args::parse_from(["glyphcam", "--timeout-ms", "250"]);
        assert_eq!(args.timeout_ms, Some(250));
    }

    #[test]
    fn test_args_charset_values() {
        let args = Args::parse_from(["glyphcam", "--charset", "standard"]);
        assert_eq!(args.charset, Some(CharacterSet::Standard));

        let args = Args::parse_from(["glyphcam", "--charset", "blocks"]);
        assert_eq!(args.charset, Some(CharacterSet::Blocks));

        let args = Args::parse_from(["glyphcam", "--charset", "minimal"]);
        assert_eq!(args.charset, Some(CharacterSet::Minimal));

        assert!(Args::try_parse_from(["glyphcam", "--charset", "braille"]).is_err());
    }

    #[test]
    fn test_args_invert_flag() {
        let args = Args::parse_from(["glyphcam", "--invert"]);
        assert!(args.invert);
    }

    #[test]
    fn test_args_config_option() {
        let args = Args::parse_from(["glyphcam", "--config", "/tmp/config.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/config.toml")));

        let args = Args::parse_from(["glyphcam", "-c", "/tmp/test.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
    }

    #[test]
    fn test_args_config_show_subcommand() {
        let args = Args::parse_from(["glyphcam", "config", "show"]);
        match args.command {
            Some(Command::Config {
                action: ConfigAction::Show,
            }) => (),
            _ => panic!("Expected Config Show subcommand"),
        }
    }

    #[test]
    fn test_args_config_init_subcommand() {
        let args = Args::parse_from(["glyphcam", "config", "init"]);
        match args.command {
            Some(Command::Config {
                action: ConfigAction::Init,
            }) => (),
            _ => panic!("Expected Config Init subcommand"),
        }
    }

    #[test]
    fn test_args_combined_options() {
        let args = Args::parse_from([
            "glyphcam",
            "-d",
            "/dev/video3",
            "-j",
            "8",
            "--buffers",
            "6",
            "--charset",
            "blocks",
            "--invert",
        ]);
        assert_eq!(args.device, Some(PathBuf::from("/dev/video3")));
        assert_eq!(args.threads, Some(8));
        assert_eq!(args.buffers, Some(6));
        assert_eq!(args.charset, Some(CharacterSet::Blocks));
        assert!(args.invert);
    }
}
