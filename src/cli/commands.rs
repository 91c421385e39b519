//! Subcommand handlers and settings resolution.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::args::{Args, ConfigAction};
use crate::config::{default_path, Config, DEFAULT_CONFIG};
use crate::render::Palette;

/// Everything a capture run needs, after merging CLI and config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub device: PathBuf,
    pub buffers: u32,
    pub wait_timeout: Duration,
    pub workers: NonZeroU32,
    pub palette: Palette,
    pub invert: bool,
}

/// Merge CLI arguments over config file values.
pub fn resolve_settings(args: &Args, config: &Config) -> RunSettings {
    let workers = args.threads.unwrap_or(config.pipeline.workers);
    let palette = match args.charset {
        Some(charset) => Palette::from(charset),
        None => config
            .render
            .charset
            .as_deref()
            .and_then(Palette::from_name)
            .unwrap_or_default(),
    };

    RunSettings {
        device: args
            .device
            .clone()
            .unwrap_or_else(|| config.capture.device.clone()),
        buffers: args.buffers.unwrap_or(config.capture.buffers),
        wait_timeout: Duration::from_millis(args.timeout_ms.unwrap_or(config.capture.timeout_ms)),
        workers: NonZeroU32::new(workers).unwrap_or(NonZeroU32::MIN),
        palette,
        invert: args.invert || config.render.invert,
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) -> Result<(), String> {
    let path = config_path.map(PathBuf::from).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&path)).map_err(|e| e.to_string())?;
            let rendered = toml::to_string_pretty(&config).map_err(|e| e.to_string())?;

            println!("Current configuration:");
            println!();
            print!("{}", rendered);
            println!();
            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            init_config(&path)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}

/// Write the default config file, refusing to overwrite an existing one.
pub fn init_config(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!(
            "Config file already exists: {} (use 'glyphcam config show' to view it)",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Error creating config directory: {}", e))?;
    }

    std::fs::write(path, DEFAULT_CONFIG).map_err(|e| format!("Error writing config file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CharacterSet;
    use clap::Parser;

    #[test]
    fn test_defaults_without_cli_or_file() {
        let args = Args::parse_from(["glyphcam"]);
        let settings = resolve_settings(&args, &Config::default());
        assert_eq!(settings.device, PathBuf::from("/dev/video0"));
        assert_eq!(settings.buffers, 4);
        assert_eq!(settings.wait_timeout, Duration::from_secs(1));
        assert_eq!(settings.workers.get(), 1);
        assert_eq!(settings.palette, Palette::Standard);
        assert!(!settings.invert);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::default();
        config.pipeline.workers = 2;
        config.render.charset = Some("minimal".to_string());
        config.capture.device = PathBuf::from("/dev/video9");

        let args = Args::parse_from(["glyphcam", "-j", "6", "--charset", "blocks"]);
        let settings = resolve_settings(&args, &config);
        assert_eq!(settings.workers.get(), 6);
        assert_eq!(settings.palette, Palette::from(CharacterSet::Blocks));
        assert_eq!(settings.device, PathBuf::from("/dev/video9"));
    }

    #[test]
    fn test_file_values_used_when_cli_silent() {
        let mut config = Config::default();
        config.pipeline.workers = 3;
        config.render.charset = Some("minimal".to_string());
        config.render.invert = true;
        config.capture.timeout_ms = 40;

        let args = Args::parse_from(["glyphcam"]);
        let settings = resolve_settings(&args, &config);
        assert_eq!(settings.workers.get(), 3);
        assert_eq!(settings.palette, Palette::Minimal);
        assert!(settings.invert);
        assert_eq!(settings.wait_timeout, Duration::from_millis(40));
    }

    #[test]
    fn test_init_config_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        init_config(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
        assert_eq!(Config::load(Some(&path)).unwrap().pipeline.workers, 1);
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nworkers = 2\n").unwrap();
        let err = init_config(&path).unwrap_err();
        assert!(err.contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[pipeline]\nworkers = 2\n"
        );
    }
}
