use clap::Parser;

use glyphcam::cli::{handle_config_action, resolve_settings, Args, Command, RunSettings};
use glyphcam::config::Config;
use glyphcam::pipeline::setup_ctrlc_handler;

fn main() {
    let args = Args::parse();

    if let Some(Command::Config { action }) = &args.command {
        if let Err(e) = handle_config_action(action.clone(), args.config.as_deref()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let settings = resolve_settings(&args, &config);

    if let Err(e) = setup_ctrlc_handler() {
        eprintln!("Error: failed to set Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    match run_capture(&settings) {
        Ok(frames) => {
            log::info!("Rendered {} frame(s)", frames);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_os = "linux")]
fn run_capture(settings: &RunSettings) -> Result<u64, String> {
    use glyphcam::decode::JpegDecoder;
    use glyphcam::device::{DeviceRingBuffer, V4l2Device};
    use glyphcam::pipeline::{stop_requested, FrameTransformPipeline, PipelineConfig};
    use glyphcam::render::{poll_stop_key, TerminalRenderer, TerminalSession};

    let device = V4l2Device::open(&settings.device, settings.buffers)
        .map_err(|e| format!("{}: {}", settings.device.display(), e))?;
    let format = device.format();

    let mut ring = DeviceRingBuffer::new(device).map_err(|e| e.to_string())?;
    ring.start().map_err(|e| e.to_string())?;

    let mut session =
        TerminalSession::enter().map_err(|e| format!("terminal setup error: {}", e))?;
    let (cols, rows) = TerminalSession::surface_size()
        .map_err(|e| format!("terminal size error: {}", e))?;

    let renderer = TerminalRenderer::new(std::io::stdout(), settings.palette, settings.invert);
    let mut pipeline = FrameTransformPipeline::new(
        ring,
        JpegDecoder,
        renderer,
        PipelineConfig {
            source_width: format.width,
            source_height: format.height,
            target_width: u32::from(cols),
            target_height: u32::from(rows),
            workers: settings.workers,
            wait_timeout: settings.wait_timeout,
        },
    )
    .map_err(|e| e.to_string())?;

    let result = pipeline.run(|| {
        if stop_requested() {
            return true;
        }
        match poll_stop_key() {
            Ok(stop) => stop,
            Err(e) => {
                log::warn!("Key poll failed: {}", e);
                false
            }
        }
    });

    // Leave the alternate screen before the caller prints any diagnostic.
    if let Err(e) = session.exit() {
        log::warn!("Failed to restore terminal: {}", e);
    }
    drop(pipeline);

    result.map_err(|e| e.to_string())
}

#[cfg(not(target_os = "linux"))]
fn run_capture(_settings: &RunSettings) -> Result<u64, String> {
    Err("video capture requires Linux (V4L2)".to_string())
}
