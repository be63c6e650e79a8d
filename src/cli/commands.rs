//! Subcommand handlers.

use std::error::Error;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use camera_filters::config::{default_path, write_default, ConfigError, FilterConfig};
use camera_filters::filters::builtin_registry;
use camera_filters::hotkeys::KeyListener;
use camera_filters::pipeline::FilterPipeline;
use camera_filters::source::TestPattern;
use camera_filters::Frame;

use super::args::{ConfigAction, RunArgs};

/// Load the config, logging (not failing) when it is missing or broken.
fn load_config(path: Option<&Path>) -> FilterConfig {
    let (config, error) = FilterConfig::load_or_default(path);
    match error {
        None => {}
        Some(ConfigError::NotFound { path: missing }) if path.is_none() => {
            log::info!("No config at {}, all filters enabled", missing.display());
        }
        Some(e) => log::warn!("{}. Using default settings.", e),
    }
    config
}

fn build_pipeline(config_path: Option<&Path>, filters: &[String]) -> FilterPipeline {
    let config = Arc::new(load_config(config_path));
    let registry = Arc::new(builtin_registry());
    if filters.is_empty() {
        FilterPipeline::new(registry, config)
    } else {
        FilterPipeline::with_filters(registry, config, filters)
    }
}

/// Print the filters that would run, in order.
pub fn list_filters(config_path: Option<&Path>, filters: &[String]) {
    let pipeline = build_pipeline(config_path, filters);
    let names = pipeline.list_filters();
    if names.is_empty() {
        println!("No filters enabled.");
        return;
    }
    println!("Enabled filters:");
    for name in names {
        println!("  {}", name);
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(config_path: Option<&Path>, action: ConfigAction) -> Result<(), ConfigError> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            let config = load_config(Some(&path));
            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            println!();
            let rendered = config.to_toml()?;
            if rendered.trim().is_empty() {
                println!("# no filter overrides, every registered filter is enabled");
            } else {
                print!("{}", rendered);
            }
        }
        ConfigAction::Init => {
            write_default(&path)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

/// Drive the pipeline from the test pattern until Ctrl+C or `--frames`.
pub fn run_stream(config_path: Option<&Path>, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let mut pipeline = build_pipeline(config_path, &args.filters);
    let trigger_key = pipeline.snapshots().settings().trigger_key.clone();

    let mut listener = KeyListener::new(pipeline.event_sink());
    if !args.no_hotkeys {
        if let Err(e) = listener.start() {
            log::warn!("Key listener unavailable: {}", e);
        } else {
            log::info!("Hold '{}' to spawn zoom snapshots", trigger_key);
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })?;
    }

    let frame_period = Duration::from_secs_f64(1.0 / args.fps as f64);
    let sink = pipeline.event_sink();
    let mut source = TestPattern::new(args.width, args.height);
    let mut last: Option<Frame> = None;
    let mut window_start = Instant::now();
    let mut window_frames = 0u32;

    log::info!(
        "Streaming {}x{} @ {} fps (Ctrl+C to stop)",
        args.width,
        args.height,
        args.fps
    );

    while !stop.load(Ordering::SeqCst) {
        let index = pipeline.frame_index();
        if args.frames.is_some_and(|limit| index >= limit) {
            break;
        }
        let started = Instant::now();

        if let Some(every) = args.trigger_every.filter(|n| *n > 0) {
            if index % every == 0 {
                sink.notify_press(trigger_key.as_str());
            } else if index % every == 1 {
                sink.notify_release(trigger_key.as_str());
            }
        }

        let Some(raw) = source.next() else { break };
        last = Some(pipeline.process_frame(raw));

        window_frames += 1;
        if window_start.elapsed() >= Duration::from_secs(1) {
            log::info!(
                "{} fps, {} live snapshot(s), frame {}",
                window_frames,
                pipeline.snapshots().len(),
                pipeline.frame_index()
            );
            window_start = Instant::now();
            window_frames = 0;
        }

        if let Some(remaining) = frame_period.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    listener.stop();
    log::info!("Stopped after {} frames", pipeline.frame_index());

    if let (Some(path), Some(frame)) = (args.output, last) {
        let image = frame
            .into_image()
            .ok_or("last frame has an inconsistent buffer")?;
        image.save(&path)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
