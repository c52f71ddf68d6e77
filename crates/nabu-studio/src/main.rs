mod demo;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use nabu_engine::core::{Renderer, TickOutcome};
use nabu_engine::device::{GpuInit, RecordingBackend};
use nabu_engine::logging::{LoggingConfig, init_logging};
use nabu_engine::time::FrameClock;
use nabu_engine::window::{Runtime, RuntimeConfig, SceneSetup};
use winit::dpi::LogicalSize;

const USAGE: &str = "\
usage: nabu-studio [options]

  --headless <frames>   render <frames> ticks on the recording backend and exit
  --textures <dir>      load textures from <dir> instead of the built-in checkerboard
  --hz <rate>           render loop frequency (default 60)
  --no-vsync            present without waiting for vblank
  --verbose             debug logging
  --help                show this text";

#[derive(Debug, Clone, PartialEq)]
struct Options {
    headless: Option<u32>,
    textures: Option<PathBuf>,
    hz: u32,
    vsync: bool,
    verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { headless: None, textures: None, hz: 60, vsync: true, verbose: false }
    }
}

/// `Ok(None)` means `--help`.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => {
                let frames = args.next().context("--headless needs a frame count")?;
                options.headless = Some(frames.parse().with_context(|| format!("bad frame count '{frames}'"))?);
            }
            "--textures" => {
                options.textures = Some(args.next().context("--textures needs a directory")?.into());
            }
            "--hz" => {
                let hz = args.next().context("--hz needs a rate")?;
                options.hz = hz.parse().with_context(|| format!("bad rate '{hz}'"))?;
                if options.hz == 0 {
                    bail!("--hz must be positive");
                }
            }
            "--no-vsync" => options.vsync = false,
            "--verbose" => options.verbose = true,
            "--help" | "-h" => return Ok(None),
            other => bail!("unknown argument '{other}'\n\n{USAGE}"),
        }
    }
    Ok(Some(options))
}

fn main() -> Result<()> {
    let Some(options) = parse_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    init_logging(if options.verbose { LoggingConfig::verbose() } else { LoggingConfig::default() });

    match options.headless {
        Some(frames) => run_headless(&options, frames),
        None => run_windowed(options),
    }
}

fn run_windowed(options: Options) -> Result<()> {
    let config = RuntimeConfig {
        title: "nabu studio".to_string(),
        initial_size: LogicalSize::new(1024.0, 768.0),
        refresh_hz: options.hz,
        ..RuntimeConfig::default()
    };
    let gpu_init = GpuInit {
        present_mode: if options.vsync { wgpu::PresentMode::Fifo } else { wgpu::PresentMode::AutoNoVsync },
        ..GpuInit::default()
    };

    let textures = options.textures;
    Runtime::run(config, gpu_init, move |size| {
        Ok(SceneSetup {
            desc: demo::scene((size.width, size.height)),
            images: demo::images(textures.as_deref()),
        })
    })
}

/// Drives the demo scene on a simulated clock; fails on any backend misuse.
fn run_headless(options: &Options, frames: u32) -> Result<()> {
    let images = demo::images(options.textures.as_deref());
    let mut renderer = Renderer::new(RecordingBackend::new());
    renderer
        .load_scene(&demo::scene((1024, 768)), images.as_ref())
        .context("failed to load scene")?;

    let period = Duration::from_secs(1) / options.hz;
    let start = Instant::now();
    let mut clock = FrameClock::starting_at(start);
    let mut presented = 0;
    for i in 1..=frames {
        if renderer.tick(clock.tick_at(start + period * i)) == TickOutcome::Presented {
            presented += 1;
        }
    }

    let stats = *renderer.backend().stats();
    renderer.teardown().context("scene teardown failed")?;

    let backend = renderer.backend();
    log::info!(
        "{presented}/{frames} frame(s) presented: {} draw(s), {} uniform push(es), {} bind(s)",
        stats.draws,
        stats.uniform_pushes,
        stats.binds
    );
    if let Some(first) = backend.violations().first() {
        bail!("{} backend violation(s), first: {first}", backend.violations().len());
    }
    if backend.live_handles() != 0 {
        bail!("{} GPU resource(s) leaked", backend.live_handles());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Options>> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_windowed_vsync() {
        assert_eq!(parse(&[]).unwrap(), Some(Options::default()));
    }

    #[test]
    fn parses_every_flag() {
        let options = parse(&["--headless", "30", "--textures", "assets", "--hz", "120", "--no-vsync", "--verbose"])
            .unwrap()
            .unwrap();
        assert_eq!(options.headless, Some(30));
        assert_eq!(options.textures, Some(PathBuf::from("assets")));
        assert_eq!(options.hz, 120);
        assert!(!options.vsync);
        assert!(options.verbose);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--headless"]).is_err());
        assert!(parse(&["--hz", "0"]).is_err());
        assert!(parse(&["--hz", "fast"]).is_err());
        assert!(parse(&["--fullscreen"]).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse(&["--verbose", "--help"]).unwrap(), None);
    }

    #[test]
    fn headless_run_is_clean() {
        let options = Options { hz: 30, ..Options::default() };
        run_headless(&options, 5).unwrap();
    }
}
