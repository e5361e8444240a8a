//! Builds a ready-to-run orchestrator from the configuration and the Linux backends.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};

use photobooth_core::{
    BoothConfig, CameraBackend, CaptureController, PrintController, PrintSettings, PrinterTransport,
    SessionOrchestrator, SessionSettings, TouchEventBus, TouchSource,
};
use photobooth_linux::{
    EvdevTouchscreen, FramebufferRenderer, GphotoCamera, ObexFtpPrinter, OverlaySet, OverlaySettings, RpicamStill,
    SpoolDirPrinter,
};

pub type Printer = Box<dyn PrinterTransport>;
pub type Orchestrator = SessionOrchestrator<GphotoCamera, Printer>;

/// Everything the kiosk owns while it runs.
pub struct Booth {
    pub orchestrator: Orchestrator,
    pub touchscreen: EvdevTouchscreen,
}

pub fn build(config: &BoothConfig, bus: &TouchEventBus) -> Result<Booth> {
    fs::create_dir_all(&config.camera.output_dir)
        .with_context(|| format!("creating capture directory {}", config.camera.output_dir.display()))?;

    let overlays = OverlaySet::load(&config.overlay.directory, &OverlaySettings::from_config(&config.overlay))
        .with_context(|| format!("loading overlays from {}", config.overlay.directory.display()))?;
    log::info!("Loaded {} overlays", overlays.len());
    let renderer = Arc::new(FramebufferRenderer::new(
        config.display.framebuffer.clone(),
        config.general.screen_width,
        config.general.screen_height,
        overlays,
    ));

    let printer = config
        .printer
        .enabled
        .then(|| PrintController::new(printer_transport(config), PrintSettings::from_config(config)));

    let orchestrator = SessionOrchestrator::new(
        bus.clone(),
        camera_backend(config),
        printer,
        renderer,
        SessionSettings::from_config(config),
    );

    let mut touchscreen = EvdevTouchscreen::new(config.touchscreen.device.clone());
    touchscreen
        .start(bus.sink())
        .with_context(|| format!("starting {}", touchscreen.describe()))?;

    Ok(Booth {
        orchestrator,
        touchscreen,
    })
}

fn camera_backend(config: &BoothConfig) -> CameraBackend<GphotoCamera> {
    if !config.camera.dslr_enabled {
        log::info!("DSLR disabled, using the camera module");
        return CameraBackend::Still {
            camera: Box::new(RpicamStill::new()),
            output_dir: config.camera.output_dir.clone(),
        };
    }

    let mut controller = CaptureController::new(GphotoCamera::new(), config.camera.output_dir.clone());
    // A camera that is off at startup can still be switched on later.
    match controller.apply_startup_config(&config.startup_settings()) {
        Ok(()) => match controller.battery_level() {
            Some(level) => log::info!("Camera configured, battery at {}%", level),
            None => log::info!("Camera configured"),
        },
        Err(e) => log::warn!("Couldn't configure camera: {}", e),
    }
    CameraBackend::Dslr(controller)
}

fn printer_transport(config: &BoothConfig) -> Printer {
    match &config.printer.spool_dir {
        Some(dir) => {
            log::info!("Spooling prints to {}", dir.display());
            Box::new(SpoolDirPrinter::new(dir.clone()))
        }
        None => {
            log::info!(
                "Printing to {} on channel {}",
                config.printer.address,
                config.printer.channel
            );
            Box::new(ObexFtpPrinter::new(config.printer.address.clone(), config.printer.channel))
        }
    }
}
