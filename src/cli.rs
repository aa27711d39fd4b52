// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the photo booth
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Running a full two-shot capture without the terminal UI

use photobooth::backends::camera::{
    CameraPipeline, enumerate_cameras, get_formats, select_capture_format,
};
use photobooth::booth::{BoothSession, SequenceEvent, event_channel, run_capture_sequence};
use photobooth::config::Config;
use photobooth::constants::timing::{CAMERA_WARMUP, FIRST_FRAME_TIMEOUT};
use photobooth::errors::CameraError;
use photobooth::storage;

use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} ({})", index, camera.name, camera.path);

        // Get formats for this camera
        let formats = get_formats(&camera.path);
        if !formats.is_empty() {
            // Group formats by resolution and show the best framerate
            let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
            for format in &formats {
                let fps = format.framerate.map(|f| f.as_int()).unwrap_or(30);
                if let Some(existing) = resolutions
                    .iter_mut()
                    .find(|(w, h, _)| *w == format.width && *h == format.height)
                {
                    if fps > existing.2 {
                        existing.2 = fps;
                    }
                } else {
                    resolutions.push((format.width, format.height, fps));
                }
            }

            // Sort by resolution (highest first)
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            // Show top 3 resolutions
            let display_count = resolutions.len().min(3);
            let res_strs: Vec<String> = resolutions
                .iter()
                .take(display_count)
                .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
                .collect();

            println!("      Formats: {}", res_strs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Run the full two-shot booth sequence headlessly
pub fn capture(
    camera_index: usize,
    output: Option<PathBuf>,
    overlay: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Enumerate cameras
    let cameras = enumerate_cameras();
    if cameras.is_empty() {
        return Err(CameraError::NoCameraFound.into());
    }

    if camera_index >= cameras.len() {
        return Err(format!(
            "Camera index {} out of range (0-{})",
            camera_index,
            cameras.len() - 1
        )
        .into());
    }

    let camera = &cameras[camera_index];
    println!("Using camera: {}", camera.name);

    let formats = get_formats(&camera.path);
    let format =
        select_capture_format(&formats).ok_or("No supported formats available for camera")?;
    println!("Capture format: {}x{}", format.width, format.height);

    let mut session = BoothSession::new(Config::load());

    // Overlay from the CLI flag, else the configured one
    let overlay_path = overlay.or_else(|| session.config().overlay_path.clone());
    if let Some(path) = overlay_path {
        match session.set_overlay(&path) {
            Ok(()) => println!("Overlay: {}", path.display()),
            Err(e) => println!("Warning: {} - continuing without overlay", e),
        }
    }

    // Start camera pipeline
    let (pipeline, _preview) = CameraPipeline::open(camera, &format)?;

    // Wait for frames to stabilize (camera warm-up)
    print!("Warming up...");
    std::io::stdout().flush()?;
    let start = Instant::now();
    while start.elapsed() < FIRST_FRAME_TIMEOUT {
        if pipeline.latest_frame().is_some() && start.elapsed() > CAMERA_WARMUP {
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }
    println!();

    if pipeline.latest_frame().is_none() {
        return Err(CameraError::NoFrameAvailable.into());
    }

    let overlay_image = session.overlay_image();
    let compositor = session.compositor();
    session.begin_sequence();

    // Drive the sequence, narrating progress on stdout
    let rt = tokio::runtime::Runtime::new()?;
    let composite = rt.block_on(async move {
        let (tx, mut rx) = event_channel();
        let task = tokio::spawn(run_capture_sequence(pipeline, overlay_image, compositor, tx));

        while let Some(event) = rx.next().await {
            match event {
                SequenceEvent::CountdownTick(value) => {
                    print!("\r  {}  ", value);
                    std::io::stdout().flush().ok();
                }
                SequenceEvent::CountdownHidden => {
                    print!("\r     \r");
                    std::io::stdout().flush().ok();
                }
                SequenceEvent::PhotoCaptured { photo, .. } => {
                    println!(
                        "\rPhoto captured ({}x{})",
                        photo.width(),
                        photo.height()
                    );
                }
                SequenceEvent::PreviewReleased => {
                    println!("Camera released, compositing...");
                }
                _ => {}
            }
        }

        let composite = task
            .await
            .map_err(|e| format!("Sequence task error: {}", e))??;
        Ok::<_, Box<dyn std::error::Error>>(composite)
    })?;

    // Determine output directory
    let output_dir = if let Some(path) = output.as_ref() {
        if path.is_dir() {
            path.clone()
        } else {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(storage::default_output_dir)
        }
    } else {
        storage::resolve_output_dir(session.config())
    };

    let saved = rt.block_on(storage::save_composite(composite.png_bytes(), output_dir))?;

    // If the user specified a specific filename, rename the file
    if let Some(user_path) = output
        && !user_path.is_dir()
    {
        std::fs::rename(&saved, &user_path)?;
        println!("Composite saved: {}", user_path.display());
        return Ok(());
    }

    println!("Composite saved: {}", saved.display());

    if session.config().open_after_save
        && let Err(e) = open::that_detached(&saved)
    {
        eprintln!("Warning: failed to open composite: {}", e);
    }

    Ok(())
}
