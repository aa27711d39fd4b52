// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Renders the live camera feed with Unicode half-block characters, drives
//! the two-shot capture sequence and shows only the controls that are
//! currently available in the status bar, mirroring the original booth's
//! show/hide button state machine.

use crate::backends::camera::{
    CameraDevice, CameraFrame, CameraPipeline, FrameReceiver, enumerate_cameras, get_formats,
    select_capture_format,
};
use crate::booth::{BoothSession, EventReceiver, PhotoSlot, SequenceEvent, run_capture_sequence};
use crate::config::Config;
use crate::errors::CameraError;
use crate::storage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Run the terminal photo booth
pub fn run(
    camera_index: Option<usize>,
    overlay: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &runtime, camera_index, overlay);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &tokio::runtime::Runtime,
    camera_index: Option<usize>,
    overlay: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    let mirror_preview = config.mirror_preview;
    let mut session = BoothSession::new(config.clone());

    let mut status_message;

    // Overlay from the CLI flag, else the configured one
    let overlay_path = overlay.or_else(|| config.overlay_path.clone());
    if let Some(path) = &overlay_path {
        if let Err(e) = session.set_overlay(path) {
            status_message = format!("Overlay rejected: {}", e);
        } else {
            status_message = String::new();
        }
    } else {
        status_message = String::new();
    }

    // Acquire the camera; failure leaves the booth in a non-capturing
    // state with a visible warning, retry re-invokes acquisition
    let mut pipeline: Option<CameraPipeline> = None;
    let mut frame_rx: Option<FrameReceiver> = None;
    match acquire_camera(camera_index, &config) {
        Ok((new_pipeline, receiver)) => {
            config.last_camera_path = Some(new_pipeline.device_path().to_string());
            config.save().ok();
            pipeline = Some(new_pipeline);
            frame_rx = Some(receiver);
        }
        Err(e) => {
            error!(error = %e, "Failed to start camera");
            status_message = format!("Camera unavailable: {} ('r' retries)", e);
        }
    }

    if status_message.is_empty() {
        status_message = build_status_message(&session, pipeline.is_some());
    }

    let mut sequence_rx: Option<EventReceiver> = None;
    let mut frame_widget = FrameWidget::new(mirror_preview);
    let mut countdown_value: Option<u32> = None;
    let mut last_saved: Option<PathBuf> = None;

    loop {
        // Drain progress from a running sequence, then fold it in (the
        // receiver is replaced once the sequence finishes)
        let mut sequence_events = Vec::new();
        if let Some(rx) = sequence_rx.as_mut() {
            while let Ok(Some(event)) = rx.try_next() {
                sequence_events.push(event);
            }
        }

        for event in sequence_events {
            session.apply_event(&event);
            match &event {
                SequenceEvent::ControlsLocked => {
                    status_message = "Get ready...".to_string();
                }
                SequenceEvent::CountdownTick(value) => {
                    countdown_value = Some(*value);
                }
                SequenceEvent::CountdownHidden => {
                    countdown_value = None;
                }
                SequenceEvent::PhotoCaptured { slot, photo } => {
                    status_message = match slot {
                        PhotoSlot::Top => "Photo 1 of 2 captured".to_string(),
                        PhotoSlot::Bottom => "Photo 2 of 2 captured".to_string(),
                    };
                    // The second photo replaces the live preview
                    if *slot == PhotoSlot::Bottom {
                        frame_widget.freeze(CameraFrame::from_rgba(
                            photo.width(),
                            photo.height(),
                            photo.image().as_raw().clone(),
                        ));
                    }
                }
                SequenceEvent::PreviewReleased => {
                    // The sequence owned and dropped the stream
                    frame_rx = None;
                }
                SequenceEvent::CompositeReady(_) => {
                    sequence_rx = None;
                    status_message = build_status_message(&session, false);
                }
                SequenceEvent::Failed(msg) => {
                    sequence_rx = None;
                    countdown_value = None;
                    frame_rx = None;
                    status_message = format!("Error: {} ('r' retries)", msg);
                }
            }
        }

        // Poll for frames (non-blocking) - drain all available to get the latest
        if let Some(rx) = frame_rx.as_mut() {
            while let Ok(Some(frame)) = rx.try_next() {
                frame_widget.update_frame(frame);
            }
        }

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            f.render_widget(&frame_widget, camera_area);

            if let Some(value) = countdown_value {
                f.render_widget(CountdownDigit { value }, camera_area);
            }

            // Render status bar
            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            // 's' starts a capture sequence when the start control is visible
            if key.code == KeyCode::Char('s')
                && !session.sequence_active()
                && session.composite().is_none()
            {
                if pipeline.is_none() {
                    status_message = "Camera unavailable: press 'r' to retry".to_string();
                } else if session.begin_sequence()
                    && let Some(source) = pipeline.take()
                {
                    let (tx, rx) = crate::booth::event_channel();
                    sequence_rx = Some(rx);

                    let overlay_image = session.overlay_image();
                    let compositor = session.compositor();
                    let _task =
                        runtime.spawn(run_capture_sequence(source, overlay_image, compositor, tx));

                    info!("Capture sequence launched");
                }
            }

            // 'd' downloads the composite once it exists
            if key.code == KeyCode::Char('d') && session.ready_to_download() {
                if let Some(composite) = session.composite() {
                    let dir = storage::resolve_output_dir(session.config());
                    match runtime.block_on(storage::save_composite(composite.png_bytes(), dir)) {
                        Ok(path) => {
                            status_message = format!("Saved: {}", path.display());
                            if session.config().open_after_save
                                && let Err(e) = open::that_detached(&path)
                            {
                                warn!(error = %e, "Failed to open composite");
                            }
                            last_saved = Some(path);
                        }
                        Err(e) => {
                            error!("Failed to save composite: {}", e);
                            status_message = format!("Error: {}", e);
                        }
                    }
                }
            }

            // 'r' retries: discard the cycle, restore the live preview
            if key.code == KeyCode::Char('r') && !session.sequence_active() {
                session.retry();
                countdown_value = None;
                frame_widget = FrameWidget::new(mirror_preview);

                match acquire_camera(camera_index, &config) {
                    Ok((new_pipeline, receiver)) => {
                        pipeline = Some(new_pipeline);
                        frame_rx = Some(receiver);
                        status_message = build_status_message(&session, true);
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to restart camera");
                        pipeline = None;
                        frame_rx = None;
                        status_message = format!("Camera unavailable: {} ('r' retries)", e);
                    }
                }
            }

            // 'u' reloads the overlay file
            if key.code == KeyCode::Char('u') && !session.sequence_active() {
                let path = overlay_path
                    .clone()
                    .or_else(|| session.overlay_path().map(|p| p.to_path_buf()));
                match path {
                    Some(path) => {
                        status_message = match session.set_overlay(&path) {
                            Ok(()) => format!("Overlay loaded: {}", path.display()),
                            Err(e) => format!("Overlay rejected: {}", e),
                        };
                    }
                    None => {
                        status_message = "No overlay configured".to_string();
                    }
                }
            }

            // 'o' opens the last saved composite
            if key.code == KeyCode::Char('o')
                && let Some(path) = &last_saved
            {
                if let Err(e) = open::that_detached(path) {
                    error!("Failed to open composite: {}", e);
                    status_message = format!("Error: {}", e);
                }
            }

            // 'q' also quits
            if key.code == KeyCode::Char('q') {
                break;
            }
        }
    }

    Ok(())
}

/// Enumerate and open the selected camera
fn acquire_camera(
    camera_index: Option<usize>,
    config: &Config,
) -> Result<(CameraPipeline, FrameReceiver), CameraError> {
    let cameras = enumerate_cameras();
    if cameras.is_empty() {
        return Err(CameraError::NoCameraFound);
    }

    let index = camera_index
        .or_else(|| {
            let last = config.last_camera_path.as_deref()?;
            cameras.iter().position(|c| c.name == last || c.path == last)
        })
        .unwrap_or(0);

    let device = cameras
        .get(index)
        .ok_or(CameraError::NoCameraFound)?;

    initialize_camera(device)
}

fn initialize_camera(
    device: &CameraDevice,
) -> Result<(CameraPipeline, FrameReceiver), CameraError> {
    info!(device = %device.name, "Initializing camera");

    let formats = get_formats(&device.path);
    let format = select_capture_format(&formats).ok_or_else(|| {
        CameraError::InvalidFormat(format!("no supported formats for {}", device.name))
    })?;

    info!(format = %format, "Selected format");
    CameraPipeline::open(device, &format)
}

/// Status line advertising the currently visible controls
fn build_status_message(session: &BoothSession, camera_ready: bool) -> String {
    if session.ready_to_download() {
        return "'d' download | 'r' retry | 'o' open | 'q' quit".to_string();
    }

    let mut msg = String::new();
    if camera_ready {
        msg.push_str("'s' start | ");
    }
    msg.push_str("'u' overlay | 'q' quit");
    msg
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
    /// Frozen frames (the captured second photo) ignore further updates
    frozen: bool,
    mirror: bool,
}

impl FrameWidget {
    fn new(mirror: bool) -> Self {
        Self {
            frame: None,
            frozen: false,
            mirror,
        }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        if !self.frozen {
            self.frame = Some(frame);
        }
    }

    /// Replace the live feed with a still image
    fn freeze(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
        self.frozen = true;
        // Captures are never mirrored
        self.mirror = false;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        if frame.width == 0 || frame.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-blocks
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        // Scale factors
        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Each terminal cell represents 2 vertical pixels:
        // upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let sample_tx = if self.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };

                let src_x = (sample_tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (tr, tg, tb) = frame.pixel_rgb(src_x, src_y_top);
                let (br, bg, bb) = frame.pixel_rgb(src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(tr, tg, tb));
                    cell.set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}

/// 5x5 block glyphs for the countdown digits 0-9
const DIGIT_ROWS: [[&str; 5]; 10] = [
    ["█████", "█   █", "█   █", "█   █", "█████"],
    ["  █  ", " ██  ", "  █  ", "  █  ", "█████"],
    ["█████", "    █", "█████", "█    ", "█████"],
    ["█████", "    █", " ████", "    █", "█████"],
    ["█   █", "█   █", "█████", "    █", "    █"],
    ["█████", "█    ", "█████", "    █", "█████"],
    ["█████", "█    ", "█████", "█   █", "█████"],
    ["█████", "    █", "   █ ", "  █  ", "  █  "],
    ["█████", "█   █", "█████", "█   █", "█████"],
    ["█████", "█   █", "█████", "    █", "█████"],
];

/// Large countdown digit drawn over the preview
struct CountdownDigit {
    value: u32,
}

impl Widget for CountdownDigit {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(rows) = DIGIT_ROWS.get(self.value as usize % 10) else {
            return;
        };

        let glyph_width = 5u16;
        let glyph_height = rows.len() as u16;
        if area.width < glyph_width || area.height < glyph_height {
            return;
        }

        let x = area.x + (area.width - glyph_width) / 2;
        let y = area.y + (area.height - glyph_height) / 2;

        for (row_index, row) in rows.iter().enumerate() {
            buf.set_string(
                x,
                y + row_index as u16,
                row,
                Style::default().fg(Color::Yellow),
            );
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        // Render text
        let text = if self.message.len() > area.width as usize {
            &self.message[..area.width as usize]
        } else {
            self.message
        };

        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
