//! Spinning terminal globe over a loaded session
//!
//! Orthographic projection looking down -Z. Each character cell on the disk
//! is unprojected back onto the sphere and colored by the bin that owns it;
//! hidden nodes are drawn from their synthetic positions. Mouse movement is
//! turned into pick rays and handed to the session for hit-testing.

use crate::globe::{Ray, Vec3};
use crate::hexbin::{Bin, CellId};
use crate::hit_test::PointerEvent;
use crate::report::{detail_lines, notice_line, tooltip_lines, totals_line};
use crate::session::Session;
use crate::terminal::{Input, Terminal};
use crossterm::event::KeyCode;
use crossterm::style::Color;
use std::collections::HashMap;
use std::io;

/// Character cells are roughly twice as tall as wide
const CELL_ASPECT: f64 = 2.0;
/// Scene extent shown, as a multiple of the globe radius
const VIEW_MARGIN: f64 = 1.55;
/// Rows reserved for the status area
const STATUS_ROWS: u16 = 3;

const OCEAN: Color = Color::DarkGrey;

/// Screen mapping for one terminal size
#[derive(Clone, Copy, Debug)]
pub struct GlobeView {
    cx: f64,
    cy: f64,
    scale: f64,          // Rows per scene unit
    globe_radius: f64,
}

impl GlobeView {
    pub fn fit(width: u16, height: u16, globe_radius: f64) -> Self {
        let rows = height.saturating_sub(STATUS_ROWS).max(2) as f64;
        let half_rows = rows / 2.0 - 0.5;
        let half_cols = width.max(2) as f64 / 2.0 - 0.5;
        let radius_rows = half_rows.min(half_cols / CELL_ASPECT).max(1.0);
        Self {
            cx: half_cols,
            cy: half_rows,
            scale: radius_rows / (globe_radius * VIEW_MARGIN),
            globe_radius,
        }
    }

    /// Scene (x, y) under the center of a character cell
    fn unproject(&self, col: u16, row: u16) -> (f64, f64) {
        let x = (col as f64 - self.cx) / (self.scale * CELL_ASPECT);
        let y = (self.cy - row as f64) / self.scale;
        (x, y)
    }

    /// Cell for a world-space point, or None when hidden behind the globe
    pub fn project(&self, p: Vec3) -> Option<(i32, i32)> {
        let behind = p.z < 0.0 && p.x * p.x + p.y * p.y < self.globe_radius * self.globe_radius;
        if behind {
            return None;
        }
        let col = (self.cx + p.x * self.scale * CELL_ASPECT).round() as i32;
        let row = (self.cy - p.y * self.scale).round() as i32;
        Some((col, row))
    }

    /// Camera ray through a character cell
    pub fn pick_ray(&self, col: u16, row: u16) -> Ray {
        let (x, y) = self.unproject(col, row);
        Ray {
            origin: Vec3::new(x, y, self.globe_radius * 10.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Surface point (world space) under a cell, if the cell is on the disk
    fn surface(&self, col: u16, row: u16) -> Option<Vec3> {
        let (x, y) = self.unproject(col, row);
        let z2 = self.globe_radius * self.globe_radius - x * x - y * y;
        (z2 >= 0.0).then(|| Vec3::new(x, y, z2.sqrt()))
    }
}

/// Pointer event for a cell: hidden nodes drawn there win over the globe
pub fn pointer_at(session: &Session, view: &GlobeView, col: u16, row: u16) -> PointerEvent {
    let rotation = session.animation().rotation_y();
    let hidden = session.placements().iter().position(|p| {
        view.project(p.position.rotate_y(rotation)) == Some((col as i32, row as i32))
    });
    match hidden {
        Some(index) => PointerEvent::Hidden { index },
        None => PointerEvent::Ray(view.pick_ray(col, row)),
    }
}

/// Bin owning a surface location. Cells near the antimeridian are also
/// looked up one turn east and west, where edge bins are keyed.
fn bin_at<'a>(session: &'a Session, index: &HashMap<CellId, usize>, lat: f64, lng: f64) -> Option<&'a Bin> {
    [lng, lng + 360.0, lng - 360.0]
        .into_iter()
        .find_map(|l| index.get(&session.binner().cell_of(l, lat)))
        .map(|&k| &session.layer().bins[k])
}

/// Draw one frame of the globe into the buffer
pub fn draw_globe(term: &mut Terminal, session: &Session, view: &GlobeView) {
    let (width, height) = term.size();
    let rotation = session.animation().rotation_y();
    let index = session.layer().index();

    for row in 0..height.saturating_sub(STATUS_ROWS) {
        for col in 0..width {
            let Some(world) = view.surface(col, row) else {
                continue;
            };
            let Some((lat, lng)) = session.tester().surface_location(world, rotation) else {
                continue;
            };
            match bin_at(session, &index, lat, lng) {
                Some(bin) => {
                    let ch = if bin.altitude >= 0.2 { '█' } else if bin.altitude >= 0.1 { '▓' } else { '▒' };
                    term.set(col as i32, row as i32, ch, Some(bin.color.to_color()), false);
                }
                None => term.set(col as i32, row as i32, '·', Some(OCEAN), false),
            }
        }
    }

    for placement in session.placements() {
        if let Some((col, row)) = view.project(placement.position.rotate_y(rotation)) {
            if row < height.saturating_sub(STATUS_ROWS) as i32 {
                term.set(col, row, '•', Some(placement.tint.to_color()), false);
            }
        }
    }
}

fn draw_status(term: &mut Terminal, session: &Session, prompt: Option<&str>, panel: &[String]) {
    let (width, height) = term.size();
    let base = height.saturating_sub(STATUS_ROWS) as i32;

    let head = match prompt {
        Some(text) => format!("filter: {}_", text),
        None if session.query().is_empty() => notice_line(session.notice()),
        None => format!("filter: {}  (c to clear)", session.query()),
    };
    term.set_str(0, base, &head, Some(Color::Cyan), true);
    term.set_str(0, base + 1, &totals_line(&session.totals()), Some(Color::White), false);
    term.set_str(
        0,
        base + 2,
        "[q] quit  [space] pause  [/] filter  [click] details",
        Some(Color::DarkGrey),
        false,
    );

    // Panel in the top-left corner
    for (i, line) in panel.iter().enumerate() {
        let clipped: String = line.chars().take(width as usize).collect();
        term.set_str(0, i as i32, &clipped, Some(Color::Yellow), false);
    }
}

/// Render a single frame off-screen (print mode)
pub fn snapshot(session: &Session, width: u16, height: u16) -> Terminal {
    let mut term = Terminal::offscreen(width, height);
    let view = GlobeView::fit(width, height, session.tester().config().globe_radius);
    draw_globe(&mut term, session, &view);
    draw_status(&mut term, session, None, &[]);
    term
}

/// Interactive loop. Returns after `q`/Esc; the session is torn down on exit.
pub fn run(session: &mut Session, frame_secs: f32) -> io::Result<()> {
    let mut term = Terminal::new(true)?;
    term.clear_screen()?;
    term.capture_mouse()?;
    session.register_listener("pointer", Terminal::release_mouse);
    session.register_listener("resize", || log::debug!("Resize handler detached"));
    session.animation_mut().start();

    let globe_radius = session.tester().config().globe_radius;
    let (w, h) = term.size();
    let mut view = GlobeView::fit(w, h, globe_radius);
    let mut pointer: Option<(u16, u16)> = None;
    let mut prompt: Option<String> = None;
    let mut panel: Vec<String> = Vec::new();
    let mut paused = false;

    'frames: loop {
        while let Some(input) = term.poll_input(0)? {
            if let (Some(text), Input::Key(code)) = (prompt.as_mut(), input) {
                match code {
                    KeyCode::Enter => {
                        let query = std::mem::take(text);
                        session.filter(&query);
                        prompt = None;
                    }
                    KeyCode::Esc => prompt = None,
                    KeyCode::Backspace => {
                        text.pop();
                    }
                    KeyCode::Char(c) => text.push(c),
                    _ => {}
                }
                continue;
            }

            match input {
                Input::Key(KeyCode::Char('q')) | Input::Key(KeyCode::Esc) => break 'frames,
                Input::Key(KeyCode::Char(' ')) => {
                    paused = !paused;
                    if paused {
                        session.animation_mut().stop();
                    } else {
                        session.animation_mut().start();
                    }
                }
                Input::Key(KeyCode::Char('/')) => prompt = Some(String::new()),
                Input::Key(KeyCode::Char('c')) => {
                    session.filter("");
                }
                Input::Hover { col, row } => pointer = Some((col, row)),
                Input::Click { col, row } => {
                    let event = pointer_at(session, &view, col, row);
                    panel = session
                        .resolve(&event)
                        .entity()
                        .and_then(|entity| session.click(entity))
                        .map(|detail| detail_lines(&detail))
                        .unwrap_or_default();
                }
                Input::Resize { width, height } => {
                    term.resize(width, height);
                    view = GlobeView::fit(width, height, globe_radius);
                }
                _ => {}
            }
        }

        session.animation_mut().tick();

        // Re-resolve every frame: the globe moves under a still pointer
        let hover = pointer
            .map(|(col, row)| pointer_at(session, &view, col, row))
            .and_then(|event| session.hover(&event))
            .map(|tooltip| tooltip_lines(&tooltip));
        let lines = hover.as_deref().unwrap_or(panel.as_slice());

        term.clear();
        draw_globe(&mut term, session, &view);
        draw_status(&mut term, session, prompt.as_deref(), lines);
        term.render()?;
        term.sleep(frame_secs);
    }

    session.teardown();
    Ok(())
}
