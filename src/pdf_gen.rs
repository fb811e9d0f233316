//! Document renderer: lays the board out on a single A4 landscape page.
//!
//! Geometry is expressed in PostScript points and converted to millimeters
//! at the printpdf boundary. Text wrapping measures real Helvetica advance
//! widths so content fills each lane without overflowing it.

use chrono::{DateTime, Local, Utc};
use printpdf::path::PaintMode;
use printpdf::*;

use crate::error::{KanbanError, Result};
use crate::logo;
use crate::models::{Column, Project, Task};

// Page geometry (A4 landscape, points).
const PAGE_WIDTH: f32 = 841.89;
const PAGE_HEIGHT: f32 = 595.28;
const MARGIN: f32 = 30.0;

// Header band.
const LOGO_BOX: f32 = 60.0;
const TITLE_FONT_SIZE: f32 = 18.0;
const INFO_FONT_SIZE: f32 = 10.0;

// Column lanes.
const LANES_TOP: f32 = PAGE_HEIGHT - 130.0;
const LANE_HEADER_FONT_SIZE: f32 = 14.0;

// Post-it blocks.
const NOTE_HEIGHT: f32 = 80.0;
const NOTE_GAP: f32 = 15.0;
const META_FONT_SIZE: f32 = 7.0;
const CONTENT_FONT_SIZE: f32 = 9.0;
const MAX_CONTENT_LINES: usize = 3;
/// Characters kept of the last line before the ellipsis.
const ELLIPSIS_CUT: usize = 30;
/// A note whose top would land below this is dropped along with the rest of
/// its lane; there is no second page.
const MIN_BOTTOM: f32 = 80.0;

// Footer.
const FOOTER_FONT_SIZE: f32 = 8.0;
const ATTRIBUTION: &str = "Kanban Board";

/// Lane header accent (#1f77b4).
const ACCENT: (f32, f32, f32) = (0.12, 0.47, 0.71);
/// Pale yellow used when a stored color string cannot be parsed.
const FALLBACK_FILL: (f32, f32, f32) = (1.0, 1.0, 0.8);

/// Advance widths for Helvetica, chars 0x20..=0x7E, in 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Advance widths for Helvetica-Bold, same range.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
}

/// Width of `text` at `font_size` points. Characters outside the printable
/// ASCII range are charged a lowercase-n width.
fn text_width(text: &str, font_size: f32, face: Face) -> f32 {
    let table = match face {
        Face::Regular => &HELVETICA_WIDTHS,
        Face::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let units: u32 = text
        .chars()
        .map(|c| {
            let idx = c as usize;
            if (0x20..=0x7E).contains(&idx) {
                table[idx - 0x20] as u32
            } else {
                table[('n' as usize) - 0x20] as u32
            }
        })
        .sum();
    units as f32 / 1000.0 * font_size
}

/// Greedy word-by-word fill against the lane width.
fn wrap_words(content: &str, max_width: f32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in content.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, CONTENT_FONT_SIZE, Face::Bold) < max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// The lines actually rendered for a note: at most three, the third cut and
/// suffixed with an ellipsis when the wrap produced more than three.
pub fn wrap_note_content(content: &str, max_width: f32) -> Vec<String> {
    let mut lines = wrap_words(content, max_width);
    if lines.len() > MAX_CONTENT_LINES {
        lines.truncate(MAX_CONTENT_LINES);
        let kept: String = lines[MAX_CONTENT_LINES - 1]
            .chars()
            .take(ELLIPSIS_CUT)
            .collect();
        lines[MAX_CONTENT_LINES - 1] = format!("{kept}...");
    }
    lines
}

/// Parse `#RRGGBB` into normalized RGB, falling back to pale yellow on any
/// malformed input.
fn parse_hex_color(hex: &str) -> (f32, f32, f32) {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return FALLBACK_FILL;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v as f32 / 255.0)
            .ok()
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => (r, g, b),
        _ => FALLBACK_FILL,
    }
}

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn rgb(color: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

fn format_short(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%d/%m %H:%M").to_string()
}

fn render_err(e: impl std::fmt::Display) -> KanbanError {
    KanbanError::Render(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

/// Render the whole board into PDF bytes.
pub fn render_board(project: &Project, tasks: &[Task]) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(&project.title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "board");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(render_err)?,
    };
    let layer = doc.get_page(page).get_layer(layer);

    draw_header(&layer, project, &fonts);
    draw_lanes(&layer, tasks, &fonts);
    draw_footer(&layer, &fonts);

    doc.save_to_bytes().map_err(render_err)
}

fn draw_header(layer: &PdfLayerReference, project: &Project, fonts: &Fonts) {
    if !project.logo_base64.is_empty() {
        match logo::decode(&project.logo_base64) {
            Ok(image) => draw_logo(layer, &image),
            Err(e) => tracing::warn!(error = %e, "skipping unreadable project logo"),
        }
    }

    layer.set_fill_color(rgb((0.0, 0.0, 0.0)));
    layer.use_text(
        &project.title,
        TITLE_FONT_SIZE,
        mm(110.0),
        mm(PAGE_HEIGHT - 50.0),
        &fonts.bold,
    );

    let info_y = PAGE_HEIGHT - 70.0;
    layer.use_text(
        format!("Code: {}", project.code),
        INFO_FONT_SIZE,
        mm(110.0),
        mm(info_y),
        &fonts.regular,
    );
    layer.use_text(
        format!("Created: {}", format_short(&project.created_at)),
        INFO_FONT_SIZE,
        mm(250.0),
        mm(info_y),
        &fonts.regular,
    );
    layer.use_text(
        format!("Admin: {}", project.admin_name),
        INFO_FONT_SIZE,
        mm(420.0),
        mm(info_y),
        &fonts.regular,
    );

    layer.set_outline_color(rgb((0.0, 0.0, 0.0)));
    layer.add_line(Line {
        points: vec![
            (Point::new(mm(MARGIN), mm(PAGE_HEIGHT - 100.0)), false),
            (
                Point::new(mm(PAGE_WIDTH - MARGIN), mm(PAGE_HEIGHT - 100.0)),
                false,
            ),
        ],
        is_closed: false,
    });
}

fn draw_logo(layer: &PdfLayerReference, image: &::image::DynamicImage) {
    let pixels = image.to_rgb8();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let xobject = ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: pixels.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    };

    // Scale uniformly so the logo fits the header box.
    let dpi = 300.0;
    let natural_w = width as f32 * 72.0 / dpi;
    let natural_h = height as f32 * 72.0 / dpi;
    let scale = (LOGO_BOX / natural_w).min(LOGO_BOX / natural_h);

    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(MARGIN)),
            translate_y: Some(mm(PAGE_HEIGHT - 90.0)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

fn draw_lanes(layer: &PdfLayerReference, tasks: &[Task], fonts: &Fonts) {
    let lane_width = (PAGE_WIDTH - 2.0 * MARGIN) / Column::ALL.len() as f32;

    for (index, column) in Column::ALL.into_iter().enumerate() {
        let x = MARGIN + index as f32 * lane_width;

        layer.set_fill_color(rgb(ACCENT));
        layer.use_text(
            column.as_str(),
            LANE_HEADER_FONT_SIZE,
            mm(x + 10.0),
            mm(LANES_TOP),
            &fonts.bold,
        );

        let mut note_top = LANES_TOP - 30.0;
        for task in tasks.iter().filter(|t| t.column == column) {
            if note_top < MIN_BOTTOM {
                // Remaining notes in this lane are dropped; no second page.
                break;
            }
            draw_note(layer, task, x, note_top, lane_width, fonts);
            note_top -= NOTE_HEIGHT + NOTE_GAP;
        }
    }
}

fn draw_note(
    layer: &PdfLayerReference,
    task: &Task,
    lane_x: f32,
    top: f32,
    lane_width: f32,
    fonts: &Fonts,
) {
    layer.set_fill_color(rgb(parse_hex_color(&task.color)));
    layer.set_outline_color(rgb((0.5, 0.5, 0.5)));
    layer.add_rect(
        Rect::new(
            mm(lane_x + 5.0),
            mm(top - NOTE_HEIGHT),
            mm(lane_x + 5.0 + lane_width - 15.0),
            mm(top),
        )
        .with_mode(PaintMode::FillStroke),
    );

    let text_x = mm(lane_x + 10.0);
    layer.set_fill_color(rgb((0.4, 0.4, 0.4)));
    layer.use_text(
        &task.owner,
        META_FONT_SIZE,
        text_x,
        mm(top - 15.0),
        &fonts.regular,
    );
    layer.use_text(
        format!("Created: {}", format_short(&task.created_at)),
        META_FONT_SIZE,
        text_x,
        mm(top - 25.0),
        &fonts.regular,
    );
    layer.use_text(
        format!("Edited: {}", format_short(&task.updated_at)),
        META_FONT_SIZE,
        text_x,
        mm(top - 35.0),
        &fonts.regular,
    );

    layer.set_fill_color(rgb((0.2, 0.2, 0.2)));
    let lines = wrap_note_content(&task.content, lane_width - 25.0);
    for (line_index, line) in lines.iter().enumerate() {
        layer.use_text(
            line,
            CONTENT_FONT_SIZE,
            text_x,
            mm(top - 50.0 - line_index as f32 * 10.0),
            &fonts.bold,
        );
    }
}

fn draw_footer(layer: &PdfLayerReference, fonts: &Fonts) {
    layer.set_fill_color(rgb((0.5, 0.5, 0.5)));
    layer.use_text(
        ATTRIBUTION,
        FOOTER_FONT_SIZE,
        mm(MARGIN),
        mm(30.0),
        &fonts.oblique,
    );

    let stamp = format!("Generated: {}", Local::now().format("%d/%m/%Y %H:%M"));
    let x = PAGE_WIDTH - MARGIN - text_width(&stamp, FOOTER_FONT_SIZE, Face::Regular);
    layer.use_text(&stamp, FOOTER_FONT_SIZE, mm(x), mm(30.0), &fonts.oblique);
}
