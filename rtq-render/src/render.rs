use ab_glyph::{point, Font, FontVec, Glyph, GlyphId, PxScale, ScaleFont};
use anyhow::Result;
use rtq_core::ButtonCue;
use tiny_skia::{Color, Paint, Pixmap, PremultipliedColorU8, Rect, Transform};

const BUTTON_WIDTH: f32 = 260.0;
const BUTTON_HEIGHT: f32 = 140.0;

/// Software renderer for the reaction test screen.
///
/// Draws directly into a premultiplied RGBA pixmap the app copies to the
/// surface: instruction line on top, the response button in the center, the
/// reaction-time line below it, exit hint at the bottom.
pub struct Renderer {
    width: u32,
    height: u32,
    center_x: f32,
    center_y: f32,
    font: FontVec,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let font = load_font()?;
        Ok(Self {
            width,
            height,
            center_x: width as f32 / 2.0,
            center_y: height as f32 / 2.0,
            font,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.center_x = width as f32 / 2.0;
        self.center_y = height as f32 / 2.0;
    }

    /// The response button's screen rectangle, also used for click
    /// hit-testing by the app.
    pub fn button_rect(&self) -> Rect {
        Rect::from_xywh(
            self.center_x - BUTTON_WIDTH / 2.0,
            self.center_y - BUTTON_HEIGHT / 2.0,
            BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
        .expect("non-zero button rect")
    }

    /// Render a complete frame. `reaction_line` is whatever the app wants
    /// under the button ("Reaction Time: 312 ms", the saved-file note, or
    /// empty for nothing).
    pub fn render_frame(
        &self,
        pixmap: &mut Pixmap,
        cue: ButtonCue,
        reaction_line: &str,
    ) -> Result<()> {
        pixmap.fill(Color::BLACK);

        self.draw_text_centered(
            pixmap,
            cue.instruction(),
            self.center_x,
            self.center_y - BUTTON_HEIGHT / 2.0 - 60.0,
            22.0,
            Color::WHITE,
        );

        self.draw_button(pixmap, cue);

        if !reaction_line.is_empty() {
            self.draw_text_centered(
                pixmap,
                reaction_line,
                self.center_x,
                self.center_y + BUTTON_HEIGHT / 2.0 + 50.0,
                18.0,
                Color::from_rgba8(200, 200, 200, 255),
            );
        }

        self.draw_text_centered(
            pixmap,
            "Press ESC to exit",
            self.center_x,
            self.height as f32 - 30.0,
            14.0,
            Color::from_rgba8(120, 120, 120, 255),
        );

        Ok(())
    }

    fn draw_button(&self, pixmap: &mut Pixmap, cue: ButtonCue) {
        let [r, g, b, a] = cue.fill();
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(r, g, b, a));
        paint.anti_alias = true;

        pixmap.fill_rect(self.button_rect(), &paint, Transform::identity(), None);

        let label_color = if cue == ButtonCue::Go {
            Color::WHITE
        } else {
            Color::BLACK
        };
        self.draw_text_centered(
            pixmap,
            cue.label(),
            self.center_x,
            self.center_y + 8.0,
            24.0,
            label_color,
        );
    }

    /// Lays out `text` with kerning, centers it on `center_x`, and blends the
    /// glyph coverage into the pixmap. Small per-frame text volume, so no
    /// glyph caching.
    fn draw_text_centered(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        size: f32,
        color: Color,
    ) {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);

        let mut pen_x = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        let mut glyphs: Vec<(GlyphId, f32)> = Vec::with_capacity(text.len());

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev_id) = prev {
                pen_x += scaled.kern(prev_id, id);
            }
            glyphs.push((id, pen_x));
            pen_x += scaled.h_advance(id);
            prev = Some(id);
        }

        let origin_x = center_x - pen_x / 2.0;
        let cu8 = color.to_color_u8();
        let (cr, cg, cb) = (cu8.red(), cu8.green(), cu8.blue());

        let width = pixmap.width();
        let height = pixmap.height();
        let pixels = pixmap.pixels_mut();

        for (id, offset_x) in glyphs {
            let glyph = Glyph {
                id,
                scale,
                position: point(origin_x + offset_x, baseline_y),
            };
            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i32 + gx as i32;
                    let py = bounds.min.y as i32 + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        return;
                    }
                    if coverage <= 0.0 {
                        return;
                    }
                    let idx = py as usize * width as usize + px as usize;
                    pixels[idx] = blend_coverage(pixels[idx], cr, cg, cb, coverage.min(1.0));
                });
            }
        }
    }
}

/// Source-over blend of an opaque text color at `coverage` into one
/// premultiplied destination pixel.
fn blend_coverage(
    dst: PremultipliedColorU8,
    r: u8,
    g: u8,
    b: u8,
    coverage: f32,
) -> PremultipliedColorU8 {
    let inv = 1.0 - coverage;
    let out_r = (r as f32 * coverage + dst.red() as f32 * inv) as u8;
    let out_g = (g as f32 * coverage + dst.green() as f32 * inv) as u8;
    let out_b = (b as f32 * coverage + dst.blue() as f32 * inv) as u8;
    let out_a = (255.0 * coverage + dst.alpha() as f32 * inv) as u8;
    PremultipliedColorU8::from_rgba(
        out_r.min(out_a),
        out_g.min(out_a),
        out_b.min(out_a),
        out_a,
    )
    .unwrap_or(dst)
}

/// Loads a TTF from `RTQ_FONT` or the usual system locations.
fn load_font() -> Result<FontVec> {
    let mut candidates: Vec<String> = Vec::new();
    if let Ok(path) = std::env::var("RTQ_FONT") {
        candidates.push(path);
    }
    candidates.extend(
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    for path in &candidates {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                return Ok(font);
            }
        }
    }

    Err(anyhow::anyhow!(
        "no usable font found (tried {:?}); set RTQ_FONT to a .ttf path",
        candidates
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_at_full_coverage_replaces_the_pixel() {
        let dst = PremultipliedColorU8::from_rgba(10, 10, 10, 255).unwrap();
        let out = blend_coverage(dst, 200, 100, 50, 1.0);
        assert_eq!(out.red(), 200);
        assert_eq!(out.green(), 100);
        assert_eq!(out.blue(), 50);
        assert_eq!(out.alpha(), 255);
    }

    #[test]
    fn blend_at_zero_coverage_keeps_the_pixel() {
        let dst = PremultipliedColorU8::from_rgba(10, 20, 30, 255).unwrap();
        let out = blend_coverage(dst, 200, 100, 50, 0.0);
        assert_eq!(out.red(), 10);
        assert_eq!(out.green(), 20);
        assert_eq!(out.blue(), 30);
    }
}
