use anyhow::{Context, Result};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};

/// Software drawing surface backing the layer-shell buffer.
pub struct Canvas {
    pub pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height).expect("Failed to create pixmap"),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        self.pixmap
            .fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let paint = solid_paint(color);
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: [u8; 4], width: f32) {
        let mut pb = PathBuilder::new();
        pb.move_to(x1, y1);
        pb.line_to(x2, y2);
        if let Some(path) = pb.finish() {
            let paint = solid_paint(color);
            let stroke = Stroke { width, ..Stroke::default() };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: [u8; 4]) {
        if let Some(path) = polygon_path(points) {
            let paint = solid_paint(color);
            self.pixmap.fill_path(
                &path,
                &paint,
                tiny_skia::FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    pub fn stroke_polygon(&mut self, points: &[(f32, f32)], color: [u8; 4], width: f32) {
        if let Some(path) = polygon_path(points) {
            let paint = solid_paint(color);
            let stroke = Stroke { width, ..Stroke::default() };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    pub fn draw_image(&mut self, img: &Pixmap, x: i32, y: i32) {
        self.pixmap.draw_pixmap(
            x,
            y,
            img.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Convert RGBA pixels to BGRA (ARGB8888 in little-endian) for wl_shm.
    pub fn pixels_argb8888(&self) -> Vec<u8> {
        let data = self.pixmap.data();
        let mut out = vec![0u8; data.len()];
        for i in (0..data.len()).step_by(4) {
            out[i] = data[i + 2];
            out[i + 1] = data[i + 1];
            out[i + 2] = data[i];
            out[i + 3] = data[i + 3];
        }
        out
    }
}

fn solid_paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn polygon_path(points: &[(f32, f32)]) -> Option<tiny_skia::Path> {
    let (&first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

/// Loaded face font for the date label.
pub struct FontState {
    font: fontdue::Font,
}

impl FontState {
    /// Load a font from a file path, or search the system font directories
    /// for a face whose file name contains `name` (case-insensitive).
    pub fn load(name: &str) -> Result<Self> {
        if let Ok(data) = std::fs::read(expand_tilde(name)) {
            let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("Failed to parse font: {}", name))?;
            return Ok(Self { font });
        }

        let search_paths = [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/nix/var/nix/profiles/system/sw/share/X11/fonts",
        ];
        for base in &search_paths {
            if let Some(font) = walk_for_font(std::path::Path::new(base), name) {
                return Ok(Self { font });
            }
        }

        // Any face at all beats no date label.
        for base in &search_paths {
            if let Some(font) = walk_for_font(std::path::Path::new(base), "") {
                log::warn!("Font '{}' not found, using first system font", name);
                return Ok(Self { font });
            }
        }

        anyhow::bail!("No usable font found for '{}'. Install a TTF/OTF font or set [face] font to a file path.", name)
    }

    pub fn measure_text(&self, text: &str, size: f32) -> (f32, f32) {
        let mut width = 0.0f32;
        let mut max_height = 0.0f32;
        for ch in text.chars() {
            let metrics = self.font.metrics(ch, size);
            width += metrics.advance_width;
            max_height = max_height.max(metrics.height as f32);
        }
        (width, max_height)
    }

    pub fn draw_text(&self, canvas: &mut Canvas, text: &str, x: f32, y: f32, size: f32, color: [u8; 4]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            if !bitmap.is_empty() && metrics.width > 0 && metrics.height > 0 {
                let gx = cursor_x as i32 + metrics.xmin;
                let gy = y as i32 + size as i32 - metrics.height as i32 - metrics.ymin;
                for row in 0..metrics.height {
                    for col in 0..metrics.width {
                        let coverage = bitmap[row * metrics.width + col];
                        if coverage == 0 {
                            continue;
                        }
                        let px = gx + col as i32;
                        let py = gy + row as i32;
                        if px < 0 || py < 0 || px as u32 >= canvas.width() || py as u32 >= canvas.height() {
                            continue;
                        }
                        let alpha = (coverage as u32 * color[3] as u32) / 255;
                        if alpha > 0 {
                            blend_pixel(&mut canvas.pixmap, px as u32, py as u32, color, alpha as u8);
                        }
                    }
                }
            }
            cursor_x += metrics.advance_width;
        }
    }
}

fn walk_for_font(dir: &std::path::Path, name: &str) -> Option<fontdue::Font> {
    let needle = name.to_lowercase();
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(f) = walk_for_font(&path, name) {
                return Some(f);
            }
            continue;
        }
        let Some(ext) = path.extension() else { continue };
        let ext = ext.to_string_lossy().to_lowercase();
        if ext != "ttf" && ext != "otf" {
            continue;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !needle.is_empty() && !file_name.contains(&needle) {
            continue;
        }
        if let Ok(data) = std::fs::read(&path) {
            if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                log::info!("Using font: {}", path.display());
                return Some(font);
            }
        }
    }
    None
}

fn blend_pixel(pixmap: &mut Pixmap, x: u32, y: u32, color: [u8; 4], alpha: u8) {
    let w = pixmap.width();
    let idx = ((y * w + x) * 4) as usize;
    let data = pixmap.data_mut();
    if idx + 3 >= data.len() {
        return;
    }

    let a = alpha as u32;
    let inv_a = 255 - a;
    data[idx] = ((color[0] as u32 * a + data[idx] as u32 * inv_a) / 255) as u8;
    data[idx + 1] = ((color[1] as u32 * a + data[idx + 1] as u32 * inv_a) / 255) as u8;
    data[idx + 2] = ((color[2] as u32 * a + data[idx + 2] as u32 * inv_a) / 255) as u8;
    data[idx + 3] = (a + data[idx + 3] as u32 * inv_a / 255).min(255) as u8;
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}/{}", home, rest);
        }
    }
    path.to_string()
}

pub fn load_image(path: &str) -> Option<Pixmap> {
    if path.is_empty() {
        return None;
    }
    let expanded = expand_tilde(path);
    let img = image::open(&expanded).ok()?.to_rgba8();
    let (w, h) = img.dimensions();
    let mut pixmap = Pixmap::new(w, h)?;
    // image gives straight RGBA, tiny-skia stores premultiplied
    let src = img.as_raw();
    let dst = pixmap.data_mut();
    for i in (0..src.len()).step_by(4) {
        let a = src[i + 3] as u32;
        dst[i] = ((src[i] as u32 * a) / 255) as u8;
        dst[i + 1] = ((src[i + 1] as u32 * a) / 255) as u8;
        dst[i + 2] = ((src[i + 2] as u32 * a) / 255) as u8;
        dst[i + 3] = src[i + 3];
    }
    Some(pixmap)
}

pub fn scale_image(src: &Pixmap, target_w: u32, target_h: u32, mode: &str) -> Pixmap {
    let mut dest = Pixmap::new(target_w, target_h).expect("Failed to create pixmap");
    let sw = src.width() as f32;
    let sh = src.height() as f32;
    let tw = target_w as f32;
    let th = target_h as f32;

    let (sx, sy, tx, ty) = match mode {
        "fit" => {
            let scale = (tw / sw).min(th / sh);
            (scale, scale, (tw - sw * scale) / 2.0, (th - sh * scale) / 2.0)
        }
        "stretch" => (tw / sw, th / sh, 0.0, 0.0),
        "center" => (1.0, 1.0, (tw - sw) / 2.0, (th - sh) / 2.0),
        // "fill" and anything else
        _ => {
            let scale = (tw / sw).max(th / sh);
            (scale, scale, (tw - sw * scale) / 2.0, (th - sh * scale) / 2.0)
        }
    };

    dest.draw_pixmap(
        0,
        0,
        src.as_ref(),
        &PixmapPaint::default(),
        Transform::from_scale(sx, sy).post_translate(tx, ty),
        None,
    );
    dest
}
