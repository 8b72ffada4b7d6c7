use crate::canvas::{Canvas, FontState};
use crate::config::WatchConfig;
use crate::geometry::{self, Rect, Size, VAlign};
use crate::renderer::FaceState;
use crate::time_utils::WallTime;

/// Measure the date text and place it within the face bounds. Called from
/// the tick handler; the resulting rect is cached until the next tick.
pub fn layout(font: &FontState, config: &WatchConfig, width: u32, height: u32, time: &WallTime) -> Rect {
    let (tw, th) = font.measure_text(&time.date_string, config.face.font_size);
    let content = Size {
        w: tw.ceil() as i32,
        h: th.ceil() as i32,
    };
    let bounds = Rect::from_size(width as i32, height as i32);
    geometry::vertical_align(bounds, content, VAlign::parse(&config.face.date_align))
}

/// Draw the date label at its precomputed rect.
pub fn render(canvas: &mut Canvas, state: &FaceState, font: &FontState) {
    let r = state.date_rect;
    font.draw_text(
        canvas,
        &state.time.date_string,
        r.x as f32,
        r.y as f32,
        state.config.face.font_size,
        state.config.theme.date_color,
    );
}
