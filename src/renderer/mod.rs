pub mod date;
pub mod hands;
pub mod ticks;

use tiny_skia::Pixmap;

use crate::canvas::{self, Canvas, FontState};
use crate::config::WatchConfig;
use crate::dial::{self, HandPath, HOUR_HAND_POINTS, MINUTE_HAND_POINTS};
use crate::geometry::Rect;
use crate::time_utils::WallTime;

/// Per-frame state snapshot handed to the paint routines.
pub struct FaceState {
    pub config: WatchConfig,
    pub time: WallTime,
    pub date_rect: Rect,
    pub width: u32,
    pub height: u32,
}

/// Resources with a startup-to-shutdown lifetime: the scaled background
/// image, the two hand paths, and the tick ring. Dropped with the app.
pub struct FaceAssets {
    pub background: Option<Pixmap>,
    pub minute_hand: HandPath,
    pub hour_hand: HandPath,
    pub ticks: Vec<HandPath>,
}

impl FaceAssets {
    pub fn load(config: &WatchConfig, width: u32, height: u32) -> Self {
        let background = if config.background.image.is_empty() {
            None
        } else {
            let loaded = canvas::load_image(&config.background.image)
                .map(|img| canvas::scale_image(&img, width, height, &config.background.scale));
            if loaded.is_none() {
                log::warn!("Failed to load background image: {}", config.background.image);
            }
            loaded
        };

        let center = Rect::from_size(width as i32, height as i32).center();
        let mut minute_hand = HandPath::new(&MINUTE_HAND_POINTS);
        let mut hour_hand = HandPath::new(&HOUR_HAND_POINTS);
        minute_hand.move_to(center);
        hour_hand.move_to(center);

        Self {
            background,
            minute_hand,
            hour_hand,
            ticks: dial::tick_marks(config.face.shape),
        }
    }
}

/// Surface size for the configured face.
pub fn compute_size(config: &WatchConfig) -> (u32, u32) {
    config.face.bounds()
}

/// Paint one frame. Stacking order: background image, date label, tick
/// ring, hands, center dot — the dial paints above the date text.
pub fn render(canvas: &mut Canvas, state: &FaceState, font: &FontState, assets: &mut FaceAssets) {
    canvas.clear(state.config.theme.bg_color);
    if let Some(bg) = &assets.background {
        canvas.draw_image(bg, 0, 0);
    }

    date::render(canvas, state, font);
    ticks::render(canvas, state, assets);
    hands::render(canvas, state, assets);
}
