use crate::canvas::Canvas;
use crate::dial;
use crate::geometry::Rect;
use crate::renderer::{FaceAssets, FaceState};

const SECOND_HAND_WIDTH: f32 = 2.0;
const OUTLINE_WIDTH: f32 = 1.0;

/// Paint second hand, minute hand, hour hand, then the center dot.
pub fn render(canvas: &mut Canvas, state: &FaceState, assets: &mut FaceAssets) {
    let theme = &state.config.theme;
    let time = &state.time;
    let bounds = Rect::from_size(state.width as i32, state.height as i32);
    let center = bounds.center();

    // Second hand: plain line from center to tip.
    let length = dial::second_hand_length(state.config.face.shape, bounds);
    let tip = dial::second_hand_tip(center, length, time.second);
    canvas.draw_line(
        tip.x as f32,
        tip.y as f32,
        center.x as f32,
        center.y as f32,
        theme.second_hand_color,
        SECOND_HAND_WIDTH,
    );

    // Minute and hour hands: filled polygon plus outline.
    assets.minute_hand.rotate_to(dial::minute_hand_angle(time.minute));
    let outline = assets.minute_hand.outline();
    canvas.fill_polygon(&outline, theme.hand_color);
    canvas.stroke_polygon(&outline, theme.hand_outline_color, OUTLINE_WIDTH);

    assets
        .hour_hand
        .rotate_to(dial::hour_hand_angle(time.hour, time.minute));
    let outline = assets.hour_hand.outline();
    canvas.fill_polygon(&outline, theme.hand_color);
    canvas.stroke_polygon(&outline, theme.hand_outline_color, OUTLINE_WIDTH);

    // 3x3 dot over the pivot.
    canvas.fill_rect(
        (bounds.w / 2 - 1) as f32,
        (bounds.h / 2 - 1) as f32,
        3.0,
        3.0,
        theme.dot_color,
    );
}
