use crate::canvas::Canvas;
use crate::renderer::{FaceAssets, FaceState};

/// Fill the fixed tick ring.
pub fn render(canvas: &mut Canvas, state: &FaceState, assets: &FaceAssets) {
    let fill = state.config.theme.tick_color;
    for tick in &assets.ticks {
        canvas.fill_polygon(&tick.outline(), fill);
    }
}
