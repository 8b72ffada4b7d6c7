//! Dial geometry: hand angles, hand polygons, and tick marks.
//!
//! Everything here is a pure function of the wall-clock time and the
//! configured display shape, recomputed on every redraw.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::geometry::{Point, Rect};

/// Display geometry of the emulated watch. Controls the default surface
/// size, the second-hand length, and the tick-ring offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayShape {
    Round,
    Rectangular,
}

impl DisplayShape {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "round" => Some(DisplayShape::Round),
            "rect" | "rectangular" => Some(DisplayShape::Rectangular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayShape::Round => "round",
            DisplayShape::Rectangular => "rectangular",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            DisplayShape::Round => DisplayShape::Rectangular,
            DisplayShape::Rectangular => DisplayShape::Round,
        }
    }

    /// Native surface size for the shape.
    pub fn default_bounds(&self) -> (u32, u32) {
        match self {
            DisplayShape::Round => (180, 180),
            DisplayShape::Rectangular => (144, 168),
        }
    }
}

/// Design frame the tick ring is computed for. On round displays the ring
/// is shifted by (18, 6) so it stays concentric with the larger surface.
const TICK_FRAME: (i32, i32) = (144, 168);
const TICK_RING_OFFSET_ROUND: Point = Point { x: 18, y: 6 };

/// Hour positions around the dial, minus the 6 o'clock mark where the
/// date label sits.
pub const NUM_TICKS: usize = 11;

pub fn second_hand_angle(second: u32) -> f64 {
    TAU * f64::from(second % 60) / 60.0
}

pub fn minute_hand_angle(minute: u32) -> f64 {
    TAU * f64::from(minute % 60) / 60.0
}

/// The hour hand advances in 10-minute increments: 72 discrete positions
/// per lap, not continuous motion.
pub fn hour_hand_angle(hour: u32, minute: u32) -> f64 {
    let step = (hour % 12) * 6 + (minute % 60) / 10;
    TAU * f64::from(step) / 72.0
}

pub fn second_hand_length(shape: DisplayShape, bounds: Rect) -> i32 {
    match shape {
        DisplayShape::Round => bounds.w / 2 - 19,
        DisplayShape::Rectangular => bounds.w / 2,
    }
}

/// Outer endpoint of the second hand, rounded to the nearest pixel.
/// Angle zero points straight up from the center.
pub fn second_hand_tip(center: Point, length: i32, second: u32) -> Point {
    let a = second_hand_angle(second);
    Point {
        x: center.x + (f64::from(length) * a.sin()).round() as i32,
        y: center.y - (f64::from(length) * a.cos()).round() as i32,
    }
}

/// A filled polygon with a pivot offset and a rotation. The minute and
/// hour hands rotate about their pivot; tick marks keep rotation zero and
/// use the offset to shift the whole ring.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPath {
    points: Vec<(i32, i32)>,
    offset: Point,
    rotation: f64,
}

impl HandPath {
    pub fn new(points: &[(i32, i32)]) -> Self {
        Self {
            points: points.to_vec(),
            offset: Point { x: 0, y: 0 },
            rotation: 0.0,
        }
    }

    pub fn move_to(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn rotate_to(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    /// Transformed outline: each point rotated about the pivot, then
    /// translated by the offset.
    pub fn outline(&self) -> Vec<(f32, f32)> {
        let (sin, cos) = self.rotation.sin_cos();
        let (ox, oy) = (f64::from(self.offset.x), f64::from(self.offset.y));
        self.points
            .iter()
            .map(|&(px, py)| {
                let (px, py) = (f64::from(px), f64::from(py));
                (
                    (px * cos - py * sin + ox) as f32,
                    (px * sin + py * cos + oy) as f32,
                )
            })
            .collect()
    }
}

/// Minute hand: a narrow arrow reaching 80 px from the pivot.
pub const MINUTE_HAND_POINTS: [(i32, i32); 3] = [(-8, 20), (8, 20), (0, -80)];

/// Hour hand: shorter and slightly wider.
pub const HOUR_HAND_POINTS: [(i32, i32); 3] = [(-6, 20), (6, 20), (0, -60)];

/// Build the fixed tick marks: radial trapezoids at each hour position,
/// skipping 6 o'clock. Points are in the design frame; the round offset is
/// baked into each path.
pub fn tick_marks(shape: DisplayShape) -> Vec<HandPath> {
    let (fw, fh) = TICK_FRAME;
    let (cx, cy) = (f64::from(fw) / 2.0, f64::from(fh) / 2.0);
    let ring_offset = match shape {
        DisplayShape::Round => TICK_RING_OFFSET_ROUND,
        DisplayShape::Rectangular => Point { x: 0, y: 0 },
    };

    let outer = f64::from(fw) / 2.0 - 2.0;
    let inner = outer - 12.0;

    (0..12)
        .filter(|&i| i != 6)
        .map(|i| {
            let a = TAU * f64::from(i) / 12.0;
            let (sin, cos) = a.sin_cos();
            // Radial direction is (sin, -cos); (cos, sin) is perpendicular.
            let at = |r: f64, w: f64| {
                (
                    (cx + r * sin + w * cos).round() as i32,
                    (cy - r * cos + w * sin).round() as i32,
                )
            };
            let points = [
                at(outer, -3.0),
                at(outer, 3.0),
                at(inner, 2.0),
                at(inner, -2.0),
            ];
            let mut path = HandPath::new(&points);
            path.move_to(ring_offset);
            path
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn second_angle_endpoints() {
        assert!(approx(second_hand_angle(0), 0.0));
        assert!(approx(second_hand_angle(30), TAU / 2.0));
        assert!(approx(second_hand_angle(60), 0.0));
    }

    #[test]
    fn second_tip_cardinal_points() {
        let center = Point { x: 90, y: 90 };
        assert_eq!(second_hand_tip(center, 71, 0), Point { x: 90, y: 19 });
        assert_eq!(second_hand_tip(center, 71, 15), Point { x: 161, y: 90 });
        assert_eq!(second_hand_tip(center, 71, 30), Point { x: 90, y: 161 });
        assert_eq!(second_hand_tip(center, 71, 45), Point { x: 19, y: 90 });
    }

    #[test]
    fn minute_angle_is_continuous() {
        assert!(approx(minute_hand_angle(15), TAU / 4.0));
        assert!(approx(minute_hand_angle(45), 3.0 * TAU / 4.0));
    }

    #[test]
    fn hour_angle_quarter_turn_at_three() {
        assert!(approx(hour_hand_angle(3, 0), TAU / 4.0));
        assert!(approx(hour_hand_angle(15, 0), TAU / 4.0));
    }

    #[test]
    fn hour_angle_steps_every_ten_minutes() {
        let base = hour_hand_angle(3, 0);
        for minute in 0..10 {
            assert!(approx(hour_hand_angle(3, minute), base));
        }
        assert!(!approx(hour_hand_angle(3, 10), base));
        assert!(approx(hour_hand_angle(3, 10), TAU * 19.0 / 72.0));
    }

    #[test]
    fn second_hand_length_per_shape() {
        let round = Rect::from_size(180, 180);
        let rect = Rect::from_size(144, 168);
        assert_eq!(second_hand_length(DisplayShape::Round, round), 71);
        assert_eq!(second_hand_length(DisplayShape::Rectangular, rect), 72);
    }

    #[test]
    fn hand_path_rotation_about_pivot() {
        let mut hand = HandPath::new(&MINUTE_HAND_POINTS);
        hand.move_to(Point { x: 72, y: 84 });
        hand.rotate_to(TAU / 4.0);
        let tip = hand.outline()[2];
        assert!((tip.0 - 152.0).abs() < 1e-3);
        assert!((tip.1 - 84.0).abs() < 1e-3);
    }

    #[test]
    fn geometry_is_idempotent_for_equal_times() {
        let mut a = HandPath::new(&HOUR_HAND_POINTS);
        let mut b = HandPath::new(&HOUR_HAND_POINTS);
        for hand in [&mut a, &mut b] {
            hand.move_to(Point { x: 90, y: 90 });
            hand.rotate_to(hour_hand_angle(10, 42));
        }
        assert_eq!(a.outline(), b.outline());
        assert_eq!(
            second_hand_tip(Point { x: 90, y: 90 }, 71, 42),
            second_hand_tip(Point { x: 90, y: 90 }, 71, 42),
        );
    }

    #[test]
    fn eleven_ticks_with_round_ring_shifted() {
        let rect = tick_marks(DisplayShape::Rectangular);
        let round = tick_marks(DisplayShape::Round);
        assert_eq!(rect.len(), NUM_TICKS);
        assert_eq!(round.len(), NUM_TICKS);
        for (r, d) in rect.iter().zip(round.iter()) {
            for (p, q) in r.outline().iter().zip(d.outline().iter()) {
                assert_eq!(p.0 + 18.0, q.0);
                assert_eq!(p.1 + 6.0, q.1);
            }
        }
    }
}
