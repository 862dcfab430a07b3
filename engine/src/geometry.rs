//! Needle silhouette, corner anchors and the small amount of plane geometry
//! the trails need.
//!
//! Coordinates are font units in a square dial box `0..dial_size` with y up.
//! Clock angles run clockwise from 12 o'clock; mathematical angles run
//! counter-clockwise from 3 o'clock.

use font_document::{Contour, Outline};
use shared::NeedleSection;

/// Contours whose bounds stay this close to a dial corner are anchors.
pub const KEEPER_MARGIN: i32 = 40;

pub type Point = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedleProfile {
    pub dial_size: f64,
    pub width: f64,
    pub length: f64,
}

impl Default for NeedleProfile {
    fn default() -> Self {
        Self {
            dial_size: 1000.0,
            width: 18.0,
            length: 420.0,
        }
    }
}

impl NeedleProfile {
    pub fn from_config(needle: &NeedleSection) -> Self {
        Self {
            dial_size: f64::from(needle.dial_size),
            width: needle.width,
            length: needle.length,
        }
    }

    pub fn center(&self) -> Point {
        (self.dial_size / 2.0, self.dial_size / 2.0)
    }

    /// Five-point outline pointing at 12 o'clock, drawn clockwise:
    /// up the left side of the shaft, over the apex, down the right side.
    pub fn silhouette(&self) -> [Point; 5] {
        let (cx, cy) = self.center();
        let x0 = cx - self.width / 2.0;
        let shaft_inset = self.width * 0.10;
        let tip_height = (self.width * 0.95).max(1.0);
        let y_tip = cy + self.length;
        let shaft_top = y_tip - tip_height;

        [
            (x0 + shaft_inset, cy),
            (x0 + shaft_inset, shaft_top),
            (cx, y_tip),
            (x0 + self.width - shaft_inset, shaft_top),
            (x0 + self.width - shaft_inset, cy),
        ]
    }

    /// The silhouette turned clockwise by `clock_degrees` and snapped to
    /// the integer grid.
    pub fn needle(&self, clock_degrees: f64) -> Contour {
        let center = self.center();
        let theta = (-clock_degrees).to_radians();
        round_contour(
            self.silhouette()
                .iter()
                .map(|&point| rotate_about(point, center, theta)),
        )
    }
}

/// Rotates `point` counter-clockwise by `radians` about `center`.
pub fn rotate_about(point: Point, center: Point, radians: f64) -> Point {
    transform_about(point, center, radians, 1.0)
}

/// Scales `point` about `center`, then rotates it counter-clockwise.
pub fn transform_about(point: Point, center: Point, radians: f64, scale: f64) -> Point {
    let (sin, cos) = radians.sin_cos();
    let dx = (point.0 - center.0) * scale;
    let dy = (point.1 - center.1) * scale;
    (center.0 + dx * cos - dy * sin, center.1 + dx * sin + dy * cos)
}

/// Rounds half to even, matching how the shipped fonts were drawn.
pub fn round_contour(points: impl IntoIterator<Item = Point>) -> Contour {
    Contour::polygon(
        points
            .into_iter()
            .map(|(x, y)| (x.round_ties_even() as i32, y.round_ties_even() as i32)),
    )
}

pub fn contour_points(contour: &Contour) -> impl Iterator<Item = Point> + '_ {
    contour
        .points
        .iter()
        .map(|point| (f64::from(point.x), f64::from(point.y)))
}

/// Bottom-left and top-right marker squares that pin a glyph's bounds to
/// the whole dial box. The host masks them out.
pub fn anchor_contours(dial_size: i32, size: i32) -> [Contour; 2] {
    let square = |x: i32, y: i32| {
        Contour::polygon([(x, y), (x, y + size), (x + size, y + size), (x + size, y)])
    };
    [square(0, 0), square(dial_size - size, dial_size - size)]
}

/// Corner squares of the dial box where anchor contours live. The margin
/// grows with the configured anchor size but never drops below
/// [`KEEPER_MARGIN`], so template anchors drawn at the default size still
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeeperZone {
    dial_size: i32,
    margin: i32,
}

impl KeeperZone {
    pub fn new(dial_size: i32, anchor_size: i32) -> Self {
        Self {
            dial_size,
            margin: anchor_size.max(KEEPER_MARGIN),
        }
    }

    pub fn margin(&self) -> i32 {
        self.margin
    }

    pub fn contains(&self, contour: &Contour) -> bool {
        let Some(bounds) = contour.bounding_box() else {
            return false;
        };
        let far = self.dial_size - self.margin;
        (bounds.x_max <= self.margin && bounds.y_max <= self.margin)
            || (bounds.x_min >= far && bounds.y_min >= far)
    }

    /// Splits an outline into (anchor contours, hand contours), keeping order.
    pub fn split(&self, outline: &Outline) -> (Vec<Contour>, Vec<Contour>) {
        outline
            .contours
            .iter()
            .cloned()
            .partition(|contour| self.contains(contour))
    }
}

/// Where the hand points: mathematical angle and distance of its farthest
/// point from the centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tip {
    pub radians: f64,
    pub radius: f64,
}

pub fn tip_of(hand: &[Contour], center: Point) -> Option<Tip> {
    hand.iter()
        .flat_map(contour_points)
        .map(|(x, y)| {
            let (dx, dy) = (x - center.0, y - center.1);
            (dx * dx + dy * dy, dy.atan2(dx))
        })
        .fold(None, |best: Option<(f64, f64)>, candidate| match best {
            Some(best) if best.0 >= candidate.0 => Some(best),
            _ => Some(candidate),
        })
        .map(|(distance_sq, radians)| Tip {
            radians,
            radius: distance_sq.sqrt(),
        })
}

/// Wraps an angle difference into `[-pi, pi)`.
pub fn normalize_radians(radians: f64) -> f64 {
    use std::f64::consts::PI;
    (radians + PI).rem_euclid(2.0 * PI) - PI
}

pub fn outline_of(contours: impl IntoIterator<Item = Contour>) -> Outline {
    Outline::new(contours.into_iter().collect())
}
