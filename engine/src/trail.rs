use font_document::{Contour, Outline};
use shared::{ArcTrail, EchoTrail, TrailSection, TrailStyle};

use crate::geometry::{
    KeeperZone, Point, contour_points, normalize_radians, round_contour, tip_of, transform_about,
};

/// Rotation sense of the hand as the bucket index advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    CounterClockwise,
    Clockwise,
}

impl Motion {
    /// Compares the tips of two consecutive positions. Falls back to
    /// clockwise, the way every clock hand turns, when either glyph has no
    /// hand or the tips coincide.
    pub fn detect(first_hand: &[Contour], second_hand: &[Contour], center: Point) -> Self {
        let (Some(a), Some(b)) = (tip_of(first_hand, center), tip_of(second_hand, center)) else {
            return Motion::Clockwise;
        };
        let delta = normalize_radians(b.radians - a.radians);
        if delta.abs() < 1e-6 || delta < 0.0 {
            Motion::Clockwise
        } else {
            Motion::CounterClockwise
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Motion::CounterClockwise => 1.0,
            Motion::Clockwise => -1.0,
        }
    }
}

/// Adds trail contours behind the hand of each glyph.
#[derive(Debug, Clone)]
pub struct TrailPainter {
    style: TrailStyle,
    echo: EchoTrail,
    arc: ArcTrail,
    /// +1 lays the trail counter-clockwise of the hand, -1 clockwise.
    direction: f64,
    center: Point,
    keepers: KeeperZone,
}

impl TrailPainter {
    pub fn new(section: &TrailSection, motion: Motion, center: Point, keepers: KeeperZone) -> Self {
        let mut direction = -motion.sign();
        if section.flip_direction {
            direction = -direction;
        }
        Self {
            style: section.style,
            echo: section.echo.clone(),
            arc: section.arc.clone(),
            direction,
            center,
            keepers,
        }
    }

    pub fn style(&self) -> TrailStyle {
        self.style
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn paint(&self, outline: &Outline) -> Outline {
        match self.style {
            TrailStyle::None => outline.clone(),
            TrailStyle::Echo => self.paint_echo(outline),
            TrailStyle::Arc => self.paint_arc(outline),
        }
    }

    /// Anchors first, then the copies from farthest to nearest, then the
    /// hand itself on top.
    fn paint_echo(&self, outline: &Outline) -> Outline {
        let (keepers, hand) = self.keepers.split(outline);
        let mut contours = keepers;

        for i in (1..=self.echo.count).rev() {
            let step = f64::from(i);
            let radians = (step * self.echo.step_deg * self.direction).to_radians();
            let scale = (1.0 - step * self.echo.scale_step).max(0.0);
            contours.extend(hand.iter().map(|contour| {
                round_contour(
                    contour_points(contour)
                        .map(|point| transform_about(point, self.center, radians, scale)),
                )
            }));
        }

        contours.extend(hand);
        Outline::new(contours)
    }

    /// Keeps every existing contour and appends tapered sectors that end
    /// just inside the tip.
    fn paint_arc(&self, outline: &Outline) -> Outline {
        let (_, hand) = self.keepers.split(outline);
        let Some(tip) = tip_of(&hand, self.center) else {
            log::debug!("No hand contour to trail; glyph left unchanged");
            return outline.clone();
        };

        let arc = &self.arc;
        let mut contours = outline.contours.clone();
        for layer in 0..arc.layers.max(1) {
            let k = f64::from(layer);
            let span = arc.span_deg * (1.0 - arc.span_decay * k).max(0.0);
            let thickness = arc.thickness * (1.0 - arc.thickness_decay * k).max(0.0);
            if span <= 0.1 || thickness <= 0.1 {
                continue;
            }
            let outer_radius = (tip.radius - (arc.radius_inset + arc.inset_step * k)).max(0.0);
            contours.push(self.sector(tip.radians, span, outer_radius, thickness));
        }
        Outline::new(contours)
    }

    fn sector(&self, tip: f64, span_deg: f64, outer_radius: f64, thickness: f64) -> Contour {
        let segments = self.arc.segments.max(1);
        let taper = self.arc.taper_min_frac;
        let tail = tip + span_deg.to_radians() * self.direction;
        let angle_at = |j: u32| {
            let u = f64::from(j) / f64::from(segments);
            (tail + (tip - tail) * u, u)
        };
        let polar = |radians: f64, radius: f64| {
            (
                self.center.0 + radius * radians.cos(),
                self.center.1 + radius * radians.sin(),
            )
        };

        let outer = (0..=segments).map(|j| {
            let (radians, _) = angle_at(j);
            polar(radians, outer_radius)
        });
        let inner = (0..=segments).rev().map(|j| {
            let (radians, u) = angle_at(j);
            let width = thickness * (taper + (1.0 - taper) * u);
            polar(radians, (outer_radius - width).max(0.0))
        });
        round_contour(outer.chain(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{NeedleProfile, anchor_contours, outline_of};

    fn zone() -> KeeperZone {
        KeeperZone::new(1000, 32)
    }

    fn glyph(profile: &NeedleProfile, degrees: f64) -> Outline {
        let [low, high] = anchor_contours(1000, 32);
        outline_of([low, high, profile.needle(degrees)])
    }

    fn painter(style: TrailStyle) -> TrailPainter {
        let section = TrailSection {
            style,
            ..TrailSection::default()
        };
        TrailPainter::new(&section, Motion::Clockwise, (500.0, 500.0), zone())
    }

    #[test]
    fn clockwise_hand_is_detected() {
        let profile = NeedleProfile::default();
        let motion = Motion::detect(
            &[profile.needle(0.0)],
            &[profile.needle(6.0)],
            profile.center(),
        );
        assert_eq!(motion, Motion::Clockwise);

        let reversed = Motion::detect(
            &[profile.needle(6.0)],
            &[profile.needle(0.0)],
            profile.center(),
        );
        assert_eq!(reversed, Motion::CounterClockwise);
    }

    #[test]
    fn undeterminable_motion_falls_back_to_clockwise() {
        let profile = NeedleProfile::default();
        assert_eq!(
            Motion::detect(&[], &[profile.needle(6.0)], profile.center()),
            Motion::Clockwise
        );
        assert_eq!(
            Motion::detect(&[profile.needle(6.0)], &[profile.needle(6.0)], profile.center()),
            Motion::Clockwise
        );
    }

    #[test]
    fn trail_trails_the_motion_unless_flipped() {
        assert_eq!(painter(TrailStyle::Echo).direction(), 1.0);
        let flipped = TrailSection {
            flip_direction: true,
            ..TrailSection::default()
        };
        let painter = TrailPainter::new(&flipped, Motion::Clockwise, (500.0, 500.0), zone());
        assert_eq!(painter.direction(), -1.0);
    }

    #[test]
    fn echo_orders_keepers_trail_then_hand() {
        let profile = NeedleProfile::default();
        let source = glyph(&profile, 30.0);
        let painted = painter(TrailStyle::Echo).paint(&source);

        // 2 keepers + 5 copies + the hand
        assert_eq!(painted.contours.len(), 8);
        assert!(zone().contains(&painted.contours[0]));
        assert!(zone().contains(&painted.contours[1]));
        assert_eq!(painted.contours.last(), Some(&profile.needle(30.0)));
        assert_eq!(painted.bounding_box(), source.bounding_box());
    }

    #[test]
    fn echo_copies_shrink_and_fall_behind() {
        let profile = NeedleProfile::default();
        let painted = painter(TrailStyle::Echo).paint(&glyph(&profile, 0.0));
        let center = profile.center();

        let farthest = tip_of(&painted.contours[2..3], center).unwrap();
        let nearest = tip_of(&painted.contours[6..7], center).unwrap();
        let hand = tip_of(&painted.contours[7..8], center).unwrap();
        assert!(farthest.radius < nearest.radius && nearest.radius < hand.radius);
        // Counter-clockwise of 12 o'clock means a larger mathematical angle.
        assert!(farthest.radians > nearest.radians && nearest.radians > hand.radians);
    }

    #[test]
    fn arc_appends_layers_after_existing_contours() {
        let profile = NeedleProfile::default();
        let source = glyph(&profile, 90.0);
        let painted = painter(TrailStyle::Arc).paint(&source);

        assert_eq!(&painted.contours[..3], &source.contours[..]);
        assert_eq!(painted.contours.len(), 6);
        for sector in &painted.contours[3..] {
            assert_eq!(sector.points.len(), 42);
        }
        assert_eq!(painted.bounding_box(), source.bounding_box());
    }

    #[test]
    fn arc_sector_ends_inside_the_tip() {
        let profile = NeedleProfile::default();
        let painted = painter(TrailStyle::Arc).paint(&glyph(&profile, 90.0));
        let first_layer = &painted.contours[3];

        // Outer edge finishes at the tip angle, 10 units in from the tip.
        let end = first_layer.points[20];
        assert_eq!((end.x, end.y), (910, 500));
        // The tail sits counter-clockwise of a clockwise hand.
        assert!(first_layer.points[0].y > 500);
    }

    #[test]
    fn decayed_layers_are_skipped() {
        let section = TrailSection {
            style: TrailStyle::Arc,
            arc: ArcTrail {
                layers: 6,
                ..ArcTrail::default()
            },
            ..TrailSection::default()
        };
        let painter = TrailPainter::new(&section, Motion::Clockwise, (500.0, 500.0), zone());
        let profile = NeedleProfile::default();
        let painted = painter.paint(&glyph(&profile, 0.0));
        // Layer 4 and 5 decay to zero span.
        assert_eq!(painted.contours.len(), 3 + 4);
    }

    #[test]
    fn large_anchors_stay_out_of_the_trail() {
        let profile = NeedleProfile::default();
        let [low, high] = anchor_contours(1000, 64);
        let source = outline_of([low.clone(), high.clone(), profile.needle(90.0)]);
        let zone = KeeperZone::new(1000, 64);
        assert_eq!(zone.split(&source).0.len(), 2);

        let section = TrailSection {
            style: TrailStyle::Arc,
            ..TrailSection::default()
        };
        let arc = TrailPainter::new(&section, Motion::Clockwise, profile.center(), zone);
        let painted = arc.paint(&source);
        assert_eq!(painted.contours.len(), 6);
        // Sectors follow the hand at 3 o'clock, not the bottom-left anchor.
        assert_eq!((painted.contours[3].points[20].x, painted.contours[3].points[20].y), (910, 500));

        let section = TrailSection {
            style: TrailStyle::Echo,
            ..TrailSection::default()
        };
        let echo = TrailPainter::new(&section, Motion::Clockwise, profile.center(), zone);
        let painted = echo.paint(&source);
        assert_eq!(painted.contours.len(), 8);
        assert_eq!(&painted.contours[..2], &[low, high]);
    }

    #[test]
    fn glyph_without_hand_is_left_alone() {
        let [low, high] = anchor_contours(1000, 32);
        let keepers_only = outline_of([low, high]);
        assert_eq!(painter(TrailStyle::Arc).paint(&keepers_only), keepers_only);
        assert_eq!(painter(TrailStyle::Echo).paint(&keepers_only), keepers_only);
    }
}
