//! Backend-neutral glyph outlines in integral font units.

/// A single point in a glyph outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutlinePoint {
    pub x: i32,
    pub y: i32,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn on(x: i32, y: i32) -> Self {
        Self { x, y, on_curve: true }
    }
}

/// A closed contour (sequence of points, implicitly closed).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Contour {
    pub points: Vec<OutlinePoint>,
}

impl Contour {
    /// Closed polygon through on-curve points.
    pub fn polygon(points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        Self {
            points: points.into_iter().map(|(x, y)| OutlinePoint::on(x, y)).collect(),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.points.iter())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

impl Outline {
    pub fn new(contours: Vec<Contour>) -> Self {
        Self { contours }
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|contour| contour.points.len()).sum()
    }

    /// Control-box of every point; `None` for an empty outline.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.contours.iter().flat_map(|contour| contour.points.iter()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    fn of_points<'a>(points: impl Iterator<Item = &'a OutlinePoint>) -> Option<Self> {
        points.fold(None, |acc, point| {
            Some(match acc {
                None => BoundingBox {
                    x_min: point.x,
                    y_min: point.y,
                    x_max: point.x,
                    y_max: point.y,
                },
                Some(bbox) => BoundingBox {
                    x_min: bbox.x_min.min(point.x),
                    y_min: bbox.y_min.min(point.y),
                    x_max: bbox.x_max.max(point.x),
                    y_max: bbox.y_max.max(point.y),
                },
            })
        })
    }
}
