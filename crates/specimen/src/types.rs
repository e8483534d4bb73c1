use geo_types::{Coord, LineString, Polygon};
use image::GrayImage;
use imageproc::point::Point;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed outer boundary of a connected foreground region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// Boundary pixels in tracing order
    pub points: Vec<Point<i32>>,
}

/// Axis-aligned bounding box in pixel units, inclusive of both edge pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect();

        Polygon::new(LineString::new(coords), vec![])
    }

    /// Area enclosed by the boundary polyline (shoelace over pixel centres)
    pub fn area(&self) -> f64 {
        use geo::Area;
        if self.points.len() < 3 {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Get the bounding box of the contour, `None` for an empty contour
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<imageproc::contours::Contour<i32>> for Contour {
    fn from(contour: imageproc::contours::Contour<i32>) -> Self {
        Self::new(contour.points)
    }
}

/// The selected region: its boundary, bounds and filled interior mask
#[derive(Debug, Clone)]
pub struct Region {
    pub contour: Contour,
    pub bounding_box: BoundingBox,
    /// Same dimensions as the mask the contour was extracted from
    pub mask: GrayImage,
}

/// Optional override for the stripe threshold level.
///
/// `Adaptive` derives the level from the enhanced ROI's intensity spread,
/// `Manual(level)` subtracts the given level from the brightest pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSpec {
    #[default]
    Adaptive,
    Manual(i32),
}

impl From<Option<i32>> for ThresholdSpec {
    fn from(level: Option<i32>) -> Self {
        match level {
            Some(level) => Self::Manual(level),
            None => Self::Adaptive,
        }
    }
}

impl ThresholdSpec {
    pub fn level(&self) -> Option<i32> {
        match self {
            Self::Adaptive => None,
            Self::Manual(level) => Some(*level),
        }
    }
}

/// How the binarization cut-off for the enhanced ROI was obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdDecision {
    /// Maximum intensity anywhere in the enhanced ROI
    pub brightest: u8,
    /// Mean intensity, only computed by the adaptive policy
    pub mean: Option<f64>,
    /// Population standard deviation, only computed by the adaptive policy
    pub std_dev: Option<f64>,
    pub threshold_level: i32,
    /// `brightest - threshold_level`, before clamping
    pub manual_threshold: i32,
}

impl ThresholdDecision {
    pub fn is_adaptive(&self) -> bool {
        self.std_dev.is_some()
    }
}

/// Stripe coverage of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StripeCoverage {
    pub white_pixel_count: u64,
    /// Full frame pixel count, not the ROI's
    pub total_pixel_count: u64,
}

impl StripeCoverage {
    pub fn ratio(&self) -> f64 {
        if self.total_pixel_count == 0 {
            return 0.0;
        }
        self.white_pixel_count as f64 / self.total_pixel_count as f64
    }
}

/// Silhouette area of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", content = "area", rename_all = "snake_case")]
pub enum SilhouetteMeasurement {
    Area(u64),
    NoRegionFound,
}

impl SilhouetteMeasurement {
    pub fn area(&self) -> Option<u64> {
        match self {
            Self::Area(area) => Some(*area),
            Self::NoRegionFound => None,
        }
    }

    pub fn is_region_found(&self) -> bool {
        matches!(self, Self::Area(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i32, y0: i32, side: i32) -> Contour {
        let mut points = Vec::new();
        for x in x0..x0 + side {
            points.push(Point::new(x, y0));
        }
        for y in y0 + 1..y0 + side {
            points.push(Point::new(x0 + side - 1, y));
        }
        for x in (x0..x0 + side - 1).rev() {
            points.push(Point::new(x, y0 + side - 1));
        }
        for y in (y0 + 1..y0 + side - 1).rev() {
            points.push(Point::new(x0, y));
        }
        Contour::new(points)
    }

    #[test]
    fn test_contour_area_and_bounds() {
        let contour = square(10, 20, 5);
        assert_eq!(contour.area(), 16.0);
        assert_eq!(
            contour.bounding_box(),
            Some(BoundingBox { x: 10, y: 20, width: 5, height: 5 })
        );
    }

    #[test]
    fn test_degenerate_contours() {
        let single = Contour::new(vec![Point::new(3, 4)]);
        assert_eq!(single.area(), 0.0);
        assert_eq!(
            single.bounding_box(),
            Some(BoundingBox { x: 3, y: 4, width: 1, height: 1 })
        );
        assert_eq!(Contour::new(vec![]).bounding_box(), None);
    }

    #[test]
    fn test_threshold_spec_from_option() {
        assert_eq!(ThresholdSpec::from(None), ThresholdSpec::Adaptive);
        assert_eq!(ThresholdSpec::from(Some(0)), ThresholdSpec::Manual(0));
        assert_eq!(ThresholdSpec::Manual(0).level(), Some(0));
    }

    #[test]
    fn test_silhouette_serialization() {
        let json = serde_json::to_string(&SilhouetteMeasurement::NoRegionFound).unwrap();
        assert_eq!(json, r#"{"outcome":"no_region_found"}"#);
        let area: SilhouetteMeasurement =
            serde_json::from_str(r#"{"outcome":"area","area":2500}"#).unwrap();
        assert_eq!(area.area(), Some(2500));
    }
}
