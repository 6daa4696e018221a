//! Corner watermark heuristic.
//!
//! Edges are found with Canny, thickened with two 5x5 dilations, and traced
//! into outer contours. A contour is a watermark candidate when its bounding
//! box is roughly square (`0.5 < w/h < 2`), the contour fills more than the
//! configured share of that box, and the whole box sits inside one of the four
//! corner regions (the outer 20% of width and height at each corner).
//!
//! The geometry ([`CornerRegions`], [`BoundingBox`]) is independent of the
//! edge backend so it can be tested on plain rectangles.

use super::to_luma;
use image::{GrayImage, RgbImage};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;
use imageproc::point::Point;

const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;
/// Chebyshev radius 2 is a 5x5 square structuring element.
const DILATE_RADIUS: u8 = 2;
const DILATE_ITERATIONS: usize = 2;

/// Share of width/height that makes up a corner region.
pub const CORNER_MARGIN: f64 = 0.2;
const MIN_ASPECT: f64 = 0.5;
const MAX_ASPECT: f64 = 2.0;

/// Axis-aligned rectangle in pixel coordinates, `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// True when `bbox` lies entirely inside this rectangle.
    pub fn contains(&self, bbox: &BoundingBox) -> bool {
        let (x, y) = (bbox.x as f64, bbox.y as f64);
        x >= self.x0
            && y >= self.y0
            && x + bbox.width as f64 <= self.x1
            && y + bbox.height as f64 <= self.y1
    }
}

/// The four corner regions of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerRegions {
    pub top_left: Rect,
    pub top_right: Rect,
    pub bottom_left: Rect,
    pub bottom_right: Rect,
}

impl CornerRegions {
    /// Corner rectangles for a `width` x `height` frame with a 20% margin.
    pub fn for_frame(width: u32, height: u32) -> Self {
        let w = width as f64;
        let h = height as f64;
        let mw = w * CORNER_MARGIN;
        let mh = h * CORNER_MARGIN;

        Self {
            top_left: Rect { x0: 0.0, y0: 0.0, x1: mw, y1: mh },
            top_right: Rect { x0: w - mw, y0: 0.0, x1: w, y1: mh },
            bottom_left: Rect { x0: 0.0, y0: h - mh, x1: mw, y1: h },
            bottom_right: Rect { x0: w - mw, y0: h - mh, x1: w, y1: h },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rect> {
        [&self.top_left, &self.top_right, &self.bottom_left, &self.bottom_right].into_iter()
    }

    /// True when `bbox` fits entirely within any corner.
    pub fn contains(&self, bbox: &BoundingBox) -> bool {
        self.iter().any(|region| region.contains(bbox))
    }
}

/// Inclusive pixel bounding box of a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box containing every point; `None` for an empty contour.
    pub fn of_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// Polygon area enclosed by contour points (shoelace formula).
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Decides whether one contour's shape and position look like a watermark.
pub fn is_watermark_candidate(
    bbox: &BoundingBox,
    contour_area: f64,
    corners: &CornerRegions,
    threshold: f64,
) -> bool {
    if bbox.width == 0 || bbox.height == 0 {
        return false;
    }
    let aspect = bbox.aspect_ratio();
    let fill_ratio = contour_area / bbox.area();

    aspect > MIN_ASPECT && aspect < MAX_ASPECT && fill_ratio > threshold && corners.contains(bbox)
}

/// Flags a frame that likely carries a corner watermark.
///
/// Stops at the first qualifying contour.
pub fn detect_watermark(frame: &RgbImage, threshold: f64) -> bool {
    let (width, height) = frame.dimensions();
    if width < 3 || height < 3 {
        return false;
    }

    let luma = to_luma(frame);
    let edges = canny(&luma, CANNY_LOW, CANNY_HIGH);
    let mut dilated: GrayImage = edges;
    for _ in 0..DILATE_ITERATIONS {
        dilated = dilate(&dilated, Norm::LInf, DILATE_RADIUS);
    }

    let contours: Vec<Contour<i32>> = find_contours(&dilated);
    let corners = CornerRegions::for_frame(width, height);

    for (index, contour) in contours.iter().enumerate() {
        if !is_external(&contours, index) {
            continue;
        }
        let Some(bbox) = BoundingBox::of_points(&contour.points) else {
            continue;
        };
        let area = polygon_area(&contour.points);
        if is_watermark_candidate(&bbox, area, &corners, threshold) {
            log::debug!(
                "Watermark candidate at ({}, {}) {}x{}, fill {:.2}",
                bbox.x,
                bbox.y,
                bbox.width,
                bbox.height,
                area / bbox.area()
            );
            return true;
        }
    }
    false
}

/// Outer borders not nested inside another outer border.
fn is_external(contours: &[Contour<i32>], index: usize) -> bool {
    if contours[index].border_type != BorderType::Outer {
        return false;
    }
    let mut parent = contours[index].parent;
    while let Some(p) = parent {
        if contours[p].border_type == BorderType::Outer {
            return false;
        }
        parent = contours[p].parent;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bbox(x: u32, y: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox { x, y, width, height }
    }

    #[test]
    fn test_corner_regions_geometry() {
        let corners = CornerRegions::for_frame(100, 50);
        assert_eq!(corners.top_left, Rect { x0: 0.0, y0: 0.0, x1: 20.0, y1: 10.0 });
        assert_eq!(corners.bottom_right, Rect { x0: 80.0, y0: 40.0, x1: 100.0, y1: 50.0 });
        assert_eq!(corners.iter().count(), 4);
    }

    #[test]
    fn test_box_must_lie_entirely_in_a_corner() {
        let corners = CornerRegions::for_frame(100, 100);
        assert!(corners.contains(&bbox(2, 2, 10, 10)));
        assert!(corners.contains(&bbox(85, 85, 15, 15)));
        assert!(corners.contains(&bbox(85, 3, 10, 10)));
        assert!(corners.contains(&bbox(3, 85, 10, 10)));
        // Starts in the corner but spills out of it
        assert!(!corners.contains(&bbox(15, 15, 10, 10)));
        // Centre of the frame
        assert!(!corners.contains(&bbox(45, 45, 10, 10)));
    }

    #[test]
    fn test_candidate_shape_rules() {
        let corners = CornerRegions::for_frame(200, 200);
        let square = bbox(5, 5, 20, 20);
        assert!(is_watermark_candidate(&square, 380.0, &corners, 0.8));
        // Too sparse
        assert!(!is_watermark_candidate(&square, 100.0, &corners, 0.8));
        // Too wide
        let strip = bbox(5, 5, 30, 10);
        assert!(!is_watermark_candidate(&strip, 300.0, &corners, 0.5));
        // Aspect bounds are exclusive
        let two_to_one = bbox(5, 5, 20, 10);
        assert!(!is_watermark_candidate(&two_to_one, 200.0, &corners, 0.5));
    }

    #[test]
    fn test_polygon_area_and_bounds() {
        let square = [
            Point::new(0, 0),
            Point::new(9, 0),
            Point::new(9, 9),
            Point::new(0, 9),
        ];
        assert_eq!(polygon_area(&square), 81.0);
        assert_eq!(BoundingBox::of_points(&square), Some(bbox(0, 0, 10, 10)));
        assert_eq!(BoundingBox::of_points(&[]), None);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_solid_corner_block_is_detected() {
        let frame = RgbImage::from_fn(200, 200, |x, y| {
            if (8..28).contains(&x) && (8..28).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        assert!(detect_watermark(&frame, 0.5));
    }

    #[test]
    fn test_centered_block_is_not_detected() {
        let frame = RgbImage::from_fn(200, 200, |x, y| {
            if (90..110).contains(&x) && (90..110).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        assert!(!detect_watermark(&frame, 0.5));
    }

    #[test]
    fn test_flat_frame_has_no_watermark() {
        let frame = RgbImage::from_pixel(120, 80, Rgb([90, 90, 90]));
        assert!(!detect_watermark(&frame, 0.1));
    }
}
