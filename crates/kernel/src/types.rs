/// Core types for the Circuit Farm kernel
///
/// Geometry shared by level files, the zone manager and the display layer,
/// plus the signal alias used for every circuit value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A circuit signal. Valid signals are exactly 0 or 1; anything else is
/// carried through so gates can reject it.
pub type Signal = i32;

/// Zone name -> computed value. `None` means the zone was visited but could
/// not be computed; a missing key means the zone was never visited.
pub type ZoneValues = HashMap<String, Option<Signal>>;

/// Zone name -> physical label currently placed there (if any).
pub type ZoneObjects = HashMap<String, Option<String>>;

/// Physical label -> game element name ("orange" -> "and_gate").
pub type ObjectMapping = HashMap<String, String>;

/// Returns true if `value` is a valid signal (0 or 1).
pub fn is_signal(value: Signal) -> bool {
    value == 0 || value == 1
}

/// Integer point in screen/camera coordinates, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned rectangle given by two corners, bounds inclusive.
///
/// Serialized as `[x1, y1, x2, y2]` so level files stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        self.x1 <= p.x && p.x <= self.x2 && self.y1 <= p.y && p.y <= self.y2
    }

    /// Corners are top-left then bottom-right.
    pub fn is_ordered(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    pub fn center(&self) -> Point {
        let mid = |a: i32, b: i32| (i64::from(a) + i64::from(b)).div_euclid(2) as i32;
        Point::new(mid(self.x1, self.x2), mid(self.y1, self.y2))
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }
}

impl From<[i32; 4]> for Rect {
    fn from(r: [i32; 4]) -> Self {
        Self::new(r[0], r[1], r[2], r[3])
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_inclusive() {
        let r = Rect::new(450, 50, 750, 350);
        assert!(r.contains(Point::new(450, 50)));
        assert!(r.contains(Point::new(750, 350)));
        assert!(r.contains(Point::new(600, 200)));
        assert!(!r.contains(Point::new(449, 200)));
        assert!(!r.contains(Point::new(600, 351)));
    }

    #[test]
    fn rect_center() {
        assert_eq!(Rect::new(850, 350, 1150, 650).center(), Point::new(1000, 500));
        assert_eq!(Rect::new(-3, 0, 0, 1).center(), Point::new(-2, 0));

        let far = Rect::new(i32::MAX - 10, i32::MAX - 10, i32::MAX, i32::MAX);
        assert_eq!(far.center(), Point::new(i32::MAX - 5, i32::MAX - 5));
        assert_eq!(Rect::new(i32::MIN, 0, i32::MAX, 0).center(), Point::new(-1, 0));
    }

    #[test]
    fn rect_corner_order() {
        assert!(Rect::new(0, 0, 0, 0).is_ordered());
        assert!(Rect::new(450, 50, 750, 350).is_ordered());
        assert!(!Rect::new(750, 50, 450, 350).is_ordered());
        assert!(!Rect::new(450, 350, 750, 50).is_ordered());
    }

    #[test]
    fn rect_serializes_as_array() {
        let json = serde_json::to_string(&Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, "[1,2,3,4]");
        let back: Rect = serde_json::from_str("[5,6,7,8]").unwrap();
        assert_eq!(back, Rect::new(5, 6, 7, 8));
    }

    #[test]
    fn signals() {
        assert!(is_signal(0));
        assert!(is_signal(1));
        assert!(!is_signal(2));
        assert!(!is_signal(-1));
    }
}
