use std::ops::{Add, Sub};

use asylum_formats::RecordRect;
use serde::Serialize;

pub const SCREEN_WIDTH: i32 = 640;
pub const SCREEN_HEIGHT: i32 = 480;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Half-open rectangle: `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn screen() -> Self {
        Rect::new(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn set_width(&mut self, width: i32) {
        self.right = self.left + width;
    }

    pub fn set_height(&mut self, height: i32) {
        self.bottom = self.top + height;
    }

    /// Degenerate (zero-sized) rectangles are still valid.
    pub fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }
}

impl From<RecordRect> for Rect {
    fn from(rect: RecordRect) -> Self {
        Rect::new(rect.left, rect.top, rect.right, rect.bottom)
    }
}

/// CLUT8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Surface {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn screen() -> Self {
        Surface::new(SCREEN_WIDTH as usize, SCREEN_HEIGHT as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.width
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.pixels[y as usize * self.width + x as usize] = color;
    }

    pub fn fill(&mut self, color: u8) {
        self.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: u8) {
        let rect = rect.intersection(&self.bounds());
        if rect.is_empty() {
            return;
        }
        for y in rect.top..rect.bottom {
            let start = y as usize * self.width;
            self.pixels[start + rect.left as usize..start + rect.right as usize].fill(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersection_and_validity() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 20, 20);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Rect::new(5, 5, 10, 10));

        let touching = Rect::new(10, 0, 12, 10);
        assert!(!a.intersects(&touching));
        assert!(Rect::new(3, 3, 3, 3).is_valid());
        assert!(!Rect::new(4, 0, 3, 1).is_valid());
    }

    #[test]
    fn fill_rect_is_clipped_to_surface() {
        let mut surface = Surface::new(4, 4);
        surface.fill_rect(Rect::new(-2, 2, 2, 10), 7);
        assert_eq!(surface.pixel(0, 2), Some(7));
        assert_eq!(surface.pixel(1, 3), Some(7));
        assert_eq!(surface.pixel(2, 2), Some(0));
        assert_eq!(surface.pixel(0, 1), Some(0));
    }
}
