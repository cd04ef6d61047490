/// Axis-aligned boxes in screen pixels.
///
/// `y` grows downward. Edges follow the usual sprite convention:
/// `right = x + w`, `bottom = y + h`, and two boxes that only touch
/// along an edge do NOT intersect.

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Box of size `size` whose top-left corner is `pos`.
    pub fn from_top_left(pos: Vec2, size: Vec2) -> Self {
        Rect { x: pos.x, y: pos.y, w: size.x, h: size.y }
    }

    /// Box of size `size` centred on `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Rect {
            x: center.x - size.x / 2.0,
            y: center.y - size.y / 2.0,
            w: size.x,
            h: size.y,
        }
    }

    #[inline] pub fn left(&self) -> f32 { self.x }
    #[inline] pub fn right(&self) -> f32 { self.x + self.w }
    #[inline] pub fn top(&self) -> f32 { self.y }
    #[inline] pub fn bottom(&self) -> f32 { self.y + self.h }
    #[inline] pub fn center_x(&self) -> f32 { self.x + self.w / 2.0 }

    // Edge setters move the box, they never resize it.
    #[inline] pub fn set_left(&mut self, v: f32) { self.x = v; }
    #[inline] pub fn set_right(&mut self, v: f32) { self.x = v - self.w; }
    #[inline] pub fn set_top(&mut self, v: f32) { self.y = v; }
    #[inline] pub fn set_bottom(&mut self, v: f32) { self.y = v - self.h; }

    /// Strict overlap test: shared edges are not an intersection.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Copy translated horizontally by `dx`.
    #[inline]
    pub fn shifted_x(&self, dx: f32) -> Rect {
        Rect { x: self.x + dx, ..*self }
    }
}
