use crate::core::Camera;
use glam::{Vec2, Vec3, Vec3Swizzles};

/// Which side of a label touches its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    Center,
    /// The label hangs below the anchor
    Top,
    /// The label sits above the anchor
    Bottom,
    /// The label extends to the right of the anchor
    Left,
    /// The label extends to the left of the anchor
    Right,
}

/// Places a label in world and screen space
pub trait TextAnchor {
    /// World position used for visibility and distance checks
    fn position(&self, camera: &Camera) -> Vec3;

    /// Bottom left corner of a label of `size`, in window pixels
    fn offset(&self, camera: &Camera, size: Vec2) -> Vec2;
}

/// Anchors a label to a fixed world point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointTextAnchor {
    position: Vec3,
    alignment: TextAlignment,
    extra_offset: Vec2,
}

impl PointTextAnchor {
    pub fn new(position: Vec3) -> Self {
        Self::with_alignment(position, TextAlignment::Center, Vec2::ZERO)
    }

    pub fn with_alignment(position: Vec3, alignment: TextAlignment, extra_offset: Vec2) -> Self {
        Self {
            position,
            alignment,
            extra_offset,
        }
    }
}

impl TextAnchor for PointTextAnchor {
    fn position(&self, _camera: &Camera) -> Vec3 {
        self.position
    }

    fn offset(&self, camera: &Camera, size: Vec2) -> Vec2 {
        let anchor = camera.project(self.position).xy() + self.extra_offset;
        let half = size / 2.0;
        let center = match self.alignment {
            TextAlignment::Center => anchor,
            TextAlignment::Top => anchor - Vec2::new(0.0, half.y),
            TextAlignment::Bottom => anchor + Vec2::new(0.0, half.y),
            TextAlignment::Left => anchor + Vec2::new(half.x, 0.0),
            TextAlignment::Right => anchor - Vec2::new(half.x, 0.0),
        };
        (center - half).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Viewport;

    fn camera() -> Camera {
        let mut camera = Camera::orthographic(-1000.0, 1000.0, Viewport::new(0, 0, 200, 100));
        camera.move_to(Vec3::new(0.0, -500.0, 0.0));
        camera
    }

    #[test]
    fn test_centered_label() {
        let anchor = PointTextAnchor::new(Vec3::ZERO);
        assert_eq!(anchor.offset(&camera(), Vec2::new(20.0, 10.0)), Vec2::new(90.0, 45.0));
    }

    #[test]
    fn test_alignment() {
        let size = Vec2::new(20.0, 10.0);
        let above = PointTextAnchor::with_alignment(Vec3::ZERO, TextAlignment::Bottom, Vec2::ZERO);
        assert_eq!(above.offset(&camera(), size), Vec2::new(90.0, 50.0));
        let right = PointTextAnchor::with_alignment(Vec3::ZERO, TextAlignment::Left, Vec2::new(0.0, 2.0));
        assert_eq!(right.offset(&camera(), size), Vec2::new(100.0, 47.0));
    }
}
