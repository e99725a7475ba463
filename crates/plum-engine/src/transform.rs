//! Placement parameters of a transform blit.

use crate::coords::{Affine, Point, Rect, Vec2};
use crate::error::RenderError;
use crate::paint::{BlendMode, Color};

/// How a transform blit places an image.
///
/// `position`, `pivot` and `scale` have no sensible default and must be set
/// before drawing; a missing one fails the blit with
/// [`RenderError::MissingTransformField`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    /// Flip horizontally about the pivot.
    pub mirror: bool,
    /// Clockwise rotation about the pivot, in degrees.
    pub angle: f64,
    pub mode: BlendMode,
    pub tint: Color,
    pub position: Option<Point>,
    pub pivot: Option<Point>,
    pub scale: Option<Vec2>,
    /// Source sub-rectangle; `None` draws the whole image.
    pub clip: Option<Rect>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            mirror: false,
            angle: 0.0,
            mode: BlendMode::Preserve,
            tint: Color::white(),
            position: None,
            pivot: None,
            scale: None,
            clip: None,
        }
    }
}

impl Transform {
    /// Transform at `position` with unit scale and the pivot at the origin.
    pub fn at(position: Point) -> Self {
        Self {
            position: Some(position),
            pivot: Some(Point::ZERO),
            scale: Some(Vec2::new(1.0, 1.0)),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_pivot(mut self, pivot: Point) -> Self {
        self.pivot = Some(pivot);
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = degrees;
        self
    }

    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Local-to-target matrix: `T(position + pivot) · S(±scale) · R(angle) · T(-pivot)`.
    pub fn placement(&self) -> Result<Affine, RenderError> {
        let position = self
            .position
            .ok_or(RenderError::MissingTransformField("position"))?;
        let pivot = self
            .pivot
            .ok_or(RenderError::MissingTransformField("pivot"))?;
        let scale = self
            .scale
            .ok_or(RenderError::MissingTransformField("scale"))?;

        let sx = if self.mirror { -scale.x } else { scale.x };
        Ok(Affine::translate(position.to_vec2() + pivot.to_vec2())
            * Affine::scale_non_uniform(sx, scale.y)
            * Affine::rotate(self.angle.to_radians())
            * Affine::translate(-pivot.to_vec2()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn defaults() {
        let t = Transform::default();
        assert!(!t.mirror);
        assert_eq!(t.angle, 0.0);
        assert_eq!(t.mode, BlendMode::Preserve);
        assert_eq!(t.tint, Color::white());
        assert!(t.clip.is_none());
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let t = Transform::default();
        assert!(matches!(
            t.placement(),
            Err(RenderError::MissingTransformField("position"))
        ));

        let t = Transform::default().with_position(Point::ZERO).with_pivot(Point::ZERO);
        assert!(matches!(
            t.placement(),
            Err(RenderError::MissingTransformField("scale"))
        ));
    }

    #[test]
    fn identity_placement_translates() {
        let m = Transform::at(Point::new(3.0, 4.0)).placement().unwrap();
        assert!(close(m * Point::new(1.0, 1.0), Point::new(4.0, 5.0)));
    }

    #[test]
    fn mirror_flips_about_pivot() {
        let m = Transform::at(Point::ZERO)
            .with_pivot(Point::new(2.0, 1.0))
            .mirrored(true)
            .placement()
            .unwrap();
        assert!(close(m * Point::new(0.0, 0.0), Point::new(4.0, 0.0)));
        assert!(close(m * Point::new(4.0, 2.0), Point::new(0.0, 2.0)));
    }

    #[test]
    fn rotation_is_about_pivot() {
        let m = Transform::at(Point::ZERO)
            .with_pivot(Point::new(1.0, 1.0))
            .with_angle(90.0)
            .placement()
            .unwrap();
        assert!(close(m * Point::new(1.0, 1.0), Point::new(1.0, 1.0)));
        // +X maps to +Y (clockwise on a y-down screen).
        assert!(close(m * Point::new(2.0, 1.0), Point::new(1.0, 2.0)));
    }

    #[test]
    fn scale_applies_after_rotation() {
        let m = Transform::at(Point::new(10.0, 0.0))
            .with_scale(Vec2::new(2.0, 3.0))
            .with_angle(90.0)
            .placement()
            .unwrap();
        assert!(close(m * Point::new(1.0, 0.0), Point::new(10.0, 3.0)));
    }
}
