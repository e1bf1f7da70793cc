use crate::{Mat4, Quat, Vec3};

/// Axis-aligned bounds accumulated from vertex positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.include(p);
            b
        })
    }

    #[inline]
    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite())
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Longest side.
    #[inline]
    pub fn extent(&self) -> f32 {
        (self.max - self.min).max_element()
    }
}

/// Model placement: uniform scale, then rotation, then translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    /// Center `bounds` on the origin with its longest side scaled to `size`.
    /// Empty bounds give the identity; degenerate ones are only centered.
    pub fn fit(bounds: &Bounds, size: f32) -> Self {
        if bounds.is_empty() {
            return Self::IDENTITY;
        }
        let extent = bounds.extent();
        let scale = if extent > f32::EPSILON { size / extent } else { 1.0 };
        Self {
            translation: -bounds.center() * scale,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
