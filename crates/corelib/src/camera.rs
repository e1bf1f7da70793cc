use crate::{Mat4, Vec3};

/// Perspective camera aimed at a point.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    pub const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;

    /// 45 degree vertical field of view, depth range 0.1..100.
    pub fn looking_at(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y_rad: Self::DEFAULT_FOV_Y,
            z_near: 0.1,
            z_far: 100.0,
            aspect,
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Right-handed perspective with depth in [0, 1].
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.proj() * self.view()
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}

/// Camera position circling a target at fixed radius and height.
#[derive(Clone, Copy, Debug)]
pub struct Orbit {
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    pub speed: f32,
    pub angle: f32,
}

impl Orbit {
    pub fn new(target: Vec3, radius: f32, height: f32, speed: f32) -> Self {
        Self {
            target,
            radius,
            height,
            speed,
            angle: 0.0,
        }
    }

    /// Advance the orbit angle by `speed * dt`, wrapped to one turn.
    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + self.speed * dt).rem_euclid(std::f32::consts::TAU);
    }

    #[inline]
    pub fn eye(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.radius * self.angle.sin(),
                self.height,
                self.radius * self.angle.cos(),
            )
    }

    /// Point `camera` at the target from the current orbit position.
    pub fn apply(&self, camera: &mut Camera) {
        camera.eye = self.eye();
        camera.target = self.target;
    }
}
