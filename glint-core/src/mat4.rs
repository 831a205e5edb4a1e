use std::ops::{Mul, Sub};

/// Three-component vector, only as much as the camera math needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Returns the unit vector; the zero vector is returned unchanged.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len == 0.0 { self } else { Vec3::new(self.x / len, self.y / len, self.z / len) }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Column-major 4x4 matrix, laid out the way GL expects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub data: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    #[rustfmt::skip]
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Element at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[col * 4 + row]
    }

    fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[col * 4 + row] = value;
    }

    /// Orthographic projection for the given clip volume.
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut m = Self::identity();
        m.set(0, 0, 2.0 / (right - left));
        m.set(1, 1, 2.0 / (top - bottom));
        m.set(2, 2, -2.0 / (far - near));
        m.set(0, 3, -(right + left) / (right - left));
        m.set(1, 3, -(top + bottom) / (top - bottom));
        m.set(2, 3, -(far + near) / (far - near));
        m
    }

    /// Pixel-space projection with the origin in the top-left corner and y
    /// growing downwards.
    pub fn orthographic_from_size(width: f32, height: f32) -> Self {
        Self::orthographic(0.0, width, height, 0.0, -1.0, 1.0)
    }

    /// Right-handed perspective projection; `fov_y` is in radians.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();

        let mut m = Self { data: [0.0; 16] };
        m.set(0, 0, f / aspect);
        m.set(1, 1, f);
        m.set(2, 2, (far + near) / (near - far));
        m.set(2, 3, (2.0 * far * near) / (near - far));
        m.set(3, 2, -1.0);
        m
    }

    /// View matrix looking from `eye` towards `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = (target - eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);

        let mut m = Self::identity();
        m.set(0, 0, s.x);
        m.set(0, 1, s.y);
        m.set(0, 2, s.z);
        m.set(1, 0, u.x);
        m.set(1, 1, u.y);
        m.set(1, 2, u.z);
        m.set(2, 0, -f.x);
        m.set(2, 1, -f.y);
        m.set(2, 2, -f.z);
        m.set(0, 3, -s.dot(eye));
        m.set(1, 3, -u.dot(eye));
        m.set(2, 3, f.dot(eye));
        m
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.set(0, 3, x);
        m.set(1, 3, y);
        m.set(2, 3, z);
        m
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.set(0, 0, x);
        m.set(1, 1, y);
        m.set(2, 2, z);
        m
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::identity();
        m.set(1, 1, c);
        m.set(1, 2, -s);
        m.set(2, 1, s);
        m.set(2, 2, c);
        m
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::identity();
        m.set(0, 0, c);
        m.set(0, 2, s);
        m.set(2, 0, -s);
        m.set(2, 2, c);
        m
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::identity();
        m.set(0, 0, c);
        m.set(0, 1, -s);
        m.set(1, 0, s);
        m.set(1, 1, c);
        m
    }

    /// Transforms a point (w = 1) and performs the perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|col| self.get(row, col) * v[col]).sum();
        }

        let w = if out[3] == 0.0 { 1.0 } else { out[3] };
        Vec3::new(out[0] / w, out[1] / w, out[2] / w)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut m = Mat4 { data: [0.0; 16] };
        for row in 0..4 {
            for col in 0..4 {
                let value = (0..4).map(|k| self.get(row, k) * rhs.get(k, col)).sum();
                m.set(row, col, value);
            }
        }
        m
    }
}
