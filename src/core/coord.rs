/// Orthonormal frame whose local `z` axis is a given world direction.
#[derive(Copy, Clone, Debug)]
pub struct Coordinate {
    local_to_world: glam::Mat3A,
    world_to_local: glam::Mat3A,
}

impl Coordinate {
    pub fn from_z(z_world: glam::Vec3A) -> Self {
        let sign = if z_world.z >= 0.0 { 1.0 } else { -1.0 };
        let a = -1.0 / (sign + z_world.z);
        let b = z_world.x * z_world.y * a;
        let x_world = glam::Vec3A::new(
            1.0 + sign * z_world.x * z_world.x * a,
            sign * b,
            -sign * z_world.x,
        );
        let y_world = glam::Vec3A::new(b, sign + z_world.y * z_world.y * a, -z_world.y);

        let local_to_world = glam::Mat3A::from_cols(x_world, y_world, z_world);
        let world_to_local = local_to_world.transpose();
        Self {
            local_to_world,
            world_to_local,
        }
    }

    /// Frame from three orthonormal axes. The axes may form a left-handed basis.
    pub fn from_axes(x_world: glam::Vec3A, y_world: glam::Vec3A, z_world: glam::Vec3A) -> Self {
        let local_to_world = glam::Mat3A::from_cols(x_world, y_world, z_world);
        let world_to_local = local_to_world.transpose();
        Self {
            local_to_world,
            world_to_local,
        }
    }

    pub fn to_local(&self, world: glam::Vec3A) -> glam::Vec3A {
        self.world_to_local * world
    }

    pub fn to_world(&self, local: glam::Vec3A) -> glam::Vec3A {
        self.local_to_world * local
    }

    pub fn x(&self) -> glam::Vec3A {
        self.local_to_world.x_axis
    }

    pub fn y(&self) -> glam::Vec3A {
        self.local_to_world.y_axis
    }

    pub fn z(&self) -> glam::Vec3A {
        self.local_to_world.z_axis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn frame_is_orthonormal() {
        for z in [
            glam::Vec3A::Z,
            -glam::Vec3A::Z,
            glam::Vec3A::new(0.3, -0.8, 0.2).normalize(),
            glam::Vec3A::new(-0.6, 0.1, -0.7).normalize(),
        ] {
            let coord = Coordinate::from_z(z);
            let x = coord.to_world(glam::Vec3A::X);
            let y = coord.to_world(glam::Vec3A::Y);
            assert_abs_diff_eq!(x.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(y.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(x.dot(y), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(x.cross(y).dot(z), 1.0, epsilon = 1e-5);

            let w = glam::Vec3A::new(0.2, 0.4, -0.9);
            let back = coord.to_world(coord.to_local(w));
            assert_abs_diff_eq!((back - w).length(), 0.0, epsilon = 1e-5);
        }
    }
}
