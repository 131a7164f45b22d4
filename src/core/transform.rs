#[derive(Debug, Clone, Copy)]
pub struct Transform {
    trans: glam::Affine3A,
    trans_it: glam::Mat3A,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        trans: glam::Affine3A::IDENTITY,
        trans_it: glam::Mat3A::IDENTITY,
    };

    pub fn new(trans: glam::Affine3A) -> Self {
        let trans_inv = trans.inverse();
        let trans_it = trans_inv.matrix3.transpose();
        Self { trans, trans_it }
    }

    pub fn transform_point3a(&self, other: glam::Vec3A) -> glam::Vec3A {
        self.trans.transform_point3a(other)
    }

    pub fn transform_vector3a(&self, other: glam::Vec3A) -> glam::Vec3A {
        self.trans.transform_vector3a(other)
    }

    pub fn transform_normal3a(&self, other: glam::Vec3A) -> glam::Vec3A {
        (self.trans_it * other).normalize()
    }

    pub fn swaps_handedness(&self) -> bool {
        self.trans.matrix3.determinant() < 0.0
    }

    pub fn is_singular(&self) -> bool {
        self.trans.matrix3.determinant() == 0.0
    }

    /// The scale factor if the linear part is a rotation (or reflection) times a uniform scale.
    pub fn uniform_scale(&self) -> Option<f32> {
        let m = self.trans.matrix3;
        let sx = m.x_axis.length();
        let sy = m.y_axis.length();
        let sz = m.z_axis.length();
        let scale = (sx + sy + sz) / 3.0;
        let tolerance = 1e-4 * scale;
        let orthogonal = m.x_axis.dot(m.y_axis).abs() <= tolerance * scale
            && m.y_axis.dot(m.z_axis).abs() <= tolerance * scale
            && m.z_axis.dot(m.x_axis).abs() <= tolerance * scale;
        if scale > 0.0
            && (sx - scale).abs() <= tolerance
            && (sy - scale).abs() <= tolerance
            && (sz - scale).abs() <= tolerance
            && orthogonal
        {
            Some(scale)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn uniform_scale_detection() {
        let t = Transform::new(
            glam::Affine3A::from_translation(glam::Vec3::new(1.0, 2.0, 3.0))
                * glam::Affine3A::from_rotation_y(0.7)
                * glam::Affine3A::from_scale(glam::Vec3::new(2.0, 2.0, 2.0)),
        );
        assert_abs_diff_eq!(t.uniform_scale().unwrap(), 2.0, epsilon = 1e-4);
        assert!(!t.swaps_handedness());

        let t = Transform::new(glam::Affine3A::from_scale(glam::Vec3::new(1.0, 2.0, 1.0)));
        assert!(t.uniform_scale().is_none());

        let t = Transform::new(glam::Affine3A::from_scale(glam::Vec3::new(-1.0, 1.0, 1.0)));
        assert_eq!(t.uniform_scale(), Some(1.0));
        assert!(t.swaps_handedness());
    }

    #[test]
    fn normals_stay_perpendicular() {
        let t = Transform::new(glam::Affine3A::from_scale(glam::Vec3::new(1.0, 4.0, 1.0)));
        let tangent = glam::Vec3A::new(1.0, 1.0, 0.0);
        let normal = glam::Vec3A::new(1.0, -1.0, 0.0).normalize();
        let tangent = t.transform_vector3a(tangent);
        let normal = t.transform_normal3a(normal);
        assert_abs_diff_eq!(tangent.dot(normal), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(normal.length(), 1.0, epsilon = 1e-5);
    }
}
