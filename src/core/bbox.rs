#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bbox {
    pub p_min: glam::Vec3A,
    pub p_max: glam::Vec3A,
}

impl Bbox {
    pub fn new(p_min: glam::Vec3A, p_max: glam::Vec3A) -> Self {
        Self { p_min, p_max }
    }

    pub fn from_points(points: &[glam::Vec3A]) -> Self {
        points
            .iter()
            .fold(Self::empty(), |bbox, p| bbox.merge_point(*p))
    }

    pub fn empty() -> Self {
        Self {
            p_min: glam::Vec3A::new(f32::MAX, f32::MAX, f32::MAX),
            p_max: glam::Vec3A::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x || self.p_min.y > self.p_max.y || self.p_min.z > self.p_max.z
    }

    pub fn merge(mut self, another: Bbox) -> Self {
        self.p_min = self.p_min.min(another.p_min);
        self.p_max = self.p_max.max(another.p_max);
        self
    }

    pub fn merge_point(mut self, p: glam::Vec3A) -> Self {
        self.p_min = self.p_min.min(p);
        self.p_max = self.p_max.max(p);
        self
    }

    /// Grows every side by `delta`.
    pub fn expand(mut self, delta: f32) -> Self {
        let delta = glam::Vec3A::new(delta, delta, delta);
        self.p_min -= delta;
        self.p_max += delta;
        self
    }

    pub fn contains(&self, p: glam::Vec3A) -> bool {
        p.x >= self.p_min.x
            && p.x <= self.p_max.x
            && p.y >= self.p_min.y
            && p.y <= self.p_max.y
            && p.z >= self.p_min.z
            && p.z <= self.p_max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_and_contain() {
        let bbox = Bbox::from_points(&[
            glam::Vec3A::new(1.0, 0.0, -1.0),
            glam::Vec3A::new(-1.0, 2.0, 0.5),
        ]);
        assert_eq!(bbox.p_min, glam::Vec3A::new(-1.0, 0.0, -1.0));
        assert_eq!(bbox.p_max, glam::Vec3A::new(1.0, 2.0, 0.5));
        assert!(bbox.contains(glam::Vec3A::new(0.0, 1.0, 0.0)));
        assert!(!bbox.contains(glam::Vec3A::new(0.0, 3.0, 0.0)));
        assert!(bbox.expand(1.0).contains(glam::Vec3A::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn empty_box() {
        let bbox = Bbox::empty();
        assert!(bbox.is_empty());
        assert!(!bbox.contains(glam::Vec3A::ZERO));
        let bbox = bbox.merge(Bbox::new(glam::Vec3A::ZERO, glam::Vec3A::ONE));
        assert!(!bbox.is_empty());
        assert_eq!(bbox, Bbox::new(glam::Vec3A::ZERO, glam::Vec3A::ONE));
    }
}
