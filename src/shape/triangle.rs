use std::{fmt, sync::Arc};

use crate::{
    core::{
        bbox::Bbox,
        coord::Coordinate,
        direction_cone::DirectionCone,
        interaction::{Interaction, SurfaceInteraction},
        loader::{FileLoc, InputParams},
        ray::Ray,
        rng::mix_bits,
        sampling::uniform_in_triangle,
        transform::Transform,
    },
    texture::{FloatTexture, FloatTextureT, TextureEvalContext},
};

use super::{
    area_sample_to_solid_angle, solid_angle_pdf_from_area, uniform_area_pdf, ShapeSample,
    ShapeSampleContext, ShapeT,
};

/// Vertex data shared by all triangles of one mesh, already in render space.
#[derive(Debug)]
pub struct TriangleMesh {
    pub positions: Vec<glam::Vec3A>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<glam::Vec3A>>,
    pub uvs: Option<Vec<glam::Vec2>>,
    /// Hits where this evaluates to 0 are ignored.
    pub alpha: Option<Arc<FloatTexture>>,
    pub flip_normals: bool,
}

impl TriangleMesh {
    pub fn new(
        render_from_object: &Transform,
        reverse_orientation: bool,
        positions: Vec<glam::Vec3A>,
        indices: Vec<u32>,
        normals: Option<Vec<glam::Vec3A>>,
        uvs: Option<Vec<glam::Vec2>>,
    ) -> Self {
        let positions = positions
            .into_iter()
            .map(|p| render_from_object.transform_point3a(p))
            .collect();
        let normals = normals.map(|normals| {
            normals
                .into_iter()
                .map(|n| {
                    let n = render_from_object.transform_normal3a(n);
                    if reverse_orientation {
                        -n
                    } else {
                        n
                    }
                })
                .collect()
        });
        Self {
            positions,
            indices,
            normals,
            uvs,
            alpha: None,
            flip_normals: reverse_orientation ^ render_from_object.swaps_handedness(),
        }
    }

    pub fn load(
        render_from_object: &Transform,
        reverse_orientation: bool,
        params: &mut InputParams,
        loc: &FileLoc,
    ) -> anyhow::Result<Self> {
        let positions = params.get_float_array("P", None)?;
        if positions.len() % 3 != 0 {
            anyhow::bail!(format!(
                "{} at {}: 'P' should hold 3 floats per vertex",
                params.name(),
                loc
            ));
        }
        let positions = positions
            .chunks_exact(3)
            .map(|p| glam::Vec3A::new(p[0], p[1], p[2]))
            .collect::<Vec<_>>();

        let indices = if params.contains_key("indices") {
            params
                .get_int_array("indices", None)?
                .into_iter()
                .map(|i| i as u32)
                .collect()
        } else if positions.len() == 3 {
            vec![0, 1, 2]
        } else {
            anyhow::bail!(format!(
                "{} at {}: there is no 'indices' field",
                params.name(),
                loc
            ));
        };

        let normals = if params.contains_key("N") {
            let normals = params.get_float_array("N", Some(positions.len() * 3))?;
            Some(
                normals
                    .chunks_exact(3)
                    .map(|n| glam::Vec3A::new(n[0], n[1], n[2]))
                    .collect(),
            )
        } else {
            None
        };

        let uvs = if params.contains_key("uv") {
            let uvs = params.get_float_array("uv", Some(positions.len() * 2))?;
            Some(
                uvs.chunks_exact(2)
                    .map(|uv| glam::Vec2::new(uv[0], uv[1]))
                    .collect(),
            )
        } else {
            None
        };

        let mesh = TriangleMesh::new(
            render_from_object,
            reverse_orientation,
            positions,
            indices,
            normals,
            uvs,
        );
        mesh.check(params.name(), loc)?;
        Ok(mesh)
    }

    pub fn load_obj(
        render_from_object: &Transform,
        reverse_orientation: bool,
        params: &mut InputParams,
        loc: &FileLoc,
    ) -> anyhow::Result<Self> {
        let obj_file = params.get_file_path("filename")?;

        let mut load_options = tobj::LoadOptions::default();
        load_options.triangulate = true;
        load_options.single_index = true;
        let (models, _) = tobj::load_obj(&obj_file, &load_options).map_err(|err| {
            anyhow::anyhow!(
                "{} at {}: can't load '{}' - {}",
                params.name(),
                loc,
                obj_file.display(),
                err
            )
        })?;

        let mut positions = vec![];
        let mut indices = vec![];
        let mut normals = vec![];
        let mut uvs = vec![];
        let mut all_normals = true;
        let mut all_uvs = true;
        for model in models {
            let mesh = model.mesh;
            let vertex_offset = positions.len() as u32;
            let vertex_count = mesh.positions.len() / 3;
            positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| glam::Vec3A::new(p[0], p[1], p[2])),
            );
            if mesh.normals.len() == vertex_count * 3 {
                normals.extend(
                    mesh.normals
                        .chunks_exact(3)
                        .map(|n| glam::Vec3A::new(n[0], n[1], n[2])),
                );
            } else {
                all_normals = false;
            }
            if mesh.texcoords.len() == vertex_count * 2 {
                uvs.extend(
                    mesh.texcoords
                        .chunks_exact(2)
                        .map(|uv| glam::Vec2::new(uv[0], uv[1])),
                );
            } else {
                all_uvs = false;
            }
            indices.extend(mesh.indices.into_iter().map(|i| i + vertex_offset));
        }

        let mesh = TriangleMesh::new(
            render_from_object,
            reverse_orientation,
            positions,
            indices,
            if all_normals { Some(normals) } else { None },
            if all_uvs { Some(uvs) } else { None },
        );
        mesh.check(params.name(), loc)?;
        Ok(mesh)
    }

    fn check(&self, env: &str, loc: &FileLoc) -> anyhow::Result<()> {
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            anyhow::bail!(format!(
                "{} at {}: index count should be a positive multiple of 3",
                env, loc
            ));
        }
        let vertex_count = self.positions.len();
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            anyhow::bail!(format!(
                "{} at {}: index {} is out of {} vertices",
                env, loc, index, vertex_count
            ));
        }
        Ok(())
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// One triangle of a [`TriangleMesh`].
#[derive(Debug)]
pub struct Triangle {
    mesh: Arc<TriangleMesh>,
    index: u32,
}

impl Triangle {
    pub fn new(mesh: Arc<TriangleMesh>, index: u32) -> Self {
        Self { mesh, index }
    }

    /// Splits a mesh into triangles, dropping the ones without area.
    pub fn create_triangles(mesh: Arc<TriangleMesh>) -> Vec<Triangle> {
        let mut triangles = Vec::with_capacity(mesh.num_triangles());
        let mut degenerate = 0;
        for index in 0..mesh.num_triangles() as u32 {
            let triangle = Triangle::new(mesh.clone(), index);
            if triangle.area() > 0.0 {
                triangles.push(triangle);
            } else {
                degenerate += 1;
            }
        }
        if degenerate > 0 {
            log::warn!("trianglemesh - skipped {} degenerate triangle(s)", degenerate);
        }
        triangles
    }

    fn vertex_indices(&self) -> [usize; 3] {
        let first = 3 * self.index as usize;
        [
            self.mesh.indices[first] as usize,
            self.mesh.indices[first + 1] as usize,
            self.mesh.indices[first + 2] as usize,
        ]
    }

    fn positions(&self) -> [glam::Vec3A; 3] {
        let [i0, i1, i2] = self.vertex_indices();
        [
            self.mesh.positions[i0],
            self.mesh.positions[i1],
            self.mesh.positions[i2],
        ]
    }

    fn uvs(&self) -> [glam::Vec2; 3] {
        match &self.mesh.uvs {
            Some(uvs) => {
                let [i0, i1, i2] = self.vertex_indices();
                [uvs[i0], uvs[i1], uvs[i2]]
            }
            None => [
                glam::Vec2::new(0.0, 0.0),
                glam::Vec2::new(1.0, 0.0),
                glam::Vec2::new(1.0, 1.0),
            ],
        }
    }

    /// Face normal. With vertex normals it points to their side, otherwise it follows the
    /// winding order and the mesh orientation.
    fn geometric_normal(&self) -> glam::Vec3A {
        let [p0, p1, p2] = self.positions();
        let n = (p0 - p2).cross(p1 - p2).normalize();
        match &self.mesh.normals {
            Some(normals) => {
                let [i0, i1, i2] = self.vertex_indices();
                let ns = normals[i0] + normals[i1] + normals[i2];
                if n.dot(ns) < 0.0 {
                    -n
                } else {
                    n
                }
            }
            None if self.mesh.flip_normals => -n,
            None => n,
        }
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32, f32)> {
        let [p0, p1, p2] = self.positions();
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let q = ray.direction.cross(e2);
        let det = e1.dot(q);
        if det != 0.0 {
            let det = 1.0 / det;
            let s = ray.origin - p0;
            let v = s.dot(q) * det;
            if v >= 0.0 {
                let r = s.cross(e1);
                let w = ray.direction.dot(r) * det;
                let u = 1.0 - v - w;
                if w >= 0.0 && u >= 0.0 {
                    let t = e2.dot(r) * det;
                    return Some((t, u, v, w));
                }
            }
        }
        None
    }

    /// Hit distance and barycentrics, after the alpha test.
    fn hit(&self, ray: &Ray, t_max: f32) -> Option<(f32, [f32; 3])> {
        let (t, u, v, w) = self.intersect_ray(ray)?;
        if t <= ray.t_min || t > t_max {
            return None;
        }
        let b = [u, v, w];
        if let Some(alpha) = &self.mesh.alpha {
            let [p0, p1, p2] = self.positions();
            let [uv0, uv1, uv2] = self.uvs();
            let ctx = TextureEvalContext::new(
                p0 * u + p1 * v + p2 * w,
                uv0 * u + uv1 * v + uv2 * w,
            );
            let a = alpha.evaluate(&ctx);
            if a <= 0.0 || (a < 1.0 && ray_hash_float(ray) > a) {
                return None;
            }
        }
        Some((t, b))
    }
}

/// A float in `[0, 1)` that only depends on the ray, for stochastic alpha tests.
fn ray_hash_float(ray: &Ray) -> f32 {
    let values = [
        ray.origin.x,
        ray.origin.y,
        ray.origin.z,
        ray.direction.x,
        ray.direction.y,
        ray.direction.z,
    ];
    let hash = values
        .iter()
        .fold(0u64, |hash, v| mix_bits(hash ^ v.to_bits() as u64));
    (hash >> 40) as f32 / (1u64 << 24) as f32
}

impl ShapeT for Triangle {
    fn bounds(&self) -> Bbox {
        Bbox::from_points(&self.positions())
    }

    fn normal_bounds(&self) -> DirectionCone {
        DirectionCone::from_direction(self.geometric_normal())
    }

    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, SurfaceInteraction)> {
        let (t, [b0, b1, b2]) = self.hit(ray, t_max)?;
        let [p0, p1, p2] = self.positions();
        let [uv0, uv1, uv2] = self.uvs();
        let n = self.geometric_normal();

        let duv02 = uv0 - uv2;
        let duv12 = uv1 - uv2;
        let dp02 = p0 - p2;
        let dp12 = p1 - p2;
        let determinant = duv02.x * duv12.y - duv02.y * duv12.x;
        let (mut dpdu, mut dpdv) = if determinant.abs() < 1e-9 {
            (glam::Vec3A::ZERO, glam::Vec3A::ZERO)
        } else {
            let inv_det = 1.0 / determinant;
            (
                (dp02 * duv12.y - dp12 * duv02.y) * inv_det,
                (dp12 * duv02.x - dp02 * duv12.x) * inv_det,
            )
        };
        if dpdu.cross(dpdv).length_squared() == 0.0 {
            let frame = Coordinate::from_z(n);
            dpdu = frame.x();
            dpdv = frame.y();
        }

        Some((
            t,
            SurfaceInteraction {
                p: p0 * b0 + p1 * b1 + p2 * b2,
                n,
                uv: uv0 * b0 + uv1 * b1 + uv2 * b2,
                dpdu,
                dpdv,
                wo: -ray.direction,
                time: ray.time,
            },
        ))
    }

    fn intersect_p(&self, ray: &Ray, t_max: f32) -> bool {
        self.hit(ray, t_max).is_some()
    }

    fn area(&self) -> f32 {
        let [p0, p1, p2] = self.positions();
        0.5 * (p1 - p0).cross(p2 - p0).length()
    }

    fn sample(&self, u: glam::Vec2) -> Option<ShapeSample> {
        let pdf = uniform_area_pdf(self.area())?;
        let [b0, b1, b2] = uniform_in_triangle(u);
        let [p0, p1, p2] = self.positions();
        let [uv0, uv1, uv2] = self.uvs();
        Some(ShapeSample {
            intr: Interaction {
                p: p0 * b0 + p1 * b1 + p2 * b2,
                n: self.geometric_normal(),
                uv: uv0 * b0 + uv1 * b1 + uv2 * b2,
                time: 0.0,
            },
            pdf,
        })
    }

    fn pdf(&self, _intr: &Interaction) -> f32 {
        uniform_area_pdf(self.area()).unwrap_or(0.0)
    }

    fn sample_with_context(
        &self,
        ctx: &ShapeSampleContext,
        u: glam::Vec2,
    ) -> Option<ShapeSample> {
        let ss = self.sample(u)?;
        area_sample_to_solid_angle(ctx, ss)
    }

    fn pdf_with_context(&self, ctx: &ShapeSampleContext, wi: glam::Vec3A) -> f32 {
        solid_angle_pdf_from_area(self, ctx, wi)
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [p0, p1, p2] = self.positions();
        write!(
            f,
            "[ Triangle index: {} p0: {} p1: {} p2: {} ]",
            self.index, p0, p1, p2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{CheckerFloatTex, ConstFloatTex};
    use approx::assert_abs_diff_eq;

    fn single_triangle(alpha: Option<FloatTexture>) -> Triangle {
        let mut mesh = TriangleMesh::new(
            &Transform::IDENTITY,
            false,
            vec![
                glam::Vec3A::new(0.0, 0.0, 0.0),
                glam::Vec3A::new(2.0, 0.0, 0.0),
                glam::Vec3A::new(0.0, 2.0, 0.0),
            ],
            vec![0, 1, 2],
            None,
            None,
        );
        mesh.alpha = alpha.map(Arc::new);
        Triangle::new(Arc::new(mesh), 0)
    }

    #[test]
    fn barycentric_hit() {
        let triangle = single_triangle(None);
        let ray = Ray::new(glam::Vec3A::new(0.5, 0.5, 1.0), -glam::Vec3A::Z);
        let (t, isect) = triangle.intersect(&ray, f32::INFINITY).unwrap();
        assert_abs_diff_eq!(t, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!((isect.p - glam::Vec3A::new(0.5, 0.5, 0.0)).length(), 0.0);
        assert_eq!(isect.n, glam::Vec3A::Z);
        assert_abs_diff_eq!(triangle.area(), 2.0);

        let miss = Ray::new(glam::Vec3A::new(1.5, 1.5, 1.0), -glam::Vec3A::Z);
        assert!(triangle.intersect(&miss, f32::INFINITY).is_none());
        assert!(!triangle.intersect_p(&ray, 0.5));
    }

    #[test]
    fn default_uv_partials_span_the_plane() {
        let triangle = single_triangle(None);
        let ray = Ray::new(glam::Vec3A::new(0.2, 0.1, 1.0), -glam::Vec3A::Z);
        let (_, isect) = triangle.intersect(&ray, f32::INFINITY).unwrap();
        assert_abs_diff_eq!(isect.dpdu.dot(isect.n), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(isect.dpdv.dot(isect.n), 0.0, epsilon = 1e-5);
        assert!(isect.dpdu.cross(isect.dpdv).length() > 0.0);
    }

    #[test]
    fn alpha_cuts_out_hits() {
        let transparent = single_triangle(Some(ConstFloatTex::new(0.0).into()));
        let ray = Ray::new(glam::Vec3A::new(0.5, 0.5, 1.0), -glam::Vec3A::Z);
        assert!(transparent.intersect(&ray, f32::INFINITY).is_none());
        assert!(!transparent.intersect_p(&ray, f32::INFINITY));

        // with default uvs (0.25, 0.25) maps to uv (0.25, 0.125) and (1.5, 0.25) to (0.875, 0.125)
        let checker = CheckerFloatTex::new(1.0, 0.0, glam::Vec2::new(2.0, 2.0));
        let holes = single_triangle(Some(checker.into()));
        let solid = Ray::new(glam::Vec3A::new(0.25, 0.25, 1.0), -glam::Vec3A::Z);
        let hole = Ray::new(glam::Vec3A::new(1.5, 0.25, 1.0), -glam::Vec3A::Z);
        assert!(holes.intersect_p(&solid, f32::INFINITY));
        assert!(holes.intersect(&solid, f32::INFINITY).is_some());
        assert!(!holes.intersect_p(&hole, f32::INFINITY));
        assert!(holes.intersect(&hole, f32::INFINITY).is_none());
    }

    #[test]
    fn vertex_normals_orient_the_face() {
        let mesh = TriangleMesh::new(
            &Transform::IDENTITY,
            false,
            vec![
                glam::Vec3A::new(0.0, 0.0, 0.0),
                glam::Vec3A::new(1.0, 0.0, 0.0),
                glam::Vec3A::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
            Some(vec![-glam::Vec3A::Z; 3]),
            None,
        );
        let triangle = Triangle::new(Arc::new(mesh), 0);
        let ss = triangle.sample(glam::Vec2::new(0.3, 0.3)).unwrap();
        assert_eq!(ss.intr.n, -glam::Vec3A::Z);
        assert!(triangle.normal_bounds().contains(-glam::Vec3A::Z));
    }

    #[test]
    fn degenerate_triangles_are_dropped() {
        let mesh = TriangleMesh::new(
            &Transform::IDENTITY,
            false,
            vec![
                glam::Vec3A::new(0.0, 0.0, 0.0),
                glam::Vec3A::new(1.0, 0.0, 0.0),
                glam::Vec3A::new(2.0, 0.0, 0.0),
                glam::Vec3A::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 1, 3],
            None,
            None,
        );
        let triangles = Triangle::create_triangles(Arc::new(mesh));
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].index, 1);
    }

    #[test]
    fn collinear_triangle_has_no_samples() {
        let mesh = TriangleMesh::new(
            &Transform::IDENTITY,
            false,
            vec![
                glam::Vec3A::new(0.0, 0.0, 0.0),
                glam::Vec3A::new(1.0, 0.0, 0.0),
                glam::Vec3A::new(2.0, 0.0, 0.0),
            ],
            vec![0, 1, 2],
            None,
            None,
        );
        let triangle = Triangle::new(Arc::new(mesh), 0);
        let u = glam::Vec2::new(0.3, 0.6);
        assert_eq!(triangle.area(), 0.0);
        assert!(triangle.sample(u).is_none());
        let ctx = ShapeSampleContext::from_point(glam::Vec3A::new(1.0, 1.0, 1.0));
        assert!(triangle.sample_with_context(&ctx, u).is_none());
    }
}
