use crate::common::{DomainError, DomainResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use super::vector::Vector3;

const SPHERE_SAMPLES: usize = 32;
const ENTITY_RIM_SAMPLES: usize = 16;
const MARK_RIM_SAMPLES: usize = 8;
const ARENA_RIM_SAMPLES: usize = 20;
const MARK_INSET: f64 = 0.01;

/// Whether a shape occupies volume, lies on the floor, or has no extent at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Density {
    Dense,
    Flat,
    None,
}

/// What the shape stands for. The arena is an inside-out container: leaving
/// it is what counts as a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeRole {
    Arena,
    Entity,
    Mark,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Point,
    Sphere { radius: f64 },
    Cuboid { width: f64, height: f64, depth: f64 },
    Cylinder { radius: f64, height: f64 },
}

/// Shape parameters as they appear in an entity group's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeSpec {
    pub shape: String,
    #[serde(default = "default_dimension")]
    pub diameter: f64,
    #[serde(default = "default_dimension")]
    pub width: f64,
    #[serde(default = "default_dimension")]
    pub height: f64,
    #[serde(default = "default_dimension")]
    pub depth: f64,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_dimension() -> f64 {
    1.0
}

fn default_color() -> String {
    "white".to_string()
}

impl ShapeSpec {
    pub fn new(shape: &str) -> Self {
        Self {
            shape: shape.to_string(),
            diameter: default_dimension(),
            width: default_dimension(),
            height: default_dimension(),
            depth: default_dimension(),
            color: default_color(),
        }
    }
}

/// Result of an overlap test: the first offending vertex is the witness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub collided: bool,
    pub witness: Vector3,
}

impl Overlap {
    fn none() -> Self {
        Self { collided: false, witness: Vector3::ZERO }
    }

    fn at(witness: Vector3) -> Self {
        Self { collided: true, witness }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    kind: ShapeKind,
    role: ShapeRole,
    density: Density,
    color: String,
    center: Vector3,
    /// Orientation about z, in degrees.
    rotation: f64,
    vertices: Vec<Vector3>,
    min: Vector3,
    max: Vector3,
    attachments: Vec<Shape>,
}

impl Shape {
    pub fn new(kind: ShapeKind, role: ShapeRole, density: Density, color: &str) -> Self {
        let mut shape = Self {
            kind,
            role,
            density,
            color: color.to_string(),
            center: Vector3::ZERO,
            rotation: 0.0,
            vertices: Vec::new(),
            min: Vector3::ZERO,
            max: Vector3::ZERO,
            attachments: Vec::new(),
        };
        shape.set_vertices();
        shape
    }

    pub fn point(role: ShapeRole, color: &str) -> Self {
        Self::new(ShapeKind::Point, role, Density::None, color)
    }

    /// Builds an entity shape from its configured identifier.
    pub fn from_spec(role: ShapeRole, spec: &ShapeSpec) -> DomainResult<Self> {
        let id = spec.shape.as_str();
        let (kind, density) = match id {
            "sphere" => (ShapeKind::Sphere { radius: spec.diameter * 0.5 }, Density::Dense),
            "cube" | "cuboid" => (
                ShapeKind::Cuboid { width: spec.width, height: spec.height, depth: spec.depth },
                Density::Dense,
            ),
            "square" | "rectangle" => (
                ShapeKind::Cuboid { width: spec.width, height: 0.0, depth: spec.depth },
                Density::Flat,
            ),
            "cylinder" => (
                ShapeKind::Cylinder { radius: spec.diameter * 0.5, height: spec.height },
                Density::Dense,
            ),
            "circle" => (
                ShapeKind::Cylinder { radius: spec.diameter * 0.5, height: 0.0 },
                Density::Flat,
            ),
            "point" | "none" => (ShapeKind::Point, Density::None),
            other => {
                return Err(DomainError::configuration(
                    format!("shape '{}'", other),
                    "valid shapes are: sphere, cube, cuboid, square, rectangle, cylinder, circle, point, none",
                ))
            }
        };
        let dims_positive = match kind {
            ShapeKind::Point => true,
            ShapeKind::Sphere { radius } | ShapeKind::Cylinder { radius, .. } => radius > 0.0,
            ShapeKind::Cuboid { width, depth, .. } => width > 0.0 && depth > 0.0,
        };
        if !dims_positive {
            return Err(DomainError::configuration(
                format!("shape '{}'", id),
                "dimensions must be positive",
            ));
        }
        Ok(Self::new(kind, role, density, &spec.color))
    }

    /// Small flat marker used as a heading indicator on an agent.
    pub fn marker(parent_radius: f64, color: &str) -> Self {
        let radius = (parent_radius * 0.2).max(1e-3);
        Self::new(
            ShapeKind::Cylinder { radius, height: 0.0 },
            ShapeRole::Mark,
            Density::Flat,
            color,
        )
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn role(&self) -> ShapeRole {
        self.role
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn center(&self) -> Vector3 {
        self.center
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    pub fn attachments(&self) -> &[Shape] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, attachment: Shape) {
        self.attachments.push(attachment);
        self.place_attachments();
    }

    /// True for spheres and cylinders, whose point test is distance based.
    pub fn is_circular(&self) -> bool {
        matches!(self.kind, ShapeKind::Sphere { .. } | ShapeKind::Cylinder { .. })
    }

    /// Zero for box-like shapes and points.
    pub fn get_radius(&self) -> f64 {
        match self.kind {
            ShapeKind::Sphere { radius } | ShapeKind::Cylinder { radius, .. } => radius,
            _ => 0.0,
        }
    }

    /// Radius for circular shapes, otherwise the largest planar half extent.
    pub fn footprint_radius(&self) -> f64 {
        match self.kind {
            ShapeKind::Point => 0.0,
            ShapeKind::Sphere { radius } | ShapeKind::Cylinder { radius, .. } => radius,
            ShapeKind::Cuboid { width, depth, .. } => 0.5 * width.hypot(depth),
        }
    }

    /// Height of the center above the floor when the shape rests on it.
    pub fn rest_height(&self) -> f64 {
        if self.density != Density::Dense {
            return 0.0;
        }
        match self.kind {
            ShapeKind::Point => 0.0,
            ShapeKind::Sphere { radius } => radius,
            ShapeKind::Cuboid { height, .. } | ShapeKind::Cylinder { height, .. } => height * 0.5,
        }
    }

    pub fn min_extent(&self) -> Vector3 {
        self.min
    }

    pub fn max_extent(&self) -> Vector3 {
        self.max
    }

    pub fn translate(&mut self, to: Vector3) {
        self.center = to;
        self.set_vertices();
    }

    /// Rotates the shape by `angle` degrees about z through its center.
    pub fn rotate(&mut self, angle: f64) {
        self.set_rotation(self.rotation + angle);
    }

    pub fn set_rotation(&mut self, angle: f64) {
        self.rotation = super::vector::wrap_degrees(angle);
        self.set_vertices();
    }

    /// Regenerates vertices, extents and attachments from the current
    /// center, rotation and dimensions.
    pub fn set_vertices(&mut self) {
        if self.density == Density::Flat && self.role == ShapeRole::Entity {
            self.center.z = 0.0;
        }
        let mut vertices = self.raw_vertices();
        if self.rotation != 0.0 {
            let angle = self.rotation.to_radians();
            for v in vertices.iter_mut() {
                *v = v.rotate_z(&self.center, angle);
            }
        }
        self.vertices = vertices;
        self.refresh_extents();
        self.place_attachments();
    }

    fn raw_vertices(&self) -> Vec<Vector3> {
        let c = self.center;
        match (self.kind, self.role) {
            (ShapeKind::Point, _) => Vec::new(),
            (ShapeKind::Sphere { radius }, _) => {
                let mut out = Vec::with_capacity(SPHERE_SAMPLES * SPHERE_SAMPLES);
                for i in 0..SPHERE_SAMPLES {
                    let theta = TAU * i as f64 / SPHERE_SAMPLES as f64;
                    let (sin_t, cos_t) = theta.sin_cos();
                    for j in 0..SPHERE_SAMPLES {
                        let phi = PI * j as f64 / SPHERE_SAMPLES as f64;
                        let (sin_p, cos_p) = phi.sin_cos();
                        out.push(Vector3::new(
                            c.x + radius * sin_p * cos_t,
                            c.y + radius * sin_p * sin_t,
                            c.z + radius * cos_p,
                        ));
                    }
                }
                out
            }
            (ShapeKind::Cuboid { width, height, depth }, role) => {
                let hw = width * 0.5;
                let hd = depth * 0.5;
                let corners = [(-hw, -hd), (hw, -hd), (hw, hd), (-hw, hd)];
                let levels: Vec<f64> = if role == ShapeRole::Arena {
                    vec![0.0, height]
                } else if self.density == Density::Flat {
                    vec![0.0]
                } else {
                    vec![c.z - height * 0.5, c.z + height * 0.5]
                };
                corners
                    .iter()
                    .flat_map(|(dx, dy)| {
                        levels.iter().map(move |z| Vector3::new(c.x + dx, c.y + dy, *z))
                    })
                    .collect()
            }
            (ShapeKind::Cylinder { radius, height }, role) => {
                let (samples, levels): (usize, Vec<f64>) = match role {
                    ShapeRole::Arena => (ARENA_RIM_SAMPLES, vec![0.0, height]),
                    ShapeRole::Mark => (MARK_RIM_SAMPLES, vec![c.z]),
                    ShapeRole::Entity if self.density == Density::Flat => {
                        (ENTITY_RIM_SAMPLES, vec![0.0])
                    }
                    ShapeRole::Entity => (
                        ENTITY_RIM_SAMPLES,
                        vec![c.z - height * 0.5, c.z + height * 0.5],
                    ),
                };
                let step = TAU / samples as f64;
                (0..samples)
                    .flat_map(|i| {
                        let (sin, cos) = (i as f64 * step).sin_cos();
                        let (x, y) = (c.x + radius * cos, c.y + radius * sin);
                        levels.clone().into_iter().map(move |z| Vector3::new(x, y, z))
                    })
                    .collect()
            }
        }
    }

    fn refresh_extents(&mut self) {
        if self.vertices.is_empty() {
            self.min = self.center;
            self.max = self.center;
            return;
        }
        let mut min = Vector3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Vector3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            min = Vector3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z));
            max = Vector3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z));
        }
        self.min = min;
        self.max = max;
    }

    /// Places attachments just inside the front edge along the heading.
    fn place_attachments(&mut self) {
        if self.attachments.is_empty() {
            return;
        }
        let reach = (self.footprint_radius() - MARK_INSET).max(0.0);
        let heading = Vector3::heading(self.rotation);
        let anchor = Vector3::new(
            self.center.x + reach * heading.x,
            self.center.y + reach * heading.y,
            self.max.z,
        );
        for attachment in self.attachments.iter_mut() {
            attachment.translate(anchor);
        }
    }

    /// Point test for regular (non-arena) shapes. `inclusive` decides
    /// whether a point on the surface counts as inside.
    pub fn contains_point(&self, point: &Vector3, inclusive: bool) -> bool {
        let within = |d: f64, limit: f64| if inclusive { d <= limit } else { d < limit };
        match self.kind {
            ShapeKind::Point => false,
            ShapeKind::Sphere { radius } => within((*point - self.center).magnitude(), radius),
            ShapeKind::Cylinder { radius, .. } => {
                within(point.planar_distance(&self.center), radius)
                    && point.z >= self.min.z
                    && point.z <= self.max.z
            }
            ShapeKind::Cuboid { .. } => {
                let inside = |v: f64, lo: f64, hi: f64| {
                    if inclusive {
                        lo <= v && v <= hi
                    } else {
                        lo < v && v < hi
                    }
                };
                inside(point.x, self.min.x, self.max.x)
                    && inside(point.y, self.min.y, self.max.y)
                    && (self.density == Density::Flat || inside(point.z, self.min.z, self.max.z))
            }
        }
    }

    /// Footprint test against an arena-role shape. Points count as inside
    /// when they lie on the boundary.
    pub fn arena_contains(&self, point: &Vector3) -> bool {
        match self.kind {
            ShapeKind::Point => true,
            ShapeKind::Sphere { radius } | ShapeKind::Cylinder { radius, .. } => {
                point.planar_distance(&self.center) <= radius
            }
            ShapeKind::Cuboid { .. } => {
                self.min.x <= point.x
                    && point.x <= self.max.x
                    && self.min.y <= point.y
                    && point.y <= self.max.y
            }
        }
    }

    /// Vertex-sampled overlap test. Against the arena a vertex outside the
    /// boundary is a collision; between regular shapes a vertex inside the
    /// other shape is. Symmetric in its `collided` result.
    pub fn check_overlap(&self, other: &Shape) -> Overlap {
        match (self.role, other.role) {
            (ShapeRole::Arena, ShapeRole::Arena) => Overlap::none(),
            (_, ShapeRole::Arena) => self.boundary_violation(other),
            (ShapeRole::Arena, _) => other.boundary_violation(self),
            _ => {
                if let Some(v) = self.vertices.iter().find(|v| other.contains_point(v, true)) {
                    return Overlap::at(*v);
                }
                if let Some(v) = other.vertices.iter().find(|v| self.contains_point(v, true)) {
                    return Overlap::at(*v);
                }
                Overlap::none()
            }
        }
    }

    fn boundary_violation(&self, arena: &Shape) -> Overlap {
        if arena.kind == ShapeKind::Point {
            return Overlap::none();
        }
        if let Some(v) = self.vertices.iter().find(|v| !arena.arena_contains(v)) {
            return Overlap::at(*v);
        }
        if let Some(v) = arena.vertices.iter().find(|v| self.contains_point(v, false)) {
            return Overlap::at(*v);
        }
        Overlap::none()
    }

    /// Samples a planar position where this shape's footprint fits inside
    /// `arena`. The returned z is zero; callers set the resting height.
    pub fn random_point_inside<R: Rng + ?Sized>(&self, rng: &mut R, arena: &Shape) -> Vector3 {
        let c = arena.center;
        match arena.kind {
            ShapeKind::Point => c.with_z(0.0),
            ShapeKind::Sphere { radius } | ShapeKind::Cylinder { radius, .. } => {
                let usable = (radius - self.footprint_radius()).max(0.0);
                let angle = rng.gen_range(0.0..TAU);
                let r = usable * rng.gen::<f64>().sqrt();
                Vector3::new(c.x + r * angle.cos(), c.y + r * angle.sin(), 0.0)
            }
            ShapeKind::Cuboid { .. } => {
                let (mx, my) = if self.is_circular() {
                    (self.get_radius(), self.get_radius())
                } else {
                    let half = self.max - self.center;
                    (half.x.abs(), half.y.abs())
                };
                let lo = arena.min;
                let hi = arena.max;
                Vector3::new(
                    sample_between(rng, lo.x + mx, hi.x - mx),
                    sample_between(rng, lo.y + my, hi.y - my),
                    0.0,
                )
            }
        }
    }
}

fn sample_between<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return (lo + hi) * 0.5;
    }
    rng.gen_range(lo..=hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_box_has_four_vertices_on_floor() {
        let mut spec = ShapeSpec::new("square");
        spec.width = 0.5;
        spec.depth = 0.5;
        let mut shape = Shape::from_spec(ShapeRole::Entity, &spec).unwrap();
        shape.translate(Vector3::new(1.0, 1.0, 3.0));
        assert_eq!(shape.vertices().len(), 4);
        assert!(shape.vertices().iter().all(|v| v.z == 0.0));
        assert_eq!(shape.center().z, 0.0);
    }

    #[test]
    fn extents_follow_translation() {
        let mut spec = ShapeSpec::new("cylinder");
        spec.diameter = 0.2;
        spec.height = 0.1;
        let mut shape = Shape::from_spec(ShapeRole::Entity, &spec).unwrap();
        shape.translate(Vector3::new(2.0, -1.0, 0.05));
        assert!((shape.min_extent().x - 1.9).abs() < 1e-9);
        assert!((shape.max_extent().x - 2.1).abs() < 1e-9);
        assert!((shape.min_extent().z - 0.0).abs() < 1e-9);
    }
}
