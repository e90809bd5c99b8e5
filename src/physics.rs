//! Rigid-body interface consumed by the match controller, and `World`, the small
//! engine the terminal game runs on.
//!
//! `World` integrates velocities with explicit Euler steps, pushes dynamic bodies
//! out of static rectangles and reports each pair of bodies once when they start
//! touching. Dynamic bodies do not push each other.

use std::collections::HashSet;

use log::debug;

use crate::geometry::{Point, Rect};
use crate::player::Player;

/// Gravity is multiplied by this before being added to velocities each step.
pub const GRAVITY_SCALE: f32 = 0.25;

/// Bodies closer than this still count as touching, so resting contact does not
/// start a new collision every step.
const CONTACT_SLOP: f32 = 0.5;

/// Furthest a dynamic body moves between two overlap checks. Half the
/// perimeter thickness, so falling debris cannot pass through the perimeter.
const MAX_TRAVEL: f32 = 0.5;

const MAX_SUBSTEPS: f32 = 64.0;

/// What a body is, as far as the game is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Boundary,
    Wall,
    Goal,
    Avatar(Player),
}

/// Fill colour used by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Plain,
    Orange,
    Red,
    Green,
    Blue,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
}

/// Everything needed to create a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySpec {
    pub tag: BodyTag,
    pub shape: Shape,
    pub position: Point,
    pub style: Style,
    pub is_static: bool,
}

impl BodySpec {
    /// A static rectangle.
    pub fn rect(tag: BodyTag, rect: Rect, style: Style) -> Self {
        Self {
            tag,
            shape: Shape::Rect {
                width: rect.width,
                height: rect.height,
            },
            position: rect.center,
            style,
            is_static: true,
        }
    }

    /// A dynamic circle.
    pub fn circle(tag: BodyTag, center: Point, radius: f32, style: Style) -> Self {
        Self {
            tag,
            shape: Shape::Circle { radius },
            position: center,
            style,
            is_static: false,
        }
    }
}

/// Handle to a body. Never reused by the same engine, even after `clear`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u32);

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub tag: BodyTag,
    pub shape: Shape,
    pub position: Point,
    pub velocity: Point,
    pub style: Style,
    pub is_static: bool,
}

impl Body {
    /// Axis-aligned bounding box.
    pub fn bounds(&self) -> Rect {
        match self.shape {
            Shape::Rect { width, height } => {
                Rect::new(self.position.x, self.position.y, width, height)
            }
            Shape::Circle { radius } => Rect::new(
                self.position.x,
                self.position.y,
                radius * 2.0,
                radius * 2.0,
            ),
        }
    }
}

/// Two bodies that started touching during a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub tag_a: BodyTag,
    pub tag_b: BodyTag,
}

/// The capabilities the game needs from a physics engine.
pub trait PhysicsEngine {
    fn gravity(&self) -> Point;

    fn set_gravity(&mut self, gravity: Point);

    fn add_body(&mut self, spec: BodySpec) -> BodyId;

    fn remove_body(&mut self, id: BodyId) -> Option<Body>;

    /// Removes every body and forgets all ongoing contacts.
    fn clear(&mut self);

    fn body(&self, id: BodyId) -> Option<&Body>;

    /// All bodies in creation order.
    fn bodies(&self) -> &[Body];

    fn set_velocity(&mut self, id: BodyId, velocity: Point);

    /// Static bodies never move. Making a body static also stops it.
    fn set_static(&mut self, id: BodyId, is_static: bool);

    /// Advances the simulation by one step and returns the contacts that began.
    fn step(&mut self) -> Vec<Contact>;
}

#[derive(Debug, Default)]
pub struct World {
    bodies: Vec<Body>,
    gravity: Point,
    next_id: u32,
    touching: HashSet<(BodyId, BodyId)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    fn collect_contacts(&mut self) -> Vec<Contact> {
        let mut now = HashSet::new();
        let mut started = Vec::new();
        for (i, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[i + 1..] {
                if a.is_static && b.is_static {
                    continue;
                }
                if gap(a, b) >= CONTACT_SLOP {
                    continue;
                }
                let key = (a.id, b.id);
                if !self.touching.contains(&key) {
                    started.push(Contact {
                        a: a.id,
                        b: b.id,
                        tag_a: a.tag,
                        tag_b: b.tag,
                    });
                }
                now.insert(key);
            }
        }
        self.touching = now;
        started
    }

    fn resolve_static_overlaps(&mut self) {
        let solids: Vec<Rect> = self
            .bodies
            .iter()
            .filter(|b| b.is_static && matches!(b.shape, Shape::Rect { .. }))
            .map(Body::bounds)
            .collect();

        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            for solid in &solids {
                if let Some((normal, depth)) = penetration(body, solid) {
                    body.position = body.position + normal.scale(depth);
                    let into = body.velocity.dot(normal);
                    if into < 0.0 {
                        body.velocity = body.velocity - normal.scale(into);
                    }
                }
            }
        }
    }
}

impl PhysicsEngine for World {
    fn gravity(&self) -> Point {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Point) {
        self.gravity = gravity;
    }

    fn add_body(&mut self, spec: BodySpec) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            tag: spec.tag,
            shape: spec.shape,
            position: spec.position,
            velocity: Point::ZERO,
            style: spec.style,
            is_static: spec.is_static,
        });
        id
    }

    fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.bodies.iter().position(|b| b.id == id)?;
        self.touching.retain(|(a, b)| *a != id && *b != id);
        Some(self.bodies.remove(idx))
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.touching.clear();
    }

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Point) {
        match self.body_mut(id) {
            Some(body) => body.velocity = velocity,
            None => debug!("set_velocity on unknown body {:?}", id),
        }
    }

    fn set_static(&mut self, id: BodyId, is_static: bool) {
        match self.body_mut(id) {
            Some(body) => {
                body.is_static = is_static;
                if is_static {
                    body.velocity = Point::ZERO;
                }
            }
            None => debug!("set_static on unknown body {:?}", id),
        }
    }

    fn step(&mut self) -> Vec<Contact> {
        let pull = self.gravity.scale(GRAVITY_SCALE);
        let mut fastest: f32 = 0.0;
        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            body.velocity = body.velocity + pull;
            fastest = fastest.max(body.velocity.length());
        }

        let substeps = (fastest / MAX_TRAVEL).ceil().clamp(1.0, MAX_SUBSTEPS) as u32;
        let fraction = 1.0 / substeps as f32;
        for i in 0..substeps {
            for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
                body.position = body.position + body.velocity.scale(fraction);
            }
            if i + 1 < substeps {
                self.resolve_static_overlaps();
            }
        }

        let contacts = self.collect_contacts();
        self.resolve_static_overlaps();
        contacts
    }
}

/// Distance between the surfaces of two bodies. Negative when they overlap.
fn gap(a: &Body, b: &Body) -> f32 {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            (a.position - b.position).length() - ra - rb
        }
        (Shape::Circle { radius }, Shape::Rect { .. }) => {
            circle_rect_distance(a.position, &b.bounds()) - radius
        }
        (Shape::Rect { .. }, Shape::Circle { radius }) => {
            circle_rect_distance(b.position, &a.bounds()) - radius
        }
        (Shape::Rect { .. }, Shape::Rect { .. }) => {
            let (ra, rb) = (a.bounds(), b.bounds());
            let dx = ra.left().max(rb.left()) - ra.right().min(rb.right());
            let dy = ra.top().max(rb.top()) - ra.bottom().min(rb.bottom());
            dx.max(dy)
        }
    }
}

fn closest_point(p: Point, rect: &Rect) -> Point {
    Point::new(
        p.x.clamp(rect.left(), rect.right()),
        p.y.clamp(rect.top(), rect.bottom()),
    )
}

fn circle_rect_distance(center: Point, rect: &Rect) -> f32 {
    (center - closest_point(center, rect)).length()
}

/// Direction and depth to move `body` so it no longer overlaps `solid`.
fn penetration(body: &Body, solid: &Rect) -> Option<(Point, f32)> {
    match body.shape {
        Shape::Circle { radius } => {
            let c = body.position;
            let offset = c - closest_point(c, solid);
            let dist = offset.length();
            if dist >= radius {
                return None;
            }
            if dist > 0.0 {
                return Some((offset.scale(1.0 / dist), radius - dist));
            }
            // Centre inside the rectangle: leave through the nearest side.
            let exits = [
                (c.x - solid.left(), Point::new(-1.0, 0.0)),
                (solid.right() - c.x, Point::new(1.0, 0.0)),
                (c.y - solid.top(), Point::new(0.0, -1.0)),
                (solid.bottom() - c.y, Point::new(0.0, 1.0)),
            ];
            let (depth, normal) = exits
                .into_iter()
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .unwrap_or((0.0, Point::ZERO));
            Some((normal, depth + radius))
        }
        Shape::Rect { .. } => {
            let r = body.bounds();
            let ox = r.right().min(solid.right()) - r.left().max(solid.left());
            let oy = r.bottom().min(solid.bottom()) - r.top().max(solid.top());
            if ox <= 0.0 || oy <= 0.0 {
                return None;
            }
            if ox < oy {
                let sign = if r.center.x < solid.center.x { -1.0 } else { 1.0 };
                Some((Point::new(sign, 0.0), ox))
            } else {
                let sign = if r.center.y < solid.center.y { -1.0 } else { 1.0 };
                Some((Point::new(0.0, sign), oy))
            }
        }
    }
}
