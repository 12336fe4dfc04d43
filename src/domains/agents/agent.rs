use crate::common::{entity_rng, AgentState, CollisionBody, DomainError, DomainResult, ObjectState, SimRng};
use crate::config::AgentGroupConfig;
use crate::domains::geometry::{wrap_degrees, Shape, ShapeRole, Vector3};
use crate::domains::messaging::{Delivery, Message, MessagingConfig};
use rand::Rng;
use serde_json::json;
use std::collections::BTreeMap;

use super::perception::PeerView;
use super::policy::{DecisionPolicy, PolicyContext};

const MARKER_COLOR: &str = "black";

/// A moving entity with its own generator, kinematic limits and policy.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    entity_type: String,
    id: usize,
    config: AgentGroupConfig,
    config_json: String,
    shape: Shape,
    orientation: f64,
    prev_position: Vector3,
    prev_orientation: f64,
    /// Per-tick limits.
    max_linear: f64,
    max_angular: f64,
    speed: f64,
    forward_vector: Vector3,
    policy: DecisionPolicy,
    rng: SimRng,
    inbox: Vec<Message>,
    /// Heard since the last send; forwarded on the next due tick.
    relay: Vec<Message>,
}

impl Agent {
    pub fn new(
        group: &str,
        id: usize,
        config: &AgentGroupConfig,
        ticks_per_second: u32,
        run_seed: u64,
    ) -> DomainResult<Self> {
        let entity_type = format!("agent_{}", group);
        let name = format!("{}_{}", entity_type, id);
        let config_json = serde_json::to_string(config).map_err(|e| DomainError::InvalidState {
            reason: format!("cannot serialize {}: {}", entity_type, e),
        })?;

        let mut shape = Shape::from_spec(ShapeRole::Entity, &config.shape_spec())?;
        shape.add_attachment(Shape::marker(shape.footprint_radius(), MARKER_COLOR));

        let tps = f64::from(ticks_per_second.max(1));
        let mut rng = entity_rng(&config_json, run_seed, &entity_type, id);
        let policy = DecisionPolicy::from_config(&config.policy, &mut rng);

        let mut agent = Self {
            name,
            entity_type,
            id,
            config: config.clone(),
            config_json,
            shape,
            orientation: 0.0,
            prev_position: Vector3::ZERO,
            prev_orientation: 0.0,
            max_linear: config.linear_velocity / tps,
            max_angular: config.angular_velocity / tps,
            speed: 0.0,
            forward_vector: Vector3::ZERO,
            policy,
            rng,
            inbox: Vec::new(),
            relay: Vec::new(),
        };
        agent.draw_orientation();
        Ok(agent)
    }

    /// Re-derives generator, policy and start heading for a new run.
    pub fn reset(&mut self, run_seed: u64) {
        self.rng = entity_rng(&self.config_json, run_seed, &self.entity_type, self.id);
        self.policy = DecisionPolicy::from_config(&self.config.policy, &mut self.rng);
        self.inbox.clear();
        self.relay.clear();
        self.speed = 0.0;
        self.forward_vector = Vector3::ZERO;
        self.draw_orientation();
    }

    fn draw_orientation(&mut self) {
        let orientation = match self.config.orientations.get(self.id) {
            Some(o) => *o,
            None => self.rng.gen_range(0.0..360.0),
        };
        self.set_orientation(orientation);
        self.prev_orientation = self.orientation;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn position(&self) -> Vector3 {
        self.shape.center()
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    pub fn prev_position(&self) -> Vector3 {
        self.prev_position
    }

    pub fn prev_orientation(&self) -> f64 {
        self.prev_orientation
    }

    pub fn forward_vector(&self) -> Vector3 {
        self.forward_vector
    }

    pub fn max_linear(&self) -> f64 {
        self.max_linear
    }

    pub fn max_angular(&self) -> f64 {
        self.max_angular
    }

    pub fn is_static(&self) -> bool {
        self.config.is_static
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    pub fn messaging(&self) -> Option<&MessagingConfig> {
        self.config.messages.as_ref()
    }

    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Explicit start position from the configuration, if any.
    pub fn configured_position(&self) -> Option<Vector3> {
        self.config
            .positions
            .get(self.id)
            .map(|[x, y]| Vector3::new(*x, *y, self.shape.rest_height()))
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.shape.translate(position);
        self.prev_position = self.shape.center();
    }

    pub fn set_orientation(&mut self, degrees: f64) {
        self.orientation = wrap_degrees(degrees);
        self.shape.set_rotation(self.orientation);
    }

    /// Settles `prev_*` on the placed pose and runs the policy burn-in.
    pub fn prepare(
        &mut self,
        arena: &Shape,
        objects: &BTreeMap<String, Vec<ObjectState>>,
    ) -> DomainResult<()> {
        self.prev_position = self.position();
        self.prev_orientation = self.orientation;
        let ctx = PolicyContext {
            tick: 0,
            position: self.position(),
            orientation: self.orientation,
            max_turn: self.max_angular,
            shape: &self.shape,
            arena,
            objects,
            peers: &[],
        };
        self.policy.prepare(&ctx, &mut self.rng)
    }

    /// One tick of decision and motion.
    pub fn step(
        &mut self,
        tick: u64,
        arena: &Shape,
        objects: &BTreeMap<String, Vec<ObjectState>>,
        peers: &[PeerView],
    ) -> DomainResult<()> {
        self.prev_position = self.position();
        self.prev_orientation = self.orientation;

        let ctx = PolicyContext {
            tick,
            position: self.position(),
            orientation: self.orientation,
            max_turn: self.max_angular,
            shape: &self.shape,
            arena,
            objects,
            peers,
        };
        let decision = self.policy.decide(&ctx, &mut self.rng)?;

        self.set_orientation(self.orientation + decision.turn_degrees);
        self.speed = if self.config.is_static {
            0.0
        } else {
            self.max_linear * decision.speed_fraction.clamp(0.0, 1.0)
        };
        self.forward_vector = Vector3::heading(self.orientation) * self.speed;
        if self.speed > 0.0 {
            let next = self.position() + self.forward_vector;
            self.shape.translate(next);
        }
        Ok(())
    }

    /// Applies the detector's answer for this tick. `None` keeps the move.
    pub fn post_step(&mut self, correction: Option<Vector3>) {
        if let Some(position) = correction {
            let z = self.position().z;
            self.shape.translate(position.with_z(z));
        }
    }

    /// Collision input: the post-move shape, with the pre-move position as
    /// the base any correction starts from.
    pub fn collision_body(&self) -> CollisionBody {
        CollisionBody {
            name: self.name.clone(),
            shape: self.shape.clone(),
            max_speed: self.max_linear,
            heading_vector: self.forward_vector,
            position: self.prev_position,
        }
    }

    pub fn state(&self) -> AgentState {
        AgentState {
            name: self.name.clone(),
            shape: self.shape.clone(),
            position: self.position(),
            orientation: self.orientation,
            forward_vector: self.forward_vector,
            max_speed: self.max_linear,
            lattice: self.policy.lattice_states(),
        }
    }

    pub fn peer_view(&self) -> PeerView {
        PeerView {
            name: self.name.clone(),
            position: self.position(),
            radius: self.shape.footprint_radius(),
        }
    }

    /// Messages to send on `tick`: a fresh status message plus, for
    /// rebroadcast delivery, relays of everything heard since the last send.
    pub fn outgoing(&mut self, tick: u64) -> Vec<Message> {
        let Some(messaging) = self.messaging() else {
            return Vec::new();
        };
        let position = self.position();
        let mut out = vec![Message::new(
            tick,
            json!({
                "tick": tick,
                "position": [position.x, position.y],
                "orientation": self.orientation,
            }),
        )];
        if messaging.delivery == Delivery::Rebroadcast {
            let max_hops = messaging.max_hops;
            out.extend(
                std::mem::take(&mut self.relay)
                    .iter()
                    .filter(|m| m.hops < max_hops)
                    .map(Message::relayed),
            );
        }
        out
    }

    /// Replaces the inbox with this tick's mail. Under rebroadcast delivery
    /// the mail is also queued for forwarding.
    pub fn receive(&mut self, messages: Vec<Message>) {
        if self.messaging().is_some_and(|m| m.delivery == Delivery::Rebroadcast) {
            self.relay.extend(messages.iter().cloned());
        }
        self.inbox = messages;
    }

    /// Messages waiting to be forwarded.
    pub fn relay_queue(&self) -> &[Message] {
        &self.relay
    }

    pub fn inbox(&self) -> &[Message] {
        &self.inbox
    }

    /// Frees per-run state at stage close.
    pub fn close(&mut self) {
        self.inbox.clear();
        self.relay.clear();
    }
}
