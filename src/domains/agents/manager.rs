use crate::common::{
    AgentSnapshot, Corrections, DetectorInput, DomainError, DomainResult, ObjectState,
    SNAPSHOT_VERSION,
};
use crate::config::AgentGroupConfig;
use crate::domains::geometry::{Density, Shape};
use crate::domains::messaging::{Delivery, MessageBus};
use crate::domains::placement::place;
use crate::domains::spatial::GridEntry;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::debug;

use super::agent::Agent;
use super::perception::PeerView;

/// Owns every agent of the experiment and one message bus per agent type
/// with messaging enabled.
pub struct AgentManager {
    groups: BTreeMap<String, AgentGroupConfig>,
    ticks_per_second: u32,
    agents: BTreeMap<String, Vec<Agent>>,
    buses: BTreeMap<String, MessageBus>,
}

impl AgentManager {
    pub fn new(groups: BTreeMap<String, AgentGroupConfig>, ticks_per_second: u32) -> Self {
        Self {
            groups,
            ticks_per_second,
            agents: BTreeMap::new(),
            buses: BTreeMap::new(),
        }
    }

    pub fn agents(&self) -> &BTreeMap<String, Vec<Agent>> {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut BTreeMap<String, Vec<Agent>> {
        &mut self.agents
    }

    pub fn bus(&self, group: &str) -> Option<&MessageBus> {
        self.buses.get(group)
    }

    pub fn find(&self, name: &str) -> Option<&Agent> {
        self.agents.values().flatten().find(|a| a.name() == name)
    }

    /// Creates the agents on the first run and resets them on later ones,
    /// then places every agent without a configured position.
    pub fn initialize(
        &mut self,
        run_seed: u64,
        arena: &Shape,
        objects: &BTreeMap<String, Vec<ObjectState>>,
    ) -> DomainResult<()> {
        if self.agents.is_empty() {
            for (group, config) in &self.groups {
                let list = (0..config.number)
                    .map(|id| Agent::new(group, id, config, self.ticks_per_second, run_seed))
                    .collect::<DomainResult<Vec<_>>>()?;
                self.agents.insert(group.clone(), list);
            }
        } else {
            for agent in self.agents.values_mut().flatten() {
                agent.reset(run_seed);
            }
        }

        self.place_all(arena, objects)?;

        for agent in self.agents.values_mut().flatten() {
            agent.prepare(arena, objects)?;
        }

        self.buses.clear();
        for (group, config) in &self.groups {
            if let Some(messaging) = config.messages.as_ref().filter(|m| m.enable) {
                let members = self.agents[group].iter().map(|a| a.name().to_string());
                let mut bus = MessageBus::new(messaging.clone(), members)?;
                bus.reset_mailboxes();
                self.buses.insert(group.clone(), bus);
            }
        }
        Ok(())
    }

    fn place_all(
        &mut self,
        arena: &Shape,
        objects: &BTreeMap<String, Vec<ObjectState>>,
    ) -> DomainResult<()> {
        let mut placed: Vec<Shape> = Vec::new();
        for agent in self.agents.values_mut().flatten() {
            let name = agent.name().to_string();
            if let Some(position) = agent.configured_position() {
                agent.set_position(position);
                placed.push(agent.shape().clone());
                continue;
            }
            let density = agent.shape().density();
            let obstacles: Vec<&Shape> = placed
                .iter()
                .filter(|s| s.density() == density)
                .chain(
                    objects
                        .values()
                        .flatten()
                        .map(|o| &o.shape)
                        .filter(|s| s.density() == Density::Dense || s.density() == density),
                )
                .collect();
            let mut shape = agent.shape().clone();
            place(&mut shape, agent.rng_mut(), arena, &obstacles, &name)?;
            agent.set_position(shape.center());
            placed.push(agent.shape().clone());
        }
        Ok(())
    }

    fn grid_entries(&self) -> Vec<GridEntry> {
        self.agents
            .values()
            .flatten()
            .enumerate()
            .map(|(id, a)| GridEntry {
                id,
                name: a.name().to_string(),
                position: a.position(),
            })
            .collect()
    }

    /// Rebuilds every bus grid, lets due agents send, then hands every
    /// member its mailbox.
    pub fn exchange_messages(&mut self, tick: u64) {
        if self.buses.is_empty() {
            return;
        }
        let entries = self.grid_entries();
        for bus in self.buses.values_mut() {
            bus.update_grid(entries.iter().cloned());
        }

        let mut sent = 0;
        let mut id = 0;
        for (group, agents) in self.agents.iter_mut() {
            let Some(bus) = self.buses.get_mut(group) else {
                id += agents.len();
                continue;
            };
            let due = bus.config().should_send(tick, self.ticks_per_second);
            for agent in agents.iter_mut() {
                if due {
                    for mut message in agent.outgoing(tick) {
                        if bus.config().delivery == Delivery::HandShake {
                            let candidates: Vec<String> = bus
                                .neighbors(id)
                                .into_iter()
                                .filter(|n| bus.is_member(&n.name))
                                .map(|n| n.name.clone())
                                .collect();
                            match candidates.choose(agent.rng_mut()) {
                                Some(to) => message = message.addressed_to(to),
                                None => continue,
                            }
                        }
                        sent += bus.send(id, agent.name(), message);
                    }
                }
                id += 1;
            }
        }

        for (group, agents) in self.agents.iter_mut() {
            if let Some(bus) = self.buses.get_mut(group) {
                for agent in agents.iter_mut() {
                    agent.receive(bus.receive(agent.name()));
                }
            }
        }
        debug!(tick, delivered = sent, "messages exchanged");
    }

    /// Messaging, then every agent's decision and move.
    pub fn step(
        &mut self,
        tick: u64,
        arena: &Shape,
        objects: &BTreeMap<String, Vec<ObjectState>>,
    ) -> DomainResult<()> {
        self.exchange_messages(tick);
        let peers: Vec<PeerView> = self.agents.values().flatten().map(Agent::peer_view).collect();
        for agent in self.agents.values_mut().flatten() {
            let others: Vec<PeerView> = peers
                .iter()
                .filter(|p| p.name != agent.name())
                .cloned()
                .collect();
            agent.step(tick, arena, objects, &others)?;
        }
        Ok(())
    }

    pub fn snapshot(&self, run: u32, tick: u64) -> AgentSnapshot {
        AgentSnapshot {
            version: SNAPSHOT_VERSION,
            run,
            tick,
            agents: self
                .agents
                .iter()
                .map(|(group, list)| (group.clone(), list.iter().map(Agent::state).collect()))
                .collect(),
        }
    }

    pub fn detector_input(&self, run: u32, tick: u64) -> DetectorInput {
        DetectorInput {
            version: SNAPSHOT_VERSION,
            run,
            tick,
            agents: self
                .agents
                .iter()
                .map(|(group, list)| {
                    (group.clone(), list.iter().map(Agent::collision_body).collect())
                })
                .collect(),
        }
    }

    pub fn apply_corrections(&mut self, corrections: &Corrections, run: u32, tick: u64) -> DomainResult<()> {
        if corrections.run != run || corrections.tick != tick {
            return Err(DomainError::InvalidState {
                reason: format!(
                    "corrections for run {} tick {} arrived at run {} tick {}",
                    corrections.run, corrections.tick, run, tick
                ),
            });
        }
        for (group, agents) in self.agents.iter_mut() {
            for (index, agent) in agents.iter_mut().enumerate() {
                agent.post_step(corrections.for_agent(group, index));
            }
        }
        Ok(())
    }

    /// Releases lattices, mailboxes and grids.
    pub fn close(&mut self) {
        for agent in self.agents.values_mut().flatten() {
            agent.close();
        }
        for bus in self.buses.values_mut() {
            bus.close();
        }
        self.agents.clear();
        self.buses.clear();
    }
}
