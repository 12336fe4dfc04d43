use crate::common::{DomainError, DomainResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dynamics {
    Metropolis,
    Glauber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinLatticeParams {
    pub num_groups: usize,
    pub num_spins_per_group: usize,
    pub temperature: f64,
    pub coupling: f64,
    pub nu: f64,
    pub p_spin_up: f64,
    /// Number of past states kept for delayed energy evaluation; 0 disables it.
    pub time_delay: usize,
    pub dynamics: Dynamics,
    pub dt: f64,
    pub tau: f64,
}

impl Default for SpinLatticeParams {
    fn default() -> Self {
        Self {
            num_groups: 12,
            num_spins_per_group: 10,
            temperature: 0.5,
            coupling: 1.0,
            nu: 0.5,
            p_spin_up: 0.5,
            time_delay: 0,
            dynamics: Dynamics::Metropolis,
            dt: 0.1,
            tau: 33.0,
        }
    }
}

impl SpinLatticeParams {
    pub fn validate(&self, subject: &str) -> DomainResult<()> {
        if self.num_groups == 0 || self.num_spins_per_group == 0 {
            return Err(DomainError::configuration(subject, "lattice needs at least one group and one unit per group"));
        }
        if !(0.0..=1.0).contains(&self.p_spin_up) {
            return Err(DomainError::configuration(subject, "p_spin_up must lie in [0, 1]"));
        }
        if self.temperature < 0.0 || self.tau <= 0.0 {
            return Err(DomainError::configuration(subject, "temperature must be >= 0 and tau > 0"));
        }
        Ok(())
    }
}

/// Ising-like ring of binary units, each tuned to a fixed direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinLattice {
    params: SpinLatticeParams,
    spins: Vec<u8>,
    angles: Vec<f64>,
    couplings: Vec<f64>,
    external_field: Vec<f64>,
    history: VecDeque<Vec<u8>>,
}

impl SpinLattice {
    pub fn new<R: Rng + ?Sized>(params: SpinLatticeParams, rng: &mut R) -> Self {
        let groups = params.num_groups.max(1);
        let units = params.num_spins_per_group.max(1);
        let n = groups * units;

        let angles: Vec<f64> = (0..groups)
            .flat_map(|g| std::iter::repeat(TAU * g as f64 / groups as f64).take(units))
            .collect();

        let mut couplings = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let mut diff = (angles[i] - angles[j]).abs();
                diff = diff.min(TAU - diff);
                couplings[i * n + j] = (PI * (diff / PI).powf(params.nu)).cos();
            }
        }

        let mut lattice = Self {
            params,
            spins: vec![0; n],
            angles,
            couplings,
            external_field: vec![0.0; n],
            history: VecDeque::new(),
        };
        lattice.seed(rng);
        lattice
    }

    fn seed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let p = self.params.p_spin_up;
        for spin in self.spins.iter_mut() {
            *spin = u8::from(rng.gen::<f64>() < p);
        }
        self.history.clear();
        self.history.push_back(self.spins.clone());
    }

    pub fn params(&self) -> &SpinLatticeParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.spins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    pub fn num_groups(&self) -> usize {
        self.params.num_groups.max(1)
    }

    pub fn num_spins_per_group(&self) -> usize {
        self.params.num_spins_per_group.max(1)
    }

    /// Fixed preferred angle of every unit, flattened group-major.
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn states(&self) -> &[u8] {
        &self.spins
    }

    pub fn state(&self, group: usize, unit: usize) -> u8 {
        self.spins[group * self.num_spins_per_group() + unit]
    }

    pub fn external_field(&self) -> &[f64] {
        &self.external_field
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn set_states(&mut self, states: &[u8]) -> DomainResult<()> {
        if states.len() != self.spins.len() {
            return Err(DomainError::InvalidState {
                reason: format!(
                    "expected {} spin states, got {}",
                    self.spins.len(),
                    states.len()
                ),
            });
        }
        self.spins = states.iter().map(|s| u8::from(*s != 0)).collect();
        self.record_history();
        Ok(())
    }

    pub fn update_external_field(&mut self, field: &[f64]) -> DomainResult<()> {
        if field.len() != self.external_field.len() {
            return Err(DomainError::InvalidState {
                reason: format!(
                    "expected {} field values, got {}",
                    self.external_field.len(),
                    field.len()
                ),
            });
        }
        self.external_field.copy_from_slice(field);
        Ok(())
    }

    /// Full Hamiltonian of `state` under the current couplings and field.
    pub fn hamiltonian(&self, state: &[u8]) -> f64 {
        let n = state.len();
        let scale = self.params.coupling / n as f64;
        let mut interactions = 0.0;
        for i in 0..n {
            if state[i] == 0 {
                continue;
            }
            for j in (i + 1)..n {
                if state[j] != 0 {
                    interactions += self.couplings[i * n + j];
                }
            }
        }
        let field: f64 = state
            .iter()
            .zip(&self.external_field)
            .map(|(s, h)| f64::from(*s) * h)
            .sum();
        -scale * interactions - field
    }

    /// Energy change of flipping unit `idx` in `state`.
    pub fn flip_delta(&self, state: &[u8], idx: usize) -> f64 {
        let n = state.len();
        let ds = if state[idx] == 0 { 1.0 } else { -1.0 };
        let row = &self.couplings[idx * n..(idx + 1) * n];
        let neighbours: f64 = state
            .iter()
            .zip(row)
            .enumerate()
            .filter(|(k, (s, _))| *k != idx && **s != 0)
            .map(|(_, (_, j))| *j)
            .sum();
        -(self.params.coupling / n as f64) * ds * neighbours - self.external_field[idx] * ds
    }

    /// Probability of accepting a proposed flip with energy change `delta_h`.
    pub fn acceptance_probability(&self, delta_h: f64) -> f64 {
        let t = self.params.temperature;
        match self.params.dynamics {
            Dynamics::Metropolis => {
                if delta_h <= 0.0 {
                    1.0
                } else {
                    (-delta_h / t).exp()
                }
            }
            Dynamics::Glauber => {
                let rate = (self.num_groups() * self.num_spins_per_group()) as f64
                    * self.params.dt
                    / self.params.tau;
                (rate / (1.0 + (delta_h / t).exp())).min(1.0)
            }
        }
    }

    /// Proposes flipping one uniformly chosen unit. Returns whether the flip
    /// was accepted.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let units = self.num_spins_per_group();
        let group = rng.gen_range(0..self.num_groups());
        let unit = rng.gen_range(0..units);
        let idx = group * units + unit;

        let delta_h = if self.params.time_delay > 0 {
            match self.history.front() {
                Some(oldest) => {
                    let mut reference = oldest.clone();
                    reference[idx] = self.spins[idx];
                    self.flip_delta(&reference, idx)
                }
                None => self.flip_delta(&self.spins, idx),
            }
        } else {
            self.flip_delta(&self.spins, idx)
        };

        let p = self.acceptance_probability(delta_h);
        let accepted = p >= 1.0 || rng.gen::<f64>() < p;
        if accepted {
            self.spins[idx] ^= 1;
        }
        if self.params.time_delay > 0 {
            self.record_history();
        }
        accepted
    }

    pub fn run<R: Rng + ?Sized>(&mut self, steps: usize, rng: &mut R) -> &[u8] {
        for _ in 0..steps {
            self.step(rng);
        }
        &self.spins
    }

    /// Burn-in: runs `steps`, then re-seeds from the resulting mean activity
    /// and forgets the history.
    pub fn pre_run<R: Rng + ?Sized>(&mut self, steps: usize, rng: &mut R) {
        if steps == 0 {
            return;
        }
        self.run(steps, rng);
        self.params.p_spin_up = self.mean_activity();
        self.seed(rng);
    }

    pub fn mean_activity(&self) -> f64 {
        let active = self.spins.iter().filter(|s| **s == 1).count();
        active as f64 / self.spins.len() as f64
    }

    fn record_history(&mut self) {
        self.history.push_back(self.spins.clone());
        let cap = self.params.time_delay.max(1);
        while self.history.len() > cap {
            self.history.pop_front();
        }
    }

    fn active_angles(&self) -> impl Iterator<Item = f64> + '_ {
        self.spins
            .iter()
            .zip(&self.angles)
            .filter(|(s, _)| **s == 1)
            .map(|(_, a)| *a)
    }

    fn active_resultant(&self) -> (f64, f64, usize) {
        self.active_angles().fold((0.0, 0.0, 0), |(x, y, n), a| {
            (x + a.cos(), y + a.sin(), n + 1)
        })
    }

    /// Circular mean of the active units' angles, in (-PI, PI]. `None` when
    /// every unit is active or when the active units cancel out.
    pub fn average_direction_of_activity(&self) -> Option<f64> {
        if self.spins.iter().all(|s| *s == 1) {
            return None;
        }
        let (x, y, n) = self.active_resultant();
        if n == 0 || (x == 0.0 && y == 0.0) {
            return None;
        }
        Some(y.atan2(x))
    }

    /// Circular standard deviation of the active units' angles. `None`
    /// with fewer than two active units.
    pub fn width_of_activity(&self) -> Option<f64> {
        let (x, y, n) = self.active_resultant();
        if n < 2 {
            return None;
        }
        let r = x.hypot(y) / n as f64;
        if r > 0.0 {
            Some((-2.0 * r.ln()).max(0.0).sqrt())
        } else {
            Some(PI)
        }
    }
}

/// Maps the width of activity onto a speed fraction: a focused bump moves
/// at full speed, a dispersed one barely moves.
pub fn speed_fraction_from_width(width: Option<f64>) -> f64 {
    match width {
        Some(w) => (1.0 - w / PI).clamp(0.0, 1.0),
        None => 1.0,
    }
}
