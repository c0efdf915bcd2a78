//! 1-D radial impurity transport in a stellarator plasma with an adaptive
//! turbulence-pulse controller.
//!
//! Impurities pile up in the core under neoclassical inward convection;
//! when accumulation is detected the controller fires a short turbulence
//! pulse that enhances outward diffusion at the edge, then holds off for a
//! cooldown period. The recorded history becomes a [`SimulationTrace`].

use crate::signal::SimulationTrace;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulation parameters. All fields default to the reference W7-X case,
/// so a TOML config only needs the fields it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Radial grid points over the normalized minor radius [0, 1].
    pub grid_points: usize,
    /// Time step in seconds.
    pub dt: f64,
    /// Simulated span in seconds.
    pub t_max: f64,
    /// Neoclassical diffusion coefficient (m^2/s).
    pub d_neo: f64,
    /// Base turbulent diffusion coefficient (m^2/s).
    pub d_turb_base: f64,
    /// Neoclassical pinch velocity; negative is inward.
    pub v_neo: f64,
    /// Pulse length in seconds.
    pub pulse_duration: f64,
    /// Minimum wait after a pulse before the next may fire.
    pub cooldown: f64,
    /// Center density above which a pulse fires (m^-3).
    pub accumulation_limit: f64,
    /// Center growth rate above which a pulse fires (m^-3 per s).
    pub growth_rate_limit: f64,
    /// Recorded-sample window for the growth-rate estimate.
    pub growth_window: usize,
    /// Impurity influx outside r = 0.85 (m^-3 per s).
    pub edge_source: f64,
    /// Turbulence amplification outside r = 0.7 during a pulse.
    pub pulse_factor: f64,
    /// Normalized radius of the recorded turbulence channel.
    pub monitor_radius: f64,
    /// Steps between log progress lines.
    pub progress_every: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_points: 101,
            dt: 2e-5,
            t_max: 10.0,
            d_neo: 0.02,
            d_turb_base: 1.5,
            v_neo: -0.5,
            pulse_duration: 0.2,
            cooldown: 0.5,
            accumulation_limit: 8e17,
            growth_rate_limit: 1.5e18,
            growth_window: 100,
            edge_source: 2.5e17,
            pulse_factor: 5.0,
            monitor_radius: 0.8,
            progress_every: 10_000,
        }
    }
}

/// Load a simulation config from TOML.
pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: SimConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfinementMode {
    Normal,
    TurbulencePulse,
}

/// Plasma state on the radial grid plus the controller bookkeeping.
pub struct Stellarator {
    config: SimConfig,
    radius: Vec<f64>,
    dr: f64,
    impurity_density: Vec<f64>,
    electron_density: Vec<f64>,
    electron_temp: Vec<f64>,
    mode: ConfinementMode,
    time: f64,
    pulse_started: Option<f64>,
    last_pulse_ended: Option<f64>,
    monitor_index: usize,
    trace: SimulationTrace,
}

impl Stellarator {
    pub fn new(config: SimConfig) -> Self {
        let nr = config.grid_points.max(3);
        let dr = 1.0 / (nr - 1) as f64;
        let radius: Vec<f64> = (0..nr).map(|i| i as f64 / (nr - 1) as f64).collect();
        let monitor_index = ((config.monitor_radius / dr).round() as usize).min(nr - 2);

        let mut state = Self {
            config,
            radius,
            dr,
            impurity_density: vec![0.0; nr],
            electron_density: vec![0.0; nr],
            electron_temp: vec![0.0; nr],
            mode: ConfinementMode::Normal,
            time: 0.0,
            pulse_started: None,
            last_pulse_ended: None,
            monitor_index,
            trace: SimulationTrace::default(),
        };
        state.initialize_profiles();
        state
    }

    pub fn mode(&self) -> ConfinementMode {
        self.mode
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn center_impurity(&self) -> f64 {
        self.impurity_density[0]
    }

    pub fn edge_impurity(&self) -> f64 {
        self.impurity_density[self.impurity_density.len() - 1]
    }

    /// Parabolic background profiles with an edge-hollow impurity seed.
    fn initialize_profiles(&mut self) {
        for (i, &r) in self.radius.iter().enumerate() {
            self.electron_density[i] = 8e19 * (1.0 - r * r);
            self.electron_temp[i] = 8.0 * (1.0 - r * r);
            self.impurity_density[i] = 1e18 * (0.2 + 0.8 * r * r);
        }
    }

    /// ITG-style local turbulence level from the gradient lengths.
    /// Near-marginal eta suppresses transport; a pulse amplifies the edge.
    pub fn turbulence_level(&self, r_idx: usize) -> f64 {
        let nr = self.radius.len();
        let r = self.radius[r_idx];
        if r < 0.02 || r > 0.98 || r_idx == 0 || r_idx >= nr - 1 {
            return 0.05;
        }

        let dn_dr =
            (self.electron_density[r_idx + 1] - self.electron_density[r_idx - 1]) / (2.0 * self.dr);
        let dt_dr =
            (self.electron_temp[r_idx + 1] - self.electron_temp[r_idx - 1]) / (2.0 * self.dr);

        let ln = (self.electron_density[r_idx] / dn_dr.abs().max(1e-10)).abs();
        let lt = (self.electron_temp[r_idx] / dt_dr.abs().max(1e-10)).abs();
        let eta = (ln / lt).clamp(0.1, 10.0);

        let factor = match self.mode {
            ConfinementMode::Normal => {
                if eta > 0.8 && eta < 1.2 {
                    0.3
                } else {
                    1.0
                }
            }
            ConfinementMode::TurbulencePulse => {
                if r > 0.7 {
                    self.config.pulse_factor
                } else {
                    1.0
                }
            }
        };

        self.config.d_turb_base * factor
    }

    /// Radial impurity flux at a grid point: pinch plus diffusion.
    fn flux(&self, r_idx: usize) -> f64 {
        if r_idx == 0 || r_idx >= self.radius.len() - 1 {
            return 0.0;
        }
        let n_z = self.impurity_density[r_idx];
        let dn_z_dr =
            (self.impurity_density[r_idx + 1] - self.impurity_density[r_idx - 1]) / (2.0 * self.dr);
        let d_total = self.config.d_neo + self.turbulence_level(r_idx);
        self.config.v_neo * n_z - d_total * dn_z_dr
    }

    /// Fire on absolute center density, or on its growth rate over the
    /// recent recorded window.
    fn accumulation_detected(&self) -> bool {
        if self.impurity_density[0] > self.config.accumulation_limit {
            return true;
        }
        let window = self.config.growth_window;
        let recorded = self.trace.center_impurity.len();
        if window > 0 && recorded > window {
            let last = recorded - 1;
            let prev = last - window;
            let dt = self.trace.time[last] - self.trace.time[prev];
            if dt > 0.0 {
                let rate = (self.trace.center_impurity[last] - self.trace.center_impurity[prev]) / dt;
                if rate > self.config.growth_rate_limit {
                    return true;
                }
            }
        }
        false
    }

    fn update_controller(&mut self) {
        match self.mode {
            ConfinementMode::Normal => {
                let can_pulse = match self.last_pulse_ended {
                    Some(ended) => self.time - ended > self.config.cooldown,
                    None => true,
                };
                if can_pulse && self.accumulation_detected() {
                    info!("t={:.3}s: impurity accumulation, starting pulse", self.time);
                    self.mode = ConfinementMode::TurbulencePulse;
                    self.pulse_started = Some(self.time);
                }
            }
            ConfinementMode::TurbulencePulse => {
                if let Some(started) = self.pulse_started {
                    if self.time - started > self.config.pulse_duration {
                        info!(
                            "t={:.3}s: pulse complete, cooling down {:.1}s",
                            self.time, self.config.cooldown
                        );
                        self.mode = ConfinementMode::Normal;
                        self.last_pulse_ended = Some(self.time);
                        self.pulse_started = None;
                    }
                }
            }
        }
    }

    /// One explicit step of the cylindrical flux-divergence update, then
    /// record the monitored channels.
    pub fn step(&mut self, dt: f64) {
        self.update_controller();

        let nr = self.radius.len();
        let mut next = self.impurity_density.clone();
        for i in 1..nr - 1 {
            let r = self.radius[i];
            let flux_p = self.flux(i);
            let flux_m = self.flux(i - 1);

            let r_p = r + 0.5 * self.dr;
            let r_m = r - 0.5 * self.dr;
            let div_flux = if r > 0.01 {
                (r_p * flux_p - r_m * flux_m) / (r * self.dr)
            } else {
                (flux_p - flux_m) / self.dr
            };

            let source = if r > 0.85 { self.config.edge_source } else { 0.0 };

            next[i] = (self.impurity_density[i] + (-div_flux + source) * dt).clamp(0.0, 1e20);
        }

        // Zero-gradient core, partially absorbing wall.
        next[0] = next[1];
        next[nr - 1] = 0.3 * next[nr - 2];
        self.impurity_density = next;

        self.trace.time.push(self.time);
        self.trace.center_impurity.push(self.impurity_density[0]);
        self.trace
            .edge_impurity
            .push(self.impurity_density[nr - 1]);
        self.trace
            .turbulence
            .push(self.turbulence_level(self.monitor_index));

        self.time += dt;
    }

    /// Run to `t_max` and hand back the recorded trace.
    pub fn run(mut self) -> SimulationTrace {
        let dt = self.config.dt;
        let mut step = 0usize;
        while self.time < self.config.t_max {
            self.step(dt);
            if self.config.progress_every > 0 && step % self.config.progress_every == 0 {
                debug!(
                    "t={:.2}s n_Z(0)={:.2e} mode={:?}",
                    self.time, self.impurity_density[0], self.mode
                );
            }
            step += 1;
        }
        self.trace
    }
}
