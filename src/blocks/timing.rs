//! Stage-by-stage RC propagation through sized gate chains.

use serde::{Deserialize, Serialize};

use super::gate::sizing::{Stage, StageChain};
use super::gate::{GateType, StageRc};
use super::Footprint;
use crate::tech::{horowitz, Edge, TechParams};

/// Switching threshold used for every stage, as a fraction of the supply.
pub const VTH_FRACTION: f64 = 0.5;

/// Delay accumulated along a path and the rise time at its current end.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTiming {
    pub delay: f64,
    pub rise_time: f64,
}

impl PathTiming {
    /// A path with no delay yet, driven by an edge of the given rise time.
    #[inline]
    pub fn start(input_rise: f64) -> Self {
        Self {
            delay: 0.0,
            rise_time: input_rise,
        }
    }

    /// Propagates the path through one stage with time constant `tf`.
    /// Returns the delay of that stage.
    pub fn advance(&mut self, tf: f64) -> f64 {
        let delay = horowitz(self.rise_time, tf, VTH_FRACTION, VTH_FRACTION, Edge::Rise);
        self.delay += delay;
        self.rise_time = delay / (1.0 - VTH_FRACTION);
        delay
    }
}

/// What the last stage of a chain drives.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct OutputLoad {
    pub c_load: f64,
    /// Extra time constant contributed by the output wire.
    pub wire_tf: f64,
}

impl OutputLoad {
    #[inline]
    pub fn lumped(c_load: f64) -> Self {
        Self {
            c_load,
            wire_tf: 0.0,
        }
    }

    /// A load at the far end of a distributed RC wire.
    #[inline]
    pub fn distributed(c_load: f64, r_wire: f64) -> Self {
        Self {
            c_load,
            wire_tf: r_wire * c_load / 2.0,
        }
    }
}

/// One stage visited during propagation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StageVisit {
    pub index: usize,
    pub stage: Stage,
    pub c_load: f64,
    pub c_int: f64,
    /// Whether this stage drives the chain output.
    pub is_last: bool,
}

impl StageVisit {
    /// Energy to charge the stage output at a single supply.
    #[inline]
    pub fn switching_energy(&self, vdd: f64) -> f64 {
        (self.c_load + self.c_int) * vdd * vdd
    }
}

/// The electrical environment of a family of gates: which devices they use
/// and the height they are folded into.
#[derive(Debug, Copy, Clone)]
pub struct ChainModel<'a> {
    pub tech: &'a TechParams,
    pub height: f64,
    pub is_dram: bool,
    pub is_wl_tr: bool,
}

impl<'a> ChainModel<'a> {
    /// Peripheral gates at the default cell height.
    pub fn peripheral(tech: &'a TechParams, is_dram: bool) -> Self {
        Self {
            tech,
            height: tech.cell_h_def,
            is_dram,
            is_wl_tr: false,
        }
    }

    #[inline]
    pub fn rc(&self, gate: GateType, stage: &Stage) -> StageRc {
        gate.rc(self.tech, stage, self.height, self.is_dram, self.is_wl_tr)
    }

    #[inline]
    pub fn input_cap(&self, stage: &Stage) -> f64 {
        stage.input_cap(self.tech, self.is_dram, self.is_wl_tr)
    }

    /// Propagates `timing` through stages `start..` of `chain`.
    ///
    /// Stage 0 is a `head` gate and the rest are inverters. Each stage drives
    /// the input of the next; the last one drives `out`. `visit` is called
    /// once per stage, in order, after its delay has been accumulated.
    pub fn propagate<F>(
        &self,
        chain: &StageChain,
        head: GateType,
        start: usize,
        out: OutputLoad,
        timing: &mut PathTiming,
        mut visit: F,
    ) where
        F: FnMut(&StageVisit),
    {
        let stages = chain.stages();
        for (index, stage) in stages.iter().enumerate().skip(start) {
            let gate = if index == 0 { head } else { GateType::Inv };
            let rc = self.rc(gate, stage);
            let (c_load, wire_tf, is_last) = match stages.get(index + 1) {
                Some(next) => (self.input_cap(next), 0.0, false),
                None => (out.c_load, out.wire_tf, true),
            };
            timing.advance(rc.tf(c_load) + wire_tf);
            visit(&StageVisit {
                index,
                stage: *stage,
                c_load,
                c_int: rc.c_int,
                is_last,
            });
        }
    }

    /// Area and stacked off-current of one gate.
    pub fn gate_footprint(&self, gate: GateType, stage: &Stage) -> Footprint {
        Footprint {
            area: self
                .tech
                .gate_area(gate, stage.w_p, stage.w_n, self.height),
            i_leak: self.tech.leakage_current(gate, stage.w_n, stage.w_p),
        }
    }

    /// Area and stacked off-current of stages `start..` of `chain`.
    pub fn chain_footprint(&self, chain: &StageChain, head: GateType, start: usize) -> Footprint {
        chain
            .stages()
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, stage)| {
                let gate = if i == 0 { head } else { GateType::Inv };
                self.gate_footprint(gate, stage)
            })
            .fold(Footprint::default(), |acc, fp| acc + fp)
    }
}
