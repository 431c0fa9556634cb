//! A general-purpose inverter chain driving a gate load through a wire.

use serde::{Deserialize, Serialize};

use super::gate::sizing::{ChainSizer, StageChain};
use super::gate::GateType;
use super::timing::{ChainModel, OutputLoad, PathTiming};
use super::{Area, Footprint, PowerComponents};
use crate::tech::TechParams;
use crate::Result;

pub struct SignalDriver<'a> {
    tech: &'a TechParams,
    c_gate_load: f64,
    c_wire_load: f64,
    r_wire_load: f64,
    is_dram: bool,
    chain: StageChain,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverTiming {
    pub delay: f64,
    /// Rise time at the far end of the driven wire.
    pub rise_time: f64,
    pub power: PowerComponents,
}

impl<'a> SignalDriver<'a> {
    pub fn new(
        c_gate_load: f64,
        c_wire_load: f64,
        r_wire_load: f64,
        is_dram: bool,
        tech: &'a TechParams,
    ) -> Result<Self> {
        let head = GateType::Inv.min_size(tech.min_w_nmos, tech.pn_ratio(is_dram, false));
        let chain = ChainSizer::new(tech)
            .with_device(is_dram, false)
            .size(head, GateType::Inv.logical_effort(0.0), c_gate_load + c_wire_load)?;
        log::debug!(
            "signal driver: {} stages for {:.3e} F load",
            chain.len(),
            c_gate_load + c_wire_load
        );

        Ok(Self {
            tech,
            c_gate_load,
            c_wire_load,
            r_wire_load,
            is_dram,
            chain,
        })
    }

    #[inline]
    pub fn num_gates(&self) -> usize {
        self.chain.len()
    }

    #[inline]
    pub fn chain(&self) -> &StageChain {
        &self.chain
    }

    fn model(&self) -> ChainModel<'a> {
        ChainModel::peripheral(self.tech, self.is_dram)
    }

    pub fn area(&self) -> Area {
        let Footprint { area, .. } = self.model().chain_footprint(&self.chain, GateType::Inv, 0);
        Area::with_height(area, self.tech.cell_h_def)
    }

    /// Delay through the chain and the wire it drives.
    ///
    /// Every stage is charged at the core supply. Leakage counts each stage at
    /// half weight, since only one of its two transistors leaks at a time.
    pub fn compute_delay(&self, input_rise: f64) -> DriverTiming {
        let vdd = self.tech.vdd();
        let out = OutputLoad {
            c_load: self.c_gate_load + self.c_wire_load,
            wire_tf: self.r_wire_load * (self.c_wire_load / 2.0 + self.c_gate_load),
        };

        let mut timing = PathTiming::start(input_rise);
        let mut power = PowerComponents::default();
        self.model()
            .propagate(&self.chain, GateType::Inv, 0, out, &mut timing, |v| {
                power.dynamic += v.switching_energy(vdd);
                power.leakage +=
                    self.tech.leakage_current(GateType::Inv, v.stage.w_n, v.stage.w_p) * 0.5 * vdd;
            });

        DriverTiming {
            delay: timing.delay,
            rise_time: timing.rise_time,
            power,
        }
    }
}
