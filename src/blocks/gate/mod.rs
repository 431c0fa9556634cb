use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::tech::{Channel, LeakStackFactors, TechParams};

use self::sizing::Stage;

pub mod sizing;

/// The static CMOS gates that make up a decode path.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GateType {
    Inv,
    Nand2,
    Nand3,
    Nor2,
}

/// Switching resistance and self-loading of a sized gate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StageRc {
    /// Equivalent pull-down resistance.
    pub r_on: f64,
    /// Drain capacitance at the gate output.
    pub c_int: f64,
}

impl StageRc {
    /// Time constant of the gate driving `c_load`.
    #[inline]
    pub fn tf(&self, c_load: f64) -> f64 {
        self.r_on * (self.c_int + c_load)
    }
}

impl GateType {
    pub fn fan_in(&self) -> usize {
        match self {
            GateType::Inv => 1,
            GateType::Nand2 | GateType::Nor2 => 2,
            GateType::Nand3 => 3,
        }
    }

    /// Logical effort of the gate for a given PMOS/NMOS sizing ratio.
    pub fn logical_effort(&self, pn_ratio: f64) -> f64 {
        match self {
            GateType::Inv => 1.0,
            GateType::Nand2 | GateType::Nand3 => {
                (self.fan_in() as f64 + pn_ratio) / (1.0 + pn_ratio)
            }
            GateType::Nor2 => (1.0 + 2.0 * pn_ratio) / (1.0 + pn_ratio),
        }
    }

    pub fn leak_stack_factor(&self, factors: &LeakStackFactors) -> f64 {
        match self {
            GateType::Inv => factors.inv,
            GateType::Nand2 => factors.nand2,
            GateType::Nand3 => factors.nand3,
            GateType::Nor2 => factors.nor2,
        }
    }

    /// Number of series transistors in the pull-down and pull-up networks.
    pub fn series_stacks(&self) -> (usize, usize) {
        match self {
            GateType::Inv => (1, 1),
            GateType::Nand2 | GateType::Nand3 => (self.fan_in(), 1),
            GateType::Nor2 => (1, self.fan_in()),
        }
    }

    /// Minimum-size version of this gate, with series stacks widened so the
    /// gate drives like a minimum inverter.
    pub fn min_size(&self, min_w_nmos: f64, pn_ratio: f64) -> Stage {
        let (n_series, p_series) = self.series_stacks();
        Stage::new(
            n_series as f64 * min_w_nmos,
            p_series as f64 * pn_ratio * min_w_nmos,
        )
    }

    /// Switching resistance and output capacitance of a sized instance of
    /// this gate, folded to `height`.
    pub fn rc(
        &self,
        tech: &TechParams,
        stage: &Stage,
        height: f64,
        is_dram: bool,
        is_wl_tr: bool,
    ) -> StageRc {
        let (n_series, p_series) = self.series_stacks();
        let r_on = tech.on_resistance(stage.w_n, Channel::Nmos, n_series, is_dram, is_wl_tr);

        // Series stacks share one output drain; parallel devices each add theirs.
        let c_p = tech.drain_cap(stage.w_p, Channel::Pmos, p_series, height, is_dram, is_wl_tr);
        let c_n = tech.drain_cap(stage.w_n, Channel::Nmos, n_series, height, is_dram, is_wl_tr);
        let c_int = n_series as f64 * c_p + p_series as f64 * c_n;

        StageRc { r_on, c_int }
    }
}

impl Display for GateType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GateType::Inv => write!(f, "INV"),
            GateType::Nand2 => write!(f, "NAND2"),
            GateType::Nand3 => write!(f, "NAND3"),
            GateType::Nor2 => write!(f, "NOR2"),
        }
    }
}
