//! Logical-effort sizing of gate chains.
//!
//! A chain starts with a head gate (NAND, NOR, or inverter) followed by
//! inverters that scale up geometrically toward the load.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::tech::TechParams;
use crate::Result;

pub const MAX_NUMBER_GATES_STAGE: usize = 20;
pub const MIN_NUMBER_GATES_STAGE: usize = 2;

/// Stage effort that minimizes chain delay.
const FOPT: f64 = 4.0;

/// Transistor widths of one gate in a chain, in microns.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub w_n: f64,
    pub w_p: f64,
}

impl Stage {
    #[inline]
    pub fn new(w_n: f64, w_p: f64) -> Self {
        Self { w_n, w_p }
    }

    /// Total gate width seen by the driving stage.
    #[inline]
    pub fn width(&self) -> f64 {
        self.w_n + self.w_p
    }

    #[inline]
    pub fn input_cap(&self, tech: &TechParams, is_dram: bool, is_wl_tr: bool) -> f64 {
        tech.gate_cap(self.width(), is_dram, is_wl_tr)
    }
}

/// An ordered, bounded sequence of gate stages. Stage 0 is the head gate.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageChain {
    stages: Vec<Stage>,
}

impl StageChain {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.len() > MAX_NUMBER_GATES_STAGE {
            return Err(DecodeError::TooManyStages {
                stages: stages.len(),
                max: MAX_NUMBER_GATES_STAGE,
            });
        }
        Ok(Self { stages })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[inline]
    pub fn head(&self) -> Option<&Stage> {
        self.stages.first()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Stage> {
        self.stages.get(idx)
    }
}

/// Sizes gate chains by logical effort.
#[derive(Debug, Copy, Clone)]
pub struct ChainSizer<'a> {
    tech: &'a TechParams,
    min_stages: usize,
    max_w_n: f64,
    is_dram: bool,
    is_wl_tr: bool,
}

impl<'a> ChainSizer<'a> {
    pub fn new(tech: &'a TechParams) -> Self {
        Self {
            tech,
            min_stages: MIN_NUMBER_GATES_STAGE,
            max_w_n: tech.max_w_nmos,
            is_dram: false,
            is_wl_tr: false,
        }
    }

    pub fn with_max_width(mut self, max_w_n: f64) -> Self {
        self.max_w_n = max_w_n;
        self
    }

    pub fn with_min_stages(mut self, min_stages: usize) -> Self {
        self.min_stages = min_stages;
        self
    }

    pub fn with_device(mut self, is_dram: bool, is_wl_tr: bool) -> Self {
        self.is_dram = is_dram;
        self.is_wl_tr = is_wl_tr;
        self
    }

    /// Sizes a chain rooted at `head`, whose logical effort is `g`, to drive
    /// `c_load` with minimum delay.
    ///
    /// The stage count is the even number of stages closest to an effort of
    /// [`FOPT`] per stage. If the last stage would exceed the maximum NMOS
    /// width, it is pinned there and the remaining stages share the effort
    /// needed to drive it.
    pub fn size(&self, head: Stage, g: f64, c_load: f64) -> Result<StageChain> {
        let tech = self.tech;
        let pn_ratio = tech.pn_ratio(self.is_dram, self.is_wl_tr);
        let c_in = head.input_cap(tech, self.is_dram, self.is_wl_tr);
        let c_unit = tech.gate_cap(1.0, self.is_dram, self.is_wl_tr);

        let f_total = g * c_load / c_in;
        let mut num_stages = self.stage_count(f_total, 0);
        let mut f = stage_effort(f_total, num_stages);

        let mut w_n_last = ((c_load / f) / c_unit / (1.0 + pn_ratio)).max(tech.min_w_nmos);
        if w_n_last > self.max_w_n {
            let c_last = tech.gate_cap((1.0 + pn_ratio) * self.max_w_n, self.is_dram, self.is_wl_tr);
            let f_total = g * c_last / c_in;
            num_stages = self.stage_count(f_total, 1);
            f = stage_effort(f_total, num_stages - 1);
            w_n_last = self.max_w_n;
        }

        if num_stages > MAX_NUMBER_GATES_STAGE {
            return Err(DecodeError::TooManyStages {
                stages: num_stages,
                max: MAX_NUMBER_GATES_STAGE,
            });
        }

        let mut stages = vec![Stage::default(); num_stages];
        stages[0] = head;
        stages[num_stages - 1] = Stage::new(w_n_last, pn_ratio * w_n_last);
        for i in (1..num_stages - 1).rev() {
            let w_n = (stages[i + 1].w_n / f).max(tech.min_w_nmos);
            stages[i] = Stage::new(w_n, pn_ratio * w_n);
        }

        log::trace!(
            "sized {num_stages}-stage chain: effort {f_total:.2}, stage effort {f:.2}, final w_n {w_n_last:.3}"
        );
        StageChain::new(stages)
    }

    fn stage_count(&self, f_total: f64, extra: usize) -> usize {
        let n = (f_total.ln() / FOPT.ln()).floor();
        let n = if n.is_finite() && n > 0.0 {
            n as usize + extra
        } else {
            extra
        };
        let n = if n % 2 == 1 { n + 1 } else { n };
        n.max(self.min_stages).max(MIN_NUMBER_GATES_STAGE)
    }
}

/// Per-stage effort over `stages` stages. Never below unity, so stages never
/// shrink toward the load.
fn stage_effort(f_total: f64, stages: usize) -> f64 {
    f_total.powf(1.0 / stages.max(1) as f64).max(1.0)
}
