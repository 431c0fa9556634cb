//! One half of the predecoder: a one- or two-level NAND tree over a group of
//! address bits.

use serde::{Deserialize, Serialize};

use super::table::{block_structure, BlockStructure};
use crate::blocks::decoder::{Decoder, DecoderInput};
use crate::blocks::gate::sizing::{ChainSizer, StageChain};
use crate::blocks::gate::GateType;
use crate::blocks::timing::{ChainModel, OutputLoad, PathTiming};
use crate::blocks::{Area, Footprint, PathPair, PowerComponents};
use crate::tech::TechParams;
use crate::{log2, Result};

/// Which half of the row address a block decodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BlockHalf {
    /// The upper `ceil(n / 2)` bits, or all of them for small decoders.
    First,
    /// The remaining `floor(n / 2)` bits.
    Second,
}

impl BlockHalf {
    /// Address bits this half decodes out of `num_addr_bits` in total.
    pub fn bits(&self, num_addr_bits: usize) -> usize {
        let first = (num_addr_bits + 1) / 2;
        match self {
            BlockHalf::First => first,
            BlockHalf::Second => num_addr_bits - first,
        }
    }

    #[inline]
    pub fn other(&self) -> Self {
        match self {
            BlockHalf::First => BlockHalf::Second,
            BlockHalf::Second => BlockHalf::First,
        }
    }
}

/// Decoders narrower than this are driven straight from a single block.
const MIN_BITS_FOR_TWO_BLOCKS: usize = 4;

pub struct PredecodeBlock<'a> {
    tech: &'a TechParams,
    half: BlockHalf,
    exists: bool,
    num_input_addr_bits: usize,
    structure: Option<&'static BlockStructure>,
    dec: DecoderInput,
    is_dram: bool,
    /// Load at the block output, including the wire to the decoders.
    c_load: f64,
    r_wire: f64,
    l1: PathPair<StageChain>,
    l2: StageChain,
    area: Area,
    path_leakage: PathPair<f64>,
    l2_leakage: f64,
}

/// Timing and energy of one block activation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTiming {
    /// Per-path delay and output rise time. Unused paths stay zero.
    pub paths: PathPair<PathTiming>,
    /// The slower of the used paths.
    pub delay: f64,
    /// First-level dynamic energy and leakage of each path.
    pub path_power: PathPair<PowerComponents>,
    /// Second-level dynamic energy and leakage.
    pub l2_power: PowerComponents,
}

impl BlockTiming {
    pub fn power(&self) -> PowerComponents {
        self.path_power.nand2 + self.path_power.nand3 + self.l2_power
    }
}

impl<'a> PredecodeBlock<'a> {
    /// Creates the block for one half of the address of a decoder with
    /// `num_dec_signals` outputs.
    ///
    /// `c_wire_out` and `r_wire_out` describe the wire from the block to the
    /// decoders; `num_dec_per_predec` is the number of decoders each block
    /// output fans out to.
    ///
    /// # Panics
    ///
    /// Panics if the block must exist but would decode more than 9 bits.
    pub fn new(
        num_dec_signals: usize,
        dec: &Decoder<'a>,
        c_wire_out: f64,
        r_wire_out: f64,
        num_dec_per_predec: usize,
        is_dram: bool,
        half: BlockHalf,
    ) -> Result<Self> {
        let tech = dec.tech();
        let input = dec.input();
        let num_addr_bits = log2(num_dec_signals);

        let (num_input_addr_bits, c_load, r_wire) = if num_addr_bits == 0 {
            (0, 0.0, 0.0)
        } else if num_addr_bits < MIN_BITS_FOR_TWO_BLOCKS {
            match half {
                BlockHalf::First => (num_addr_bits, input.c_ld_out, input.r_wire_out),
                BlockHalf::Second => (0, 0.0, 0.0),
            }
        } else {
            let other_bits = half.other().bits(num_addr_bits);
            let c_dec_in = tech.gate_cap(input.head.width(), is_dram, false);
            let branch = (1usize << other_bits) * num_dec_per_predec;
            let c_load = branch as f64 * c_dec_in + c_wire_out;
            (half.bits(num_addr_bits), c_load, r_wire_out)
        };

        let mut block = Self {
            tech,
            half,
            exists: num_input_addr_bits > 0,
            num_input_addr_bits,
            structure: None,
            dec: input,
            is_dram,
            c_load,
            r_wire,
            l1: PathPair::default(),
            l2: StageChain::default(),
            area: Area::default(),
            path_leakage: PathPair::default(),
            l2_leakage: 0.0,
        };

        if block.exists {
            block.structure = Some(block_structure(num_input_addr_bits));
            block.compute_widths()?;
            block.compute_area();
            log::debug!(
                "{:?} predecode block: {} bits, {:.3e} F load",
                half,
                num_input_addr_bits,
                c_load
            );
        }

        Ok(block)
    }

    fn model(&self) -> ChainModel<'a> {
        ChainModel::peripheral(self.tech, self.is_dram)
    }

    fn compute_widths(&mut self) -> Result<()> {
        let Some(structure) = self.structure else {
            return Ok(());
        };
        let tech = self.tech;
        let pn_ratio = tech.pn_ratio(self.is_dram, false);
        let sizer = ChainSizer::new(tech).with_device(self.is_dram, false);
        let model = self.model();

        let c_l2_in = match structure.l2_gate {
            Some(gate) => {
                self.l2 = sizer.size(
                    gate.min_size(tech.min_w_nmos, pn_ratio),
                    gate.logical_effort(pn_ratio),
                    self.c_load,
                )?;
                self.l2.head().map(|s| model.input_cap(s))
            }
            None => None,
        };

        for gate in structure.active_paths() {
            let c_path_load = match c_l2_in {
                Some(c) => *structure.branch.get(gate) as f64 * c,
                None => self.c_load,
            };
            *self.l1.get_mut(gate) = sizer.size(
                gate.min_size(tech.min_w_nmos, pn_ratio),
                gate.logical_effort(pn_ratio),
                c_path_load,
            )?;
        }

        Ok(())
    }

    fn compute_area(&mut self) {
        let Some(structure) = self.structure else {
            return;
        };
        let model = self.model();
        let vdd = self.tech.vdd();

        let mut total = Footprint::default();
        for gate in structure.active_paths() {
            let fp = model.chain_footprint(self.l1.get(gate), gate, 0)
                * *structure.num_l1.get(gate) as f64;
            *self.path_leakage.get_mut(gate) = fp.i_leak * vdd;
            total += fp;
        }
        if let Some(gate) = structure.l2_gate {
            let fp = model.chain_footprint(&self.l2, gate, 0) * structure.num_l2 as f64;
            self.l2_leakage = fp.i_leak * vdd;
            total += fp;
        }

        self.area = Area::with_height(total.area, self.tech.cell_h_def);
    }

    /// Propagates the address edges through every used path.
    ///
    /// `input_rise` gives the rise time arriving at each first-level path.
    /// Each path continues through the second level with its own rise time.
    pub fn compute_delays(&self, input_rise: PathPair<f64>) -> BlockTiming {
        let Some(structure) = self.structure else {
            return BlockTiming::default();
        };

        let vdd = self.tech.vdd();
        let model = self.model();
        let block_out = OutputLoad::distributed(self.c_load, self.r_wire);
        let c_l2_in = self.l2.head().map(|s| model.input_cap(s)).unwrap_or(0.0);

        let mut out = BlockTiming::default();
        let mut l2_energy: Option<f64> = None;

        for gate in structure.active_paths() {
            let l1_out = match structure.l2_gate {
                Some(_) => OutputLoad::lumped(*structure.branch.get(gate) as f64 * c_l2_in),
                None => block_out,
            };

            let mut timing = PathTiming::start(*input_rise.get(gate));
            let mut l1_energy = 0.0;
            model.propagate(self.l1.get(gate), gate, 0, l1_out, &mut timing, |v| {
                l1_energy += v.switching_energy(vdd);
            });

            if let Some(l2_gate) = structure.l2_gate {
                let mut energy = 0.0;
                model.propagate(&self.l2, l2_gate, 0, block_out, &mut timing, |v| {
                    energy += v.switching_energy(vdd);
                });
                // The second level switches once per access.
                l2_energy.get_or_insert(energy);
            }

            *out.paths.get_mut(gate) = timing;
            *out.path_power.get_mut(gate) =
                PowerComponents::new(l1_energy, *self.path_leakage.get(gate));
            out.delay = out.delay.max(timing.delay);
        }

        out.l2_power = PowerComponents::new(l2_energy.unwrap_or(0.0), self.l2_leakage);
        out
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.exists
    }

    #[inline]
    pub fn half(&self) -> BlockHalf {
        self.half
    }

    #[inline]
    pub(crate) fn tech(&self) -> &'a TechParams {
        self.tech
    }

    #[inline]
    pub fn is_dram(&self) -> bool {
        self.is_dram
    }

    #[inline]
    pub fn num_input_addr_bits(&self) -> usize {
        self.num_input_addr_bits
    }

    /// The structure table entry, if the block exists.
    #[inline]
    pub fn structure(&self) -> Option<&'static BlockStructure> {
        self.structure
    }

    pub fn flag_two_unique_paths(&self) -> bool {
        self.structure.map_or(false, |s| s.two_unique_paths())
    }

    /// Whether the block has a first-level path rooted at `gate`.
    pub fn uses(&self, gate: GateType) -> bool {
        self.structure.map_or(false, |s| s.uses(gate))
    }

    pub fn l2_gate(&self) -> Option<GateType> {
        self.structure.and_then(|s| s.l2_gate)
    }

    pub fn branch_effort(&self) -> PathPair<usize> {
        self.structure.map(|s| s.branch).unwrap_or_default()
    }

    /// Input capacitance of one first-level gate of the given path.
    pub fn l1_head_cap(&self, gate: GateType) -> f64 {
        self.l1
            .get(gate)
            .head()
            .map(|s| self.model().input_cap(s))
            .unwrap_or(0.0)
    }

    #[inline]
    pub fn l1_chain(&self, gate: GateType) -> &StageChain {
        self.l1.get(gate)
    }

    #[inline]
    pub fn l2_chain(&self) -> &StageChain {
        &self.l2
    }

    #[inline]
    pub fn c_load(&self) -> f64 {
        self.c_load
    }

    /// The decoder stage this block feeds.
    #[inline]
    pub fn decoder_input(&self) -> &DecoderInput {
        &self.dec
    }

    #[inline]
    pub fn area(&self) -> Area {
        self.area
    }

    #[inline]
    pub fn path_leakage(&self) -> PathPair<f64> {
        self.path_leakage
    }

    #[inline]
    pub fn l2_leakage(&self) -> f64 {
        self.l2_leakage
    }

    pub fn power(&self) -> PowerComponents {
        PowerComponents::leakage(self.path_leakage.nand2 + self.path_leakage.nand3 + self.l2_leakage)
    }
}
