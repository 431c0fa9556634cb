//! The row decoder: a NAND gate per row followed by the wordline driver.
//!
//! Cells with a dedicated read wordline (8T and 10T) split each row after the
//! NAND gate. A NOR2 DEMUX feeds the write wordline driver, and a second
//! driver (rooted at a NOR2 for 8T cells, or an inverter for 10T cells) feeds
//! the read wordline.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::gate::sizing::{Stage, StageChain};
use super::gate::GateType;
use super::timing::ChainModel;
use super::{Area, Footprint, PowerComponents, PowerDef};
use crate::tech::{SramCellDesign, TechParams};
use crate::{log2, Result};

pub mod delay;
pub mod sizing;

pub use delay::DecoderTiming;

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(derive(Debug))]
pub struct DecoderParams {
    /// Number of decoded outputs (rows).
    pub num_dec_signals: usize,
    /// Whether a way-select signal gates every row.
    #[builder(default)]
    pub way_select: bool,
    /// Capacitance of the (write) wordline.
    pub c_ld_out: f64,
    /// Capacitance of the read wordline. Defaults to `c_ld_out`.
    #[builder(setter(strip_option), default)]
    pub c_ld_out_rd: Option<f64>,
    /// Resistance of the (write) wordline.
    pub r_wire_out: f64,
    /// Resistance of the read wordline. Defaults to `r_wire_out`.
    #[builder(setter(strip_option), default)]
    pub r_wire_out_rd: Option<f64>,
    #[builder(default)]
    pub fully_assoc: bool,
    #[builder(default)]
    pub is_dram: bool,
    /// Whether the decoder drives the wordline transistors of the array.
    #[builder(default)]
    pub is_wl_tr: bool,
    /// Footprint of one memory cell.
    pub cell: Area,
}

impl DecoderParams {
    #[inline]
    pub fn builder() -> DecoderParamsBuilder {
        DecoderParamsBuilder::default()
    }

    #[inline]
    pub fn c_ld_out_rd(&self) -> f64 {
        self.c_ld_out_rd.unwrap_or(self.c_ld_out)
    }

    #[inline]
    pub fn r_wire_out_rd(&self) -> f64 {
        self.r_wire_out_rd.unwrap_or(self.r_wire_out)
    }
}

/// How a decoded row fans out to the wordlines of a cell.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WordlineTopology {
    /// One wordline per row.
    Shared,
    /// Write and read wordlines, each behind a NOR2 DEMUX gate.
    SplitNor,
    /// Write wordline behind a NOR2 DEMUX gate, read wordline behind an inverter.
    SplitNorInv,
}

impl WordlineTopology {
    pub fn select(cell_design: SramCellDesign, is_wl_tr: bool) -> Self {
        match (cell_design, is_wl_tr) {
            (SramCellDesign::EightT, true) => WordlineTopology::SplitNor,
            (SramCellDesign::TenT, true) => WordlineTopology::SplitNorInv,
            _ => WordlineTopology::Shared,
        }
    }

    #[inline]
    pub fn is_split(&self) -> bool {
        !matches!(self, WordlineTopology::Shared)
    }

    /// The gate at the root of the read wordline driver.
    pub fn read_head(&self) -> Option<GateType> {
        match self {
            WordlineTopology::Shared => None,
            WordlineTopology::SplitNor => Some(GateType::Nor2),
            WordlineTopology::SplitNorInv => Some(GateType::Inv),
        }
    }

    /// Whether a write also switches the read wordline.
    ///
    /// The read access transistor of a 10T cell is on during writes.
    #[inline]
    pub fn writes_switch_read_wordline(&self) -> bool {
        matches!(self, WordlineTopology::SplitNorInv)
    }
}

/// What a predecoder sees of the row decoder it drives.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderInput {
    pub head_gate: GateType,
    pub head: Stage,
    pub num_in_signals: usize,
    pub c_ld_out: f64,
    pub r_wire_out: f64,
}

pub struct Decoder<'a> {
    tech: &'a TechParams,
    params: DecoderParams,
    exists: bool,
    num_in_signals: usize,
    topology: WordlineTopology,
    head_gate: GateType,
    head: Stage,
    /// The wordline driver. With a split wordline this is the write driver,
    /// rooted at the NOR2 DEMUX gate; otherwise stage 0 is the NAND head gate.
    wl: StageChain,
    /// The read wordline driver, empty unless the wordline is split.
    rd: StageChain,
    area: Area,
    leakage: f64,
}

impl<'a> Decoder<'a> {
    pub fn new(params: DecoderParams, tech: &'a TechParams) -> Result<Self> {
        let exists = params.num_dec_signals > 0;
        let num_addr_bits = log2(params.num_dec_signals);
        let num_in_signals = match (num_addr_bits < 4, params.way_select) {
            (true, true) => 2,
            (true, false) => 0,
            (false, true) => 3,
            (false, false) => 2,
        };
        let head_gate = if num_in_signals == 3 && !params.fully_assoc {
            GateType::Nand3
        } else {
            GateType::Nand2
        };
        let topology = WordlineTopology::select(tech.cell_design, params.is_wl_tr);
        let pn_ratio = tech.pn_ratio(params.is_dram, params.is_wl_tr);
        let head = head_gate.min_size(tech.min_w_nmos, pn_ratio);

        let mut decoder = Self {
            tech,
            params,
            exists,
            num_in_signals,
            topology,
            head_gate,
            head,
            wl: StageChain::default(),
            rd: StageChain::default(),
            area: Area::default(),
            leakage: 0.0,
        };

        if exists {
            decoder.compute_widths()?;
            decoder.compute_area();
            log::debug!(
                "decoder for {} rows: {} head, {:?} wordlines, {} + {} driver stages",
                decoder.params.num_dec_signals,
                decoder.head_gate,
                decoder.topology,
                decoder.num_gates(),
                decoder.num_gates_rd()
            );
        }

        Ok(decoder)
    }

    /// Height of one decoder row.
    #[inline]
    fn row_height(&self) -> f64 {
        self.tech.h_dec * self.params.cell.h
    }

    pub(crate) fn model(&self) -> ChainModel<'a> {
        ChainModel {
            tech: self.tech,
            height: self.row_height(),
            is_dram: self.params.is_dram,
            is_wl_tr: self.params.is_wl_tr,
        }
    }

    fn compute_area(&mut self) {
        let model = self.model();
        // Without predecoded inputs the row has no NAND gate to lay out.
        let mut fp = if self.num_in_signals > 0 || self.params.fully_assoc {
            model.gate_footprint(self.head_gate, &self.head)
        } else {
            Footprint::default()
        };

        match self.topology {
            WordlineTopology::Shared => {
                fp += model.chain_footprint(&self.wl, self.head_gate, 1);
            }
            WordlineTopology::SplitNor | WordlineTopology::SplitNorInv => {
                let demux_wr = self.wl.head().copied().unwrap_or_default();
                let demux_rd = self.rd.head().copied().unwrap_or_default();
                let rd_head = self.topology.read_head().unwrap_or(GateType::Inv);

                fp += model.gate_footprint(GateType::Nor2, &demux_wr);
                fp += model.gate_footprint(rd_head, &demux_rd);
                fp += model.chain_footprint(&self.wl, GateType::Nor2, 1);
                fp += model.chain_footprint(&self.rd, rd_head, 1);
            }
        }

        let Footprint { area, i_leak } = fp;
        self.leakage = i_leak * self.tech.vdd();
        self.area = Area::with_height(area, self.row_height());
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Number of predecoded inputs to each row's NAND gate.
    #[inline]
    pub fn num_in_signals(&self) -> usize {
        self.num_in_signals
    }

    #[inline]
    pub fn head_gate(&self) -> GateType {
        self.head_gate
    }

    #[inline]
    pub fn topology(&self) -> WordlineTopology {
        self.topology
    }

    #[inline]
    pub fn params(&self) -> &DecoderParams {
        &self.params
    }

    #[inline]
    pub fn tech(&self) -> &'a TechParams {
        self.tech
    }

    /// Stages in the (write) wordline driver.
    #[inline]
    pub fn num_gates(&self) -> usize {
        self.wl.len()
    }

    /// Stages in the read wordline driver.
    #[inline]
    pub fn num_gates_rd(&self) -> usize {
        self.rd.len()
    }

    #[inline]
    pub fn wordline_chain(&self) -> &StageChain {
        &self.wl
    }

    #[inline]
    pub fn read_wordline_chain(&self) -> &StageChain {
        &self.rd
    }

    #[inline]
    pub fn area(&self) -> Area {
        self.area
    }

    /// Leakage of the decoder. Dynamic energy comes from
    /// [`Decoder::compute_delays`].
    pub fn power(&self) -> PowerDef {
        PowerDef::read_only(PowerComponents::leakage(self.leakage))
    }

    pub fn input(&self) -> DecoderInput {
        DecoderInput {
            head_gate: self.head_gate,
            head: self.head,
            num_in_signals: self.num_in_signals,
            c_ld_out: self.params.c_ld_out,
            r_wire_out: self.params.r_wire_out,
        }
    }
}
