//! Address-bit buffers in front of a predecode block.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::block::PredecodeBlock;
use crate::blocks::gate::sizing::{ChainSizer, StageChain};
use crate::blocks::gate::GateType;
use crate::blocks::timing::{ChainModel, OutputLoad, PathTiming};
use crate::blocks::{Area, Footprint, PathPair, PowerComponents};
use crate::tech::TechParams;
use crate::Result;

pub struct PredecodeBlockDriver<'a> {
    tech: &'a TechParams,
    exists: bool,
    is_dram: bool,
    way_select: usize,
    /// Buffers driving each first-level path.
    buffers: PathPair<usize>,
    /// Load on each buffer.
    c_load: PathPair<f64>,
    chains: PathPair<StageChain>,
    area: Area,
    leakage: f64,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDriverTiming {
    /// Delay and output rise time of each driven path. Unused paths stay zero.
    pub paths: PathPair<PathTiming>,
    /// Dynamic energy of all buffers on each path.
    pub path_power: PathPair<PowerComponents>,
}

impl BlockDriverTiming {
    pub fn power(&self) -> PowerComponents {
        self.path_power.nand2 + self.path_power.nand3
    }
}

impl<'a> PredecodeBlockDriver<'a> {
    /// Creates the buffers for `block`.
    ///
    /// With more than one way-select bit, the driver instead buffers the way
    /// select signals straight into the row decoder's head gate, one buffer
    /// per bit.
    pub fn new(way_select: usize, block: &PredecodeBlock<'a>) -> Result<Self> {
        let tech = block.tech();
        let is_dram = block.is_dram();

        let mut buffers = PathPair::default();
        let mut c_load = PathPair::default();
        if way_select > 1 {
            let dec = block.decoder_input();
            *buffers.get_mut(dec.head_gate) = way_select;
            *c_load.get_mut(dec.head_gate) = tech.gate_cap(dec.head.width(), is_dram, false);
        } else if way_select == 0 {
            if let Some(structure) = block.structure() {
                for gate in structure.active_paths() {
                    *buffers.get_mut(gate) = *structure.drv_buffers.get(gate);
                    *c_load.get_mut(gate) =
                        *structure.drv_fanout.get(gate) as f64 * block.l1_head_cap(gate);
                }
            }
        }

        let mut driver = Self {
            tech,
            exists: buffers.nand2 + buffers.nand3 > 0,
            is_dram,
            way_select,
            buffers,
            c_load,
            chains: PathPair::default(),
            area: Area::default(),
            leakage: 0.0,
        };

        if driver.exists {
            driver.compute_widths()?;
            driver.compute_area();
            log::debug!(
                "predecode driver: {:?} buffers, {:.3e}/{:.3e} F loads",
                driver.buffers,
                driver.c_load.nand2,
                driver.c_load.nand3
            );
        }

        Ok(driver)
    }

    fn model(&self) -> ChainModel<'a> {
        ChainModel::peripheral(self.tech, self.is_dram)
    }

    fn active_paths(&self) -> impl Iterator<Item = GateType> + '_ {
        self.buffers
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(gate, _)| gate)
    }

    fn compute_widths(&mut self) -> Result<()> {
        let tech = self.tech;
        let head = GateType::Inv.min_size(tech.min_w_nmos, tech.pn_ratio(self.is_dram, false));
        let sizer = ChainSizer::new(tech).with_device(self.is_dram, false);
        for gate in self.active_paths().collect_vec() {
            *self.chains.get_mut(gate) = sizer.size(head, 1.0, *self.c_load.get(gate))?;
        }
        Ok(())
    }

    fn compute_area(&mut self) {
        let model = self.model();
        let total = self
            .active_paths()
            .map(|gate| {
                model.chain_footprint(self.chains.get(gate), GateType::Inv, 0)
                    * *self.buffers.get(gate) as f64
            })
            .fold(Footprint::default(), |acc, fp| acc + fp);
        self.leakage = total.i_leak * self.tech.vdd();
        self.area = Area::with_height(total.area, self.tech.cell_h_def);
    }

    /// Propagates `input_rise` through the buffers of each driven path.
    ///
    /// Each stage is charged at half its switching energy.
    pub fn compute_delays(&self, input_rise: PathPair<f64>) -> BlockDriverTiming {
        let mut out = BlockDriverTiming::default();
        if !self.exists {
            return out;
        }

        let vdd = self.tech.vdd();
        let model = self.model();
        for gate in self.active_paths() {
            let mut timing = PathTiming::start(*input_rise.get(gate));
            let mut energy = 0.0;
            model.propagate(
                self.chains.get(gate),
                GateType::Inv,
                0,
                OutputLoad::lumped(*self.c_load.get(gate)),
                &mut timing,
                |v| energy += v.switching_energy(vdd) * 0.5,
            );
            *out.paths.get_mut(gate) = timing;
            *out.path_power.get_mut(gate) =
                PowerComponents::dynamic(energy * *self.buffers.get(gate) as f64);
        }
        out
    }

    /// Dynamic energy of one read across `num_active_mats` mats.
    pub fn read_dynamic_energy(&self, timing: &BlockDriverTiming, num_active_mats: usize) -> f64 {
        (timing.path_power.nand2.dynamic + timing.path_power.nand3.dynamic)
            * num_active_mats as f64
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.exists
    }

    #[inline]
    pub fn way_select(&self) -> usize {
        self.way_select
    }

    #[inline]
    pub fn num_addr_bits_nand2_path(&self) -> usize {
        self.buffers.nand2
    }

    #[inline]
    pub fn num_addr_bits_nand3_path(&self) -> usize {
        self.buffers.nand3
    }

    #[inline]
    pub fn chain(&self, gate: GateType) -> &StageChain {
        self.chains.get(gate)
    }

    #[inline]
    pub fn area(&self) -> Area {
        self.area
    }

    pub fn power(&self) -> PowerComponents {
        PowerComponents::leakage(self.leakage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::decoder::tests::params;
    use crate::blocks::decoder::Decoder;
    use crate::blocks::predecode::block::BlockHalf;
    use crate::tests::test_tech;

    #[test]
    fn test_block_driver() {
        let tech = test_tech();
        let dec = Decoder::new(params(1024).build().unwrap(), &tech).unwrap();
        let blk = PredecodeBlock::new(1024, &dec, 2e-14, 300.0, 1, false, BlockHalf::First).unwrap();
        let drv = PredecodeBlockDriver::new(0, &blk).unwrap();

        assert!(drv.exists());
        assert_eq!(drv.num_addr_bits_nand2_path(), 2);
        assert_eq!(drv.num_addr_bits_nand3_path(), 3);
        assert!(drv.chain(GateType::Nand2).len() >= 2);
        assert!(drv.area().area() > 0.0);
        assert!(drv.power().leakage > 0.0);

        let timing = drv.compute_delays(PathPair::splat(0.0));
        assert!(timing.paths.nand2.delay > 0.0);
        assert!(timing.paths.nand3.rise_time > 0.0);
        assert!(timing.power().dynamic > 0.0);
        assert_eq!(
            drv.read_dynamic_energy(&timing, 4),
            timing.power().dynamic * 4.0
        );
    }

    #[test]
    fn test_way_select_driver() {
        let tech = test_tech();
        let dec = Decoder::new(params(256).way_select(true).build().unwrap(), &tech).unwrap();
        let blk = PredecodeBlock::new(256, &dec, 2e-14, 300.0, 1, false, BlockHalf::First).unwrap();
        let drv = PredecodeBlockDriver::new(4, &blk).unwrap();

        assert!(drv.exists());
        assert_eq!(drv.num_addr_bits_nand2_path(), 0);
        assert_eq!(drv.num_addr_bits_nand3_path(), 4);
        assert!(drv.chain(GateType::Nand2).is_empty());

        let timing = drv.compute_delays(PathPair::splat(1e-11));
        assert_eq!(timing.paths.nand2, PathTiming::default());
        assert!(timing.paths.nand3.delay > 0.0);
    }

    #[test]
    fn test_missing_driver() {
        let tech = test_tech();
        let dec = Decoder::new(params(8).build().unwrap(), &tech).unwrap();
        let blk = PredecodeBlock::new(8, &dec, 2e-14, 300.0, 1, false, BlockHalf::Second).unwrap();
        assert!(!blk.exists());

        for way_select in [0, 1] {
            let drv = PredecodeBlockDriver::new(way_select, &blk).unwrap();
            assert!(!drv.exists());
            assert_eq!(drv.area(), Area::default());
            assert_eq!(drv.power(), PowerComponents::default());
            assert_eq!(
                drv.compute_delays(PathPair::splat(1e-11)),
                BlockDriverTiming::default()
            );
        }
    }

    #[test]
    fn test_buffers_match_block_bits() {
        let tech = test_tech();
        for rows in [2, 4, 8, 16, 64, 512, 4096, 1 << 16] {
            let dec = Decoder::new(params(rows).build().unwrap(), &tech).unwrap();
            for half in [BlockHalf::First, BlockHalf::Second] {
                let blk = PredecodeBlock::new(rows, &dec, 2e-14, 300.0, 1, false, half).unwrap();
                let drv = PredecodeBlockDriver::new(0, &blk).unwrap();
                assert_eq!(
                    drv.num_addr_bits_nand2_path() + drv.num_addr_bits_nand3_path(),
                    blk.num_input_addr_bits(),
                    "{rows} rows, {half:?}"
                );
            }
        }
    }
}
