//! The predecoder: two buffered NAND trees, one per half of the row address.

use serde::{Deserialize, Serialize};

use super::gate::GateType;
use super::{Area, PathPair, PowerComponents};

pub mod block;
pub mod driver;
pub mod table;

pub use block::{BlockHalf, BlockTiming, PredecodeBlock};
pub use driver::{BlockDriverTiming, PredecodeBlockDriver};
pub use table::{block_structure, BlockStructure};

/// A predecoder output: one path of one block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub half: BlockHalf,
    pub path: GateType,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredecoderTiming {
    /// Delay to the slowest predecoder output.
    pub delay: f64,
    /// Rise time at that output.
    pub rise_time: f64,
    /// Dynamic energy per access plus leakage.
    pub power: PowerComponents,
    pub driver_power: PowerComponents,
    pub block_power: PowerComponents,
    /// The output that sets `delay`, if any block exists.
    pub critical: Option<Terminal>,
}

pub struct Predecoder<'a> {
    drv1: PredecodeBlockDriver<'a>,
    blk1: PredecodeBlock<'a>,
    drv2: PredecodeBlockDriver<'a>,
    blk2: PredecodeBlock<'a>,
    driver_leakage: f64,
    block_leakage: f64,
}

impl<'a> Predecoder<'a> {
    pub fn new(
        drv1: PredecodeBlockDriver<'a>,
        blk1: PredecodeBlock<'a>,
        drv2: PredecodeBlockDriver<'a>,
        blk2: PredecodeBlock<'a>,
    ) -> Self {
        let driver_leakage = drv1.power().leakage + drv2.power().leakage;
        let block_leakage = blk1.power().leakage + blk2.power().leakage;
        Self {
            drv1,
            blk1,
            drv2,
            blk2,
            driver_leakage,
            block_leakage,
        }
    }

    fn pairs(&self) -> [(BlockHalf, &PredecodeBlockDriver<'a>, &PredecodeBlock<'a>); 2] {
        [
            (BlockHalf::First, &self.drv1, &self.blk1),
            (BlockHalf::Second, &self.drv2, &self.blk2),
        ]
    }

    /// Runs both halves from an address edge of rise time `input_rise` and
    /// reports the slowest output.
    pub fn compute_delays(&self, input_rise: f64) -> PredecoderTiming {
        let mut out = PredecoderTiming {
            power: PowerComponents::leakage(self.driver_leakage + self.block_leakage),
            driver_power: PowerComponents::leakage(self.driver_leakage),
            block_power: PowerComponents::leakage(self.block_leakage),
            ..Default::default()
        };

        for (half, drv, blk) in self.pairs() {
            let drv_timing = drv.compute_delays(PathPair::splat(input_rise));
            let blk_timing = blk.compute_delays(drv_timing.paths.map(|p| p.rise_time));

            let drv_dynamic = drv_timing.power().dynamic;
            let blk_dynamic = blk_timing.power().dynamic;
            out.driver_power.dynamic += drv_dynamic;
            out.block_power.dynamic += blk_dynamic;
            out.power.dynamic += drv_dynamic + blk_dynamic;

            for (path, timing) in blk_timing.paths.iter() {
                if !blk.uses(path) {
                    continue;
                }
                let delay = drv_timing.paths.get(path).delay + timing.delay;
                if out.critical.is_none() || delay > out.delay {
                    out.delay = delay;
                    out.rise_time = timing.rise_time;
                    out.critical = Some(Terminal { half, path });
                }
            }
        }

        if let Some(critical) = out.critical {
            log::debug!(
                "predecoder critical path: {:?} block, {} path, {:.3e} s",
                critical.half,
                critical.path,
                out.delay
            );
        }
        out
    }

    pub fn area(&self) -> Area {
        let total: f64 = self
            .pairs()
            .iter()
            .map(|(_, drv, blk)| drv.area().area() + blk.area().area())
            .sum();
        Area::with_height(total, self.blk1.tech().cell_h_def)
    }

    /// Leakage of all drivers and blocks.
    pub fn power(&self) -> PowerComponents {
        PowerComponents::leakage(self.driver_leakage + self.block_leakage)
    }

    #[inline]
    pub fn driver_leakage(&self) -> f64 {
        self.driver_leakage
    }

    #[inline]
    pub fn block_leakage(&self) -> f64 {
        self.block_leakage
    }

    pub fn block(&self, half: BlockHalf) -> &PredecodeBlock<'a> {
        match half {
            BlockHalf::First => &self.blk1,
            BlockHalf::Second => &self.blk2,
        }
    }

    pub fn driver(&self, half: BlockHalf) -> &PredecodeBlockDriver<'a> {
        match half {
            BlockHalf::First => &self.drv1,
            BlockHalf::Second => &self.drv2,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::relative_eq;

    use super::*;
    use crate::blocks::decoder::tests::params;
    use crate::blocks::decoder::Decoder;
    use crate::tests::test_tech;

    fn predecoder<'a>(rows: usize, dec: &Decoder<'a>) -> Predecoder<'a> {
        let blk1 = PredecodeBlock::new(rows, dec, 3e-14, 400.0, 1, false, BlockHalf::First).unwrap();
        let blk2 = PredecodeBlock::new(rows, dec, 3e-14, 400.0, 1, false, BlockHalf::Second).unwrap();
        let drv1 = PredecodeBlockDriver::new(0, &blk1).unwrap();
        let drv2 = PredecodeBlockDriver::new(0, &blk2).unwrap();
        Predecoder::new(drv1, blk1, drv2, blk2)
    }

    #[test]
    fn test_predecoder() {
        let tech = test_tech();
        let dec = Decoder::new(params(512).build().unwrap(), &tech).unwrap();
        let pre = predecoder(512, &dec);

        let timing = pre.compute_delays(1e-11);
        assert!(timing.delay > 0.0);
        assert!(timing.rise_time > 0.0);
        assert!(timing.power.dynamic > 0.0);
        assert!(pre.area().area() > 0.0);

        // The critical output is the slowest of all existing outputs.
        let critical = timing.critical.unwrap();
        for half in [BlockHalf::First, BlockHalf::Second] {
            let drv = pre.driver(half).compute_delays(PathPair::splat(1e-11));
            let blk = pre.block(half).compute_delays(drv.paths.map(|p| p.rise_time));
            for gate in [GateType::Nand2, GateType::Nand3] {
                if pre.block(half).uses(gate) {
                    let delay = drv.paths.get(gate).delay + blk.paths.get(gate).delay;
                    assert!(delay <= timing.delay);
                    if half == critical.half && gate == critical.path {
                        assert_eq!(delay, timing.delay);
                    }
                }
            }
        }
    }

    #[test]
    fn test_leakage_additivity() {
        let tech = test_tech();
        for rows in [8, 64, 1024, 1 << 15] {
            let dec = Decoder::new(params(rows).build().unwrap(), &tech).unwrap();
            let pre = predecoder(rows, &dec);
            let expected = [BlockHalf::First, BlockHalf::Second]
                .iter()
                .map(|&h| pre.driver(h).power().leakage + pre.block(h).power().leakage)
                .sum::<f64>();
            assert!(relative_eq!(pre.power().leakage, expected, max_relative = 1e-12));
            // Evaluating does not change the leakage.
            let timing = pre.compute_delays(0.0);
            assert_eq!(timing.power.leakage, pre.power().leakage);
        }
    }

    #[test]
    fn test_small_decoder_has_one_half() {
        let tech = test_tech();
        let dec = Decoder::new(params(4).build().unwrap(), &tech).unwrap();
        let pre = predecoder(4, &dec);
        let timing = pre.compute_delays(0.0);
        assert_eq!(
            timing.critical,
            Some(Terminal {
                half: BlockHalf::First,
                path: GateType::Nand2
            })
        );
        assert!(!pre.block(BlockHalf::Second).exists());
        assert!(!pre.driver(BlockHalf::Second).exists());
    }

    #[test]
    fn test_no_rows() {
        let tech = test_tech();
        let dec = Decoder::new(params(0).build().unwrap(), &tech).unwrap();
        let pre = predecoder(0, &dec);
        let timing = pre.compute_delays(1e-11);
        assert_eq!(timing.critical, None);
        assert_eq!(timing.delay, 0.0);
        assert_eq!(timing.rise_time, 0.0);
        assert_eq!(pre.area().area(), 0.0);
    }
}
