use serde::{Deserialize, Serialize};

use crate::blocks::buf::SignalDriver;
use crate::blocks::decoder::{Decoder, DecoderParams, DecoderTiming};
use crate::blocks::predecode::{
    BlockHalf, PredecodeBlock, PredecodeBlockDriver, Predecoder, Terminal,
};
use crate::blocks::{PathPair, PowerComponents};
use crate::config::DecodeConfig;
use crate::error::DecodeError;
use crate::tech::TechParams;
use crate::Result;

/// The components of one decode path, sized for one configuration.
///
/// A plan is evaluated once; build a fresh plan for every configuration.
pub struct DecodePlan<'a> {
    config: DecodeConfig,
    input_driver: Option<SignalDriver<'a>>,
    predecoder: Predecoder<'a>,
    /// Present only with more than one way-select bit.
    way_select_driver: Option<PredecodeBlockDriver<'a>>,
    decoder: Decoder<'a>,
}

/// Delay, area and power of one component.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub delay: f64,
    pub rise_time: f64,
    /// Area in square microns.
    pub area: f64,
    pub power: PowerComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub num_rows: usize,
    pub input_driver: Option<ComponentReport>,
    pub predecoder: ComponentReport,
    /// The predecoder output that sets its delay.
    pub critical: Option<Terminal>,
    pub way_select_driver: Option<ComponentReport>,
    pub decoder: ComponentReport,
    pub decoder_timing: DecoderTiming,
    /// Delay from the address inputs to the wordline that limits access time.
    pub access_delay: f64,
    pub area: f64,
    /// Dynamic energy per read and total leakage.
    pub power: PowerComponents,
}

impl<'a> DecodePlan<'a> {
    pub fn new(config: &DecodeConfig, tech: &'a TechParams) -> Result<Self> {
        config.validate()?;

        let mut dec_params = DecoderParams::builder();
        dec_params
            .num_dec_signals(config.num_rows)
            .way_select(config.way_select > 1)
            .c_ld_out(config.wordline.c)
            .r_wire_out(config.wordline.r)
            .fully_assoc(config.fully_assoc)
            .is_dram(config.is_dram)
            .is_wl_tr(config.is_wl_tr)
            .cell(config.cell);
        if let Some(rd) = config.read_wordline {
            dec_params.c_ld_out_rd(rd.c).r_wire_out_rd(rd.r);
        }
        let dec_params = dec_params
            .build()
            .map_err(|e| DecodeError::Builder(e.to_string()))?;
        let decoder = Decoder::new(dec_params, tech)?;

        let block = |half| {
            PredecodeBlock::new(
                config.num_rows,
                &decoder,
                config.predecode_wire.c,
                config.predecode_wire.r,
                config.num_dec_per_predec,
                config.is_dram,
                half,
            )
        };
        let blk1 = block(BlockHalf::First)?;
        let blk2 = block(BlockHalf::Second)?;
        let drv1 = PredecodeBlockDriver::new(0, &blk1)?;
        let drv2 = PredecodeBlockDriver::new(0, &blk2)?;
        let way_select_driver = (config.way_select > 1)
            .then(|| PredecodeBlockDriver::new(config.way_select, &blk1))
            .transpose()?;
        let predecoder = Predecoder::new(drv1, blk1, drv2, blk2);

        let input_driver = config
            .input_driver
            .map(|drv| {
                SignalDriver::new(drv.c_gate, drv.wire.c, drv.wire.r, config.is_dram, tech)
            })
            .transpose()?;

        log::info!(
            "planned decode path for {} rows: {} + {} predecode bits, {} decoder stages",
            config.num_rows,
            predecoder.block(BlockHalf::First).num_input_addr_bits(),
            predecoder.block(BlockHalf::Second).num_input_addr_bits(),
            decoder.num_gates()
        );

        Ok(Self {
            config: config.clone(),
            input_driver,
            predecoder,
            way_select_driver,
            decoder,
        })
    }

    #[inline]
    pub fn decoder(&self) -> &Decoder<'a> {
        &self.decoder
    }

    #[inline]
    pub fn predecoder(&self) -> &Predecoder<'a> {
        &self.predecoder
    }

    #[inline]
    pub fn way_select_driver(&self) -> Option<&PredecodeBlockDriver<'a>> {
        self.way_select_driver.as_ref()
    }

    /// Runs an address edge from the inputs to the wordlines.
    ///
    /// The decoder starts when the later of the predecoder and the way-select
    /// driver settles, with the rise time of that signal.
    pub fn evaluate(&self) -> DecodeReport {
        let mut start = 0.0;
        let mut rise = self.config.input_rise;

        let input_driver = self.input_driver.as_ref().map(|drv| {
            let timing = drv.compute_delay(rise);
            start = timing.delay;
            rise = timing.rise_time;
            ComponentReport {
                delay: timing.delay,
                rise_time: timing.rise_time,
                area: drv.area().area(),
                power: timing.power,
            }
        });

        let pre = self.predecoder.compute_delays(rise);
        let predecoder = ComponentReport {
            delay: pre.delay,
            rise_time: pre.rise_time,
            area: self.predecoder.area().area(),
            power: pre.power,
        };
        let mut dec_start = start + pre.delay;
        let mut dec_rise = pre.rise_time;

        let way_select_driver = self.way_select_driver.as_ref().map(|drv| {
            let timing = drv.compute_delays(PathPair::splat(rise));
            let path = timing
                .paths
                .iter()
                .map(|(_, p)| *p)
                .max_by(|a, b| a.delay.total_cmp(&b.delay))
                .unwrap_or_default();
            if start + path.delay > dec_start {
                dec_start = start + path.delay;
                dec_rise = path.rise_time;
            }
            ComponentReport {
                delay: path.delay,
                rise_time: path.rise_time,
                area: drv.area().area(),
                power: PowerComponents::new(
                    drv.read_dynamic_energy(&timing, self.config.num_active_mats),
                    drv.power().leakage,
                ),
            }
        });

        let decoder_timing = self.decoder.compute_delays(dec_rise);
        let decoder = ComponentReport {
            delay: decoder_timing.critical_delay(),
            rise_time: decoder_timing.rise_time,
            area: self.decoder.area().area(),
            power: decoder_timing.power.read,
        };

        let parts = input_driver
            .iter()
            .chain(std::iter::once(&predecoder))
            .chain(way_select_driver.iter())
            .chain(std::iter::once(&decoder));
        let (area, power) = parts.fold(
            (0.0, PowerComponents::default()),
            |(area, power), part| (area + part.area, power + part.power),
        );

        let access_delay = dec_start + decoder.delay;
        log::info!(
            "decode path for {} rows: {:.3e} s, {:.3e} um^2",
            self.config.num_rows,
            access_delay,
            area
        );

        DecodeReport {
            num_rows: self.config.num_rows,
            input_driver,
            predecoder,
            critical: pre.critical,
            way_select_driver,
            decoder,
            decoder_timing,
            access_delay,
            area,
            power,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::relative_eq;

    use super::*;
    use crate::blocks::Area;
    use crate::config::{InputDriverConfig, WireLoad};
    use crate::tech::SramCellDesign;

    fn config(num_rows: usize) -> DecodeConfig {
        DecodeConfig {
            num_rows,
            way_select: 0,
            cell: Area::new(0.3, 0.6),
            is_dram: false,
            is_wl_tr: false,
            fully_assoc: false,
            wordline: WireLoad { c: 4e-14, r: 500.0 },
            read_wordline: None,
            predecode_wire: WireLoad { c: 2e-14, r: 300.0 },
            num_dec_per_predec: 1,
            num_active_mats: 1,
            input_rise: 1e-11,
            input_driver: None,
            tech: None,
        }
    }

    #[test]
    fn test_evaluate_plan() -> Result<()> {
        let tech = TechParams::default();
        let plan = DecodePlan::new(&config(512), &tech)?;
        let report = plan.evaluate();

        assert!(report.predecoder.delay > 0.0);
        assert!(report.decoder.delay > 0.0);
        assert!(report.access_delay > report.decoder.delay);
        assert!(report.critical.is_some());
        assert!(report.input_driver.is_none());
        assert!(report.way_select_driver.is_none());
        assert!(relative_eq!(
            report.area,
            report.predecoder.area + report.decoder.area,
            max_relative = 1e-12
        ));
        assert!(relative_eq!(
            report.power.leakage,
            plan.predecoder().power().leakage + plan.decoder().power().read.leakage,
            max_relative = 1e-12
        ));
        Ok(())
    }

    #[test]
    fn test_input_driver_adds_delay() -> Result<()> {
        let tech = TechParams::default();
        let bare = DecodePlan::new(&config(256), &tech)?.evaluate();
        let driven = DecodePlan::new(
            &DecodeConfig {
                input_driver: Some(InputDriverConfig {
                    c_gate: 1e-14,
                    wire: WireLoad { c: 5e-14, r: 200.0 },
                }),
                ..config(256)
            },
            &tech,
        )?
        .evaluate();

        let drv = driven.input_driver.unwrap();
        assert!(drv.delay > 0.0);
        assert!(driven.access_delay > drv.delay);
        assert!(driven.area > bare.area);
        Ok(())
    }

    #[test]
    fn test_way_select_path() -> Result<()> {
        let tech = TechParams::default();
        let plan = DecodePlan::new(
            &DecodeConfig {
                way_select: 4,
                ..config(256)
            },
            &tech,
        )?;
        assert!(plan.decoder().params().way_select);
        let drv = plan.way_select_driver().unwrap();
        assert!(drv.exists());
        assert_eq!(drv.num_addr_bits_nand3_path(), 4);

        let report = plan.evaluate();
        let ws = report.way_select_driver.unwrap();
        assert!(ws.delay > 0.0);
        assert!(report.access_delay >= ws.delay + report.decoder.delay);
        Ok(())
    }

    #[test]
    fn test_no_way_select_driver_below_two_bits() -> Result<()> {
        let tech = TechParams::default();
        for way_select in [0, 1] {
            let cfg = DecodeConfig {
                way_select,
                ..config(512)
            };
            let plan = DecodePlan::new(&cfg, &tech)?;
            assert!(plan.way_select_driver().is_none());
            assert!(!plan.decoder().params().way_select);

            // Only the two predecode drivers are charged, once each.
            let report = plan.evaluate();
            assert!(report.way_select_driver.is_none());
            let pre = plan.predecoder();
            let drivers = pre.driver(BlockHalf::First).area().area()
                + pre.driver(BlockHalf::Second).area().area();
            let blocks = pre.block(BlockHalf::First).area().area()
                + pre.block(BlockHalf::Second).area().area();
            assert!(relative_eq!(
                report.area,
                drivers + blocks + plan.decoder().area().area(),
                max_relative = 1e-12
            ));
        }
        Ok(())
    }

    #[test]
    fn test_split_wordline_plan() -> Result<()> {
        let tech = TechParams::default().with_cell_design(SramCellDesign::TenT);
        let plan = DecodePlan::new(
            &DecodeConfig {
                is_wl_tr: true,
                read_wordline: Some(WireLoad { c: 6e-14, r: 800.0 }),
                ..config(128)
            },
            &tech,
        )?;
        let report = plan.evaluate();
        assert!(report.decoder_timing.delay_rd > 0.0);
        assert_eq!(report.decoder.delay, report.decoder_timing.delay_rd);
        Ok(())
    }

    #[test]
    fn test_dram_plan() -> Result<()> {
        let tech = TechParams::default();
        let cfg = DecodeConfig {
            is_dram: true,
            is_wl_tr: true,
            ..config(1024)
        };
        let report = DecodePlan::new(&cfg, &tech)?.evaluate();
        let sram = DecodePlan::new(&config(1024), &tech)?.evaluate();

        assert!(report.predecoder.delay > 0.0);
        assert!(report.decoder.delay > 0.0);
        assert!(report.access_delay.is_finite());
        assert!(report.access_delay > report.decoder.delay);
        assert!(report.area > 0.0);
        assert!(report.power.leakage > 0.0);
        assert!(report.critical.is_some());
        assert_ne!(report.decoder.power.dynamic, sram.decoder.power.dynamic);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let tech = TechParams::default();
        assert!(matches!(
            DecodePlan::new(&config(100), &tech),
            Err(DecodeError::InvalidConfig(_))
        ));
    }
}
