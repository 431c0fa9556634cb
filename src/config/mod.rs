use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blocks::Area;
use crate::error::DecodeError;
use crate::tech::TechParams;
use crate::Result;

/// A capacitive load at the end of a resistive wire.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLoad {
    /// Capacitance in farads.
    pub c: f64,
    /// Resistance in ohms.
    #[serde(default)]
    pub r: f64,
}

/// The driver that brings the address bits to the predecoder.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDriverConfig {
    /// Gate capacitance at the far end of the address wire.
    pub c_gate: f64,
    pub wire: WireLoad,
}

/// One decode path to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Number of rows to decode. Must be a power of two.
    pub num_rows: usize,
    /// Way-select bits fed directly to the row decoder. Zero or one means no
    /// way select.
    #[serde(default)]
    pub way_select: usize,
    /// Footprint of one memory cell, in microns.
    pub cell: Area,
    #[serde(default)]
    pub is_dram: bool,
    #[serde(default)]
    pub is_wl_tr: bool,
    #[serde(default)]
    pub fully_assoc: bool,
    /// The (write) wordline.
    pub wordline: WireLoad,
    /// The read wordline of 8T and 10T cells. Defaults to `wordline`.
    #[serde(default)]
    pub read_wordline: Option<WireLoad>,
    /// The wire from each predecode block to the row decoders.
    #[serde(default)]
    pub predecode_wire: WireLoad,
    /// Row decoders driven by each predecode output.
    #[serde(default = "default_one")]
    pub num_dec_per_predec: usize,
    /// Mats whose way-select drivers switch on each access.
    #[serde(default = "default_one")]
    pub num_active_mats: usize,
    /// Rise time of the address edge, in seconds.
    #[serde(default)]
    pub input_rise: f64,
    #[serde(default)]
    pub input_driver: Option<InputDriverConfig>,
    #[serde(default)]
    pub tech: Option<TechParams>,
}

fn default_one() -> usize {
    1
}

impl DecodeConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DecodeError::InvalidConfig(msg));

        if self.num_rows < 2 || !self.num_rows.is_power_of_two() {
            return invalid(format!(
                "the number of rows must be a power of 2 greater than or equal to 2, got {}",
                self.num_rows
            ));
        }
        if self.num_dec_per_predec == 0 {
            return invalid("each predecode output must drive at least one decoder".into());
        }
        if !(self.cell.h > 0.0 && self.cell.w > 0.0) {
            return invalid(format!(
                "cell dimensions must be positive, got {} x {}",
                self.cell.h, self.cell.w
            ));
        }

        let mut loads = vec![
            ("wordline", self.wordline),
            ("predecode wire", self.predecode_wire),
        ];
        if let Some(rd) = self.read_wordline {
            loads.push(("read wordline", rd));
        }
        if let Some(drv) = self.input_driver {
            loads.push(("input driver wire", drv.wire));
            loads.push(("input driver gate", WireLoad { c: drv.c_gate, r: 0.0 }));
        }
        for (name, load) in loads {
            if !(load.c >= 0.0 && load.r >= 0.0) {
                return invalid(format!("{name} load must be non-negative"));
            }
        }
        if self.input_rise < 0.0 {
            return invalid("input rise time must be non-negative".into());
        }

        Ok(())
    }

    /// The technology table in the configuration, or the built-in default.
    pub fn tech(&self) -> TechParams {
        self.tech.clone().unwrap_or_default()
    }
}

pub fn parse_decode_config(path: impl AsRef<Path>) -> Result<DecodeConfig> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::tech::SramCellDesign;

    const SAMPLE: &str = r#"
num_rows = 256
way_select = 4
cell = { h = 0.3, w = 0.6 }
is_wl_tr = true
wordline = { c = 4e-14, r = 500.0 }
predecode_wire = { c = 2e-14, r = 300.0 }
input_rise = 1e-11

[input_driver]
c_gate = 1e-14
wire = { c = 5e-14, r = 200.0 }

[tech]
cell_design = "eight_t"
"#;

    fn sample() -> DecodeConfig {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_decode_config() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(SAMPLE.as_bytes())?;
        let config = parse_decode_config(file.path())?;

        assert_eq!(config.num_rows, 256);
        assert_eq!(config.way_select, 4);
        assert!(config.is_wl_tr);
        assert!(!config.is_dram);
        assert_eq!(config.num_dec_per_predec, 1);
        assert_eq!(config.read_wordline, None);
        assert_eq!(config.input_driver.unwrap().wire.r, 200.0);

        let tech = config.tech();
        assert_eq!(tech.cell_design, SramCellDesign::EightT);
        assert_eq!(tech.min_w_nmos, TechParams::default().min_w_nmos);

        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_decode_config(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn test_validate_rows() {
        for num_rows in [0, 1, 3, 100] {
            let config = DecodeConfig {
                num_rows,
                ..sample()
            };
            assert!(matches!(
                config.validate(),
                Err(DecodeError::InvalidConfig(_))
            ));
        }
        let config = DecodeConfig {
            num_rows: 2,
            ..sample()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_loads() {
        let mut config = sample();
        config.read_wordline = Some(WireLoad { c: -1e-14, r: 0.0 });
        assert!(config.validate().is_err());

        let mut config = sample();
        config.wordline.r = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.cell = Area::new(0.0, 0.6);
        assert!(config.validate().is_err());
    }
}
