//! The read-only technology table shared by every decode-path component.
//!
//! A [`TechParams`] is built once (from [`TechParams::default`] or a TOML
//! file) and passed by reference into every constructor. Nothing mutates it
//! afterwards.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

pub mod circuit;

pub use circuit::{horowitz, Channel, Edge};

/// The memory cell topology, which decides whether rows have a single
/// wordline or separate write and read wordlines.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SramCellDesign {
    #[default]
    Standard,
    EightT,
    TenT,
}

impl SramCellDesign {
    /// Whether the cell has a dedicated read wordline.
    #[inline]
    pub fn has_read_wordline(&self) -> bool {
        matches!(self, SramCellDesign::EightT | SramCellDesign::TenT)
    }
}

impl Display for SramCellDesign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SramCellDesign::Standard => write!(f, "standard"),
            SramCellDesign::EightT => write!(f, "8T"),
            SramCellDesign::TenT => write!(f, "10T"),
        }
    }
}

/// Which transistor flavor a gate is built from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeviceKind {
    Peripheral,
    SramCell,
    DramWordline,
}

impl DeviceKind {
    pub fn select(is_dram: bool, is_wl_tr: bool) -> Self {
        match (is_dram, is_wl_tr) {
            (true, true) => DeviceKind::DramWordline,
            (false, true) => DeviceKind::SramCell,
            _ => DeviceKind::Peripheral,
        }
    }
}

/// Electrical parameters of one transistor flavor.
///
/// Capacitances are per micron of width (junction area per square micron),
/// on-resistances are in ohm-microns and off-currents in amps per micron.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceParams {
    pub c_g_ideal: f64,
    pub c_fringe: f64,
    pub c_overlap: f64,
    pub c_junc: f64,
    pub c_junc_sidewall: f64,
    /// Physical gate length in microns.
    pub l_phy: f64,
    pub r_nch_on: f64,
    pub r_pch_on: f64,
    pub i_off_n: f64,
    pub i_off_p: f64,
    /// Ratio of NMOS to PMOS effective drive current, used as the P/N sizing ratio.
    pub n_to_p_eff_curr_drv_ratio: f64,
    pub vdd: f64,
}

/// Leakage multipliers applied to a gate's raw off-current to account for
/// transistor stacking.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakStackFactors {
    pub inv: f64,
    pub nand2: f64,
    pub nand3: f64,
    pub nor2: f64,
}

impl Default for LeakStackFactors {
    fn default() -> Self {
        Self {
            inv: 1.0,
            nand2: 0.2,
            nand3: 0.1,
            nor2: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechParams {
    /// Feature size in microns.
    pub feature_size: f64,
    pub min_w_nmos: f64,
    pub max_w_nmos: f64,
    /// Upper bound on the NMOS width of row decoder stages.
    pub max_w_nmos_dec: f64,
    /// Default height of a peripheral gate.
    pub cell_h_def: f64,
    /// Height of a row decoder gate as a multiple of the memory cell height.
    pub h_dec: f64,
    pub hpowerrail: f64,
    pub min_gap_bet_p_and_n_diffs: f64,
    pub w_poly_contact: f64,
    pub spacing_poly_to_contact: f64,
    pub spacing_poly_to_poly: f64,
    /// Poly wire capacitance per micron.
    pub cpolywire: f64,
    /// Local wire capacitance per micron.
    pub wire_local_c_per_um: f64,
    /// Boosted DRAM wordline voltage.
    pub vpp: f64,
    pub peri_global: DeviceParams,
    pub sram_cell: DeviceParams,
    pub dram_wl: DeviceParams,
    pub leak_stack: LeakStackFactors,
    pub cell_design: SramCellDesign,
}

impl Default for TechParams {
    /// A 45 nm-class process with high-performance peripheral devices.
    fn default() -> Self {
        let f = 0.045;
        Self {
            feature_size: f,
            min_w_nmos: 1.5 * f,
            max_w_nmos: 100.0 * f,
            max_w_nmos_dec: 30.0 * f,
            cell_h_def: 50.0 * f,
            h_dec: 4.0,
            hpowerrail: 2.0 * f,
            min_gap_bet_p_and_n_diffs: 5.0 * f,
            w_poly_contact: f,
            spacing_poly_to_contact: f,
            spacing_poly_to_poly: 1.5 * f,
            cpolywire: 1.8e-16,
            wire_local_c_per_um: 0.19e-15,
            vpp: 1.5,
            peri_global: DeviceParams {
                c_g_ideal: 4.69e-16,
                c_fringe: 0.08e-15,
                c_overlap: 0.938e-16,
                c_junc: 1.0e-15,
                c_junc_sidewall: 0.25e-15,
                l_phy: 0.018,
                r_nch_on: 1.33e3,
                r_pch_on: 3.2e3,
                i_off_n: 2.8e-7,
                i_off_p: 2.4e-7,
                n_to_p_eff_curr_drv_ratio: 2.41,
                vdd: 1.0,
            },
            sram_cell: DeviceParams {
                c_g_ideal: 6.0e-16,
                c_fringe: 0.08e-15,
                c_overlap: 1.2e-16,
                c_junc: 1.0e-15,
                c_junc_sidewall: 0.25e-15,
                l_phy: 0.022,
                r_nch_on: 2.9e3,
                r_pch_on: 6.4e3,
                i_off_n: 2.1e-11,
                i_off_p: 1.2e-11,
                n_to_p_eff_curr_drv_ratio: 2.2,
                vdd: 1.1,
            },
            dram_wl: DeviceParams {
                c_g_ideal: 7.5e-16,
                c_fringe: 0.08e-15,
                c_overlap: 1.5e-16,
                c_junc: 1.0e-15,
                c_junc_sidewall: 0.25e-15,
                l_phy: 0.045,
                r_nch_on: 6.0e3,
                r_pch_on: 12.0e3,
                i_off_n: 1.0e-12,
                i_off_p: 1.0e-12,
                n_to_p_eff_curr_drv_ratio: 1.95,
                vdd: 1.1,
            },
            leak_stack: LeakStackFactors::default(),
            cell_design: SramCellDesign::Standard,
        }
    }
}

impl TechParams {
    #[inline]
    pub fn with_cell_design(mut self, cell_design: SramCellDesign) -> Self {
        self.cell_design = cell_design;
        self
    }

    /// The core (peripheral) supply voltage.
    #[inline]
    pub fn vdd(&self) -> f64 {
        self.peri_global.vdd
    }

    #[inline]
    pub fn device(&self, kind: DeviceKind) -> &DeviceParams {
        match kind {
            DeviceKind::Peripheral => &self.peri_global,
            DeviceKind::SramCell => &self.sram_cell,
            DeviceKind::DramWordline => &self.dram_wl,
        }
    }

    /// The voltage a wordline swings to.
    ///
    /// DRAM wordline transistors are driven to the boosted `vpp`; SRAM
    /// wordline transistors swing to the cell supply. Everything else uses the
    /// core supply.
    pub fn wordline_voltage(&self, is_dram: bool, is_wl_tr: bool) -> f64 {
        match DeviceKind::select(is_dram, is_wl_tr) {
            DeviceKind::DramWordline => self.vpp,
            DeviceKind::SramCell => self.sram_cell.vdd,
            DeviceKind::Peripheral => self.peri_global.vdd,
        }
    }
}

pub fn parse_tech(path: impl AsRef<Path>) -> Result<TechParams> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_selection() {
        assert_eq!(DeviceKind::select(false, false), DeviceKind::Peripheral);
        assert_eq!(DeviceKind::select(true, false), DeviceKind::Peripheral);
        assert_eq!(DeviceKind::select(false, true), DeviceKind::SramCell);
        assert_eq!(DeviceKind::select(true, true), DeviceKind::DramWordline);
    }

    #[test]
    fn test_wordline_voltage() {
        let tech = TechParams::default();
        assert_eq!(tech.wordline_voltage(false, false), tech.vdd());
        assert_eq!(tech.wordline_voltage(true, true), tech.vpp);
        assert_eq!(tech.wordline_voltage(false, true), tech.sram_cell.vdd);
    }

    #[test]
    fn test_partial_tech_override() {
        let tech: TechParams = toml::from_str(
            r#"
            h_dec = 8.0
            cell_design = "ten_t"

            [leak_stack]
            nand2 = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(tech.h_dec, 8.0);
        assert_eq!(tech.cell_design, SramCellDesign::TenT);
        assert_eq!(tech.leak_stack.nand2, 0.3);
        assert_eq!(tech.leak_stack.inv, LeakStackFactors::default().inv);
        assert_eq!(tech.min_w_nmos, TechParams::default().min_w_nmos);
    }

    #[test]
    fn test_stack_factors_distinct() {
        let s = LeakStackFactors::default();
        let factors = [s.inv, s.nand2, s.nand3, s.nor2];
        for (i, a) in factors.iter().enumerate() {
            for b in &factors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
