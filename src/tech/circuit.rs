//! Circuit-physics primitives: capacitance, resistance, leakage, and area of
//! sized CMOS gates, plus the Horowitz transient delay approximation.

use crate::blocks::gate::GateType;

use super::{DeviceKind, TechParams};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Channel {
    Nmos,
    Pmos,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Edge {
    Rise,
    Fall,
}

/// Horowitz's closed-form approximation of the delay of a gate with time
/// constant `tf`, driven by an input ramp of duration `input_rise`.
///
/// `vs1` and `vs2` are the input and output switching thresholds as
/// fractions of the supply.
pub fn horowitz(input_rise: f64, tf: f64, vs1: f64, vs2: f64, edge: Edge) -> f64 {
    if input_rise == 0.0 && vs1 == vs2 {
        return tf * if vs1 < 1.0 { -vs1.ln() } else { vs1.ln() };
    }
    if tf <= 0.0 {
        return 0.0;
    }

    let a = input_rise / tf;
    match edge {
        Edge::Rise => {
            let b = 0.5;
            tf * (vs1.ln().powi(2) + 2.0 * a * b * (1.0 - vs1)).sqrt() + tf * (vs1.ln() - vs2.ln())
        }
        Edge::Fall => {
            let b = 0.4;
            tf * ((1.0 - vs1).ln().powi(2) + 2.0 * a * b * vs1).sqrt()
                + tf * ((1.0 - vs1).ln() - (1.0 - vs2).ln())
        }
    }
}

impl TechParams {
    /// Input capacitance of a transistor gate of the given width.
    pub fn gate_cap(&self, width: f64, is_dram: bool, is_wl_tr: bool) -> f64 {
        let dt = self.device(DeviceKind::select(is_dram, is_wl_tr));
        (dt.c_g_ideal + dt.c_overlap + 3.0 * dt.c_fringe) * width + dt.l_phy * self.cpolywire
    }

    /// PMOS-to-NMOS width ratio giving equal rise and fall drive.
    #[inline]
    pub fn pn_ratio(&self, is_dram: bool, is_wl_tr: bool) -> f64 {
        self.device(DeviceKind::select(is_dram, is_wl_tr))
            .n_to_p_eff_curr_drv_ratio
    }

    /// On-resistance of `stack` series transistors of the given width.
    pub fn on_resistance(
        &self,
        width: f64,
        channel: Channel,
        stack: usize,
        is_dram: bool,
        is_wl_tr: bool,
    ) -> f64 {
        let dt = self.device(DeviceKind::select(is_dram, is_wl_tr));
        let r = match channel {
            Channel::Nmos => dt.r_nch_on,
            Channel::Pmos => dt.r_pch_on,
        };
        stack as f64 * r / width
    }

    /// Drain capacitance of a transistor of the given width, folded to fit a
    /// gate of height `fold_height`.
    pub fn drain_cap(
        &self,
        width: f64,
        channel: Channel,
        stack: usize,
        fold_height: f64,
        is_dram: bool,
        is_wl_tr: bool,
    ) -> f64 {
        let dt = self.device(DeviceKind::select(is_dram, is_wl_tr));
        let stack = stack.max(1);

        // P diffusion takes two thirds of the transistor region.
        let ratio_p_to_n = 2.0 / 3.0;
        let h_tr_region = (fold_height
            - 2.0 * self.hpowerrail
            - self.min_gap_bet_p_and_n_diffs)
            .max(self.min_w_nmos);
        let mut w_folded = match channel {
            Channel::Nmos => (1.0 - ratio_p_to_n) * h_tr_region,
            Channel::Pmos => ratio_p_to_n * h_tr_region,
        }
        .max(self.min_w_nmos);

        let num_folded = (width / w_folded).ceil() as usize;
        if num_folded < 2 {
            w_folded = width;
        }

        let contact_pitch = self.w_poly_contact + 2.0 * self.spacing_poly_to_contact;
        let stack_gap = (stack - 1) as f64 * self.spacing_poly_to_poly;
        let mut total_drain_w = contact_pitch + stack_gap;
        let mut drain_h_for_sidewall = w_folded;
        let mut total_drain_h_wrt_gate = w_folded + 2.0 * w_folded * (stack - 1) as f64;
        let mut c_metal = 0.0;

        if num_folded > 1 {
            total_drain_w += (num_folded - 2) as f64 * contact_pitch
                + (num_folded - 1) as f64 * stack_gap;
            if num_folded % 2 == 0 {
                drain_h_for_sidewall = 0.0;
            }
            total_drain_h_wrt_gate *= num_folded as f64;
            c_metal = self.wire_local_c_per_um * total_drain_w;
        }

        let c_area = dt.c_junc * total_drain_w * w_folded;
        let c_sidewall = dt.c_junc_sidewall * (drain_h_for_sidewall + 2.0 * total_drain_w);
        let c_wrt_gate = 2.0 * (dt.c_fringe + dt.c_overlap) * total_drain_h_wrt_gate;

        c_area + c_sidewall + c_wrt_gate + c_metal
    }

    /// Off-state current of a gate, including its stacking factor.
    pub fn leakage_current(&self, gate: GateType, w_n: f64, w_p: f64) -> f64 {
        let dt = &self.peri_global;
        (w_n * dt.i_off_n + w_p * dt.i_off_p) * gate.leak_stack_factor(&self.leak_stack)
    }

    /// Layout area of a gate of height `height`, folding transistors that do
    /// not fit the available diffusion height.
    pub fn gate_area(&self, gate: GateType, w_p: f64, w_n: f64, height: f64) -> f64 {
        if w_p <= 0.0 || w_n <= 0.0 {
            return 0.0;
        }

        let h_tr_region = (height - 2.0 * self.hpowerrail - self.min_gap_bet_p_and_n_diffs)
            .max(2.0 * self.min_w_nmos);
        let ratio_p_to_n = w_p / (w_p + w_n);
        let w_folded_p = (h_tr_region * ratio_p_to_n).max(self.min_w_nmos);
        let w_folded_n = (h_tr_region * (1.0 - ratio_p_to_n)).max(self.min_w_nmos);
        let folds_p = (w_p / w_folded_p).ceil();
        let folds_n = (w_n / w_folded_n).ceil();

        let contact_pitch = self.w_poly_contact + 2.0 * self.spacing_poly_to_contact;
        let poly_pitch = self.feature_size + self.spacing_poly_to_poly;
        let (n_series, p_series) = gate.series_stacks();
        let n_parallel = p_series;
        let p_parallel = n_series;

        // Each fold of a series stack needs one contact; parallel devices
        // each get their own.
        let diff_w = |folds: f64, series: usize, parallel: usize| {
            folds * parallel as f64 * (contact_pitch + series as f64 * poly_pitch) + contact_pitch
        };
        let total_ndiff_w = diff_w(folds_n, n_series, n_parallel);
        let total_pdiff_w = diff_w(folds_p, p_series, p_parallel);

        total_ndiff_w.max(total_pdiff_w) * height
    }
}

#[cfg(test)]
mod tests {
    use approx::abs_diff_eq;

    use super::*;

    #[test]
    fn test_horowitz_step_input() {
        let tf = 1e-11;
        let d = horowitz(0.0, tf, 0.5, 0.5, Edge::Rise);
        assert!(abs_diff_eq!(d, tf * 2f64.ln(), epsilon = 1e-20));
    }

    #[test]
    fn test_horowitz_slow_input_is_slower() {
        let tf = 1e-11;
        let fast = horowitz(1e-12, tf, 0.5, 0.5, Edge::Rise);
        let slow = horowitz(1e-10, tf, 0.5, 0.5, Edge::Rise);
        assert!(fast > 0.0);
        assert!(slow > fast);
        assert!(horowitz(1e-10, tf, 0.5, 0.5, Edge::Fall) > 0.0);
    }

    #[test]
    fn test_horowitz_zero_tf() {
        assert_eq!(horowitz(1e-11, 0.0, 0.5, 0.5, Edge::Rise), 0.0);
    }

    #[test]
    fn test_caps_scale_with_width() {
        let tech = TechParams::default();
        let h = tech.cell_h_def;
        assert!(tech.gate_cap(2.0, false, false) > tech.gate_cap(1.0, false, false));
        assert!(
            tech.drain_cap(4.0, Channel::Nmos, 1, h, false, false)
                > tech.drain_cap(1.0, Channel::Nmos, 1, h, false, false)
        );
        assert!(
            tech.drain_cap(0.2, Channel::Nmos, 3, h, false, false)
                > tech.drain_cap(0.2, Channel::Nmos, 1, h, false, false)
        );
    }

    #[test]
    fn test_on_resistance() {
        let tech = TechParams::default();
        let r1 = tech.on_resistance(1.0, Channel::Nmos, 1, false, false);
        let r2 = tech.on_resistance(1.0, Channel::Nmos, 2, false, false);
        let r_wide = tech.on_resistance(2.0, Channel::Nmos, 1, false, false);
        assert!(abs_diff_eq!(r1, tech.peri_global.r_nch_on));
        assert!(abs_diff_eq!(r2, 2.0 * r1));
        assert!(abs_diff_eq!(r_wide, 0.5 * r1));
        assert!(tech.on_resistance(1.0, Channel::Pmos, 1, false, false) > r1);
    }

    #[test]
    fn test_leakage_stacking() {
        let tech = TechParams::default();
        let inv = tech.leakage_current(GateType::Inv, 0.1, 0.2);
        let nand2 = tech.leakage_current(GateType::Nand2, 0.1, 0.2);
        assert!(inv > 0.0);
        assert!(abs_diff_eq!(
            nand2 / inv,
            tech.leak_stack.nand2 / tech.leak_stack.inv,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn test_gate_area() {
        let tech = TechParams::default();
        let h = tech.cell_h_def;
        assert_eq!(tech.gate_area(GateType::Inv, 0.0, 0.1, h), 0.0);
        let inv = tech.gate_area(GateType::Inv, 0.2, 0.1, h);
        let nand3 = tech.gate_area(GateType::Nand3, 0.2, 0.3, h);
        let wide = tech.gate_area(GateType::Inv, 20.0, 10.0, h);
        assert!(inv > 0.0);
        assert!(nand3 > inv);
        assert!(wide > inv);
    }
}
