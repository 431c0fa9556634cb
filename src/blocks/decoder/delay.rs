use serde::{Deserialize, Serialize};

use super::{Decoder, WordlineTopology};
use crate::blocks::gate::sizing::StageChain;
use crate::blocks::gate::GateType;
use crate::blocks::timing::{OutputLoad, PathTiming, StageVisit};
use crate::blocks::PowerDef;

/// Timing and energy of one decoder activation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderTiming {
    /// Delay to the (write) wordline.
    pub delay: f64,
    /// Delay to the read wordline. Zero unless the wordline is split.
    pub delay_rd: f64,
    /// Rise time of the read wordline if there is one, otherwise of the wordline.
    pub rise_time: f64,
    /// Dynamic energy per access plus leakage.
    pub power: PowerDef,
    /// Dynamic energy of the NAND and DEMUX gates.
    pub power_decoder: PowerDef,
    /// Dynamic energy of the wordline drivers.
    pub power_wordline: PowerDef,
}

impl DecoderTiming {
    /// Delay of the path that limits access time: the read wordline when
    /// there is one.
    pub fn critical_delay(&self) -> f64 {
        if self.delay_rd > 0.0 {
            self.delay_rd
        } else {
            self.delay
        }
    }
}

impl<'a> Decoder<'a> {
    /// Voltage the final driver stage swings its wordline load to.
    fn wordline_swing(&self) -> f64 {
        let params = &self.params;
        if params.is_wl_tr && (self.topology.is_split() || params.is_dram) {
            self.tech.wordline_voltage(params.is_dram, params.is_wl_tr)
        } else {
            self.tech.vdd()
        }
    }

    /// Propagates an edge of rise time `input_rise` from the decoder inputs to
    /// the wordline(s).
    ///
    /// The final driver stage charges its own drain at the core supply and the
    /// wordline at the wordline swing.
    pub fn compute_delays(&self, input_rise: f64) -> DecoderTiming {
        if !self.exists {
            return DecoderTiming::default();
        }

        let vdd = self.tech.vdd();
        let v_wl = self.wordline_swing();
        let energy = |v: &StageVisit| {
            if v.is_last {
                v.c_load * v_wl * v_wl + v.c_int * vdd * vdd
            } else {
                v.switching_energy(vdd)
            }
        };

        let model = self.model();
        let mut out = DecoderTiming::default();
        out.power.read.leakage = self.leakage;

        // NAND head gate.
        let head_rc = model.rc(self.head_gate, &self.head);
        let stage_cap = |chain: &StageChain, idx: usize| {
            chain.get(idx).map(|s| model.input_cap(s)).unwrap_or(0.0)
        };
        let c_head_load = match self.topology {
            WordlineTopology::Shared => stage_cap(&self.wl, 1),
            WordlineTopology::SplitNor => 2.0 * stage_cap(&self.wl, 0),
            WordlineTopology::SplitNorInv => stage_cap(&self.wl, 0) + stage_cap(&self.rd, 0),
        };
        let mut head = PathTiming::start(input_rise);
        head.advance(head_rc.tf(c_head_load));
        let e_head = (c_head_load + head_rc.c_int) * vdd * vdd;
        out.power.read.dynamic += e_head;
        out.power_decoder.read.dynamic += e_head;

        let wl_out = OutputLoad::distributed(self.params.c_ld_out, self.params.r_wire_out);

        if !self.topology.is_split() {
            let mut wl = head;
            model.propagate(&self.wl, self.head_gate, 1, wl_out, &mut wl, |v| {
                let e = energy(v);
                out.power.read.dynamic += e;
                out.power_wordline.read.dynamic += e;
            });
            out.delay = wl.delay;
            out.rise_time = wl.rise_time;
            return out;
        }

        // The head gate switches on writes too.
        out.power.write.dynamic += e_head;

        let mut wr = head;
        model.propagate(&self.wl, GateType::Nor2, 0, wl_out, &mut wr, |v| {
            let e = energy(v);
            out.power.write.dynamic += e;
            if v.index == 0 {
                out.power_decoder.read.dynamic += e;
            } else {
                out.power_wordline.write.dynamic += e;
            }
        });

        let rd_head = self.topology.read_head().unwrap_or(GateType::Nor2);
        let rd_out = OutputLoad::distributed(self.params.c_ld_out_rd(), self.params.r_wire_out_rd());
        let write_switches_rd = self.topology.writes_switch_read_wordline();
        let mut rd = head;
        model.propagate(&self.rd, rd_head, 0, rd_out, &mut rd, |v| {
            let e = energy(v);
            out.power.read.dynamic += e;
            if v.index == 0 {
                out.power_decoder.read.dynamic += e;
            } else {
                out.power_wordline.read.dynamic += e;
            }
            if write_switches_rd {
                out.power.write.dynamic += e;
                if v.index != 0 {
                    out.power_wordline.write.dynamic += e;
                }
            }
        });

        out.delay = wr.delay;
        out.delay_rd = rd.delay;
        out.rise_time = rd.rise_time;
        out
    }
}
