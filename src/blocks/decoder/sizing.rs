use super::{Decoder, WordlineTopology};
use crate::blocks::gate::sizing::ChainSizer;
use crate::blocks::gate::GateType;
use crate::Result;

impl<'a> Decoder<'a> {
    /// Sizes the wordline driver(s) against the wordline load.
    ///
    /// A split wordline gets two independent drivers: the write driver is
    /// rooted at the NOR2 DEMUX gate and the read driver at the topology's
    /// read head gate. The NAND head gate stays minimum size.
    pub(super) fn compute_widths(&mut self) -> Result<()> {
        let tech = self.tech;
        let params = &self.params;
        let pn_ratio = tech.pn_ratio(params.is_dram, params.is_wl_tr);
        let sizer = ChainSizer::new(tech)
            .with_device(params.is_dram, params.is_wl_tr)
            .with_max_width(tech.max_w_nmos_dec);

        match self.topology {
            WordlineTopology::Shared => {
                self.wl = sizer.size(
                    self.head,
                    self.head_gate.logical_effort(pn_ratio),
                    params.c_ld_out,
                )?;
            }
            WordlineTopology::SplitNor | WordlineTopology::SplitNorInv => {
                let demux = GateType::Nor2;
                self.wl = sizer.size(
                    demux.min_size(tech.min_w_nmos, pn_ratio),
                    demux.logical_effort(pn_ratio),
                    params.c_ld_out,
                )?;

                let rd_head = self.topology.read_head().unwrap_or(GateType::Nor2);
                self.rd = sizer.size(
                    rd_head.min_size(tech.min_w_nmos, pn_ratio),
                    rd_head.logical_effort(pn_ratio),
                    params.c_ld_out_rd(),
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::params;
    use super::*;
    use crate::tech::SramCellDesign;
    use crate::tests::test_tech;

    #[test]
    fn test_shared_chain_rooted_at_nand() {
        let tech = test_tech();
        let dec = Decoder::new(params(256).way_select(true).build().unwrap(), &tech).unwrap();
        let head = dec.wordline_chain().head().unwrap();
        let pn = tech.pn_ratio(false, false);
        assert_eq!(*head, GateType::Nand3.min_size(tech.min_w_nmos, pn));
    }

    #[test]
    fn test_split_chains_rooted_at_demux() {
        let tech = test_tech().with_cell_design(SramCellDesign::TenT);
        let p = params(64).is_wl_tr(true).c_ld_out_rd(8e-14).build().unwrap();
        let dec = Decoder::new(p, &tech).unwrap();
        let pn = tech.pn_ratio(false, true);

        let wr_head = dec.wordline_chain().head().unwrap();
        let rd_head = dec.read_wordline_chain().head().unwrap();
        assert_eq!(*wr_head, GateType::Nor2.min_size(tech.min_w_nmos, pn));
        assert_eq!(*rd_head, GateType::Inv.min_size(tech.min_w_nmos, pn));
    }

    #[test]
    fn test_decoder_widths_bounded() {
        let tech = test_tech();
        let p = params(512).c_ld_out(1e-12).build().unwrap();
        let dec = Decoder::new(p, &tech).unwrap();
        for stage in dec.wordline_chain().stages() {
            assert!(stage.w_n <= tech.max_w_nmos_dec);
        }
    }
}
