//! Gate structure of a predecode block for each supported address-bit count.

use crate::blocks::gate::GateType;
use crate::blocks::PathPair;

pub const MIN_BLOCK_BITS: usize = 1;
pub const MAX_BLOCK_BITS: usize = 9;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockStructure {
    pub bits: usize,
    /// Which first-level NAND gates the block uses.
    pub l1_gates: PathPair<bool>,
    /// The second-level gate, if the block has a second level.
    pub l2_gate: Option<GateType>,
    /// Second-level gates driven by each first-level output.
    pub branch: PathPair<usize>,
    /// First-level gate instances.
    pub num_l1: PathPair<usize>,
    /// Second-level gate instances.
    pub num_l2: usize,
    /// Address-bit buffers driving each first-level path.
    pub drv_buffers: PathPair<usize>,
    /// First-level gate inputs each of those buffers drives.
    pub drv_fanout: PathPair<usize>,
}

const fn pair(nand2: usize, nand3: usize) -> PathPair<usize> {
    PathPair::new(nand2, nand3)
}

const N2: PathPair<bool> = PathPair::new(true, false);
const N3: PathPair<bool> = PathPair::new(false, true);
const N2_N3: PathPair<bool> = PathPair::new(true, true);

static BLOCK_STRUCTURES: [BlockStructure; MAX_BLOCK_BITS] = [
    BlockStructure {
        bits: 1,
        l1_gates: N2,
        l2_gate: None,
        branch: pair(1, 1),
        num_l1: pair(2, 0),
        num_l2: 0,
        drv_buffers: pair(1, 0),
        drv_fanout: pair(2, 0),
    },
    BlockStructure {
        bits: 2,
        l1_gates: N2,
        l2_gate: None,
        branch: pair(1, 1),
        num_l1: pair(4, 0),
        num_l2: 0,
        drv_buffers: pair(2, 0),
        drv_fanout: pair(4, 0),
    },
    BlockStructure {
        bits: 3,
        l1_gates: N3,
        l2_gate: None,
        branch: pair(1, 1),
        num_l1: pair(0, 8),
        num_l2: 0,
        drv_buffers: pair(0, 3),
        drv_fanout: pair(0, 8),
    },
    BlockStructure {
        bits: 4,
        l1_gates: N2,
        l2_gate: Some(GateType::Nand2),
        branch: pair(4, 1),
        num_l1: pair(8, 0),
        num_l2: 16,
        drv_buffers: pair(4, 0),
        drv_fanout: pair(4, 0),
    },
    BlockStructure {
        bits: 5,
        l1_gates: N2_N3,
        l2_gate: Some(GateType::Nand2),
        branch: pair(8, 4),
        num_l1: pair(4, 8),
        num_l2: 32,
        drv_buffers: pair(2, 3),
        drv_fanout: pair(4, 8),
    },
    BlockStructure {
        bits: 6,
        l1_gates: N3,
        l2_gate: Some(GateType::Nand2),
        branch: pair(1, 8),
        num_l1: pair(0, 16),
        num_l2: 64,
        drv_buffers: pair(0, 6),
        drv_fanout: pair(0, 8),
    },
    BlockStructure {
        bits: 7,
        l1_gates: N2_N3,
        l2_gate: Some(GateType::Nand3),
        branch: pair(32, 16),
        num_l1: pair(8, 8),
        num_l2: 128,
        drv_buffers: pair(4, 3),
        drv_fanout: pair(4, 8),
    },
    BlockStructure {
        bits: 8,
        l1_gates: N2_N3,
        l2_gate: Some(GateType::Nand3),
        branch: pair(64, 32),
        num_l1: pair(4, 16),
        num_l2: 256,
        drv_buffers: pair(2, 6),
        drv_fanout: pair(4, 8),
    },
    BlockStructure {
        bits: 9,
        l1_gates: N3,
        l2_gate: Some(GateType::Nand3),
        branch: pair(1, 64),
        num_l1: pair(0, 24),
        num_l2: 512,
        drv_buffers: pair(0, 9),
        drv_fanout: pair(0, 8),
    },
];

impl BlockStructure {
    #[inline]
    pub fn two_unique_paths(&self) -> bool {
        self.l1_gates.nand2 && self.l1_gates.nand3
    }

    #[inline]
    pub fn uses(&self, gate: GateType) -> bool {
        *self.l1_gates.get(gate)
    }

    /// The first-level gates the block uses, NAND2 first.
    pub fn active_paths(&self) -> impl Iterator<Item = GateType> + '_ {
        self.l1_gates
            .iter()
            .filter(|(_, used)| **used)
            .map(|(gate, _)| gate)
    }

    /// Checks that gate counts and fanouts describe a complete decode tree.
    pub fn is_consistent(&self) -> bool {
        let paths_match = self.l1_gates.iter().all(|(gate, &used)| {
            used == (*self.num_l1.get(gate) > 0) && used == (*self.drv_buffers.get(gate) > 0)
        });

        // Every address bit gets one driver buffer.
        let buffers = self.drv_buffers.nand2 + self.drv_buffers.nand3;

        // Each second-level input is fed by exactly one first-level output.
        let l2_inputs_fed = match self.l2_gate {
            Some(gate) => {
                let fed = self.num_l1.nand2 * self.branch.nand2
                    + self.num_l1.nand3 * self.branch.nand3;
                fed == self.num_l2 * gate.fan_in()
            }
            None => self.num_l2 == 0,
        };

        // A complete decode has one output per address combination.
        let outputs = if self.l2_gate.is_some() {
            self.num_l2
        } else {
            self.num_l1.nand2 + self.num_l1.nand3
        };

        paths_match && buffers == self.bits && l2_inputs_fed && outputs == 1 << self.bits
    }
}

/// The structure of a block decoding `bits` address bits.
///
/// # Panics
///
/// Panics if `bits` is outside 1 through 9; no such block can be built.
pub fn block_structure(bits: usize) -> &'static BlockStructure {
    assert!(
        (MIN_BLOCK_BITS..=MAX_BLOCK_BITS).contains(&bits),
        "predecode blocks decode {MIN_BLOCK_BITS} to {MAX_BLOCK_BITS} address bits, got {bits}"
    );
    let structure = &BLOCK_STRUCTURES[bits - 1];
    debug_assert!(structure.is_consistent());
    structure
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    macro_rules! test_block_structure {
        ($name:ident, bits: $bits:expr, l2: $l2:expr, branch: ($b2:expr, $b3:expr), l1: ($n2:expr, $n3:expr), num_l2: $nl2:expr, drv: ($d2:expr, $d3:expr)) => {
            #[test]
            fn $name() {
                let s = block_structure($bits);
                assert_eq!(s.bits, $bits);
                assert_eq!(s.l2_gate, $l2);
                assert_eq!(s.num_l1, PathPair::new($n2, $n3));
                assert_eq!(s.num_l2, $nl2);
                assert_eq!(s.drv_buffers, PathPair::new($d2, $d3));
                if s.uses(GateType::Nand2) {
                    assert_eq!(s.branch.nand2, $b2);
                }
                if s.uses(GateType::Nand3) {
                    assert_eq!(s.branch.nand3, $b3);
                }
                assert!(s.is_consistent());
            }
        };
    }

    test_block_structure!(test_block_1_bit, bits: 1, l2: None, branch: (1, 1), l1: (2, 0), num_l2: 0, drv: (1, 0));
    test_block_structure!(test_block_2_bits, bits: 2, l2: None, branch: (1, 1), l1: (4, 0), num_l2: 0, drv: (2, 0));
    test_block_structure!(test_block_3_bits, bits: 3, l2: None, branch: (1, 1), l1: (0, 8), num_l2: 0, drv: (0, 3));
    test_block_structure!(test_block_4_bits, bits: 4, l2: Some(GateType::Nand2), branch: (4, 1), l1: (8, 0), num_l2: 16, drv: (4, 0));
    test_block_structure!(test_block_5_bits, bits: 5, l2: Some(GateType::Nand2), branch: (8, 4), l1: (4, 8), num_l2: 32, drv: (2, 3));
    test_block_structure!(test_block_6_bits, bits: 6, l2: Some(GateType::Nand2), branch: (1, 8), l1: (0, 16), num_l2: 64, drv: (0, 6));
    test_block_structure!(test_block_7_bits, bits: 7, l2: Some(GateType::Nand3), branch: (32, 16), l1: (8, 8), num_l2: 128, drv: (4, 3));
    test_block_structure!(test_block_8_bits, bits: 8, l2: Some(GateType::Nand3), branch: (64, 32), l1: (4, 16), num_l2: 256, drv: (2, 6));
    test_block_structure!(test_block_9_bits, bits: 9, l2: Some(GateType::Nand3), branch: (1, 64), l1: (0, 24), num_l2: 512, drv: (0, 9));

    #[test]
    fn test_two_unique_paths() {
        let two = (MIN_BLOCK_BITS..=MAX_BLOCK_BITS)
            .filter(|&bits| block_structure(bits).two_unique_paths())
            .collect_vec();
        assert_eq!(two, vec![5, 7, 8]);
        let gates = block_structure(5).active_paths().collect_vec();
        assert_eq!(gates, vec![GateType::Nand2, GateType::Nand3]);
    }

    #[test]
    #[should_panic(expected = "got 10")]
    fn test_too_many_bits() {
        block_structure(10);
    }

    #[test]
    #[should_panic]
    fn test_zero_bits() {
        block_structure(0);
    }
}
