//! An analytical model of the address-decoding path of a memory array.
//!
//! Given the wordline load of an SRAM or DRAM array, the model sizes the
//! predecoder and row decoder gate chains with logical effort, then estimates
//! propagation delay, output rise time, area, dynamic energy, and leakage of
//! the whole decode path.

pub use error::{DecodeError, Result};

pub mod blocks;
pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod tech;

/// Integer base-2 logarithm, rounded down. Returns 0 for inputs of 0 or 1.
#[inline]
pub fn log2(x: usize) -> usize {
    if x <= 1 {
        0
    } else {
        (usize::BITS - 1 - x.leading_zeros()) as usize
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::tech::TechParams;

    pub(crate) fn test_tech() -> TechParams {
        TechParams::default()
    }

    /// Loads from 1 fF to 10 pF in 2% steps.
    pub(crate) fn load_sweep() -> impl Iterator<Item = f64> {
        std::iter::successors(Some(1e-15), |c| Some(c * 1.02)).take_while(|c| *c <= 1e-11)
    }

    #[test]
    fn test_log2() {
        assert_eq!(log2(0), 0);
        assert_eq!(log2(1), 0);
        assert_eq!(log2(2), 1);
        assert_eq!(log2(16), 4);
        assert_eq!(log2(17), 4);
        assert_eq!(log2(1024), 10);
    }
}
