//! Decode-path components and the bookkeeping types they share.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use self::gate::GateType;

pub mod buf;
pub mod decoder;
pub mod gate;
pub mod predecode;
pub mod timing;

/// A rectangular footprint. Dimensions are in microns.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub h: f64,
    pub w: f64,
}

impl Area {
    #[inline]
    pub fn new(h: f64, w: f64) -> Self {
        Self { h, w }
    }

    /// A footprint of height `h` wide enough to hold `area`.
    pub fn with_height(area: f64, h: f64) -> Self {
        if h > 0.0 {
            Self { h, w: area / h }
        } else {
            Self::default()
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.h * self.w
    }
}

/// Energy per operation and leakage power of one component.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerComponents {
    /// Dynamic energy per operation, in joules.
    pub dynamic: f64,
    /// Leakage power, in watts.
    pub leakage: f64,
}

impl PowerComponents {
    #[inline]
    pub fn new(dynamic: f64, leakage: f64) -> Self {
        Self { dynamic, leakage }
    }

    #[inline]
    pub fn dynamic(dynamic: f64) -> Self {
        Self {
            dynamic,
            leakage: 0.0,
        }
    }

    #[inline]
    pub fn leakage(leakage: f64) -> Self {
        Self {
            dynamic: 0.0,
            leakage,
        }
    }
}

impl Add for PowerComponents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            dynamic: self.dynamic + rhs.dynamic,
            leakage: self.leakage + rhs.leakage,
        }
    }
}

impl AddAssign for PowerComponents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for PowerComponents {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            dynamic: self.dynamic * rhs,
            leakage: self.leakage * rhs,
        }
    }
}

/// Power split by read and write operations.
///
/// Components without a read/write distinction report everything under `read`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerDef {
    pub read: PowerComponents,
    pub write: PowerComponents,
}

impl PowerDef {
    #[inline]
    pub fn read_only(read: PowerComponents) -> Self {
        Self {
            read,
            write: PowerComponents::default(),
        }
    }
}

impl Add for PowerDef {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            read: self.read + rhs.read,
            write: self.write + rhs.write,
        }
    }
}

impl AddAssign for PowerDef {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Layout area and off-current accumulated over a group of gates.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Footprint {
    pub area: f64,
    pub i_leak: f64,
}

impl Add for Footprint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            area: self.area + rhs.area,
            i_leak: self.i_leak + rhs.i_leak,
        }
    }
}

impl AddAssign for Footprint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for Footprint {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            area: self.area * rhs,
            i_leak: self.i_leak * rhs,
        }
    }
}

/// Per-path state of a component with a NAND2-rooted and a NAND3-rooted path.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPair<T> {
    pub nand2: T,
    pub nand3: T,
}

impl<T> PathPair<T> {
    #[inline]
    pub const fn new(nand2: T, nand3: T) -> Self {
        Self { nand2, nand3 }
    }

    /// The path rooted at the given NAND gate.
    pub fn get(&self, gate: GateType) -> &T {
        match gate {
            GateType::Nand2 => &self.nand2,
            GateType::Nand3 => &self.nand3,
            _ => panic!("no predecode path is rooted at a {gate} gate"),
        }
    }

    pub fn get_mut(&mut self, gate: GateType) -> &mut T {
        match gate {
            GateType::Nand2 => &mut self.nand2,
            GateType::Nand3 => &mut self.nand3,
            _ => panic!("no predecode path is rooted at a {gate} gate"),
        }
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> PathPair<U> {
        PathPair {
            nand2: f(&self.nand2),
            nand3: f(&self.nand3),
        }
    }

    /// Both paths, tagged with the NAND gate each is rooted at.
    pub fn iter(&self) -> impl Iterator<Item = (GateType, &T)> {
        [(GateType::Nand2, &self.nand2), (GateType::Nand3, &self.nand3)].into_iter()
    }
}

impl<T: Copy> PathPair<T> {
    #[inline]
    pub fn splat(value: T) -> Self {
        Self {
            nand2: value,
            nand3: value,
        }
    }
}
