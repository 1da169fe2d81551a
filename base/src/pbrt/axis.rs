//! Axis

use std::ops::Add;

/// 3-D coordinate axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    #[default]
    X = 0,
    Y = 1,
    Z = 2,
}

impl From<usize> for Axis {
    fn from(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => panic!("invalid axis value {i}"),
        }
    }
}

impl From<Axis> for usize {
    fn from(axis: Axis) -> usize {
        axis as usize
    }
}

impl From<Axis> for u8 {
    fn from(axis: Axis) -> u8 {
        axis as u8
    }
}

impl Add<usize> for Axis {
    type Output = Axis;

    /// Cycles to the next axis, wrapping Z back to X.
    fn add(self, i: usize) -> Self::Output {
        Axis::from((self as usize + i) % 3)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
pub fn axis_3d_strategy() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_wraps() {
        assert_eq!(Axis::Z + 1, Axis::X);
        assert_eq!(Axis::X + 2, Axis::Z);
        assert_eq!(usize::from(Axis::Y), 1);
    }

    #[test]
    #[should_panic]
    fn axis_out_of_range() {
        let _ = Axis::from(3_usize);
    }
}
