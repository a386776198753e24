use std::fmt::Debug;

use num_traits::{AsPrimitive, NumAssignOps, NumOps, Zero};
use palette::cast::ArrayCast;

/// Color types that can be cast to and from an array of `N` channel values.
///
/// This is implemented for any [`ArrayCast`] color, e.g. `Srgb<u8>` (`N = 3`)
/// or `Srgba<u8>` (`N = 4`).
pub trait ColorComponents<Component, const N: usize>:
    ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

impl<Color, Component, const N: usize> ColorComponents<Component, N> for Color where
    Color: ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

/// A type that can be summed losslessly into a wider `Sum` type,
/// alongside a `Count` of how many values went into the sum.
pub trait SumPromotion<Count>: Zero + Copy + Into<Self::Sum> + 'static {
    /// The accumulator type for running channel totals.
    type Sum: Zero + Copy + Debug + NumOps + NumAssignOps + AsPrimitive<Self> + From<Count>;
}

impl SumPromotion<u32> for u8 {
    type Sum = u64;
}

impl SumPromotion<u32> for u16 {
    type Sum = u64;
}

/// An unsigned integer color channel with a fixed bit width.
///
/// The bit width bounds the depth of a [`ColorTree`](crate::octree::ColorTree),
/// since each level of the tree consumes one bit of every channel.
pub trait Channel: SumPromotion<u32> {
    /// The bit width of the channel (`W`).
    const BITS: u8;

    /// Returns the bit at position `shift` (`0` is the least significant bit) as `0` or `1`.
    fn bit(self, shift: u8) -> usize;
}

impl Channel for u8 {
    const BITS: u8 = 8;

    #[inline]
    fn bit(self, shift: u8) -> usize {
        usize::from((self >> shift) & 1)
    }
}

impl Channel for u16 {
    const BITS: u8 = 16;

    #[inline]
    fn bit(self, shift: u8) -> usize {
        usize::from((self >> shift) & 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_read_from_the_top() {
        let c = 0b1010_0000u8;
        assert_eq!(c.bit(7), 1);
        assert_eq!(c.bit(6), 0);
        assert_eq!(c.bit(5), 1);
        assert_eq!(c.bit(0), 0);

        let c = 0x8001u16;
        assert_eq!(c.bit(15), 1);
        assert_eq!(c.bit(14), 0);
        assert_eq!(c.bit(0), 1);
    }
}
