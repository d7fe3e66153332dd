use std::ops::Range;

pub const fn mask(range: Range<u32>) -> u32 {
    (u32::MAX >> (32 - (range.end - range.start))) << range.start
}

pub trait BitOps: Sized {
    /// Bits `range` of `self`, moved down to bit 0
    fn bits(self, range: Range<u32>) -> Self;

    /// Sign-extends a `width`-bit value to 32 bits
    fn sign_extend(self, width: u32) -> Self;
}

impl BitOps for u32 {
    fn bits(self, range: Range<u32>) -> Self {
        (self & mask(range.clone())) >> range.start
    }

    fn sign_extend(self, width: u32) -> Self {
        let shift = 32 - width;
        (((self << shift) as i32) >> shift) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(0..32), u32::MAX);
        assert_eq!(mask(0..7), 0x7f);
        assert_eq!(mask(12..32), 0xffff_f000);
        assert_eq!(mask(31..32), 0x8000_0000);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(0x800u32.sign_extend(12), 0xffff_f800);
        assert_eq!(0x7ffu32.sign_extend(12), 0x7ff);
        assert_eq!(0x1ffcu32.sign_extend(13) as i32, -4);
    }
}
