///
/// If a type implements IntoRegister, then we can store its bit representation
/// in a 32-bit register.
///
/// Narrow unsigned types are zero-extended. That's what `lbu`/`lhu` need, and
/// `lb`/`lh` sign-extend to `i32` before they get here, so the register never
/// depends on the width of the type it came from.
///
pub trait IntoRegister {
    fn into_register(self) -> u32;
}

macro_rules! impl_into_reg {
    ($type:ident, $conv:ident) => {
        impl IntoRegister for $type {
            fn into_register(self) -> u32 {
                self as $conv as u32
            }
        }
    };
}

impl_into_reg!(u32, u32);
impl_into_reg!(i32, u32);
impl_into_reg!(u16, u16);
impl_into_reg!(u8, u8);

/// `slt` and friends write 1 or 0
impl IntoRegister for bool {
    fn into_register(self) -> u32 {
        self as u32
    }
}

/// Reads a register's raw bits as some type, truncating if it's narrower than 32 bits
pub trait FromRegister {
    fn from_register(x: u32) -> Self;
}

macro_rules! impl_from_reg {
    ($type:ident) => {
        impl FromRegister for $type {
            fn from_register(x: u32) -> Self {
                x as $type
            }
        }
    };
}

impl_from_reg!(u32);
impl_from_reg!(i32);
impl_from_reg!(u16);
impl_from_reg!(i16);
impl_from_reg!(u8);
impl_from_reg!(i8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_bits() {
        assert_eq!((-1i32).into_register(), 0xffff_ffff);
        assert_eq!(0xbeefu16.into_register(), 0x0000_beef);
        assert_eq!(0x80u8.into_register(), 0x0000_0080);
        assert_eq!(true.into_register(), 1);
        assert_eq!(i8::from_register(0x1ff), -1);
        assert_eq!(u16::from_register(0x1234_5678), 0x5678);
    }
}
