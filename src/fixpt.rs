/// Signed Q15.16 fixed point number.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Fixpt(i32);

macro_rules! fixpt {
    ($numerator:literal / $denominator:literal) => {
        Fixpt::from_fraction($numerator, $denominator)
    };
    ($numerator:literal / $denominator:ident) => {
        Fixpt::from_fraction($numerator, $denominator)
    };
    ($numerator:ident / $denominator:literal) => {
        Fixpt::from_fraction($numerator, $denominator)
    };
    ($numerator:ident / $denominator:ident) => {
        Fixpt::from_fraction($numerator, $denominator)
    };
    ($numerator:literal) => {
        Fixpt::from_int($numerator)
    };
    ($numerator:ident) => {
        Fixpt::from_int($numerator)
    };
}
pub(crate) use fixpt;

impl Fixpt {
    pub const SHIFT: u32 = 16;

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_int(int: i16) -> Self {
        Self((int as i32) << Self::SHIFT)
    }

    /// Truncates towards zero.
    pub const fn from_fraction(numerator: i32, denominator: i32) -> Self {
        let mut q: i64 = 1 << Self::SHIFT;
        q *= numerator as i64;
        q /= denominator as i64;
        Self::from_q_sat(q)
    }

    const fn from_q_sat(v: i64) -> Self {
        if v < i32::MIN as i64 {
            Self(i32::MIN)
        } else if v > i32::MAX as i64 {
            Self(i32::MAX)
        } else {
            Self(v as i32)
        }
    }

    /// Integer part, rounded towards negative infinity.
    pub const fn to_int(self) -> i16 {
        (self.0 >> Self::SHIFT) as i16
    }

    pub const fn to_q(self) -> i32 {
        self.0
    }

    pub const fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub const fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub const fn mul(self, other: Self) -> Self {
        let prod = (self.0 as i64 * other.0 as i64) >> Self::SHIFT;
        Self::from_q_sat(prod)
    }

    pub const fn neg(self) -> Self {
        if self.0 == i32::MIN {
            Self(i32::MAX)
        } else {
            Self(-self.0)
        }
    }

    pub const fn abs(self) -> Self {
        if self.0 < 0 { self.neg() } else { self }
    }
}

impl From<u8> for Fixpt {
    fn from(value: u8) -> Self {
        Self::from_int(value.into())
    }
}

impl From<i8> for Fixpt {
    fn from(value: i8) -> Self {
        Self::from_int(value.into())
    }
}

impl From<i16> for Fixpt {
    fn from(value: i16) -> Self {
        Self::from_int(value)
    }
}

impl From<u16> for Fixpt {
    fn from(value: u16) -> Self {
        Self::from_q_sat((value as i64) << Self::SHIFT)
    }
}

impl core::ops::Add for Fixpt {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Fixpt::add(self, other)
    }
}

impl core::ops::AddAssign for Fixpt {
    fn add_assign(&mut self, other: Self) {
        self.0 = (*self + other).0;
    }
}

impl core::ops::Sub for Fixpt {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Fixpt::sub(self, other)
    }
}

impl core::ops::SubAssign for Fixpt {
    fn sub_assign(&mut self, other: Self) {
        self.0 = (*self - other).0;
    }
}

impl core::ops::Mul for Fixpt {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Fixpt::mul(self, other)
    }
}

impl core::ops::Neg for Fixpt {
    type Output = Self;

    fn neg(self) -> Self {
        Fixpt::neg(self)
    }
}


// vim: ts=4 sw=4 expandtab
