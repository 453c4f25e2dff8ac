use crate::{error::Result, reader::PayloadReader};

/// Unsigned 16.16 fixed-point number, as used for rates and track dimensions.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPoint32(pub u32);

impl FixedPoint32 {
    pub const ONE: FixedPoint32 = FixedPoint32(0x0001_0000);

    pub fn integer(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn fraction(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 65536.0
    }
}

impl std::fmt::Debug for FixedPoint32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

/// Signed 8.8 fixed-point number, as used for volume and balance.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPoint16(pub i16);

impl FixedPoint16 {
    pub const ONE: FixedPoint16 = FixedPoint16(0x0100);

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 256.0
    }
}

impl std::fmt::Debug for FixedPoint16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

// The 3x3 transformation matrix found in `mvhd` and `tkhd`. The first two columns are
// 16.16 values and the last column is 2.30, stored row by row.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Matrix(pub [i32; 9]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000]);

    pub(crate) fn read(payload: &mut PayloadReader<'_>) -> Result<Self> {
        let mut values = [0i32; 9];
        for value in values.iter_mut() {
            *value = payload.i32()?;
        }
        Ok(Matrix(values))
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::IDENTITY
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_identity() {
            write!(f, "identity")
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// ISO-639-2/T language code packed as three 5-bit letters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Language(pub u16);

impl Language {
    /// `und`, the code for an undetermined language.
    pub const UNDETERMINED: Language = Language(0x55C4);

    pub fn code(&self) -> String {
        [10u16, 5, 0]
            .iter()
            .map(|shift| (((self.0 >> shift) & 0x1F) as u8 + 0x60) as char)
            .collect()
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::UNDETERMINED
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
