use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `FtypBox` struct represents a File Type Box in the MP4 file format.
// This box specifies the file type and compatibility information for the MP4 file.
// It contains the following fields:
// - `major_brand`: A 4-byte array indicating the major brand of the file.
// - `minor_version`: A 32-bit unsigned integer indicating the minor version of the major brand.
// - `compatible_brands`: A vector of 4-byte arrays indicating other compatible brands.
#[derive(Clone)]
pub struct FtypBox {
    pub major_brand: [u8; 4], // Major brand of the file.
    pub minor_version: u32,   // Minor version of the major brand.
    pub compatible_brands: Vec<[u8; 4]>, // List of compatible brands.
}

impl FtypBox {
    /// True when `brand` is the major brand or one of the compatible brands.
    pub fn is_compatible_with(&self, brand: &[u8; 4]) -> bool {
        &self.major_brand == brand || self.compatible_brands.contains(brand)
    }
}

impl Default for FtypBox {
    fn default() -> Self {
        FtypBox {
            major_brand: *b"isom",
            minor_version: 0x200,
            compatible_brands: vec![*b"isom", *b"iso2", *b"avc1", *b"mp41"],
        }
    }
}

impl std::fmt::Debug for FtypBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtypBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("major_brand", &format_fourcc(&self.major_brand))
            .field("minor_version", &self.minor_version)
            .field("compatible_brands",
                &self.compatible_brands.iter()
                    .map(format_fourcc)
                    .collect::<Vec<_>>()
            )
            .finish()
    }
}

impl Mp4Box for FtypBox {
    fn box_type(&self) -> [u8; 4] { *b"ftyp" }

    // Reads the major brand, the minor version and then 4-byte brands until the payload ends.
    // A tail that is not a whole brand is rejected.
    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let major_brand = payload.fourcc()?;
        let minor_version = payload.u32()?;
        if payload.remaining() % 4 != 0 {
            return Err(payload.error(format!(
                "{} bytes of compatible brands is not a multiple of 4",
                payload.remaining()
            )));
        }
        let mut compatible_brands = Vec::with_capacity(payload.remaining() / 4);
        while payload.remaining() > 0 {
            compatible_brands.push(payload.fourcc()?);
        }

        Ok(FtypBox { major_brand, minor_version, compatible_brands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Mp4Error, reader::tests::{boxed, read_single}};

    #[test]
    fn reads_brands() {
        let ftyp: FtypBox = read_single(&boxed(b"ftyp", b"isom\0\0\x02\0isomavc1")).unwrap();
        assert_eq!(&ftyp.major_brand, b"isom");
        assert_eq!(ftyp.minor_version, 0x200);
        assert_eq!(ftyp.compatible_brands, vec![*b"isom", *b"avc1"]);
        assert!(ftyp.is_compatible_with(b"avc1"));
        assert!(!ftyp.is_compatible_with(b"mp42"));
    }

    #[test]
    fn partial_brand_is_malformed() {
        let result = read_single::<FtypBox>(&boxed(b"ftyp", b"isom\0\0\0\0is"));
        assert!(matches!(result, Err(Mp4Error::MalformedBox { box_type, .. }) if &box_type == b"ftyp"));
    }
}
