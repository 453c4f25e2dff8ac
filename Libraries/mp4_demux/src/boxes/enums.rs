use super::{
    co64::Co64Box, ctts::CttsBox, dinf::DinfBox, dref::DrefBox, edts::EdtsBox, elst::ElstBox,
    ftyp::FtypBox, generic::{Mp4Box, UnknownBox}, hdlr::HdlrBox, mdat::MdatBox, mdhd::MdhdBox,
    mdia::MdiaBox, meta::MetaBox, minf::MinfBox, moov::MoovBox, mvhd::MvhdBox, smhd::SmhdBox,
    stbl::StblBox, stco::StcoBox, stsc::StscBox, stsd::StsdBox, stss::StssBox, stsz::StszBox,
    stts::SttsBox, tkhd::TkhdBox, trak::TrakBox, udta::UdtaBox, vmhd::VmhdBox,
};

/// Every box kind the reader can hand back, one variant per decoder.
#[derive(Debug, Clone)]
pub enum Mp4BoxEnum {
    Co64(Co64Box),
    Ctts(CttsBox),
    Dinf(DinfBox),
    Dref(DrefBox),
    Edts(EdtsBox),
    Elst(ElstBox),
    Ftyp(FtypBox),
    Hdlr(HdlrBox),
    Mdat(MdatBox),
    Mdhd(MdhdBox),
    Mdia(MdiaBox),
    Meta(MetaBox),
    Minf(MinfBox),
    Moov(MoovBox),
    Mvhd(MvhdBox),
    Smhd(SmhdBox),
    Stbl(StblBox),
    Stco(StcoBox),
    Stsc(StscBox),
    Stsd(StsdBox),
    Stss(StssBox),
    Stsz(StszBox),
    Stts(SttsBox),
    Tkhd(TkhdBox),
    Trak(Box<TrakBox>),
    Udta(UdtaBox),
    Vmhd(VmhdBox),
    Unknown(UnknownBox),
}

impl Mp4BoxEnum {
    pub fn box_type(&self) -> [u8; 4] {
        match self {
            Mp4BoxEnum::Co64(b) => b.box_type(),
            Mp4BoxEnum::Ctts(b) => b.box_type(),
            Mp4BoxEnum::Dinf(b) => b.box_type(),
            Mp4BoxEnum::Dref(b) => b.box_type(),
            Mp4BoxEnum::Edts(b) => b.box_type(),
            Mp4BoxEnum::Elst(b) => b.box_type(),
            Mp4BoxEnum::Ftyp(b) => b.box_type(),
            Mp4BoxEnum::Hdlr(b) => b.box_type(),
            Mp4BoxEnum::Mdat(b) => b.box_type(),
            Mp4BoxEnum::Mdhd(b) => b.box_type(),
            Mp4BoxEnum::Mdia(b) => b.box_type(),
            Mp4BoxEnum::Meta(b) => b.box_type(),
            Mp4BoxEnum::Minf(b) => b.box_type(),
            Mp4BoxEnum::Moov(b) => b.box_type(),
            Mp4BoxEnum::Mvhd(b) => b.box_type(),
            Mp4BoxEnum::Smhd(b) => b.box_type(),
            Mp4BoxEnum::Stbl(b) => b.box_type(),
            Mp4BoxEnum::Stco(b) => b.box_type(),
            Mp4BoxEnum::Stsc(b) => b.box_type(),
            Mp4BoxEnum::Stsd(b) => b.box_type(),
            Mp4BoxEnum::Stss(b) => b.box_type(),
            Mp4BoxEnum::Stsz(b) => b.box_type(),
            Mp4BoxEnum::Stts(b) => b.box_type(),
            Mp4BoxEnum::Tkhd(b) => b.box_type(),
            Mp4BoxEnum::Trak(b) => b.box_type(),
            Mp4BoxEnum::Udta(b) => b.box_type(),
            Mp4BoxEnum::Vmhd(b) => b.box_type(),
            Mp4BoxEnum::Unknown(b) => b.box_type(),
        }
    }
}
