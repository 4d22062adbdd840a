//! The box registry.
//!
//! `def_boxes!` declares the `MP4Box` enum (one variant per fourcc) and
//! pulls in every module that defines a box type. Box types that live
//! together in one file (e.g. all the `Tx3g*` boxes in `sbtl.rs`) only
//! need the `=> modname` tag on their first entry -- that's what brings
//! the module into scope, the rest just need to be listed.

pub (crate) mod prelude;

use crate::mp4box::*;
use crate::serialize::{FromBytes, ReadBytes, ToBytes, WriteBytes};
use crate::types::*;

def_boxes! {
    MP4Box,

    FileTypeBox, b"ftyp" => misc;
    InitialObjectDescriptionBox, b"iods";
    BaseMediaInformationHeaderBox, b"gmhd";
    SoundMediaHeaderBox, b"smhd";
    NullMediaHeaderBox, b"nmhd";
    UserDataBox, b"udta";
    TrackSelectionBox, b"tsel";
    MediaHeaderBox, b"mdhd";
    MovieHeaderBox, b"mvhd";
    HandlerBox, b"hdlr";
    ExtendedLanguageBox, b"elng";
    MetaBox, b"meta";
    NameBox, b"name";
    PixelAspectRatioBox, b"pasp";
    CleanApertureBox, b"clap";
    SubtitleMediaHeaderBox, b"sthd";
    MovieExtendsBox, b"mvex";
    TrackExtendsBox, b"trex";
    SegmentTypeBox, b"styp";
    MovieExtendsHeaderBox, b"mehd";
    MovieFragmentHeaderBox, b"mfhd";
    TrackFragmentBaseMediaDecodeTimeBox, b"tfdt";
    DataInformationBox, b"dinf";
    DataReferenceBox, b"dref";
    DataEntryUrlBox, b"url ";
    DataEntryUrnBox, b"urn ";

    MovieBox, b"moov" => moov;
    TrackBox, b"trak" => trak;
    MediaBox, b"mdia" => mdia;
    MediaInformationBox, b"minf" => minf;
    SampleTableBox, b"stbl" => stbl;

    TrackHeaderBox, b"tkhd" => tkhd;
    EditBox, b"edts" => edts;
    EditListBox, b"elst";

    VideoMediaHeaderBox, b"vmhd" => vmhd;

    TimeToSampleBox, b"stts" => stts;
    SyncSampleBox, b"stss" => stss;
    CompositionOffsetBox, b"ctts" => ctts;
    SampleToChunkBox, b"stsc" => stsc;
    ChunkOffsetBox, b"stco" => stco;
    ChunkLargeOffsetBox, b"co64";

    SampleDescriptionBox, b"stsd" => stsd;
    SampleSizeBox, b"stsz" => stsz;
    CompactSampleSizeBox, b"stz2" => stz2;

    SampleToGroupBox, b"sbgp" => sbgp;
    SampleGroupDescriptionBox, b"sgpd" => sgpd;

    SegmentIndexBox, b"sidx" => sidx;

    MovieFragmentBox, b"moof" => moof;
    TrackFragmentBox, b"traf" => traf;
    TrackFragmentHeaderBox, b"tfhd" => tfhd;
    TrackRunBox, b"trun" => trun;

    // Below are boxes that are defined manually in boxes/*.rs.

    Free, b"free" => free;
    Skip, b"skip";
    Wide, b"wide";

    MediaDataBox, b"mdat" => mdat;

    AvcSampleEntry, b"avc1" => avc1;
    AvcConfigurationBox, b"avcC";

    AacSampleEntry, b"mp4a" => mp4a;
    ESDescriptorBox, b"esds";

    Ac3SampleEntry, b"ac-3" => ac_3;
    AC3SpecificBox, b"dac3";

    Eac3SampleEntry, b"ec-3" => eac3;
    EC3SpecificBox, b"dec3";

    DtsCoreSampleEntry, b"dtsc" => dts;
    DtsHdSampleEntry, b"dtsh";
    DtsExpressSampleEntry, b"dtse";
    DTSSpecificBox, b"ddts";

    HevcSampleEntry, b"hev1" => hevc;
    Hvc1SampleEntry, b"hvc1";
    HevcConfigurationBox, b"hvcC";

    Vc1SampleEntry, b"vc-1" => vc1;
    Vc1ConfigurationBox, b"dvc1";

    AlacSampleEntry, b"alac" => alac;

    AmrNbSampleEntry, b"samr" => amr;
    AmrWbSampleEntry, b"sawb";
    AmrSpecificBox, b"damr";

    SowtSampleEntry, b"sowt" => pcm;
    TwosSampleEntry, b"twos";
    In24SampleEntry, b"in24";
    In32SampleEntry, b"in32";
    Fl32SampleEntry, b"fl32";
    Fl64SampleEntry, b"fl64";
    LpcmSampleEntry, b"lpcm";

    SampleDependencyTypeBox, b"sdtp" => sdtp;
    CompositionToDecodeBox, b"cslg" => cslg;
    ShadowSyncSampleBox, b"stsh" => stsh;
    ChapterListBox, b"chpl" => chpl;

    MovieFragmentRandomAccessBox, b"mfra" => mfra;
    TrackFragmentRandomAccessBox, b"tfra";
    MovieFragmentRandomAccessOffsetBox, b"mfro";

    XMLSubtitleSampleEntry, b"stpp" => sbtl;
    TextSubtitleSampleEntry, b"sbtt";
    Tx3gTextSampleEntry, b"tx3g";
    Tx3gFontTableBox, b"ftab";
    Tx3gTextStyleBox, b"styl";
    Tx3gTextHighlightBox, b"hlit";
    Tx3gTextHighlightColorBox, b"hclr";
    Tx3gTextKaraokeBox, b"krok";
    Tx3gTextScrollDelayBox, b"dlay";
    Tx3gTextHyperTextBox, b"href";

    AppleItemListBox, b"ilst" => ilst;
    IDataBox, b"data";
}
