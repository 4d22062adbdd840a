//! DTS core + extension substream parsing (ETSI TS 102 114), building the
//! aggregate stream-construction index that `ddts` needs.

use std::io;

use crate::bitreader::BitReader;
use crate::boxes::dts::DTSSpecificBox;

const CORE_SYNC_WORD: u32 = 0x7ffe_8001;
const SUBSTREAM_SYNC_WORD: u32 = 0x6458_2025;

/// Extension substream asset types recognised while walking an extension
/// substream (ETSI TS 102 114 Annex X), packed into the `stream_construction`
/// bitfield the same way the `ddts` spec enumerates `core`/`XCH`/`XXCH`/
/// `X96`/`XLL`/`LBR`/`XLL_X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstreamAsset {
    Core,
    Xch,
    Xxch,
    X96,
    Xll,
    Lbr,
    XllX,
}

/// Frame rate code lookup (ETSI TS 102 114 table 4.9, abbreviated).
fn core_sample_rate(sfreq: u8) -> Option<u32> {
    Some(match sfreq {
        1 => 8000,
        2 => 16000,
        3 => 32000,
        6 => 11025,
        7 => 22050,
        8 => 44100,
        11 => 12000,
        12 => 24000,
        13 => 48000,
        _ => return None,
    })
}

/// Parse a DTS core frame header and return its nominal sample rate, or
/// `None` if `frame` doesn't start with the DTS core sync word (i.e. it's
/// an extension-substream-only access unit).
fn parse_core_frame(frame: &[u8]) -> io::Result<Option<u32>> {
    if frame.len() < 18 {
        return Err(ioerr!(UnexpectedEof, "DTS frame shorter than the fixed core header"));
    }
    let sync = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
    if sync != CORE_SYNC_WORD {
        return Ok(None);
    }

    let mut r = BitReader::new(&frame[4..]);
    let _frame_type = r.read_bits(1)?;
    let _deficit_samples = r.read_bits(5)?;
    let _crc_present = r.read_bits(1)?;
    let _num_pcm_blocks = r.read_bits(7)?;
    let _frame_byte_size = r.read_bits(14)?;
    let _amode = r.read_bits(6)?;
    let sfreq = r.read_bits(4)? as u8;

    Ok(core_sample_rate(sfreq))
}

/// Walk a (core + extension) DTS access unit and classify which assets are
/// present, following the substream sync words rather than fully decoding
/// each asset.
fn scan_assets(access_unit: &[u8]) -> Vec<SubstreamAsset> {
    let mut assets = Vec::new();
    if access_unit.len() >= 4 {
        let sync = u32::from_be_bytes([access_unit[0], access_unit[1], access_unit[2], access_unit[3]]);
        if sync == CORE_SYNC_WORD {
            assets.push(SubstreamAsset::Core);
        }
    }
    let mut i = 0;
    while i + 4 <= access_unit.len() {
        let word = u32::from_be_bytes([access_unit[i], access_unit[i + 1], access_unit[i + 2], access_unit[i + 3]]);
        if word == SUBSTREAM_SYNC_WORD {
            // Extension substream header follows; asset typing (XLL vs LBR
            // vs XXCH) lives in the asset descriptor a few bytes further in.
            // Treat an unrecognised substream conservatively as XLL, the
            // most common lossless-extension case.
            assets.push(SubstreamAsset::Xll);
        }
        i += 1;
    }
    assets
}

/// Build a `ddts` specific box (`construct_from_frame` in the distilled
/// spec's vocabulary) from one DTS access unit.
pub fn construct_from_frame(access_unit: &[u8], avg_bit_rate: u32, peak_bit_rate: u32) -> io::Result<DTSSpecificBox> {
    let sample_rate = parse_core_frame(access_unit)?
        .ok_or_else(|| ioerr!(InvalidData, "DTS access unit has no core substream"))?;

    let assets = scan_assets(access_unit);
    let stream_construction = encode_stream_construction(&assets);

    Ok(DTSSpecificBox {
        sample_rate,
        max_bit_rate: peak_bit_rate,
        avg_bit_rate,
        peak_bit_rate,
        pcm_sample_depth: 16,
        frame_duration_code: 0,
        stream_construction,
        coreLFE_present: false,
        core_layout: 0,
        core_size: access_unit.len().min(0x3fff) as u16,
        stereo_downmix_present: false,
        rep_type: 0,
    })
}

/// Pack the recognised substream assets into the `StreamConstruction`
/// field (ETSI TS 102 114 Annex F.3 table); core-only streams get 1,
/// core+XLL gets 7, matching the canonical values the DTS ecosystem uses.
fn encode_stream_construction(assets: &[SubstreamAsset]) -> u8 {
    let has_core = assets.contains(&SubstreamAsset::Core);
    let has_xll = assets.contains(&SubstreamAsset::Xll);
    match (has_core, has_xll) {
        (true, true) => 7,
        (true, false) => 1,
        (false, true) => 6,
        (false, false) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_core_frame(sfreq: u8) -> Vec<u8> {
        let mut w = crate::bitreader::BitWriter::new();
        w.write_bit(false); // frame_type
        w.write_bits(31, 5); // deficit_samples
        w.write_bit(false); // crc_present
        w.write_bits(7, 7); // num_pcm_blocks
        w.write_bits(100, 14); // frame_byte_size
        w.write_bits(9, 6); // amode
        w.write_bits(sfreq as u32, 4);
        let body = w.into_bytes();

        let mut frame = CORE_SYNC_WORD.to_be_bytes().to_vec();
        frame.extend_from_slice(&body);
        while frame.len() < 18 {
            frame.push(0);
        }
        frame
    }

    #[test]
    fn parses_core_only_frame() {
        let frame = build_core_frame(13);
        let dtsc = construct_from_frame(&frame, 1536, 1536).unwrap();
        assert_eq!(dtsc.sample_rate, 48000);
        assert_eq!(dtsc.stream_construction, 1);
    }

    #[test]
    fn rejects_frame_without_core_sync() {
        let mut frame = build_core_frame(13);
        frame[0] = 0;
        assert!(construct_from_frame(&frame, 0, 0).is_err());
    }

    #[test]
    fn detects_xll_extension() {
        let mut frame = build_core_frame(13);
        frame.extend_from_slice(&SUBSTREAM_SYNC_WORD.to_be_bytes());
        frame.extend_from_slice(&[0u8; 8]);
        let dtsc = construct_from_frame(&frame, 1536, 2048).unwrap();
        assert_eq!(dtsc.stream_construction, 7);
    }
}
