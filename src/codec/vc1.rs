//! VC-1 EBDU scanning (SMPTE 421M Annex E), enough to build the `dvc1`
//! configuration record's profile/level and pass through the raw sequence
//! header.

use std::io;

use crate::bitreader::BitReader;
use crate::boxes::vc1::Vc1DecoderConfigurationRecord;
use crate::types::Data;

const START_CODE_SEQUENCE_HEADER: u8 = 0x0f;
const START_CODE_ENTRY_POINT: u8 = 0x0e;

/// One Encapsulated Bitstream Data Unit: `(start_code_suffix, payload)`.
/// `payload` excludes the 4-byte `00 00 01 xx` prefix.
pub struct Ebdu<'a> {
    pub start_code_suffix: u8,
    pub payload:           &'a [u8],
}

/// Scan a VC-1 Annex-E byte stream for EBDUs.
pub fn scan_ebdus(data: &[u8]) -> Vec<Ebdu<'_>> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 4 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            starts.push(i);
            i += 4;
        } else {
            i += 1;
        }
    }
    let mut ebdus = Vec::with_capacity(starts.len());
    for (idx, &start) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).copied().unwrap_or(data.len());
        ebdus.push(Ebdu { start_code_suffix: data[start + 3], payload: &data[start + 4..end] });
    }
    ebdus
}

/// Profile/level recovered from an Advanced Profile sequence header.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceHeaderInfo {
    pub profile: u8,
    pub level:   u8,
}

/// Parse the leading bits of an Advanced-Profile VC-1 sequence header.
pub fn parse_sequence_header(payload: &[u8]) -> io::Result<SequenceHeaderInfo> {
    let mut r = BitReader::new(payload);
    let profile = r.read_bits(2)? as u8;
    if profile != 3 {
        return Err(ioerr!(InvalidData, "only Advanced Profile VC-1 sequence headers are supported, got profile {}", profile));
    }
    let level = r.read_bits(3)? as u8;
    Ok(SequenceHeaderInfo { profile, level })
}

/// Build a `dvc1` configuration record from a raw sequence-header (and
/// optionally entry-point) EBDU byte stream.
pub fn construct_from_sequence_header(raw: &[u8]) -> io::Result<Vc1DecoderConfigurationRecord> {
    let ebdus = scan_ebdus(raw);
    let seq = ebdus
        .iter()
        .find(|e| e.start_code_suffix == START_CODE_SEQUENCE_HEADER)
        .ok_or_else(|| ioerr!(InvalidData, "no VC-1 sequence header EBDU found"))?;
    let info = parse_sequence_header(seq.payload)?;

    Ok(Vc1DecoderConfigurationRecord {
        profile: info.profile,
        level:   info.level,
        sequence_header: Data(raw.to_vec()),
    })
}

#[allow(dead_code)]
fn is_entry_point(suffix: u8) -> bool {
    suffix == START_CODE_ENTRY_POINT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence_header_ebdu() -> Vec<u8> {
        let mut w = crate::bitreader::BitWriter::new();
        w.write_bits(3, 2); // profile = advanced
        w.write_bits(1, 3); // level 1
        w.write_bits(0, 16); // pad out a bit
        let body = w.into_bytes();
        let mut ebdu = vec![0, 0, 1, START_CODE_SEQUENCE_HEADER];
        ebdu.extend_from_slice(&body);
        ebdu
    }

    #[test]
    fn scans_single_ebdu() {
        let raw = sequence_header_ebdu();
        let ebdus = scan_ebdus(&raw);
        assert_eq!(ebdus.len(), 1);
        assert_eq!(ebdus[0].start_code_suffix, START_CODE_SEQUENCE_HEADER);
    }

    #[test]
    fn builds_config_record() {
        let raw = sequence_header_ebdu();
        let record = construct_from_sequence_header(&raw).unwrap();
        assert_eq!(record.profile, 3);
        assert_eq!(record.level, 1);
        assert_eq!(record.sequence_header.0, raw);
    }
}
