//! AC-3 sync-frame header parsing (ETSI TS 102 366 Annex A), feeding the
//! already-present `AC3SpecificBox` / `dac3`.

use std::io;

use crate::bitreader::BitReader;
use crate::boxes::ac_3::AC3SpecificBox;

const SYNC_WORD: u16 = 0x0b77;

/// Bit rate (kbit/s) indexed by `frmsizecod >> 1` (ETSI TS 102 366 table 4.13).
const BITRATE_TABLE: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Parse one AC-3 sync frame header and build the corresponding `dac3`
/// specific box (`construct_from_frame` in the distilled spec's vocabulary).
pub fn construct_from_frame(frame: &[u8]) -> io::Result<AC3SpecificBox> {
    if frame.len() < 7 {
        return Err(ioerr!(UnexpectedEof, "AC-3 frame shorter than the fixed header"));
    }
    let sync = u16::from_be_bytes([frame[0], frame[1]]);
    if sync != SYNC_WORD {
        return Err(ioerr!(InvalidData, "missing AC-3 sync word"));
    }

    // Skip crc1 (16 bits), then fscod/frmsizecod.
    let mut r = BitReader::new(&frame[4..]);
    let fscod = r.read_bits(2)? as u8;
    let frmsizecod = r.read_bits(6)? as u8;
    let bsid = r.read_bits(5)? as u8;
    let bsmod = r.read_bits(3)? as u8;
    let acmod = r.read_bits(3)? as u8;

    if acmod != 2 {
        // not dual-mono: skip cmixlev/surmixlev depending on acmod, as needed.
        if (acmod & 0x01) != 0 && acmod != 1 {
            let _cmixlev = r.read_bits(2)?;
        }
        if (acmod & 0x04) != 0 {
            let _surmixlev = r.read_bits(2)?;
        }
    } else {
        let _dsurmod = r.read_bits(2)?;
    }
    let lfeon = r.read_bits(1)? != 0;

    if fscod > 2 {
        return Err(ioerr!(InvalidData, "invalid AC-3 fscod {}", fscod));
    }
    let bitrate_code = frmsizecod >> 1;
    if bitrate_code as usize >= BITRATE_TABLE.len() {
        return Err(ioerr!(InvalidData, "invalid AC-3 frmsizecod {}", frmsizecod));
    }

    Ok(AC3SpecificBox {
        fscod,
        bsid,
        bsmod,
        acmod,
        lfeon,
        bitrate_code,
        reserved: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(fscod: u8, frmsizecod: u8, bsid: u8, bsmod: u8, acmod: u8, lfeon: bool) -> Vec<u8> {
        let mut w = crate::bitreader::BitWriter::new();
        w.write_bits(fscod as u32, 2);
        w.write_bits(frmsizecod as u32, 6);
        w.write_bits(bsid as u32, 5);
        w.write_bits(bsmod as u32, 3);
        w.write_bits(acmod as u32, 3);
        if acmod != 2 {
            if (acmod & 0x01) != 0 && acmod != 1 {
                w.write_bits(0, 2);
            }
            if (acmod & 0x04) != 0 {
                w.write_bits(0, 2);
            }
        } else {
            w.write_bits(0, 2);
        }
        w.write_bit(lfeon);
        let body = w.into_bytes();

        let mut frame = vec![0x0b, 0x77, 0, 0];
        frame.extend_from_slice(&body);
        while frame.len() < 7 {
            frame.push(0);
        }
        frame
    }

    #[test]
    fn parses_basic_frame() {
        let frame = build_frame(0, 10, 8, 0, 7, true);
        let dac3 = construct_from_frame(&frame).unwrap();
        assert_eq!(dac3.fscod, 0);
        assert_eq!(dac3.bsid, 8);
        assert_eq!(dac3.acmod, 7);
        assert!(dac3.lfeon);
        assert_eq!(dac3.bitrate_code, 5);
    }

    #[test]
    fn rejects_missing_sync_word() {
        let mut frame = build_frame(0, 10, 8, 0, 7, true);
        frame[0] = 0;
        assert!(construct_from_frame(&frame).is_err());
    }
}
