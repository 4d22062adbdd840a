//
// ISO/IEC 14496-12:2015(E)
// 8.6.1.4 Composition to Decode Box
//

use std::io;

use crate::boxes::prelude::*;

/// Composition to Decode Box (`cslg`).
///
/// Records the shift applied between composition and decode timestamps, so
/// a reader can recover the un-shifted CTS values and the track's overall
/// composition time range without walking every `ctts` entry.
#[derive(Clone, Debug)]
pub struct CompositionToDecodeBox {
    pub composition_to_dts_shift:        i64,
    pub least_decode_to_display_delta:   i64,
    pub greatest_decode_to_display_delta: i64,
    pub composition_start_time:          i64,
    pub composition_end_time:            i64,
}

impl FromBytes for CompositionToDecodeBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<CompositionToDecodeBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        let b = if stream.version() == 0 {
            CompositionToDecodeBox {
                composition_to_dts_shift:         i32::from_bytes(stream)? as i64,
                least_decode_to_display_delta:    i32::from_bytes(stream)? as i64,
                greatest_decode_to_display_delta: i32::from_bytes(stream)? as i64,
                composition_start_time:           i32::from_bytes(stream)? as i64,
                composition_end_time:             i32::from_bytes(stream)? as i64,
            }
        } else {
            CompositionToDecodeBox {
                composition_to_dts_shift:         i64::from_bytes(stream)?,
                least_decode_to_display_delta:    i64::from_bytes(stream)?,
                greatest_decode_to_display_delta: i64::from_bytes(stream)?,
                composition_start_time:           i64::from_bytes(stream)?,
                composition_end_time:             i64::from_bytes(stream)?,
            }
        };
        Ok(b)
    }

    fn min_size() -> usize { 20 }
}

impl ToBytes for CompositionToDecodeBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        if stream.version() == 0 {
            (self.composition_to_dts_shift as i32).to_bytes(stream)?;
            (self.least_decode_to_display_delta as i32).to_bytes(stream)?;
            (self.greatest_decode_to_display_delta as i32).to_bytes(stream)?;
            (self.composition_start_time as i32).to_bytes(stream)?;
            (self.composition_end_time as i32).to_bytes(stream)?;
        } else {
            self.composition_to_dts_shift.to_bytes(stream)?;
            self.least_decode_to_display_delta.to_bytes(stream)?;
            self.greatest_decode_to_display_delta.to_bytes(stream)?;
            self.composition_start_time.to_bytes(stream)?;
            self.composition_end_time.to_bytes(stream)?;
        }

        stream.finalize()
    }
}

impl BoxInfo for CompositionToDecodeBox {
    const FOURCC: &'static str = "cslg";

    #[inline]
    fn max_version() -> Option<u8> {
        Some(1)
    }
}

impl FullBox for CompositionToDecodeBox {
    fn version(&self) -> Option<u8> {
        let fits_i32 = |v: i64| v >= i32::MIN as i64 && v <= i32::MAX as i64;
        if [
            self.composition_to_dts_shift,
            self.least_decode_to_display_delta,
            self.greatest_decode_to_display_delta,
            self.composition_start_time,
            self.composition_end_time,
        ]
        .iter()
        .all(|&v| fits_i32(v))
        {
            Some(0)
        } else {
            Some(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemBuffer;

    #[test]
    fn roundtrips_version0() {
        let b = CompositionToDecodeBox {
            composition_to_dts_shift: 10,
            least_decode_to_display_delta: -5,
            greatest_decode_to_display_delta: 20,
            composition_start_time: 0,
            composition_end_time: 1000,
        };
        let mut buf = MemBuffer::new();
        b.to_bytes(&mut buf).unwrap();
        let bytes = buf.into_vec();
        let mut slice: &[u8] = &bytes;
        let parsed = CompositionToDecodeBox::from_bytes(&mut slice).unwrap();
        assert_eq!(parsed.composition_to_dts_shift, 10);
        assert_eq!(parsed.composition_end_time, 1000);
    }

    #[test]
    fn picks_version1_for_large_values() {
        let b = CompositionToDecodeBox {
            composition_to_dts_shift: 1i64 << 40,
            least_decode_to_display_delta: 0,
            greatest_decode_to_display_delta: 0,
            composition_start_time: 0,
            composition_end_time: 0,
        };
        assert_eq!(b.version(), Some(1));
    }
}
