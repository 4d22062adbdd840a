//! HEVC / H.265 bitstream parsing (ISO/IEC 23008-2), parallel in structure
//! to `codec::h264` but tracking VPS/SPS/PPS and the `hvcC` NAL-unit arrays
//! (each array carries an `array_completeness` flag, ISO/IEC 14496-15
//! 8.3.3.1).

use std::io;

use crate::boxes::hevc::{HevcDecoderConfigurationRecord, HevcNalArray};
use crate::codec::ParamSetResult;

fn nal_unit_type(nal: &[u8]) -> Option<u8> {
    // HEVC NAL header: forbidden_zero_bit(1) nal_unit_type(6) layer_id(6) tid(3)
    nal.first().map(|b| (b >> 1) & 0x3f)
}

const NAL_VPS: u8 = 32;
const NAL_SPS: u8 = 33;
const NAL_PPS: u8 = 34;

/// Ordered collection of VPS/SPS/PPS NAL units for one HEVC track.
#[derive(Debug, Clone, Default)]
pub struct HevcParameterSets {
    pub vps: Vec<Vec<u8>>,
    pub sps: Vec<Vec<u8>>,
    pub pps: Vec<Vec<u8>>,
    /// Whether each array type is known-complete (no out-of-band sets).
    pub array_completeness: bool,
}

impl HevcParameterSets {
    pub fn new() -> HevcParameterSets {
        HevcParameterSets { array_completeness: true, ..Default::default() }
    }

    fn append(set: &mut Vec<Vec<u8>>, nal_type: u8, nal: &[u8], expected: u8) -> io::Result<ParamSetResult> {
        if nal_unit_type(nal) != Some(expected) {
            return Err(ioerr!(InvalidData, "unexpected NAL unit type {:?}, wanted {}", nal_unit_type(nal), expected));
        }
        let _ = nal_type;
        if set.iter().any(|n| n.as_slice() == nal) {
            return Ok(ParamSetResult::Duplicate);
        }
        set.push(nal.to_vec());
        Ok(ParamSetResult::Appended)
    }

    pub fn append_vps(&mut self, nal: &[u8]) -> io::Result<ParamSetResult> {
        Self::append(&mut self.vps, NAL_VPS, nal, NAL_VPS)
    }

    pub fn append_sps(&mut self, nal: &[u8]) -> io::Result<ParamSetResult> {
        Self::append(&mut self.sps, NAL_SPS, nal, NAL_SPS)
    }

    pub fn append_pps(&mut self, nal: &[u8]) -> io::Result<ParamSetResult> {
        Self::append(&mut self.pps, NAL_PPS, nal, NAL_PPS)
    }

    /// Build an `HevcDecoderConfigurationRecord`. The per-stream profile
    /// fields are caller-supplied (extracting them fully from the raw SPS
    /// profile_tier_level structure is not needed by the muxer, which only
    /// has to round-trip whatever the importer already parsed out).
    pub fn to_hvcc(
        &self,
        general_profile_space: u8,
        general_tier_flag: bool,
        general_profile_idc: u8,
        general_profile_compatibility_flags: u32,
        general_constraint_indicator_flags: u64,
        general_level_idc: u8,
    ) -> io::Result<HevcDecoderConfigurationRecord> {
        if self.sps.is_empty() {
            return Err(ioerr!(InvalidData, "cannot build hvcC without at least one SPS"));
        }
        let mut arrays = Vec::new();
        if !self.vps.is_empty() {
            arrays.push(HevcNalArray {
                array_completeness: self.array_completeness,
                nal_unit_type: NAL_VPS,
                nal_units: self.vps.clone(),
            });
        }
        arrays.push(HevcNalArray {
            array_completeness: self.array_completeness,
            nal_unit_type: NAL_SPS,
            nal_units: self.sps.clone(),
        });
        if !self.pps.is_empty() {
            arrays.push(HevcNalArray {
                array_completeness: self.array_completeness,
                nal_unit_type: NAL_PPS,
                nal_units: self.pps.clone(),
            });
        }

        Ok(HevcDecoderConfigurationRecord {
            configuration_version: 1,
            general_profile_space,
            general_tier_flag,
            general_profile_idc,
            general_profile_compatibility_flags,
            general_constraint_indicator_flags,
            general_level_idc,
            min_spatial_segmentation_idc: 0,
            parallelism_type: 0,
            chroma_format_idc: 1,
            bit_depth_luma_minus8: 0,
            bit_depth_chroma_minus8: 0,
            avg_frame_rate: 0,
            constant_frame_rate: 0,
            num_temporal_layers: 1,
            temporal_id_nested: true,
            length_size_minus_one: 3,
            arrays,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nal(unit_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut v = vec![(unit_type << 1) & 0x7e, 0];
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn append_tracks_duplicates() {
        let mut sets = HevcParameterSets::new();
        let sps = nal(NAL_SPS, &[1, 2, 3]);
        assert_eq!(sets.append_sps(&sps).unwrap(), ParamSetResult::Appended);
        assert_eq!(sets.append_sps(&sps).unwrap(), ParamSetResult::Duplicate);
    }

    #[test]
    fn rejects_wrong_nal_type() {
        let mut sets = HevcParameterSets::new();
        let pps = nal(NAL_PPS, &[1]);
        assert!(sets.append_sps(&pps).is_err());
    }

    #[test]
    fn to_hvcc_includes_all_arrays() {
        let mut sets = HevcParameterSets::new();
        sets.append_vps(&nal(NAL_VPS, &[9])).unwrap();
        sets.append_sps(&nal(NAL_SPS, &[1, 2])).unwrap();
        sets.append_pps(&nal(NAL_PPS, &[3])).unwrap();
        let hvcc = sets.to_hvcc(0, true, 1, 0x60000000, 0, 93).unwrap();
        assert_eq!(hvcc.arrays.len(), 3);
        assert_eq!(hvcc.general_level_idc, 93);
    }
}
