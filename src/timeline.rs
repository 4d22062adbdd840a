//! Track timeline reconstruction.
//!
//! Builds a flat, random-access view of a track's samples -- decode time,
//! composition time, size, absolute file offset, sample description index,
//! and the per-sample properties carried by `sdtp`/`sbgp`/`sgpd` -- out of
//! the run-length tables (`stts`/`ctts`/`stsc`/`stco`/`stsz`/`stss`) that
//! `sample_info.rs` already knows how to walk one sample at a time.
//!
//! `sample_info::SampleInfoIterator` remains the lightweight iterator used
//! by `track.rs`/`pseudo_streaming.rs` for simple duration/size queries.
//! `Timeline` is the richer, randomly-indexable structure the multiplexer
//! and finalizer need: closest-past-RAP lookups, re-sorting by composition
//! order, and overwriting timestamps wholesale from a timecode file.

use std::io;

use crate::boxes::TrackBox;
use crate::types::FourCC;

/// Classification of a sample's role in random access, derived from the
/// `"rap "`/`"roll"` sample-group entries and the legacy `stss` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RapKind {
    /// Listed in `stss`, or the track has no `stss` at all (every sample syncs).
    Sync,
    /// `"rap "` group entry with `num_leading_samples == 0`.
    ClosedRap,
    /// `"rap "` group entry with `num_leading_samples > 0`.
    OpenRap,
    /// `"rap "` group entry with `num_leading_samples_known == false`.
    UnknownRap,
    /// `"roll"` group entry with a positive roll distance: a post-roll
    /// recovery point, decodable correctly only `post_roll_id` samples later.
    PostRollStart,
    /// `"roll"` group entry with a negative roll distance: samples before
    /// this one are required to decode it but are not themselves presentable.
    PreRollEnd,
    /// Not a random access point of any kind.
    #[default]
    None,
}

/// Per-sample flags sourced from `sdtp` (leading/depends-on/depended-on/
/// redundancy) and the `"rap "`/`"roll"` sample groups.
#[derive(Debug, Clone, Default)]
pub struct SampleProperty {
    pub is_leading:             bool,
    pub independent:            bool,
    pub disposable:             bool,
    pub redundant:              bool,
    /// True if an earlier sample in decode order may be presented after
    /// this one (the `sample_is_depended_on` ambiguity `sdtp` allows for).
    pub earlier_pts_allowed:    bool,
    pub rap:                    RapKind,
    /// For `RapKind::PostRollStart`, the `"roll"` group description index
    /// that pairs this starting sample with its matching `PreRollEnd`.
    pub post_roll_id:           Option<u32>,
    /// For `RapKind::PreRollEnd`, the number of samples of pre-roll needed.
    pub pre_roll_distance:      Option<i16>,
}

/// A single reconstructed sample.
#[derive(Debug, Clone, Default)]
pub struct TimelineEntry {
    /// Decode timestamp, in the media timescale, cumulative from 0.
    pub dts:                        u64,
    /// Composition timestamp, `dts + ctts_offset + composition_shift`.
    pub cts:                        i64,
    pub size:                       u32,
    /// Absolute offset of the sample's data within the file (or mdat).
    pub offset:                     u64,
    /// 1-based index into the track's `SampleDescriptionBox`.
    pub sample_description_index:   u32,
    pub property:                   SampleProperty,
}

/// Reconstructed, randomly indexable view of a track's samples.
pub struct Timeline {
    pub timescale:          u32,
    /// Value added to every `dts + ctts_offset` to form `cts`; equal to
    /// `cslg.composition_to_dts_shift` when present, otherwise
    /// `max(0, max_i(-ctts_offset(i)))` -- the smallest shift that makes
    /// `cts >= dts` for every sample (invariant T3), independent of which
    /// sample that most-negative offset belongs to.
    pub composition_shift:  i64,
    entries:                Vec<TimelineEntry>,
    last_sample_delta:      u32,
}

const RAP_GROUPING_TYPE: &str = "rap ";
const ROLL_GROUPING_TYPE: &str = "roll";

impl Timeline {
    /// Reconstruct the full per-sample timeline of a track.
    pub fn from_track(track: &TrackBox) -> io::Result<Timeline> {
        let mdia = track.media();
        let timescale = mdia.media_header().timescale;
        let stbl = mdia.media_info().sample_table();

        let sizes: Vec<u32> = stbl.sample_size().iter().collect();
        let nsamples = sizes.len();

        let mut dts = Vec::with_capacity(nsamples);
        let mut last_delta = 1u32;
        {
            let mut prev_delta = 0u32;
            for (delta, cumulative) in stbl.time_to_sample().iter().take(nsamples) {
                dts.push(cumulative);
                prev_delta = delta;
            }
            if dts.len() < nsamples {
                return Err(ioerr!(InvalidData, "stts: fewer entries than samples"));
            }
            last_delta = if prev_delta == 0 && nsamples > 0 {
                log::warn!("Timeline: track has a zero last-sample delta, substituting max(1, previous delta)");
                std::cmp::max(1, prev_delta)
            } else {
                prev_delta
            };
        }

        let offsets: Vec<i32> = match stbl.composition_time_to_sample() {
            Some(ctts) => ctts.iter().take(nsamples).collect(),
            None => Vec::new(),
        };

        let composition_shift = match stbl.composition_to_decode() {
            Some(cslg) => cslg.composition_to_dts_shift,
            None => {
                let max_negated_offset = offsets.iter().map(|&o| -(o as i64)).max().unwrap_or(0);
                std::cmp::max(0, max_negated_offset)
            }
        };

        // Absolute file offsets: stsc tells us which chunk each sample is
        // in and the active sample-description index; stco gives the
        // chunk's base offset; sizes give the running offset within it.
        let chunk_offsets = &stbl.chunk_offset().entries;
        let mut offsets_out = Vec::with_capacity(nsamples);
        let mut sdis = Vec::with_capacity(nsamples);
        let mut cur_chunk = u32::MAX;
        let mut running = 0u64;
        for (i, e) in stbl.sample_to_chunk().iter().take(nsamples).enumerate() {
            if e.chunk != cur_chunk {
                cur_chunk = e.chunk;
                running = *chunk_offsets.get(cur_chunk as usize)
                    .ok_or_else(|| ioerr!(InvalidData, "stco: chunk {} out of range", cur_chunk))?;
            }
            offsets_out.push(running);
            sdis.push(e.sample_description_index + 1);
            running += sizes[i] as u64;
        }
        if offsets_out.len() < nsamples {
            return Err(ioerr!(InvalidData, "stsc: fewer entries than samples"));
        }

        let is_sync: Vec<bool> = match stbl.sync_samples() {
            Some(stss) => stss.iter().take(nsamples).collect(),
            None => std::iter::repeat(true).take(nsamples).collect(),
        };

        let depends: Vec<_> = match stbl.sample_dependency() {
            Some(sdtp) => sdtp.entries.iter().cloned().map(Some).collect(),
            None => std::iter::repeat(None).take(nsamples).collect(),
        };

        let rap_group = stbl.sample_group(&FourCC::new(RAP_GROUPING_TYPE));
        let roll_group = stbl.sample_group(&FourCC::new(ROLL_GROUPING_TYPE));

        let mut entries = Vec::with_capacity(nsamples);
        for i in 0..nsamples {
            let mut property = SampleProperty::default();

            if let Some(dep) = depends.get(i).and_then(|d| d.as_ref()) {
                property.is_leading = dep.is_leading == 1 || dep.is_leading == 3;
                property.independent = dep.is_independent();
                property.disposable = dep.is_disposable();
                property.redundant = dep.sample_has_redundancy == 1;
                property.earlier_pts_allowed = dep.sample_is_depended_on == 0;
            }

            property.rap = if is_sync[i] {
                RapKind::Sync
            } else if let Some(kind) = Self::rap_kind_from_group(rap_group, i as u32 + 1) {
                kind
            } else if let Some((kind, id, dist)) = Self::roll_kind_from_group(roll_group, i as u32 + 1) {
                property.post_roll_id = id;
                property.pre_roll_distance = dist;
                kind
            } else {
                RapKind::None
            };

            let offset = offsets.get(i).copied().unwrap_or(0) as i64;
            entries.push(TimelineEntry {
                dts: dts[i],
                cts: dts[i] as i64 + offset + composition_shift,
                size: sizes[i],
                offset: offsets_out[i],
                sample_description_index: sdis[i],
                property,
            });
        }

        Ok(Timeline { timescale, composition_shift, entries, last_sample_delta: last_delta })
    }

    fn rap_kind_from_group(
        group: Option<(&crate::boxes::SampleToGroupBox, &crate::boxes::SampleGroupDescriptionBox)>,
        sample: u32,
    ) -> Option<RapKind> {
        let (sbgp, sgpd) = group?;
        let idx = Self::group_description_index(sbgp, sample)?;
        let item = sgpd.entries().get((idx as usize).checked_sub(1)?)?;
        match &item.entry {
            crate::boxes::SampleGroupDescriptionEntry::VisualRandomAccessEntry(e) => {
                Some(if !e.num_leading_samples_known {
                    RapKind::UnknownRap
                } else if e.num_leading_samples == 0 {
                    RapKind::ClosedRap
                } else {
                    RapKind::OpenRap
                })
            }
            _ => None,
        }
    }

    fn roll_kind_from_group(
        group: Option<(&crate::boxes::SampleToGroupBox, &crate::boxes::SampleGroupDescriptionBox)>,
        sample: u32,
    ) -> Option<(RapKind, Option<u32>, Option<i16>)> {
        let (sbgp, sgpd) = group?;
        let idx = Self::group_description_index(sbgp, sample)?;
        let item = sgpd.entries().get((idx as usize).checked_sub(1)?)?;
        match &item.entry {
            crate::boxes::SampleGroupDescriptionEntry::RollRecoveryEntry(e) => {
                if e.roll_distance > 0 {
                    Some((RapKind::PostRollStart, Some(idx), None))
                } else if e.roll_distance < 0 {
                    Some((RapKind::PreRollEnd, None, Some(e.roll_distance)))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn group_description_index(sbgp: &crate::boxes::SampleToGroupBox, sample: u32) -> Option<u32> {
        let mut begin = 1u32;
        for e in sbgp.entries.iter() {
            let end = begin + e.sample_count - 1;
            if sample >= begin && sample <= end {
                if e.group_description_index == 0 {
                    return None;
                }
                return Some(e.group_description_index);
            }
            begin = end + 1;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Delta (in media timescale units) to use for the last sample's
    /// duration, since `stts` run-lengths only record inter-sample deltas.
    pub fn last_sample_delta(&self) -> u32 {
        self.last_sample_delta
    }

    pub fn max_sample_size(&self) -> u32 {
        self.entries.iter().map(|e| e.size).max().unwrap_or(0)
    }

    /// Total media duration, in the media timescale.
    pub fn media_duration(&self) -> u64 {
        match self.entries.last() {
            Some(e) => e.dts + self.last_sample_delta as u64,
            None => 0,
        }
    }

    /// The closest sample at or before `index` classified as any kind of
    /// random access point.
    pub fn closest_past_rap(&self, index: usize) -> Option<usize> {
        (0..=index).rev().find(|&i| {
            !matches!(self.entries.get(i).map(|e| e.property.rap), Some(RapKind::None) | None)
        })
    }

    /// Largest `cts - dts` over the whole track, i.e. how far composition
    /// order can run ahead of decode order.
    pub fn max_sample_delay(&self) -> u64 {
        self.entries.iter()
            .map(|e| (e.cts - e.dts as i64).max(0) as u64)
            .max()
            .unwrap_or(0)
    }

    /// Return sample indices (0-based) in ascending composition order.
    pub fn sort_by_composition(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&i| (self.entries[i].cts, i));
        order
    }

    /// Return sample indices (0-based) in ascending decode order (identity,
    /// since entries are always stored in decode order -- kept for symmetry
    /// with `sort_by_composition`).
    pub fn sort_by_decoding(&self) -> Vec<usize> {
        (0..self.entries.len()).collect()
    }

    /// Replace every sample's dts/cts with externally supplied values
    /// (e.g. from a parsed timecode file). `cts` defaults to `dts` when
    /// `None`.
    pub fn overwrite_timestamps(&mut self, dts: &[u64], cts: Option<&[i64]>) -> io::Result<()> {
        if dts.len() != self.entries.len() {
            return Err(ioerr!(InvalidData, "overwrite_timestamps: length mismatch"));
        }
        if let Some(cts) = cts {
            if cts.len() != self.entries.len() {
                return Err(ioerr!(InvalidData, "overwrite_timestamps: length mismatch"));
            }
        }
        for (i, e) in self.entries.iter_mut().enumerate() {
            e.dts = dts[i];
            e.cts = cts.map(|c| c[i]).unwrap_or(dts[i] as i64);
        }
        for w in self.entries.windows(2) {
            if w[1].dts < w[0].dts {
                return Err(ioerr!(InvalidData, "overwrite_timestamps: dts is not monotonically non-decreasing"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::*;
    use crate::types::*;
    use crate::mp4box::MP4Box;

    // SampleSizeBox's non-uniform path stores entries as a `DataRef` into a
    // real mmapped file, so these tests only exercise the uniform-size path
    // (`size != 0`), which covers dts/offset reconstruction just as well.
    fn sample_track(sizes: &[u32], deltas: &[u32]) -> TrackBox {
        let uniform_size = sizes[0];
        assert!(sizes.iter().all(|&s| s == uniform_size), "test helper only supports uniform sizes");

        let stsz = SampleSizeBox {
            size: uniform_size,
            count: sizes.len() as u32,
            entries: crate::io::DataRef::default(),
        };

        let mut stts = TimeToSampleBox::default();
        for &d in deltas {
            stts.entries.push(TimeToSampleEntry { count: 1, delta: d });
        }

        let mut stsc = SampleToChunkBox::default();
        stsc.entries.push(SampleToChunkEntry {
            first_chunk: 1,
            samples_per_chunk: sizes.len() as u32,
            sample_description_index: 1,
        });

        let mut stco = ChunkOffsetBox::default();
        stco.entries.push(1000);

        let stsd = SampleDescriptionBox {
            entries: {
                let mut e = ArraySized32::<MP4Box>::new();
                e.push(NullMediaHeaderBox::default().to_mp4box());
                e
            },
        };

        let mut stbl = SampleTableBox::default();
        stbl.boxes.push(stsd.to_mp4box());
        stbl.boxes.push(stsz.to_mp4box());
        stbl.boxes.push(stts.to_mp4box());
        stbl.boxes.push(stsc.to_mp4box());
        stbl.boxes.push(stco.to_mp4box());

        let minf = MediaInformationBox {
            boxes: vec![
                DataInformationBox { boxes: vec![] }.to_mp4box(),
                stbl.to_mp4box(),
            ],
        };

        let mdhd = MediaHeaderBox {
            cr_time: Time::default(),
            mod_time: Time::default(),
            timescale: 1000,
            duration: Duration_::default(),
            language: IsoLanguageCode::default(),
            quality: 0,
        };

        let hdlr = HandlerBox {
            handler_type: FourCC::new("vide"),
            name: ZString::default(),
        };

        let mdia = MediaBox {
            boxes: vec![mdhd.to_mp4box(), hdlr.to_mp4box(), minf.to_mp4box()],
        };

        let tkhd = TrackHeaderBox {
            flags: TrackFlags(7),
            cr_time: Time::default(),
            mod_time: Time::default(),
            track_id: 1,
            duration: Duration_::default(),
            layer: 0,
            alt_group: 0,
            volume: FixedFloat8_8::default(),
            matrix: Matrix::identity(),
            width: FixedFloat16_16::default(),
            height: FixedFloat16_16::default(),
        };

        TrackBox {
            boxes: vec![tkhd.to_mp4box(), mdia.to_mp4box()],
        }
    }

    #[test]
    fn timeline_reconstructs_uniform_sizes() {
        let sizes = [100u32, 100, 100, 100];
        let track = sample_track(&sizes, &[40, 40, 40, 40]);
        let timeline = Timeline::from_track(&track).unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.entry(0).unwrap().dts, 0);
        assert_eq!(timeline.entry(1).unwrap().dts, 40);
        assert_eq!(timeline.entry(2).unwrap().dts, 80);
        assert_eq!(timeline.entry(3).unwrap().dts, 120);
        assert_eq!(timeline.last_sample_delta(), 40);
        assert_eq!(timeline.media_duration(), 160);
        for e in timeline.entries() {
            assert_eq!(e.size, 100);
        }
        assert_eq!(timeline.entry(0).unwrap().offset, 1000);
        assert_eq!(timeline.entry(1).unwrap().offset, 1100);
    }

    #[test]
    fn timeline_is_monotonic() {
        let sizes = [50u32, 50, 50];
        let track = sample_track(&sizes, &[30, 30, 30]);
        let timeline = Timeline::from_track(&track).unwrap();
        let dts: Vec<u64> = timeline.entries().iter().map(|e| e.dts).collect();
        assert!(dts.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn composition_shift_depends_only_on_ctts_offsets() {
        // Sample 0 has dts=0 and offset=-5; sample 2 has dts=80 and the
        // most negative offset (-20). The shift must come from the most
        // negative offset wherever it occurs, not from whichever sample
        // has dts=0.
        let sizes = [10u32, 10, 10];
        let mut track = sample_track(&sizes, &[40, 40, 40]);
        {
            let stbl = track.media_mut().media_info_mut().sample_table_mut();
            let mut ctts = CompositionOffsetBox::default();
            ctts.entries.push(CompositionOffsetEntry { count: 1, offset: -5 });
            ctts.entries.push(CompositionOffsetEntry { count: 1, offset: 10 });
            ctts.entries.push(CompositionOffsetEntry { count: 1, offset: -20 });
            stbl.boxes.push(ctts.to_mp4box());
        }
        let timeline = Timeline::from_track(&track).unwrap();
        assert_eq!(timeline.composition_shift, 20);
        for e in timeline.entries() {
            assert!(e.cts >= e.dts as i64, "T3 violated: cts {} < dts {}", e.cts, e.dts);
        }
    }

    #[test]
    fn closest_past_rap_finds_sync_sample() {
        let sizes = [10u32, 10, 10];
        let mut track = sample_track(&sizes, &[10, 10, 10]);
        {
            let stbl = track.media_mut().media_info_mut().sample_table_mut();
            let stsz = stbl.sample_size_mut();
            stsz.size = 10;
            stsz.count = sizes.len() as u32;
        }
        let timeline = Timeline::from_track(&track).unwrap();
        // No stss present means every sample is implicitly sync.
        assert_eq!(timeline.closest_past_rap(2), Some(2));
    }
}
