//! Public API surface.
//!
//! Everything else in this crate (`mux`, `finalize`, `timeline`, `chapters`,
//! `timecode`) keeps returning `io::Result<T>`, exactly like the teacher's
//! read-side code does. This module is the one place that converts to
//! `crate::error::MuxError`, so the CLI tools (`muxer`, `remuxer`,
//! `boxdumper`, `timelineeditor`, out of scope here) get a typed cause
//! instead of a string to match on.
//!
//! `Root` owns global, file-independent state (brands, track-id allocation).
//! `MuxFile` is either a build-from-scratch session (`create`) that
//! `finish_movie` turns into bytes, or a read session (`open`) over an
//! already-written file, used for timeline queries and remuxing.

use std::path::Path;

use crate::boxes::*;
use crate::chapters;
use crate::error::{MuxError, MuxResult};
use crate::finalize::{self, TrackMeta};
use crate::mp4box::{MP4, MP4Box};
use crate::mux::{self, AccessUnit, DashMode, MuxConfig, OutputTrack};
use crate::serialize::{ToBytes, WriteBytes};
use crate::timecode;
use crate::timeline::Timeline;
use crate::types::*;

/// Global, file-independent muxing state: brand negotiation and track id
/// allocation. Roughly `lsmash_root_t` cut down to what this crate needs.
pub struct Root {
    pub major_brand:        FourCC,
    pub compatible_brands:  Vec<FourCC>,
    pub dash:                bool,
    pub movie_timescale:     u32,
    next_track_id:           u32,
}

impl Root {
    pub fn new() -> Root {
        Root {
            major_brand: FourCC::new("isom"),
            compatible_brands: vec![FourCC::new("isom"), FourCC::new("mp41")],
            dash: false,
            movie_timescale: 1000,
            next_track_id: 1,
        }
    }

    /// No-op beyond dropping `self`; kept so callers can spell
    /// open/create/close symmetrically, matching the distilled operation
    /// list in full.
    pub fn close(self) {}
}

impl Default for Root {
    fn default() -> Root {
        Root::new()
    }
}

struct BuildTrack {
    output: OutputTrack,
    meta:   TrackMeta,
}

/// Encode one chapter title the way a `tx3g` text sample does: a big-endian
/// u16 length prefix followed by the raw UTF-8 title bytes.
fn chapter_track_sample(title: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(2 + title.len());
    data.extend_from_slice(&(title.len() as u16).to_be_bytes());
    data.extend_from_slice(title.as_bytes());
    data
}

/// A muxing session: either building a new file from scratch (`create`) or
/// holding an already-parsed one open for timeline queries (`open`).
pub struct MuxFile {
    root:        Root,
    config:      MuxConfig,
    tracks:      Vec<BuildTrack>,
    mdat:        Vec<u8>,
    tyrant_chapters: Option<ChapterListBox>,
    itunes:      Option<AppleItemListBox>,
    opened:      Option<MP4>,
}

impl MuxFile {
    /// Open a build session: no file exists on disk yet.
    pub fn create(root: Root, config: MuxConfig) -> MuxFile {
        MuxFile {
            root,
            config: config.normalize(),
            tracks: Vec::new(),
            mdat: Vec::new(),
            tyrant_chapters: None,
            itunes: None,
            opened: None,
        }
    }

    /// Open an existing file read-only, for timeline queries / remuxing.
    pub fn open<P: AsRef<Path>>(path: P) -> MuxResult<MuxFile> {
        let mp4 = MP4::read(path)?;
        Ok(MuxFile {
            root: Root::new(),
            config: MuxConfig::default(),
            tracks: Vec::new(),
            mdat: Vec::new(),
            tyrant_chapters: None,
            itunes: None,
            opened: Some(mp4),
        })
    }

    pub fn close(self) {}

    pub fn set_movie_parameters(&mut self, timescale: u32) {
        self.root.movie_timescale = timescale;
    }

    pub fn movie_timescale(&self) -> u32 {
        self.root.movie_timescale
    }

    // -- track lifecycle -----------------------------------------------

    pub fn create_track(&mut self, timescale: u32, meta: TrackMeta) -> MuxResult<u32> {
        let track_id = self.root.next_track_id;
        self.root.next_track_id += 1;
        self.tracks.push(BuildTrack { output: OutputTrack::new(track_id, timescale), meta });
        Ok(track_id)
    }

    pub fn delete_track(&mut self, track_id: u32) -> MuxResult<()> {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.output.track_id != track_id);
        if self.tracks.len() == before {
            return Err(MuxError::FunctionParam(format!("no such track {}", track_id)));
        }
        Ok(())
    }

    fn find_track_mut(&mut self, track_id: u32) -> MuxResult<&mut BuildTrack> {
        self.tracks
            .iter_mut()
            .find(|t| t.output.track_id == track_id)
            .ok_or_else(|| MuxError::FunctionParam(format!("no such track {}", track_id)))
    }

    fn find_track(&self, track_id: u32) -> MuxResult<&BuildTrack> {
        self.tracks
            .iter()
            .find(|t| t.output.track_id == track_id)
            .ok_or_else(|| MuxError::FunctionParam(format!("no such track {}", track_id)))
    }

    /// Append a sample description entry (e.g. a codec-specific
    /// `SampleEntry` variant), returning its 1-based index.
    pub fn add_sample_description_entry(&mut self, track_id: u32, entry: MP4Box) -> MuxResult<u32> {
        let t = self.find_track_mut(track_id)?;
        t.meta.sample_description.entries.push(entry);
        Ok(t.meta.sample_description.entries.len() as u32)
    }

    /// Append one access unit's payload to the `mdat` accumulator and hand
    /// it to the track's chunking policy.
    pub fn add_sample(&mut self, track_id: u32, sample: AccessUnit) -> MuxResult<()> {
        let offset = self.mdat.len() as u64;
        let data = sample.data.clone();
        let config = self.config.clone();
        let t = self.find_track_mut(track_id)?;
        t.output.add_sample(sample, &config, offset)?;
        self.mdat.extend_from_slice(&data);
        Ok(())
    }

    /// Force the named track's pending samples into a chunk now, instead
    /// of waiting for the next chunk-closure condition.
    pub fn flush_pooled_samples(&mut self, track_id: u32) -> MuxResult<()> {
        let offset = self.mdat.len() as u64;
        let t = self.find_track_mut(track_id)?;
        t.output.flush(offset);
        Ok(())
    }

    fn flush_all(&mut self) {
        let offset = self.mdat.len() as u64;
        for t in self.tracks.iter_mut() {
            t.output.flush(offset);
        }
    }

    // -- edit lists ------------------------------------------------------

    pub fn create_edit(&mut self, track_id: u32, entry: EditListEntry) -> MuxResult<usize> {
        let t = self.find_track_mut(track_id)?;
        let elst = t
            .meta
            .edit_list
            .get_or_insert_with(|| EditListBox { entries: Vec::new().into_iter().collect() });
        elst.entries.push(entry);
        Ok(elst.entries.len() - 1)
    }

    pub fn modify_edit(&mut self, track_id: u32, index: usize, entry: EditListEntry) -> MuxResult<()> {
        let t = self.find_track_mut(track_id)?;
        let elst = t
            .meta
            .edit_list
            .as_mut()
            .ok_or_else(|| MuxError::FunctionParam("track has no edit list".to_string()))?;
        let slot = elst
            .entries
            .get_mut(index)
            .ok_or_else(|| MuxError::FunctionParam(format!("no edit {}", index)))?;
        *slot = entry;
        Ok(())
    }

    pub fn get_edit(&self, track_id: u32, index: usize) -> MuxResult<EditListEntry> {
        let t = self.find_track(track_id)?;
        let elst = t
            .meta
            .edit_list
            .as_ref()
            .ok_or_else(|| MuxError::FunctionParam("track has no edit list".to_string()))?;
        elst.entries
            .get(index)
            .cloned()
            .ok_or_else(|| MuxError::FunctionParam(format!("no edit {}", index)))
    }

    pub fn delete_edit(&mut self, track_id: u32, index: usize) -> MuxResult<()> {
        let t = self.find_track_mut(track_id)?;
        let elst = t
            .meta
            .edit_list
            .as_mut()
            .ok_or_else(|| MuxError::FunctionParam("track has no edit list".to_string()))?;
        if index >= elst.entries.len() {
            return Err(MuxError::FunctionParam(format!("no edit {}", index)));
        }
        let remaining: Vec<EditListEntry> = elst
            .entries
            .iter_cloned()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, e)| e)
            .collect();
        elst.entries = remaining.into_iter().collect();
        Ok(())
    }

    pub fn count_edits(&self, track_id: u32) -> MuxResult<usize> {
        let t = self.find_track(track_id)?;
        Ok(t.meta.edit_list.as_ref().map(|e| e.entries.len()).unwrap_or(0))
    }

    // -- timeline ---------------------------------------------------------

    /// Construct a `Timeline` for a track, either from an already-opened
    /// file (`open`) or, if not open, by assembling one from the build
    /// session's current sample table (useful for inspecting a mux in
    /// progress before `finish_movie`).
    pub fn construct_timeline(&self, track_id: u32) -> MuxResult<Timeline> {
        if let Some(mp4) = &self.opened {
            let tracks = mp4.movie().tracks();
            let trak = tracks
                .iter()
                .find(|t| t.track_id() == track_id)
                .ok_or_else(|| MuxError::FunctionParam(format!("no such track {}", track_id)))?;
            return Ok(Timeline::from_track(*trak)?);
        }

        let t = self.find_track(track_id)?;
        let stbl = finalize::build_sample_table(&t.output, t.meta.sample_description.clone());
        let trak = TrackBox {
            boxes: vec![
                MP4Box::TrackHeaderBox(t.meta.track_header.clone()),
                MP4Box::MediaBox(MediaBox {
                    boxes: vec![
                        MP4Box::MediaHeaderBox(t.meta.media_header.clone()),
                        MP4Box::HandlerBox(t.meta.handler.clone()),
                        MP4Box::MediaInformationBox(MediaInformationBox {
                            boxes: {
                                let mut b = t.meta.media_info_boxes.clone();
                                b.push(MP4Box::SampleTableBox(stbl));
                                b
                            },
                        }),
                    ],
                }),
            ],
        };
        Ok(Timeline::from_track(&trak)?)
    }

    /// There is nothing to free beyond dropping the `Timeline`; kept for
    /// symmetry with `construct_timeline`, matching the distilled
    /// construct/destruct pairing.
    pub fn destruct_timeline(&self, _timeline: Timeline) {}

    // -- chapters ----------------------------------------------------------

    /// Nero-style ("tyrant") chapters: a `chpl` box hung directly off
    /// `moov/udta`, no separate chapter track or `tref` involved.
    pub fn set_tyrant_chapter(&mut self, text: &str, add_bom: bool) -> MuxResult<()> {
        self.tyrant_chapters = Some(chapters::parse_chapters(text, add_bom)?);
        Ok(())
    }

    /// QuickTime-style chapters: a genuine extra text track carrying one
    /// plain-text sample per chapter, timed at each chapter's start. (A real
    /// QuickTime reference chapter additionally wires a `tref`/`chap`
    /// pointer from the primary track to this one, and uses a `tx3g` sample
    /// entry rather than a placeholder; this crate's box registry has
    /// neither `TrackReferenceBox` nor a settled `tx3g` builder API, so both
    /// are left for a future patch -- recorded as an open decision in
    /// DESIGN.md.)
    pub fn create_reference_chapter_track(&mut self, text: &str, add_bom: bool, timescale: u32) -> MuxResult<u32> {
        let chpl = chapters::parse_chapters(text, add_bom)?;

        let track_id = self.root.next_track_id;
        self.root.next_track_id += 1;

        let sample_description = SampleDescriptionBox {
            entries: {
                let mut e = ArraySized32::<MP4Box>::new();
                e.push(NullMediaHeaderBox::default().to_mp4box());
                e
            },
        };

        let meta = TrackMeta {
            track_header: TrackHeaderBox {
                flags: TrackFlags(0),
                cr_time: Time::default(),
                mod_time: Time::default(),
                track_id,
                duration: Duration_::default(),
                layer: 0,
                alt_group: 0,
                volume: FixedFloat8_8::default(),
                matrix: Matrix::identity(),
                width: FixedFloat16_16::default(),
                height: FixedFloat16_16::default(),
            },
            media_header: MediaHeaderBox {
                cr_time: Time::default(),
                mod_time: Time::default(),
                timescale,
                duration: Duration_::default(),
                language: IsoLanguageCode::default(),
                quality: 0,
            },
            handler: HandlerBox { handler_type: FourCC::new("text"), name: ZString::default() },
            media_info_boxes: vec![DataInformationBox { boxes: vec![] }.to_mp4box()],
            sample_description,
            composition_shift: None,
            edit_list: None,
        };

        let mut output = OutputTrack::new(track_id, timescale);
        let mut prev_time = 0u64;
        let entries: Vec<ChapterListEntry> = chpl.entries;
        for (i, entry) in entries.iter().enumerate() {
            let dts = entry.start_time / 10_000 * timescale as u64 / 1000;
            let data = chapter_track_sample(&entry.title);
            let offset = self.mdat.len() as u64;
            let sample = AccessUnit {
                data: data.clone(),
                dts: dts.max(prev_time),
                cts: dts.max(prev_time) as i64,
                is_sync: true,
                sample_description_index: 1,
            };
            prev_time = sample.dts + 1;
            output.add_sample(sample, &self.config, offset)?;
            self.mdat.extend_from_slice(&data);
            let _ = i;
        }
        output.flush(self.mdat.len() as u64);

        self.tracks.push(BuildTrack { output, meta });
        Ok(track_id)
    }

    // -- iTunes metadata ---------------------------------------------------

    pub fn set_itunes_tag(&mut self, fourcc: &str, value: &str) -> MuxResult<()> {
        let ilst = self.itunes.get_or_insert_with(|| AppleItemListBox { items: Vec::new() });
        let fourcc = FourCC::new(fourcc);
        let item_boxes = vec![IDataBox { flags: 1, data: AppleData::Text(value.to_string()) }.to_mp4box()];
        match ilst.items.iter_mut().find(|item| item.fourcc == fourcc) {
            Some(item) => item.boxes = item_boxes,
            None => ilst.items.push(AppleItem { fourcc, boxes: item_boxes }),
        }
        Ok(())
    }

    pub fn get_itunes_tag(&self, fourcc: &str) -> MuxResult<Option<String>> {
        let fourcc = FourCC::new(fourcc);
        let ilst = match &self.itunes {
            Some(ilst) => ilst,
            None => return Ok(None),
        };
        for item in &ilst.items {
            if item.fourcc != fourcc {
                continue;
            }
            for b in &item.boxes {
                if let MP4Box::IDataBox(d) = b {
                    if let AppleData::Text(s) = &d.data {
                        return Ok(Some(s.clone()));
                    }
                }
            }
        }
        Ok(None)
    }

    pub fn count_itunes_tags(&self) -> usize {
        self.itunes.as_ref().map(|ilst| ilst.items.len()).unwrap_or(0)
    }

    // -- finishing ---------------------------------------------------------

    fn user_data_boxes(&self) -> Vec<MP4Box> {
        let mut udta_boxes = Vec::new();
        if let Some(chpl) = &self.tyrant_chapters {
            udta_boxes.push(MP4Box::ChapterListBox(chpl.clone()));
        }
        if let Some(ilst) = &self.itunes {
            udta_boxes.push(MP4Box::MetaBox(MetaBox { boxes: vec![ilst.clone().to_mp4box()] }));
        }
        udta_boxes
    }

    /// Close out every pending chunk, assemble `ftyp`/`moov`, relocate
    /// chunk offsets for moov-to-front, and write the whole file.
    ///
    /// `progress` is polled between `mdat` write chunks; returning `true`
    /// aborts the write and surfaces `MuxError::Aborted`.
    pub fn finish_movie<W: WriteBytes>(
        &mut self,
        out: &mut W,
        progress: impl FnMut(u64, u64) -> bool,
    ) -> MuxResult<()> {
        self.flush_all();

        let (major, minor, compatible) =
            finalize::decide_brands(self.root.major_brand, &self.root.compatible_brands, self.root.dash);
        let ftyp = FileTypeBox { major_brand: major, minor_version: minor, compatible_brands: compatible };

        let next_track_id = self.tracks.iter().map(|t| t.output.track_id).max().unwrap_or(0) + 1;

        let tracks: Vec<(OutputTrack, TrackMeta)> = std::mem::take(&mut self.tracks)
            .into_iter()
            .map(|t| (t.output, t.meta))
            .collect();
        let mut moov = finalize::build_movie(self.root.movie_timescale, next_track_id, &tracks);

        let udta_boxes = self.user_data_boxes();
        if !udta_boxes.is_empty() {
            moov.boxes.push(MP4Box::UserDataBox(UserDataBox { boxes: udta_boxes }));
        }

        finalize::relocate_chunk_offsets(&ftyp, &mut moov, self.mdat.len() as u64, false)
            .map_err(MuxError::from)?;

        match finalize::write_finalized(&ftyp, &moov, &self.mdat, false, progress, out) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Err(MuxError::Aborted),
            Err(e) => Err(e.into()),
        }
    }

    // -- fragmented / DASH finishing ----------------------------------------

    fn base_track_index(&self, base_track_id: u32) -> MuxResult<usize> {
        self.tracks
            .iter()
            .position(|t| t.output.track_id == base_track_id)
            .ok_or_else(|| MuxError::FunctionParam(format!("no such track {}", base_track_id)))
    }

    /// Fragmented-flavor `moov`: per-track empty sample tables plus `mvex`,
    /// same user-data boxes `finish_movie` hangs off `moov/udta`.
    fn build_movie_fragmented_box(&self, next_track_id: u32) -> MovieBox {
        let fragmented_tracks: Vec<finalize::FragmentedTrack> = self
            .tracks
            .iter()
            .map(|t| finalize::FragmentedTrack {
                track_id: t.output.track_id,
                timescale: t.output.timescale,
                duration: t.output.duration(),
                default_sample_duration: finalize::guess_default_sample_duration(&t.output),
                meta: &t.meta,
            })
            .collect();
        let mut moov = finalize::build_movie_fragmented(self.root.movie_timescale, next_track_id, &fragmented_tracks);
        let udta_boxes = self.user_data_boxes();
        if !udta_boxes.is_empty() {
            moov.boxes.push(MP4Box::UserDataBox(UserDataBox { boxes: udta_boxes }));
        }
        moov
    }

    fn collect_fragments(&self, base_track_id: u32) -> MuxResult<(Vec<mux::Fragment>, Vec<u32>, Vec<u32>, usize)> {
        let base_idx = self.base_track_index(base_track_id)?;
        let track_refs: Vec<&OutputTrack> = self.tracks.iter().map(|t| &t.output).collect();
        let fragments = mux::split_into_fragments(&track_refs, base_idx);
        let track_ids: Vec<u32> = self.tracks.iter().map(|t| t.output.track_id).collect();
        let last_sample_delta: Vec<u32> =
            self.tracks.iter().map(|t| t.output.last_sample_delta.unwrap_or(0)).collect();
        Ok((fragments, track_ids, last_sample_delta, base_idx))
    }

    /// Write a plain fragmented file: `ftyp`/`moov` (with an empty `stbl`
    /// per track and a `mvex`), followed by one `moof`/`mdat` pair per
    /// fragment. `base_track_id` picks the track whose sync samples define
    /// fragment boundaries (normally the video track).
    pub fn finish_fragmented_movie<W: WriteBytes>(&mut self, base_track_id: u32, out: &mut W) -> MuxResult<()> {
        self.flush_all();

        let (major, minor, compatible) =
            finalize::decide_brands(self.root.major_brand, &self.root.compatible_brands, self.root.dash);
        let ftyp = FileTypeBox { major_brand: major, minor_version: minor, compatible_brands: compatible };

        let next_track_id = self.tracks.iter().map(|t| t.output.track_id).max().unwrap_or(0) + 1;
        let moov = self.build_movie_fragmented_box(next_track_id);
        let (fragments, track_ids, last_sample_delta, _) = self.collect_fragments(base_track_id)?;

        ftyp.to_bytes(out).map_err(MuxError::from)?;
        moov.to_bytes(out).map_err(MuxError::from)?;
        finalize::write_fragments(&fragments, &track_ids, &last_sample_delta, out).map_err(MuxError::from)
    }

    /// One DASH media segment: a `styp`/`sidx` pair followed by the
    /// `moof`/`mdat` pairs of the fragments it indexes.
    pub fn write_dash_segments(
        &mut self,
        base_track_id: u32,
        file_name: &str,
        mode: DashMode,
    ) -> MuxResult<(Vec<u8>, Vec<DashSegment>)> {
        self.flush_all();
        let self_initializing = matches!(mode, DashMode::SelfInitializing);

        let (major, minor, compatible) =
            finalize::decide_init_segment_brands(self.root.major_brand, &self.root.compatible_brands);
        let init_ftyp = FileTypeBox { major_brand: major, minor_version: minor, compatible_brands: compatible };
        let next_track_id = self.tracks.iter().map(|t| t.output.track_id).max().unwrap_or(0) + 1;
        let moov = self.build_movie_fragmented_box(next_track_id);

        let mut init_buf = crate::io::MemBuffer::new();
        init_ftyp.to_bytes(&mut init_buf).map_err(MuxError::from)?;
        moov.to_bytes(&mut init_buf).map_err(MuxError::from)?;
        let init_segment = init_buf.into_vec();

        let (fragments, track_ids, last_sample_delta, base_idx) = self.collect_fragments(base_track_id)?;
        let base_timescale = self.tracks[base_idx].output.timescale;
        let n = track_ids.len();

        // Same per-track stts-style duration computation `write_fragments`
        // does: flatten every fragment's DTS first so a fragment-final
        // sample's duration isn't wrongly read as 0.
        let mut full_dts: Vec<Vec<u64>> = vec![Vec::new(); n];
        for f in &fragments {
            for (t, run) in f.track_runs.iter().enumerate() {
                full_dts[t].extend(run.iter().map(|s| s.dts));
            }
        }
        let full_durations: Vec<Vec<u32>> = full_dts
            .iter()
            .enumerate()
            .map(|(t, dts)| {
                let mut v = Vec::with_capacity(dts.len());
                for w in dts.windows(2) {
                    v.push((w[1] - w[0]) as u32);
                }
                if !dts.is_empty() {
                    v.push(last_sample_delta[t]);
                }
                v
            })
            .collect();

        let group_size = match mode {
            DashMode::FragmentsPerSegment(k) => k.max(1) as usize,
            DashMode::SelfInitializing => 1,
        };

        let mut segments = Vec::new();
        let mut cursor = vec![0usize; n];
        let mut earliest = 0u64;

        for (seg_idx, group) in fragments.chunks(group_size).enumerate() {
            let mut body = crate::io::MemBuffer::new();
            let mut refs = Vec::new();

            for f in group {
                let mut track_data = Vec::new();
                for (t, run) in f.track_runs.iter().enumerate() {
                    if run.is_empty() {
                        continue;
                    }
                    let durations = &full_durations[t][cursor[t]..cursor[t] + run.len()];
                    cursor[t] += run.len();
                    track_data.push(finalize::FragmentTrackData {
                        track_id: track_ids[t],
                        samples: run,
                        durations,
                        base_media_decode_time: run[0].dts,
                    });
                }
                if track_data.is_empty() {
                    continue;
                }

                let base_len = f.track_runs[base_idx].len();
                let starts_with_sap = f.track_runs[base_idx].first().map(|s| s.is_sync).unwrap_or(true);
                let duration: u32 = if base_len == 0 {
                    0
                } else {
                    full_durations[base_idx][cursor[base_idx] - base_len..cursor[base_idx]].iter().sum()
                };

                let before = body.size();
                let (moof, mdat_payload) =
                    finalize::build_fragment(f.sequence_number, &track_data).map_err(MuxError::from)?;
                finalize::write_fragment(&moof, &mdat_payload, &mut body).map_err(MuxError::from)?;
                let size = body.size() - before;
                refs.push((duration, size, starts_with_sap));
            }

            let (styp_major, styp_minor, styp_compat) = finalize::decide_segment_type_brands(self_initializing);
            let styp = SegmentTypeBox { major_brand: styp_major, minor_version: styp_minor, compatible_brands: styp_compat };
            let sidx = finalize::build_segment_index(base_track_id, base_timescale, earliest, &refs);

            let mut segment_buf = crate::io::MemBuffer::new();
            styp.to_bytes(&mut segment_buf).map_err(MuxError::from)?;
            sidx.to_bytes(&mut segment_buf).map_err(MuxError::from)?;
            segment_buf.write(&body.into_vec()).map_err(MuxError::from)?;

            earliest += refs.iter().map(|&(d, _, _)| d as u64).sum::<u64>();

            segments.push(DashSegment {
                name: mux::segment_name(file_name, seg_idx as u32 + 1),
                data: segment_buf.into_vec(),
            });
        }

        Ok((init_segment, segments))
    }
}

/// One DASH media segment file: `styp`/`sidx` plus the `moof`/`mdat` pairs
/// it indexes. `write_dash_segments` returns these alongside the shared
/// initialization segment; writing each to its own file is left to the
/// caller, matching how `Root`/`MuxFile` stay storage-agnostic elsewhere.
#[derive(Debug, Clone)]
pub struct DashSegment {
    pub name: String,
    pub data: Vec<u8>,
}

/// Parse a timecode-v1/v2 companion file into per-sample DTS values in
/// `timescale` units, for callers building a track from an externally
/// timed elementary stream.
pub fn load_timecodes(text: &str, frame_count: usize, timescale: u32) -> MuxResult<Vec<u64>> {
    let ms = timecode::parse_timecode_file(text, frame_count)?;
    Ok(timecode::to_timescale(&ms, timescale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dts: u64, size: usize) -> AccessUnit {
        AccessUnit { data: vec![0u8; size], dts, cts: dts as i64, is_sync: true, sample_description_index: 1 }
    }

    fn test_meta() -> TrackMeta {
        TrackMeta {
            track_header: TrackHeaderBox {
                flags: TrackFlags(7),
                cr_time: Time::default(),
                mod_time: Time::default(),
                track_id: 0,
                duration: Duration_::default(),
                layer: 0,
                alt_group: 0,
                volume: FixedFloat8_8::default(),
                matrix: Matrix::identity(),
                width: FixedFloat16_16::default(),
                height: FixedFloat16_16::default(),
            },
            media_header: MediaHeaderBox {
                cr_time: Time::default(),
                mod_time: Time::default(),
                timescale: 1000,
                duration: Duration_::default(),
                language: IsoLanguageCode::default(),
                quality: 0,
            },
            handler: HandlerBox { handler_type: FourCC::new("vide"), name: ZString::default() },
            media_info_boxes: vec![DataInformationBox { boxes: vec![] }.to_mp4box()],
            sample_description: SampleDescriptionBox {
                entries: vec![NullMediaHeaderBox::default().to_mp4box()].into_iter().collect(),
            },
            composition_shift: None,
            edit_list: None,
        }
    }

    #[test]
    fn create_track_allocates_increasing_ids() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let a = f.create_track(1000, test_meta()).unwrap();
        let b = f.create_track(1000, test_meta()).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn delete_track_removes_it() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        f.delete_track(id).unwrap();
        assert!(f.delete_track(id).is_err());
    }

    #[test]
    fn add_sample_grows_mdat_and_rejects_unknown_track() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        f.add_sample(id, sample(0, 16)).unwrap();
        assert_eq!(f.mdat.len(), 16);
        assert!(f.add_sample(99, sample(1, 16)).is_err());
    }

    #[test]
    fn edit_list_round_trips_through_create_get_delete() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        let edit = EditListEntry { segment_duration: 1000, media_time: 0, media_rate: 1 };
        let idx = f.create_edit(id, edit.clone()).unwrap();
        assert_eq!(f.count_edits(id).unwrap(), 1);
        assert_eq!(f.get_edit(id, idx).unwrap().segment_duration, 1000);
        f.delete_edit(id, idx).unwrap();
        assert_eq!(f.count_edits(id).unwrap(), 0);
    }

    #[test]
    fn tyrant_chapter_round_trips_idempotently() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        f.set_tyrant_chapter("00:00:00.000 Intro\n00:01:30.500 Two\n", false).unwrap();
        let chpl = f.tyrant_chapters.as_ref().unwrap();
        assert_eq!(chpl.entries.len(), 2);
        assert_eq!(chpl.entries[0].title, "Intro");
    }

    #[test]
    fn itunes_tag_set_get_count() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        assert_eq!(f.count_itunes_tags(), 0);
        f.set_itunes_tag("\u{a9}nam", "My Title").unwrap();
        assert_eq!(f.count_itunes_tags(), 1);
        assert_eq!(f.get_itunes_tag("\u{a9}nam").unwrap(), Some("My Title".to_string()));
        assert_eq!(f.get_itunes_tag("\u{a9}day").unwrap(), None);
    }

    #[test]
    fn finish_movie_writes_moov_to_front() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        f.add_sample(id, sample(0, 16)).unwrap();
        f.add_sample(id, sample(40, 16)).unwrap();

        let mut buf = crate::io::MemBuffer::new();
        f.finish_movie(&mut buf, |_, _| false).unwrap();
        let bytes = buf.into_vec();

        assert_eq!(&bytes[4..8].to_vec(), &FourCC::new("ftyp").to_be_bytes().to_vec());
        let ftyp_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(&bytes[ftyp_size + 4..ftyp_size + 8].to_vec(), &FourCC::new("moov").to_be_bytes().to_vec());
    }

    #[test]
    fn finish_movie_aborts_when_progress_requests_it() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        f.add_sample(id, sample(0, 16)).unwrap();

        let mut buf = crate::io::MemBuffer::new();
        let err = f.finish_movie(&mut buf, |_, _| true).unwrap_err();
        assert!(matches!(err, MuxError::Aborted));
    }

    #[test]
    fn finish_fragmented_movie_writes_ftyp_moov_then_moof() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        f.add_sample(id, sample(0, 16)).unwrap();
        f.add_sample(id, sample(40, 16)).unwrap();
        f.flush_pooled_samples(id).unwrap();

        let mut buf = crate::io::MemBuffer::new();
        f.finish_fragmented_movie(id, &mut buf).unwrap();
        let bytes = buf.into_vec();

        assert_eq!(&bytes[4..8].to_vec(), &FourCC::new("ftyp").to_be_bytes().to_vec());
        let ftyp_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(&bytes[ftyp_size + 4..ftyp_size + 8].to_vec(), &FourCC::new("moov").to_be_bytes().to_vec());

        let moov_size = u32::from_be_bytes([
            bytes[ftyp_size],
            bytes[ftyp_size + 1],
            bytes[ftyp_size + 2],
            bytes[ftyp_size + 3],
        ]) as usize;
        let moof_start = ftyp_size + moov_size;
        assert_eq!(&bytes[moof_start + 4..moof_start + 8].to_vec(), &FourCC::new("moof").to_be_bytes().to_vec());
    }

    #[test]
    fn write_dash_segments_groups_fragments_per_segment() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        // 3 sync samples -> 3 fragments (a cut on every sync sample after the first).
        f.add_sample(id, sample(0, 16)).unwrap();
        f.add_sample(id, sample(40, 16)).unwrap();
        f.add_sample(id, sample(80, 16)).unwrap();
        f.flush_pooled_samples(id).unwrap();

        let (init, segments) =
            f.write_dash_segments(id, "movie.mp4", DashMode::FragmentsPerSegment(2)).unwrap();

        assert_eq!(&init[4..8].to_vec(), &FourCC::new("ftyp").to_be_bytes().to_vec());
        // 3 fragments grouped 2-per-segment -> 2 segment files (2 fragments, then 1).
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].name, "movie_1.mp4");
        assert_eq!(segments[1].name, "movie_2.mp4");
        assert_eq!(&segments[0].data[4..8].to_vec(), &FourCC::new("styp").to_be_bytes().to_vec());
    }

    #[test]
    fn construct_timeline_from_build_session() {
        let mut f = MuxFile::create(Root::new(), MuxConfig::default());
        let id = f.create_track(1000, test_meta()).unwrap();
        f.add_sample(id, sample(0, 16)).unwrap();
        f.add_sample(id, sample(40, 16)).unwrap();
        f.flush_pooled_samples(id).unwrap();

        let tl = f.construct_timeline(id).unwrap();
        assert_eq!(tl.len(), 2);
    }
}
