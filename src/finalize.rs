//! Turn muxed track/chunk data into the actual `moov`/`mdat` box tree and
//! write it out.
//!
//! The muxer (`mux.rs`) only knows about interleaving and chunk boundaries;
//! it has no opinion on `mvhd`/`tkhd`/`mdhd`/`hdlr` content, which is
//! codec- and container-specific. Callers hand those in as a per-track
//! template (`TrackMeta`) built from whatever `Importer`/remux source fed
//! the mux. This module fills in the sample tables, decides brands, and
//! does the moov-to-front relocation.

use std::io;

use crate::boxes::*;
use crate::mp4box::MP4Box;
use crate::types::*;
use crate::io::{MemBuffer, CountBytes};
use crate::mux::{AccessUnit, Fragment, OutputTrack};
use crate::serialize::{WriteBytes, BoxBytes, ToBytes};

/// The literal bytes of the trailing `free` box some muxers write as a
/// signature. `Free`/`Skip`/`Wide` (see `boxes/free.rs`) only implement
/// zero-fill skip semantics, so this box is written by hand.
const FREE_MESSAGE: &[u8] = b"Multiplexed by L-SMASH";

/// Everything about a track that isn't sample-table data: header
/// boilerplate and the sample description, supplied by the caller
/// (`api.rs`) rather than derived here.
pub struct TrackMeta {
    pub track_header:       TrackHeaderBox,
    pub media_header:       MediaHeaderBox,
    pub handler:             HandlerBox,
    pub media_info_boxes:    Vec<MP4Box>,
    pub sample_description:  SampleDescriptionBox,
    /// Composition-to-decode shift, if the timeline needs one; turned into
    /// a one-entry `EditListBox` when the caller didn't already set one.
    pub composition_shift:   Option<i64>,
    pub edit_list:           Option<EditListBox>,
}

/// Build the `stbl` for one track, given the muxer's accumulated
/// chunk/sample data and the caller-supplied sample description.
pub fn build_sample_table(track: &OutputTrack, sample_description: SampleDescriptionBox) -> SampleTableBox {
    let mut boxes = Vec::new();

    boxes.push(MP4Box::SampleDescriptionBox(sample_description));
    boxes.push(MP4Box::TimeToSampleBox(build_stts(track)));

    if has_nonzero_cts_offset(track) {
        boxes.push(MP4Box::CompositionOffsetBox(build_ctts(track)));
    }

    boxes.push(MP4Box::SampleToChunkBox(build_stsc(track)));
    boxes.push(MP4Box::ChunkOffsetBox(build_stco(track)));

    if let Some(stss) = build_stss(track) {
        boxes.push(MP4Box::SyncSampleBox(stss));
    }
    if let Some(sdtp) = build_sdtp(track) {
        boxes.push(MP4Box::SampleDependencyTypeBox(sdtp));
    }

    SampleTableBox { boxes }
}

fn has_nonzero_cts_offset(track: &OutputTrack) -> bool {
    track.samples().any(|s| s.cts != s.dts as i64)
}

/// `stts`: run-length encode the inter-sample deltas, with the final
/// sample's duration filled in from `last_sample_delta`.
fn build_stts(track: &OutputTrack) -> TimeToSampleBox {
    let dtss: Vec<u64> = track.samples().map(|s| s.dts).collect();
    let mut deltas = Vec::with_capacity(dtss.len());
    for w in dtss.windows(2) {
        deltas.push((w[1] - w[0]) as u32);
    }
    if !dtss.is_empty() {
        deltas.push(track.last_sample_delta.unwrap_or(1));
    }

    let mut entries = Vec::new();
    for d in deltas {
        match entries.last_mut() {
            Some(TimeToSampleEntry { count, delta }) if *delta == d => *count += 1,
            _ => entries.push(TimeToSampleEntry { count: 1, delta: d }),
        }
    }
    TimeToSampleBox { entries: entries.into_iter().collect() }
}

/// `ctts`: run-length encode `cts - dts`. Version is picked at write time
/// by `FullBox::version` based on whether any offset is negative.
fn build_ctts(track: &OutputTrack) -> CompositionOffsetBox {
    let mut entries = Vec::new();
    for s in track.samples() {
        let offset = (s.cts - s.dts as i64) as i32;
        match entries.last_mut() {
            Some(CompositionOffsetEntry { count, offset: o }) if *o == offset => *count += 1,
            _ => entries.push(CompositionOffsetEntry { count: 1, offset }),
        }
    }
    CompositionOffsetBox { entries: entries.into_iter().collect() }
}

/// `stsc`: one entry per run of chunks sharing `(samples_per_chunk,
/// sample_description_index)`; `first_chunk` is 1-based per the box spec.
fn build_stsc(track: &OutputTrack) -> SampleToChunkBox {
    let mut entries = Vec::new();
    for (idx, chunk) in track.chunks.iter().enumerate() {
        let samples_per_chunk = chunk.samples.len() as u32;
        let sdi = chunk.samples.first().map(|s| s.sample_description_index).unwrap_or(1);
        match entries.last_mut() {
            Some(SampleToChunkEntry { samples_per_chunk: spc, sample_description_index: i, .. })
                if *spc == samples_per_chunk && *i == sdi => {}
            _ => entries.push(SampleToChunkEntry {
                first_chunk: idx as u32 + 1,
                samples_per_chunk,
                sample_description_index: sdi,
            }),
        }
    }
    SampleToChunkBox { entries: entries.into_iter().collect() }
}

/// `stco`/`co64`: one absolute offset per chunk.
fn build_stco(track: &OutputTrack) -> ChunkOffsetBox {
    let mut co = ChunkOffsetBox::default();
    co.entries = track.chunks.iter().map(|c| c.offset).collect();
    co.count = co.entries.len() as u32;
    co.check_sizes();
    co
}

/// `stss`: omitted entirely when every sample is sync (progressive video
/// tracks with no B-frames, all-audio tracks).
fn build_stss(track: &OutputTrack) -> Option<SyncSampleBox> {
    let mut entries = Vec::new();
    let mut all_sync = true;
    for (i, s) in track.samples().enumerate() {
        if s.is_sync {
            entries.push(i as u32 + 1);
        } else {
            all_sync = false;
        }
    }
    if all_sync || entries.is_empty() {
        None
    } else {
        Some(SyncSampleBox { entries: entries.into_iter().collect() })
    }
}

/// `sdtp`: only written when at least one sample is non-sync, mirroring
/// `stss`'s "all sync, omit the table" convention.
fn build_sdtp(track: &OutputTrack) -> Option<SampleDependencyTypeBox> {
    if track.samples().all(|s| s.is_sync) {
        return None;
    }
    let entries = track
        .samples()
        .map(|s| SampleDependsOn {
            is_leading: 0,
            sample_depends_on: if s.is_sync { 2 } else { 1 },
            sample_is_depended_on: 0,
            sample_has_redundancy: 0,
        })
        .collect();
    Some(SampleDependencyTypeBox { entries })
}

/// Build an `EditListBox` compensating for a composition-to-decode shift,
/// when the caller supplied a shift but no explicit edit list of its own.
pub fn synthesize_edit_list(meta: &TrackMeta, duration: u64) -> Option<EditListBox> {
    if meta.edit_list.is_some() {
        return meta.edit_list.clone();
    }
    let shift = meta.composition_shift?;
    Some(EditListBox {
        entries: vec![EditListEntry {
            segment_duration: duration,
            media_time: shift,
            media_rate: 1,
        }]
        .into_iter()
        .collect(),
    })
}

/// Brand negotiation: start from whatever the source declared, upgrade 3GP
/// brands to at least `3gp6`, and add `3g2a` whenever `3gp6` ends up
/// present (forward-compatible, per the resolved open question). DASH
/// output forces the major brand to `dash`.
pub fn decide_brands(major_brand: FourCC, compatible_brands: &[FourCC], dash: bool) -> (FourCC, u32, Vec<FourCC>) {
    let mut compatible: Vec<FourCC> = compatible_brands.to_vec();

    let is_3gp = major_brand.to_be_bytes().starts_with(b"3gp")
        || compatible.iter().any(|b| b.to_be_bytes().starts_with(b"3gp"));
    if is_3gp {
        let gp6 = FourCC::new("3gp6");
        if !compatible.contains(&gp6) {
            compatible.push(gp6);
        }
    }
    if compatible.iter().any(|b| *b == FourCC::new("3gp6")) {
        let g2a = FourCC::new("3g2a");
        if !compatible.contains(&g2a) {
            compatible.push(g2a);
        }
    }

    let major = if dash { FourCC::new("dash") } else { major_brand };
    if dash && !compatible.contains(&major) {
        compatible.push(major);
    }

    (major, 0, compatible)
}

/// Write the literal trailing `free` box by hand: `Free`/`Skip`/`Wide`
/// only know how to zero-fill, not carry a literal payload.
pub fn write_trailing_free<W: WriteBytes>(stream: &mut W) -> io::Result<()> {
    let size = (8 + FREE_MESSAGE.len()) as u32;
    size.to_bytes(stream)?;
    FourCC::new("free").to_bytes(stream)?;
    stream.write(FREE_MESSAGE)
}

/// Serialize `ftyp` + `moov` (+ optional trailing `free`) into an in-memory
/// buffer purely to measure how many bytes they will occupy, without
/// mutating anything.
fn measure_header(ftyp: &FileTypeBox, moov: &MovieBox, with_free: bool) -> io::Result<u64> {
    let mut buf = MemBuffer::new();
    ftyp.to_bytes(&mut buf)?;
    moov.to_bytes(&mut buf)?;
    if with_free {
        write_trailing_free(&mut buf)?;
    }
    Ok(buf.size())
}

fn mdat_header_size(payload_len: u64) -> u64 {
    if payload_len + 8 > u32::MAX as u64 { 16 } else { 8 }
}

/// Relocate every track's chunk offsets so they point past the serialized
/// `ftyp`/`moov`(/`free`)/`mdat`-header prefix, iterating to a fixed point
/// since upgrading a `stco` to `co64` (or widening `mdat`'s size field)
/// changes the very prefix length being accounted for.
///
/// Returns the final prefix length (everything written before the `mdat`
/// payload itself).
pub fn relocate_chunk_offsets(
    ftyp: &FileTypeBox,
    moov: &mut MovieBox,
    mdat_payload_len: u64,
    with_free: bool,
) -> io::Result<u64> {
    let mut prev_delta = 0u64;
    for _ in 0..8 {
        let header_len = measure_header(ftyp, moov, with_free)?;
        let delta = header_len + mdat_header_size(mdat_payload_len);
        if delta == prev_delta {
            return Ok(delta);
        }
        let step = delta - prev_delta;
        for trak in moov.tracks_mut() {
            let stbl = trak.media_mut().media_info_mut().sample_table_mut();
            stbl.move_chunk_offsets_up(step);
        }
        prev_delta = delta;
    }
    Ok(prev_delta)
}

/// Assemble the `moov` box from per-track metadata and muxed chunk data.
/// `timescale` is the movie-level timescale (typically 1000, one tick per
/// millisecond); each track keeps its own media timescale.
pub fn build_movie(
    timescale: u32,
    next_track_id: u32,
    tracks: &[(OutputTrack, TrackMeta)],
) -> MovieBox {
    let mut movie_boxes = Vec::new();

    let movie_duration = tracks
        .iter()
        .map(|(t, meta)| scale_duration(t.duration(), t.timescale, timescale) + edit_list_offset(meta))
        .max()
        .unwrap_or(0);

    movie_boxes.push(MP4Box::MovieHeaderBox(MovieHeaderBox {
        cr_time: Time::default(),
        mod_time: Time::default(),
        timescale,
        duration: Duration_(movie_duration),
        pref_rate: FixedFloat16_16::from(1.0),
        pref_vol: FixedFloat8_8::from(1.0),
        matrix: Matrix::identity(),
        preview_time: 0,
        preview_duration: 0,
        poster_time: 0,
        selection_time: 0,
        selection_duration: 0,
        current_time: 0,
        next_track_id,
    }));

    for (track, meta) in tracks {
        movie_boxes.push(MP4Box::TrackBox(build_track(track, meta)));
    }

    MovieBox { boxes: movie_boxes }
}

fn edit_list_offset(meta: &TrackMeta) -> u64 {
    meta.edit_list
        .as_ref()
        .map(|e| e.entries.iter().map(|e| e.segment_duration).sum())
        .unwrap_or(0)
}

fn scale_duration(duration: u64, from_timescale: u32, to_timescale: u32) -> u64 {
    if from_timescale == 0 {
        return 0;
    }
    ((duration as u128 * to_timescale as u128) / from_timescale as u128) as u64
}

fn build_track(track: &OutputTrack, meta: &TrackMeta) -> TrackBox {
    let mut boxes = Vec::new();

    let mut tkhd = meta.track_header.clone();
    tkhd.track_id = track.track_id;
    tkhd.duration = Duration_(track.duration());
    boxes.push(MP4Box::TrackHeaderBox(tkhd));

    if let Some(elst) = synthesize_edit_list(meta, track.duration()) {
        boxes.push(MP4Box::EditBox(EditBox { boxes: vec![elst] }));
    }

    let mut media_boxes = Vec::new();
    let mut mdhd = meta.media_header.clone();
    mdhd.timescale = track.timescale;
    mdhd.duration = Duration_(track.duration());
    media_boxes.push(MP4Box::MediaHeaderBox(mdhd));
    media_boxes.push(MP4Box::HandlerBox(meta.handler.clone()));

    let mut minf_boxes = meta.media_info_boxes.clone();
    let stbl = build_sample_table(track, meta.sample_description.clone());
    minf_boxes.push(MP4Box::SampleTableBox(stbl));
    media_boxes.push(MP4Box::MediaInformationBox(MediaInformationBox { boxes: minf_boxes }));

    boxes.push(MP4Box::MediaBox(MediaBox { boxes: media_boxes }));

    TrackBox { boxes }
}

// -- fragmented / DASH flavor --------------------------------------------
//
// A fragmented movie has no sample data in `moov` at all: every track's
// `stbl` is a bare set of empty tables, and `mvex`/`trex` tell readers to
// expect `moof`/`mdat` pairs instead. `Muxer::mux_fragmented` (for
// importer-driven sources) and `mux::split_into_fragments` (for sources
// that already fed samples straight into `OutputTrack`, like `MuxFile`)
// both produce `Vec<Fragment>`; `write_fragments` turns that into bytes.

/// Per-track info needed to build the fragmented-flavor `moov`. Unlike
/// `build_movie`, duration and the `trex` default sample duration aren't
/// derived from a flat sample table -- the caller supplies them from
/// whatever already-muxed (and possibly already-fragmented) data it has.
pub struct FragmentedTrack<'a> {
    pub track_id:                 u32,
    pub timescale:                u32,
    pub duration:                 u64,
    pub default_sample_duration:  u32,
    pub meta:                     &'a TrackMeta,
}

/// A bare `stbl`: description only, no `stts`/`stsc`/`stco` entries. Every
/// sample for a fragmented track lives in a `moof`/`mdat` pair instead.
fn empty_sample_table(sample_description: SampleDescriptionBox) -> SampleTableBox {
    SampleTableBox {
        boxes: vec![
            MP4Box::SampleDescriptionBox(sample_description),
            MP4Box::TimeToSampleBox(TimeToSampleBox::default()),
            MP4Box::SampleToChunkBox(SampleToChunkBox::default()),
            MP4Box::ChunkOffsetBox(ChunkOffsetBox::default()),
        ],
    }
}

fn build_track_fragmented(info: &FragmentedTrack) -> TrackBox {
    let mut boxes = Vec::new();

    let mut tkhd = info.meta.track_header.clone();
    tkhd.track_id = info.track_id;
    tkhd.duration = Duration_(info.duration);
    boxes.push(MP4Box::TrackHeaderBox(tkhd));

    if let Some(elst) = synthesize_edit_list(info.meta, info.duration) {
        boxes.push(MP4Box::EditBox(EditBox { boxes: vec![elst] }));
    }

    let mut media_boxes = Vec::new();
    let mut mdhd = info.meta.media_header.clone();
    mdhd.timescale = info.timescale;
    mdhd.duration = Duration_(info.duration);
    media_boxes.push(MP4Box::MediaHeaderBox(mdhd));
    media_boxes.push(MP4Box::HandlerBox(info.meta.handler.clone()));

    let mut minf_boxes = info.meta.media_info_boxes.clone();
    minf_boxes.push(MP4Box::SampleTableBox(empty_sample_table(info.meta.sample_description.clone())));
    media_boxes.push(MP4Box::MediaInformationBox(MediaInformationBox { boxes: minf_boxes }));

    boxes.push(MP4Box::MediaBox(MediaBox { boxes: media_boxes }));
    TrackBox { boxes }
}

/// The delta between a track's first two samples, falling back to its
/// last sample's delta (or 0 for an empty track) -- a reasonable `trex`
/// default for constant-frame-rate sources, which is what fragmented
/// output is almost always used for.
pub fn guess_default_sample_duration(track: &OutputTrack) -> u32 {
    let mut samples = track.samples();
    match (samples.next(), samples.next()) {
        (Some(a), Some(b)) => (b.dts - a.dts) as u32,
        _ => track.last_sample_delta.unwrap_or(0),
    }
}

/// Assemble the fragmented-flavor `moov`: per-track empty sample tables
/// plus a `mvex` with one `trex` per track.
pub fn build_movie_fragmented(timescale: u32, next_track_id: u32, tracks: &[FragmentedTrack]) -> MovieBox {
    let mut movie_boxes = Vec::new();

    let movie_duration = tracks
        .iter()
        .map(|t| scale_duration(t.duration, t.timescale, timescale) + edit_list_offset(t.meta))
        .max()
        .unwrap_or(0);

    movie_boxes.push(MP4Box::MovieHeaderBox(MovieHeaderBox {
        cr_time: Time::default(),
        mod_time: Time::default(),
        timescale,
        duration: Duration_(movie_duration),
        pref_rate: FixedFloat16_16::from(1.0),
        pref_vol: FixedFloat8_8::from(1.0),
        matrix: Matrix::identity(),
        preview_time: 0,
        preview_duration: 0,
        poster_time: 0,
        selection_time: 0,
        selection_duration: 0,
        current_time: 0,
        next_track_id,
    }));

    for t in tracks {
        movie_boxes.push(MP4Box::TrackBox(build_track_fragmented(t)));
    }

    let trex_boxes = tracks
        .iter()
        .map(|t| {
            MP4Box::TrackExtendsBox(TrackExtendsBox {
                track_id: t.track_id,
                default_sample_description_index: 1,
                default_sample_duration: t.default_sample_duration,
                default_sample_size: 0,
                default_sample_flags: SampleFlags::default(),
            })
        })
        .collect();
    movie_boxes.push(MP4Box::MovieExtendsBox(MovieExtendsBox { boxes: trex_boxes }));

    MovieBox { boxes: movie_boxes }
}

/// One track's samples within a single movie fragment: `durations[i]` is
/// sample `i`'s `stts`-style inter-sample delta, computed up front across
/// every fragment so a sample's duration is correct even when its next
/// sample landed in the following fragment.
pub struct FragmentTrackData<'a> {
    pub track_id:               u32,
    pub samples:                &'a [AccessUnit],
    pub durations:              &'a [u32],
    pub base_media_decode_time: u64,
}

fn build_traf(t: &FragmentTrackData) -> TrackFragmentBox {
    let tfhd = TrackFragmentHeaderBox {
        track_id: t.track_id,
        duration_is_empty: t.samples.is_empty(),
        default_base_is_moof: true,
        base_data_offset: None,
        sample_description_index: None,
        default_sample_duration: None,
        default_sample_size: None,
        default_sample_flags: None,
    };
    let tfdt = TrackFragmentBaseMediaDecodeTimeBox {
        base_media_decode_time: VersionSizedUint(t.base_media_decode_time),
    };

    let entries: Vec<TrackRunEntry> = t
        .samples
        .iter()
        .zip(t.durations.iter())
        .map(|(s, &duration)| TrackRunEntry {
            sample_duration: Some(duration),
            sample_size: Some(s.data.len() as u32),
            sample_flags: Some(SampleFlags { sample_is_non_sync_sample: !s.is_sync, ..SampleFlags::default() }),
            sample_composition_time_offset: Some((s.cts - s.dts as i64) as i32),
        })
        .collect();
    let trun = TrackRunBox { data_offset: Some(0), first_sample_flags: None, entries: entries.into_iter().collect() };

    TrackFragmentBox {
        boxes: vec![
            MP4Box::TrackFragmentHeaderBox(tfhd),
            MP4Box::TrackFragmentBaseMediaDecodeTimeBox(tfdt),
            MP4Box::TrackRunBox(trun),
        ],
    }
}

/// Assemble one `moof` + its `mdat` payload from a fragment's per-track
/// sample runs. `trun.data_offset` is computed relative to the start of
/// the `moof` box (`default_base_is_moof`), in the same track order the
/// sample bytes are concatenated into `mdat`.
pub fn build_fragment(sequence_number: u32, tracks: &[FragmentTrackData]) -> io::Result<(MovieFragmentBox, Vec<u8>)> {
    let mut trafs: Vec<TrackFragmentBox> = tracks.iter().map(build_traf).collect();

    let probe_boxes: Vec<MP4Box> = std::iter::once(MP4Box::MovieFragmentHeaderBox(MovieFragmentHeaderBox {
        sequence_number,
    }))
    .chain(trafs.iter().cloned().map(MP4Box::TrackFragmentBox))
    .collect();
    let moof_size = {
        let mut buf = MemBuffer::new();
        MovieFragmentBox { boxes: probe_boxes }.to_bytes(&mut buf)?;
        buf.size()
    };

    let payload_total: u64 = tracks.iter().flat_map(|t| t.samples.iter()).map(|s| s.data.len() as u64).sum();
    let mut data_offset = (moof_size + mdat_header_size(payload_total)) as i64;

    let mut mdat_payload = Vec::with_capacity(payload_total as usize);
    for (traf, t) in trafs.iter_mut().zip(tracks) {
        if let Some(MP4Box::TrackRunBox(trun)) = traf.boxes.iter_mut().find(|b| matches!(b, MP4Box::TrackRunBox(_))) {
            trun.data_offset = Some(data_offset as i32);
        }
        for s in t.samples {
            mdat_payload.extend_from_slice(&s.data);
        }
        data_offset += t.samples.iter().map(|s| s.data.len() as i64).sum::<i64>();
    }

    let boxes: Vec<MP4Box> = std::iter::once(MP4Box::MovieFragmentHeaderBox(MovieFragmentHeaderBox { sequence_number }))
        .chain(trafs.into_iter().map(MP4Box::TrackFragmentBox))
        .collect();
    Ok((MovieFragmentBox { boxes }, mdat_payload))
}

/// Write one `moof` + `mdat` pair, matching the layout `build_fragment`
/// assumed when it computed `trun.data_offset`.
pub fn write_fragment<W: WriteBytes>(moof: &MovieFragmentBox, mdat_payload: &[u8], out: &mut W) -> io::Result<()> {
    moof.to_bytes(out)?;
    let total = mdat_payload.len() as u64;
    if mdat_header_size(total) == 16 {
        1u32.to_bytes(out)?;
        FourCC::new("mdat").to_bytes(out)?;
        (total + 16).to_bytes(out)?;
    } else {
        ((total + 8) as u32).to_bytes(out)?;
        FourCC::new("mdat").to_bytes(out)?;
    }
    out.write(mdat_payload)
}

/// Write every fragment as a `moof`/`mdat` pair, in order, recomputing
/// each track's per-sample durations across fragment boundaries (a
/// sample's duration depends on the next sample's DTS, which may have
/// landed in the following fragment).
pub fn write_fragments<W: WriteBytes>(
    fragments: &[Fragment],
    track_ids: &[u32],
    last_sample_delta: &[u32],
    out: &mut W,
) -> io::Result<()> {
    let n = track_ids.len();

    let mut full_dts: Vec<Vec<u64>> = vec![Vec::new(); n];
    for f in fragments {
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

    let mut cursor = vec![0usize; n];
    for f in fragments {
        let mut track_data = Vec::new();
        for (t, run) in f.track_runs.iter().enumerate() {
            if run.is_empty() {
                continue;
            }
            let durations = &full_durations[t][cursor[t]..cursor[t] + run.len()];
            cursor[t] += run.len();
            track_data.push(FragmentTrackData {
                track_id: track_ids[t],
                samples: run,
                durations,
                base_media_decode_time: run[0].dts,
            });
        }
        if track_data.is_empty() {
            continue;
        }
        let (moof, mdat_payload) = build_fragment(f.sequence_number, &track_data)?;
        write_fragment(&moof, &mdat_payload, out)?;
    }
    Ok(())
}

/// Brands for a DASH media segment's `styp`: `msdh` always, plus `dash`
/// for the single self-initializing flavor (§4.6).
pub fn decide_segment_type_brands(self_initializing: bool) -> (FourCC, u32, Vec<FourCC>) {
    let msdh = FourCC::new("msdh");
    let mut compatible = vec![msdh];
    if self_initializing {
        compatible.push(FourCC::new("dash"));
    }
    (msdh, 0, compatible)
}

/// Brands for the initialization segment: the caller's brands plus the
/// literal `msdh`/`msix` 4CCs the distilled spec requires on the first
/// switch into DASH segmentation.
pub fn decide_init_segment_brands(major_brand: FourCC, compatible_brands: &[FourCC]) -> (FourCC, u32, Vec<FourCC>) {
    let mut compatible: Vec<FourCC> = compatible_brands.to_vec();
    for b in ["msdh", "msix"] {
        let fcc = FourCC::new(b);
        if !compatible.contains(&fcc) {
            compatible.push(fcc);
        }
    }
    (major_brand, 0, compatible)
}

/// Build the `styp` that precedes a DASH media segment.
pub fn build_segment_type(self_initializing: bool) -> SegmentTypeBox {
    let (major_brand, minor_version, compatible_brands) = decide_segment_type_brands(self_initializing);
    SegmentTypeBox { major_brand, minor_version, compatible_brands }
}

/// Build the `sidx` indexing the fragments of one segment. `fragments` is
/// each fragment's (duration in `timescale` units, moof+mdat byte size,
/// starts-with-SAP) in order.
pub fn build_segment_index(
    reference_id: u32,
    timescale: u32,
    earliest_presentation_time: u64,
    fragments: &[(u32, u64, bool)],
) -> SegmentIndexBox {
    let references = fragments
        .iter()
        .map(|&(duration, size, starts_with_sap)| SegmentReference {
            reference_type: 0,
            referenced_size: size as u32,
            subsegment_duration: duration,
            starts_with_sap,
            sap_type: if starts_with_sap { 1 } else { 0 },
            sap_delta_time: 0,
        })
        .collect();
    SegmentIndexBox {
        reference_id,
        timescale,
        earliest_presentation_time: VersionSizedUint(earliest_presentation_time),
        first_offset: VersionSizedUint(0),
        references,
    }
}

/// Write the fully finalized file: `ftyp`, relocated `moov`, optional
/// trailing `free`, `mdat` header, then the `mdat` payload in pieces so
/// `progress` can be polled (and can abort the write by returning `true`).
pub fn write_finalized<W: WriteBytes>(
    ftyp: &FileTypeBox,
    moov: &MovieBox,
    mdat_payload: &[u8],
    with_free: bool,
    mut progress: impl FnMut(u64, u64) -> bool,
    out: &mut W,
) -> io::Result<()> {
    ftyp.to_bytes(out)?;
    moov.to_bytes(out)?;
    if with_free {
        write_trailing_free(out)?;
    }

    let total = mdat_payload.len() as u64;
    if total + 8 > u32::MAX as u64 {
        1u32.to_bytes(out)?;
        FourCC::new("mdat").to_bytes(out)?;
        (total + 16).to_bytes(out)?;
    } else {
        ((total + 8) as u32).to_bytes(out)?;
        FourCC::new("mdat").to_bytes(out)?;
    }

    const CHUNK: usize = 1024 * 1024;
    let mut written = 0u64;
    for piece in mdat_payload.chunks(CHUNK) {
        WriteBytes::write(out, piece)?;
        written += piece.len() as u64;
        if progress(written, total) {
            return Err(ioerr!(Interrupted, "finalize: aborted by progress callback"));
        }
    }
    Ok(())
}

/// Pre-measure a count-only pass, used by callers who want the final file
/// size before committing to the real write (e.g. to preallocate).
pub fn measure_finalized(ftyp: &FileTypeBox, moov: &MovieBox, mdat_payload_len: u64, with_free: bool) -> io::Result<u64> {
    let mut counter = CountBytes::new();
    ftyp.to_bytes(&mut counter)?;
    moov.to_bytes(&mut counter)?;
    if with_free {
        write_trailing_free(&mut counter)?;
    }
    Ok(counter.size() + mdat_header_size(mdat_payload_len) + mdat_payload_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::{AccessUnit, MuxConfig};

    fn sample(dts: u64, size: usize, is_sync: bool) -> AccessUnit {
        AccessUnit { data: vec![0u8; size], dts, cts: dts as i64, is_sync, sample_description_index: 1 }
    }

    fn track_with_two_chunks() -> OutputTrack {
        let config = MuxConfig::default();
        let mut t = OutputTrack::new(1, 1000);
        t.add_sample(sample(0, 10, true), &config, 0).unwrap();
        t.add_sample(sample(40, 10, false), &config, 10).unwrap();
        t.add_sample(sample(80, 10, true), &config, 20).unwrap();
        t.flush(30);
        t.last_sample_delta = Some(40);
        t
    }

    #[test]
    fn stts_run_length_encodes_uniform_deltas() {
        let t = track_with_two_chunks();
        let stts = build_stts(&t);
        assert_eq!(stts.entries.len(), 1);
        assert_eq!(stts.entries[0].count, 3);
        assert_eq!(stts.entries[0].delta, 40);
    }

    #[test]
    fn stsc_splits_on_chunk_boundary() {
        let t = track_with_two_chunks();
        let stsc = build_stsc(&t);
        assert_eq!(stsc.entries.len(), 2);
        assert_eq!(stsc.entries[0].first_chunk, 1);
        assert_eq!(stsc.entries[0].samples_per_chunk, 2);
        assert_eq!(stsc.entries[1].first_chunk, 2);
        assert_eq!(stsc.entries[1].samples_per_chunk, 1);
    }

    #[test]
    fn stco_records_absolute_chunk_offsets() {
        let t = track_with_two_chunks();
        let stco = build_stco(&t);
        assert_eq!(stco.entries.iter_cloned().collect::<Vec<_>>(), vec![0u64, 20u64]);
    }

    #[test]
    fn stss_omitted_when_all_sync() {
        let config = MuxConfig::default();
        let mut t = OutputTrack::new(1, 1000);
        t.add_sample(sample(0, 10, true), &config, 0).unwrap();
        t.flush(10);
        assert!(build_stss(&t).is_none());
    }

    #[test]
    fn stss_lists_sync_samples_when_mixed() {
        let t = track_with_two_chunks();
        let stss = build_stss(&t).unwrap();
        assert_eq!(stss.entries.iter_cloned().collect::<Vec<_>>(), vec![1u32, 3u32]);
    }

    #[test]
    fn brand_decision_adds_3g2a_alongside_3gp6() {
        let (_, _, compat) = decide_brands(FourCC::new("3gp6"), &[], false);
        assert!(compat.contains(&FourCC::new("3g2a")));
    }

    #[test]
    fn brand_decision_forces_dash_major() {
        let (major, _, compat) = decide_brands(FourCC::new("isom"), &[], true);
        assert_eq!(major, FourCC::new("dash"));
        assert!(compat.contains(&FourCC::new("dash")));
    }

    #[test]
    fn trailing_free_box_carries_literal_message() {
        let mut buf = MemBuffer::new();
        write_trailing_free(&mut buf).unwrap();
        let bytes = buf.into_vec();
        assert_eq!(&bytes[8..], FREE_MESSAGE);
        assert_eq!(bytes[4..8].to_vec(), FourCC::new("free").to_be_bytes().to_vec());
    }

    #[test]
    fn fragment_writer_emits_moof_then_mdat_with_matching_data_offset() {
        let samples = vec![sample(0, 10, true), sample(40, 10, false)];
        let durations = vec![40u32, 40u32];
        let track = FragmentTrackData { track_id: 1, samples: &samples, durations: &durations, base_media_decode_time: 0 };

        let (moof, mdat_payload) = build_fragment(1, &[track]).unwrap();
        assert_eq!(mdat_payload.len(), 20);

        let mut buf = MemBuffer::new();
        write_fragment(&moof, &mdat_payload, &mut buf).unwrap();
        let bytes = buf.into_vec();

        assert_eq!(&bytes[4..8].to_vec(), &FourCC::new("moof").to_be_bytes().to_vec());
        let moof_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(&bytes[moof_size + 4..moof_size + 8].to_vec(), &FourCC::new("mdat").to_be_bytes().to_vec());

        let trun = moof.track_fragments()[0].track_run_boxes()[0];
        assert_eq!(trun.data_offset, Some((moof_size + 8) as i32));
    }

    #[test]
    fn write_fragments_computes_durations_across_fragment_boundaries() {
        let fragments = vec![
            Fragment { sequence_number: 1, track_runs: vec![vec![sample(0, 4, true), sample(10, 4, false)]] },
            Fragment { sequence_number: 2, track_runs: vec![vec![sample(20, 4, true)]] },
        ];
        let mut buf = MemBuffer::new();
        write_fragments(&fragments, &[1], &[5], &mut buf).unwrap();
        let bytes = buf.into_vec();
        // Two moof/mdat pairs landed in the stream: the boundary sample's
        // duration (10) came from the next fragment, not a fallback 0.
        assert!(bytes.windows(4).filter(|w| *w == FourCC::new("moof").to_be_bytes()).count() == 2);
    }

    #[test]
    fn segment_type_brands_include_msdh_and_dash_when_self_initializing() {
        let (major, _, compat) = decide_segment_type_brands(true);
        assert_eq!(major, FourCC::new("msdh"));
        assert!(compat.contains(&FourCC::new("dash")));
    }

    #[test]
    fn init_segment_brands_add_msdh_and_msix() {
        let (_, _, compat) = decide_init_segment_brands(FourCC::new("isom"), &[]);
        assert!(compat.contains(&FourCC::new("msdh")));
        assert!(compat.contains(&FourCC::new("msix")));
    }

    #[test]
    fn segment_index_carries_one_reference_per_fragment() {
        let sidx = build_segment_index(1, 1000, 0, &[(2000, 500, true), (2000, 480, false)]);
        assert_eq!(sidx.references.len(), 2);
        assert!(sidx.references[0].starts_with_sap);
    }
}
