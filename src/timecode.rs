//! Timecode file parsing.
//!
//! Reads the two timecode-v2-companion formats used to drive a track's
//! presentation timestamps from an external text file (the format
//! popularized by `mkvmerge`/`x264`): format v1 (an assumed frame rate plus
//! ranges that override it) and format v2 (one absolute millisecond
//! timestamp per frame). Output is always per-sample timestamps in a chosen
//! media timescale, following the same regex-free parsing convention as
//! `chapters.rs`.

use std::io;

/// Timescale Matroska falls back to when no rational common denominator
/// fits in 32 bits.
pub const MATROSKA_TIMESCALE: u32 = 1_000_000_000;

/// Parse either timecode format, auto-detected from the first non-blank,
/// non-comment line.
pub fn parse_timecode_file(text: &str, frame_count: usize) -> io::Result<Vec<f64>> {
    let first_line = text
        .lines()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('#'));

    match first_line {
        Some(l) if l.starts_with("assume") || l.contains(',') => parse_v1(text, frame_count),
        _ => parse_v2(text, frame_count),
    }
}

/// Format v1: `# timecode format v1`, then `assume <fps>`, then zero or
/// more `<start_frame>,<end_frame>,<fps>` range overrides (inclusive,
/// 0-based frame indices, later ranges win on overlap).
fn parse_v1(text: &str, frame_count: usize) -> io::Result<Vec<f64>> {
    let mut default_fps: Option<f64> = None;
    let mut ranges: Vec<(usize, usize, f64)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("assume") {
            default_fps = Some(
                rest.trim()
                    .parse()
                    .map_err(|_| ioerr!(InvalidData, "timecode v1: bad assume line {:?}", line))?,
            );
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 3 {
            return Err(ioerr!(InvalidData, "timecode v1: bad range line {:?}", line));
        }
        let bad = || ioerr!(InvalidData, "timecode v1: bad range line {:?}", line);
        let start: usize = parts[0].trim().parse().map_err(|_| bad())?;
        let end: usize = parts[1].trim().parse().map_err(|_| bad())?;
        let fps: f64 = parts[2].trim().parse().map_err(|_| bad())?;
        ranges.push((start, end, fps));
    }

    let default_fps = default_fps.ok_or_else(|| ioerr!(InvalidData, "timecode v1: missing 'assume' line"))?;

    let mut fps_per_frame = vec![default_fps; frame_count];
    for (start, end, fps) in ranges {
        for f in fps_per_frame.iter_mut().take(std::cmp::min(end + 1, frame_count)).skip(start) {
            *f = fps;
        }
    }

    let mut out = Vec::with_capacity(frame_count);
    let mut t = 0.0f64;
    for fps in fps_per_frame {
        out.push(t);
        if fps <= 0.0 {
            return Err(ioerr!(InvalidData, "timecode v1: non-positive fps {}", fps));
        }
        t += 1000.0 / fps;
    }
    Ok(out)
}

/// Format v2: `# timecode format v2` header (optional), then one absolute
/// millisecond timestamp per frame, strictly increasing.
fn parse_v2(text: &str, frame_count: usize) -> io::Result<Vec<f64>> {
    let mut out = Vec::with_capacity(frame_count);
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let ts: f64 = line
            .parse()
            .map_err(|_| ioerr!(InvalidData, "timecode v2: bad timestamp {:?}", line))?;
        out.push(ts);
    }
    if out.len() < frame_count {
        return Err(ioerr!(
            InvalidData,
            "timecode v2: {} timestamps for {} samples",
            out.len(),
            frame_count
        ));
    }
    out.truncate(frame_count);
    for w in out.windows(2) {
        if w[1] <= w[0] {
            return Err(ioerr!(InvalidData, "timecode v2: timestamps are not strictly increasing"));
        }
    }
    Ok(out)
}

/// Pick a timescale covering every timestamp's sub-millisecond precision
/// exactly, as the least common multiple of the millisecond denominators
/// actually needed; falls back to `MATROSKA_TIMESCALE` (rounding) if the
/// LCM would not fit in a 32-bit box field.
pub fn auto_timescale(timestamps_ms: &[f64]) -> u32 {
    fn gcd(a: u64, b: u64) -> u64 {
        if b == 0 { a } else { gcd(b, a % b) }
    }
    fn lcm(a: u64, b: u64) -> Option<u64> {
        (a / gcd(a, b)).checked_mul(b)
    }

    // Base timescale of 1000 covers plain millisecond precision; fold in
    // a higher denominator (1e4, 1e5, ...) for every extra decimal digit
    // a timestamp in the file actually uses.
    let mut timescale: u64 = 1000;
    for &ts in timestamps_ms {
        let s = format!("{}", ts);
        let extra_digits = match s.split_once('.') {
            Some((_, frac)) => frac.trim_end_matches('0').len() as u32,
            None => 0,
        };
        let denom = 1000u64.saturating_mul(10u64.pow(extra_digits));
        match lcm(timescale, denom) {
            Some(v) if v <= u32::MAX as u64 => timescale = v,
            _ => return MATROSKA_TIMESCALE,
        }
    }
    timescale as u32
}

/// Convert millisecond timestamps into sample counts in `timescale` units.
pub fn to_timescale(timestamps_ms: &[f64], timescale: u32) -> Vec<u64> {
    timestamps_ms
        .iter()
        .map(|&ms| (ms * timescale as f64 / 1000.0).round() as u64)
        .collect()
}

/// DTS-compression transform: rewrite DTSs as a uniform cadence so a
/// fixed-frame-rate player doesn't see the source's small PTS jitter.
///
/// The cadence is `first inter-sample delta / (sample_delay + 1)`, matching
/// how a frame-reordering encoder spreads B-frame delay evenly across the
/// decode timeline.
pub fn compress_dts(dts: &[u64], sample_delay: u32) -> Vec<u64> {
    if dts.len() < 2 {
        return dts.to_vec();
    }
    let first_delta = dts[1].saturating_sub(dts[0]).max(1);
    let step = std::cmp::max(1, first_delta / (sample_delay as u64 + 1));
    (0..dts.len() as u64).map(|i| i * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_v1_constant_fps() {
        let text = "# timecode format v1\nassume 25\n";
        let ts = parse_v1(text, 4).unwrap();
        assert_eq!(ts.len(), 4);
        assert!((ts[1] - 40.0).abs() < 1e-6);
    }

    #[test]
    fn parses_v1_with_range_override() {
        let text = "# timecode format v1\nassume 25\n0,1,50\n";
        let ts = parse_v1(text, 4).unwrap();
        // first two frames run at 50fps (20ms), remaining at 25fps (40ms)
        assert!((ts[1] - 20.0).abs() < 1e-6);
        assert!((ts[2] - 40.0).abs() < 1e-6);
    }

    #[test]
    fn parses_v2_strictly_increasing() {
        let text = "# timecode format v2\n0.000000\n40.000000\n80.000000\n";
        let ts = parse_v2(text, 3).unwrap();
        assert_eq!(ts, vec![0.0, 40.0, 80.0]);
    }

    #[test]
    fn v2_rejects_non_increasing() {
        let text = "0\n0\n40\n";
        assert!(parse_v2(text, 3).is_err());
    }

    #[test]
    fn auto_detects_format() {
        let v1 = "assume 25\n";
        let v2 = "0\n40\n80\n";
        assert_eq!(parse_timecode_file(v1, 2).unwrap().len(), 2);
        assert_eq!(parse_timecode_file(v2, 3).unwrap().len(), 3);
    }

    #[test]
    fn compress_dts_is_uniform() {
        let dts = vec![0, 40, 83, 121];
        let out = compress_dts(&dts, 0);
        assert_eq!(out, vec![0, 40, 80, 120]);
    }
}
