//! Chapter text parsing.
//!
//! Reads OGM-style (`CHAPTERnn=`/`CHAPTERnnNAME=`) and Nero-style
//! (`HH:MM:SS.mmm name`) plain-text chapter files into a `ChapterListBox`.
//! No `regex` dependency: both formats are simple enough to parse with
//! `str::split`/`strip_prefix`, matching the rest of this crate's
//! zero-regex-in-the-core-library convention.

use std::io;

use crate::boxes::{ChapterListBox, ChapterListEntry};

/// UTF-8 byte order mark, prefixed to chapter titles when requested.
const BOM: &str = "\u{feff}";

/// Parse a chapter text file (OGM or Nero style, auto-detected) into a
/// `ChapterListBox`.
///
/// `add_bom` prefixes every chapter title with a UTF-8 BOM, matching a
/// convention some players expect for this box.
pub fn parse_chapters(text: &str, add_bom: bool) -> io::Result<ChapterListBox> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Ok(ChapterListBox { entries: Vec::new() });
    }

    let entries = if lines.iter().any(|l| l.trim_start().starts_with("CHAPTER")) {
        parse_ogm(&lines)?
    } else {
        parse_nero(&lines)?
    };

    let entries = entries
        .into_iter()
        .map(|(start_time, title)| {
            let title = if add_bom { format!("{}{}", BOM, title) } else { title };
            ChapterListEntry { start_time, title }
        })
        .collect();

    Ok(ChapterListBox { entries })
}

/// OGM-style: two lines per chapter,
/// `CHAPTERnn=HH:MM:SS.mmm` followed by `CHAPTERnnNAME=title`.
fn parse_ogm(lines: &[&str]) -> io::Result<Vec<(u64, String)>> {
    use std::collections::BTreeMap;

    let mut times: BTreeMap<u32, u64> = BTreeMap::new();
    let mut names: BTreeMap<u32, String> = BTreeMap::new();

    for line in lines {
        let rest = match line.trim_start().strip_prefix("CHAPTER") {
            Some(r) => r,
            None => continue,
        };
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits_end == 0 {
            continue;
        }
        let num: u32 = rest[..digits_end]
            .parse()
            .map_err(|_| ioerr!(InvalidData, "chapters: bad chapter number in {:?}", line))?;
        let rest = &rest[digits_end..];

        if let Some(value) = rest.strip_prefix("NAME=") {
            names.insert(num, value.to_string());
        } else if let Some(value) = rest.strip_prefix('=') {
            let ts = parse_timestamp(value.trim())?;
            times.insert(num, ts);
        }
    }

    let mut out: Vec<(u32, u64, String)> = times
        .into_iter()
        .map(|(num, ts)| {
            let name = names.remove(&num).unwrap_or_else(|| format!("Chapter {:02}", num));
            (num, ts, name)
        })
        .collect();
    out.sort_by_key(|&(num, ..)| num);

    Ok(out.into_iter().map(|(_, ts, name)| (ts, name)).collect())
}

/// Nero-style: one chapter per line, `HH:MM:SS.mmm chapter name`.
fn parse_nero(lines: &[&str]) -> io::Result<Vec<(u64, String)>> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.trim();
        let split_at = line.find(char::is_whitespace).unwrap_or(line.len());
        let (ts_part, rest) = line.split_at(split_at);
        let ts = parse_timestamp(ts_part)?;
        out.push((ts, rest.trim().to_string()));
    }
    Ok(out)
}

/// Parse `HH:MM:SS.mmm` into a 100ns-unit timestamp (the unit `chpl` uses).
fn parse_timestamp(s: &str) -> io::Result<u64> {
    let bad = || ioerr!(InvalidData, "chapters: bad timestamp {:?}", s);

    let (hms, frac) = match s.split_once('.') {
        Some((a, b)) => (a, b),
        None => (s, "000"),
    };
    let mut parts = hms.split(':');
    let h: u64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let m: u64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let s_: u64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if parts.next().is_some() {
        return Err(bad());
    }

    let mut frac = frac.to_string();
    while frac.len() < 3 {
        frac.push('0');
    }
    frac.truncate(3);
    let ms: u64 = frac.parse().map_err(|_| bad())?;

    let total_ms = ((h * 60 + m) * 60 + s_) * 1000 + ms;
    Ok(total_ms * 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ogm_style() {
        let text = "\
CHAPTER01=00:00:00.000
CHAPTER01NAME=Intro
CHAPTER02=00:01:30.500
CHAPTER02NAME=Chapter Two
";
        let chpl = parse_chapters(text, false).unwrap();
        assert_eq!(chpl.entries.len(), 2);
        assert_eq!(chpl.entries[0].title, "Intro");
        assert_eq!(chpl.entries[0].start_time, 0);
        assert_eq!(chpl.entries[1].title, "Chapter Two");
        assert_eq!(chpl.entries[1].start_time, 90_500 * 10_000);
    }

    #[test]
    fn parses_nero_style() {
        let text = "00:00:00.000 Intro\n00:02:00.000 Chapter Two\n";
        let chpl = parse_chapters(text, false).unwrap();
        assert_eq!(chpl.entries.len(), 2);
        assert_eq!(chpl.entries[1].start_time, 120_000 * 10_000);
        assert_eq!(chpl.entries[1].title, "Chapter Two");
    }

    #[test]
    fn add_bom_prefixes_titles() {
        let text = "00:00:00.000 Intro\n";
        let chpl = parse_chapters(text, true).unwrap();
        assert!(chpl.entries[0].title.starts_with(BOM));
        assert!(chpl.entries[0].title.ends_with("Intro"));
    }

    #[test]
    fn empty_input_yields_no_entries() {
        let chpl = parse_chapters("", false).unwrap();
        assert_eq!(chpl.entries.len(), 0);
    }
}
