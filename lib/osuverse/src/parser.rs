//! Streaming reader for `.osu` descriptor files.
//!
//! Only the handful of fields the library needs are extracted: the four
//! `[Metadata]` strings, the BPM of the first uninherited timing point and
//! the span covered by `[HitObjects]`. Everything else is skipped without
//! validation.

use std::path::Path;

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::debug;

use crate::error::ParseError;

const UTF8_BOM: char = '\u{feff}';

/// Fields extracted from one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorMetadata {
    pub artist: String,
    pub title: String,
    pub creator: String,
    pub version: String,
    pub bpm: u32,
    pub total_time_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Metadata,
    TimingPoints,
    HitObjects,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name {
            "Metadata" => Section::Metadata,
            "TimingPoints" => Section::TimingPoints,
            "HitObjects" => Section::HitObjects,
            _ => Section::None,
        }
    }
}

/// Line-by-line accumulator. Feed every line in order, then call
/// [`DescriptorReader::finish`].
#[derive(Debug)]
pub struct DescriptorReader {
    section: Section,
    metadata: DescriptorMetadata,
    first_beat_length: Option<f64>,
    hit_span: Option<(i64, i64)>,
}

impl Default for DescriptorReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorReader {
    pub fn new() -> Self {
        Self {
            section: Section::None,
            metadata: DescriptorMetadata::default(),
            first_beat_length: None,
            hit_span: None,
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if let Some(name) = section_header(trimmed) {
            self.section = Section::from_header(name);
            return;
        }

        match self.section {
            Section::None => {}
            Section::Metadata => self.read_metadata(line.trim_start()),
            Section::TimingPoints if !trimmed.is_empty() => self.read_timing_point(trimmed),
            Section::HitObjects if !trimmed.is_empty() => self.read_hit_object(trimmed),
            Section::TimingPoints | Section::HitObjects => {}
        }
    }

    pub fn finish(self) -> DescriptorMetadata {
        let mut metadata = self.metadata;
        if let Some(beat_length) = self.first_beat_length {
            metadata.bpm = round_to_u32(60_000.0 / beat_length);
        }
        if let Some((min, max)) = self.hit_span {
            // Timestamps can sit at the ends of the i64 range.
            let span = i128::from(max) - i128::from(min);
            metadata.total_time_seconds = round_to_u32(span as f64 / 1000.0);
        }
        metadata
    }

    fn read_metadata(&mut self, line: &str) {
        let fields = [
            ("Artist:", &mut self.metadata.artist),
            ("Title:", &mut self.metadata.title),
            ("Creator:", &mut self.metadata.creator),
            ("Version:", &mut self.metadata.version),
        ];
        for (key, slot) in fields {
            if let Some(value) = line.strip_prefix(key) {
                *slot = value.trim().to_string();
                return;
            }
        }
    }

    fn read_timing_point(&mut self, line: &str) {
        if self.first_beat_length.is_some() {
            return;
        }
        let mut fields = line.split(',');
        let (Some(_time), Some(beat_length)) = (fields.next(), fields.next()) else {
            return;
        };
        // Negative beat lengths mark inherited (slider velocity) points.
        match beat_length.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => self.first_beat_length = Some(value),
            _ => {}
        }
    }

    fn read_hit_object(&mut self, line: &str) {
        let Some(time) = line.split(',').nth(2).and_then(parse_timestamp) else {
            return;
        };
        self.hit_span = Some(match self.hit_span {
            Some((min, max)) => (min.min(time), max.max(time)),
            None => (time, time),
        });
    }
}

/// Reads `path` in a single streaming pass.
pub async fn parse_descriptor(path: impl AsRef<Path>) -> Result<DescriptorMetadata, ParseError> {
    let path = path.as_ref();
    let io_error = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).await.map_err(io_error)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::with_capacity(256);
    let mut descriptor = DescriptorReader::new();
    let mut first = true;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).await.map_err(io_error)?;
        if read == 0 {
            break;
        }
        let text = String::from_utf8_lossy(strip_line_ending(&buf));
        let line: &str = if first {
            first = false;
            text.trim_start_matches(UTF8_BOM)
        } else {
            &text
        };
        descriptor.feed_line(line);
    }

    let metadata = descriptor.finish();
    debug!(
        "Parsed {}: {} - {} [{}]",
        path.display(),
        metadata.artist,
        metadata.title,
        metadata.version
    );
    Ok(metadata)
}

fn section_header(trimmed: &str) -> Option<&str> {
    trimmed.strip_prefix('[')?.strip_suffix(']')
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Integer timestamp with the leniency of a plain integer parse: a decimal
/// value is truncated toward zero.
fn parse_timestamp(field: &str) -> Option<i64> {
    let field = field.trim();
    field.parse::<i64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    })
}

fn round_to_u32(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> DescriptorMetadata {
        let mut reader = DescriptorReader::new();
        for line in text.lines() {
            reader.feed_line(line);
        }
        reader.finish()
    }

    #[test]
    fn extracts_metadata_timing_and_length() {
        let metadata = read(
            "osu file format v14\n\
             [General]\n\
             AudioFilename: audio.mp3\n\
             [Metadata]\n\
             Title:Bar\n\
             TitleUnicode:Bar\n\
             Artist:Foo\n\
             ArtistUnicode:Fuu\n\
             Creator: someone \n\
             Version:Hard\n\
             [TimingPoints]\n\
             0,500,4,2,0,100,1,0\n\
             [HitObjects]\n\
             256,192,1000,1,0,0:0:0:0:\n\
             256,192,5000,1,0,0:0:0:0:\n",
        );

        assert_eq!(
            metadata,
            DescriptorMetadata {
                artist: "Foo".to_string(),
                title: "Bar".to_string(),
                creator: "someone".to_string(),
                version: "Hard".to_string(),
                bpm: 120,
                total_time_seconds: 4,
            }
        );
    }

    #[test]
    fn missing_sections_yield_defaults() {
        assert_eq!(read("osu file format v14\n[General]\nMode: 0\n"), DescriptorMetadata::default());
    }

    #[test]
    fn first_positive_beat_length_wins() {
        let metadata = read(
            "[TimingPoints]\n\
             100,-50,4,2,0,100,0,0\n\
             bogus\n\
             200,abc\n\
             300,333.333,4,2,0,100,1,0\n\
             400,250,4,2,0,100,1,0\n",
        );
        assert_eq!(metadata.bpm, 180);
    }

    #[test]
    fn only_inherited_points_give_zero_bpm() {
        let metadata = read("[TimingPoints]\n0,-100\n10,-50\n");
        assert_eq!(metadata.bpm, 0);
    }

    #[test]
    fn hit_objects_track_min_and_max() {
        let metadata = read(
            "[HitObjects]\n\
             1,1,9000,1\n\
             1,1\n\
             1,1,nope,1\n\
             1,1,2500,1\n\
             1,1,4600.7,1\n",
        );
        // (9000 - 2500) / 1000 = 6.5 -> 7
        assert_eq!(metadata.total_time_seconds, 7);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let metadata = read("[HitObjects]\n0,0,-1e30,1\n0,0,1e30,1\n");
        assert_eq!(metadata.total_time_seconds, u32::MAX);

        let metadata = read(&format!(
            "[HitObjects]\n0,0,{},1\n0,0,{},1\n",
            i64::MIN,
            i64::MAX
        ));
        assert_eq!(metadata.total_time_seconds, u32::MAX);
    }

    #[test]
    fn single_hit_object_is_zero_length() {
        assert_eq!(read("[HitObjects]\n1,1,4000,1\n").total_time_seconds, 0);
    }

    #[test]
    fn any_header_closes_the_previous_section() {
        let metadata = read(
            "[Metadata]\n\
             Artist:First\n\
             [Colours]\n\
             Artist:Ignored\n\
             [Metadata]\n\
             Artist:  Last  \n",
        );
        assert_eq!(metadata.artist, "Last");
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let metadata = read("[Metadata]\nTitle:One\nTitle:Two\n");
        assert_eq!(metadata.title, "Two");
    }

    #[test]
    fn header_with_surrounding_whitespace_is_recognised() {
        let metadata = read("  [Metadata]  \nVersion:Normal\n");
        assert_eq!(metadata.version, "Normal");
    }

    #[test]
    fn strips_crlf() {
        assert_eq!(strip_line_ending(b"Artist:Foo\r\n"), b"Artist:Foo");
        assert_eq!(strip_line_ending(b"Artist:Foo\n"), b"Artist:Foo");
        assert_eq!(strip_line_ending(b"Artist:Foo"), b"Artist:Foo");
    }

    #[tokio::test]
    async fn parses_file_with_crlf_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.osu");
        std::fs::write(
            &path,
            "\u{feff}[Metadata]\r\nArtist:Foo\r\nTitle:Bar\r\n[TimingPoints]\r\n0,500,4\r\n\r\n[HitObjects]\r\n0,0,1000,1\r\n0,0,5000,1\r\n",
        )
        .unwrap();

        let metadata = parse_descriptor(&path).await.unwrap();
        assert_eq!(metadata.artist, "Foo");
        assert_eq!(metadata.title, "Bar");
        assert_eq!(metadata.bpm, 120);
        assert_eq!(metadata.total_time_seconds, 4);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_descriptor(dir.path().join("absent.osu")).await.unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
