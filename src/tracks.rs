use std::io;
use std::io::{BufRead, Write};
use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::file::{FileError, InputFile};

/// The integer type for genomic positions (signed, as in the input text).
pub type Position = i64;

/// The integer type for per-sample genotype codes.
pub type GenotypeCode = i64;

/// The literal that marks the header line in its second column.
pub const HEADER_KEY: &str = "POS";

#[derive(Error, Debug)]
pub enum RecPlotError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("Missing field {field} on line {line}")]
    MissingField { line: usize, field: usize },
    #[error("Failed to parse integer '{text}' on line {line}: {source}")]
    ParseError {
        line: usize,
        text: String,
        source: ParseIntError,
    },
    #[error("Unsupported image format '{0}' (expected svg, png, jpg, jpeg or bmp)")]
    UnsupportedFormat(String),
    #[error("Plotting error: {0}")]
    PlotError(String),
}

/// One of the three trailing genotype columns, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    First,
    Second,
    Third,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::First, Track::Second, Track::Third];

    /// The 0-based index of this track among the trailing columns.
    pub fn index(self) -> usize {
        match self {
            Track::First => 0,
            Track::Second => 1,
            Track::Third => 2,
        }
    }

    /// The y-level this track is drawn at.
    pub fn level(self) -> f64 {
        match self {
            Track::First => 1.0,
            Track::Second => 0.0,
            Track::Third => -1.0,
        }
    }
}

/// The header line of a variant table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Number of whitespace-separated fields in the header.
    pub num_fields: usize,
    /// Names of the three trailing sample columns.
    pub samples: [String; 3],
    /// Which trailing column, if any, is named after the recombinant.
    pub recomb: Option<Track>,
}

impl Header {
    /// Recognize a header line from its fields.
    ///
    /// A header has more than two fields and `POS` as its second field. The
    /// recombinant column is matched by exact name; if several columns carry
    /// the name, the last one wins.
    pub fn parse(fields: &[&str], recomb_name: Option<&str>) -> Option<Header> {
        if fields.len() <= 2 || fields[1] != HEADER_KEY {
            return None;
        }
        let n = fields.len();
        let samples = [
            fields[n - 3].to_string(),
            fields[n - 2].to_string(),
            fields[n - 1].to_string(),
        ];
        let recomb = recomb_name.and_then(|name| {
            Track::ALL
                .iter()
                .rev()
                .copied()
                .find(|track| samples[track.index()] == name)
        });
        Some(Header {
            num_fields: n,
            samples,
            recomb,
        })
    }

    /// Field indices of the three trailing genotype columns.
    fn columns(&self) -> [usize; 3] {
        let n = self.num_fields;
        [n - 3, n - 2, n - 1]
    }
}

fn parse_field<T>(fields: &[&str], index: usize, line: usize) -> Result<T, RecPlotError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    let text = fields.get(index).ok_or(RecPlotError::MissingField {
        line,
        field: index,
    })?;
    text.parse().map_err(|source| RecPlotError::ParseError {
        line,
        text: text.to_string(),
        source,
    })
}

/// Positions at which each of the three samples carries a non-reference call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecombTracks {
    recomb_name: Option<String>,
    header: Option<Header>,
    positions: [Vec<Position>; 3],
}

impl RecombTracks {
    /// Create empty tracks, waiting for a header line.
    ///
    /// # Arguments
    ///  * `recomb_name`: the name of the recombinant sample column, if any.
    pub fn new(recomb_name: Option<&str>) -> Self {
        Self {
            recomb_name: recomb_name.map(str::to_string),
            header: None,
            positions: Default::default(),
        }
    }

    /// Read tracks from a plaintext or gzip-compressed variant table.
    pub fn from_path(
        filepath: impl AsRef<Path>,
        recomb_name: Option<&str>,
    ) -> Result<RecombTracks, RecPlotError> {
        let input_file = InputFile::new(filepath);
        RecombTracks::from_lines(input_file.lines()?, recomb_name)
    }

    /// Read tracks from any line-oriented reader.
    pub fn from_reader<R: BufRead>(
        reader: R,
        recomb_name: Option<&str>,
    ) -> Result<RecombTracks, RecPlotError> {
        RecombTracks::from_lines(reader.lines(), recomb_name)
    }

    fn from_lines<I>(lines: I, recomb_name: Option<&str>) -> Result<RecombTracks, RecPlotError>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        let mut tracks = RecombTracks::new(recomb_name);
        for (i, result) in lines.enumerate() {
            let line = result?;
            tracks.push_line(&line, i + 1)?;
        }
        if tracks.header.is_none() {
            info!("no header line with '{}' in its second column", HEADER_KEY);
        }
        for track in Track::ALL {
            info!("track {}: {} positions", track.index(), tracks.track(track).len());
        }
        Ok(tracks)
    }

    /// Classify and process one line of input.
    ///
    /// Before the header is found, non-header lines are ignored. After it,
    /// lines whose three genotype codes are all equal are skipped; otherwise
    /// the line's position is appended to every track with a positive code.
    ///
    /// # Arguments
    ///  * `line`: the raw line.
    ///  * `line_no`: the 1-based line number, used in error messages.
    pub fn push_line(&mut self, line: &str, line_no: usize) -> Result<(), RecPlotError> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        let columns = match self.header.as_ref().map(Header::columns) {
            Some(columns) => columns,
            None => {
                if let Some(header) = Header::parse(&fields, self.recomb_name.as_deref()) {
                    debug!(
                        "header on line {}: samples {:?}, recombinant {:?}",
                        line_no, header.samples, header.recomb
                    );
                    self.header = Some(header);
                }
                return Ok(());
            }
        };

        let mut codes = [0 as GenotypeCode; 3];
        for (code, &column) in codes.iter_mut().zip(columns.iter()) {
            *code = parse_field(&fields, column, line_no)?;
        }

        if codes[0] == codes[1] && codes[0] == codes[2] {
            return Ok(());
        }

        // position is only needed (and only parsed) if some sample carries the call
        let mut position: Option<Position> = None;
        for (track, &code) in codes.iter().enumerate() {
            if code > 0 {
                let pos = match position {
                    Some(pos) => pos,
                    None => *position.insert(parse_field(&fields, 1, line_no)?),
                };
                self.positions[track].push(pos);
            }
        }
        Ok(())
    }

    /// The header, if one has been found.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// The recombinant track, if the header named one.
    pub fn recomb(&self) -> Option<Track> {
        self.header.as_ref().and_then(|header| header.recomb)
    }

    /// The 0-based index of the recombinant track, if any.
    pub fn recomb_idx(&self) -> Option<usize> {
        self.recomb().map(Track::index)
    }

    /// The recorded positions of a track, in input order.
    pub fn track(&self, track: Track) -> &[Position] {
        &self.positions[track.index()]
    }

    /// Iterate over tracks and their positions.
    pub fn iter(&self) -> impl Iterator<Item = (Track, &[Position])> {
        Track::ALL.into_iter().map(move |track| (track, self.track(track)))
    }

    /// Total number of recorded points over all tracks.
    pub fn len(&self) -> usize {
        self.positions.iter().map(Vec::len).sum()
    }

    /// Return if no points were recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the three position lists, one per line, as `[a, b, c]`.
    pub fn write_lists<W: Write>(&self, writer: &mut W) -> Result<(), RecPlotError> {
        for positions in &self.positions {
            writeln!(writer, "{:?}", positions)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(input: &str, recomb: Option<&str>) -> RecombTracks {
        RecombTracks::from_reader(Cursor::new(input), recomb).unwrap()
    }

    #[test]
    fn test_header_recomb_last_column() {
        let tracks = read("#CHROM POS A B R\n", Some("R"));
        assert_eq!(tracks.recomb_idx(), Some(2));
        let header = tracks.header().unwrap();
        assert_eq!(header.num_fields, 5);
        assert_eq!(header.samples, ["A", "B", "R"].map(String::from));
    }

    #[test]
    fn test_header_recomb_first_and_none() {
        assert_eq!(read("x POS R B C\n", Some("R")).recomb_idx(), Some(0));
        assert_eq!(read("x POS A B C\n", Some("R")).recomb_idx(), None);
        assert_eq!(read("x POS A B C\n", None).recomb_idx(), None);
    }

    #[test]
    fn test_header_duplicate_name_last_wins() {
        assert_eq!(read("x POS R R C\n", Some("R")).recomb_idx(), Some(1));
    }

    #[test]
    fn test_header_needs_three_fields() {
        assert!(Header::parse(&["x", "POS"], None).is_none());
        assert!(Header::parse(&["POS", "x", "y"], None).is_none());
        let header = Header::parse(&["x", "POS", "y"], Some("x")).unwrap();
        assert_eq!(header.recomb, Some(Track::First));
    }

    #[test]
    fn test_all_equal_skipped() {
        let tracks = read("chr1 POS A B R\nchr1 100 0 0 0\nchr1 150 1 1 1\n", None);
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_positive_codes_only() {
        let tracks = read("chr1 POS A B R\nchr1 200 1 0 -1\n", Some("R"));
        assert_eq!(tracks.track(Track::First), &[200]);
        assert!(tracks.track(Track::Second).is_empty());
        assert!(tracks.track(Track::Third).is_empty());
        assert_eq!(tracks.len(), 1);
    }

    #[test]
    fn test_multiple_tracks_per_line() {
        let input = "chr1 POS A B R\nchr1 10 1 0 2\nchr1 20 0 3 3\nchr1 30 0 1 0\n";
        let tracks = read(input, Some("R"));
        assert_eq!(tracks.track(Track::First), &[10]);
        assert_eq!(tracks.track(Track::Second), &[20, 30]);
        assert_eq!(tracks.track(Track::Third), &[10, 20]);
    }

    #[test]
    fn test_no_header_yields_empty() {
        let tracks = read("chr1 100 1 0 0\nchr1 200 0 1 0\n", Some("R"));
        assert!(tracks.header().is_none());
        assert!(tracks.is_empty());
        assert_eq!(tracks.recomb_idx(), None);
    }

    #[test]
    fn test_lines_before_header_ignored() {
        let input = "##fileformat=VCFv4.2\n\nnot a header at all\nchr1 POS A B R\nchr1 5 0 1 0\n";
        let tracks = read(input, None);
        assert_eq!(tracks.track(Track::Second), &[5]);
    }

    #[test]
    fn test_columns_follow_header_width() {
        // extra trailing field on the data line is ignored; columns come from the header
        let tracks = read("c POS A B R\nc 7 1 0 0 9\n", None);
        assert_eq!(tracks.track(Track::First), &[7]);
        assert!(tracks.track(Track::Third).is_empty());
    }

    #[test]
    fn test_short_line_is_error() {
        let result = RecombTracks::from_reader(Cursor::new("c POS A B R\n\n"), None);
        assert!(matches!(
            result,
            Err(RecPlotError::MissingField { line: 2, field: 2 })
        ));
    }

    #[test]
    fn test_bad_code_is_error() {
        let result = RecombTracks::from_reader(Cursor::new("c POS A B R\nc 1 0 x 1\n"), None);
        match result {
            Err(RecPlotError::ParseError { line, text, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "x");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_header_is_data() {
        let result = RecombTracks::from_reader(Cursor::new("c POS A B R\nc POS A B R\n"), None);
        assert!(matches!(result, Err(RecPlotError::ParseError { line: 2, .. })));
    }

    #[test]
    fn test_position_parsed_only_when_used() {
        let tracks = read("c POS A B R\nc ??? 0 -1 0\n", None);
        assert!(tracks.is_empty());

        let result = RecombTracks::from_reader(Cursor::new("c POS A B R\nc ??? 0 1 0\n"), None);
        assert!(matches!(result, Err(RecPlotError::ParseError { line: 2, .. })));
    }

    #[test]
    fn test_negative_position() {
        let tracks = read("c POS A B R\nc -5 1 0 0\n", None);
        assert_eq!(tracks.track(Track::First), &[-5]);
    }

    #[test]
    fn test_write_lists() {
        let tracks = read("c POS A B R\nc 100 1 0 0\nc 150 1 1 0\n", None);
        let mut out = Vec::new();
        tracks.write_lists(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[100, 150]\n[150]\n[]\n");
    }

    #[test]
    fn test_from_path_fixture() {
        let tracks =
            RecombTracks::from_path("tests/data/recomb_test.txt", Some("recomb_node")).unwrap();
        assert_eq!(tracks.recomb(), Some(Track::Third));
        assert_eq!(tracks.track(Track::First), &[241, 3037, 14408]);
        assert_eq!(tracks.track(Track::Second), &[23403, 28881, 28882]);
        assert_eq!(tracks.track(Track::Third), &[241, 3037, 23403, 28881, 28882]);
    }
}
