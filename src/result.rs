//! SNR result table
use std::collections::BTreeMap;

use crate::{error::Error, projection::PlanarPoint};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per pick diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    /// Pick row index
    pub pick: usize,
    /// Slow-time sample the pick was associated to
    pub along_track: usize,
    /// Pick to slow-time association residual (s or m)
    pub offset: f64,
    /// Surface peak fast-time index
    pub surface_index: usize,
    /// Bed peak fast-time index
    pub bed_index: usize,
    /// Surface peak two way travel time (s)
    pub surface_twtt: f64,
    /// Bed peak two way travel time (s)
    pub bed_twtt: f64,
    /// Surface peak power (dB)
    pub surface_power_db: f64,
    /// Bed peak power (dB)
    pub bed_power_db: f64,
}

/// One valid SNR measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnrResult {
    /// Planar x coordinate (m)
    pub x: f64,
    /// Planar y coordinate (m)
    pub y: f64,
    /// Surface to bed SNR (dB)
    pub snr: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub diagnostics: Option<Diagnostics>,
}

impl SnrResult {
    pub fn new(x: f64, y: f64, snr: f64) -> Self {
        Self {
            x,
            y,
            snr,
            diagnostics: None,
        }
    }

    /// Copies and returns self with attached [Diagnostics]
    pub fn with_diagnostics(&self, diagnostics: Diagnostics) -> Self {
        let mut s = *self;
        s.diagnostics = Some(diagnostics);
        s
    }

    pub fn position(&self) -> PlanarPoint {
        PlanarPoint::new(self.x, self.y)
    }
}

/// Gridded SNR statistics
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridCell {
    /// Cell center x coordinate (m)
    pub x: f64,
    /// Cell center y coordinate (m)
    pub y: f64,
    /// Mean SNR (dB)
    pub mean: f64,
    /// SNR standard deviation (dB)
    pub std: f64,
    /// Number of measurements within this cell
    pub count: usize,
}

#[cfg(feature = "csv")]
const HEADER: [&str; 3] = ["x", "y", "snr"];

#[cfg(feature = "csv")]
const DIAGNOSTICS_HEADER: [&str; 9] = [
    "pick",
    "along_track",
    "offset",
    "surface_index",
    "bed_index",
    "surface_twtt",
    "bed_twtt",
    "surface_power_db",
    "bed_power_db",
];

/// SNR results, one row per valid pick, in insertion order.
/// Rows are never implicitly deduplicated: see [SnrTable::dedup_positions].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnrTable {
    rows: Vec<SnrResult>,
}

impl From<Vec<SnrResult>> for SnrTable {
    fn from(rows: Vec<SnrResult>) -> Self {
        Self { rows }
    }
}

impl FromIterator<SnrResult> for SnrTable {
    fn from_iter<I: IntoIterator<Item = SnrResult>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<SnrResult> for SnrTable {
    fn extend<I: IntoIterator<Item = SnrResult>>(&mut self, iter: I) {
        self.rows.extend(iter)
    }
}

impl IntoIterator for SnrTable {
    type Item = SnrResult;
    type IntoIter = std::vec::IntoIter<SnrResult>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl SnrTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: SnrResult) {
        self.rows.push(row);
    }

    /// Appends all rows of `rhs`
    pub fn append(&mut self, rhs: &mut Self) {
        self.rows.append(&mut rhs.rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SnrResult] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SnrResult> {
        self.rows.iter()
    }

    /// Position of every row
    pub fn positions(&self) -> Vec<PlanarPoint> {
        self.rows.iter().map(|row| row.position()).collect()
    }

    /// Copies and returns self, keeping only the first row
    /// of every group of rows sharing the exact same position.
    pub fn dedup_positions(&self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert((row.x.to_bits(), row.y.to_bits())))
            .copied()
            .collect()
    }

    /// Aggregates rows into square cells of `cell_size` meters.
    /// Returns one [GridCell] per non empty cell, ordered by cell x then y index.
    /// Standard deviation is the population standard deviation.
    pub fn grid(&self, cell_size: f64) -> Result<Vec<GridCell>, Error> {
        if !(cell_size > 0.0) || !cell_size.is_finite() {
            return Err(Error::Config(format!("invalid grid cell size {}m", cell_size)));
        }

        let mut cells = BTreeMap::<(i64, i64), Vec<f64>>::new();
        for row in self.rows.iter() {
            if !row.position().is_finite() {
                continue;
            }
            let key = (
                (row.x / cell_size).floor() as i64,
                (row.y / cell_size).floor() as i64,
            );
            cells.entry(key).or_default().push(row.snr);
        }

        Ok(cells
            .into_iter()
            .map(|((i, j), snr)| {
                let count = snr.len();
                let mean = snr.iter().sum::<f64>() / count as f64;
                let var = snr.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
                GridCell {
                    x: (i as f64 + 0.5) * cell_size,
                    y: (j as f64 + 0.5) * cell_size,
                    mean,
                    std: var.sqrt(),
                    count,
                }
            })
            .collect())
    }

    /// Writes this table as CSV. Diagnostic columns are emitted when
    /// at least one row carries diagnostics, and left empty otherwise.
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn to_csv_writer<W: std::io::Write>(&self, writer: W) -> Result<(), Error> {
        let diagnostics = self.rows.iter().any(|row| row.diagnostics.is_some());
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = HEADER.to_vec();
        if diagnostics {
            header.extend_from_slice(&DIAGNOSTICS_HEADER);
        }
        writer.write_record(&header)?;

        for row in self.rows.iter() {
            let mut record = vec![row.x.to_string(), row.y.to_string(), row.snr.to_string()];
            if diagnostics {
                match row.diagnostics {
                    Some(d) => record.extend([
                        d.pick.to_string(),
                        d.along_track.to_string(),
                        d.offset.to_string(),
                        d.surface_index.to_string(),
                        d.bed_index.to_string(),
                        d.surface_twtt.to_string(),
                        d.bed_twtt.to_string(),
                        d.surface_power_db.to_string(),
                        d.bed_power_db.to_string(),
                    ]),
                    None => record.extend(DIAGNOSTICS_HEADER.iter().map(|_| String::new())),
                }
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes this table as CSV, to given file
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn to_csv_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Error> {
        let fd = std::fs::File::create(path)?;
        self.to_csv_writer(std::io::BufWriter::new(fd))
    }

    /// Parses a CSV table with at least `x`, `y` and `snr` columns.
    /// Other columns are ignored.
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, Error> {
        #[derive(Deserialize)]
        struct Record {
            x: f64,
            y: f64,
            snr: f64,
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::new();
        for record in reader.deserialize::<Record>() {
            let record = record?;
            table.push(SnrResult::new(record.x, record.y, record.snr));
        }
        Ok(table)
    }

    /// Parses a CSV table from given file
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn from_csv_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let fd = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(fd))
    }
}
