//! Layer picks: sparse along-track surface and bed picks
use crate::{
    constants::SENTINEL,
    projection::{project, IceSheet, PlanarPoint},
};

#[cfg(feature = "csv")]
use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One along-track measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PickRow {
    /// Surface pick: range from the aircraft to the surface (m)
    #[cfg_attr(feature = "serde", serde(rename = "SURFACE"))]
    pub surface: f64,
    /// Bed pick: range from the aircraft to the bed (m)
    #[cfg_attr(feature = "serde", serde(rename = "BOTTOM"))]
    pub bottom: f64,
    /// Aircraft elevation (m)
    #[cfg_attr(feature = "serde", serde(rename = "ELEVATION"))]
    pub elevation: f64,
    /// Ice thickness (m)
    #[cfg_attr(feature = "serde", serde(rename = "THICK"))]
    pub thickness: f64,
    /// Latitude (ddeg)
    #[cfg_attr(feature = "serde", serde(rename = "LAT"))]
    pub latitude: f64,
    /// Longitude (ddeg)
    #[cfg_attr(feature = "serde", serde(rename = "LON"))]
    pub longitude: f64,
    /// UTC time of day (s)
    #[cfg_attr(feature = "serde", serde(rename = "UTCTIMESOD", default))]
    pub utc_time_sod: Option<f64>,
}

impl PickRow {
    /// Builds a pick without timestamp
    pub fn new(
        surface: f64,
        bottom: f64,
        elevation: f64,
        thickness: f64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            surface,
            bottom,
            elevation,
            thickness,
            latitude,
            longitude,
            utc_time_sod: None,
        }
    }

    /// Copies and returns self with a UTC time of day
    pub fn with_time_of_day(&self, seconds: f64) -> Self {
        let mut s = *self;
        s.utc_time_sod = Some(seconds);
        s
    }

    /// A pick is valid when none of its SURFACE, BOTTOM, ELEVATION
    /// or THICK fields carries the sentinel value
    pub fn is_valid(&self) -> bool {
        [self.surface, self.bottom, self.elevation, self.thickness]
            .iter()
            .all(|v| *v != SENTINEL)
    }

    /// Projected position
    pub fn position(&self, sheet: IceSheet) -> PlanarPoint {
        project(self.latitude, self.longitude, sheet)
    }
}

/// Pick table of one flight segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickTable {
    rows: Vec<PickRow>,
}

impl From<Vec<PickRow>> for PickTable {
    fn from(rows: Vec<PickRow>) -> Self {
        Self { rows }
    }
}

impl FromIterator<PickRow> for PickTable {
    fn from_iter<I: IntoIterator<Item = PickRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl PickTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PickRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&PickRow> {
        self.rows.get(index)
    }

    /// Iterates valid picks only, as (row index, pick)
    pub fn valid(&self) -> impl Iterator<Item = (usize, &PickRow)> + '_ {
        self.rows.iter().enumerate().filter(|(_, row)| row.is_valid())
    }

    /// Returns the UTC time of day column, when every row has one
    pub fn time_of_day(&self) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row.utc_time_sod).collect()
    }

    /// Projected position of every pick
    pub fn positions(&self, sheet: IceSheet) -> Vec<PlanarPoint> {
        self.rows.iter().map(|row| row.position(sheet)).collect()
    }

    /// Parses a CSV pick table. Columns are identified by name:
    /// SURFACE, BOTTOM, ELEVATION, THICK, LAT, LON and optionally
    /// UTCTIMESOD. Other columns are ignored.
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let rows = reader
            .deserialize::<PickRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    /// Parses a CSV pick table from given file
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn from_csv_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let fd = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(fd))
    }
}
