//! Cross dataset comparison.
//!
//! Two SNR tables covering the same area (for example two instruments
//! flying the same lines) are joined in the projected plane, so their
//! SNR estimates can be compared location by location.
use log::debug;

use crate::{
    constants::Defaults,
    error::Error,
    result::SnrTable,
    spatial::{SpatialIndex, SpatialMatch},
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// One joined pair of measurements
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Comparison {
    pub x_a: f64,
    pub y_a: f64,
    pub snr_a: f64,
    pub x_b: f64,
    pub y_b: f64,
    pub snr_b: f64,
    /// Distance between both measurements (m)
    pub distance: f64,
}

impl Comparison {
    /// SNR difference (A - B) in dB
    pub fn difference(&self) -> f64 {
        self.snr_a - self.snr_b
    }
}

/// Summary of a [ComparisonTable]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonStats {
    pub count: usize,
    /// Mean (A - B) difference (dB)
    pub mean_difference: f64,
    /// Mean |A - B| difference (dB)
    pub mean_abs_difference: f64,
    /// Population standard deviation of (A - B) (dB)
    pub std_difference: f64,
    /// Mean join distance (m)
    pub mean_distance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    rows: Vec<Comparison>,
}

impl ComparisonTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Comparison] {
        &self.rows
    }

    /// Returns None on empty tables
    pub fn stats(&self) -> Option<ComparisonStats> {
        if self.rows.is_empty() {
            return None;
        }
        let n = self.rows.len() as f64;
        let mean = self.rows.iter().map(|c| c.difference()).sum::<f64>() / n;
        let var = self
            .rows
            .iter()
            .map(|c| (c.difference() - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(ComparisonStats {
            count: self.rows.len(),
            mean_difference: mean,
            mean_abs_difference: self.rows.iter().map(|c| c.difference().abs()).sum::<f64>() / n,
            std_difference: var.sqrt(),
            mean_distance: self.rows.iter().map(|c| c.distance).sum::<f64>() / n,
        })
    }

    /// Writes this table as CSV, with a header line
    #[cfg(feature = "csv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
    pub fn to_csv_writer<W: std::io::Write>(&self, writer: W) -> Result<(), Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in self.rows.iter() {
            writer.serialize(row)?;
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
}

/// Joins a dataset (A) onto a reference dataset (B)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparer {
    /// Nearest matches at or beyond this distance (m) are dropped
    pub threshold: Option<f64>,
    /// Inverts the sign of B's SNR, for datasets using the
    /// opposite (bed to surface) convention
    pub invert_reference: bool,
}

impl Default for Comparer {
    fn default() -> Self {
        Self {
            threshold: Some(Defaults::COMPARISON_THRESHOLD_M),
            invert_reference: false,
        }
    }
}

impl Comparer {
    fn join(&self, a: &SnrTable, b: &SnrTable, matches: Vec<SpatialMatch>) -> ComparisonTable {
        let sign = if self.invert_reference { -1.0 } else { 1.0 };
        let rows = matches
            .into_iter()
            .map(|m| {
                let (ra, rb) = (&a.rows()[m.query], &b.rows()[m.reference]);
                Comparison {
                    x_a: ra.x,
                    y_a: ra.y,
                    snr_a: ra.snr,
                    x_b: rb.x,
                    y_b: rb.y,
                    snr_b: sign * rb.snr,
                    distance: m.distance,
                }
            })
            .collect::<Vec<_>>();
        debug!("comparison: {}/{} measurements joined", rows.len(), a.len());
        ComparisonTable { rows }
    }

    /// Associates every measurement of A to its closest measurement of B.
    /// Measurements of A without a neighbor within threshold are omitted.
    pub fn nearest(&self, a: &SnrTable, b: &SnrTable) -> ComparisonTable {
        let index = SpatialIndex::build(&b.positions());
        let queries = a.positions();
        let matches = match self.threshold {
            Some(threshold) => index.nearest_within(&queries, threshold),
            None => index.nearest(&queries).into_iter().flatten().collect(),
        };
        self.join(a, b, matches)
    }

    /// Associates every measurement of A to all measurements of B
    /// strictly closer than `radius`.
    pub fn within_radius(&self, a: &SnrTable, b: &SnrTable, radius: f64) -> Result<ComparisonTable, Error> {
        if !(radius > 0.0) {
            return Err(Error::Config(format!("invalid comparison radius {}m", radius)));
        }
        let index = SpatialIndex::build(&b.positions());
        let matches = index.within_radius(&a.positions(), radius);
        Ok(self.join(a, b, matches))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::result::SnrResult;

    fn tables() -> (SnrTable, SnrTable) {
        let a: SnrTable = vec![
            SnrResult::new(0.0, 0.0, 10.0),
            SnrResult::new(1000.0, 0.0, 12.0),
            SnrResult::new(50_000.0, 0.0, 8.0),
        ]
        .into();
        let b: SnrTable = vec![
            SnrResult::new(10.0, 0.0, 9.0),
            SnrResult::new(1100.0, 0.0, 11.0),
            SnrResult::new(1200.0, 0.0, 13.0),
        ]
        .into();
        (a, b)
    }

    #[test]
    fn nearest_join() {
        let (a, b) = tables();
        let table = Comparer::default().nearest(&a, &b);
        assert_eq!(table.len(), 2, "far measurement should be dropped");
        assert_eq!(table.rows()[0].snr_b, 9.0);
        assert_eq!(table.rows()[0].distance, 10.0);
        assert_eq!(table.rows()[1].snr_b, 11.0);

        let stats = table.stats().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_difference, 1.0);
        assert_eq!(stats.mean_abs_difference, 1.0);
        assert_eq!(stats.std_difference, 0.0);
        assert_eq!(stats.mean_distance, 55.0);

        let unbounded = Comparer {
            threshold: None,
            ..Default::default()
        }
        .nearest(&a, &b);
        assert_eq!(unbounded.len(), 3);
    }

    #[test]
    fn inverted_reference() {
        let (a, b) = tables();
        let table = Comparer {
            invert_reference: true,
            ..Default::default()
        }
        .nearest(&a, &b);
        assert_eq!(table.rows()[0].snr_b, -9.0);
        assert_eq!(table.rows()[0].difference(), 19.0);
    }

    #[test]
    fn radius_join() {
        let (a, b) = tables();
        let comparer = Comparer::default();
        let table = comparer.within_radius(&a, &b, 250.0).unwrap();
        // (0,0) -> b0, (1000,0) -> b1 and b2
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1].snr_b, 11.0);
        assert_eq!(table.rows()[2].snr_b, 13.0);
        assert!(table.rows().iter().all(|c| c.distance < 250.0));
        assert!(comparer.within_radius(&a, &b, 0.0).is_err());
        assert!(ComparisonTable::default().stats().is_none());
    }

    #[test]
    #[cfg(feature = "csv")]
    fn csv_output() {
        let (a, b) = tables();
        let table = Comparer::default().nearest(&a, &b);
        let mut buf = Vec::new();
        table.to_csv_writer(&mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("x_a,y_a,snr_a,x_b,y_b,snr_b,distance"));
        assert_eq!(lines.next(), Some("0.0,0.0,10.0,10.0,0.0,9.0,10.0"));
    }
}
