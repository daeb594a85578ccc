#[cfg(test)]
mod test {
    use crate::prelude::*;
    use crate::tests::toolkit::{pick, synthetic_frame};

    const TRACE: &str = "0, 10, 0, 0, 0, 1, 0, 0";

    #[test]
    fn greenland_threshold() {
        let latitudes = vec![70.0, 70.001, 70.002];
        let longitudes = vec![-45.0; 3];
        let frame = synthetic_frame(&[TRACE, TRACE, TRACE])
            .with_coordinates(latitudes, longitudes)
            .unwrap();

        let mut picks = vec![pick(3.0, 70.0009), pick(3.0, 70.5)];
        for row in picks.iter_mut() {
            row.longitude = -45.0;
        }
        let picks: PickTable = picks.into();

        let mut cfg = Config::default()
            .with_ice_sheet(IceSheet::Greenland)
            .with_half_width(0);
        cfg.spatial_match_threshold = Some(500.0);

        let report = Pipeline::new(cfg).unwrap().process(&frame, &picks).unwrap();
        assert_eq!(report.strategy, MatchStrategy::Spatial);
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.dropped.unmatched, 1, "far pick should be rejected");

        let row = report.table.rows()[0];
        let diag = row.diagnostics.unwrap();
        assert_eq!(diag.along_track, 1);
        assert!(diag.offset < 500.0);

        // projected with the Greenland parameters
        let expected = IceSheet::Greenland.project(70.0009, -45.0);
        assert_eq!((row.x, row.y), (expected.x, expected.y));
        let (lat, lon) = IceSheet::Greenland.unproject(row.position());
        assert!((lat - 70.0009).abs() < 1.0E-8);
        assert!((lon + 45.0).abs() < 1.0E-8);
    }

    #[test]
    fn no_implicit_dedup() {
        // two picks at the same location produce two rows
        let frame = synthetic_frame(&[TRACE, TRACE])
            .with_coordinates(vec![-75.0, -75.001], vec![10.0, 10.0])
            .unwrap();
        let mut a = pick(3.0, -75.0);
        a.longitude = 10.0;
        let picks: PickTable = vec![a, a].into();

        let report = Pipeline::new(Config::default().with_half_width(0))
            .unwrap()
            .process(&frame, &picks)
            .unwrap();
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.table.dedup_positions().len(), 1);
    }

    #[test]
    fn projected_tables_index() {
        // self match through the pick table projection
        let picks = (0..200)
            .map(|i| {
                let mut row = pick(3.0, -70.0 - i as f64 * 0.05);
                row.longitude = i as f64 * 1.7 - 170.0;
                row
            })
            .collect::<PickTable>();
        let positions = picks.positions(IceSheet::Antarctica);
        let index = SpatialIndex::build(&positions);
        for (i, m) in index.nearest(&positions).into_iter().enumerate() {
            let m = m.unwrap();
            assert_eq!(m.reference, i);
            assert_eq!(m.distance, 0.0);
        }
    }
}
