use geo::coord;
use regionheat::canonical;
use regionheat::compute::polyline;
use regionheat::{
    Accumulator, GeometryKind, Heatmap, HeatmapError, Properties, Region, Shape, State, StatKind,
};

fn unit_square(id: &str, x: f64, y: f64) -> Region {
    let ring = vec![
        coord! { x: x, y: y },
        coord! { x: x + 1.0, y: y },
        coord! { x: x + 1.0, y: y + 1.0 },
        coord! { x: x, y: y + 1.0 },
    ];
    let shape = Shape::new(GeometryKind::Polygon, vec![vec![ring]], None).unwrap();
    Region::new(id, Properties::new(), shape).unwrap()
}

/// Large store stress test
#[test]
fn test_large_grid_binning() {
    let mut regions = Vec::new();
    for row in 0..50 {
        for col in 0..50 {
            regions.push(unit_square(&format!("{}-{}", row, col), col as f64, row as f64));
        }
    }
    let mut heatmap = Heatmap::new(regions).expect("Failed to create heatmap");
    heatmap.register_builtin(StatKind::Count).unwrap();

    for i in 0..10_000 {
        let x = (i % 100) as f64 * 0.5 + 0.25;
        let y = (i / 200) as f64 + 0.5;
        let matched = heatmap
            .update((x, y), 1.0)
            .unwrap_or_else(|_| panic!("Failed to update point {}", i));
        assert_eq!(matched, 1);
    }

    let report = heatmap.get_stat("count").unwrap();
    let total: f64 = report.values.values().flatten().sum();
    assert_eq!(total, 10_000.0);
}

#[test]
fn test_non_finite_points_and_weights() {
    let mut heatmap = Heatmap::new(vec![unit_square("a", 0.0, 0.0)]).unwrap();
    heatmap.register_builtin(StatKind::Sum).unwrap();

    assert!(heatmap.bin((f64::NAN, 0.5)).is_empty());
    assert!(heatmap.bin((0.5, f64::INFINITY)).is_empty());

    for weight in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            heatmap.update((0.5, 0.5), weight),
            Err(HeatmapError::InvalidWeight(_))
        ));
    }
    assert_eq!(heatmap.is_touched("a"), Some(false));
}

#[test]
fn test_empty_heatmap() {
    let mut heatmap = Heatmap::new(Vec::new()).unwrap();
    heatmap.register_builtin(StatKind::Mean).unwrap();
    assert!(heatmap.bin((0.0, 0.0)).is_empty());
    assert_eq!(heatmap.update((0.0, 0.0), 1.0).unwrap(), 0);
    assert_eq!(heatmap.resolve_neighbours(), 0);

    let report = heatmap.get_stat("mean").unwrap();
    assert!(report.values.is_empty());
    assert!(report.unchanged_ids.is_empty());
}

#[test]
fn test_invalid_region_descriptors() {
    let cases = [
        // Missing id
        r#"[{"geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1]]]}}]"#,
        // Empty id
        r#"[{"id": "", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1]]]}}]"#,
        // Unsupported type
        r#"[{"id": "a", "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}}]"#,
        // Too few distinct points
        r#"[{"id": "a", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,1],[0,0]]]}}]"#,
        // Nesting does not match the type
        r#"[{"id": "a", "geometry": {"type": "MultiPolygon", "coordinates": [[[0,0],[1,0],[1,1]]]}}]"#,
        // Truncated polyline
        r#"[{"id": "a", "geometry": {"type": "Polygon", "coordinates": ["_p~iF"]}}]"#,
    ];

    for json in cases {
        let result = canonical::from_json(json, 7);
        assert!(
            matches!(result, Err(HeatmapError::InvalidGeometry(_))),
            "expected InvalidGeometry for {}",
            json
        );
    }
}

#[test]
fn test_duplicate_ids_rejected() {
    let regions = vec![unit_square("a", 0.0, 0.0), unit_square("a", 1.0, 0.0)];
    assert!(matches!(
        Heatmap::new(regions),
        Err(HeatmapError::PreconditionViolation(_))
    ));
}

#[test]
fn test_polyline_precision_bounds() {
    let coords = [coord! { x: 1.0, y: 2.0 }];
    assert!(matches!(
        polyline::encode(&coords, 1),
        Err(HeatmapError::PreconditionViolation(_))
    ));
    assert!(polyline::decode("", 11).is_err());
    assert!(polyline::decode("", 7).unwrap().is_empty());
    assert!(polyline::encode(&[coord! { x: f64::NAN, y: 0.0 }], 7).is_err());
}

#[test]
fn test_multipolygon_binning_and_bbox() {
    let left = vec![
        coord! { x: 0.0, y: 0.0 },
        coord! { x: 1.0, y: 0.0 },
        coord! { x: 1.0, y: 1.0 },
        coord! { x: 0.0, y: 1.0 },
    ];
    let right = vec![
        coord! { x: 5.0, y: 0.0 },
        coord! { x: 6.0, y: 0.0 },
        coord! { x: 6.0, y: 1.0 },
        coord! { x: 5.0, y: 1.0 },
    ];
    let shape =
        Shape::new(GeometryKind::MultiPolygon, vec![vec![left], vec![right]], None).unwrap();
    assert_eq!(shape.bbox().to_array(), [0.0, 0.0, 6.0, 1.0]);

    let region = Region::new("islands", Properties::new(), shape).unwrap();
    assert!(region.contains((0.5, 0.5)));
    assert!(region.contains((5.5, 0.5)));
    // Inside the bbox but between the parts
    assert!(!region.contains((3.0, 0.5)));
}

#[test]
fn test_polygon_with_two_outer_rings_rejected() {
    let ring = vec![
        coord! { x: 0.0, y: 0.0 },
        coord! { x: 1.0, y: 0.0 },
        coord! { x: 1.0, y: 1.0 },
    ];
    let result = Shape::new(
        GeometryKind::Polygon,
        vec![vec![ring.clone()], vec![ring]],
        None,
    );
    assert!(matches!(result, Err(HeatmapError::InvalidGeometry(_))));
}

#[test]
fn test_min_max_across_regions() {
    let mut heatmap = Heatmap::new(vec![
        unit_square("a", 0.0, 0.0),
        unit_square("b", 1.0, 0.0),
    ])
    .unwrap();
    heatmap
        .register_builtin(StatKind::Min)
        .unwrap()
        .register_builtin(StatKind::Max)
        .unwrap();

    heatmap.update((0.5, 0.5), -3.0).unwrap();
    heatmap.update((0.5, 0.5), 4.0).unwrap();
    heatmap.update((1.5, 0.5), 10.0).unwrap();

    let min = heatmap.get_stat("min").unwrap();
    assert_eq!(min.value("a"), Some(-3.0));
    assert_eq!(min.min, Some(-3.0));
    assert_eq!(min.max, Some(10.0));
    assert_eq!(heatmap.get_stat("max").unwrap().value("a"), Some(4.0));
}

#[test]
fn test_updater_without_default_key() {
    let mut heatmap = Heatmap::new(vec![unit_square("a", 0.0, 0.0)]).unwrap();
    heatmap.register_updater(|w: f64, _: &State| {
        State::new().with("last", Accumulator::Latest(Some(w)))
    });
    heatmap
        .register_stat("last", |state: &State, _: &Properties| state.number("last"))
        .unwrap();

    heatmap.update((0.5, 0.5), 7.0).unwrap();
    assert_eq!(heatmap.get_stat("last").unwrap().value("a"), Some(7.0));
}

#[test]
fn test_repeated_registration_is_idempotent() {
    let mut heatmap = Heatmap::new(vec![unit_square("a", 0.0, 0.0)]).unwrap();
    heatmap.register_builtin(StatKind::Mean).unwrap();
    let updaters = heatmap.updater_count();
    heatmap
        .register_builtin(StatKind::Mean)
        .unwrap()
        .register_builtin(StatKind::Count)
        .unwrap();
    assert_eq!(heatmap.updater_count(), updaters);

    heatmap.update((0.5, 0.5), 2.0).unwrap();
    assert_eq!(heatmap.get_stat("count").unwrap().value("a"), Some(1.0));
}

#[test]
fn test_extreme_weights_reported_by_min_max() {
    let mut heatmap = Heatmap::new(vec![unit_square("a", 0.0, 0.0)]).unwrap();
    heatmap
        .register_builtin(StatKind::Min)
        .unwrap()
        .register_builtin(StatKind::Max)
        .unwrap();

    heatmap.update((0.5, 0.5), f64::MAX).unwrap();
    assert_eq!(heatmap.is_touched("a"), Some(true));
    assert_eq!(heatmap.get_stat("min").unwrap().value("a"), Some(f64::MAX));
    assert_eq!(heatmap.get_stat("max").unwrap().value("a"), Some(f64::MAX));

    heatmap.update((0.5, 0.5), f64::MIN).unwrap();
    assert_eq!(heatmap.get_stat("min").unwrap().value("a"), Some(f64::MIN));
    assert_eq!(heatmap.get_stat("max").unwrap().value("a"), Some(f64::MAX));

    // Survives the canonical format
    let mut restored = Heatmap::from_json(&heatmap.to_json(true).unwrap()).unwrap();
    restored.register_builtin(StatKind::Min).unwrap();
    assert_eq!(restored.get_stat("min").unwrap().value("a"), Some(f64::MIN));
}

#[test]
fn test_update_keeps_loaded_state_without_updaters() {
    let dataset = r#"[{"id": "a",
        "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]},
        "state": {"x": {"kind": "count", "value": 3}}}]"#;
    let mut heatmap = Heatmap::from_json(dataset).unwrap();
    assert_eq!(heatmap.is_touched("a"), Some(true));

    assert_eq!(heatmap.update((0.5, 0.5), 1.0).unwrap(), 1);
    assert_eq!(heatmap.is_touched("a"), Some(true));
    assert_eq!(heatmap.region("a").unwrap().state().count("x"), Some(3));

    heatmap.reset_state();
    assert_eq!(heatmap.is_touched("a"), Some(false));
}
