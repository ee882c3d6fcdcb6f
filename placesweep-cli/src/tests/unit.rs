//! Focused unit tests covering sweep CLI configuration.

use super::*;
use crate::sweep::{
    DEFAULT_KEYWORD, REFERENCE_NORTHEAST, REFERENCE_SOUTHWEST, SweepSettings, TileBoundaryArg,
    settings_from_layers_for_test,
};
use ortho_config::MergeComposer;
use placesweep_core::{BoundingRegionError, DegreesPerMile, TileBoundary};
use placesweep_data::places::DEFAULT_BASE_URL;
use rstest::{fixture, rstest};
use serde_json::json;
use std::time::Duration;

#[fixture]
fn keyed_args() -> SweepArgs {
    SweepArgs {
        api_key: Some("test-key".to_owned()),
        ..SweepArgs::default()
    }
}

fn settings(args: SweepArgs) -> SweepSettings {
    SweepSettings::try_from(args).expect("settings should build")
}

#[rstest]
#[case(None)]
#[case(Some(String::new()))]
fn converting_without_api_key_errors(#[case] api_key: Option<String>) {
    let args = SweepArgs {
        api_key,
        ..SweepArgs::default()
    };

    let err = SweepSettings::try_from(args).expect_err("missing key should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_API_KEY);
            assert_eq!(env, ENV_API_KEY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn defaults_reproduce_the_reference_sweep(keyed_args: SweepArgs) {
    let settings = settings(keyed_args);

    let southwest = settings.region.southwest();
    let northeast = settings.region.northeast();
    assert_eq!(
        (southwest.latitude(), southwest.longitude()),
        REFERENCE_SOUTHWEST
    );
    assert_eq!(
        (northeast.latitude(), northeast.longitude()),
        REFERENCE_NORTHEAST
    );
    assert_eq!(settings.sweep.tiling.tile_side_miles, 1.0);
    assert_eq!(settings.sweep.tiling.degrees, DegreesPerMile::default());
    assert_eq!(settings.sweep.tiling.boundary, TileBoundary::Inclusive);
    assert_eq!(settings.sweep.collector.keyword, DEFAULT_KEYWORD);
    assert_eq!(settings.sweep.collector.saturation_cap, 60);
    assert_eq!(settings.page_delay, Duration::from_secs(3));
    assert_eq!(settings.search.base_url, DEFAULT_BASE_URL);
    assert_eq!(settings.search.api_key, "test-key");
    assert_eq!(settings.output_dir.as_str(), ".");
}

#[rstest]
fn overrides_flow_into_settings(keyed_args: SweepArgs) {
    let args = SweepArgs {
        tile_side_miles: Some(0.5),
        keyword: Some("cafe".to_owned()),
        tile_boundary: Some(TileBoundaryArg::Exclusive),
        max_depth: Some(3),
        page_delay_secs: Some(0.0),
        retry_attempts: Some(5),
        retry_backoff_secs: Some(0.25),
        timeout_secs: Some(10),
        base_url: Some("http://localhost:8080/nearby".to_owned()),
        ..keyed_args
    };

    let settings = settings(args);

    assert_eq!(settings.region.southwest().side_miles(), 0.5);
    assert_eq!(settings.sweep.tiling.boundary, TileBoundary::Exclusive);
    assert_eq!(settings.sweep.collector.keyword, "cafe");
    assert_eq!(settings.sweep.collector.max_depth, 3);
    assert_eq!(settings.sweep.collector.retry.max_attempts, 5);
    assert_eq!(
        settings.sweep.collector.retry.initial_backoff,
        Duration::from_millis(250)
    );
    assert_eq!(settings.page_delay, Duration::ZERO);
    assert_eq!(settings.search.timeout, Duration::from_secs(10));
    assert_eq!(settings.search.base_url, "http://localhost:8080/nearby");
}

#[rstest]
#[case::zero_tile(SweepArgs { tile_side_miles: Some(0.0), ..SweepArgs::default() }, ARG_TILE_SIDE_MILES)]
#[case::negative_degrees(SweepArgs { lat_degrees_per_mile: Some(-0.1), ..SweepArgs::default() }, ARG_LAT_DEGREES_PER_MILE)]
#[case::zero_cap(SweepArgs { saturation_cap: Some(0), ..SweepArgs::default() }, ARG_SATURATION_CAP)]
#[case::nan_min_side(SweepArgs { min_side_miles: Some(f64::NAN), ..SweepArgs::default() }, ARG_MIN_SIDE_MILES)]
#[case::negative_delay(SweepArgs { page_delay_secs: Some(-1.0), ..SweepArgs::default() }, ARG_PAGE_DELAY_SECS)]
#[case::zero_timeout(SweepArgs { timeout_secs: Some(0), ..SweepArgs::default() }, ARG_TIMEOUT_SECS)]
fn out_of_range_settings_are_rejected(#[case] args: SweepArgs, #[case] expected: &'static str) {
    let args = SweepArgs {
        api_key: Some("test-key".to_owned()),
        ..args
    };

    let err = SweepSettings::try_from(args).expect_err("setting should be rejected");
    match err {
        CliError::InvalidSetting { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidSetting, found {other:?}"),
    }
}

#[rstest]
fn inverted_corners_are_rejected(keyed_args: SweepArgs) {
    let args = SweepArgs {
        west: Some(-77.4),
        east: Some(-77.6),
        ..keyed_args
    };

    let err = SweepSettings::try_from(args).expect_err("inverted corners");
    assert!(matches!(
        err,
        CliError::InvalidRegion(BoundingRegionError::InvertedCorners { .. })
    ));
}

#[rstest]
fn non_finite_corner_is_reported_by_name(keyed_args: SweepArgs) {
    let args = SweepArgs {
        south: Some(f64::INFINITY),
        ..keyed_args
    };

    let err = SweepSettings::try_from(args).expect_err("non-finite corner");
    match err {
        CliError::InvalidCorner { corner, .. } => assert_eq!(corner, "southwest"),
        other => panic!("expected InvalidCorner, found {other:?}"),
    }
}

#[rstest]
fn negative_coordinates_parse_from_the_command_line() {
    let cli = Cli::try_parse_from([
        "placesweep",
        "sweep",
        "--west",
        "-77.6",
        "--east",
        "-77.4",
        "--tile-boundary",
        "exclusive",
    ])
    .expect("arguments should parse");

    let Command::Sweep(args) = cli.command;
    assert_eq!(args.west, Some(-77.6));
    assert_eq!(args.east, Some(-77.4));
    assert_eq!(args.tile_boundary, Some(TileBoundaryArg::Exclusive));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "saturation_cap": "many" }));

    let err = settings_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "api_key": "file-key",
            "keyword": "cafe",
            "tile_boundary": "exclusive",
        }),
        None,
    );
    composer.push_environment(json!({
        "api_key": "env-key",
        "tile_side_miles": 2.0,
    }));
    composer.push_cli(json!({
        "tile_side_miles": 0.5,
    }));

    let settings =
        settings_from_layers_for_test(composer.layers()).expect("merged settings should build");
    assert_eq!(settings.search.api_key, "env-key");
    assert_eq!(settings.sweep.collector.keyword, "cafe");
    assert_eq!(settings.sweep.tiling.boundary, TileBoundary::Exclusive);
    assert_eq!(settings.sweep.tiling.tile_side_miles, 0.5);
}
