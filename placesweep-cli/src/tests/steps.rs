//! Behaviour-driven step definitions driving the sweep CLI scenarios.

use super::*;
use crate::sweep::{SearchBuilder, SweepSettings, run_sweep_with};
use camino::Utf8PathBuf;
use placesweep_core::test_support::{ScriptedSearch, places};
use placesweep_core::{DegreesPerMile, PlaceSearch, SearchError, SearchPage};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use tempfile::TempDir;

const SOUTH: f64 = 37.512_296;
const WEST: f64 = -77.694_1;

type Responses = Vec<Result<SearchPage, SearchError>>;

#[derive(Debug)]
struct SweepWorld {
    _tmp: TempDir,
    output_dir: Utf8PathBuf,
    include_api_key: RefCell<bool>,
    corners: RefCell<(f64, f64, f64, f64)>,
    responses: RefCell<Responses>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl SweepWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let output_dir =
            Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            _tmp: tmp,
            output_dir,
            include_api_key: RefCell::new(true),
            corners: RefCell::new((SOUTH, WEST, SOUTH, WEST)),
            responses: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let (south, west, north, east) = *self.corners.borrow();
        let mut argv = vec!["placesweep".to_owned(), "sweep".to_owned()];
        if *self.include_api_key.borrow() {
            argv.extend([format!("--{ARG_API_KEY}"), "test-key".to_owned()]);
        }
        argv.extend([
            format!("--{ARG_SOUTH}"),
            south.to_string(),
            format!("--{ARG_WEST}"),
            west.to_string(),
            format!("--{ARG_NORTH}"),
            north.to_string(),
            format!("--{ARG_EAST}"),
            east.to_string(),
            format!("--{ARG_PAGE_DELAY_SECS}"),
            "0".to_owned(),
            format!("--{ARG_RETRY_ATTEMPTS}"),
            "1".to_owned(),
            format!("--{ARG_OUTPUT_DIR}"),
            self.output_dir.as_str().to_owned(),
        ]);
        argv
    }

    fn summary(&self) -> Value {
        let stdout = String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8");
        serde_json::from_str(&stdout).expect("output should be a JSON summary")
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> SweepWorld {
    SweepWorld::new()
}

/// Builds a fresh scripted search for each invocation.
struct ScriptedSearchBuilder {
    responses: Responses,
}

impl SearchBuilder for ScriptedSearchBuilder {
    fn build(&self, _settings: &SweepSettings) -> Result<Box<dyn PlaceSearch>, CliError> {
        Ok(Box::new(ScriptedSearch::new(self.responses.clone())))
    }
}

// --- Given steps ---

#[given("a single-tile region")]
fn single_tile_region(#[from(world)] world: &SweepWorld) {
    world.corners.replace((SOUTH, WEST, SOUTH, WEST));
}

#[given("a two-tile region")]
fn two_tile_region(#[from(world)] world: &SweepWorld) {
    let east = WEST + DegreesPerMile::DEFAULT_LONGITUDE;
    world.corners.replace((SOUTH, WEST, SOUTH, east));
}

#[given("a region whose northeast corner lies west of the southwest corner")]
fn inverted_region(#[from(world)] world: &SweepWorld) {
    world.corners.replace((SOUTH, WEST, SOUTH, WEST - 0.1));
}

#[given("a search returning {count} places per tile")]
fn search_returning(#[from(world)] world: &SweepWorld, count: u32) {
    world
        .responses
        .replace(vec![Ok(SearchPage::last(places("p", 1..=count)))]);
}

#[given("a search that rejects the first tile and returns {count} places for the second")]
fn search_rejecting_first(#[from(world)] world: &SweepWorld, count: u32) {
    world.responses.replace(vec![
        Err(SearchError::Service {
            status: "REQUEST_DENIED".to_owned(),
            message: "The provided API key is invalid.".to_owned(),
        }),
        Ok(SearchPage::last(places("p", 1..=count))),
    ]);
}

#[given("I omit the API key")]
fn omit_api_key(#[from(world)] world: &SweepWorld) {
    *world.include_api_key.borrow_mut() = false;
}

// --- When steps ---

#[when("I run the sweep command")]
fn run_sweep_command(#[from(world)] world: &SweepWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Sweep(args) => {
            let builder = ScriptedSearchBuilder {
                responses: world.responses.borrow().clone(),
            };
            let mut buffer = world.stdout.borrow_mut();
            run_sweep_with(args, &builder, &mut *buffer)
        }
    });

    world.result.replace(Some(outcome));
}

// --- Then steps ---

#[then("the command succeeds")]
fn command_succeeds(#[from(world)] world: &SweepWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    if let Err(err) = result {
        panic!("expected success, found {err:?}");
    }
}

#[then("the summary reports {count} places")]
fn summary_reports(#[from(world)] world: &SweepWorld, count: u64) {
    assert_eq!(world.summary()["places"], Value::from(count));
}

#[then("the summary lists {count} failed region")]
fn summary_lists_failures(#[from(world)] world: &SweepWorld, count: usize) {
    let summary = world.summary();
    let failed = summary["failed_regions"]
        .as_array()
        .expect("failed_regions array");
    assert_eq!(failed.len(), count);
    assert_eq!(failed[0]["origin"], failed[0]["location"]);
    let reason = failed[0]["reason"].as_str().expect("reason string");
    assert!(reason.contains("REQUEST_DENIED"), "unexpected reason {reason}");
}

#[then("the results file holds {count} places")]
fn results_file_holds(#[from(world)] world: &SweepWorld, count: usize) {
    let summary = world.summary();
    let path = summary["output"].as_str().expect("output path");
    assert!(path.starts_with(world.output_dir.as_str()));
    let written = std::fs::read_to_string(path).expect("read results file");
    let value: Value = serde_json::from_str(&written).expect("results are JSON");
    let object = value.as_object().expect("results keyed by place id");
    assert_eq!(object.len(), count);
}

#[then("the command fails with incomplete coverage of {count} region")]
fn command_fails_incomplete(#[from(world)] world: &SweepWorld, count: usize) {
    match &*world.error() {
        CliError::IncompleteCoverage { failed, .. } => assert_eq!(*failed, count),
        other => panic!("expected IncompleteCoverage, found {other:?}"),
    }
}

#[then("the command fails because the API key is missing")]
fn command_fails_missing_key(#[from(world)] world: &SweepWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_API_KEY),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the region is invalid")]
fn command_fails_invalid_region(#[from(world)] world: &SweepWorld) {
    match &*world.error() {
        CliError::InvalidRegion(_) => {}
        other => panic!("expected InvalidRegion, found {other:?}"),
    }
}

macro_rules! register_sweep_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/sweep_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: SweepWorld) {
            let _ = world;
        }
    };
}

register_sweep_scenario!(
    sweep_single_tile,
    "sweeping a single tile writes the results file"
);
register_sweep_scenario!(
    sweep_partial_failure,
    "a rejected tile still exports the other tiles"
);
register_sweep_scenario!(sweep_missing_key, "rejecting a sweep without an API key");
register_sweep_scenario!(sweep_inverted_corners, "rejecting inverted corners");
