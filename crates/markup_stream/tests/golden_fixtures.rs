mod common;

use common::{RunResult, run_byte_chunks, run_str_chunks, run_whole};
use markup_stream::{CloseTagRecovery, StreamConfig, TreeBuilderConfig};
use markup_test_support::chunker::{BoundaryPolicy, build_chunk_plans, build_chunk_plans_utf8};
use markup_test_support::fixtures::{FixtureCase, Recovery, case_filter, load_fixture_dir};
use markup_test_support::{diff_lines, escape_text};
use std::path::Path;

const FUZZ_RUNS: usize = 12;
const FUZZ_SEED: u64 = 0x5eed_cafe;

fn fixtures() -> Vec<FixtureCase> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let filter = case_filter();
    let cases: Vec<FixtureCase> = load_fixture_dir(&dir)
        .into_iter()
        .flat_map(|file| file.cases)
        .filter(|case| filter.as_deref().is_none_or(|f| case.name.contains(f)))
        .collect();
    assert!(!cases.is_empty(), "no fixtures matched filter {filter:?}");
    cases
}

fn config_for(case: &FixtureCase) -> StreamConfig {
    let close_tag_recovery = match case.recovery {
        Recovery::Ignore => CloseTagRecovery::Ignore,
        Recovery::CloseToMatchingAncestor => CloseTagRecovery::CloseToMatchingAncestor,
    };
    StreamConfig {
        builder: TreeBuilderConfig { close_tag_recovery },
        ..StreamConfig::default()
    }
}

fn assert_same_run(case: &FixtureCase, label: &str, expected: &RunResult, actual: &RunResult) {
    assert_eq!(
        expected.outline,
        actual.outline,
        "[{}] tree differs under {label}\n{}",
        case.name,
        diff_lines(&expected.outline, &actual.outline)
    );
    assert_eq!(
        expected.serialization, actual.serialization,
        "[{}] serialization differs under {label}",
        case.name
    );
    assert_eq!(
        expected.diagnostics, actual.diagnostics,
        "[{}] diagnostics differ under {label}",
        case.name
    );
}

#[test]
fn golden_fixtures_whole_input() {
    for case in fixtures() {
        let result = run_whole(&case.input, config_for(&case));
        assert_eq!(
            result.serialization,
            case.expected,
            "[{}] input: \"{}\"",
            case.name,
            escape_text(&case.input)
        );
        if let Some(expected) = case.diagnostics {
            assert_eq!(result.diagnostics, expected, "[{}] diagnostics", case.name);
        }
    }
}

#[test]
fn golden_fixtures_chunked_utf8() {
    for case in fixtures() {
        let whole = run_whole(&case.input, config_for(&case));
        for plan in build_chunk_plans_utf8(&case.input, FUZZ_RUNS, FUZZ_SEED) {
            let chunks = plan.plan.str_chunks(&case.input);
            let actual = run_str_chunks(&chunks, config_for(&case));
            assert_same_run(&case, &plan.label, &whole, &actual);
        }
    }
}

#[test]
fn golden_fixtures_chunked_bytes() {
    for case in fixtures() {
        let whole = run_whole(&case.input, config_for(&case));
        let plans =
            build_chunk_plans(&case.input, FUZZ_RUNS, FUZZ_SEED, BoundaryPolicy::ByteStream);
        for plan in plans {
            let chunks = plan.plan.byte_chunks(&case.input);
            let actual = run_byte_chunks(&chunks, config_for(&case));
            assert_same_run(&case, &plan.label, &whole, &actual);
        }
    }
}
