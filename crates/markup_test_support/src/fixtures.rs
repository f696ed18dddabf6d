//! Golden fixtures: TOML files of markup inputs and the expected serialization.
//!
//! ```toml
//! [[case]]
//! name = "nested"
//! input = "<div><p>x</p></div>"
//! expected = "<div><p>x</p></div>"
//! diagnostics = 0                        # optional
//! recovery = "close-to-matching-ancestor" # optional, default "ignore"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Recovery {
    #[default]
    Ignore,
    CloseToMatchingAncestor,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase {
    pub name: String,
    pub input: String,
    pub expected: String,
    #[serde(default)]
    pub diagnostics: Option<usize>,
    #[serde(default)]
    pub recovery: Recovery,
}

#[derive(Clone, Debug)]
pub struct FixtureFile {
    pub path: PathBuf,
    pub cases: Vec<FixtureCase>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureManifest {
    #[serde(default)]
    case: Vec<FixtureCase>,
}

pub fn parse_fixture(content: &str, origin: &Path) -> Vec<FixtureCase> {
    let manifest: FixtureManifest = toml::from_str(content)
        .unwrap_or_else(|err| panic!("failed to parse fixture TOML {origin:?}: {err}"));
    for (i, case) in manifest.case.iter().enumerate() {
        assert!(
            manifest.case[..i].iter().all(|other| other.name != case.name),
            "duplicate fixture case '{}' in {origin:?}",
            case.name
        );
    }
    manifest.case
}

/// Load every `*.toml` under `dir`, sorted by path.
pub fn load_fixture_dir(dir: &Path) -> Vec<FixtureFile> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read fixture dir {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .map(|entry| {
            entry
                .unwrap_or_else(|err| panic!("failed to read entry in {dir:?}: {err}"))
                .path()
        })
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
            let cases = parse_fixture(&content, &path);
            FixtureFile { path, cases }
        })
        .collect()
}

/// `MARKUP_FIXTURE_FILTER=<substring>` restricts runs to matching case names.
pub fn case_filter() -> Option<String> {
    std::env::var("MARKUP_FIXTURE_FILTER")
        .ok()
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cases_with_defaults() {
        let cases = parse_fixture(
            r#"
[[case]]
name = "plain"
input = "<b>x</b>"
expected = "<b>x</b>"

[[case]]
name = "recover"
input = "<a><b></a>"
expected = "<a><b></b></a>"
diagnostics = 1
recovery = "close-to-matching-ancestor"
"#,
            Path::new("inline"),
        );
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].recovery, Recovery::Ignore);
        assert_eq!(cases[0].diagnostics, None);
        assert_eq!(cases[1].recovery, Recovery::CloseToMatchingAncestor);
        assert_eq!(cases[1].diagnostics, Some(1));
    }

    #[test]
    #[should_panic(expected = "duplicate fixture case")]
    fn rejects_duplicate_names() {
        parse_fixture(
            "[[case]]\nname = \"a\"\ninput = \"\"\nexpected = \"\"\n\
             [[case]]\nname = \"a\"\ninput = \"\"\nexpected = \"\"\n",
            Path::new("inline"),
        );
    }
}
