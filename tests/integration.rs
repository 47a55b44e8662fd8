//! Integration tests for the unipick query and import-logos commands

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const UNIVERSITIES: &str = r#"{
  "options": [
    {"label": "NUST", "value": "nust", "subtitle": "Islamabad", "metadata": {"type": "public", "city": "Islamabad"}},
    {"label": "FAST", "value": "fast", "metadata": {"type": "private", "city": "Lahore"}},
    {"label": "COMSATS", "value": "comsats", "metadata": {"city": "Islamabad", "founded": 1998}}
  ]
}"#;

/// Temporary directory with a catalog and an isolated config path
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    catalog_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let catalog_path = temp_dir.path().join("universities.json");
        fs::write(&catalog_path, UNIVERSITIES).unwrap();
        Self {
            temp_dir,
            config_path,
            catalog_path,
        }
    }

    fn with_config(self, contents: &str) -> Self {
        fs::write(&self.config_path, contents).unwrap();
        self
    }

    /// Run unipick with this env's config
    fn unipick(&self) -> AssertCommand {
        let mut cmd = AssertCommand::cargo_bin("unipick").unwrap();
        cmd.env_remove("RUST_LOG");
        cmd.args(["--config", self.config_path.to_str().unwrap()]);
        cmd
    }

    fn catalog(&self) -> &str {
        self.catalog_path.to_str().unwrap()
    }
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should be JSON")
}

// =============================================================================
// Query
// =============================================================================

#[test]
fn query_filters_by_label_substring() {
    let env = TestEnv::new();
    env.unipick()
        .args(["query", env.catalog(), "fa"])
        .assert()
        .success()
        .stdout("fast\tFAST\n");
}

#[test]
fn empty_query_lists_everything_in_order() {
    let env = TestEnv::new();
    env.unipick()
        .args(["query", env.catalog()])
        .assert()
        .success()
        .stdout("nust\tNUST\tIslamabad\nfast\tFAST\ncomsats\tCOMSATS\n");
}

#[test]
fn query_with_no_matches_reports_on_stderr() {
    let env = TestEnv::new();
    env.unipick()
        .args(["query", env.catalog(), "  Quaid-e-Azam  "])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("No matches for \"Quaid-e-Azam\""));
}

#[test]
fn query_searches_metadata_fields() {
    let env = TestEnv::new();
    env.unipick()
        .args([
            "query",
            env.catalog(),
            "islam",
            "--field",
            "label",
            "--field",
            "city",
        ])
        .assert()
        .success()
        .stdout("nust\tNUST\tIslamabad\ncomsats\tCOMSATS\n");
}

#[test]
fn query_groups_by_metadata_key() {
    let env = TestEnv::new();
    env.unipick()
        .args(["query", env.catalog(), "--group", "type"])
        .assert()
        .success()
        .stdout("[public]\nnust\tNUST\tIslamabad\n[private]\nfast\tFAST\n[Other]\ncomsats\tCOMSATS\n");
}

#[test]
fn query_json_grouped() {
    let env = TestEnv::new();
    let output = env
        .unipick()
        .args(["query", env.catalog(), "--group", "type", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc = stdout_json(&output.stdout);
    let groups = doc["groups"].as_array().unwrap();
    let names: Vec<_> = groups.iter().map(|g| g["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["public", "private", "Other"]);
    assert_eq!(groups[2]["ungrouped"], Value::Bool(true));
    assert_eq!(groups[2]["options"][0]["value"], "comsats");
}

#[test]
fn query_json_flat_with_limit() {
    let env = TestEnv::new();
    let output = env
        .unipick()
        .args(["query", env.catalog(), "", "--limit", "2", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc = stdout_json(&output.stdout);
    let values: Vec<_> = doc["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["nust", "fast"]);
}

#[test]
fn config_supplies_search_fields_and_grouping() {
    let env = TestEnv::new().with_config(
        r#"
[picker]
search_fields = ["label", "founded"]
group_key = "city"
"#,
    );
    env.unipick()
        .args(["query", env.catalog(), "1998"])
        .assert()
        .success()
        .stdout("[Islamabad]\ncomsats\tCOMSATS\n");
}

#[test]
fn toml_catalog_is_accepted() {
    let env = TestEnv::new();
    let toml_path = env.temp_dir.path().join("programs.toml");
    fs::write(
        &toml_path,
        r#"
[[options]]
label = "BS Computer Science"
value = "bscs"

[[options]]
label = "MBBS"
"#,
    )
    .unwrap();

    env.unipick()
        .args(["query", toml_path.to_str().unwrap(), "mb"])
        .assert()
        .success()
        .stdout("MBBS\tMBBS\n");
}

#[test]
fn pick_help_describes_quit_without_confirm() {
    let env = TestEnv::new();
    env.unipick()
        .args(["pick", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exits with status 1"))
        .stdout(predicate::str::contains("printed only once confirmed"));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unsupported_catalog_extension_fails() {
    let env = TestEnv::new();
    let path = env.temp_dir.path().join("universities.yaml");
    fs::write(&path, "- NUST\n").unwrap();
    env.unipick()
        .args(["query", path.to_str().unwrap(), "nu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported catalog format"));
}

#[test]
fn colliding_key_bindings_fail() {
    let env = TestEnv::new().with_config("[keys.open]\nconfirm = [\"Enter\"]\nnext = [\"Enter\"]\n");
    env.unipick()
        .args(["query", env.catalog(), "nu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key binding collision"));
}

#[test]
fn zero_limit_is_rejected() {
    let env = TestEnv::new();
    env.unipick()
        .args(["query", env.catalog(), "nu", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--limit must be at least 1"));
}

#[test]
fn misspelled_catalog_key_fails() {
    let env = TestEnv::new();
    let path = env.temp_dir.path().join("typo.json");
    fs::write(&path, r#"{"option": [{"label": "NUST"}]}"#).unwrap();
    env.unipick()
        .args(["query", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field"));
}

// =============================================================================
// Logo import
// =============================================================================

#[test]
fn import_logos_writes_catalog() {
    let env = TestEnv::new();
    let csv_path = env.temp_dir.path().join("universities DATA.csv");
    let out_path = env.temp_dir.path().join("logos.json");
    fs::write(
        &csv_path,
        "university_name,logo_url\n\
         Quaid-i-Azam University,https://qau.edu.pk/logo.png\n\
         Bahria University,\n\
         Air University,https://au.edu.pk/logo.svg\n\
         Dummy College,Dangerous link\n",
    )
    .unwrap();

    env.unipick()
        .args([
            "import-logos",
            csv_path.to_str().unwrap(),
            "--output",
            out_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 2 options"));

    // The generated catalog is itself queryable.
    env.unipick()
        .args(["query", out_path.to_str().unwrap(), "quaid"])
        .assert()
        .success()
        .stdout("QuaidiAzamUniversity\tQuaid-i-Azam University\n");
}

#[test]
fn import_logos_requires_columns() {
    let env = TestEnv::new();
    let csv_path = env.temp_dir.path().join("bad.csv");
    fs::write(&csv_path, "name,url\nNUST,https://nust.edu.pk/logo.png\n").unwrap();

    env.unipick()
        .args(["import-logos", csv_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("university_name"));
}
