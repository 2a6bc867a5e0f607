mod common;

use std::fs;

use csv_insights::{ChartPayload, InsightDescriptor, config::InsightConfig};
use predicates::str::contains;
use serde_json::{Value, json};

use common::{ORDERS, REGION_SALES, TestWorkspace, binary};

#[test]
fn profile_prints_a_table_per_column() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS);
    binary()
        .args(["profile", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("ordered_at"))
        .stdout(contains("date"))
        .stdout(contains("price"))
        .stdout(contains("number"));
}

#[test]
fn profile_json_omits_values_unless_requested() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);

    let output = binary()
        .args(["profile", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run profile");
    assert!(output.status.success());
    let profiles: Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(profiles[0]["name"], "region");
    assert_eq!(profiles[0]["type"], "string");
    assert_eq!(profiles[0]["uniqueCount"], 2);
    assert_eq!(profiles[1]["type"], "number");
    assert_eq!(profiles[1]["values"], json!([]));

    let output = binary()
        .args([
            "profile",
            "-i",
            input.to_str().unwrap(),
            "--json",
            "--with-values",
        ])
        .output()
        .expect("run profile");
    let profiles: Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(profiles[1]["values"], json!(["10", "5", "20"]));
}

#[test]
fn profile_honors_custom_delimiter() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.txt", "region;sales\nEast;10\nWest;5\n");
    let output = binary()
        .args([
            "profile",
            "-i",
            input.to_str().unwrap(),
            "--delimiter",
            ";",
            "--json",
        ])
        .output()
        .expect("run profile");
    let profiles: Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(profiles.as_array().map(Vec::len), Some(2));
    assert_eq!(profiles[1]["name"], "sales");
}

#[test]
fn recommend_json_lists_ids_in_rule_order() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS);
    let output = binary()
        .args(["recommend", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run recommend");
    assert!(output.status.success());
    let insights: Vec<InsightDescriptor> =
        serde_json::from_slice(&output.stdout).expect("parse insights");
    let ids = insights.iter().map(|i| i.id.as_str()).collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![
            "revenue-by-category",
            "revenue-donut",
            "revenue-gauge",
            "category-breakdown",
            "category-treemap",
            "category-heatmap",
            "trend-analysis",
            "trend-area",
            "trend-waterfall",
            "numeric-by-category",
            "category-funnel",
            "distribution-violin",
            "multi-metric-radar",
            "distribution-analysis",
            "bubble-analysis",
            "performance-comparison",
        ]
    );
}

#[test]
fn chart_materializes_selected_ids() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);
    let output_path = workspace.path().join("charts.json");
    binary()
        .args([
            "chart",
            "-i",
            input.to_str().unwrap(),
            "--id",
            "revenue-by-category",
            "-o",
            output_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output_path).expect("read charts");
    let payloads: Vec<ChartPayload> = serde_json::from_str(&contents).expect("parse payloads");
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert_eq!(payload.id, "revenue-by-category");
    assert!(!payload.sample);
    assert_eq!(
        Value::Array(payload.data.iter().cloned().map(Value::Object).collect()),
        json!([
            {"region": "East", "sales": 15.0},
            {"region": "West", "sales": 5.0}
        ])
    );
    assert_eq!(payload.key_map.x_key.as_deref(), Some("region"));
    assert_eq!(payload.key_map.y_key.as_deref(), Some("sales"));
}

#[test]
fn chart_rejects_unknown_ids() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);
    binary()
        .args(["chart", "-i", input.to_str().unwrap(), "--id", "nope"])
        .assert()
        .failure()
        .stderr(contains("Insight 'nope' is not available"));
}

#[test]
fn chart_requires_a_selection() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);
    binary()
        .args(["chart", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("--all"));
}

#[test]
fn chart_all_writes_every_recommendation_to_stdout() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS);
    let output = binary()
        .args(["chart", "-i", input.to_str().unwrap(), "--all"])
        .output()
        .expect("run chart");
    assert!(output.status.success());
    let payloads: Vec<ChartPayload> =
        serde_json::from_slice(&output.stdout).expect("parse payloads");
    assert_eq!(payloads.len(), 16);
    assert!(payloads.iter().all(|p| !p.data.is_empty()));
}

#[test]
fn chart_uses_supplied_descriptors() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);
    let descriptors = workspace.write(
        "descriptors.json",
        r#"[{"id":"stock","chartType":"candlestick","title":"Stock","description":"d","metrics":["sales","sales"]}]"#,
    );
    let output = binary()
        .args([
            "chart",
            "-i",
            input.to_str().unwrap(),
            "--descriptors",
            descriptors.to_str().unwrap(),
        ])
        .output()
        .expect("run chart");
    assert!(output.status.success());
    let payloads: Vec<ChartPayload> =
        serde_json::from_slice(&output.stdout).expect("parse payloads");
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].sample);
}

#[test]
fn summary_answers_keyword_questions() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);
    binary()
        .args([
            "summary",
            "-i",
            input.to_str().unwrap(),
            "--ask",
            "show me the average",
        ])
        .assert()
        .success()
        .stdout(contains("Average: 11.67"));
}

#[test]
fn summary_json_reports_overview_and_statistics() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", REGION_SALES);
    let output = binary()
        .args(["summary", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run summary");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("parse report");
    assert!(report.get("overview").is_some());
    assert_eq!(report["statistics"].as_array().map(Vec::len), Some(1));
}

#[test]
fn config_writes_defaults_that_load_back() {
    let workspace = TestWorkspace::new();
    let config_path = workspace.path().join("insights.yaml");
    binary()
        .args(["config", "-o", config_path.to_str().unwrap()])
        .assert()
        .success();
    let loaded = InsightConfig::load(&config_path).expect("load config");
    assert_eq!(loaded, InsightConfig::default());
}

#[test]
fn config_thresholds_change_recommendations() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS);
    let config = workspace.write("strict.yaml", "recommend:\n  funnel_max_categories: 2\n");
    let output = binary()
        .args([
            "recommend",
            "-i",
            input.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "--json",
        ])
        .output()
        .expect("run recommend");
    assert!(output.status.success());
    let insights: Vec<InsightDescriptor> =
        serde_json::from_slice(&output.stdout).expect("parse insights");
    assert!(insights.iter().all(|i| i.id != "category-funnel"));
}

#[test]
fn missing_input_reports_error() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("absent.csv");
    binary()
        .args(["profile", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:"));
}
