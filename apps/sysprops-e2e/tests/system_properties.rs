//! Runs the system properties group against an in-process service.

use ntest::timeout;
use serde_json::json;

use sysprops_e2e::data::STRING_ID_TABLE_NAME;
use sysprops_e2e::{
    ops, system_properties_tests, EmbeddedService, HarnessError, TestCase, TestGroup, TestStatus,
};
use table_core::ServiceConfig;

fn start() -> EmbeddedService {
    let config = ServiceConfig {
        application_key: Some("sysprops".to_string()),
        ..Default::default()
    };
    EmbeddedService::start(config).unwrap()
}

#[test]
#[timeout(60000)]
fn test_whole_group_passes() {
    let service = start();
    let client = service.client(Some("sysprops")).unwrap();
    let group = system_properties_tests();

    let mut seen = 0;
    let results = group.run(&client, STRING_ID_TABLE_NAME, None, |_| seen += 1);

    assert_eq!(results.len(), group.cases().len());
    assert_eq!(seen, results.len());
    for result in &results {
        assert!(
            result.is_passed(),
            "{} failed: {:?}\n{}",
            result.name,
            result.error,
            result.log.join("\n")
        );
    }
}

#[test]
#[timeout(20000)]
fn test_merge_conflict_cases_pass_with_precondition_failure() {
    let service = start();
    let client = service.client(Some("sysprops")).unwrap();

    let results = system_properties_tests().run(&client, "conflicts", Some("merge conflict"), |_| {});

    let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Merge Conflict", "Merge Conflict Generic"]);
    for result in &results {
        assert_eq!(result.status, TestStatus::Passed, "{:?}", result.error);
        assert!(result.error.as_ref().unwrap().is_precondition_failed());
    }
}

#[test]
#[timeout(20000)]
fn test_rows_are_cleaned_up_after_each_case() {
    let service = start();
    let client = service.client(Some("sysprops")).unwrap();

    let results = system_properties_tests().run(&client, "cleanup", Some("custom"), |_| {});
    assert_eq!(results.len(), 1);
    assert!(results[0].is_passed(), "{:?}", results[0].error);

    let handle = service.handle().unwrap();
    let rows = handle
        .block_on(client.json_table("cleanup").read(&[]))
        .unwrap();
    assert!(rows.is_empty(), "left behind: {}", json!(rows));
}

#[test]
#[timeout(20000)]
fn test_wrong_application_key_fails_every_case() {
    let service = start();
    let client = service.client(Some("wrong")).unwrap();

    let results = system_properties_tests().run(&client, STRING_ID_TABLE_NAME, Some("from type"), |_| {});
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, TestStatus::Failed);
    let error = results[0].error.as_ref().unwrap();
    assert!(!error.is_precondition_failed());
    assert!(error.to_string().contains("401"), "{}", error);
}

#[test]
#[timeout(20000)]
fn test_rows_of_a_failed_case_are_deleted() {
    let service = start();
    let client = service.client(Some("sysprops")).unwrap();

    let mut group = TestGroup::new("cleanup");
    group.add_test(TestCase::new("Fails after inserting", |ctx| {
        let table = ctx.json_table();
        let row = ops::insert_json(&table, json!({"id": "left-behind", "name": "x"}), &[])?;
        ctx.track(row["id"].as_str().unwrap_or_default());
        Err(HarnessError::assertion("failed on purpose"))
    }));

    let results = group.run(&client, "failing", None, |_| {});
    assert_eq!(results[0].status, TestStatus::Failed);
    assert_eq!(
        results[0].error.as_ref().unwrap().to_string(),
        "failed on purpose"
    );

    let handle = service.handle().unwrap();
    let rows = handle
        .block_on(client.json_table("failing").read(&[]))
        .unwrap();
    assert!(rows.is_empty(), "left behind: {}", json!(rows));
}
