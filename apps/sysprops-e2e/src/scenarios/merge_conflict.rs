//! Updates carrying a stale version must be rejected with the server's row.
//!
//! Both cases end with the precondition failure itself, which their test
//! case declares as the expected outcome.

use serde_json::Value;
use table_client::{PreconditionFailed, SystemProperties, SystemProperty, Table};
use table_types::ID_FIELD;

use crate::error::HarnessError;
use crate::framework::TestContext;
use crate::ops;
use crate::types::RoundTripRow;

const STALE_VERSION: &str = "random";

fn version_only() -> SystemProperties {
    SystemProperties::from([SystemProperty::Version])
}

pub(crate) fn run_json(ctx: &mut TestContext) -> Result<(), HarnessError> {
    let mut table = ctx.json_table();
    table.set_system_properties(version_only());

    let row = serde_json::to_value(RoundTripRow::sample())
        .map_err(|e| HarnessError::Setup(format!("Failed to encode sample row: {}", e)))?;
    let inserted = ops::insert_json(&table, row, &[])?;
    if let Some(id) = inserted.get(ID_FIELD).and_then(Value::as_str) {
        ctx.track(id);
    }
    let inserted_version = version_of(&inserted);
    ctx.log(format!("Inserted row at version {}", inserted_version.unwrap_or("null")));

    let mut stale = inserted.clone();
    if let Some(fields) = stale.as_object_mut() {
        fields.insert(
            SystemProperty::Version.field_name().to_string(),
            Value::String(STALE_VERSION.to_string()),
        );
    }

    let error = expect_rejected(ops::update_json(&table, stale, &[]))?;
    check_conflict(ctx, error, inserted_version)
}

pub(crate) fn run_typed(ctx: &mut TestContext) -> Result<(), HarnessError> {
    let mut table: Table<RoundTripRow> = ctx.table();
    table.set_system_properties(version_only());

    let inserted = ops::insert(&table, RoundTripRow::sample(), &[])?;
    ctx.track(inserted.id_str());
    ctx.log(format!(
        "Inserted row at version {}",
        inserted.version.as_deref().unwrap_or("null")
    ));

    let mut stale = inserted.clone();
    stale.version = Some(STALE_VERSION.to_string());

    let error = expect_rejected(ops::update(&table, stale, &[]))?;
    check_typed_conflict(ctx, error, &inserted)
}

/// Turns an update that went through into a failure and hands back the
/// error of one that was rejected.
fn expect_rejected<T>(outcome: Result<T, HarnessError>) -> Result<HarnessError, HarnessError> {
    match outcome {
        Ok(_) => Err(HarnessError::assertion(
            "Update with a stale version should have failed",
        )),
        Err(error) => Ok(error),
    }
}

/// Passes a precondition failure through when the server row it carries is
/// still at the version the insert returned.
fn check_conflict(
    ctx: &mut TestContext,
    error: HarnessError,
    inserted_version: Option<&str>,
) -> Result<(), HarnessError> {
    let Some(conflict) = conflict_of(&error) else {
        return Err(error);
    };
    let server_version = conflict.version();
    if server_version != inserted_version {
        return Err(HarnessError::expected_value(
            server_version.unwrap_or("null"),
            inserted_version.unwrap_or("null"),
        ));
    }
    log_conflict(ctx, conflict);
    Err(error)
}

/// Same as [`check_conflict`], reading the server row as a [`RoundTripRow`].
fn check_typed_conflict(
    ctx: &mut TestContext,
    error: HarnessError,
    inserted: &RoundTripRow,
) -> Result<(), HarnessError> {
    let Some(conflict) = conflict_of(&error) else {
        return Err(error);
    };
    let server_row: RoundTripRow = conflict.item()?;
    if server_row.version != inserted.version {
        return Err(HarnessError::expected_value(
            server_row.version.as_deref().unwrap_or("null"),
            inserted.version.as_deref().unwrap_or("null"),
        ));
    }
    log_conflict(ctx, conflict);
    Err(error)
}

fn log_conflict(ctx: &mut TestContext, conflict: &PreconditionFailed) {
    ctx.log(format!(
        "Update rejected ({}), server row: {}",
        conflict.message(),
        conflict.current()
    ));
}

fn conflict_of(error: &HarnessError) -> Option<&PreconditionFailed> {
    match error {
        HarnessError::Client(client) => client.as_precondition_failed(),
        _ => None,
    }
}

fn version_of(row: &Value) -> Option<&str> {
    row.get(SystemProperty::Version.field_name())
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use table_client::{ClientError, MobileServiceClient};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn context(runtime: &tokio::runtime::Runtime) -> TestContext {
        let client = MobileServiceClient::builder()
            .base_url("http://127.0.0.1:9")
            .runtime(runtime.handle().clone())
            .build()
            .unwrap();
        TestContext::new(client, "conflicts")
    }

    fn rejected_at(version: &str) -> HarnessError {
        ClientError::from(PreconditionFailed::new(
            "version mismatch",
            json!({"id": "a", "__version": version}),
        ))
        .into()
    }

    #[test]
    fn test_accepted_stale_update_fails() {
        let err = expect_rejected(Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "Update with a stale version should have failed");

        let passed_through = expect_rejected::<()>(Err(rejected_at("1"))).unwrap();
        assert!(passed_through.is_precondition_failed());
    }

    #[test]
    fn test_conflict_at_insert_version_is_passed_through() {
        let runtime = runtime();
        let mut ctx = context(&runtime);

        let err = check_conflict(&mut ctx, rejected_at("1"), Some("1")).unwrap_err();
        assert!(err.is_precondition_failed());

        let (log, _) = ctx.finish();
        assert_eq!(log.len(), 1);
        assert!(log[0].contains("version mismatch"), "{}", log[0]);
    }

    #[test]
    fn test_conflict_at_other_version_is_an_expected_value_failure() {
        let runtime = runtime();
        let mut ctx = context(&runtime);

        let err = check_conflict(&mut ctx, rejected_at("2"), Some("1")).unwrap_err();
        assert!(matches!(
            &err,
            HarnessError::ExpectedValue { expected, actual } if expected == "2" && actual == "1"
        ));

        let inserted = RoundTripRow {
            id: Some("a".to_string()),
            version: Some("1".to_string()),
            ..RoundTripRow::sample()
        };
        let err = check_typed_conflict(&mut ctx, rejected_at("2"), &inserted).unwrap_err();
        assert!(matches!(err, HarnessError::ExpectedValue { .. }));
    }

    #[test]
    fn test_other_errors_are_returned_unchanged() {
        let runtime = runtime();
        let mut ctx = context(&runtime);

        let service_error = || -> HarnessError {
            ClientError::Service {
                status: 500,
                message: "boom".to_string(),
            }
            .into()
        };
        let err = check_conflict(&mut ctx, service_error(), Some("1")).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Client(ClientError::Service { status: 500, .. })
        ));

        let err = check_typed_conflict(&mut ctx, service_error(), &RoundTripRow::sample())
            .unwrap_err();
        assert!(!err.is_precondition_failed());
        assert!(ctx.finish().0.is_empty());
    }
}
