//! System properties requested through the `__systemproperties` query
//! parameter on each call.

use table_client::{field, SystemProperties, SystemProperty, Table};

use crate::assertions::{expect_equal, verify_system_properties, SystemFields};
use crate::error::HarnessError;
use crate::framework::TestContext;
use crate::ops;
use crate::types::RoundTripRow;

/// Splits `key=value` at the first `=`.
pub fn split_query_string(query_string: &str) -> Result<(String, String), HarnessError> {
    query_string
        .split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| {
            HarnessError::Setup(format!("Malformed query string: {}", query_string))
        })
}

/// Properties a response must carry for a `__systemproperties` value.
///
/// Matching is by substring of the lower-cased value, so `__createdAt`,
/// `createdAt` and `__CREATEDAT` all select createdAt.
pub fn expected_properties(value: &str) -> SystemProperties {
    if value.trim() == "*" {
        return SystemProperties::all();
    }
    let value = value.to_lowercase();
    let mut expected = SystemProperties::none();
    if value.contains("created") {
        expected.insert(SystemProperty::CreatedAt);
    }
    if value.contains("updated") {
        expected.insert(SystemProperty::UpdatedAt);
    }
    if value.contains("version") {
        expected.insert(SystemProperty::Version);
    }
    expected
}

fn verify(
    message: &str,
    expected: SystemProperties,
    row: &impl SystemFields,
) -> Result<(), HarnessError> {
    verify_system_properties(
        message,
        expected.contains(SystemProperty::CreatedAt),
        expected.contains(SystemProperty::UpdatedAt),
        expected.contains(SystemProperty::Version),
        row,
    )
}

pub(crate) fn run(ctx: &mut TestContext, query_string: &str) -> Result<(), HarnessError> {
    let (key, value) = split_query_string(query_string)?;
    let expected = expected_properties(&value);
    let params = vec![(key, value)];
    let table: Table<RoundTripRow> = ctx.table();
    ctx.log(format!("Expecting {} for {}", expected, query_string));

    let original = RoundTripRow::sample_with_id();

    let inserted = ops::insert(&table, original.clone(), &params)?;
    ctx.track(inserted.id_str());
    verify("Insert Response", expected, &inserted)?;

    let all_rows = ops::read(&table, &params)?;
    let read_back = all_rows
        .iter()
        .find(|row| row.id == inserted.id)
        .ok_or_else(|| HarnessError::assertion("Read response - Missing previously inserted element"))?;
    verify("Read Response", expected, read_back)?;

    let filtered = ops::query(&table, field("id").eq(inserted.id_str()), &params)?;
    expect_equal(&1, &filtered.len())?;
    verify("Filter Response", expected, &filtered[0])?;

    let looked_up = ops::lookup(&table, inserted.id_str(), &params)?;
    verify("Lookup Response", expected, &looked_up)?;

    let mut changed = original;
    changed.name = Some("Other Sample Data".to_string());
    let updated = ops::update(&table, changed, &params)?;
    verify("Update Response", expected, &updated)?;
    ctx.log("Every response carried the requested properties");

    let id = updated.id_str().to_string();
    ops::delete(&table, updated)?;
    ctx.forget(&id);
    Ok(())
}
