//! CRUD round trip on a table whose row type requests every system property.

use table_client::{field, Filter, Table};

use crate::assertions::{expect_equal, verify_all_system_properties};
use crate::error::HarnessError;
use crate::framework::TestContext;
use crate::ops;
use crate::types::RoundTripRow;

pub(crate) fn run(ctx: &mut TestContext) -> Result<(), HarnessError> {
    let table: Table<RoundTripRow> = ctx.table();

    let inserted = ops::insert(&table, RoundTripRow::sample_with_id(), &[])?;
    ctx.track(inserted.id_str());
    verify_all_system_properties("Insert response", &inserted)?;
    ctx.log(format!("Inserted row {}", inserted.id_str()));

    let all_rows = ops::read(&table, &[])?;
    let read_back = all_rows
        .iter()
        .find(|row| row.id == inserted.id)
        .ok_or_else(|| HarnessError::assertion("Read response - Missing previously inserted element"))?;
    verify_all_system_properties("Read response", read_back)?;
    ctx.log(format!("Read {} rows", all_rows.len()));

    let (version, created_at, updated_at) = match (
        inserted.version.clone(),
        inserted.created_at,
        inserted.updated_at,
    ) {
        (Some(v), Some(c), Some(u)) => (v, c, u),
        _ => return Err(HarnessError::assertion("Insert response - System Properties missing")),
    };
    filter_by(
        ctx,
        &table,
        &all_rows,
        "__version",
        field("__version").eq(version.clone()),
        |row| row.version.clone(),
        version,
    )?;
    filter_by(
        ctx,
        &table,
        &all_rows,
        "__createdAt",
        field("__createdAt").eq(created_at),
        |row| row.created_at,
        created_at,
    )?;
    filter_by(
        ctx,
        &table,
        &all_rows,
        "__updatedAt",
        field("__updatedAt").eq(updated_at),
        |row| row.updated_at,
        updated_at,
    )?;

    let looked_up = ops::lookup(&table, inserted.id_str(), &[])?;
    expect_equal(&inserted.id, &looked_up.id)?;
    expect_equal(&inserted.version, &looked_up.version)?;
    expect_equal(&inserted.created_at, &looked_up.created_at)?;
    expect_equal(&inserted.updated_at, &looked_up.updated_at)?;
    ctx.log("Lookup matches insert");

    let mut changed = looked_up.clone();
    changed.name = Some("Other Sample Data".to_string());
    let updated = ops::update(&table, changed, &[])?;
    check_update(&inserted, &updated)?;
    ctx.log(format!(
        "Updated row to version {}",
        updated.version.as_deref().unwrap_or_default()
    ));

    let id = updated.id_str().to_string();
    ops::delete(&table, updated)?;
    ctx.forget(&id);
    ctx.log("Deleted row");
    Ok(())
}

/// Checks an update response against the insert response of the same row.
fn check_update(inserted: &RoundTripRow, updated: &RoundTripRow) -> Result<(), HarnessError> {
    expect_equal(&inserted.id, &updated.id)?;
    if updated.version == inserted.version {
        return Err(HarnessError::assertion("Update response - same Version"));
    }
    expect_equal(&inserted.created_at, &updated.created_at)?;
    match (inserted.updated_at, updated.updated_at) {
        (Some(before), Some(after)) if before < after => Ok(()),
        _ => Err(HarnessError::assertion(
            "Update response - incorrect UpdatedAt",
        )),
    }
}

/// Queries by one system field and checks the server agrees with the
/// locally filtered full read.
fn filter_by<V: PartialEq + std::fmt::Debug>(
    ctx: &mut TestContext,
    table: &Table<RoundTripRow>,
    all_rows: &[RoundTripRow],
    name: &str,
    filter: Filter,
    get: impl Fn(&RoundTripRow) -> Option<V>,
    value: V,
) -> Result<(), HarnessError> {
    let expected_count = all_rows
        .iter()
        .filter(|row| get(row).as_ref() == Some(&value))
        .count();
    let filtered = ops::query(table, filter, &[])?;
    expect_equal(&expected_count, &filtered.len())?;

    for row in &filtered {
        let actual = get(row).ok_or_else(|| {
            HarnessError::assertion(format!("Filter response - {} is null", name))
        })?;
        expect_equal(&value, &actual)?;
    }
    ctx.log(format!("Filter on {} returned {} rows", name, filtered.len()));
    Ok(())
}
