//! System properties chosen on the table handle rather than by the row type.

use table_client::{field, SystemProperties, SystemProperty, Table};

use crate::assertions::{expect_equal, verify_all_system_properties, verify_system_properties};
use crate::error::HarnessError;
use crate::framework::TestContext;
use crate::ops;
use crate::types::RoundTripRow;

pub(crate) fn run(ctx: &mut TestContext) -> Result<(), HarnessError> {
    let mut table: Table<RoundTripRow> = ctx.table();

    let first = ops::insert(&table, RoundTripRow::sample_with_id(), &[])?;
    ctx.track(first.id_str());
    verify_all_system_properties("Insert response", &first)?;
    ctx.log(format!("Inserted {} with {}", first.id_str(), table.system_properties()));

    table.set_system_properties(SystemProperties::from([
        SystemProperty::Version,
        SystemProperty::CreatedAt,
    ]));
    let second = ops::insert(&table, RoundTripRow::sample_with_id(), &[])?;
    ctx.track(second.id_str());
    verify_system_properties("Insert response", true, false, true, &second)?;
    ctx.log(format!("Inserted {} with {}", second.id_str(), table.system_properties()));

    table.set_system_properties(SystemProperties::from([
        SystemProperty::Version,
        SystemProperty::UpdatedAt,
    ]));
    let filtered = ops::query(&table, field("id").eq(second.id_str()), &[])?;
    expect_equal(&1, &filtered.len())?;
    verify_system_properties("Filter response", false, true, true, &filtered[0])?;
    ctx.log(format!("Filtered {} with {}", second.id_str(), table.system_properties()));

    table.set_system_properties(SystemProperties::none());
    let looked_up = ops::lookup(&table, second.id_str(), &[])?;
    verify_system_properties("Lookup response", false, false, false, &looked_up)?;
    ctx.log(format!("Looked up {} with {}", second.id_str(), table.system_properties()));

    let id = first.id_str().to_string();
    ops::delete(&table, first)?;
    ctx.forget(&id);
    ctx.log("Deleted first row");
    Ok(())
}
