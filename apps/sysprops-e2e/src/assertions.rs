//! Presence checks for system properties on returned rows.

use serde_json::Value;
use table_client::SystemProperty;

use crate::error::HarnessError;
use crate::types::RoundTripRow;

/// A row whose system fields can be inspected.
pub trait SystemFields {
    /// True if the row carries a non-null value for `property`.
    fn has_system_property(&self, property: SystemProperty) -> bool;
}

impl SystemFields for RoundTripRow {
    fn has_system_property(&self, property: SystemProperty) -> bool {
        match property {
            SystemProperty::CreatedAt => self.created_at.is_some(),
            SystemProperty::UpdatedAt => self.updated_at.is_some(),
            SystemProperty::Version => self.version.is_some(),
        }
    }
}

impl SystemFields for Value {
    fn has_system_property(&self, property: SystemProperty) -> bool {
        self.get(property.field_name())
            .is_some_and(|value| !value.is_null())
    }
}

/// Checks which system properties a row carries.
///
/// On mismatch the error reads `"<message> - System Properties"` followed by
/// `" - <Property> is null"` or `" - <Property> is not null"` for every
/// property that is wrong, in createdAt, updatedAt, version order.
pub fn verify_system_properties(
    message: &str,
    should_have_created_at: bool,
    should_have_updated_at: bool,
    should_have_version: bool,
    row: &impl SystemFields,
) -> Result<(), HarnessError> {
    let expectations = [
        (SystemProperty::CreatedAt, should_have_created_at),
        (SystemProperty::UpdatedAt, should_have_updated_at),
        (SystemProperty::Version, should_have_version),
    ];

    let mut failure = format!("{} - System Properties", message);
    let mut failed = false;
    for (property, expected) in expectations {
        match (expected, row.has_system_property(property)) {
            (true, false) => failure.push_str(&format!(" - {} is null", property)),
            (false, true) => failure.push_str(&format!(" - {} is not null", property)),
            _ => continue,
        }
        failed = true;
    }

    if failed {
        Err(HarnessError::Assertion(failure))
    } else {
        Ok(())
    }
}

/// Checks that all three system properties are present.
pub fn verify_all_system_properties(
    message: &str,
    row: &impl SystemFields,
) -> Result<(), HarnessError> {
    verify_system_properties(message, true, true, true, row)
}

/// Fails with [`HarnessError::ExpectedValue`] unless both values are equal.
pub fn expect_equal<T: PartialEq + std::fmt::Debug>(
    expected: &T,
    actual: &T,
) -> Result<(), HarnessError> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::expected_value(
            format!("{:?}", expected),
            format!("{:?}", actual),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matching_row_passes() {
        let row = json!({"__version": "1", "__createdAt": "2024-01-01T00:00:00.000Z"});
        assert!(verify_system_properties("Insert response", true, false, true, &row).is_ok());
    }

    #[test]
    fn test_every_violation_is_listed() {
        let row = json!({"__updatedAt": "2024-01-01T00:00:00.000Z", "__version": null});
        let err = verify_system_properties("Read response", true, false, true, &row).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Read response - System Properties - CreatedAt is null - UpdatedAt is not null - Version is null"
        );
    }

    #[test]
    fn test_typed_row_absent_fields() {
        let row = RoundTripRow::sample();
        let err = verify_all_system_properties("Lookup response", &row).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Lookup response - System Properties - CreatedAt is null - UpdatedAt is null - Version is null"
        );
        assert!(verify_system_properties("Lookup response", false, false, false, &row).is_ok());
    }

    #[test]
    fn test_expect_equal() {
        assert!(expect_equal(&"a", &"a").is_ok());
        assert!(matches!(
            expect_equal(&1, &2),
            Err(HarnessError::ExpectedValue { .. })
        ));
    }
}
