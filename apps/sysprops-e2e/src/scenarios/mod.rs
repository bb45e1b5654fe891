//! The "System Properties tests" group.

mod custom;
mod merge_conflict;
mod query_parameter;
mod type_declared;

use crate::data::{GROUP_NAME, VALID_SYSTEM_PROPERTY_QUERY_STRINGS};
use crate::framework::{ExpectedFailure, TestCase, TestGroup};

pub use query_parameter::{expected_properties, split_query_string};

/// Builds the group with every case in run order.
pub fn system_properties_tests() -> TestGroup {
    let mut group = TestGroup::new(GROUP_NAME);

    group.add_test(TestCase::new(
        "Operations with All System Properties from Type",
        type_declared::run,
    ));
    group.add_test(TestCase::new(
        "Operations with Custom System Properties set on Table",
        custom::run,
    ));

    for query_string in VALID_SYSTEM_PROPERTY_QUERY_STRINGS {
        group.add_test(TestCase::new(
            format!(
                "Operations with Query Parameter System Properties set on Table - {}",
                query_string
            ),
            move |ctx| query_parameter::run(ctx, query_string),
        ));
    }

    group.add_test(
        TestCase::new("Merge Conflict", merge_conflict::run_json)
            .expecting(ExpectedFailure::PreconditionFailed),
    );
    group.add_test(
        TestCase::new("Merge Conflict Generic", merge_conflict::run_typed)
            .expecting(ExpectedFailure::PreconditionFailed),
    );

    group
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_layout() {
        let group = system_properties_tests();
        assert_eq!(group.name(), "System Properties tests");

        let cases = group.cases();
        assert_eq!(cases.len(), VALID_SYSTEM_PROPERTY_QUERY_STRINGS.len() + 4);
        assert_eq!(cases[0].name(), "Operations with All System Properties from Type");
        assert_eq!(
            cases[2].name(),
            "Operations with Query Parameter System Properties set on Table - __systemProperties=*"
        );
        assert_eq!(cases[cases.len() - 1].name(), "Merge Conflict Generic");

        let expecting: Vec<_> = cases
            .iter()
            .filter(|case| case.expected_failure().is_some())
            .map(|case| case.name())
            .collect();
        assert_eq!(expecting, vec!["Merge Conflict", "Merge Conflict Generic"]);
    }
}
