//! Fixed test data.

/// Default table the scenarios run against.
pub const STRING_ID_TABLE_NAME: &str = "stringIdRoundTripTable";

/// Name of the test group.
pub const GROUP_NAME: &str = "System Properties tests";

/// `__systemproperties` query strings accepted by the service, in
/// `key=value` form.
///
/// Covers the wildcard, each property alone and in combination, with and
/// without the `__` prefix, in mixed letter case and with blanks.
pub const VALID_SYSTEM_PROPERTY_QUERY_STRINGS: &[&str] = &[
    "__systemProperties=*",
    "__systemProperties=__createdAt",
    "__systemProperties=__createdAt,__updatedAt",
    "__systemProperties=__createdAt,__version",
    "__systemProperties=__createdAt,__updatedAt,__version",
    "__systemProperties=__updatedAt",
    "__systemProperties=__updatedAt,__version",
    "__systemProperties=__version",
    "__systemProperties=createdAt",
    "__systemProperties=createdAt,updatedAt",
    "__systemProperties=createdAt,version",
    "__systemProperties=createdAt,updatedAt,version",
    "__systemProperties=updatedAt",
    "__systemProperties=updatedAt,version",
    "__systemProperties=version",
    "__systemProperties=__CREATEDAT,__Version",
    "__systemProperties=__createdAt, __UpdatedAt",
    "__systemProperties= * ",
];
