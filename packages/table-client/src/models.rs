//! Row trait and request parameter helpers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use table_types::{SystemProperties, SYSTEM_PROPERTIES_PARAMETER};

/// Extra query-string parameters attached to a single call.
pub type QueryParameters = [(String, String)];

/// A typed row stored in a table.
///
/// `system_properties` is the set a [`Table`](crate::Table) of this type
/// starts with; it can be changed per handle afterwards.
pub trait TableRow: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn system_properties() -> SystemProperties {
        SystemProperties::none()
    }
}

/// Builds the query string pairs for a call.
///
/// A caller-supplied `__systemproperties` (any letter case) wins over the
/// handle's set.
pub(crate) fn effective_parameters(
    params: &QueryParameters,
    properties: SystemProperties,
) -> Vec<(String, String)> {
    let mut pairs = params.to_vec();
    let overridden = params
        .iter()
        .any(|(key, _)| key.eq_ignore_ascii_case(SYSTEM_PROPERTIES_PARAMETER));
    if !overridden {
        if let Some(value) = properties.to_query_value() {
            pairs.push((SYSTEM_PROPERTIES_PARAMETER.to_string(), value));
        }
    }
    pairs
}
