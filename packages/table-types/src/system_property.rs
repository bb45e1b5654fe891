//! System properties and the set type used to select them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Server-managed row metadata field.
///
/// Clients never write these; the service assigns them on insert and update
/// and only returns the ones a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemProperty {
    /// Creation timestamp, fixed at insert.
    CreatedAt,
    /// Last-update timestamp, strictly increasing on every write.
    UpdatedAt,
    /// Opaque concurrency token, replaced on every write.
    Version,
}

impl SystemProperty {
    /// Every system property, in wire order.
    pub const ALL: [SystemProperty; 3] = [
        SystemProperty::CreatedAt,
        SystemProperty::UpdatedAt,
        SystemProperty::Version,
    ];

    /// Returns the JSON field name carrying this property.
    pub fn field_name(self) -> &'static str {
        match self {
            SystemProperty::CreatedAt => "__createdAt",
            SystemProperty::UpdatedAt => "__updatedAt",
            SystemProperty::Version => "__version",
        }
    }

    /// Resolves a JSON field name back to its property.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.field_name() == name)
    }

    fn bit(self) -> u8 {
        match self {
            SystemProperty::CreatedAt => 0b001,
            SystemProperty::UpdatedAt => 0b010,
            SystemProperty::Version => 0b100,
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        let lowered = token.trim().to_ascii_lowercase();
        let bare = lowered.strip_prefix("__").unwrap_or(&lowered);
        match bare {
            "createdat" => Some(SystemProperty::CreatedAt),
            "updatedat" => Some(SystemProperty::UpdatedAt),
            "version" => Some(SystemProperty::Version),
            _ => None,
        }
    }
}

impl fmt::Display for SystemProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemProperty::CreatedAt => "CreatedAt",
            SystemProperty::UpdatedAt => "UpdatedAt",
            SystemProperty::Version => "Version",
        };
        f.write_str(name)
    }
}

/// Set of [`SystemProperty`] values attached to a table handle or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SystemProperties(u8);

impl SystemProperties {
    /// The empty selection. The service returns no system fields.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Selects all three system fields.
    pub const fn all() -> Self {
        Self(0b111)
    }

    /// Adds a property to the set. Returns false if it was already present.
    pub fn insert(&mut self, property: SystemProperty) -> bool {
        let present = self.contains(property);
        self.0 |= property.bit();
        !present
    }

    /// Removes a property from the set. Returns false if it was absent.
    pub fn remove(&mut self, property: SystemProperty) -> bool {
        let present = self.contains(property);
        self.0 &= !property.bit();
        present
    }

    pub fn contains(&self, property: SystemProperty) -> bool {
        self.0 & property.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_all(&self) -> bool {
        *self == Self::all()
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns a copy of this set with `property` added.
    pub fn with(mut self, property: SystemProperty) -> Self {
        self.insert(property);
        self
    }

    /// Iterates the selected properties in wire order.
    pub fn iter(&self) -> impl Iterator<Item = SystemProperty> + '_ {
        SystemProperty::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }

    /// Renders the selection as a `__systemproperties` value.
    ///
    /// Returns `None` for the empty set: omitting the parameter already
    /// means "no system properties".
    pub fn to_query_value(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else if self.is_all() {
            Some("*".to_string())
        } else {
            Some(
                self.iter()
                    .map(SystemProperty::field_name)
                    .collect::<Vec<_>>()
                    .join(","),
            )
        }
    }

    /// Parses a `__systemproperties` value.
    ///
    /// Tokens are comma separated and case-insensitive, with or without the
    /// `__` prefix. `*` selects everything; blank tokens are skipped.
    pub fn parse(value: &str) -> Result<Self, TypesError> {
        let mut set = Self::none();
        for token in value.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if token == "*" {
                return Ok(Self::all());
            }
            let property = SystemProperty::from_token(token)
                .ok_or_else(|| TypesError::UnknownSystemProperty(token.to_string()))?;
            set.insert(property);
        }
        Ok(set)
    }
}

impl FromIterator<SystemProperty> for SystemProperties {
    fn from_iter<I: IntoIterator<Item = SystemProperty>>(iter: I) -> Self {
        let mut set = Self::none();
        for property in iter {
            set.insert(property);
        }
        set
    }
}

impl<const N: usize> From<[SystemProperty; N]> for SystemProperties {
    fn from(properties: [SystemProperty; N]) -> Self {
        properties.into_iter().collect()
    }
}

impl fmt::Display for SystemProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<String> = self.iter().map(|p| p.to_string()).collect();
        f.write_str(&names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let mut set = SystemProperties::none();
        assert!(set.is_empty());
        assert!(set.insert(SystemProperty::Version));
        assert!(!set.insert(SystemProperty::Version));
        assert!(set.insert(SystemProperty::CreatedAt));
        assert_eq!(set.len(), 2);
        assert!(set.contains(SystemProperty::CreatedAt));
        assert!(!set.contains(SystemProperty::UpdatedAt));

        assert!(set.remove(SystemProperty::CreatedAt));
        assert!(!set.remove(SystemProperty::CreatedAt));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![SystemProperty::Version]
        );
    }

    #[test]
    fn test_query_value_rendering() {
        assert_eq!(SystemProperties::none().to_query_value(), None);
        assert_eq!(
            SystemProperties::all().to_query_value().as_deref(),
            Some("*")
        );
        let set = SystemProperties::from([SystemProperty::Version, SystemProperty::CreatedAt]);
        assert_eq!(
            set.to_query_value().as_deref(),
            Some("__createdAt,__version")
        );
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(SystemProperties::parse("*").unwrap(), SystemProperties::all());
        assert_eq!(
            SystemProperties::parse(" * ").unwrap(),
            SystemProperties::all()
        );
        assert_eq!(
            SystemProperties::parse("__CreatedAt,__VERSION").unwrap(),
            SystemProperties::from([SystemProperty::CreatedAt, SystemProperty::Version])
        );
        assert_eq!(
            SystemProperties::parse("updatedAt").unwrap(),
            SystemProperties::from([SystemProperty::UpdatedAt])
        );
        assert_eq!(SystemProperties::parse("").unwrap(), SystemProperties::none());
        assert_eq!(
            SystemProperties::parse("version,,").unwrap(),
            SystemProperties::from([SystemProperty::Version])
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = SystemProperties::parse("__version,__deleted").unwrap_err();
        assert_eq!(err, TypesError::UnknownSystemProperty("__deleted".to_string()));
    }

    #[test]
    fn test_field_names_round_trip() {
        for property in SystemProperty::ALL {
            assert_eq!(
                SystemProperty::from_field_name(property.field_name()),
                Some(property)
            );
        }
        assert_eq!(SystemProperty::from_field_name("name"), None);
    }
}
