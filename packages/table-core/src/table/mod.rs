//! Row tables, system-property assignment, and queries.

mod query;
mod row;
#[allow(clippy::module_inception)]
mod table;
pub(crate) mod validation;

pub use row::StoredRow;
pub use table::Table;

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
