//! Pure schedule computations over an already-loaded course snapshot.

mod availability;
mod combinations;
mod grouping;
mod weekdays;

#[cfg(test)]
pub(crate) mod fixtures;

pub use availability::is_open;
pub use combinations::related_sections;
pub use grouping::{ComponentGroup, group_open_sections};
pub use weekdays::{decode_weekdays, encode_weekdays};
