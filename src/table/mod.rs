//! In-memory tables (nouns)
//!
//! Entities hold their rows as a [`Table`]: an ordered column list and rows of
//! JSON cells. Groups see fact rows through a [`RowSet`], a borrowed view made
//! of row indices into one table.

mod rowset;
mod table;
mod value;

pub use rowset::{RowRef, RowSet};
pub use table::Table;
pub use value::{category_key, id_key, scalars_equal};
