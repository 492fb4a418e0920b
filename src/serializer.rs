//! The serializer strategy trait and the per-type resolution seam.
//!
//! Two traits split the work:
//!
//! - [`ExcelSerializer<T>`] is the strategy object: a reusable, shareable
//!   instance that knows how to emit the title cells and the data cells for
//!   values of `T`. Implementations live in [`builtins`](crate::builtins),
//!   [`containers`](crate::containers), [`record`](crate::record) and
//!   [`dynamic`](crate::dynamic), or in user code for custom overrides.
//! - [`ExcelSerialize`] is the resolution entry point: given a type, it names
//!   the default strategy. The registry consults configured overrides first
//!   and falls back to this trait, caching whichever wins per type.
//!
//! A serializer writes *title* cells (column headers) or *data* cells. Titles
//! are names, never values, so null checks do not apply to them; composite
//! serializers flatten element titles across columns (wide layout).

use crate::{ExcelFormatter, ExcelSerializerOptions, Result};
use std::io::Write;
use std::sync::Arc;

/// A reusable, shareable serializer instance.
pub type SharedSerializer<T> = Arc<dyn ExcelSerializer<T>>;

/// Per-type serialization strategy.
///
/// Both operations stream markup fragments into `sink` through the
/// formatter. `name` carries the member name a title should fall back to
/// when the serializer has nothing better (scalars always just write it).
///
/// Implementations for composite shapes must wrap their traversal in
/// [`ExcelFormatter::enter_and_validate`] / [`ExcelFormatter::exit`],
/// releasing the depth frame on every exit path.
pub trait ExcelSerializer<T: ?Sized>: Send + Sync {
    /// Writes the column-header cell(s) for this position.
    ///
    /// The value is passed because composite titles depend on the shape of
    /// the actual data (a sequence repeats its element title per element).
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &T,
        options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()>;

    /// Writes the data cell(s) for one value.
    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &T,
        options: &ExcelSerializerOptions,
    ) -> Result<()>;
}

/// Types that resolve to a default serializer.
///
/// This is the compile-time provider tier: primitives and temporal types
/// implement it in [`builtins`](crate::builtins), containers compose through
/// blanket impls in [`containers`](crate::containers), and record types get
/// an impl from the [`excel_record!`](crate::excel_record) macro (or a
/// hand-written one following the same pattern).
///
/// Resolution for a given type happens at most once per registry; the result
/// is cached and reused across millions of values.
pub trait ExcelSerialize: Send + Sync + Sized + 'static {
    /// Builds the default serializer for this type.
    ///
    /// Called lazily by the registry on the first use of the type, never
    /// directly by write paths; go through
    /// [`ExcelSerializerOptions::serializer`] instead so overrides and the
    /// cache apply.
    fn default_serializer() -> SharedSerializer<Self>;
}
