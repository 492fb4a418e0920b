//! Runtime-typed cell values and their dispatch table.
//!
//! A column declared as "anything" holds [`Box<dyn CellValue>`]. Its
//! serializer cannot be picked at compile time, so at write time the concrete
//! runtime type of each value is looked up in a lazily-populated, type-keyed
//! dispatch table and the matching serializer is invoked through a small
//! erased shim. The table is pre-seeded with the built-in scalar and temporal
//! types; further types register through
//! [`ExcelSerializerOptions::with_dynamic`](crate::ExcelSerializerOptions::with_dynamic).
//!
//! Looking up a type nobody registered is the one place resolution can
//! genuinely come up empty: [`DynamicTable::resolve`] returns `None` and
//! [`DynamicTable::resolve_required`] surfaces
//! [`Error::MissingSerializer`](crate::Error::MissingSerializer).
//!
//! ## Examples
//!
//! ```rust
//! use excel_serializer::{any_cell, CellValue, ExcelSerializerOptions, ExcelFormatter};
//!
//! let row: Vec<Box<dyn CellValue>> = vec![any_cell(1_i32), any_cell("x".to_string())];
//!
//! let options = ExcelSerializerOptions::new();
//! let mut formatter = ExcelFormatter::new(&options);
//! let mut out = Vec::new();
//! let serializer = options.serializer::<Vec<Box<dyn CellValue>>>();
//! serializer.serialize(&mut formatter, &mut out, &row, &options).unwrap();
//! ```

use crate::{Error, ExcelFormatter, ExcelSerialize, ExcelSerializer, ExcelSerializerOptions};
use crate::{Result, SharedSerializer};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use num_bigint::BigInt;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// A cell value whose concrete type is only known at runtime.
///
/// Blanket-implemented for every `'static` sendable type; erase a value with
/// [`any_cell`] or a plain `Box::new(..) as Box<dyn CellValue>`.
pub trait CellValue: Any + Send + Sync {
    /// The value as `Any`, for downcasting against the dispatch table.
    fn as_any(&self) -> &dyn Any;

    /// The concrete type's name, used in `MissingSerializer` errors.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> CellValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Erases a value into a dynamically-dispatched cell.
#[must_use]
pub fn any_cell<T: Any + Send + Sync>(value: T) -> Box<dyn CellValue> {
    Box::new(value)
}

type ErasedTitleFn = Box<
    dyn Fn(&mut ExcelFormatter, &mut dyn Write, &dyn Any, &ExcelSerializerOptions, &str) -> Result<()>
        + Send
        + Sync,
>;
type ErasedSerializeFn = Box<
    dyn Fn(&mut ExcelFormatter, &mut dyn Write, &dyn Any, &ExcelSerializerOptions) -> Result<()>
        + Send
        + Sync,
>;

/// One registered concrete type: a pair of shims that downcast and delegate
/// to the type's registry-resolved serializer.
pub struct DynamicEntry {
    type_name: &'static str,
    write_title: ErasedTitleFn,
    serialize: ErasedSerializeFn,
}

impl DynamicEntry {
    pub(crate) fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &dyn Any,
        options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()> {
        (self.write_title)(formatter, sink, value, options, name)
    }

    pub(crate) fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &dyn Any,
        options: &ExcelSerializerOptions,
    ) -> Result<()> {
        (self.serialize)(formatter, sink, value, options)
    }
}

/// Type-keyed dispatch table for runtime resolution.
///
/// Population follows the same contract as the main registry cache: safe for
/// concurrent use, last registration for a type wins, lookups are cheap.
pub struct DynamicTable {
    entries: RwLock<HashMap<TypeId, Arc<DynamicEntry>>>,
}

impl DynamicTable {
    pub(crate) fn new() -> Self {
        DynamicTable {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Makes `T` resolvable from erased values.
    pub fn register<T: ExcelSerialize>(&self) {
        let entry = DynamicEntry {
            type_name: std::any::type_name::<T>(),
            write_title: Box::new(|formatter, sink, value, options, name| {
                match value.downcast_ref::<T>() {
                    Some(value) => options
                        .serializer::<T>()
                        .write_title(formatter, sink, value, options, name),
                    None => Err(Error::missing_serializer(std::any::type_name::<T>())),
                }
            }),
            serialize: Box::new(|formatter, sink, value, options| {
                match value.downcast_ref::<T>() {
                    Some(value) => options
                        .serializer::<T>()
                        .serialize(formatter, sink, value, options),
                    None => Err(Error::missing_serializer(std::any::type_name::<T>())),
                }
            }),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Arc::new(entry));
    }

    /// Looks up the entry for a concrete runtime type, or `None` when no
    /// provider matched.
    #[must_use]
    pub fn resolve(&self, type_id: TypeId) -> Option<Arc<DynamicEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    /// Like [`resolve`](Self::resolve) but a miss is an error naming the
    /// type.
    pub fn resolve_required(&self, type_id: TypeId, type_name: &str) -> Result<Arc<DynamicEntry>> {
        self.resolve(type_id)
            .ok_or_else(|| Error::missing_serializer(type_name))
    }
}

/// Seeds the table with every built-in scalar and temporal type, so
/// heterogeneous rows of ordinary values work without registration.
pub(crate) fn seed_builtins(table: &DynamicTable) {
    table.register::<bool>();
    table.register::<i8>();
    table.register::<i16>();
    table.register::<i32>();
    table.register::<i64>();
    table.register::<i128>();
    table.register::<isize>();
    table.register::<u8>();
    table.register::<u16>();
    table.register::<u32>();
    table.register::<u64>();
    table.register::<u128>();
    table.register::<usize>();
    table.register::<f32>();
    table.register::<f64>();
    table.register::<char>();
    table.register::<String>();
    table.register::<Uuid>();
    table.register::<BigInt>();
    table.register::<NaiveDate>();
    table.register::<NaiveTime>();
    table.register::<NaiveDateTime>();
    table.register::<TimeDelta>();
    table.register::<DateTime<Utc>>();
    table.register::<DateTime<FixedOffset>>();
}

/// Serializer for [`Box<dyn CellValue>`]: inspects the concrete runtime type
/// of each value and dispatches through the registry's dynamic table.
pub struct DynamicSerializer;

impl ExcelSerializer<Box<dyn CellValue>> for DynamicSerializer {
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &Box<dyn CellValue>,
        options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()> {
        let inner: &dyn CellValue = value.as_ref();
        let entry = options
            .registry()
            .dynamic()
            .resolve_required(inner.as_any().type_id(), inner.type_name())?;
        entry.write_title(formatter, sink, inner.as_any(), options, name)
    }

    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &Box<dyn CellValue>,
        options: &ExcelSerializerOptions,
    ) -> Result<()> {
        let inner: &dyn CellValue = value.as_ref();
        let entry = options
            .registry()
            .dynamic()
            .resolve_required(inner.as_any().type_id(), inner.type_name())?;
        entry.serialize(formatter, sink, inner.as_any(), options)
    }
}

impl ExcelSerialize for Box<dyn CellValue> {
    fn default_serializer() -> SharedSerializer<Self> {
        Arc::new(DynamicSerializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExcelSerializerOptions;

    #[test]
    fn heterogeneous_values_dispatch_by_runtime_type() {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();

        let serializer = options.serializer::<Box<dyn CellValue>>();
        serializer
            .serialize(&mut formatter, &mut out, &any_cell(42_i32), &options)
            .unwrap();
        serializer
            .serialize(&mut formatter, &mut out, &any_cell("hi".to_string()), &options)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<c t=\"n\" s=\"5\"><v>42</v></c><c t=\"s\"><v>0</v></c>"
        );
    }

    #[test]
    fn unregistered_type_is_a_missing_serializer_error() {
        struct Opaque;

        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();

        let serializer = options.serializer::<Box<dyn CellValue>>();
        let err = serializer
            .serialize(&mut formatter, &mut out, &any_cell(Opaque), &options)
            .unwrap_err();
        assert!(matches!(err, Error::MissingSerializer { .. }));
    }

    #[test]
    fn resolve_returns_none_for_unknown_type() {
        struct Unknown;

        let options = ExcelSerializerOptions::new();
        let table = options.registry().dynamic();
        assert!(table.resolve(TypeId::of::<Unknown>()).is_none());
        assert!(table
            .resolve_required(TypeId::of::<Unknown>(), "Unknown")
            .is_err());
    }
}
