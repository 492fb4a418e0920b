//! Serializer resolution registry.
//!
//! The registry maps a type identity to one resolved serializer instance and
//! guarantees the ordered provider walk happens at most once per type:
//!
//! 1. an explicit override registered for the type (always wins);
//! 2. the cached result of a previous resolution;
//! 3. the type's own [`ExcelSerialize::default_serializer`], which covers the
//!    primitive table, the generic container adapters and record plans.
//!
//! (A member-level override attached to a record plan bypasses the registry
//! entirely; see [`Member::serializer`](crate::record::Member::serializer).)
//!
//! A registry is process-lifetime: the [`global`](SerializerRegistry::global)
//! instance backs default options, and options with overrides carry their own.
//! Concurrent population from independent sessions is safe: a resolution
//! race builds duplicate instances, any of which is equivalent, and the first
//! writer wins.
//!
//! A failed custom-serializer construction is captured as a
//! [`FailedSerializer`] entry rather than raised at registration time, so
//! unrelated types stay usable and the error surfaces on first actual use of
//! the exact type that was misconfigured.

use crate::dynamic::{self, DynamicTable};
use crate::{Error, ExcelFormatter, ExcelSerialize, ExcelSerializer, ExcelSerializerOptions};
use crate::{Result, SharedSerializer};
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL: Lazy<Arc<SerializerRegistry>> = Lazy::new(|| Arc::new(SerializerRegistry::new()));

type ErasedSerializer = Box<dyn Any + Send + Sync>;

/// Type-keyed cache of resolved serializer instances.
pub struct SerializerRegistry {
    overrides: RwLock<HashMap<TypeId, ErasedSerializer>>,
    cache: RwLock<HashMap<TypeId, ErasedSerializer>>,
    dynamic: DynamicTable,
}

impl SerializerRegistry {
    /// Creates an empty registry with the built-in scalar types pre-seeded
    /// into its dynamic dispatch table.
    #[must_use]
    pub fn new() -> Self {
        let registry = SerializerRegistry {
            overrides: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            dynamic: DynamicTable::new(),
        };
        dynamic::seed_builtins(&registry.dynamic);
        registry
    }

    /// The shared process-lifetime registry backing default options.
    #[must_use]
    pub fn global() -> Arc<SerializerRegistry> {
        GLOBAL.clone()
    }

    /// Registers an override that wins over the type's default serializer.
    pub fn register_override<T: ExcelSerialize>(&self, serializer: SharedSerializer<T>) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Box::new(serializer));
    }

    /// Registers an override produced by a fallible factory.
    ///
    /// The factory runs immediately; on failure the captured error is stored
    /// as a [`FailedSerializer`] and re-raised the first time anything
    /// actually serializes a `T`. Other types are unaffected.
    pub fn register_factory<T, F>(&self, factory: F)
    where
        T: ExcelSerialize,
        F: FnOnce() -> Result<SharedSerializer<T>>,
    {
        let serializer = factory().unwrap_or_else(|error| {
            Arc::new(FailedSerializer::<T>::new(Error::construction(
                std::any::type_name::<T>(),
                error,
            )))
        });
        self.register_override::<T>(serializer);
    }

    /// Registers `T` in the dynamic dispatch table so values erased behind
    /// [`CellValue`](crate::CellValue) can resolve it at write time.
    pub fn register_dynamic<T: ExcelSerialize>(&self) {
        self.dynamic.register::<T>();
    }

    /// Resolves the serializer for `T`, walking overrides, then the cache,
    /// then the type's default. The result is cached so the walk happens at
    /// most once per type per registry.
    ///
    /// Resolution never fails: a misconfigured override resolves to its
    /// captured-error serializer, which errors when used.
    #[must_use]
    pub fn resolve<T: ExcelSerialize>(&self) -> SharedSerializer<T> {
        let key = TypeId::of::<T>();

        {
            let overrides = self.overrides.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(serializer) = overrides
                .get(&key)
                .and_then(|e| e.downcast_ref::<SharedSerializer<T>>())
            {
                return serializer.clone();
            }
        }

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(serializer) = cache
                .get(&key)
                .and_then(|e| e.downcast_ref::<SharedSerializer<T>>())
            {
                return serializer.clone();
            }
        }

        let built = T::default_serializer();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        match cache.entry(key) {
            // Another session won the race; their instance is equivalent.
            Entry::Occupied(existing) => existing
                .get()
                .downcast_ref::<SharedSerializer<T>>()
                .cloned()
                .unwrap_or(built),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(built.clone()));
                built
            }
        }
    }

    /// The runtime-type dispatch table used by the dynamic fallback.
    #[must_use]
    pub fn dynamic(&self) -> &DynamicTable {
        &self.dynamic
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Captured-error serializer.
///
/// Stored in place of a serializer whose construction failed; both
/// operations return the stored error, preserving "fail only when actually
/// exercised" semantics without panicking at registration time.
pub struct FailedSerializer<T> {
    error: Error,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FailedSerializer<T> {
    /// Wraps a construction error for deferred delivery.
    #[must_use]
    pub fn new(error: Error) -> Self {
        FailedSerializer {
            error,
            _marker: PhantomData,
        }
    }
}

impl<T> ExcelSerializer<T> for FailedSerializer<T> {
    fn write_title(
        &self,
        _formatter: &mut ExcelFormatter,
        _sink: &mut dyn Write,
        _value: &T,
        _options: &ExcelSerializerOptions,
        _name: &str,
    ) -> Result<()> {
        Err(self.error.clone())
    }

    fn serialize(
        &self,
        _formatter: &mut ExcelFormatter,
        _sink: &mut dyn Write,
        _value: &T,
        _options: &ExcelSerializerOptions,
    ) -> Result<()> {
        Err(self.error.clone())
    }
}
