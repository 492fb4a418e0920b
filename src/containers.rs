//! Composable serializers for generic containers.
//!
//! Each adapter delegates to the registry for the contained type(s) at write
//! time and routes every traversal through the formatter's depth guard, so a
//! runaway nesting of containers trips
//! [`Error::MaxDepthExceeded`](crate::Error::MaxDepthExceeded) instead of
//! recursing forever.
//!
//! Layout is wide, not nested: a sequence flattens element cells across
//! columns, and a map writes `key, value, key, value, ...` pairs. A `None`
//! map value still writes its key followed by one empty cell, so key
//! presence survives null values.

use crate::{ExcelFormatter, ExcelSerialize, ExcelSerializer, ExcelSerializerOptions};
use crate::{Result, SharedSerializer};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::Arc;

/// Sequence adapter: element cells in iteration order, element titles
/// flattened per element.
pub struct SeqSerializer<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> SeqSerializer<E> {
    #[must_use]
    pub fn new() -> Self {
        SeqSerializer {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for SeqSerializer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExcelSerialize> ExcelSerializer<Vec<E>> for SeqSerializer<E> {
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &Vec<E>,
        options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()> {
        formatter.enter_and_validate()?;
        let result = seq_titles(formatter, sink, value, options, name);
        formatter.exit();
        result
    }

    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &Vec<E>,
        options: &ExcelSerializerOptions,
    ) -> Result<()> {
        formatter.enter_and_validate()?;
        let result = seq_items(formatter, sink, value, options);
        formatter.exit();
        result
    }
}

fn seq_titles<E: ExcelSerialize>(
    formatter: &mut ExcelFormatter,
    sink: &mut dyn Write,
    value: &[E],
    options: &ExcelSerializerOptions,
    name: &str,
) -> Result<()> {
    let serializer = options.serializer::<E>();
    for item in value {
        serializer.write_title(formatter, sink, item, options, name)?;
    }
    Ok(())
}

fn seq_items<E: ExcelSerialize>(
    formatter: &mut ExcelFormatter,
    sink: &mut dyn Write,
    value: &[E],
    options: &ExcelSerializerOptions,
) -> Result<()> {
    let serializer = options.serializer::<E>();
    for item in value {
        serializer.serialize(formatter, sink, item, options)?;
    }
    Ok(())
}

impl<E: ExcelSerialize> ExcelSerialize for Vec<E> {
    fn default_serializer() -> SharedSerializer<Self> {
        Arc::new(SeqSerializer::new())
    }
}

fn map_titles<'a, K, V>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    formatter: &mut ExcelFormatter,
    sink: &mut dyn Write,
    options: &ExcelSerializerOptions,
    name: &str,
) -> Result<()>
where
    K: ExcelSerialize,
    V: ExcelSerialize,
{
    let key_serializer = options.serializer::<K>();
    let value_serializer = options.serializer::<V>();
    for (key, value) in entries {
        key_serializer.write_title(formatter, sink, key, options, "key")?;
        value_serializer.write_title(formatter, sink, value, options, name)?;
    }
    Ok(())
}

fn map_entries<'a, K, V>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    formatter: &mut ExcelFormatter,
    sink: &mut dyn Write,
    options: &ExcelSerializerOptions,
) -> Result<()>
where
    K: ExcelSerialize,
    V: ExcelSerialize,
{
    let key_serializer = options.serializer::<K>();
    let value_serializer = options.serializer::<V>();
    for (key, value) in entries {
        key_serializer.serialize(formatter, sink, key, options)?;
        value_serializer.serialize(formatter, sink, value, options)?;
    }
    Ok(())
}

macro_rules! map_serializer {
    ($(#[$meta:meta])* $serializer:ident, $map:ident, $($bound:path),+) => {
        $(#[$meta])*
        pub struct $serializer<K, V> {
            _marker: PhantomData<fn() -> (K, V)>,
        }

        impl<K, V> $serializer<K, V> {
            #[must_use]
            pub fn new() -> Self {
                $serializer {
                    _marker: PhantomData,
                }
            }
        }

        impl<K, V> Default for $serializer<K, V> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K, V> ExcelSerializer<$map<K, V>> for $serializer<K, V>
        where
            K: ExcelSerialize $(+ $bound)+,
            V: ExcelSerialize,
        {
            fn write_title(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                value: &$map<K, V>,
                options: &ExcelSerializerOptions,
                name: &str,
            ) -> Result<()> {
                formatter.enter_and_validate()?;
                let result = map_titles(value.iter(), formatter, sink, options, name);
                formatter.exit();
                result
            }

            fn serialize(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                value: &$map<K, V>,
                options: &ExcelSerializerOptions,
            ) -> Result<()> {
                formatter.enter_and_validate()?;
                let result = map_entries(value.iter(), formatter, sink, options);
                formatter.exit();
                result
            }
        }

        impl<K, V> ExcelSerialize for $map<K, V>
        where
            K: ExcelSerialize $(+ $bound)+,
            V: ExcelSerialize,
        {
            fn default_serializer() -> SharedSerializer<Self> {
                Arc::new($serializer::new())
            }
        }
    };
}

map_serializer!(
    /// Map adapter over [`HashMap`]. Iteration order follows the map.
    HashMapSerializer, HashMap, Eq, Hash
);
map_serializer!(
    /// Map adapter over [`BTreeMap`]: entries in key order.
    BTreeMapSerializer, BTreeMap, Ord
);
map_serializer!(
    /// Map adapter over [`IndexMap`]: entries in insertion order.
    IndexMapSerializer, IndexMap, Eq, Hash
);

/// Nullable adapter: `Some` delegates to the inner type's serializer,
/// `None` writes an empty cell (or the plain member name for titles).
pub struct OptionSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> OptionSerializer<T> {
    #[must_use]
    pub fn new() -> Self {
        OptionSerializer {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for OptionSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ExcelSerialize> ExcelSerializer<Option<T>> for OptionSerializer<T> {
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &Option<T>,
        options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()> {
        match value {
            Some(inner) => options
                .serializer::<T>()
                .write_title(formatter, sink, inner, options, name),
            None => formatter.write_string(name, sink),
        }
    }

    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &Option<T>,
        options: &ExcelSerializerOptions,
    ) -> Result<()> {
        match value {
            Some(inner) => options
                .serializer::<T>()
                .serialize(formatter, sink, inner, options),
            None => formatter.write_empty(sink),
        }
    }
}

impl<T: ExcelSerialize> ExcelSerialize for Option<T> {
    fn default_serializer() -> SharedSerializer<Self> {
        Arc::new(OptionSerializer::new())
    }
}

macro_rules! tuple_serializer {
    ($serializer:ident; $($idx:tt $t:ident),+) => {
        /// Tuple adapter: element-wise delegation, one depth frame around
        /// the whole tuple.
        pub struct $serializer<$($t),+> {
            _marker: PhantomData<fn() -> ($($t,)+)>,
        }

        impl<$($t),+> $serializer<$($t),+> {
            #[must_use]
            pub fn new() -> Self {
                $serializer {
                    _marker: PhantomData,
                }
            }
        }

        impl<$($t),+> Default for $serializer<$($t),+> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<$($t: ExcelSerialize),+> ExcelSerializer<($($t,)+)> for $serializer<$($t),+> {
            fn write_title(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                value: &($($t,)+),
                options: &ExcelSerializerOptions,
                name: &str,
            ) -> Result<()> {
                formatter.enter_and_validate()?;
                let result = (|| {
                    $( options.serializer::<$t>().write_title(formatter, sink, &value.$idx, options, name)?; )+
                    Ok(())
                })();
                formatter.exit();
                result
            }

            fn serialize(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                value: &($($t,)+),
                options: &ExcelSerializerOptions,
            ) -> Result<()> {
                formatter.enter_and_validate()?;
                let result = (|| {
                    $( options.serializer::<$t>().serialize(formatter, sink, &value.$idx, options)?; )+
                    Ok(())
                })();
                formatter.exit();
                result
            }
        }

        impl<$($t: ExcelSerialize),+> ExcelSerialize for ($($t,)+) {
            fn default_serializer() -> SharedSerializer<Self> {
                Arc::new($serializer::new())
            }
        }
    };
}

tuple_serializer!(Tuple1Serializer; 0 A);
tuple_serializer!(Tuple2Serializer; 0 A, 1 B);
tuple_serializer!(Tuple3Serializer; 0 A, 1 B, 2 C);
tuple_serializer!(Tuple4Serializer; 0 A, 1 B, 2 C, 3 D);
tuple_serializer!(Tuple5Serializer; 0 A, 1 B, 2 C, 3 D, 4 E);
tuple_serializer!(Tuple6Serializer; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
tuple_serializer!(Tuple7Serializer; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
tuple_serializer!(Tuple8Serializer; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
