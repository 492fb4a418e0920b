//! Declarative macros for record and enum types.
//!
//! [`excel_record!`] wires a plain struct into the resolution chain: it
//! implements [`ExcelRecord`](crate::ExcelRecord) from a field list and
//! [`ExcelSerialize`](crate::ExcelSerialize) via a
//! [`RecordSerializer`](crate::RecordSerializer). [`excel_enum!`] does the
//! same for fieldless `Copy` enums through
//! [`EnumLabelSerializer`](crate::EnumLabelSerializer).
//!
//! Both emit the exact impls a hand-written type would carry; the macros are
//! shorthand, not a separate code path.

/// Implements [`ExcelRecord`](crate::ExcelRecord) and
/// [`ExcelSerialize`](crate::ExcelSerialize) for a struct.
///
/// Each listed field becomes one column. By default the column title is the
/// field name and columns follow declaration order; `=> "Title"` renames a
/// column and `@ N` pins its explicit order (ties break by title).
///
/// ## Examples
///
/// ```rust
/// use excel_serializer::excel_record;
///
/// struct Dinosaur {
///     name: String,
///     mass_kg: f64,
///     era: Option<String>,
/// }
///
/// excel_record!(Dinosaur {
///     name => "Name",
///     mass_kg => "Mass (kg)" @ 10,
///     era,
/// });
/// ```
#[macro_export]
macro_rules! excel_record {
    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident, $name:literal) => {
        $name
    };
    ($ty:ty { $($field:ident $(=> $name:literal)? $(@ $order:literal)?),+ $(,)? }) => {
        impl $crate::ExcelRecord for $ty {
            fn schema() -> $crate::RecordSchema<Self> {
                $crate::RecordSchema::new()
                    $(
                        .field(
                            $crate::Member::new(
                                $crate::excel_record!(@name $field $(, $name)?),
                                |record: &$ty| &record.$field,
                            )
                            $(.order($order))?
                        )
                    )+
            }
        }

        impl $crate::ExcelSerialize for $ty {
            fn default_serializer() -> $crate::SharedSerializer<Self> {
                ::std::sync::Arc::new($crate::RecordSerializer::new())
            }
        }
    };
}

/// Implements [`ExcelEnum`](crate::ExcelEnum) and
/// [`ExcelSerialize`](crate::ExcelSerialize) for a fieldless `Copy` enum.
///
/// The default serializer writes the variant label as a shared string; the
/// label is the variant name unless `=> "text"` overrides it. Register
/// [`EnumValueSerializer`](crate::EnumValueSerializer) as an override to get
/// the numeric discriminant instead.
///
/// ## Examples
///
/// ```rust
/// use excel_serializer::excel_enum;
///
/// #[derive(Clone, Copy)]
/// enum Diet {
///     Herbivore,
///     Carnivore,
///     Omnivore,
/// }
///
/// excel_enum!(Diet {
///     Herbivore,
///     Carnivore => "meat-eater",
///     Omnivore,
/// });
/// ```
#[macro_export]
macro_rules! excel_enum {
    (@label $variant:ident) => {
        stringify!($variant)
    };
    (@label $variant:ident, $label:literal) => {
        $label
    };
    ($ty:ty { $($variant:ident $(=> $label:literal)?),+ $(,)? }) => {
        impl $crate::ExcelEnum for $ty {
            fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $crate::excel_enum!(@label $variant $(, $label)?), )+
                }
            }

            fn ordinal(&self) -> i64 {
                *self as i64
            }
        }

        impl $crate::ExcelSerialize for $ty {
            fn default_serializer() -> $crate::SharedSerializer<Self> {
                ::std::sync::Arc::new($crate::EnumLabelSerializer::new())
            }
        }
    };
}
