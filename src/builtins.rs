//! Built-in serializers for scalar and temporal types.
//!
//! This is the fixed primitive table of the resolution chain: booleans,
//! every integer width (including 128-bit and [`num_bigint::BigInt`]),
//! floating-point widths, characters, strings, UUIDs, the chrono date/time
//! and duration types, and the enum adapters.
//!
//! All scalar titles are just the member name; the interesting behavior is
//! on the data side, where each type maps to its logical cell kind
//! (boolean / integer / number / string / date).

use crate::{ExcelFormatter, ExcelSerialize, ExcelSerializer, ExcelSerializerOptions};
use crate::{Result, SharedSerializer};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use num_bigint::BigInt;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

macro_rules! scalar_serializer {
    ($(#[$meta:meta])* $serializer:ident, $ty:ty, |$formatter:ident, $sink:ident, $value:ident| $write:expr) => {
        $(#[$meta])*
        pub struct $serializer;

        impl ExcelSerializer<$ty> for $serializer {
            fn write_title(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                _value: &$ty,
                _options: &ExcelSerializerOptions,
                name: &str,
            ) -> Result<()> {
                formatter.write_string(name, sink)
            }

            fn serialize(
                &self,
                $formatter: &mut ExcelFormatter,
                $sink: &mut dyn Write,
                $value: &$ty,
                _options: &ExcelSerializerOptions,
            ) -> Result<()> {
                $write
            }
        }

        impl ExcelSerialize for $ty {
            fn default_serializer() -> SharedSerializer<Self> {
                Arc::new($serializer)
            }
        }
    };
}

scalar_serializer!(
    /// Boolean cells, emitted as `1`/`0`.
    BoolSerializer, bool,
    |formatter, sink, value| formatter.write_bool(*value, sink)
);

macro_rules! integer_serializers {
    ($( $serializer:ident => $ty:ty ),+ $(,)?) => {
        $(
            scalar_serializer!(
                /// Integer cell with the fixed integer number format.
                $serializer, $ty,
                |formatter, sink, value| formatter.write_integer(&value.to_string(), sink)
            );
        )+
    };
}

integer_serializers!(
    I8Serializer => i8,
    I16Serializer => i16,
    I32Serializer => i32,
    I64Serializer => i64,
    I128Serializer => i128,
    IsizeSerializer => isize,
    U8Serializer => u8,
    U16Serializer => u16,
    U32Serializer => u32,
    U64Serializer => u64,
    U128Serializer => u128,
    UsizeSerializer => usize,
);

scalar_serializer!(
    /// Arbitrary-precision integer cell.
    BigIntSerializer, BigInt,
    |formatter, sink, value| formatter.write_integer(&value.to_string(), sink)
);

scalar_serializer!(
    /// Single-precision float cell, culture-invariant text.
    F32Serializer, f32,
    |formatter, sink, value| formatter.write_number(&value.to_string(), sink)
);

scalar_serializer!(
    /// Double-precision float cell, culture-invariant text.
    F64Serializer, f64,
    |formatter, sink, value| formatter.write_number(&value.to_string(), sink)
);

scalar_serializer!(
    /// Shared-string cell.
    StringSerializer, String,
    |formatter, sink, value| formatter.write_string(value, sink)
);

scalar_serializer!(
    /// Single character as a shared-string cell.
    CharSerializer, char,
    |formatter, sink, value| {
        let mut buf = [0u8; 4];
        formatter.write_string(value.encode_utf8(&mut buf), sink)
    }
);

scalar_serializer!(
    /// UUID rendered in canonical hyphenated form.
    UuidSerializer, Uuid,
    |formatter, sink, value| formatter.write_string(&value.to_string(), sink)
);

scalar_serializer!(
    /// Date-only cell with the date style.
    NaiveDateSerializer, NaiveDate,
    |formatter, sink, value| formatter.write_date(*value, sink)
);

scalar_serializer!(
    /// Time-only cell with the time style.
    NaiveTimeSerializer, NaiveTime,
    |formatter, sink, value| formatter.write_time(*value, sink)
);

scalar_serializer!(
    /// Date-time cell; exact-midnight values demote to the date style.
    NaiveDateTimeSerializer, NaiveDateTime,
    |formatter, sink, value| formatter.write_datetime(*value, sink)
);

scalar_serializer!(
    /// Zoned timestamps keep their offset and serialize as RFC 3339 text.
    DateTimeUtcSerializer, DateTime<Utc>,
    |formatter, sink, value| formatter.write_string(&value.to_rfc3339(), sink)
);

scalar_serializer!(
    /// Fixed-offset timestamps serialize as RFC 3339 text.
    DateTimeFixedSerializer, DateTime<FixedOffset>,
    |formatter, sink, value| formatter.write_string(&value.to_rfc3339(), sink)
);

scalar_serializer!(
    /// Elapsed-time cell, rendered as `[-][d.]hh:mm:ss` text.
    DurationSerializer, TimeDelta,
    |formatter, sink, value| formatter.write_string(&format_duration(*value), sink)
);

// Sub-second precision is dropped, matching the other time writers.
fn format_duration(value: TimeDelta) -> String {
    let total = value.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let days = total / 86_400;
    let hours = total / 3_600 % 24;
    let minutes = total / 60 % 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Fieldless enums that expose a label and an ordinal per variant.
///
/// Implemented by the [`excel_enum!`](crate::excel_enum) macro. The macro
/// requires a `Copy` enum so the ordinal can be taken from the discriminant.
pub trait ExcelEnum: Send + Sync + 'static {
    /// The variant's symbolic name, or its declared alternate text.
    fn label(&self) -> &'static str;

    /// The variant's underlying numeric value.
    fn ordinal(&self) -> i64;
}

/// Default enum adapter: writes the variant label as a shared string.
///
/// Labels are `'static` string matches, so no per-value cache is needed.
pub struct EnumLabelSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> EnumLabelSerializer<T> {
    #[must_use]
    pub fn new() -> Self {
        EnumLabelSerializer {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for EnumLabelSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ExcelEnum> ExcelSerializer<T> for EnumLabelSerializer<T> {
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        _value: &T,
        _options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()> {
        formatter.write_string(name, sink)
    }

    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &T,
        _options: &ExcelSerializerOptions,
    ) -> Result<()> {
        formatter.write_string(value.label(), sink)
    }
}

/// Alternate enum adapter: writes the variant's underlying numeric value as
/// an integer cell. Use it as a member-level or registered override.
pub struct EnumValueSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> EnumValueSerializer<T> {
    #[must_use]
    pub fn new() -> Self {
        EnumValueSerializer {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for EnumValueSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ExcelEnum> ExcelSerializer<T> for EnumValueSerializer<T> {
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        _value: &T,
        _options: &ExcelSerializerOptions,
        name: &str,
    ) -> Result<()> {
        formatter.write_string(name, sink)
    }

    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &T,
        _options: &ExcelSerializerOptions,
    ) -> Result<()> {
        formatter.write_integer(&value.ordinal().to_string(), sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExcelSerializerOptions;

    fn serialize_one<T: ExcelSerialize>(value: &T) -> String {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        options
            .serializer::<T>()
            .serialize(&mut formatter, &mut out, value, &options)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn integers_use_the_integer_style() {
        assert_eq!(serialize_one(&42_i32), "<c t=\"n\" s=\"5\"><v>42</v></c>");
        assert_eq!(serialize_one(&-7_i8), "<c t=\"n\" s=\"5\"><v>-7</v></c>");
        assert_eq!(
            serialize_one(&u128::MAX),
            format!("<c t=\"n\" s=\"5\"><v>{}</v></c>", u128::MAX)
        );
    }

    #[test]
    fn floats_use_the_number_style() {
        assert_eq!(serialize_one(&1.5_f64), "<c t=\"n\" s=\"6\"><v>1.5</v></c>");
    }

    #[test]
    fn bigint_serializes_verbatim() {
        let huge: BigInt = BigInt::from(u128::MAX) * 10;
        assert_eq!(
            serialize_one(&huge),
            format!("<c t=\"n\" s=\"5\"><v>{huge}</v></c>")
        );
    }

    #[test]
    fn uuid_becomes_a_shared_string() {
        let id = Uuid::nil();
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        options
            .serializer::<Uuid>()
            .serialize(&mut formatter, &mut out, &id, &options)
            .unwrap();
        assert_eq!(
            formatter.shared_strings().get("00000000-0000-0000-0000-000000000000"),
            Some(&0)
        );
    }

    #[test]
    fn durations_serialize_as_elapsed_time_text() {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        let serializer = options.serializer::<TimeDelta>();

        // 1 day, 2 hours, 3 minutes, 4 seconds.
        serializer
            .serialize(&mut formatter, &mut out, &TimeDelta::seconds(93_784), &options)
            .unwrap();
        serializer
            .serialize(&mut formatter, &mut out, &TimeDelta::seconds(-90), &options)
            .unwrap();
        serializer
            .serialize(&mut formatter, &mut out, &TimeDelta::seconds(45_296), &options)
            .unwrap();

        assert_eq!(formatter.shared_strings().get("1.02:03:04"), Some(&0));
        assert_eq!(formatter.shared_strings().get("-00:01:30"), Some(&1));
        assert_eq!(formatter.shared_strings().get("12:34:56"), Some(&2));
    }

    #[test]
    fn enum_value_override_writes_the_ordinal() {
        #[derive(Clone, Copy)]
        enum Status {
            Active,
            Retired,
        }

        impl ExcelEnum for Status {
            fn label(&self) -> &'static str {
                match self {
                    Status::Active => "Active",
                    Status::Retired => "Retired",
                }
            }

            fn ordinal(&self) -> i64 {
                *self as i64
            }
        }

        impl ExcelSerialize for Status {
            fn default_serializer() -> SharedSerializer<Self> {
                Arc::new(EnumLabelSerializer::new())
            }
        }

        let options =
            ExcelSerializerOptions::new().with_serializer(EnumValueSerializer::<Status>::new());
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        let serializer = options.serializer::<Status>();

        serializer
            .write_title(&mut formatter, &mut out, &Status::Retired, &options, "status")
            .unwrap();
        serializer
            .serialize(&mut formatter, &mut out, &Status::Retired, &options)
            .unwrap();

        // Title stays the member name; data is the integer-styled ordinal.
        assert_eq!(formatter.shared_strings().get("status"), Some(&0));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<c t=\"s\"><v>0</v></c><c t=\"n\" s=\"5\"><v>1</v></c>"
        );
    }

    #[test]
    fn char_round_trips_through_the_string_table() {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        options
            .serializer::<char>()
            .serialize(&mut formatter, &mut out, &'é', &options)
            .unwrap();
        assert_eq!(formatter.shared_strings().get("é"), Some(&0));
    }
}
