//! Record plans: field-by-field serialization of user structs.
//!
//! A record type describes itself once through [`ExcelRecord::schema`],
//! listing each exported field as a [`Member`]: a display name, an optional
//! explicit column order, a borrowing accessor and an optional member-level
//! serializer override. [`RecordSerializer`] compiles the schema into a flat
//! list of erased bindings, sorted by `(order, name)`, and replays that list
//! for every row.
//!
//! Compilation happens when the serializer is built, which the registry does
//! at most once per type, so per-row work is a plain indexed walk over
//! pre-resolved closures.
//!
//! Most record types should come from the [`excel_record!`](crate::excel_record)
//! macro; hand-written schemas are for members that need closures the macro
//! cannot express (computed fields, member-level overrides).
//!
//! ## Examples
//!
//! ```rust
//! use excel_serializer::{ExcelRecord, RecordSchema, Member};
//!
//! struct Dinosaur {
//!     name: String,
//!     period: String,
//! }
//!
//! impl ExcelRecord for Dinosaur {
//!     fn schema() -> RecordSchema<Self> {
//!         RecordSchema::new()
//!             .field(Member::new("Name", |d: &Dinosaur| &d.name))
//!             .field(Member::new("Period", |d: &Dinosaur| &d.period).order(99))
//!     }
//! }
//! ```

use crate::{ExcelFormatter, ExcelSerialize, ExcelSerializer, ExcelSerializerOptions};
use crate::{Result, SharedSerializer};
use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

type AccessorFn<T, F> = Arc<dyn Fn(&T) -> &F + Send + Sync>;
type BoundTitleFn<T> = Box<
    dyn Fn(&mut ExcelFormatter, &mut dyn Write, &T, &ExcelSerializerOptions) -> Result<()>
        + Send
        + Sync,
>;
type BoundSerializeFn<T> = Box<
    dyn Fn(&mut ExcelFormatter, &mut dyn Write, &T, &ExcelSerializerOptions) -> Result<()>
        + Send
        + Sync,
>;

/// One exported field of a record type.
pub struct Member<T, F> {
    name: Cow<'static, str>,
    order: Option<usize>,
    accessor: AccessorFn<T, F>,
    serializer: Option<SharedSerializer<F>>,
}

impl<T, F> Member<T, F> {
    /// A member with the given column title and borrowing accessor.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        accessor: impl Fn(&T) -> &F + Send + Sync + 'static,
    ) -> Self {
        Member {
            name: name.into(),
            order: None,
            accessor: Arc::new(accessor),
            serializer: None,
        }
    }

    /// Explicit column order. Unordered members keep their declaration
    /// position, which acts as the default order.
    #[must_use]
    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    /// Member-level serializer override. This bypasses the registry for
    /// this one field; other fields of type `F` are unaffected.
    #[must_use]
    pub fn serializer(mut self, serializer: impl ExcelSerializer<F> + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }
}

/// A member with its field type erased, bound to either its override or the
/// registry-resolved serializer for the field type.
struct MemberBinding<T> {
    name: Cow<'static, str>,
    order: usize,
    write_title: BoundTitleFn<T>,
    serialize: BoundSerializeFn<T>,
}

impl<T> MemberBinding<T> {
    fn bind<F: ExcelSerialize>(member: Member<T, F>, declaration_index: usize) -> Self
    where
        T: 'static,
    {
        let order = member.order.unwrap_or(declaration_index);
        let name = member.name;

        let resolve = {
            let explicit = member.serializer;
            move |options: &ExcelSerializerOptions| -> SharedSerializer<F> {
                match &explicit {
                    Some(serializer) => serializer.clone(),
                    None => options.serializer::<F>(),
                }
            }
        };
        let resolve = Arc::new(resolve);

        let title_name = name.clone();
        let title_accessor = member.accessor.clone();
        let title_resolve = resolve.clone();
        let write_title: BoundTitleFn<T> = Box::new(move |formatter, sink, record, options| {
            let field = title_accessor(record);
            title_resolve(options).write_title(formatter, sink, field, options, &title_name)
        });

        let accessor = member.accessor;
        let serialize: BoundSerializeFn<T> = Box::new(move |formatter, sink, record, options| {
            let field = accessor(record);
            resolve(options).serialize(formatter, sink, field, options)
        });

        MemberBinding {
            name,
            order,
            write_title,
            serialize,
        }
    }
}

/// Ordered list of a record type's exported members.
pub struct RecordSchema<T> {
    members: Vec<MemberBinding<T>>,
}

impl<T: 'static> RecordSchema<T> {
    #[must_use]
    pub fn new() -> Self {
        RecordSchema {
            members: Vec::new(),
        }
    }

    /// Appends a member. Declaration position supplies the default order for
    /// members without an explicit one.
    #[must_use]
    pub fn field<F: ExcelSerialize>(mut self, member: Member<T, F>) -> Self {
        let index = self.members.len();
        self.members.push(MemberBinding::bind(member, index));
        self
    }
}

impl<T: 'static> Default for RecordSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Types with a fixed column layout described by a schema.
///
/// Usually implemented by [`excel_record!`](crate::excel_record).
pub trait ExcelRecord: Send + Sync + Sized + 'static {
    /// The type's exported members, in declaration order.
    fn schema() -> RecordSchema<Self>;
}

/// The compiled plan for a record type: members sorted by `(order, name)`,
/// replayed per row.
pub struct RecordSerializer<T> {
    members: Vec<MemberBinding<T>>,
}

impl<T: ExcelRecord> RecordSerializer<T> {
    /// Compiles the type's schema. Ties on explicit order break by member
    /// name, so layout is deterministic.
    #[must_use]
    pub fn new() -> Self {
        let mut members = T::schema().members;
        members.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        RecordSerializer { members }
    }
}

impl<T: ExcelRecord> Default for RecordSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ExcelRecord> ExcelSerializer<T> for RecordSerializer<T> {
    fn write_title(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &T,
        options: &ExcelSerializerOptions,
        _name: &str,
    ) -> Result<()> {
        formatter.enter_and_validate()?;
        let result = (|| {
            for member in &self.members {
                (member.write_title)(formatter, sink, value, options)?;
            }
            Ok(())
        })();
        formatter.exit();
        result
    }

    fn serialize(
        &self,
        formatter: &mut ExcelFormatter,
        sink: &mut dyn Write,
        value: &T,
        options: &ExcelSerializerOptions,
    ) -> Result<()> {
        formatter.enter_and_validate()?;
        let result = (|| {
            for member in &self.members {
                (member.serialize)(formatter, sink, value, options)?;
            }
            Ok(())
        })();
        formatter.exit();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExcelSerializerOptions;

    struct Contact {
        title: String,
        name: String,
        address: String,
    }

    impl ExcelRecord for Contact {
        fn schema() -> RecordSchema<Self> {
            RecordSchema::new()
                .field(Member::new("Title", |c: &Contact| &c.title).order(2))
                .field(Member::new("Name", |c: &Contact| &c.name).order(3))
                .field(Member::new("Address", |c: &Contact| &c.address).order(1))
        }
    }

    impl ExcelSerialize for Contact {
        fn default_serializer() -> SharedSerializer<Self> {
            Arc::new(RecordSerializer::new())
        }
    }

    fn contact() -> Contact {
        Contact {
            title: "Dr".to_string(),
            name: "Grant".to_string(),
            address: "Snakewater".to_string(),
        }
    }

    #[test]
    fn members_emit_in_explicit_order() {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();

        options
            .serializer::<Contact>()
            .serialize(&mut formatter, &mut out, &contact(), &options)
            .unwrap();

        // Address (1), Title (2), Name (3).
        assert_eq!(formatter.shared_strings().get("Snakewater"), Some(&0));
        assert_eq!(formatter.shared_strings().get("Dr"), Some(&1));
        assert_eq!(formatter.shared_strings().get("Grant"), Some(&2));
    }

    #[test]
    fn titles_follow_the_same_order() {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();

        options
            .serializer::<Contact>()
            .write_title(&mut formatter, &mut out, &contact(), &options, "value")
            .unwrap();

        assert_eq!(formatter.shared_strings().get("Address"), Some(&0));
        assert_eq!(formatter.shared_strings().get("Title"), Some(&1));
        assert_eq!(formatter.shared_strings().get("Name"), Some(&2));
    }

    #[test]
    fn declaration_index_is_the_default_order() {
        struct Plain {
            first: i32,
            second: i32,
        }

        impl ExcelRecord for Plain {
            fn schema() -> RecordSchema<Self> {
                RecordSchema::new()
                    .field(Member::new("First", |p: &Plain| &p.first))
                    .field(Member::new("Second", |p: &Plain| &p.second))
            }
        }

        impl ExcelSerialize for Plain {
            fn default_serializer() -> SharedSerializer<Self> {
                Arc::new(RecordSerializer::new())
            }
        }

        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        options
            .serializer::<Plain>()
            .serialize(&mut formatter, &mut out, &Plain { first: 1, second: 2 }, &options)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<c t=\"n\" s=\"5\"><v>1</v></c><c t=\"n\" s=\"5\"><v>2</v></c>"
        );
    }

    #[test]
    fn member_level_override_bypasses_the_registry() {
        struct Masked;

        impl ExcelSerializer<String> for Masked {
            fn write_title(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                _value: &String,
                _options: &ExcelSerializerOptions,
                name: &str,
            ) -> Result<()> {
                formatter.write_string(name, sink)
            }

            fn serialize(
                &self,
                formatter: &mut ExcelFormatter,
                sink: &mut dyn Write,
                _value: &String,
                _options: &ExcelSerializerOptions,
            ) -> Result<()> {
                formatter.write_string("***", sink)
            }
        }

        struct Secretive {
            public: String,
            secret: String,
        }

        impl ExcelRecord for Secretive {
            fn schema() -> RecordSchema<Self> {
                RecordSchema::new()
                    .field(Member::new("Public", |s: &Secretive| &s.public))
                    .field(Member::new("Secret", |s: &Secretive| &s.secret).serializer(Masked))
            }
        }

        impl ExcelSerialize for Secretive {
            fn default_serializer() -> SharedSerializer<Self> {
                Arc::new(RecordSerializer::new())
            }
        }

        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        options
            .serializer::<Secretive>()
            .serialize(
                &mut formatter,
                &mut out,
                &Secretive {
                    public: "hello".to_string(),
                    secret: "hunter2".to_string(),
                },
                &options,
            )
            .unwrap();

        assert_eq!(formatter.shared_strings().get("hello"), Some(&0));
        assert_eq!(formatter.shared_strings().get("***"), Some(&1));
        assert!(formatter.shared_strings().get("hunter2").is_none());
    }
}
