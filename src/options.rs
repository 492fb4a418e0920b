//! Serialization options.
//!
//! [`ExcelSerializerOptions`] is a by-value builder: start from
//! [`new`](ExcelSerializerOptions::new) (or `Default`) and chain `with_*`
//! calls. Options carry the registry used for serializer resolution; default
//! options share the process-wide registry, and the first `with_serializer` /
//! `with_serializer_factory` / `with_dynamic` call switches the options to a
//! private registry so one session's overrides never leak into another.
//!
//! ## Examples
//!
//! ```rust
//! use excel_serializer::ExcelSerializerOptions;
//!
//! let options = ExcelSerializerOptions::new()
//!     .with_header(true)
//!     .with_auto_fit_columns(true)
//!     .with_auto_filter(true);
//! ```

use crate::registry::SerializerRegistry;
use crate::{ExcelSerialize, ExcelSerializer, Result, SharedSerializer};
use std::sync::Arc;

/// Per-session serialization settings plus the resolution registry.
#[derive(Clone)]
pub struct ExcelSerializerOptions {
    pub(crate) max_depth: usize,
    pub(crate) has_header_record: bool,
    pub(crate) header_titles: Option<Vec<String>>,
    pub(crate) auto_fit_columns: bool,
    pub(crate) auto_fit_depth: usize,
    pub(crate) auto_fit_width_max: f64,
    pub(crate) auto_filter: bool,
    pub(crate) datetime_format: String,
    pub(crate) date_format: String,
    pub(crate) time_format: String,
    pub(crate) integer_format: String,
    pub(crate) number_format: String,
    registry: Arc<SerializerRegistry>,
}

impl ExcelSerializerOptions {
    #[must_use]
    pub fn new() -> Self {
        ExcelSerializerOptions {
            max_depth: 64,
            has_header_record: false,
            header_titles: None,
            auto_fit_columns: false,
            auto_fit_depth: 100,
            auto_fit_width_max: 100.0,
            auto_filter: false,
            datetime_format: "yyyy-mm-dd hh:mm:ss".to_string(),
            date_format: "yyyy-mm-dd".to_string(),
            time_format: "hh:mm:ss".to_string(),
            integer_format: "#,##0".to_string(),
            number_format: "#,##0.00".to_string(),
            registry: SerializerRegistry::global(),
        }
    }

    /// Maximum traversal nesting before serialization fails with
    /// `MaxDepthExceeded`. A heuristic guard against runaway structures, not
    /// a cycle detector.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Emit a header row (frozen as a title pane). Titles come from
    /// [`with_header_titles`](Self::with_header_titles) when set, otherwise
    /// from the row serializer's own title pass over the first record.
    #[must_use]
    pub fn with_header(mut self, has_header_record: bool) -> Self {
        self.has_header_record = has_header_record;
        self
    }

    /// Literal header titles, overriding serializer-produced ones.
    #[must_use]
    pub fn with_header_titles(mut self, titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.header_titles = Some(titles.into_iter().map(Into::into).collect());
        self
    }

    /// Size columns to their content via the two-pass probe.
    #[must_use]
    pub fn with_auto_fit_columns(mut self, auto_fit_columns: bool) -> Self {
        self.auto_fit_columns = auto_fit_columns;
        self
    }

    /// How many leading rows the auto-fit probe pass measures.
    #[must_use]
    pub fn with_auto_fit_depth(mut self, auto_fit_depth: usize) -> Self {
        self.auto_fit_depth = auto_fit_depth;
        self
    }

    /// Upper bound on an auto-fitted column width.
    #[must_use]
    pub fn with_auto_fit_width_max(mut self, auto_fit_width_max: f64) -> Self {
        self.auto_fit_width_max = auto_fit_width_max;
        self
    }

    /// Put an auto-filter over the written range.
    #[must_use]
    pub fn with_auto_filter(mut self, auto_filter: bool) -> Self {
        self.auto_filter = auto_filter;
        self
    }

    /// Number-format code for date-time cells in the styles part.
    #[must_use]
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    /// Number-format code for date-only cells.
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Number-format code for time-only cells.
    #[must_use]
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    /// Number-format code for integer cells.
    #[must_use]
    pub fn with_integer_format(mut self, format: impl Into<String>) -> Self {
        self.integer_format = format.into();
        self
    }

    /// Number-format code for floating-point cells.
    #[must_use]
    pub fn with_number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = format.into();
        self
    }

    /// Registers a serializer override for `T` on this options instance.
    ///
    /// Switches to a private registry on first use, so the override is
    /// scoped to sessions built from these options.
    #[must_use]
    pub fn with_serializer<T, S>(mut self, serializer: S) -> Self
    where
        T: ExcelSerialize,
        S: ExcelSerializer<T> + 'static,
    {
        self.ensure_private_registry();
        self.registry.register_override::<T>(Arc::new(serializer));
        self
    }

    /// Registers a fallible serializer factory for `T`. Construction errors
    /// are deferred to the first actual use of `T`.
    #[must_use]
    pub fn with_serializer_factory<T, F>(mut self, factory: F) -> Self
    where
        T: ExcelSerialize,
        F: FnOnce() -> Result<SharedSerializer<T>>,
    {
        self.ensure_private_registry();
        self.registry.register_factory::<T, F>(factory);
        self
    }

    /// Makes `T` resolvable from [`CellValue`](crate::CellValue)-erased
    /// cells written through these options.
    #[must_use]
    pub fn with_dynamic<T: ExcelSerialize>(mut self) -> Self {
        self.ensure_private_registry();
        self.registry.register_dynamic::<T>();
        self
    }

    fn ensure_private_registry(&mut self) {
        if Arc::ptr_eq(&self.registry, &SerializerRegistry::global()) {
            self.registry = Arc::new(SerializerRegistry::new());
        }
    }

    /// Resolves the serializer for `T` through this options' registry,
    /// honoring overrides and the per-type cache.
    #[must_use]
    pub fn serializer<T: ExcelSerialize>(&self) -> SharedSerializer<T> {
        self.registry.resolve::<T>()
    }

    /// The registry backing these options.
    #[must_use]
    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }
}

impl Default for ExcelSerializerOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExcelFormatter, ExcelSerializerOptions};
    use std::io::Write;

    struct Redacted;

    impl ExcelSerializer<String> for Redacted {
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
            formatter.write_string("[redacted]", sink)
        }
    }

    #[test]
    fn defaults_share_the_global_registry() {
        let a = ExcelSerializerOptions::new();
        let b = ExcelSerializerOptions::new();
        assert!(Arc::ptr_eq(&a.registry, &b.registry));
    }

    #[test]
    fn with_serializer_detaches_from_the_global_registry() {
        let plain = ExcelSerializerOptions::new();
        let custom = ExcelSerializerOptions::new().with_serializer(Redacted);
        assert!(!Arc::ptr_eq(&plain.registry, &custom.registry));

        let mut formatter = ExcelFormatter::new(&custom);
        let mut out = Vec::new();
        custom
            .serializer::<String>()
            .serialize(&mut formatter, &mut out, &"secret".to_string(), &custom)
            .unwrap();
        assert_eq!(formatter.shared_strings().get("[redacted]"), Some(&0));

        // The plain options still resolve the built-in string serializer.
        let mut formatter = ExcelFormatter::new(&plain);
        let mut out = Vec::new();
        plain
            .serializer::<String>()
            .serialize(&mut formatter, &mut out, &"secret".to_string(), &plain)
            .unwrap();
        assert_eq!(formatter.shared_strings().get("secret"), Some(&0));
    }

    #[test]
    fn builder_chains_compose() {
        let options = ExcelSerializerOptions::new()
            .with_max_depth(8)
            .with_header(true)
            .with_header_titles(["A", "B"])
            .with_auto_fit_columns(true)
            .with_auto_fit_depth(5)
            .with_auto_fit_width_max(40.0)
            .with_auto_filter(true)
            .with_integer_format("0");
        assert_eq!(options.max_depth, 8);
        assert!(options.has_header_record);
        assert_eq!(
            options.header_titles.as_deref(),
            Some(&["A".to_string(), "B".to_string()][..])
        );
        assert!(options.auto_fit_columns);
        assert_eq!(options.auto_fit_depth, 5);
        assert_eq!(options.auto_fit_width_max, 40.0);
        assert!(options.auto_filter);
        assert_eq!(options.integer_format, "0");
    }
}
