//! Property-based tests - pragmatic approach covering the invariants that
//! matter across arbitrary inputs: string-pool identity, column naming,
//! depth-guard arithmetic and cell markup shape.

use excel_serializer::{column_name, ExcelFormatter, ExcelSerializerOptions};
use proptest::prelude::*;

/// Inverse of `column_name`, for round-trip checking.
fn column_index(name: &str) -> usize {
    name.bytes()
        .fold(0, |acc, b| acc * 26 + usize::from(b - b'A') + 1)
}

fn small_strings() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,3}", 0..40)
}

proptest! {
    #[test]
    fn prop_shared_strings_index_by_first_occurrence(values in small_strings()) {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        for value in &values {
            formatter.write_string(value, &mut out).unwrap();
        }

        let mut expected: Vec<&str> = Vec::new();
        for value in &values {
            if !expected.contains(&value.as_str()) {
                expected.push(value);
            }
        }

        let actual: Vec<&str> = formatter.shared_strings().keys().map(String::as_str).collect();
        prop_assert_eq!(actual, expected);
        for (index, (_, &slot)) in formatter.shared_strings().iter().enumerate() {
            prop_assert_eq!(slot, index);
        }
    }

    #[test]
    fn prop_probing_never_perturbs_string_identity(values in small_strings()) {
        // A counting formatter with interleaved clears must assign the same
        // pool as a plain single-pass formatter.
        let plain_options = ExcelSerializerOptions::new();
        let mut plain = ExcelFormatter::new(&plain_options);
        let counting_options = ExcelSerializerOptions::new().with_auto_fit_columns(true);
        let mut counting = ExcelFormatter::new(&counting_options);
        let mut out = Vec::new();

        for value in &values {
            plain.write_string(value, &mut out).unwrap();
        }
        for value in &values {
            counting.write_string(value, &mut out).unwrap();
            counting.clear();
        }
        counting.stop_counting_char_length();
        for value in &values {
            counting.write_string(value, &mut out).unwrap();
        }

        let plain_keys: Vec<&String> = plain.shared_strings().keys().collect();
        let counting_keys: Vec<&String> = counting.shared_strings().keys().collect();
        prop_assert_eq!(plain_keys, counting_keys);
    }

    #[test]
    fn prop_column_names_round_trip(index in 1_usize..100_000) {
        let name = column_name(index);
        prop_assert!(!name.is_empty());
        prop_assert!(name.bytes().all(|b| b.is_ascii_uppercase()));
        prop_assert_eq!(column_index(&name), index);
    }

    #[test]
    fn prop_depth_guard_trips_exactly_at_the_limit(
        max_depth in 1_usize..32,
        entries in 1_usize..48,
    ) {
        let options = ExcelSerializerOptions::new().with_max_depth(max_depth);
        let mut formatter = ExcelFormatter::new(&options);

        let mut failed_at = None;
        for depth in 1..=entries {
            if formatter.enter_and_validate().is_err() {
                failed_at = Some(depth);
                break;
            }
        }

        if entries >= max_depth {
            prop_assert_eq!(failed_at, Some(max_depth));
        } else {
            prop_assert_eq!(failed_at, None);
        }
    }

    #[test]
    fn prop_integer_cells_carry_the_integer_style(n in any::<i64>()) {
        let options = ExcelSerializerOptions::new();
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();
        formatter.write_integer(&n.to_string(), &mut out).unwrap();
        prop_assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("<c t=\"n\" s=\"5\"><v>{n}</v></c>")
        );
    }

    #[test]
    fn prop_column_lengths_track_the_maximum(words in prop::collection::vec("[a-z]{1,12}", 1..20)) {
        let options = ExcelSerializerOptions::new().with_auto_fit_columns(true);
        let mut formatter = ExcelFormatter::new(&options);
        let mut out = Vec::new();

        for word in &words {
            formatter.write_string(word, &mut out).unwrap();
            formatter.clear();
        }

        let longest = words.iter().map(|w| w.len()).max().unwrap();
        prop_assert_eq!(formatter.column_lengths().get(&0), Some(&longest));
    }
}
