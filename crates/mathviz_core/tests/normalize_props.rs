use mathviz_core::normalize::{
    default_normalize_table, default_retry_table, normalize, SubstitutionTable,
};
use proptest::prelude::*;

fn code_fragment() -> impl Strategy<Value = String> {
    // Plain text never ends in a letter, so a following `rac{` reads as a lost escape.
    prop_oneof![
        "[a-z0-9 ()=+.,_]{0,12}[ (=,]",
        Just(r"\frac{a}{b}".to_string()),
        Just(r"\\frac{1}{2}".to_string()),
        Just(r"\f\frac{x}{y}".to_string()),
        Just("rac{n}{m}".to_string()),
        Just("\u{0c}rac{p}{q}".to_string()),
        Just("\n    ".to_string()),
    ]
}

/// Printable Unicode without backslashes, so it can never start a pattern.
fn filler() -> impl Strategy<Value = String> {
    r"[^\\\p{C}]{0,16}"
}

fn valid_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9 ()=+.,_]{0,12}",
        Just(r"\frac{a}{b}".to_string()),
        Just(r#"MathTex(r"\sqrt{2}")"#.to_string()),
        Just("\n    ".to_string()),
    ]
}

#[test]
fn test_normalize_on_example_scene() {
    let code = "eq = MathTex(r\"\\\\frac{dx}{dt}\")\n";
    assert_eq!(normalize(code), "eq = MathTex(r\"\\frac{dx}{dt}\")\n");
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(parts in proptest::collection::vec(code_fragment(), 0..12)) {
        let code = parts.concat();
        let once = normalize(&code);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_normalize_preserves_valid_code(parts in proptest::collection::vec(valid_fragment(), 0..12)) {
        let code = parts.concat();
        prop_assert_eq!(normalize(&code), code);
    }

    #[test]
    fn prop_retry_table_leaves_valid_code(parts in proptest::collection::vec(valid_fragment(), 0..12)) {
        let table = SubstitutionTable::compile(&default_retry_table()).unwrap();
        let code = parts.concat();
        prop_assert_eq!(table.apply_once(&code), code);
    }

    #[test]
    fn prop_retry_table_leaves_no_bare_rac(parts in proptest::collection::vec(code_fragment(), 0..12)) {
        let table = SubstitutionTable::compile(&default_retry_table()).unwrap();
        let repaired = table.apply_once(&normalize(&parts.concat()));
        prop_assert!(!repaired.contains('\u{0c}'), "form feed left in output");
        prop_assert_eq!(repaired.matches("rac{").count(), repaired.matches(r"\frac{").count());
    }

    #[test]
    fn prop_normalize_only_rewrites_patterns(
        pieces in proptest::collection::vec((filler(), 0..2usize), 0..8),
        tail in filler(),
    ) {
        let table = default_normalize_table();
        let mut code = String::new();
        let mut expected = String::new();
        for (fill, index) in &pieces {
            code.push_str(fill);
            code.push_str(&table[*index].find);
            expected.push_str(fill);
            expected.push_str(&table[*index].replace);
        }
        code.push_str(&tail);
        expected.push_str(&tail);

        prop_assert_eq!(normalize(&code), expected);
    }

    #[test]
    fn prop_normalize_leaves_unicode_text_alone(text in filler()) {
        prop_assert_eq!(normalize(&text), text);
    }
}
