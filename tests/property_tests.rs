/// Property-based tests using proptest
/// Tests invariants of the validation helpers and the field normalizer
use lead_relay_api::relay::{deal_title, select_stage};
use lead_relay_api::crm_models::Stage;
use lead_relay_api::validation::{is_valid_email, validate_br_phone};
use lead_relay_api::webhook_models::{normalize, ContactRecord, SERIES_NOT_INFORMED};
use proptest::prelude::*;
use serde_json::{Map, Value};

// Property: Email validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }
}

// Property: Phone validation should never panic
proptest! {
    #[test]
    fn phone_validation_never_panics(phone in "\\PC*") {
        let _ = validate_br_phone(&phone);
    }

    #[test]
    fn valid_br_phones_normalize_to_e164(ddd in 11u8..=99u8, number in 900000000u32..=999999999u32) {
        let phone = format!("{}{}", ddd, number);
        let (valid, normalized) = validate_br_phone(&phone);
        if valid {
            prop_assert!(normalized.starts_with("+55"));
            prop_assert!(normalized[1..].chars().all(|c| c.is_ascii_digit()));
        }
    }
}

// Property: Normalization tolerates arbitrary field maps
proptest! {
    #[test]
    fn normalize_never_panics(
        entries in prop::collection::vec(("[a-z:_0-9]{1,30}", "\\PC{0,40}"), 0..15)
    ) {
        let mut data = Map::new();
        for (key, value) in entries {
            data.insert(key, Value::String(value));
        }
        let record = normalize(&data);
        // Series is always populated, sentinel included
        prop_assert!(!record.series_of_interest.is_empty());
    }

    #[test]
    fn unknown_identifiers_yield_sentinel_series(
        keys in prop::collection::vec("[a-z]{1,10}", 0..10)
    ) {
        let mut data = Map::new();
        for key in keys {
            // Prefix so no key collides with a known identifier
            data.insert(format!("zz_{}", key), Value::String("x".to_string()));
        }
        prop_assert_eq!(normalize(&data).series_of_interest, SERIES_NOT_INFORMED);
    }
}

// Property: CPF normalization keeps digits in order
proptest! {
    #[test]
    fn cpf_digit_extraction_preserves_order(cpf in "[0-9]{11}") {
        let formatted = format!("{}.{}.{}-{}",
            &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11]);

        let mut data = Map::new();
        data.insert("field:cpf".to_string(), Value::String(formatted));

        prop_assert_eq!(normalize(&data).cpf, Some(cpf));
    }
}

// Property: Stage selection without a preferred name always picks the minimum position
proptest! {
    #[test]
    fn default_stage_selection_is_minimum_position(
        positions in prop::collection::vec(0i64..1000, 1..20)
    ) {
        let stages: Vec<Stage> = positions
            .iter()
            .enumerate()
            .map(|(i, pos)| Stage {
                id: format!("s{}", i),
                name: format!("Stage {}", i),
                position: *pos,
            })
            .collect();

        let selected = select_stage(&stages, None).unwrap();
        let min = positions.iter().min().unwrap();
        prop_assert_eq!(selected.position, *min);
    }
}

// Property: Deal titles always start with the prefix
proptest! {
    #[test]
    fn deal_title_always_starts_with_prefix(
        prefix in "[A-Za-z ]{1,20}",
        student in proptest::option::of("[A-Za-z]{1,20}"),
        guardian in proptest::option::of("[A-Za-z]{1,20}")
    ) {
        let record = ContactRecord {
            name: guardian,
            student_name: student,
            ..Default::default()
        };
        let title = deal_title(&prefix, &record);
        prop_assert!(title.starts_with(&prefix));
    }
}
