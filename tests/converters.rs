use chrono::{NaiveDate, TimeZone, Utc};
use csv_shape::convert;
use csv_shape::{ConvertError, Converter, ConverterRegistry, CsvShapeError, TypeError, Value};
use proptest::prelude::*;

fn s(text: &str) -> Value {
    Value::from(text)
}

#[test]
fn default_registry_lists_its_types() {
    let registry = ConverterRegistry::new();
    let types = registry.types();
    for key in ["integer", "integer!", "decimal_or_zero", "strip", "header_column", "sha256", "hex"] {
        assert!(types.contains(&key), "missing {key}");
    }
    assert!(registry.has(" Integer! "));
}

#[test]
fn register_unregister_and_reset() -> anyhow::Result<()> {
    let mut registry = ConverterRegistry::new();
    let twice = Converter::new(|v: Value| {
        Ok(v.as_i64().map(|n| Value::Integer(n * 2)).unwrap_or(Value::Null))
    });

    registry.register("Twice", twice.clone())?;
    assert_eq!(registry.apply(Value::Integer(21), "twice")?, Value::Integer(42));
    assert!(matches!(
        registry.register("twice", twice),
        Err(TypeError::TypeExists(_))
    ));

    registry.unregister("integer")?;
    assert!(matches!(registry.lookup("integer"), Err(TypeError::UnknownType(_))));
    assert!(matches!(registry.unregister("integer"), Err(TypeError::UnknownType(_))));

    registry.reset();
    assert!(registry.has("integer"));
    assert!(!registry.has("twice"));
    Ok(())
}

#[test]
fn apply_unknown_key_is_a_type_error() {
    let registry = ConverterRegistry::new();
    assert!(matches!(
        registry.apply(s("1"), "money"),
        Err(CsvShapeError::Type(TypeError::UnknownType(key))) if key == "money"
    ));
}

#[test]
fn strict_and_safe_integers() -> anyhow::Result<()> {
    assert_eq!(convert::integer(s(" 42 "))?, Value::Integer(42));
    assert_eq!(convert::integer(s("abc"))?, Value::Null);
    assert_eq!(convert::integer(Value::Null)?, Value::Null);
    assert!(matches!(convert::strict_integer(s("abc")), Err(ConvertError::Invalid { .. })));
    assert!(matches!(convert::strict_integer(Value::Null), Err(ConvertError::Null { .. })));
    assert_eq!(convert::integer_or_zero(s("12abc"))?, Value::Integer(12));
    assert_eq!(convert::integer_or_zero(s("abc"))?, Value::Integer(0));
    assert_eq!(convert::integer_or_zero(Value::Null)?, Value::Integer(0));
    Ok(())
}

#[test]
fn decimals() -> anyhow::Result<()> {
    assert_eq!(convert::decimal(s("1.25"))?, Value::Decimal(1.25));
    assert_eq!(convert::decimal(s("NaN"))?, Value::Null);
    assert!(convert::strict_decimal(s("1,5")).is_err());
    assert_eq!(convert::decimal_or_zero(s("1.5kg"))?, Value::Decimal(1.5));
    assert_eq!(convert::decimal_or_zero(s("-3.2.1"))?, Value::Decimal(-3.2));
    assert_eq!(convert::decimal_or_zero(s("kg"))?, Value::Decimal(0.0));
    assert_eq!(Value::Decimal(3.0).to_string(), "3.0");
    Ok(())
}

#[test]
fn dates_and_datetimes() -> anyhow::Result<()> {
    let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(convert::date(s("2024-03-09"))?, Value::Date(day));
    assert_eq!(convert::date(s("2024/03/09"))?, Value::Date(day));
    assert_eq!(convert::date(s("9 March 2024"))?, Value::Date(day));
    assert_eq!(convert::date(s("2024-03-09T10:00:00Z"))?, Value::Date(day));
    assert_eq!(convert::date(s("not a date"))?, Value::Null);
    assert!(convert::strict_date(s("2024-13-40")).is_err());

    let utc = Utc.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap().fixed_offset();
    assert_eq!(convert::datetime(s("2024-03-09 10:30:00"))?, Value::DateTime(utc));
    assert_eq!(convert::datetime(s("2024-03-09T12:30:00+02:00"))?, Value::DateTime(utc));
    let midnight = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap().fixed_offset();
    assert_eq!(convert::datetime(s("2024-03-09"))?, Value::DateTime(midnight));
    assert_eq!(
        convert::datetime(s("2024-03-09 10:30:00"))?.to_string(),
        "2024-03-09 10:30:00 +0000"
    );
    Ok(())
}

#[test]
fn booleans() -> anyhow::Result<()> {
    for truthy in ["t", "1", "Y", "true", "TRUE"] {
        assert_eq!(convert::boolean(s(truthy))?, Value::Boolean(true), "{truthy}");
    }
    for falsy in ["f", "0", "n", "false", "FALSE"] {
        assert_eq!(convert::boolean(s(falsy))?, Value::Boolean(false), "{falsy}");
    }
    assert_eq!(convert::boolean(s("maybe"))?, Value::Null);
    assert!(convert::strict_boolean(s("maybe")).is_err());
    Ok(())
}

#[test]
fn string_converters() -> anyhow::Result<()> {
    assert_eq!(convert::strip(s("  ABC "))?, s("ABC"));
    assert_eq!(convert::downcase(s("ABC"))?, s("abc"));
    assert_eq!(convert::upcase(s("abc"))?, s("ABC"));
    assert_eq!(convert::symbol(s("abc"))?, Value::Symbol("abc".into()));
    assert_eq!(convert::upcase(Value::Null)?, Value::Null);
    assert!(convert::strict_upcase(Value::Null).is_err());
    assert!(convert::strict_strip(Value::Null).is_err());
    assert_eq!(convert::blank(s("x"))?, s(""));
    assert_eq!(convert::nil(s("x"))?, Value::Null);
    assert_eq!(
        convert::header_column(s("First Name"))?,
        Value::Symbol("first_name".into())
    );
    Ok(())
}

#[test]
fn hashing_converters() -> anyhow::Result<()> {
    assert_eq!(
        convert::sha256(s("abc"))?,
        s("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
    let a = convert::random_hex(s("abc"))?;
    let b = convert::random_hex(s("abc"))?;
    assert_eq!(a.as_str().map(str::len), Some(32));
    assert_ne!(a, b);
    Ok(())
}

proptest! {
    #[test]
    fn non_integers_are_null_or_rejected(text in "[a-zA-Z_ .]{1,12}") {
        prop_assert_eq!(convert::integer(Value::from(text.as_str())).unwrap(), Value::Null);
        prop_assert!(convert::strict_integer(Value::from(text.as_str())).is_err());
    }

    #[test]
    fn integers_parse_back(n in any::<i64>()) {
        prop_assert_eq!(convert::integer(Value::from(n.to_string())).unwrap(), Value::Integer(n));
    }
}
