#[cfg(test)]
mod tests {
    use keel_core::{AsValue, Value, key_value};
    use rust_decimal::Decimal;
    use std::{
        collections::HashSet,
        hash::{DefaultHasher, Hash, Hasher},
    };
    use time::macros::{date, datetime, time};
    use uuid::Uuid;

    fn hash(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Int32(None), Value::Null);
        assert_eq!(Value::Int32(None), Value::Int32(None));
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some(String::new())).is_null());
        assert_eq!(Value::default(), Value::Null);
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(Some(false)));
        assert_ne!(val, Value::Varchar(Some("true".into())));
        assert!(bool::try_from_value(val).unwrap());
        assert!(bool::try_from_value(Value::Int32(Some(1))).is_err());
    }

    #[test]
    fn value_integers() {
        let val = (-2147483648i32).as_value();
        assert_eq!(val, Value::Int32(Some(i32::MIN)));
        assert_eq!(i32::try_from_value(val.clone()).unwrap(), i32::MIN);
        assert_eq!(i64::try_from_value(val).unwrap(), i32::MIN as i64);
        assert_eq!(i32::try_from_value(Value::Int64(Some(77))).unwrap(), 77);
        let error = i32::try_from_value(Value::Int64(Some(i64::MAX))).unwrap_err();
        assert!(error.to_string().contains("out of range for i32"));
        assert_eq!(
            i64::try_from_value(Value::Decimal(Some(Decimal::new(42, 0)))).unwrap(),
            42
        );
        assert!(i64::try_from_value(Value::Decimal(Some(Decimal::new(425, 1)))).is_err());
        assert!(i64::try_from_value(Value::Float64(Some(1.0))).is_err());
        assert!(i32::try_from_value(Value::Null).is_err());
        assert_eq!(Value::Int32(Some(5)).as_i64(), Some(5));
        assert_eq!(Value::Varchar(Some("5".into())).as_i64(), None);
    }

    #[test]
    fn value_float_and_decimal() {
        assert_eq!(f64::try_from_value(Value::Int64(Some(3))).unwrap(), 3.0);
        assert_eq!(
            f64::try_from_value(Value::Decimal(Some(Decimal::new(125, 2)))).unwrap(),
            1.25
        );
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("12.50".into()))).unwrap(),
            Decimal::new(1250, 2)
        );
        assert_eq!(
            Decimal::try_from_value(Value::Int32(Some(7))).unwrap(),
            Decimal::new(7, 0)
        );
        assert!(Decimal::try_from_value(Value::Varchar(Some("twelve".into()))).is_err());
        assert!(Decimal::try_from_value(Value::Float64(Some(f64::NAN))).is_err());
        assert_eq!(Value::Float64(Some(f64::NAN)), Value::Float64(Some(f64::NAN)));
    }

    #[test]
    fn value_text_and_uuid() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        let uuid = Uuid::parse_str("3b1f6c2e-8a4d-4f7b-9c0e-5d2a1b3c4d5e").unwrap();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).unwrap(),
            uuid
        );
        assert!(Uuid::try_from_value(Value::Varchar(Some("nope".into()))).is_err());
        assert_eq!(uuid.as_value(), Value::Uuid(Some(uuid)));
    }

    #[test]
    fn value_time() {
        let date = date!(2025 - 01 - 31);
        assert_eq!(date.as_value(), Value::Date(Some(date)));
        assert_eq!(time!(12:30).as_value(), Value::Time(Some(time!(12:30))));
        let local = datetime!(2025-01-31 10:00);
        let utc = datetime!(2025-01-31 12:00 +2);
        assert_eq!(
            time::PrimitiveDateTime::try_from_value(Value::TimestampWithTimezone(Some(utc)))
                .unwrap(),
            local
        );
        assert_eq!(
            time::OffsetDateTime::try_from_value(Value::Timestamp(Some(local))).unwrap(),
            local.assume_utc()
        );
        assert!(time::Date::try_from_value(Value::Timestamp(Some(local))).is_err());
    }

    #[test]
    fn value_option_and_list() {
        assert_eq!(Option::<i64>::as_empty_value(), Value::Int64(None));
        assert_eq!(Some(4i64).as_value(), Value::Int64(Some(4)));
        assert_eq!(None::<i64>.as_value(), Value::Int64(None));
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::try_from_value(Value::Int64(None)).unwrap(), None);
        assert_eq!(Option::<i64>::default_value(), Some(None));
        assert_eq!(i64::default_value(), None);

        let list = vec![1i32, 2].as_value();
        assert_eq!(
            list,
            Value::List(
                Some(vec![Value::Int32(Some(1)), Value::Int32(Some(2))]),
                Box::new(Value::Int32(None))
            )
        );
        assert_ne!(
            Value::List(None, Box::new(Value::Int32(None))),
            Value::List(None, Box::new(Value::Int64(None)))
        );
        assert_eq!(Vec::<i64>::try_from_value(list).unwrap(), [1, 2]);
        assert!(Vec::<i64>::try_from_value(Value::Int64(Some(1))).is_err());
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Int64(None).to_string(), "NULL");
        assert_eq!(Value::Varchar(Some("a".into())).to_string(), "'a'");
        assert_eq!(Value::Boolean(Some(false)).to_string(), "false");
        assert_eq!(vec![1i64, 2].as_value().to_string(), "[1, 2]");
    }

    #[test]
    fn value_hash() {
        assert_eq!(
            hash(&Value::Int64(Some(1))),
            hash(&Value::Int64(Some(1)))
        );
        let keys = [
            Value::Int64(Some(1)),
            Value::Int32(Some(1)),
            Value::Int64(Some(1)),
            Value::Varchar(Some("1".into())),
        ]
        .into_iter()
        .collect::<HashSet<_>>();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn value_keys() {
        assert!(Value::Int32(Some(0)).is_unset_key());
        assert!(Value::Int64(None).is_unset_key());
        assert!(!Value::Int64(Some(3)).is_unset_key());
        assert!(!Value::Varchar(Some(String::new())).is_unset_key());
        assert!(Value::Int32(None).is_integer());
        assert!(!Value::Decimal(None).is_integer());
        assert_eq!(
            key_value(&Value::Int32(None), 9).unwrap(),
            Value::Int32(Some(9))
        );
        assert!(key_value(&Value::Int32(None), i64::MAX).is_err());
        assert!(key_value(&Value::Varchar(None), 1).is_err());
    }
}
