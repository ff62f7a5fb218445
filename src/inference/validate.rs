//! Input contract for prediction requests.
//!
//! This is the only gate between untrusted records and [`OrderContext`]. Values
//! are never coerced: strings are not numbers, floats are not integers, and
//! every violated constraint is reported rather than only the first.

use serde_json::{Map, Value};

use crate::common::error::{FieldError, ValidationError};

use super::domain::{OrderContext, MAX_DAY_OF_WEEK, MAX_ORDER_HOUR};

const REQUIRED: &str = "field required";

/// Validate a parsed JSON record.
pub fn validate(record: &Value) -> Result<OrderContext, ValidationError> {
    let Some(obj) = record.as_object() else {
        return Err(ValidationError::single("body", "expected a JSON object"));
    };

    let mut check = Checker::new(obj);
    let vendor_id = check.positive_id("vendor_id");
    let order_hour = check.bounded_int("order_hour", 0, Some(MAX_ORDER_HOUR));
    let day_of_week = check.bounded_int("day_of_week", 0, Some(MAX_DAY_OF_WEEK));
    let item_count = check.bounded_int("item_count", 1, None);
    let is_peak_hour = check.boolean("is_peak_hour");
    let historical_delay_avg = check.non_negative("historical_delay_avg");

    match (
        vendor_id,
        order_hour,
        day_of_week,
        item_count,
        is_peak_hour,
        historical_delay_avg,
    ) {
        (
            Some(vendor_id),
            Some(order_hour),
            Some(day_of_week),
            Some(item_count),
            Some(is_peak_hour),
            Some(historical_delay_avg),
        ) => Ok(OrderContext {
            vendor_id,
            order_hour,
            day_of_week,
            item_count,
            is_peak_hour,
            historical_delay_avg,
        }),
        // Every checker that yields `None` has recorded why.
        _ => Err(ValidationError::new(check.errors)),
    }
}

/// Parse a raw JSON body and validate it.
pub fn validate_json(body: &str) -> Result<OrderContext, ValidationError> {
    let record: Value = serde_json::from_str(body)
        .map_err(|e| ValidationError::single("body", format!("malformed JSON: {e}")))?;
    validate(&record)
}

struct Checker<'a> {
    obj: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Checker<'a> {
    fn new(obj: &'a Map<String, Value>) -> Self {
        Self {
            obj,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    fn present(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.obj.get(field);
        if value.is_none() {
            self.fail(field, REQUIRED);
        }
        value
    }

    fn positive_id(&mut self, field: &str) -> Option<u64> {
        let value = self.present(field)?;
        match value.as_u64() {
            Some(id) if id > 0 => Some(id),
            Some(_) => {
                self.fail(field, "must be a positive integer");
                None
            }
            None if value.is_i64() => {
                self.fail(field, "must be a positive integer");
                None
            }
            None => {
                self.fail(field, "must be an integer");
                None
            }
        }
    }

    fn bounded_int(&mut self, field: &str, min: u32, max: Option<u32>) -> Option<u32> {
        let value = self.present(field)?;
        let Some(raw) = value.as_i64().or_else(|| value.as_u64().map(|_| i64::MAX)) else {
            self.fail(field, "must be an integer");
            return None;
        };

        let in_range = raw >= i64::from(min) && max.map_or(true, |max| raw <= i64::from(max));
        if !in_range {
            let reason = match max {
                Some(max) => format!("must be between {min} and {max}"),
                None if min == 1 => "must be greater than 0".to_string(),
                None => format!("must be at least {min}"),
            };
            self.fail(field, reason);
            return None;
        }
        match u32::try_from(raw) {
            Ok(v) => Some(v),
            Err(_) => {
                self.fail(field, format!("must be at most {}", u32::MAX));
                None
            }
        }
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        let value = self.present(field)?;
        let flag = value.as_bool();
        if flag.is_none() {
            self.fail(field, "must be a boolean");
        }
        flag
    }

    fn non_negative(&mut self, field: &str) -> Option<f64> {
        let value = self.present(field)?;
        match value.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => Some(v),
            Some(_) => {
                self.fail(field, "must be a finite number >= 0");
                None
            }
            None => {
                self.fail(field, "must be a number");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "vendor_id": 12345,
            "order_hour": 19,
            "day_of_week": 4,
            "item_count": 3,
            "is_peak_hour": true,
            "historical_delay_avg": 5.2
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut record = valid();
        record[field] = value;
        record
    }

    fn without(fields: &[&str]) -> Value {
        let mut record = valid();
        let obj = record.as_object_mut().unwrap();
        for f in fields {
            obj.remove(*f);
        }
        record
    }

    #[test]
    fn accepts_reference_example() {
        let ctx = validate(&valid()).unwrap();
        assert_eq!(ctx.vendor_id, 12345);
        assert_eq!(ctx.order_hour, 19);
        assert_eq!(ctx.day_of_week, 4);
        assert_eq!(ctx.item_count, 3);
        assert!(ctx.is_peak_hour);
        assert_eq!(ctx.historical_delay_avg, 5.2);
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(validate(&with("order_hour", json!(0))).is_ok());
        assert!(validate(&with("order_hour", json!(23))).is_ok());
        assert!(validate(&with("day_of_week", json!(0))).is_ok());
        assert!(validate(&with("day_of_week", json!(6))).is_ok());
        assert!(validate(&with("item_count", json!(1))).is_ok());
        assert!(validate(&with("historical_delay_avg", json!(0))).is_ok());
        assert!(validate(&with("historical_delay_avg", json!(1e6))).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        for (field, value) in [
            ("order_hour", json!(25)),
            ("order_hour", json!(24)),
            ("order_hour", json!(-1)),
            ("day_of_week", json!(7)),
            ("day_of_week", json!(-3)),
            ("item_count", json!(0)),
            ("item_count", json!(-2)),
            ("historical_delay_avg", json!(-0.1)),
            ("vendor_id", json!(0)),
            ("vendor_id", json!(-5)),
        ] {
            let err = validate(&with(field, value.clone())).unwrap_err();
            assert_eq!(err.fields().collect::<Vec<_>>(), [field], "{field}={value}");
        }
    }

    #[test]
    fn huge_integers_are_out_of_range_not_wrapped() {
        let err = validate(&with("order_hour", json!(u64::MAX))).unwrap_err();
        assert_eq!(err.errors()[0].reason, "must be between 0 and 23");
        let err = validate(&with("item_count", json!(u64::MAX))).unwrap_err();
        assert_eq!(err.errors()[0].field, "item_count");
        assert_eq!(err.errors()[0].reason, format!("must be at most {}", u32::MAX));
    }

    #[test]
    fn never_coerces_types() {
        for (field, value) in [
            ("order_hour", json!("19")),
            ("order_hour", json!(19.5)),
            ("item_count", json!(null)),
            ("is_peak_hour", json!(1)),
            ("is_peak_hour", json!("true")),
            ("historical_delay_avg", json!("5.2")),
            ("vendor_id", json!("12345")),
        ] {
            assert!(validate(&with(field, value)).is_err(), "{field} accepted");
        }
    }

    #[test]
    fn integer_delay_is_a_number() {
        let ctx = validate(&with("historical_delay_avg", json!(5))).unwrap();
        assert_eq!(ctx.historical_delay_avg, 5.0);
    }

    #[test]
    fn enumerates_every_missing_field() {
        let err = validate(&without(&[
            "day_of_week",
            "item_count",
            "is_peak_hour",
            "historical_delay_avg",
        ]))
        .unwrap_err();
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            ["day_of_week", "item_count", "is_peak_hour", "historical_delay_avg"]
        );
        assert!(err.errors().iter().all(|e| e.reason == REQUIRED));
    }

    #[test]
    fn mixes_missing_and_out_of_range() {
        let mut record = without(&["day_of_week"]);
        record["order_hour"] = json!(30);
        let err = validate(&record).unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), ["order_hour", "day_of_week"]);
    }

    #[test]
    fn each_bad_field_is_reported_exactly_once() {
        let cases = [
            ("vendor_id", json!(0)),
            ("vendor_id", json!(-4)),
            ("vendor_id", json!("12345")),
            ("order_hour", json!(u64::MAX)),
            ("day_of_week", json!(1.5)),
            ("item_count", json!(0)),
            ("is_peak_hour", json!(1)),
            ("historical_delay_avg", json!(-0.1)),
            ("historical_delay_avg", json!(null)),
        ];
        for (field, value) in cases {
            let err = validate(&with(field, value.clone())).unwrap_err();
            assert_eq!(err.fields().collect::<Vec<_>>(), [field], "{field} = {value}");
        }
    }

    #[test]
    fn ignores_unknown_fields() {
        let ctx = validate(&with("coupon", json!("LUNCH10"))).unwrap();
        assert_eq!(ctx.vendor_id, 12345);
    }

    #[test]
    fn rejects_non_objects_and_bad_json() {
        let err = validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), ["body"]);

        let err = validate_json("{\"vendor_id\": ").unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), ["body"]);
    }
}
