//! Inbound event → normalized record

use crate::classification::Classifier;
use crate::error::NormalizeError;
use crate::models::{InboundEvent, NormalizedRecord};

/// Derive the downstream record for one event
///
/// Unknown part codes fall back to the classifier default. A missing or
/// mistyped `device_id` or a missing `event_type` is an error and yields
/// no record; any `event_type` other than `"1"`/`"2"` clears both flags.
pub fn normalize(
    event: &InboundEvent,
    classifier: &dyn Classifier,
) -> Result<NormalizedRecord, NormalizeError> {
    let part_code = event.device_id()?;
    let (fire_alarm, error_status) = event.event_type()?.flags();

    Ok(NormalizedRecord {
        part_type: classifier.classify(&part_code),
        part_code,
        time: event.post_time.clone(),
        fire_alarm,
        error_status,
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::classification::ClassificationMap;
    use serde_json::{json, Value};

    fn event(data: Value) -> InboundEvent {
        InboundEvent {
            data: data.as_object().cloned().unwrap(),
            data_code: "F01".to_string(),
            post_time: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn table() -> ClassificationMap {
        ClassificationMap::from_entries([("341", 1), ("77", 5)], 0)
    }

    #[test]
    fn test_fire_alarm_known_code() {
        let record = normalize(&event(json!({"device_id": "341", "event_type": "1"})), &table())
            .unwrap();
        assert_eq!(
            record,
            NormalizedRecord {
                part_type: 1,
                part_code: "341".to_string(),
                time: "2024-01-01T00:00:00Z".to_string(),
                fire_alarm: 1,
                error_status: 0,
            }
        );
    }

    #[test]
    fn test_fault_event() {
        let record = normalize(&event(json!({"device_id": "341", "event_type": "2"})), &table())
            .unwrap();
        assert_eq!((record.fire_alarm, record.error_status), (0, 1));
        assert_eq!(record.part_type, 1);
    }

    #[test]
    fn test_unknown_code_uses_default() {
        let record = normalize(&event(json!({"device_id": "999", "event_type": "1"})), &table())
            .unwrap();
        assert_eq!(record.part_type, 0);

        let strict = ClassificationMap::new(-1);
        let record = normalize(&event(json!({"device_id": "999", "event_type": "1"})), &strict)
            .unwrap();
        assert_eq!(record.part_type, -1);
    }

    #[test]
    fn test_other_event_types_clear_flags() {
        for event_type in [json!("0"), json!("3"), json!(""), json!("alarm"), json!(7)] {
            let record = normalize(
                &event(json!({"device_id": "341", "event_type": event_type})),
                &table(),
            )
            .unwrap();
            assert_eq!((record.fire_alarm, record.error_status), (0, 0));
        }
    }

    #[test]
    fn test_integer_device_id() {
        let record =
            normalize(&event(json!({"device_id": 77, "event_type": "1"})), &table()).unwrap();
        assert_eq!(record.part_code, "77");
        assert_eq!(record.part_type, 5);
        assert_eq!(record.fire_alarm, 1);
    }

    #[test]
    fn test_non_string_event_type_clears_flags() {
        for event_type in [json!(1), json!(2), json!(null), json!(true), json!({}), json!(1.0)] {
            let record = normalize(
                &event(json!({"device_id": "341", "event_type": event_type.clone()})),
                &table(),
            )
            .unwrap();
            assert_eq!(
                (record.fire_alarm, record.error_status),
                (0, 0),
                "event_type {}",
                event_type
            );
            assert_eq!(record.part_type, 1);
        }
    }

    #[test]
    fn test_missing_event_type_fails() {
        let result = normalize(&event(json!({"device_id": "341"})), &table());
        assert_eq!(
            result.unwrap_err(),
            NormalizeError::MissingField("event_type".to_string())
        );
    }

    #[test]
    fn test_bad_device_id_fails() {
        assert!(matches!(
            normalize(&event(json!({"event_type": "1"})), &table()),
            Err(NormalizeError::MissingField(_))
        ));
        assert!(matches!(
            normalize(&event(json!({"device_id": null, "event_type": "1"})), &table()),
            Err(NormalizeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_extra_data_fields_ignored() {
        let record = normalize(
            &event(json!({"device_id": "341", "event_type": "1", "loop": 3, "zone": "B2"})),
            &table(),
        )
        .unwrap();
        assert_eq!(record.part_code, "341");
    }
}
