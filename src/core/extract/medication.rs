//! `MedicationDispense` extractor

use super::ExtractionContext;
use crate::core::age::age_at_event;
use crate::core::navigate::{date_at, number_at, string_at};
use crate::domain::MedicationRecord;
use serde_json::Value;

/// Maps a `MedicationDispense` to a [`MedicationRecord`]
///
/// - code/name: `medicationReference.resource.code.coding[0]`
/// - pharmacy: `performer[0].actor.resource.name`
/// - dispense date: date portion of `whenPrepared`, absent when missing
/// - days supply: `daysSupply.value`
/// - age: derived from the subject's national-ID identifier and the dispense date
pub fn extract_medication(resource: &Value, ctx: &ExtractionContext<'_>) -> MedicationRecord {
    let dispense_date = date_at(resource, "whenPrepared");

    MedicationRecord {
        user_id: ctx.user_id,
        resource_id: ctx.resource_id,
        medication_code: string_at(resource, "medicationReference.resource.code.coding[0].code"),
        medication_name: string_at(
            resource,
            "medicationReference.resource.code.coding[0].display",
        ),
        pharmacy_name: string_at(resource, "performer[0].actor.resource.name"),
        dispense_date,
        days_supply: number_at(resource, "daysSupply.value"),
        age: age_at_event(resource, dispense_date, ctx.national_id_marker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientId, ResourceId};
    use chrono::NaiveDate;
    use serde_json::json;

    fn ctx() -> ExtractionContext<'static> {
        ExtractionContext::new(PatientId::new(4), ResourceId::new(40), "resident-registration")
    }

    fn full_dispense() -> Value {
        json!({
            "resourceType": "MedicationDispense",
            "id": "md-1",
            "medicationReference": {"resource": {
                "resourceType": "Medication",
                "code": {"coding": [{"system": "urn:kr:edi", "code": "641900090", "display": "Tylenol 500mg"}]}
            }},
            "subject": {"resource": {
                "resourceType": "Patient",
                "identifier": [{"system": "urn:kr:resident-registration-number", "value": "900101-1"}]
            }},
            "performer": [{"actor": {"resource": {"resourceType": "Organization", "name": "Seoul Pharmacy"}}}],
            "whenPrepared": "2024-06-15T10:21:00+09:00",
            "daysSupply": {"value": 3, "unit": "days"}
        })
    }

    #[test]
    fn test_extract_full_dispense() {
        let record = extract_medication(&full_dispense(), &ctx());

        assert_eq!(record.user_id, PatientId::new(4));
        assert_eq!(record.resource_id, ResourceId::new(40));
        assert_eq!(record.medication_code.as_deref(), Some("641900090"));
        assert_eq!(record.medication_name.as_deref(), Some("Tylenol 500mg"));
        assert_eq!(record.pharmacy_name.as_deref(), Some("Seoul Pharmacy"));
        assert_eq!(record.dispense_date, NaiveDate::from_ymd_opt(2024, 6, 15));
        assert_eq!(record.days_supply, Some(3.0));
        assert_eq!(record.age, Some(34));
    }

    #[test]
    fn test_missing_performer_yields_absent_pharmacy() {
        let mut resource = full_dispense();
        resource.as_object_mut().unwrap().remove("performer");
        let record = extract_medication(&resource, &ctx());
        assert!(record.pharmacy_name.is_none());
        assert_eq!(record.medication_code.as_deref(), Some("641900090"));

        resource["performer"] = json!([]);
        assert!(extract_medication(&resource, &ctx()).pharmacy_name.is_none());
    }

    #[test]
    fn test_missing_when_prepared_yields_absent_date_and_age() {
        let mut resource = full_dispense();
        resource.as_object_mut().unwrap().remove("whenPrepared");
        let record = extract_medication(&resource, &ctx());
        assert!(record.dispense_date.is_none());
        assert!(record.age.is_none());
    }

    #[test]
    fn test_referenced_medication_without_inline_resource() {
        let resource = json!({
            "resourceType": "MedicationDispense",
            "medicationReference": {"reference": "Medication/123"},
            "whenPrepared": "2024-01-01"
        });
        let record = extract_medication(&resource, &ctx());
        assert!(record.medication_code.is_none());
        assert!(record.medication_name.is_none());
        assert!(record.days_supply.is_none());
        assert!(record.age.is_none());
        assert_eq!(record.dispense_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_empty_resource() {
        let record = extract_medication(&json!({}), &ctx());
        assert_eq!(
            record,
            MedicationRecord {
                user_id: PatientId::new(4),
                resource_id: ResourceId::new(40),
                medication_code: None,
                medication_name: None,
                pharmacy_name: None,
                dispense_date: None,
                days_supply: None,
                age: None,
            }
        );
    }
}
