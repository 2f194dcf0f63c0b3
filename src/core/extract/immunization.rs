//! `Immunization` extractor

use super::ExtractionContext;
use crate::core::navigate::{date_at, number_at, string_at};
use crate::domain::ImmunizationRecord;
use serde_json::Value;

/// Dose number candidates, first present value wins
///
/// `doseNumber` is the STU3 field; R4 moved it under `protocolApplied` as the
/// polymorphic `doseNumber[x]`.
const DOSE_NUMBER_PATHS: [&str; 5] = [
    "doseNumber",
    "doseNumberPositiveInt",
    "doseNumberString",
    "protocolApplied[0].doseNumberPositiveInt",
    "protocolApplied[0].doseNumber",
];

/// Maps an `Immunization` to an [`ImmunizationRecord`]
pub fn extract_immunization(resource: &Value, ctx: &ExtractionContext<'_>) -> ImmunizationRecord {
    ImmunizationRecord {
        user_id: ctx.user_id,
        resource_id: ctx.resource_id,
        vaccine_name: string_at(resource, "vaccineCode.coding[0].display"),
        occurrence_date: date_at(resource, "occurrenceDateTime"),
        dose_number: dose_number(resource),
        performer_name: string_at(resource, "performer[0].actor.resource.name"),
    }
}

fn dose_number(resource: &Value) -> Option<f64> {
    DOSE_NUMBER_PATHS
        .iter()
        .find_map(|path| number_at(resource, path))
}
