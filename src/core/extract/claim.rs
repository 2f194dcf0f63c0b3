//! `ExplanationOfBenefit` extractor

use super::ExtractionContext;
use crate::core::navigate::{date_at, find_in, number_at, string_at};
use crate::domain::ClaimRecord;
use serde_json::Value;

const TOTAL_CATEGORY: &str = "category.coding[0].code";
const COPAY: &str = "copay";
const BENEFIT: &str = "benefit";

/// Maps an `ExplanationOfBenefit` to a [`ClaimRecord`]
///
/// The `total` array is scanned for the `copay` and `benefit` categories;
/// other categories are ignored.
pub fn extract_claim(resource: &Value, ctx: &ExtractionContext<'_>) -> ClaimRecord {
    let claim_type = string_at(resource, "type.coding[0].code")
        .or_else(|| string_at(resource, "type.coding[0].display"));

    let claim_date =
        date_at(resource, "billablePeriod.start").or_else(|| date_at(resource, "created"));

    ClaimRecord {
        user_id: ctx.user_id,
        resource_id: ctx.resource_id,
        claim_type,
        claim_date,
        copay_amount: total_amount(resource, COPAY),
        benefit_amount: total_amount(resource, BENEFIT),
    }
}

fn total_amount(resource: &Value, category: &str) -> Option<f64> {
    find_in(resource, "total", TOTAL_CATEGORY, category)
        .and_then(|entry| number_at(entry, "amount.value"))
}
