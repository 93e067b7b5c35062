//! Opportunity schema validator
//!
//! Turns an untyped JSON body into a normalized [`OpportunityData`] (or a
//! [`PartialOpportunityData`] for updates). Every rule is evaluated; the
//! caller gets one [`FieldError`] per failing field or cross-field rule.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::models::opportunity::{
    ClosedSet, DEFAULT_COUNTRY, Financials, InvestmentTerms, OpportunityData,
    PartialOpportunityData, PropertyAddress, Strategy, Timeline, Visibility,
};
pub use crate::models::validation::FieldError;

/// Validate a complete opportunity record against the current time
pub fn validate(candidate: &Value) -> Result<OpportunityData, Vec<FieldError>> {
    validate_at(candidate, Utc::now())
}

/// Validate a complete opportunity record; `now` is the reference instant
/// for the fundraising deadline.
pub fn validate_at(candidate: &Value, now: DateTime<Utc>) -> Result<OpportunityData, Vec<FieldError>> {
    let obj = root_object(candidate)?;
    let mut v = Validation::new(now, Presence::Required);
    let fields = v.read_fields(obj);
    check_cross_field(
        fields.minimum_investment,
        fields.maximum_investment,
        fields.target_raise_amount,
        &mut v.errors,
    );

    if !v.errors.is_empty() {
        return Err(v.errors);
    }
    into_complete(fields).ok_or_else(|| vec![FieldError::new("", "Incomplete record")])
}

/// Validate a partial record (draft saves, updates) against the current time
pub fn validate_partial(candidate: &Value) -> Result<PartialOpportunityData, Vec<FieldError>> {
    validate_partial_at(candidate, Utc::now())
}

/// Same per-field rules as [`validate_at`], but every field is optional and
/// no defaults are applied.
pub fn validate_partial_at(
    candidate: &Value,
    now: DateTime<Utc>,
) -> Result<PartialOpportunityData, Vec<FieldError>> {
    let obj = root_object(candidate)?;
    let mut v = Validation::new(now, Presence::Optional);
    let fields = v.read_fields(obj);
    check_cross_field(
        fields.minimum_investment,
        fields.maximum_investment,
        fields.target_raise_amount,
        &mut v.errors,
    );

    if v.errors.is_empty() {
        Ok(fields)
    } else {
        Err(v.errors)
    }
}

/// Re-run the cross-field invariants on an already typed record, e.g. after
/// merging an update into the stored version.
pub fn check_invariants(data: &OpportunityData) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_cross_field(
        Some(data.terms.minimum_investment),
        data.terms.maximum_investment,
        Some(data.terms.target_raise_amount),
        &mut errors,
    );
    errors
}

fn root_object(candidate: &Value) -> Result<&Map<String, Value>, Vec<FieldError>> {
    candidate.as_object().ok_or_else(|| {
        vec![FieldError::new(
            "",
            format!("Expected object, received {}", type_name(candidate)),
        )]
    })
}

/// Cross-field invariants, each reported on its own path
fn check_cross_field(
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
    target: Option<Decimal>,
    errors: &mut Vec<FieldError>,
) {
    if let (Some(min), Some(max)) = (minimum, maximum) {
        if max < min {
            errors.push(FieldError::new(
                "maximum_investment",
                "Maximum investment must be greater than or equal to minimum investment",
            ));
        }
    }
    if let (Some(min), Some(target)) = (minimum, target) {
        if target < min {
            errors.push(FieldError::new(
                "target_raise_amount",
                "Target raise amount must be greater than or equal to minimum investment",
            ));
        }
    }
}

/// Assemble the complete record, applying defaults. Returns `None` only if a
/// required field is missing, which the per-field pass already reported.
fn into_complete(f: PartialOpportunityData) -> Option<OpportunityData> {
    Some(OpportunityData {
        opportunity_name: f.opportunity_name?,
        description: f.description,
        status: f.status.unwrap_or_default(),
        property_address: f.property_address?,
        property_type: f.property_type?,
        property_condition: f.property_condition,
        financials: Financials {
            total_project_cost: f.total_project_cost?,
            equity_requirement: f.equity_requirement?,
            debt_amount: f.debt_amount,
            debt_type: f.debt_type,
            loan_to_cost_ratio: f.loan_to_cost_ratio,
            loan_to_value_ratio: f.loan_to_value_ratio,
        },
        terms: InvestmentTerms {
            minimum_investment: f.minimum_investment?,
            maximum_investment: f.maximum_investment,
            target_raise_amount: f.target_raise_amount?,
            projected_irr: f.projected_irr,
            projected_return_multiple: f.projected_return_multiple,
            cash_on_cash_return: f.cash_on_cash_return,
            preferred_return_rate: f.preferred_return_rate,
        },
        strategy: Strategy {
            investment_strategy: f.investment_strategy,
            business_plan: f.business_plan,
            exit_strategy: f.exit_strategy,
        },
        timeline: Timeline {
            fundraising_deadline: f.fundraising_deadline,
            expected_closing_date: f.expected_closing_date,
            construction_start_date: f.construction_start_date,
            construction_completion_date: f.construction_completion_date,
            stabilization_date: f.stabilization_date,
            projected_exit_date: f.projected_exit_date,
        },
        visibility: Visibility {
            public_listing: f.public_listing.unwrap_or(false),
            featured_listing: f.featured_listing.unwrap_or(false),
            accredited_only: f.accredited_only.unwrap_or(true),
            geographic_restrictions: f.geographic_restrictions,
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy)]
enum NumberRule {
    /// Strictly greater than zero
    Positive,
    /// Within [0, 1]
    Fraction,
    /// At least one (return multiples)
    AtLeastOne,
}

/// Per-call accumulator; never shared between calls
struct Validation {
    now: DateTime<Utc>,
    /// Presence applied to fields that are required in a complete record
    required: Presence,
    errors: Vec<FieldError>,
}

impl Validation {
    fn new(now: DateTime<Utc>, required: Presence) -> Self {
        Self {
            now,
            required,
            errors: Vec::new(),
        }
    }

    fn read_fields(&mut self, obj: &Map<String, Value>) -> PartialOpportunityData {
        use crate::models::opportunity::{
            DebtType, ExitStrategy, InvestmentStrategy, LifecycleStatus, PropertyCondition,
            PropertyType,
        };
        use NumberRule::*;
        use Presence::Optional;

        let req = self.required;

        PartialOpportunityData {
            opportunity_name: self.text(obj, "", "opportunity_name", req),
            description: self.optional_text(obj, "description"),
            status: self.choice::<LifecycleStatus>(obj, "status", Optional),
            property_address: self.address(obj, req),
            property_type: self.choice::<PropertyType>(obj, "property_type", req),
            property_condition: self.choice::<PropertyCondition>(obj, "property_condition", Optional),

            total_project_cost: self.decimal(obj, "total_project_cost", req, Positive),
            equity_requirement: self.decimal(obj, "equity_requirement", req, Positive),
            debt_amount: self.decimal(obj, "debt_amount", Optional, Positive),
            debt_type: self.choice::<DebtType>(obj, "debt_type", Optional),
            loan_to_cost_ratio: self.decimal(obj, "loan_to_cost_ratio", Optional, Fraction),
            loan_to_value_ratio: self.decimal(obj, "loan_to_value_ratio", Optional, Fraction),

            minimum_investment: self.decimal(obj, "minimum_investment", req, Positive),
            maximum_investment: self.decimal(obj, "maximum_investment", Optional, Positive),
            target_raise_amount: self.decimal(obj, "target_raise_amount", req, Positive),
            projected_irr: self.decimal(obj, "projected_irr", Optional, Fraction),
            projected_return_multiple: self.decimal(obj, "projected_return_multiple", Optional, AtLeastOne),
            cash_on_cash_return: self.decimal(obj, "cash_on_cash_return", Optional, Fraction),
            preferred_return_rate: self.decimal(obj, "preferred_return_rate", Optional, Fraction),

            investment_strategy: self.choice::<InvestmentStrategy>(obj, "investment_strategy", Optional),
            business_plan: self.optional_text(obj, "business_plan"),
            exit_strategy: self.choice::<ExitStrategy>(obj, "exit_strategy", Optional),

            fundraising_deadline: self.instant(obj, "fundraising_deadline", true),
            expected_closing_date: self.instant(obj, "expected_closing_date", false),
            construction_start_date: self.instant(obj, "construction_start_date", false),
            construction_completion_date: self.instant(obj, "construction_completion_date", false),
            stabilization_date: self.instant(obj, "stabilization_date", false),
            projected_exit_date: self.instant(obj, "projected_exit_date", false),

            public_listing: self.boolean(obj, "public_listing"),
            featured_listing: self.boolean(obj, "featured_listing"),
            accredited_only: self.boolean(obj, "accredited_only"),
            geographic_restrictions: self.region_set(obj, "geographic_restrictions"),
        }
    }

    fn fail(&mut self, path: String, message: impl Into<String>) {
        self.errors.push(FieldError::new(path, message));
    }

    /// Present, non-null value for `key`; reports `Required` when needed
    fn raw<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        prefix: &str,
        key: &str,
        presence: Presence,
    ) -> Option<&'v Value> {
        match obj.get(key) {
            Some(Value::Null) | None => {
                if presence == Presence::Required {
                    self.fail(join_path(prefix, key), "Required");
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Trimmed, non-empty string
    fn text(
        &mut self,
        obj: &Map<String, Value>,
        prefix: &str,
        key: &str,
        presence: Presence,
    ) -> Option<String> {
        let value = self.raw(obj, prefix, key, presence)?;
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(_) => {
                self.fail(join_path(prefix, key), "Must not be empty");
                None
            }
            None => {
                self.fail(
                    join_path(prefix, key),
                    format!("Expected string, received {}", type_name(value)),
                );
                None
            }
        }
    }

    /// Optional free text; blank input normalizes to absent
    fn optional_text(&mut self, obj: &Map<String, Value>, key: &str) -> Option<String> {
        let value = self.raw(obj, "", key, Presence::Optional)?;
        match value.as_str() {
            Some(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            None => {
                self.fail(
                    key.to_string(),
                    format!("Expected string, received {}", type_name(value)),
                );
                None
            }
        }
    }

    fn choice<T: ClosedSet>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        presence: Presence,
    ) -> Option<T> {
        let value = self.raw(obj, "", key, presence)?;
        let Some(s) = value.as_str() else {
            self.fail(
                key.to_string(),
                format!(
                    "Expected one of {}, received {}",
                    T::allowed_values(),
                    type_name(value)
                ),
            );
            return None;
        };
        match T::parse(s) {
            Some(choice) => Some(choice),
            None => {
                self.fail(
                    key.to_string(),
                    format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        T::allowed_values(),
                        s
                    ),
                );
                None
            }
        }
    }

    fn decimal(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        presence: Presence,
        rule: NumberRule,
    ) -> Option<Decimal> {
        let value = self.raw(obj, "", key, presence)?;
        let Some(number) = parse_decimal(value) else {
            let message = match value {
                Value::Number(_) | Value::String(_) if is_finite_float(value) => {
                    "Number out of range".to_string()
                }
                Value::Number(_) | Value::String(_) => "Expected a finite number".to_string(),
                other => format!("Expected number, received {}", type_name(other)),
            };
            self.fail(key.to_string(), message);
            return None;
        };

        let violation = match rule {
            NumberRule::Positive if number <= Decimal::ZERO => Some("Must be greater than 0"),
            NumberRule::Fraction if number < Decimal::ZERO || number > Decimal::ONE => {
                Some("Must be between 0 and 1")
            }
            NumberRule::AtLeastOne if number < Decimal::ONE => Some("Must be at least 1"),
            _ => None,
        };
        match violation {
            Some(message) => {
                self.fail(key.to_string(), message);
                None
            }
            None => Some(number.normalize()),
        }
    }

    fn boolean(&mut self, obj: &Map<String, Value>, key: &str) -> Option<bool> {
        let value = self.raw(obj, "", key, Presence::Optional)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.fail(
                    key.to_string(),
                    format!("Expected boolean, received {}", type_name(value)),
                );
                None
            }
        }
    }

    /// RFC 3339 timestamp or `YYYY-MM-DD` date (midnight UTC)
    fn instant(&mut self, obj: &Map<String, Value>, key: &str, must_be_future: bool) -> Option<DateTime<Utc>> {
        let value = self.raw(obj, "", key, Presence::Optional)?;
        let Some(at) = value.as_str().and_then(parse_instant) else {
            self.fail(key.to_string(), "Invalid date");
            return None;
        };
        if must_be_future && at <= self.now {
            self.fail(key.to_string(), "Date must be in the future");
            return None;
        }
        Some(at)
    }

    fn region_set(&mut self, obj: &Map<String, Value>, key: &str) -> Option<BTreeSet<String>> {
        let value = self.raw(obj, "", key, Presence::Optional)?;
        let Some(items) = value.as_array() else {
            self.fail(
                key.to_string(),
                format!("Expected array, received {}", type_name(value)),
            );
            return None;
        };

        let mut regions = BTreeSet::new();
        let mut valid = true;
        for (i, item) in items.iter().enumerate() {
            match item.as_str().map(str::trim) {
                Some(code) if !code.is_empty() => {
                    regions.insert(code.to_string());
                }
                _ => {
                    self.fail(format!("{}.{}", key, i), "Expected non-empty region code");
                    valid = false;
                }
            }
        }
        valid.then_some(regions)
    }

    fn address(&mut self, obj: &Map<String, Value>, presence: Presence) -> Option<PropertyAddress> {
        const KEY: &str = "property_address";

        let value = self.raw(obj, "", KEY, presence)?;
        let Some(addr) = value.as_object() else {
            self.fail(
                KEY.to_string(),
                format!("Expected object, received {}", type_name(value)),
            );
            return None;
        };

        // A present address is always complete, even in partial mode
        let street = self.text(addr, KEY, "street", Presence::Required);
        let city = self.text(addr, KEY, "city", Presence::Required);
        let state = match self.text(addr, KEY, "state", Presence::Required) {
            Some(code) if code.chars().count() == 2 => Some(code),
            Some(_) => {
                self.fail(join_path(KEY, "state"), "State must be a 2-character code");
                None
            }
            None => None,
        };
        let zip = self.text(addr, KEY, "zip", Presence::Required);
        let country = match addr.get("country") {
            None | Some(Value::Null) => Some(DEFAULT_COUNTRY.to_string()),
            Some(Value::String(c)) if c.trim().is_empty() => Some(DEFAULT_COUNTRY.to_string()),
            Some(_) => self.text(addr, KEY, "country", Presence::Optional),
        };

        Some(PropertyAddress {
            street: street?,
            city: city?,
            state: state?,
            zip: zip?,
            country: country?,
        })
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON number or numeric string to decimal
fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Some(Decimal::from(u));
            }
            decimal_from_str(&n.to_string())
        }
        Value::String(s) => decimal_from_str(s.trim()),
        _ => None,
    }
}

/// Parses as a finite float, whether or not a decimal can hold it
fn is_finite_float(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn decimal_from_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::opportunity::{LifecycleStatus, PropertyType};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn scenario_a() -> Value {
        json!({
            "opportunity_name": "Test",
            "property_type": "multifamily",
            "property_address": {
                "street": "1 Main",
                "city": "X",
                "state": "NY",
                "zip": "10001"
            },
            "total_project_cost": 1000000,
            "equity_requirement": 300000,
            "minimum_investment": 50000,
            "target_raise_amount": 300000
        })
    }

    fn with(mut base: Value, key: &str, value: Value) -> Value {
        base[key] = value;
        base
    }

    fn paths(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_minimal_record_applies_defaults() {
        let data = validate_at(&scenario_a(), now()).unwrap();
        assert_eq!(data.opportunity_name, "Test");
        assert_eq!(data.status, LifecycleStatus::Draft);
        assert_eq!(data.property_type, PropertyType::Multifamily);
        assert_eq!(data.property_address.country, "US");
        assert!(!data.visibility.public_listing);
        assert!(!data.visibility.featured_listing);
        assert!(data.visibility.accredited_only);
        assert_eq!(data.terms.minimum_investment, dec!(50000));
        assert_eq!(data.financials.total_project_cost, dec!(1000000));
    }

    #[test]
    fn test_target_below_minimum_reports_one_error() {
        let input = with(scenario_a(), "target_raise_amount", json!(10000));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["target_raise_amount"]);
    }

    #[test]
    fn test_invalid_property_type_cites_allowed_values() {
        let input = with(scenario_a(), "property_type", json!("invalid_type"));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "property_type");
        assert!(errors[0].message.contains("'multifamily'"));
        assert!(errors[0].message.contains("'mixed_use'"));
        assert!(errors[0].message.contains("invalid_type"));
    }

    #[test]
    fn test_investment_bounds_are_inclusive() {
        let input = with(scenario_a(), "maximum_investment", json!(50000));
        assert!(validate_at(&input, now()).is_ok());

        let input = with(scenario_a(), "maximum_investment", json!(49999));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["maximum_investment"]);

        let input = with(scenario_a(), "target_raise_amount", json!(49999));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["target_raise_amount"]);

        let input = with(scenario_a(), "target_raise_amount", json!(50000));
        assert!(validate_at(&input, now()).is_ok());
    }

    #[test]
    fn test_fraction_boundaries() {
        for ok in [json!(0), json!(1), json!(0.5)] {
            let input = with(scenario_a(), "projected_irr", ok);
            assert!(validate_at(&input, now()).is_ok());
        }
        for bad in [json!(1.01), json!(-0.01)] {
            let input = with(scenario_a(), "projected_irr", bad);
            let errors = validate_at(&input, now()).unwrap_err();
            assert_eq!(paths(&errors), vec!["projected_irr"]);
        }
    }

    #[test]
    fn test_every_violation_is_reported() {
        let mut input = scenario_a();
        input["property_type"] = json!("castle");
        input["equity_requirement"] = json!(0);
        input["maximum_investment"] = json!(10);
        input["projected_irr"] = json!(2);
        input["property_address"]["state"] = json!("New York");

        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(
            paths(&errors),
            vec![
                "property_address.state",
                "property_type",
                "equity_requirement",
                "projected_irr",
                "maximum_investment",
            ]
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = validate_at(&json!({}), now()).unwrap_err();
        assert_eq!(
            paths(&errors),
            vec![
                "opportunity_name",
                "property_address",
                "property_type",
                "total_project_cost",
                "equity_requirement",
                "minimum_investment",
                "target_raise_amount",
            ]
        );
        assert!(errors.iter().all(|e| e.message == "Required"));
    }

    #[test]
    fn test_non_object_input() {
        let errors = validate_at(&json!([1, 2]), now()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "");
        assert!(errors[0].message.contains("array"));
    }

    #[test]
    fn test_address_fields_required() {
        let mut input = scenario_a();
        input["property_address"] = json!({ "street": "", "state": "N", "zip": "10001" });
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(
            paths(&errors),
            vec![
                "property_address.street",
                "property_address.city",
                "property_address.state",
            ]
        );
    }

    #[test]
    fn test_explicit_country_kept() {
        let mut input = scenario_a();
        input["property_address"]["country"] = json!("CA");
        let data = validate_at(&input, now()).unwrap();
        assert_eq!(data.property_address.country, "CA");
    }

    #[test]
    fn test_numeric_strings_and_type_errors() {
        let input = with(scenario_a(), "total_project_cost", json!("1250000.50"));
        let data = validate_at(&input, now()).unwrap();
        assert_eq!(data.financials.total_project_cost, dec!(1250000.50));

        let input = with(scenario_a(), "total_project_cost", json!("NaN"));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["total_project_cost"]);

        let input = with(scenario_a(), "total_project_cost", json!(true));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(errors[0].message, "Expected number, received boolean");
    }

    #[test]
    fn test_out_of_range_numbers() {
        for value in [json!(1e30), json!("79228162514264337593543950336"), json!(1e-40)] {
            let input = with(scenario_a(), "total_project_cost", value);
            let errors = validate_at(&input, now()).unwrap_err();
            assert_eq!(paths(&errors), vec!["total_project_cost"]);
            assert_eq!(errors[0].message, "Number out of range");
        }

        let input = with(scenario_a(), "total_project_cost", json!("NaN"));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(errors[0].message, "Expected a finite number");
    }

    #[test]
    fn test_return_multiple_at_least_one() {
        let input = with(scenario_a(), "projected_return_multiple", json!(1));
        assert!(validate_at(&input, now()).is_ok());
        let input = with(scenario_a(), "projected_return_multiple", json!(0.9));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["projected_return_multiple"]);
    }

    #[test]
    fn test_fundraising_deadline_must_be_future() {
        let input = with(scenario_a(), "fundraising_deadline", json!("2026-12-31"));
        let data = validate_at(&input, now()).unwrap();
        assert_eq!(
            data.timeline.fundraising_deadline,
            Some(Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap())
        );

        let input = with(scenario_a(), "fundraising_deadline", json!("2026-06-01T12:00:00Z"));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["fundraising_deadline"]);

        let input = with(scenario_a(), "fundraising_deadline", json!("next week"));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(errors[0].message, "Invalid date");
    }

    #[test]
    fn test_other_milestones_only_need_to_parse() {
        let input = with(scenario_a(), "expected_closing_date", json!("2020-01-15"));
        assert!(validate_at(&input, now()).is_ok());
        let input = with(scenario_a(), "stabilization_date", json!("2020-13-45"));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["stabilization_date"]);
    }

    #[test]
    fn test_geographic_restrictions() {
        let input = with(scenario_a(), "geographic_restrictions", json!(["NY", "CA", "NY"]));
        let data = validate_at(&input, now()).unwrap();
        let regions: Vec<_> = data
            .visibility
            .geographic_restrictions
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(regions, vec!["CA", "NY"]);

        let input = with(scenario_a(), "geographic_restrictions", json!(["NY", ""]));
        let errors = validate_at(&input, now()).unwrap_err();
        assert_eq!(paths(&errors), vec!["geographic_restrictions.1"]);
    }

    #[test]
    fn test_normalized_output_revalidates_identically() {
        let mut input = scenario_a();
        input["description"] = json!("  Class B value-add  ");
        input["status"] = json!("fundraising");
        input["maximum_investment"] = json!(250000);
        input["projected_irr"] = json!(0.18);
        input["projected_return_multiple"] = json!(1.9);
        input["debt_type"] = json!("senior");
        input["investment_strategy"] = json!("value_add");
        input["exit_strategy"] = json!("refinance");
        input["fundraising_deadline"] = json!("2026-09-30T17:00:00-04:00");
        input["public_listing"] = json!(true);
        input["geographic_restrictions"] = json!(["TX"]);

        let first = validate_at(&input, now()).unwrap();
        let serialized = serde_json::to_value(&first).unwrap();
        let second = validate_at(&serialized, now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.description.as_deref(), Some("Class B value-add"));
    }

    #[test]
    fn test_partial_accepts_subset_without_defaults() {
        let patch = validate_partial_at(&json!({ "status": "closed" }), now()).unwrap();
        assert_eq!(patch.status, Some(LifecycleStatus::Closed));
        assert_eq!(patch.public_listing, None);
        assert_eq!(patch.opportunity_name, None);

        let patch = validate_partial_at(&json!({}), now()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_partial_still_checks_fields_and_cross_rules() {
        let errors = validate_partial_at(
            &json!({ "minimum_investment": 100, "maximum_investment": 50, "projected_irr": 3 }),
            now(),
        )
        .unwrap_err();
        assert_eq!(paths(&errors), vec!["projected_irr", "maximum_investment"]);

        // lone operand never triggers a cross-field rule
        assert!(validate_partial_at(&json!({ "maximum_investment": 1 }), now()).is_ok());

        // a present address must be complete
        let errors =
            validate_partial_at(&json!({ "property_address": { "city": "Austin" } }), now()).unwrap_err();
        assert_eq!(
            paths(&errors),
            vec![
                "property_address.street",
                "property_address.state",
                "property_address.zip",
            ]
        );
    }

    #[test]
    fn test_check_invariants_on_merged_record() {
        let mut data = validate_at(&scenario_a(), now()).unwrap();
        assert!(check_invariants(&data).is_empty());
        data.terms.minimum_investment = dec!(400000);
        data.terms.maximum_investment = Some(dec!(100000));
        let errors = check_invariants(&data);
        assert_eq!(paths(&errors), vec!["maximum_investment", "target_raise_amount"]);
    }
}
