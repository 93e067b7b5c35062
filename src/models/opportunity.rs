//! Investment opportunity models
//!
//! Typed opportunity record produced by the schema validator, its partial
//! counterpart used for updates, and the request/response models for the
//! `/api/opportunities` endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::access::{ActorAction, ViewVariant};
use crate::models::validation::FieldError;

/// Closed set of string values backing a field enum.
pub trait ClosedSet: Sized + Copy + 'static {
    /// Every variant, in canonical order
    const ALL: &'static [Self];

    /// Canonical wire name
    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }

    /// Allowed values formatted for error messages: `'a' | 'b' | 'c'`
    fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|v| format!("'{}'", v.as_str()))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $crate::models::opportunity::ClosedSet for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::models::opportunity::ClosedSet::as_str(self))
            }
        }
    };
}

pub(crate) use closed_set;

closed_set! {
    /// Listing lifecycle. Transitions are not constrained.
    #[derive(Default)]
    pub enum LifecycleStatus {
        #[default]
        Draft => "draft",
        Fundraising => "fundraising",
        DueDiligence => "due_diligence",
        Funded => "funded",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

closed_set! {
    pub enum PropertyType {
        Multifamily => "multifamily",
        Retail => "retail",
        Office => "office",
        Industrial => "industrial",
        Land => "land",
        MixedUse => "mixed_use",
    }
}

closed_set! {
    pub enum PropertyCondition {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
}

closed_set! {
    pub enum DebtType {
        Senior => "senior",
        Mezzanine => "mezzanine",
        Bridge => "bridge",
        Construction => "construction",
        Permanent => "permanent",
    }
}

closed_set! {
    pub enum InvestmentStrategy {
        BuyHold => "buy_hold",
        ValueAdd => "value_add",
        Development => "development",
        Opportunistic => "opportunistic",
    }
}

closed_set! {
    pub enum ExitStrategy {
        Sale => "sale",
        Refinance => "refinance",
        HoldIndefinitely => "hold_indefinitely",
    }
}

/// Default country for property addresses
pub const DEFAULT_COUNTRY: &str = "US";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAddress {
    pub street: String,
    pub city: String,
    /// Two-character state code (e.g., "NY")
    pub state: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub total_project_cost: Decimal,
    pub equity_requirement: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_type: Option<DebtType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_to_cost_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_to_value_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentTerms {
    pub minimum_investment: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_investment: Option<Decimal>,
    pub target_raise_amount: Decimal,
    /// Fraction in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_irr: Option<Decimal>,
    /// Equity multiple, at least 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_return_multiple: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_on_cash_return: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_return_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_strategy: Option<InvestmentStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_strategy: Option<ExitStrategy>,
}

/// Dated milestones. Only `fundraising_deadline` has to lie in the future.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundraising_deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_closing_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction_completion_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stabilization_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_exit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub public_listing: bool,
    pub featured_listing: bool,
    pub accredited_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_restrictions: Option<BTreeSet<String>>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            public_listing: false,
            featured_listing: false,
            accredited_only: true,
            geographic_restrictions: None,
        }
    }
}

/// Normalized opportunity content, as produced by `validate`.
///
/// Groups are flattened on the wire so the serialized form is the same flat
/// shape the validator accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityData {
    pub opportunity_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: LifecycleStatus,
    pub property_address: PropertyAddress,
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_condition: Option<PropertyCondition>,
    #[serde(flatten)]
    pub financials: Financials,
    #[serde(flatten)]
    pub terms: InvestmentTerms,
    #[serde(flatten)]
    pub strategy: Strategy,
    #[serde(flatten)]
    pub timeline: Timeline,
    #[serde(flatten)]
    pub visibility: Visibility,
}

/// Validated subset of opportunity fields, as produced by `validate_partial`.
///
/// No defaults are applied: an absent field means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialOpportunityData {
    pub opportunity_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<LifecycleStatus>,
    pub property_address: Option<PropertyAddress>,
    pub property_type: Option<PropertyType>,
    pub property_condition: Option<PropertyCondition>,
    pub total_project_cost: Option<Decimal>,
    pub equity_requirement: Option<Decimal>,
    pub debt_amount: Option<Decimal>,
    pub debt_type: Option<DebtType>,
    pub loan_to_cost_ratio: Option<Decimal>,
    pub loan_to_value_ratio: Option<Decimal>,
    pub minimum_investment: Option<Decimal>,
    pub maximum_investment: Option<Decimal>,
    pub target_raise_amount: Option<Decimal>,
    pub projected_irr: Option<Decimal>,
    pub projected_return_multiple: Option<Decimal>,
    pub cash_on_cash_return: Option<Decimal>,
    pub preferred_return_rate: Option<Decimal>,
    pub investment_strategy: Option<InvestmentStrategy>,
    pub business_plan: Option<String>,
    pub exit_strategy: Option<ExitStrategy>,
    pub fundraising_deadline: Option<DateTime<Utc>>,
    pub expected_closing_date: Option<DateTime<Utc>>,
    pub construction_start_date: Option<DateTime<Utc>>,
    pub construction_completion_date: Option<DateTime<Utc>>,
    pub stabilization_date: Option<DateTime<Utc>>,
    pub projected_exit_date: Option<DateTime<Utc>>,
    pub public_listing: Option<bool>,
    pub featured_listing: Option<bool>,
    pub accredited_only: Option<bool>,
    pub geographic_restrictions: Option<BTreeSet<String>>,
}

impl PartialOpportunityData {
    /// True when the update carries no fields at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl OpportunityData {
    /// Overlay every present field of `patch` onto this record
    pub fn apply(&mut self, patch: PartialOpportunityData) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }
        fn set_opt<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut self.opportunity_name, patch.opportunity_name);
        set_opt(&mut self.description, patch.description);
        set(&mut self.status, patch.status);
        set(&mut self.property_address, patch.property_address);
        set(&mut self.property_type, patch.property_type);
        set_opt(&mut self.property_condition, patch.property_condition);

        let fin = &mut self.financials;
        set(&mut fin.total_project_cost, patch.total_project_cost);
        set(&mut fin.equity_requirement, patch.equity_requirement);
        set_opt(&mut fin.debt_amount, patch.debt_amount);
        set_opt(&mut fin.debt_type, patch.debt_type);
        set_opt(&mut fin.loan_to_cost_ratio, patch.loan_to_cost_ratio);
        set_opt(&mut fin.loan_to_value_ratio, patch.loan_to_value_ratio);

        let terms = &mut self.terms;
        set(&mut terms.minimum_investment, patch.minimum_investment);
        set_opt(&mut terms.maximum_investment, patch.maximum_investment);
        set(&mut terms.target_raise_amount, patch.target_raise_amount);
        set_opt(&mut terms.projected_irr, patch.projected_irr);
        set_opt(&mut terms.projected_return_multiple, patch.projected_return_multiple);
        set_opt(&mut terms.cash_on_cash_return, patch.cash_on_cash_return);
        set_opt(&mut terms.preferred_return_rate, patch.preferred_return_rate);

        let strategy = &mut self.strategy;
        set_opt(&mut strategy.investment_strategy, patch.investment_strategy);
        set_opt(&mut strategy.business_plan, patch.business_plan);
        set_opt(&mut strategy.exit_strategy, patch.exit_strategy);

        let timeline = &mut self.timeline;
        set_opt(&mut timeline.fundraising_deadline, patch.fundraising_deadline);
        set_opt(&mut timeline.expected_closing_date, patch.expected_closing_date);
        set_opt(&mut timeline.construction_start_date, patch.construction_start_date);
        set_opt(&mut timeline.construction_completion_date, patch.construction_completion_date);
        set_opt(&mut timeline.stabilization_date, patch.stabilization_date);
        set_opt(&mut timeline.projected_exit_date, patch.projected_exit_date);

        let vis = &mut self.visibility;
        set(&mut vis.public_listing, patch.public_listing);
        set(&mut vis.featured_listing, patch.featured_listing);
        set(&mut vis.accredited_only, patch.accredited_only);
        set_opt(&mut vis.geographic_restrictions, patch.geographic_restrictions);
    }
}

/// Stored opportunity: validated content plus persistence-owned fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Assigned by the store on creation
    pub id: String,
    /// Sponsor who created the listing
    pub owner_id: String,
    #[serde(flatten)]
    pub data: OpportunityData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public teaser shown to anonymous visitors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunitySummary {
    pub id: String,
    pub opportunity_name: String,
    pub status: LifecycleStatus,
    pub property_type: PropertyType,
    pub city: String,
    pub state: String,
    pub target_raise_amount: Decimal,
    pub minimum_investment: Decimal,
    pub accredited_only: bool,
}

impl From<&Opportunity> for OpportunitySummary {
    fn from(opp: &Opportunity) -> Self {
        Self {
            id: opp.id.clone(),
            opportunity_name: opp.data.opportunity_name.clone(),
            status: opp.data.status,
            property_type: opp.data.property_type,
            city: opp.data.property_address.city.clone(),
            state: opp.data.property_address.state.clone(),
            target_raise_amount: opp.data.terms.target_raise_amount,
            minimum_investment: opp.data.terms.minimum_investment,
            accredited_only: opp.data.visibility.accredited_only,
        }
    }
}

/// Query parameters for opportunity listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityListQuery {
    /// Maximum number of results (default: 20, max: 100)
    pub limit: Option<i32>,
    /// Offset for pagination (default: 0)
    pub offset: Option<i32>,
    /// Only featured listings
    pub featured: Option<bool>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    /// List the caller's own opportunities, drafts included
    pub mine: Option<bool>,
}

impl OpportunityListQuery {
    /// Validate query parameters
    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit {
            if limit < 1 {
                return Err("limit must be at least 1".to_string());
            }
            if limit > 100 {
                return Err("limit cannot exceed 100".to_string());
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err("offset cannot be negative".to_string());
            }
        }
        if let Some(ref pt) = self.property_type {
            if PropertyType::parse(pt).is_none() {
                return Err(format!(
                    "property_type must be one of {}",
                    PropertyType::allowed_values()
                ));
            }
        }
        if let Some(ref status) = self.status {
            if LifecycleStatus::parse(status).is_none() {
                return Err(format!(
                    "status must be one of {}",
                    LifecycleStatus::allowed_values()
                ));
            }
        }
        Ok(())
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(20).clamp(1, 100) as u64
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0).max(0) as u64
    }
}

/// Store-level listing filter, resolved from the query and the caller
#[derive(Debug, Clone, Default)]
pub struct OpportunityFilter {
    /// Restrict to one owner; when set, drafts and private listings are included
    pub owner_id: Option<String>,
    pub featured: Option<bool>,
    pub property_type: Option<PropertyType>,
    pub status: Option<LifecycleStatus>,
    pub limit: u64,
    pub offset: u64,
}

impl OpportunityFilter {
    /// Whether a record passes this filter, ignoring pagination
    pub fn matches(&self, opp: &Opportunity) -> bool {
        match self.owner_id {
            Some(ref owner) => {
                if &opp.owner_id != owner {
                    return false;
                }
            }
            None => {
                if !opp.data.visibility.public_listing || opp.data.status == LifecycleStatus::Draft {
                    return false;
                }
            }
        }
        if let Some(featured) = self.featured {
            if opp.data.visibility.featured_listing != featured {
                return false;
            }
        }
        if let Some(pt) = self.property_type {
            if opp.data.property_type != pt {
                return false;
            }
        }
        if let Some(status) = self.status {
            if opp.data.status != status {
                return false;
            }
        }
        true
    }
}

/// One listing entry: the full record, or the teaser for anonymous visitors
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OpportunityListItem {
    Full(Opportunity),
    Summary(OpportunitySummary),
}

/// Response for GET /api/opportunities
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityListResponse {
    pub opportunities: Vec<OpportunityListItem>,
    /// Total count matching filters (for pagination)
    pub total: i64,
    pub limit: i32,
    pub offset: i32,
}

/// Response for GET /api/opportunities/{id}
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityViewResponse {
    pub view: ViewVariant,
    pub actions: Vec<ActorAction>,
    /// Full record for authenticated viewers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunity: Option<Opportunity>,
    /// Teaser for anonymous visitors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<OpportunitySummary>,
}

/// Response for GET /api/opportunities/{id}/documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub opportunity_id: String,
    pub documents: Vec<String>,
    /// Documents are released once interest is confirmed by the sponsor
    pub gated: bool,
    pub message: String,
}

/// Error response for opportunity endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Field-level validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
            details: None,
        }
    }

    pub fn validation(details: Vec<FieldError>) -> Self {
        Self {
            error: "Validation failed".to_string(),
            code: Some("VALIDATION_ERROR".to_string()),
            details: Some(details),
        }
    }
}
