//! Opportunity handlers
//!
//! CRUD, detail view, document placeholder and interest endpoints under
//! `/api/opportunities`. Every handler resolves the actor, asks the access
//! policy, and only then validates and touches the store.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::models::actor::ActorContext;
use crate::models::interest::{
    InterestKind, InterestRecord, InterestRequest, MAX_INTEREST_MESSAGE_LENGTH, NewInterest,
};
use crate::models::opportunity::{
    ClosedSet, DocumentListResponse, ErrorResponse, LifecycleStatus, Opportunity,
    OpportunityFilter, OpportunityListItem, OpportunityListQuery, OpportunityListResponse,
    OpportunitySummary, OpportunityViewResponse, PropertyType,
};
use crate::services::access_policy::{
    authorize, Action, ActorAction, Decision, DenyReason, ResourceRef, ViewVariant,
};
use crate::services::opportunity_store::StoreError;
use crate::services::opportunity_validator::{check_invariants, validate, validate_partial};
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>, code: &str) -> ApiError {
    (status, Json(ErrorResponse::new(message, code)))
}

fn map_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(id) => api_error(
            StatusCode::NOT_FOUND,
            format!("Opportunity {} not found", id),
            "NOT_FOUND",
        ),
        other => {
            error!(error = %other, "Opportunity store failure");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", other),
                "STORE_ERROR",
            )
        }
    }
}

/// `not_authenticated` becomes 401, `not_owner` 403
fn map_denied(reason: DenyReason) -> ApiError {
    match reason {
        DenyReason::NotAuthenticated => api_error(
            StatusCode::UNAUTHORIZED,
            "Sign in required",
            "NOT_AUTHENTICATED",
        ),
        DenyReason::NotOwner => api_error(
            StatusCode::FORBIDDEN,
            "Only the sponsor of this opportunity can do that",
            "NOT_OWNER",
        ),
    }
}

/// Malformed or non-JSON bodies get the regular error payload
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected request body");
        api_error(StatusCode::BAD_REQUEST, rejection.body_text(), "INVALID_BODY")
    })
}

async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<ActorContext, ApiError> {
    state.identity.current_actor(headers).await.map_err(|e| {
        warn!(error = %e, "Rejected identity headers");
        api_error(StatusCode::UNAUTHORIZED, e.to_string(), "INVALID_IDENTITY")
    })
}

async fn load(state: &AppState, id: &str) -> Result<Opportunity, ApiError> {
    state
        .store
        .fetch_by_id(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| map_store_error(StoreError::NotFound(id.to_string())))
}

/// Fetch a record the actor is allowed to know about. Drafts are hidden from
/// everyone but their owner.
async fn load_visible(
    state: &AppState,
    id: &str,
    actor: &ActorContext,
) -> Result<Opportunity, ApiError> {
    let opportunity = load(state, id).await?;

    let is_owner = actor.actor_id.as_deref() == Some(opportunity.owner_id.as_str());
    if opportunity.data.status == LifecycleStatus::Draft && !is_owner {
        return Err(map_store_error(StoreError::NotFound(id.to_string())));
    }
    Ok(opportunity)
}

fn require_edit(actor: &ActorContext, opportunity: &Opportunity) -> Result<(), ApiError> {
    match authorize(actor, &ResourceRef::from(opportunity), Action::Edit) {
        Decision::AllowedAs(_) => Ok(()),
        Decision::Denied(reason) => {
            warn!(
                opportunity_id = %opportunity.id,
                actor_id = ?actor.actor_id,
                reason = %reason,
                "Edit denied"
            );
            Err(map_denied(reason))
        }
    }
}

/// List opportunities
///
/// GET /api/opportunities
///
/// Public listings (non-draft, `public_listing = true`) by default;
/// `mine=true` lists everything the caller owns. Each entry is shaped by the
/// caller's view variant, so anonymous visitors only get summaries.
///
/// # Query Parameters
///
/// - `limit` - Maximum number of results (default: 20, max: 100)
/// - `offset` - Offset for pagination (default: 0)
/// - `featured` - Only featured listings
/// - `property_type` - e.g. `multifamily`
/// - `status` - e.g. `fundraising`
/// - `mine` - Caller's own opportunities, drafts included
pub async fn list_opportunities(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OpportunityListQuery>,
) -> Result<Json<OpportunityListResponse>, ApiError> {
    info!(
        limit = query.limit,
        offset = query.offset,
        featured = query.featured,
        mine = query.mine,
        "Opportunity list request received"
    );

    if let Err(e) = query.validate() {
        warn!(error = %e, "Invalid query parameters");
        return Err(api_error(StatusCode::BAD_REQUEST, e, "INVALID_QUERY"));
    }

    let actor = resolve_actor(&state, &headers).await?;
    let owner_id = if query.mine.unwrap_or(false) {
        match actor.actor_id {
            Some(ref id) => Some(id.clone()),
            None => return Err(map_denied(DenyReason::NotAuthenticated)),
        }
    } else {
        None
    };

    let filter = OpportunityFilter {
        owner_id,
        featured: query.featured,
        property_type: query.property_type.as_deref().and_then(PropertyType::parse),
        status: query.status.as_deref().and_then(LifecycleStatus::parse),
        limit: query.limit(),
        offset: query.offset(),
    };

    let (page, total) = state.store.list(&filter).await.map_err(map_store_error)?;

    let opportunities: Vec<OpportunityListItem> = page
        .into_iter()
        .filter_map(|opp| {
            let decision = authorize(&actor, &ResourceRef::from(&opp), Action::View);
            match decision {
                Decision::AllowedAs(ViewVariant::AnonymousPrompt) => {
                    Some(OpportunityListItem::Summary(OpportunitySummary::from(&opp)))
                }
                Decision::AllowedAs(_) => Some(OpportunityListItem::Full(opp)),
                Decision::Denied(_) => None,
            }
        })
        .collect();

    info!(count = opportunities.len(), total = total, "Opportunity list returned");

    Ok(Json(OpportunityListResponse {
        opportunities,
        total,
        limit: filter.limit as i32,
        offset: filter.offset as i32,
    }))
}

/// Create an opportunity
///
/// POST /api/opportunities
///
/// The caller becomes the sponsor (owner). The body is validated as a
/// complete record; defaults are applied before storing.
pub async fn create_opportunity(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Opportunity>), ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let Some(owner_id) = actor.actor_id.as_deref() else {
        return Err(map_denied(DenyReason::NotAuthenticated));
    };
    let payload = json_body(body)?;

    let data = validate(&payload).map_err(|details| {
        warn!(owner_id = %owner_id, errors = details.len(), "Opportunity create rejected");
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::validation(details)))
    })?;

    let created = state
        .store
        .create(owner_id, data)
        .await
        .map_err(map_store_error)?;

    info!(
        opportunity_id = %created.id,
        owner_id = %owner_id,
        status = %created.data.status,
        "Opportunity created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// Opportunity detail
///
/// GET /api/opportunities/{id}
///
/// Signed-in actors get the full record plus the actions for their view
/// variant; anonymous visitors get a summary and a sign-in prompt.
pub async fn get_opportunity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OpportunityViewResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let opportunity = load_visible(&state, &id, &actor).await?;

    let view = match authorize(&actor, &ResourceRef::from(&opportunity), Action::View) {
        Decision::AllowedAs(view) => view,
        Decision::Denied(reason) => return Err(map_denied(reason)),
    };

    info!(opportunity_id = %id, actor_id = ?actor.actor_id, view = ?view, "Opportunity viewed");

    let (opportunity, summary) = match view {
        ViewVariant::AnonymousPrompt => (None, Some(OpportunitySummary::from(&opportunity))),
        _ => (Some(opportunity), None),
    };

    Ok(Json(OpportunityViewResponse {
        view,
        actions: view.actions().to_vec(),
        opportunity,
        summary,
    }))
}

/// Partially update an opportunity
///
/// PATCH /api/opportunities/{id}
///
/// Owner only. Present fields are validated, merged into the stored record,
/// and the investment bounds are re-checked on the merged result. Status
/// may be set to any value.
pub async fn update_opportunity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Opportunity>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let existing = load(&state, &id).await?;
    require_edit(&actor, &existing)?;
    let payload = json_body(body)?;

    let patch = validate_partial(&payload).map_err(|details| {
        warn!(opportunity_id = %id, errors = details.len(), "Opportunity update rejected");
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::validation(details)))
    })?;
    if patch.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "No updatable fields provided",
            "EMPTY_UPDATE",
        ));
    }

    let mut merged = existing.data.clone();
    merged.apply(patch);
    let violations = check_invariants(&merged);
    if !violations.is_empty() {
        warn!(opportunity_id = %id, errors = violations.len(), "Merged opportunity violates invariants");
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::validation(violations))));
    }

    let updated = state.store.update(&id, merged).await.map_err(map_store_error)?;

    info!(
        opportunity_id = %id,
        from_status = %existing.data.status,
        to_status = %updated.data.status,
        "Opportunity updated"
    );

    Ok(Json(updated))
}

/// Delete an opportunity
///
/// DELETE /api/opportunities/{id}
pub async fn delete_opportunity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let existing = load(&state, &id).await?;
    require_edit(&actor, &existing)?;

    state.store.delete(&id).await.map_err(map_store_error)?;
    info!(opportunity_id = %id, "Opportunity deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Opportunity documents
///
/// GET /api/opportunities/{id}/documents
///
/// Any signed-in actor sees the placeholder; documents themselves are
/// released by the sponsor once interest is confirmed.
pub async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    if actor.is_anonymous() {
        // anonymous callers learn nothing about which ids exist
        return Err(map_denied(DenyReason::NotAuthenticated));
    }
    let opportunity = load_visible(&state, &id, &actor).await?;

    let view = match authorize(&actor, &ResourceRef::from(&opportunity), Action::ListDocuments) {
        Decision::AllowedAs(view) => view,
        Decision::Denied(reason) => return Err(map_denied(reason)),
    };

    let message = match view {
        ViewVariant::Owner => "Upload documents to share them with confirmed investors",
        _ => "Express interest to request access to offering documents",
    };

    Ok(Json(DocumentListResponse {
        opportunity_id: opportunity.id,
        documents: Vec::new(),
        gated: view != ViewVariant::Owner,
        message: message.to_string(),
    }))
}

/// Register capital partner interest
///
/// POST /api/opportunities/{id}/interest
///
/// Only the investor view carries the express-interest and
/// request-information actions. Repeating the same kind returns the
/// existing entry with 200.
///
/// # Request Body
///
/// ```json
/// { "kind": "request_information", "message": "Please share the T12" }
/// ```
pub async fn express_interest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<InterestRecord>), ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let opportunity = load_visible(&state, &id, &actor).await?;

    let view = match authorize(&actor, &ResourceRef::from(&opportunity), Action::View) {
        Decision::AllowedAs(ViewVariant::AnonymousPrompt) => {
            return Err(map_denied(DenyReason::NotAuthenticated));
        }
        Decision::AllowedAs(view) => view,
        Decision::Denied(reason) => return Err(map_denied(reason)),
    };

    let request = InterestRequest::from_json(&json_body(body)?).map_err(|details| {
        warn!(opportunity_id = %id, errors = details.len(), "Interest request rejected");
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::validation(details)))
    })?;

    let wanted = match request.kind {
        InterestKind::ExpressInterest => ActorAction::ExpressInterest,
        InterestKind::RequestInformation => ActorAction::RequestInformation,
    };
    let Some(actor_id) = actor.actor_id.clone().filter(|_| view.allows(wanted)) else {
        warn!(opportunity_id = %id, actor_id = ?actor.actor_id, view = ?view, "Interest not permitted");
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "Only capital partners can express interest in an opportunity they do not own",
            "NOT_CAPITAL_PARTNER",
        ));
    };

    let message = request
        .message
        .map(|m| m.trim().chars().take(MAX_INTEREST_MESSAGE_LENGTH).collect::<String>())
        .filter(|m| !m.is_empty());

    let (record, created) = state
        .store
        .record_interest(NewInterest {
            opportunity_id: opportunity.id,
            actor_id,
            kind: request.kind,
            message,
        })
        .await
        .map_err(map_store_error)?;

    info!(
        opportunity_id = %id,
        actor_id = %record.actor_id,
        kind = record.kind.as_str(),
        created = created,
        "Interest recorded"
    );

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(record)))
}
