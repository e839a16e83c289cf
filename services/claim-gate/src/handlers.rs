use crate::AppState;
use axum::extract::{Query, State as AxumState};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lootpool_gate::Error as GateError;
use lootpool_types::{ClaimOutcome, ClaimRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizeClaimRequest {
    user_id: Option<String>,
    pool_id: Option<u64>,
    project_id: Option<u64>,
    prize_win_id: Option<u64>,
}

/// Fresh authorization; the caller executes the asset transfer afterward.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizedResponse {
    success: bool,
    already_claimed: bool,
    authorized: bool,
    nft_mint: String,
    pool_name: String,
}

/// Idempotent repeat of an already-claimed record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyClaimedResponse {
    success: bool,
    already_claimed: bool,
    claimed_at: Option<u64>,
    tx_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EligibilityParams {
    pool_id: Option<u64>,
    user_id: Option<String>,
    project_id: Option<u64>,
}

#[derive(Serialize)]
struct EligibilityResponse {
    success: bool,
    #[serde(rename = "isWinner")]
    is_winner: bool,
    #[serde(rename = "isNFTJackpot")]
    is_nft_jackpot: bool,
    #[serde(rename = "nftMint")]
    nft_mint: Option<String>,
    claimed: bool,
    #[serde(rename = "canClaim")]
    can_claim: bool,
}

/// Key identifying one logical claim for in-flight coalescing. Distinct
/// explicit win rows are distinct claims and must not suppress each other.
fn coalesce_key(
    user_id: &str,
    pool_id: u64,
    project_id: Option<u64>,
    prize_win_id: Option<u64>,
) -> String {
    fn part(value: Option<u64>) -> String {
        value.map_or_else(|| "-".to_string(), |value| value.to_string())
    }
    format!(
        "{user_id}:{pool_id}:{}:{}",
        part(project_id),
        part(prize_win_id)
    )
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}

/// Map a gate error onto the wire. The forbidden body deliberately carries a
/// generic message and no claim-state detail; the audit trail lives in the
/// server-side logs the gate already wrote.
fn gate_error_response(err: GateError) -> Response {
    match err {
        GateError::Validation(message) => error_body(StatusCode::BAD_REQUEST, message),
        GateError::NotFound(what) => {
            error_body(StatusCode::NOT_FOUND, &format!("{what} not found"))
        }
        GateError::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "success": false,
                "isWinner": false,
                "error": "access denied",
            })),
        )
            .into_response(),
        GateError::UnsupportedReward => error_body(
            StatusCode::BAD_REQUEST,
            "pool reward is not a non-fungible asset",
        ),
        GateError::TransientClaimFailure => {
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "failed to process claim")
        }
        GateError::Store(err) => {
            tracing::error!(?err, "store failure while processing claim request");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

pub(crate) async fn authorize_claim(
    AxumState(state): AxumState<AppState>,
    Json(payload): Json<AuthorizeClaimRequest>,
) -> Response {
    let Some(user_id) = payload.user_id.filter(|user_id| !user_id.is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "userId is required");
    };
    let Some(pool_id) = payload.pool_id else {
        return error_body(StatusCode::BAD_REQUEST, "poolId is required");
    };

    let key = coalesce_key(&user_id, pool_id, payload.project_id, payload.prize_win_id);
    let Some(_inflight) = state.coalescer.clone().try_begin(&key) else {
        return error_body(StatusCode::CONFLICT, "claim already in progress");
    };

    let request = ClaimRequest {
        claimant: user_id,
        pool_id,
        tenant_id: payload.project_id,
        prize_win_id: payload.prize_win_id,
    };
    match tokio::time::timeout(state.deadline, state.gate.authorize_claim(&request)).await {
        Ok(Ok(ClaimOutcome::Authorized {
            nft_mint,
            pool_name,
        })) => Json(AuthorizedResponse {
            success: true,
            already_claimed: false,
            authorized: true,
            nft_mint,
            pool_name,
        })
        .into_response(),
        Ok(Ok(ClaimOutcome::AlreadyClaimed {
            claimed_at,
            transfer_reference,
        })) => Json(AlreadyClaimedResponse {
            success: true,
            already_claimed: true,
            claimed_at,
            tx_hash: transfer_reference,
        })
        .into_response(),
        Ok(Err(err)) => gate_error_response(err),
        Err(_) => {
            // Possibly applied; the gate re-reads on retry, so a full retry
            // by the caller is safe.
            tracing::warn!(
                pool_id = request.pool_id,
                claimant = %request.claimant,
                "claim request exceeded deadline"
            );
            error_body(StatusCode::GATEWAY_TIMEOUT, "deadline exceeded")
        }
    }
}

pub(crate) async fn eligibility(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<EligibilityParams>,
) -> Response {
    let Some(user_id) = params.user_id.filter(|user_id| !user_id.is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "userId is required");
    };
    let Some(pool_id) = params.pool_id else {
        return error_body(StatusCode::BAD_REQUEST, "poolId is required");
    };

    match tokio::time::timeout(
        state.deadline,
        state
            .gate
            .check_eligibility(pool_id, &user_id, params.project_id),
    )
    .await
    {
        Ok(Ok(report)) => Json(EligibilityResponse {
            success: true,
            is_winner: report.is_winner,
            is_nft_jackpot: report.is_nft_jackpot,
            nft_mint: report.nft_mint,
            claimed: report.claimed,
            can_claim: report.can_claim,
        })
        .into_response(),
        Ok(Err(err)) => gate_error_response(err),
        Err(_) => error_body(StatusCode::GATEWAY_TIMEOUT, "deadline exceeded"),
    }
}
