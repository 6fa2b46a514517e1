//! Leave balance routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::{middleware::AuthUser, AppState};
use kintai_core::balance::LeaveBalance;
use kintai_db::repositories::balance::BalanceRepository;

/// Creates the balance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/balances/{user_id}", get(get_balances))
}

/// Query parameters for balance lookups.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Balance year; defaults to the current year.
    pub year: Option<i32>,
}

/// One computed balance scope.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance owner.
    pub user_id: i64,
    /// Leave type the balance is scoped to.
    pub leave_type_id: i64,
    /// Balance year.
    pub year: i32,
    /// Entitled days for the year.
    pub entitlement: String,
    /// Days consumed by approved requests, net of reversals.
    pub used: String,
    /// Days still available.
    pub remaining: String,
}

/// GET `/balances/{user_id}` - Computed balances for every entitlement the
/// user holds in the requested year.
async fn get_balances(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
    Query(query): Query<BalanceQuery>,
) -> impl IntoResponse {
    let year = query
        .year
        .unwrap_or_else(|| chrono::Utc::now().date_naive().year());

    let repo = BalanceRepository::new((*state.db).clone());
    match repo.balances_for_user(user_id, year).await {
        Ok(balances) => {
            let items: Vec<BalanceResponse> = balances.iter().map(balance_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, user_id, year, "Failed to compute balances");
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({ "error": e.error_code(), "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn balance_to_response(balance: &LeaveBalance) -> BalanceResponse {
    BalanceResponse {
        user_id: balance.user_id,
        leave_type_id: balance.leave_type_id,
        year: balance.year,
        entitlement: balance.entitlement.to_string(),
        used: balance.used.to_string(),
        remaining: balance.remaining().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_balance_to_response() {
        let balance = LeaveBalance {
            user_id: 7,
            leave_type_id: 1,
            year: 2026,
            entitlement: Decimal::new(120, 1),
            used: Decimal::new(35, 1),
        };
        let response = balance_to_response(&balance);
        assert_eq!(response.remaining, "8.5");
        assert_eq!(response.entitlement, "12.0");
    }
}
