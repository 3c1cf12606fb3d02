use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::{parse_date, ApiError};
use crate::{
    adapters::inbound::http::TimeEntryResponse,
    app_state::AppState,
    auth::AuthEmployee,
    domain::models::{BudgetLineId, NewTimeEntry, ProjectId, TimeEntryId},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_time_entry))
        .route("/:id/budget-line", put(assign_time_entry))
        .route("/:id/approval", put(set_approval))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTimeEntryBody {
    project_id: ProjectId,
    /// Date in YYYY-MM-DD format.
    date: String,
    hours: Decimal,
    task_name: String,
    memo: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    budget_line_id: BudgetLineId,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
    approved: bool,
}

#[instrument(name = "submit_time_entry", skip(app_state))]
async fn submit_time_entry(
    employee: AuthEmployee,
    State(app_state): State<AppState>,
    Json(body): Json<SubmitTimeEntryBody>,
) -> Result<(StatusCode, Json<TimeEntryResponse>), ApiError> {
    let date = parse_date(&body.date)?;

    let mut entry = NewTimeEntry::new(
        employee.id,
        body.project_id,
        date,
        body.hours,
        body.task_name,
    );
    if let Some(memo) = body.memo {
        entry = entry.with_memo(memo);
    }
    if let Some(url) = body.image_url {
        entry = entry.with_image_url(url);
    }

    let created = app_state.billing_service.submit_time_entry(entry).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[instrument(name = "assign_time_entry", skip(app_state))]
async fn assign_time_entry(
    Path(id): Path<TimeEntryId>,
    State(app_state): State<AppState>,
    Json(body): Json<AssignBody>,
) -> Result<StatusCode, ApiError> {
    app_state
        .billing_service
        .assign_time_entry(id, body.budget_line_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "set_time_entry_approval", skip(app_state))]
async fn set_approval(
    employee: AuthEmployee,
    Path(id): Path<TimeEntryId>,
    State(app_state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<StatusCode, ApiError> {
    app_state
        .billing_service
        .set_time_entry_approval(&employee, id, body.approved)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;

    use super::*;
    use crate::{
        domain::{
            models::{EmployeeId, TimeEntry, TimeEntryStatus},
            services::memory::MemoryStore,
        },
        routes::{json_request, send, test_employee, test_state},
    };

    fn app(store: &MemoryStore) -> Router {
        router().with_state(test_state(store))
    }

    fn pending_entry(store: &MemoryStore, project_id: ProjectId) -> TimeEntryId {
        store.seed_entry(TimeEntry {
            id: TimeEntryId::new(0),
            employee_id: EmployeeId::new(5),
            project_id,
            date: date!(2024 - 03 - 01),
            hours: dec!(4),
            task_name: "Framing".to_string(),
            memo: String::new(),
            image_url: None,
            status: TimeEntryStatus::Pending,
            budget_line_id: None,
        })
    }

    #[tokio::test]
    async fn submitted_entry_is_pending_for_the_caller() {
        let store = MemoryStore::new();

        let (status, body) = send(
            app(&store),
            json_request(
                "POST",
                "/",
                json!({
                    "projectId": 9,
                    "date": "2024-03-01",
                    "hours": "6",
                    "taskName": "Concrete",
                    "memo": "poured footings"
                }),
                Some(test_employee(3)),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["employeeId"], 3);
        assert_eq!(body["status"], "Pending");
        assert_eq!(body["budgetLineId"], serde_json::Value::Null);
        assert_eq!(body["memo"], "poured footings");
    }

    #[tokio::test]
    async fn submission_needs_a_logged_in_employee() {
        let store = MemoryStore::new();

        let (status, _) = send(
            app(&store),
            json_request(
                "POST",
                "/",
                json!({
                    "projectId": 9,
                    "date": "2024-03-01",
                    "hours": "6",
                    "taskName": "Concrete"
                }),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn submission_with_bad_date_or_hours_is_rejected() {
        let store = MemoryStore::new();

        let (status, _) = send(
            app(&store),
            json_request(
                "POST",
                "/",
                json!({
                    "projectId": 9,
                    "date": "03/01/2024",
                    "hours": "6",
                    "taskName": "Concrete"
                }),
                Some(test_employee(3)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app(&store),
            json_request(
                "POST",
                "/",
                json!({
                    "projectId": 9,
                    "date": "2024-03-01",
                    "hours": "0",
                    "taskName": "Concrete"
                }),
                Some(test_employee(3)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_HOURS");
    }

    #[tokio::test]
    async fn assignment_links_and_approves_the_entry() {
        let store = MemoryStore::new();
        let report = store.seed_report(ProjectId::new(9), "Phase 1");
        let line = store.seed_line(report, "Framing");
        let entry = pending_entry(&store, ProjectId::new(9));

        let (status, _) = send(
            app(&store),
            json_request(
                "PUT",
                &format!("/{entry}/budget-line"),
                json!({ "budgetLineId": line.as_i32() }),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        let assigned = store.time_entry(entry).unwrap();
        assert_eq!(assigned.budget_line_id, Some(line));
        assert_eq!(assigned.status, TimeEntryStatus::Approved);
    }

    #[tokio::test]
    async fn assignment_across_projects_is_a_bad_request() {
        let store = MemoryStore::new();
        let report = store.seed_report(ProjectId::new(10), "Phase 1");
        let line = store.seed_line(report, "Framing");
        let entry = pending_entry(&store, ProjectId::new(9));

        let (status, body) = send(
            app(&store),
            json_request(
                "PUT",
                &format!("/{entry}/budget-line"),
                json!({ "budgetLineId": line.as_i32() }),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PROJECT_MISMATCH");
        assert_eq!(store.time_entry(entry).unwrap().budget_line_id, None);
    }

    #[tokio::test]
    async fn assigning_unknown_entry_is_not_found() {
        let store = MemoryStore::new();
        let report = store.seed_report(ProjectId::new(9), "Phase 1");
        let line = store.seed_line(report, "Framing");

        let (status, body) = send(
            app(&store),
            json_request(
                "PUT",
                "/999/budget-line",
                json!({ "budgetLineId": line.as_i32() }),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TIME_ENTRY_NOT_FOUND");
    }

    #[tokio::test]
    async fn approval_toggle_is_reserved_for_managers() {
        let store = MemoryStore::new();
        let entry = pending_entry(&store, ProjectId::new(9));

        let (status, body) = send(
            app(&store),
            json_request(
                "PUT",
                &format!("/{entry}/approval"),
                json!({ "approved": true }),
                Some(test_employee(3)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "INSUFFICIENT_ACCESS_LEVEL");
        assert_eq!(
            store.time_entry(entry).unwrap().status,
            TimeEntryStatus::Pending
        );

        let (status, _) = send(
            app(&store),
            json_request(
                "PUT",
                &format!("/{entry}/approval"),
                json!({ "approved": true }),
                Some(test_employee(2)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            store.time_entry(entry).unwrap().status,
            TimeEntryStatus::Approved
        );
    }
}
