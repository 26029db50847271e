use axum::Json;
use axum::extract::{Path, Query};
use axum::http::{HeaderName, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::SYNC_ID_KEY;
use crate::error::AppError;
use crate::export;
use crate::models::*;
use crate::report::{ReportInput, generate_report};
use crate::services::{PullOutcome, PushOutcome, SyncStatus};
use crate::state::AppState;
use crate::stats::{self, DashboardStats, PeriodSummary, StudentOverview};
use crate::store::{ExportedSnapshot, Period, StudentRemoval};
use crate::sync::MergeReport;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct PeriodQuery {
    month: Option<u8>,
    year: Option<i32>,
}

impl PeriodQuery {
    /// Falls back to the current month for whatever is missing.
    fn resolve(&self) -> Result<Period, AppError> {
        let current = Period::containing(&today());
        let month = self.month.unwrap_or(current.month());
        let year = self.year.unwrap_or(current.year());
        Period::new(month, year)
            .ok_or_else(|| AppError::BadRequest(format!("month must be 0-11, got {}", month)))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutstandingQuery {
    year: Option<i32>,
    through_month: Option<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncKeyRequest {
    #[serde(default)]
    sync_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentSummaryResponse {
    #[serde(flatten)]
    summary: PeriodSummary,
    month_name: &'static str,
    year_total: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRemote {
    sync_id: String,
}

#[derive(Serialize)]
struct ReportResponse {
    report: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/{id}/overview", get(student_overview))
        .route("/students/{id}/attendance", get(student_attendance))
        .route("/students/{id}/progress", get(student_progress))
        .route("/students/{id}/payments", get(student_payments))
        .route("/students/{id}/outstanding", get(student_outstanding))
        .route("/asatidz", get(list_asatidz).post(create_asatidz))
        .route(
            "/asatidz/{id}",
            get(get_asatidz).put(update_asatidz).delete(delete_asatidz),
        )
        .route("/attendance", get(list_attendance).post(mark_attendance))
        .route(
            "/asatidz-attendance",
            get(list_asatidz_attendance).post(mark_asatidz_attendance),
        )
        .route("/progress", get(list_progress).post(append_progress))
        .route("/payments", get(list_payments))
        .route("/payments/toggle", post(toggle_payment))
        .route("/payments/settle", post(bulk_settle))
        .route("/payments/summary", get(payment_summary))
        .route("/dashboard", get(dashboard))
        .route("/sync", get(sync_status).delete(sync_disconnect))
        .route("/sync/remote", post(sync_create))
        .route("/sync/push", post(sync_push))
        .route("/sync/pull", post(sync_pull))
        .route("/backup", get(export_backup).post(import_backup))
        .route("/exports/students", get(export_students))
        .route("/exports/asatidz", get(export_asatidz))
        .route("/exports/attendance", get(export_attendance))
        .route("/exports/payments", get(export_payments))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
        .route("/reports/monthly", post(monthly_report))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.storage().load(SYNC_ID_KEY).await?;
    Ok(StatusCode::OK)
}

async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    Json(
        state
            .store
            .read(|s| s.students().iter().map(Student::without_password).collect())
            .await,
    )
}

async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Student>, AppError> {
    let student = state
        .store
        .read(|s| s.find_student(&id).map(Student::without_password))
        .await
        .ok_or(AppError::NotFound)?;
    Ok(Json(student))
}

async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<StudentProfile>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = state.store.add_student(req).await?;
    Ok((StatusCode::CREATED, Json(student.without_password())))
}

async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<StudentProfile>,
) -> Result<Json<Student>, AppError> {
    let student = state.store.update_student(Student { id, profile }).await?;
    Ok(Json(student.without_password()))
}

async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentRemoval>, AppError> {
    let removed = state.store.delete_student(&id).await?;
    Ok(Json(removed))
}

async fn student_overview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentOverview>, AppError> {
    let mut overview = state
        .store
        .read(|s| stats::student_overview(s, &id, today()))
        .await
        .ok_or(AppError::NotFound)?;
    overview.student = overview.student.without_password();
    Ok(Json(overview))
}

async fn student_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<AttendanceRecord>> {
    Json(
        state
            .store
            .read(|s| s.attendance_for_student(&id).into_iter().cloned().collect())
            .await,
    )
}

async fn student_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<ProgressRecord>> {
    Json(
        state
            .store
            .read(|s| s.progress_for_student(&id).into_iter().cloned().collect())
            .await,
    )
}

async fn student_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<PaymentRecord>> {
    Json(
        state
            .store
            .read(|s| s.payments_for_student(&id).into_iter().cloned().collect())
            .await,
    )
}

async fn student_outstanding(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<OutstandingQuery>,
) -> Result<Json<Vec<Period>>, AppError> {
    let current = Period::containing(&today());
    let year = params.year.unwrap_or(current.year());
    let through = params.through_month.unwrap_or(11);

    let periods = state
        .store
        .read(|s| {
            s.find_student(&id)
                .map(|_| stats::outstanding_periods(s, &id, year, through))
        })
        .await
        .ok_or(AppError::NotFound)?;
    Ok(Json(periods))
}

async fn list_asatidz(State(state): State<AppState>) -> Json<Vec<Asatidz>> {
    Json(
        state
            .store
            .read(|s| s.asatidz().iter().map(Asatidz::without_password).collect())
            .await,
    )
}

async fn get_asatidz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Asatidz>, AppError> {
    let ustadz = state
        .store
        .read(|s| s.find_asatidz(&id).map(Asatidz::without_password))
        .await
        .ok_or(AppError::NotFound)?;
    Ok(Json(ustadz))
}

async fn create_asatidz(
    State(state): State<AppState>,
    Json(req): Json<AsatidzProfile>,
) -> Result<(StatusCode, Json<Asatidz>), AppError> {
    let ustadz = state.store.add_asatidz(req).await?;
    Ok((StatusCode::CREATED, Json(ustadz.without_password())))
}

async fn update_asatidz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<AsatidzProfile>,
) -> Result<Json<Asatidz>, AppError> {
    let ustadz = state.store.update_asatidz(Asatidz { id, profile }).await?;
    Ok(Json(ustadz.without_password()))
}

async fn delete_asatidz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_asatidz(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_attendance(
    State(state): State<AppState>,
    Query(params): Query<DateQuery>,
) -> Json<Vec<AttendanceRecord>> {
    let records = state
        .store
        .read(|s| match params.date {
            Some(date) => s.attendance_on(date).into_iter().cloned().collect(),
            None => s.attendance().to_vec(),
        })
        .await;
    Json(records)
}

async fn mark_attendance(
    State(state): State<AppState>,
    Json(req): Json<MarkAttendanceRequest>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = state.store.mark_attendance(req).await?;
    Ok(Json(record))
}

async fn list_asatidz_attendance(
    State(state): State<AppState>,
    Query(params): Query<DateQuery>,
) -> Json<Vec<AsatidzAttendanceRecord>> {
    let records = state
        .store
        .read(|s| match params.date {
            Some(date) => s.asatidz_attendance_on(date).into_iter().cloned().collect(),
            None => s.asatidz_attendance().to_vec(),
        })
        .await;
    Json(records)
}

async fn mark_asatidz_attendance(
    State(state): State<AppState>,
    Json(req): Json<MarkAttendanceRequest>,
) -> Result<Json<AsatidzAttendanceRecord>, AppError> {
    let record = state.store.mark_asatidz_attendance(req).await?;
    Ok(Json(record))
}

async fn list_progress(State(state): State<AppState>) -> Json<Vec<ProgressRecord>> {
    Json(state.store.read(|s| s.progress().to_vec()).await)
}

async fn append_progress(
    State(state): State<AppState>,
    Json(req): Json<NewProgressRequest>,
) -> Result<(StatusCode, Json<ProgressRecord>), AppError> {
    let record = state.store.append_progress(req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_payments(State(state): State<AppState>) -> Json<Vec<PaymentRecord>> {
    Json(state.store.read(|s| s.payments().to_vec()).await)
}

async fn toggle_payment(
    State(state): State<AppState>,
    Json(req): Json<TogglePaymentRequest>,
) -> Result<Json<PaymentRecord>, AppError> {
    let record = state.store.toggle_payment(req, state.monthly_fee).await?;
    Ok(Json(record))
}

async fn bulk_settle(
    State(state): State<AppState>,
    Json(req): Json<BulkSettleRequest>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
    let records = state.store.bulk_settle(req, state.monthly_fee).await?;
    Ok(Json(records))
}

async fn payment_summary(
    State(state): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<PaymentSummaryResponse>, AppError> {
    let period = params.resolve()?;
    let response = state
        .store
        .read(|s| PaymentSummaryResponse {
            summary: stats::period_summary(s, period),
            month_name: period.month_name(),
            year_total: stats::collected_for_year(s, period.year()),
        })
        .await;
    Ok(Json(response))
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.store.read(|s| stats::dashboard(s, today())).await)
}

async fn sync_status(State(state): State<AppState>) -> Result<Json<SyncStatus>, AppError> {
    Ok(Json(state.sync.status().await?))
}

async fn sync_disconnect(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.sync.disconnect().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sync_create(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreatedRemote>), AppError> {
    let sync_id = state.sync.create_remote().await?;
    Ok((StatusCode::CREATED, Json(CreatedRemote { sync_id })))
}

async fn sync_push(
    State(state): State<AppState>,
    Json(req): Json<SyncKeyRequest>,
) -> Result<Json<PushOutcome>, AppError> {
    Ok(Json(state.sync.push(req.sync_id.as_deref()).await?))
}

async fn sync_pull(
    State(state): State<AppState>,
    Json(req): Json<SyncKeyRequest>,
) -> Result<Json<PullOutcome>, AppError> {
    Ok(Json(state.sync.pull(req.sync_id.as_deref()).await?))
}

async fn export_backup(State(state): State<AppState>) -> impl IntoResponse {
    let exported: ExportedSnapshot = state.store.export_snapshot().await;
    let filename = format!(
        "attachment; filename=\"tpq_backup_{}.json\"",
        exported.exported_at.format("%Y-%m-%d")
    );
    ([(header::CONTENT_DISPOSITION, filename)], Json(exported))
}

async fn import_backup(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<MergeReport>, AppError> {
    let report = state
        .store
        .import_snapshot(&body, state.sync.strategy())
        .await?;
    Ok(Json(report))
}

type CsvResponse = ([(HeaderName, String); 2], String);

fn csv_response(name: &str, body: String) -> CsvResponse {
    let disposition = format!("attachment; filename=\"{}_{}.csv\"", name, today().year());
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
}

async fn export_students(State(state): State<AppState>) -> Result<CsvResponse, AppError> {
    let body = state.store.read(export::students_csv).await?;
    Ok(csv_response("santri", body))
}

async fn export_asatidz(State(state): State<AppState>) -> Result<CsvResponse, AppError> {
    let body = state.store.read(export::asatidz_csv).await?;
    Ok(csv_response("asatidz", body))
}

async fn export_attendance(State(state): State<AppState>) -> Result<CsvResponse, AppError> {
    let body = state.store.read(export::attendance_csv).await?;
    Ok(csv_response("absensi", body))
}

async fn export_payments(State(state): State<AppState>) -> Result<CsvResponse, AppError> {
    let body = state.store.read(export::payments_csv).await?;
    Ok(csv_response("syahriah", body))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = state.session.login(&state.store, req).await?;
    Ok(Json(user))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_session(State(state): State<AppState>) -> Result<Json<Option<User>>, AppError> {
    Ok(Json(state.session.current().await?))
}

async fn monthly_report(
    State(state): State<AppState>,
) -> Result<Json<ReportResponse>, AppError> {
    let input = state
        .store
        .read(|s| ReportInput::collect(s, today()))
        .await;
    let report = generate_report(state.reports.as_ref(), &input).await?;
    Ok(Json(ReportResponse { report }))
}
