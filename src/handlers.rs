use crate::activity::breakdown;
use crate::errors::AppError;
use crate::models::{
    ActivityCounts, ActivityStatus, ActivityView, AddStudentResult, CenterQuery, NewStudentForm,
    StatisticsView,
};
use crate::state::AppState;
use crate::stats::{collect_openings, school_year_months, statistics_view};
use crate::students::{self, ADD_STUDENT_FAILED};
use crate::ui;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Local;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>, Query(query): Query<CenterQuery>) -> Html<String> {
    let center_id = state.center_id(query.center_id);
    let view = load_statistics(&state, &center_id).await;

    let counts = match state.api.activity_status(&center_id).await {
        Ok(data) => data.counts,
        Err(err) => {
            warn!(center_id = %center_id, error = %err, "activity status unavailable");
            ActivityCounts::default()
        }
    };

    Html(ui::render_index(
        &center_id,
        &ui::render_statistics(&view),
        &ui::render_activity_cards(&counts),
        &state.config.schools,
    ))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<CenterQuery>,
) -> Json<StatisticsView> {
    let center_id = state.center_id(query.center_id);
    Json(load_statistics(&state, &center_id).await)
}

pub async fn statistics_fragment(
    State(state): State<AppState>,
    Query(query): Query<CenterQuery>,
) -> Html<String> {
    let center_id = state.center_id(query.center_id);
    let view = load_statistics(&state, &center_id).await;
    Html(ui::render_statistics(&view))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Query(query): Query<CenterQuery>,
) -> Result<Json<ActivityView>, AppError> {
    let center_id = state.center_id(query.center_id);
    let data = state.api.activity_status(&center_id).await?;
    Ok(Json(ActivityView {
        center_id,
        counts: data.counts,
    }))
}

pub async fn activity_fragment(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Query(query): Query<CenterQuery>,
) -> Result<Html<String>, AppError> {
    let Some(status) = ActivityStatus::parse(&status) else {
        return Ok(Html(ui::render_activity_breakdown(ActivityStatus::Virkir, None)));
    };

    let center_id = state.center_id(query.center_id);
    let data = state.api.activity_status(&center_id).await?;
    let chart = breakdown(&data, status);
    Ok(Html(ui::render_activity_breakdown(status, chart.as_ref())))
}

pub async fn add_student(
    State(state): State<AppState>,
    Json(form): Json<NewStudentForm>,
) -> Result<Json<AddStudentResult>, AppError> {
    let center_id = state.center_id(form.center_id.clone());
    let student = students::validate(&form, &center_id)?;

    let response = state.api.add_student(&student).await.map_err(|err| {
        warn!(error = %err, "addStudent failed");
        AppError {
            status: StatusCode::BAD_GATEWAY,
            message: ADD_STUDENT_FAILED.to_string(),
        }
    })?;

    let result = match students::interpret(response) {
        Ok(password) => {
            info!(center_id = %center_id, "student added");
            AddStudentResult {
                ok: true,
                password: Some(password),
                message: None,
            }
        }
        Err(message) => AddStudentResult {
            ok: false,
            password: None,
            message: Some(message),
        },
    };
    Ok(Json(result))
}

pub async fn add_student_form(
    State(state): State<AppState>,
    Form(form): Form<NewStudentForm>,
) -> (StatusCode, Html<String>) {
    let center_id = state.center_id(form.center_id.clone());
    let student = match students::validate(&form, &center_id) {
        Ok(student) => student,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Html(ui::render_add_student_error(&err.to_string())),
            );
        }
    };

    match state.api.add_student(&student).await {
        Ok(response) => match students::interpret(response) {
            Ok(password) => {
                info!(center_id = %center_id, "student added");
                (StatusCode::OK, Html(ui::render_add_student_success(&password)))
            }
            Err(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(ui::render_add_student_error(&message)),
            ),
        },
        Err(err) => {
            warn!(error = %err, "addStudent failed");
            (
                StatusCode::BAD_GATEWAY,
                Html(ui::render_add_student_error(ADD_STUDENT_FAILED)),
            )
        }
    }
}

pub async fn not_found() -> AppError {
    AppError::not_found("not found")
}

/// Openings from September onward plus school/grade totals. Months or totals
/// that fail to load are logged and left out.
async fn load_statistics(state: &AppState, center_id: &str) -> StatisticsView {
    let today = Local::now().date_naive();
    let months = school_year_months(today);
    let (fetched, failed_months) = state.api.calendar_months(&months).await;
    let openings = collect_openings(center_id, &fetched, today);
    if openings.is_empty() {
        info!(center_id = %center_id, "no openings found");
    }

    let totals = match state.api.statistics(center_id).await {
        Ok(totals) => Some(totals),
        Err(err) => {
            warn!(center_id = %center_id, error = %err, "statistics unavailable");
            None
        }
    };

    statistics_view(
        center_id,
        openings,
        failed_months,
        totals.as_ref(),
        state.config.chart_min_width,
    )
}
