use crate::errors::AppError;
use crate::models::{
    DAYS_PER_WEEK, DayStatusRequest, DayStatusResponse, LevelInfo, MotivationalMessage, PredictionResponse,
    Reminder, ReminderRequest, RestSuggestion, Suggestion, Task, TaskData, TaskFilter, TaskInput,
    TaskStats, TaskUpdate,
};
use crate::state::{AppState, SaveTier};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

pub async fn list_tasks(State(state): State<AppState>) -> Json<TaskData> {
    Json(state.ledger.lock().await.snapshot())
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.ledger.lock().await.add_task(payload);
    state.save_tasks(SaveTier::Immediate).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .ledger
        .lock()
        .await
        .update_task(&id, payload)
        .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;

    state.save_tasks(SaveTier::Immediate).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LevelInfo>, AppError> {
    let level = {
        let mut ledger = state.ledger.lock().await;
        ledger.delete_task(&id);
        ledger.level()
    };

    state.save_tasks(SaveTier::Immediate).await?;
    Ok(Json(level))
}

pub async fn update_day_status(
    State(state): State<AppState>,
    Path((id, day)): Path<(String, usize)>,
    Json(payload): Json<DayStatusRequest>,
) -> Result<Json<DayStatusResponse>, AppError> {
    if day >= DAYS_PER_WEEK {
        return Err(AppError::bad_request(format!(
            "day {day} is outside the week (0..{DAYS_PER_WEEK})"
        )));
    }

    let (task, level) = {
        let mut ledger = state.ledger.lock().await;
        let task = ledger
            .update_day_status(&id, day, payload.status)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;
        (task, ledger.level())
    };

    state.save_tasks(SaveTier::Debounced).await?;
    Ok(Json(DayStatusResponse {
        task,
        level: level.level,
        points: level.points,
    }))
}

pub async fn start_new_week(State(state): State<AppState>) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.ledger.lock().await.start_new_week().to_vec();
    state.save_tasks(SaveTier::Immediate).await?;
    Ok(Json(tasks))
}

pub async fn get_level(State(state): State<AppState>) -> Json<LevelInfo> {
    Json(state.ledger.lock().await.level())
}

pub async fn get_stats(State(state): State<AppState>) -> Json<TaskStats> {
    let stats = state.ledger.lock().await.task_stats();
    Json(TaskStats::clone(&stats))
}

pub async fn get_prediction(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Json<PredictionResponse> {
    let (stats, task) = {
        let mut ledger = state.ledger.lock().await;
        let task = filter
            .task_id
            .as_deref()
            .and_then(|id| ledger.task(id))
            .cloned();
        (ledger.prediction_stats(), task)
    };

    let prediction = match (&stats, task) {
        (Some(_), Some(task)) => state.advisory.task_prediction(&task).await,
        _ => None,
    };

    Json(PredictionResponse { stats, prediction })
}

pub async fn get_suggestions(
    State(state): State<AppState>,
    Json(payload): Json<TaskInput>,
) -> Json<Option<Suggestion>> {
    Json(state.advisory.task_suggestions(&payload).await)
}

pub async fn get_rest_suggestions(State(state): State<AppState>) -> Json<Option<RestSuggestion>> {
    let history = state.ledger.lock().await.tasks().to_vec();
    Json(state.advisory.rest_suggestions(&history).await)
}

pub async fn get_motivation(State(state): State<AppState>) -> Json<Option<MotivationalMessage>> {
    Json(state.motivation.borrow().clone())
}

pub async fn list_reminders(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Json<Vec<Reminder>> {
    let reminders = state.reminders.lock().await;
    Json(reminders.reminders_for(filter.task_id.as_deref()))
}

pub async fn create_reminder(
    State(state): State<AppState>,
    Json(payload): Json<ReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>), AppError> {
    let reminder = {
        let ledger = state.ledger.lock().await;
        let mut reminders = state.reminders.lock().await;
        reminders.add_reminder(&ledger, &payload.task_id, payload.time, payload.message)
    }
    .ok_or_else(|| AppError::not_found(format!("task {} not found", payload.task_id)))?;

    state.save_reminders().await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = state.reminders.lock().await.delete_reminder(&id);
    if removed.is_none() {
        return Err(AppError::not_found(format!("reminder {id} not found")));
    }

    state.save_reminders().await?;
    Ok(StatusCode::NO_CONTENT)
}
