use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::{dto::non_empty, session::AuthSession},
    error::ApiError,
    meals::{
        dto::{parse_date_time, CreateMealRequest, MealResponse, UpdateMealRequest},
        repo::Meal,
    },
    state::AppState,
};

#[instrument(skip_all, fields(user_id = session.user_id))]
pub async fn create_meal(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealResponse>), ApiError> {
    let (Some(name), Some(raw_date_time)) =
        (non_empty(payload.name), non_empty(payload.date_time))
    else {
        return Err(ApiError::MissingField("Fill in all required fields"));
    };
    let date_time = parse_date_time(&raw_date_time)?;
    let in_diet = payload.in_diet.unwrap_or(true);

    let meal = Meal::create(
        &state.db,
        session.user_id,
        &name,
        payload.description.as_deref(),
        date_time,
        in_diet,
    )
    .await?;

    info!(user_id = session.user_id, meal_id = meal.id, "meal created");
    Ok((StatusCode::CREATED, Json(meal.into())))
}

#[instrument(skip_all, fields(user_id = session.user_id))]
pub async fn list_meals(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<MealResponse>>, ApiError> {
    let meals = Meal::list_by_user(&state.db, session.user_id).await?;
    Ok(Json(meals.into_iter().map(MealResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = session.user_id, meal_id = meal_id))]
pub async fn get_meal(
    State(state): State<AppState>,
    session: AuthSession,
    Path(meal_id): Path<i64>,
) -> Result<Json<MealResponse>, ApiError> {
    let meal = Meal::find_owned(&state.db, session.user_id, meal_id)
        .await?
        .ok_or(ApiError::NotFound("Meal"))?;
    Ok(Json(meal.into()))
}

#[instrument(skip_all, fields(user_id = session.user_id, meal_id = meal_id))]
pub async fn update_meal(
    State(state): State<AppState>,
    session: AuthSession,
    Path(meal_id): Path<i64>,
    Json(payload): Json<UpdateMealRequest>,
) -> Result<Json<MealResponse>, ApiError> {
    let changes = payload.into_changes()?;
    let meal = Meal::update(&state.db, session.user_id, meal_id, changes)
        .await?
        .ok_or(ApiError::NotFound("Meal"))?;

    info!(user_id = session.user_id, meal_id, "meal updated");
    Ok(Json(meal.into()))
}

#[instrument(skip_all, fields(user_id = session.user_id, meal_id = meal_id))]
pub async fn delete_meal(
    State(state): State<AppState>,
    session: AuthSession,
    Path(meal_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if !Meal::delete_owned(&state.db, session.user_id, meal_id).await? {
        return Err(ApiError::NotFound("Meal"));
    }

    info!(user_id = session.user_id, meal_id, "meal deleted");
    Ok(Json(json!({"message": "Meal deleted successfully"})))
}
