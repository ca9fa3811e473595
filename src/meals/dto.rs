use serde::{Deserialize, Serialize, Serializer};
use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};

use crate::{auth::dto::non_empty, error::ApiError, meals::repo::Meal};

/// Wire format for meal timestamps, second precision.
pub const DATE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn parse_date_time(raw: &str) -> Result<PrimitiveDateTime, ApiError> {
    PrimitiveDateTime::parse(raw, DATE_TIME_FORMAT).map_err(|_| {
        ApiError::InvalidFormat("date_time must use the YYYY-MM-DD HH:MM:SS format")
    })
}

fn serialize_date_time<S: Serializer>(
    date_time: &PrimitiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let formatted = date_time
        .format(DATE_TIME_FORMAT)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<String>,
    pub in_diet: Option<bool>,
}

/// Any subset of meal fields; whatever is absent stays untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<String>,
    pub in_diet: Option<bool>,
}

impl UpdateMealRequest {
    pub fn into_changes(self) -> Result<MealChanges, ApiError> {
        let date_time = match non_empty(self.date_time) {
            Some(raw) => Some(parse_date_time(&raw)?),
            None => None,
        };
        Ok(MealChanges {
            name: non_empty(self.name),
            description: non_empty(self.description),
            date_time,
            // An explicit boolean always applies, false included.
            in_diet: self.in_diet,
        })
    }
}

/// Validated field overrides, ready to merge into a stored meal.
#[derive(Debug, Default)]
pub struct MealChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<PrimitiveDateTime>,
    pub in_diet: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "serialize_date_time")]
    pub date_time: PrimitiveDateTime,
    pub in_diet: bool,
    pub user_id: i64,
}

impl From<Meal> for MealResponse {
    fn from(meal: Meal) -> Self {
        Self {
            id: meal.id,
            name: meal.name,
            description: meal.description,
            date_time: meal.date_time,
            in_diet: meal.in_diet,
            user_id: meal.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_round_trips_at_second_precision() {
        let raw = "2024-01-01 12:00:00";
        let parsed = parse_date_time(raw).expect("valid date_time");
        assert_eq!(parsed.format(DATE_TIME_FORMAT).unwrap(), raw);
    }

    #[test]
    fn bad_date_time_is_an_invalid_format_error() {
        for raw in ["2024-01-01", "12:00:00", "01/01/2024 12:00:00", "garbage"] {
            let err = parse_date_time(raw).unwrap_err();
            assert!(matches!(err, ApiError::InvalidFormat(_)), "{raw}");
        }
    }

    #[test]
    fn meal_json_has_the_documented_shape() {
        let response = MealResponse {
            id: 1,
            name: "Lunch".into(),
            description: None,
            date_time: parse_date_time("2024-01-01 12:00:00").unwrap(),
            in_diet: true,
            user_id: 7,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "Lunch",
                "description": null,
                "date_time": "2024-01-01 12:00:00",
                "in_diet": true,
                "user_id": 7,
            })
        );
    }

    #[test]
    fn update_request_keeps_absent_fields_out_of_the_changes() {
        let request = UpdateMealRequest {
            description: Some("post-run snack".into()),
            ..Default::default()
        };
        let changes = request.into_changes().unwrap();
        assert_eq!(changes.description.as_deref(), Some("post-run snack"));
        assert!(changes.name.is_none());
        assert!(changes.date_time.is_none());
        assert!(changes.in_diet.is_none());
    }

    #[test]
    fn update_request_carries_an_explicit_false() {
        let request = UpdateMealRequest {
            in_diet: Some(false),
            ..Default::default()
        };
        let changes = request.into_changes().unwrap();
        assert_eq!(changes.in_diet, Some(false));
    }

    #[test]
    fn update_request_rejects_malformed_date_time() {
        let request = UpdateMealRequest {
            date_time: Some("tomorrow noon".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.into_changes(),
            Err(ApiError::InvalidFormat(_))
        ));
    }
}
