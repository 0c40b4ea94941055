use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::activity::repo::{Activity, ActivityChanges, NewActivity};
use crate::error::ApiError;
use crate::validate::FieldMap;

/// Activities are small enough that list and detail share one shape.
#[derive(Debug, Serialize)]
pub struct ActivityShape {
    pub id: i64,
    pub title: String,
    pub met: Decimal,
}

impl From<Activity> for ActivityShape {
    fn from(a: Activity) -> Self {
        Self {
            id: a.id,
            title: a.title,
            met: a.met,
        }
    }
}

pub fn parse_create(user_id: i64, body: Value) -> Result<NewActivity, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let title = fm.required_string("title");
    let met = fm.required_decimal("met");
    fm.finish()?;
    Ok(NewActivity {
        user_id,
        title,
        met,
    })
}

pub fn parse_changes(body: Value, partial: bool) -> Result<ActivityChanges, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let changes = if partial {
        ActivityChanges {
            title: fm.optional_string("title"),
            met: fm.optional_decimal("met"),
        }
    } else {
        ActivityChanges {
            title: Some(fm.required_string("title")),
            met: Some(fm.required_decimal("met")),
        }
    };
    fm.finish()?;
    Ok(changes)
}
