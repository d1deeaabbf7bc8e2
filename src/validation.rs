//! Request body validation.
//!
//! Bodies arrive as untyped JSON so that every problem can be reported per
//! field in one response instead of failing on the first bad key.

use crate::entities::{NewCategory, NewTask, NewUser, Priority, TaskUpdate};
use crate::error::{ApiError, FieldError};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

pub fn new_task(body: &Value) -> Result<NewTask, ApiError> {
    let object = as_object(body)?;
    let mut errors = Vec::new();

    let title = required_text(object, "title", &mut errors);
    let priority = required_priority(object, &mut errors);
    let completed = required_bool(object, "completed", &mut errors);
    let description = optional_text(object, "description", &mut errors).flatten();
    let category = optional_text(object, "category", &mut errors).flatten();
    let due_date = optional_text(object, "dueDate", &mut errors).flatten();

    match (title, priority, completed) {
        (Some(title), Some(priority), Some(completed)) if errors.is_empty() => Ok(NewTask {
            title,
            description,
            category,
            priority,
            completed,
            due_date,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

pub fn task_update(body: &Value) -> Result<TaskUpdate, ApiError> {
    let object = as_object(body)?;
    let mut errors = Vec::new();

    let title = match object.get("title") {
        None => None,
        Some(value) => text(value, "title", &mut errors),
    };
    let priority = match object.get("priority") {
        None => None,
        Some(value) => priority(value, &mut errors),
    };
    let completed = match object.get("completed") {
        None => None,
        Some(value) => boolean(value, "completed", &mut errors),
    };
    let update = TaskUpdate {
        title,
        description: optional_text(object, "description", &mut errors),
        category: optional_text(object, "category", &mut errors),
        priority,
        completed,
        due_date: optional_text(object, "dueDate", &mut errors),
    };

    if errors.is_empty() {
        Ok(update)
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn new_category(body: &Value) -> Result<NewCategory, ApiError> {
    let object = as_object(body)?;
    let mut errors = Vec::new();

    let name = required_text(object, "name", &mut errors);
    let color = required_text(object, "color", &mut errors);

    match (name, color) {
        (Some(name), Some(color)) => Ok(NewCategory { name, color }),
        _ => Err(ApiError::Validation(errors)),
    }
}

pub fn credentials(body: &Value) -> Result<NewUser, ApiError> {
    let object = as_object(body)?;
    let mut errors = Vec::new();

    let username = required_text(object, "username", &mut errors);
    let password = required_text(object, "password", &mut errors);

    match (username, password) {
        (Some(username), Some(password)) => Ok(NewUser { username, password }),
        _ => Err(ApiError::Validation(errors)),
    }
}

fn as_object(body: &Value) -> Result<&Object, ApiError> {
    body.as_object().ok_or_else(|| {
        ApiError::Validation(vec![FieldError::new("body", "must be a JSON object")])
    })
}

fn required_text(
    object: &Object,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(value) => text(value, field, errors),
    }
}

fn required_priority(object: &Object, errors: &mut Vec<FieldError>) -> Option<Priority> {
    match object.get("priority") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("priority", "is required"));
            None
        }
        Some(value) => priority(value, errors),
    }
}

fn required_bool(
    object: &Object,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<bool> {
    match object.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(value) => boolean(value, field, errors),
    }
}

// Missing -> None, null -> Some(None), string -> Some(Some(..)).
fn optional_text(
    object: &Object,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<Option<String>> {
    match object.get(field)? {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => {
            errors.push(FieldError::new(field, "must be a string or null"));
            None
        }
    }
}

fn text(value: &Value, field: &'static str, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => {
            errors.push(FieldError::new(field, "must not be empty"));
            None
        }
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.push(FieldError::new(field, "must be a string"));
            None
        }
    }
}

fn priority(value: &Value, errors: &mut Vec<FieldError>) -> Option<Priority> {
    let parsed = match value {
        Value::String(s) => s.parse::<Priority>(),
        _ => Err("must be one of low, medium, high".to_string()),
    };
    parsed
        .map_err(|message| errors.push(FieldError::new("priority", message)))
        .ok()
}

fn boolean(value: &Value, field: &'static str, errors: &mut Vec<FieldError>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => {
            errors.push(FieldError::new(field, "must be a boolean"));
            None
        }
    }
}
