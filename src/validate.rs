use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldErrors};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const MAX_CHAR_LEN: usize = 255;

/// Payload wrapper that checks fields one by one and collects per-field
/// error messages. Required accessors return a placeholder on failure; the
/// recorded errors surface through `finish`, so placeholders never escape.
pub struct FieldMap {
    fields: Map<String, Value>,
    errors: FieldErrors,
}

impl FieldMap {
    pub fn new(body: Value) -> Result<Self, ApiError> {
        match body {
            Value::Object(fields) => Ok(Self {
                fields,
                errors: FieldErrors::new(),
            }),
            _ => Err(ApiError::non_field("Invalid data. Expected a dictionary.")),
        }
    }

    pub fn error(&mut self, name: &str, message: &str) {
        self.errors
            .entry(name.to_string())
            .or_default()
            .push(message.to_string());
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        match self.fields.remove(name) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    pub fn required_string(&mut self, name: &str) -> String {
        match self.take(name) {
            None => {
                self.error(name, "This field is required.");
                String::new()
            }
            Some(value) => self.coerce_string(name, value, false),
        }
    }

    pub fn optional_string(&mut self, name: &str) -> Option<String> {
        let value = self.take(name)?;
        Some(self.coerce_string(name, value, true))
    }

    /// Unbounded text field; blank allowed.
    pub fn optional_text(&mut self, name: &str) -> Option<String> {
        match self.take(name)? {
            Value::String(s) => Some(s),
            _ => {
                self.error(name, "Not a valid string.");
                Some(String::new())
            }
        }
    }

    fn coerce_string(&mut self, name: &str, value: Value, allow_blank: bool) -> String {
        let s = match value {
            Value::String(s) => s,
            _ => {
                self.error(name, "Not a valid string.");
                return String::new();
            }
        };
        if !allow_blank && s.is_empty() {
            self.error(name, "This field may not be blank.");
        } else if s.chars().count() > MAX_CHAR_LEN {
            self.error(
                name,
                "Ensure this field has no more than 255 characters.",
            );
        }
        s
    }

    pub fn required_decimal(&mut self, name: &str) -> Decimal {
        match self.take(name) {
            None => {
                self.error(name, "This field is required.");
                Decimal::ZERO
            }
            Some(value) => self.coerce_decimal(name, value),
        }
    }

    pub fn optional_decimal(&mut self, name: &str) -> Option<Decimal> {
        let value = self.take(name)?;
        Some(self.coerce_decimal(name, value))
    }

    fn coerce_decimal(&mut self, name: &str, value: Value) -> Decimal {
        let parsed = match &value {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        };
        match parsed {
            Some(d) => d,
            None => {
                self.error(name, "A valid number is required.");
                Decimal::ZERO
            }
        }
    }

    pub fn required_int(&mut self, name: &str) -> i32 {
        match self.take(name) {
            None => {
                self.error(name, "This field is required.");
                0
            }
            Some(value) => self.coerce_int(name, value),
        }
    }

    pub fn optional_int(&mut self, name: &str) -> Option<i32> {
        let value = self.take(name)?;
        Some(self.coerce_int(name, value))
    }

    fn coerce_int(&mut self, name: &str, value: Value) -> i32 {
        let parsed = match &value {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };
        match parsed {
            Some(v) => v,
            None => {
                self.error(name, "A valid integer is required.");
                0
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}
