use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::user::profile::{Profile, ProfileChanges};
use crate::user::repo::User;
use crate::validate::{is_valid_email, FieldMap};

pub const MIN_PASSWORD_LEN: usize = 5;

/// Public projection of a user. The password never leaves the system.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub email: String,
    pub name: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileShape {
    pub calorie_goal: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub height: Option<Decimal>,
    pub gender: Option<String>,
}

impl From<Profile> for ProfileShape {
    fn from(p: Profile) -> Self {
        Self {
            calorie_goal: p.calorie_goal,
            weight: p.weight,
            height: p.height,
            gender: p.gender,
        }
    }
}

/// Display names are restricted: a leading word character, then word
/// characters or dots, at most 30 characters, no `..` and no trailing dot.
pub fn is_valid_username(name: &str) -> bool {
    lazy_static! {
        static ref NAME_RE: Regex = Regex::new(r"^\w[\w.]{0,29}$").unwrap();
    }
    NAME_RE.is_match(name) && !name.contains("..") && !name.ends_with('.')
}

#[derive(Debug)]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub name: String,
    pub fullname: Option<String>,
}

pub fn parse_signup(body: Value) -> Result<SignupData, ApiError> {
    let mut fm = FieldMap::new(body)?;

    let email = fm.required_string("email");
    if !email.is_empty() && !is_valid_email(&email) {
        fm.error("email", "Enter a valid email address.");
    }

    let password = fm.required_string("password");
    if !password.is_empty() && password.chars().count() < MIN_PASSWORD_LEN {
        fm.error("password", "Ensure this field has at least 5 characters.");
    }

    let name = fm.required_string("name");
    if !name.is_empty() && !is_valid_username(&name) {
        fm.error("name", "Invalid username");
    }

    let fullname = fm.optional_string("fullname");

    fm.finish()?;
    Ok(SignupData {
        email,
        password,
        name,
        fullname,
    })
}

#[derive(Debug)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

pub fn parse_token_request(body: Value) -> Result<TokenRequest, ApiError> {
    let mut fm = FieldMap::new(body)?;

    let email = fm.required_string("email");
    if !email.is_empty() && !is_valid_email(&email) {
        fm.error("email", "Enter a valid email address.");
    }
    let password = fm.required_string("password");

    fm.finish()?;
    Ok(TokenRequest { email, password })
}

/// Partial self-service update; every field optional, validated when present.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

pub fn parse_user_update(body: Value) -> Result<UserUpdate, ApiError> {
    let mut fm = FieldMap::new(body)?;

    let email = fm.optional_string("email");
    if let Some(email) = &email {
        if !is_valid_email(email) {
            fm.error("email", "Enter a valid email address.");
        }
    }

    let password = fm.optional_string("password");
    if let Some(password) = &password {
        if password.chars().count() < MIN_PASSWORD_LEN {
            fm.error("password", "Ensure this field has at least 5 characters.");
        }
    }

    let name = fm.optional_string("name");
    if let Some(name) = &name {
        if !is_valid_username(name) {
            fm.error("name", "Invalid username");
        }
    }

    fm.finish()?;
    Ok(UserUpdate {
        email,
        password,
        name,
    })
}

pub fn parse_profile_update(body: Value) -> Result<ProfileChanges, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let calorie_goal = fm.optional_decimal("calorie_goal");
    let weight = fm.optional_decimal("weight");
    let height = fm.optional_decimal("height");
    let gender = fm.optional_string("gender");
    fm.finish()?;
    Ok(ProfileChanges {
        calorie_goal,
        weight,
        height,
        gender,
    })
}
