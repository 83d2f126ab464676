use serde::{Deserialize, Serialize};

use super::types::{FieldErrors, NON_FIELD_ERRORS};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const USERNAME_CHARACTERS_MESSAGE: &str =
    "This value may contain only letters, numbers and @/./+/-/_ characters.";
pub const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email address.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "The two password fields didn't match.";
pub const USERNAME_EMAIL_MISMATCH_MESSAGE: &str = "The username and email address must match.";
pub const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";

const USERNAME_MAX_LENGTH: usize = 150;
const EMAIL_MAX_LENGTH: usize = 254;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    fn value_of(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "email" => &self.email,
            "password1" => &self.password1,
            "password2" => &self.password2,
            _ => "",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.is_empty() {
            errors.add("username", REQUIRED_MESSAGE);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED_MESSAGE);
        }
        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SetPasswordForm {
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl SetPasswordForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.new_password1.is_empty() {
            errors.add("new_password1", REQUIRED_MESSAGE);
        }
        if self.new_password2.is_empty() {
            errors.add("new_password2", REQUIRED_MESSAGE);
        }
        if errors.is_empty() && self.new_password1 != self.new_password2 {
            errors.add("new_password2", PASSWORD_MISMATCH_MESSAGE);
        }
        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Text,
    Email,
    Password,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValidator {
    Required,
    MaxLength(usize),
    UsernameCharacters,
    Email,
}

impl FieldValidator {
    fn check(&self, value: &str) -> Option<String> {
        match self {
            FieldValidator::Required => value.is_empty().then(|| REQUIRED_MESSAGE.to_string()),
            FieldValidator::MaxLength(max) => (value.chars().count() > *max).then(|| {
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max,
                    value.chars().count()
                )
            }),
            FieldValidator::UsernameCharacters => (!value.chars().all(|c| {
                c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
            }))
            .then(|| USERNAME_CHARACTERS_MESSAGE.to_string()),
            FieldValidator::Email => (!is_valid_email(value)).then(|| INVALID_EMAIL_MESSAGE.to_string()),
        }
    }
}

/// Checks that involve more than one field.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormRule {
    PasswordsMatch,
    UsernameEmailMatch,
}

impl FormRule {
    fn check(&self, form: &RegistrationForm) -> Option<&'static str> {
        match self {
            FormRule::PasswordsMatch => {
                (form.password1 != form.password2).then_some(PASSWORD_MISMATCH_MESSAGE)
            }
            FormRule::UsernameEmailMatch => {
                (form.username != form.email).then_some(USERNAME_EMAIL_MISMATCH_MESSAGE)
            }
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub validators: Vec<FieldValidator>,
}

/// Fields and validators a registration form must present.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<FormRule>,
}

impl FormSpec {
    pub fn registration() -> Self {
        Self {
            fields: vec![
                FieldSpec {
                    name: "username",
                    label: "Username",
                    widget: Widget::Text,
                    validators: vec![
                        FieldValidator::Required,
                        FieldValidator::MaxLength(USERNAME_MAX_LENGTH),
                        FieldValidator::UsernameCharacters,
                    ],
                },
                FieldSpec {
                    name: "email",
                    label: "Email address",
                    widget: Widget::Email,
                    validators: vec![
                        FieldValidator::Required,
                        FieldValidator::MaxLength(EMAIL_MAX_LENGTH),
                        FieldValidator::Email,
                    ],
                },
                FieldSpec {
                    name: "password1",
                    label: "Password",
                    widget: Widget::Password,
                    validators: vec![FieldValidator::Required],
                },
                FieldSpec {
                    name: "password2",
                    label: "Password (again)",
                    widget: Widget::Password,
                    validators: vec![FieldValidator::Required],
                },
            ],
            rules: vec![FormRule::PasswordsMatch],
        }
    }

    pub fn with_rule(mut self, rule: FormRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Field validators run first; form rules only run once every field is clean.
    pub fn validate(&self, form: &RegistrationForm) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for field in &self.fields {
            let value = form.value_of(field.name);
            if let Some(message) = field.validators.iter().find_map(|v| v.check(value)) {
                errors.add(field.name, message);
            }
        }
        if errors.is_empty() {
            for rule in &self.rules {
                if let Some(message) = rule.check(form) {
                    errors.add(NON_FIELD_ERRORS, message);
                }
            }
        }
        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
                && domain.split('.').all(|label| !label.is_empty())
                && domain.contains('.')
        }
        None => false,
    }
}
