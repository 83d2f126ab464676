use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::user;

/// Key under which errors that belong to the whole form are reported.
pub const NON_FIELD_ERRORS: &str = "__all__";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

/// Where the user is sent next: a location plus positional path segments
/// and keyword query parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub location: String,
    pub args: Vec<String>,
    pub kwargs: BTreeMap<String, String>,
}

impl RedirectTarget {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            args: vec![],
            kwargs: BTreeMap::new(),
        }
    }

    pub fn to_uri(&self) -> String {
        let mut uri = self.location.clone();
        if !self.args.is_empty() {
            if !uri.ends_with('/') {
                uri.push('/');
            }
            for arg in &self.args {
                uri.push_str(arg);
                uri.push('/');
            }
        }
        if !self.kwargs.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.kwargs.iter())
                .finish();
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&query);
        }
        uri
    }
}

/// The parts of an incoming request the backends need to decide on redirects.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub host: String,
    pub next: Option<String>,
}

/// Everything an activation email needs to know about the running site.
#[derive(Serialize, Debug, Clone)]
pub struct SiteContext {
    pub name: String,
    pub domain: String,
    pub protocol: String,
    pub activation_path: String,
    pub activation_days: i64,
}

impl SiteContext {
    pub fn activation_link(&self, activation_key: &str) -> String {
        format!(
            "{}://{}{}{}/",
            self.protocol, self.domain, self.activation_path, activation_key
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFailureReason {
    Malformed,
    NotFound,
    Expired,
    AlreadyActivated,
}

/// Terminal "activation failed" state shown to the user instead of a fault.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActivationFailure {
    pub reason: ActivationFailureReason,
    pub activation_key: String,
}

impl ActivationFailure {
    pub fn new(reason: ActivationFailureReason, activation_key: &str) -> Self {
        Self {
            reason,
            activation_key: activation_key.to_string(),
        }
    }

    pub fn message(&self) -> &'static str {
        match self.reason {
            ActivationFailureReason::Malformed | ActivationFailureReason::NotFound => {
                "This activation link is invalid."
            }
            ActivationFailureReason::Expired => {
                "This activation link has expired. Please request a new one."
            }
            ActivationFailureReason::AlreadyActivated => "This account has already been activated.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    Activated(user::Model),
    Failed(ActivationFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyVerification {
    Valid(user::Model),
    Invalid(ActivationFailure),
}

/// Where a user stands in the activation lifecycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// Inactive and no profile: never registered through this system.
    Unregistered,
    Pending,
    /// Profile exists but its window elapsed; only recreate leaves this state.
    Expired,
    Activated,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResponseErrors {
    Fields(FieldErrors),
    Messages(Vec<String>),
}

/// Body returned to programmatic clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StructuredResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<ResponseErrors>,
}

impl StructuredResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: None,
        }
    }

    pub fn field_errors(errors: FieldErrors) -> Self {
        Self {
            success: false,
            errors: Some(ResponseErrors::Fields(errors)),
        }
    }

    pub fn messages(messages: Vec<String>) -> Self {
        Self {
            success: false,
            errors: Some(ResponseErrors::Messages(messages)),
        }
    }
}
