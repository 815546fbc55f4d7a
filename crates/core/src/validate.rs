use crate::catalog::Catalog;
use crate::interaction::FollowUp;
use crate::lead::{Lead, LeadPatch};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("a mobile phone or an email is required")]
    NoContactMethod,
    #[error("invalid email: {email}")]
    InvalidEmail { email: String },
    #[error("{field} '{value}' is not one of the configured options")]
    UnknownOption { field: &'static str, value: String },
    #[error("follow-up message is empty")]
    EmptyMessage,
}

/// Validate the contact data of a lead as it would be persisted.
pub fn validate_lead(lead: &Lead) -> Result<(), Vec<ValidationError>> {
    let validators: &[fn(&Lead) -> Vec<ValidationError>] =
        &[validate_name, validate_contact_method, validate_email];

    let errors: Vec<ValidationError> = validators.iter().flat_map(|v| v(lead)).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check catalog-backed fields. Only values being set are checked, so legacy
/// rows with retired options stay editable.
pub fn validate_choices(
    course: Option<&str>,
    channel: Option<&str>,
    gender: Option<&str>,
    catalog: &Catalog,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if let Some(course) = course.filter(|v| !v.trim().is_empty()) {
        if !catalog.has_course(course) {
            errors.push(ValidationError::UnknownOption {
                field: "course",
                value: course.to_string(),
            });
        }
    }
    if let Some(channel) = channel.filter(|v| !v.trim().is_empty()) {
        if !catalog.has_channel(channel) {
            errors.push(ValidationError::UnknownOption {
                field: "channel",
                value: channel.to_string(),
            });
        }
    }
    if let Some(gender) = gender.filter(|v| !v.trim().is_empty()) {
        if !catalog.has_gender(gender) {
            errors.push(ValidationError::UnknownOption {
                field: "gender",
                value: gender.to_string(),
            });
        }
    }
    errors
}

pub fn validate_patch_choices(patch: &LeadPatch, catalog: &Catalog) -> Vec<ValidationError> {
    validate_choices(
        patch.course.as_deref(),
        patch.channel.as_deref(),
        patch.gender.as_deref(),
        catalog,
    )
}

pub fn validate_follow_up(follow_up: &FollowUp, catalog: &Catalog) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if follow_up.message.trim().is_empty() {
        errors.push(ValidationError::EmptyMessage);
    }
    let status = follow_up.message_status.trim();
    if !status.is_empty() && !catalog.has_message_status(status) {
        errors.push(ValidationError::UnknownOption {
            field: "message_status",
            value: status.to_string(),
        });
    }
    let channel = follow_up.channel.trim();
    if !channel.is_empty() && !catalog.has_channel(channel) {
        errors.push(ValidationError::UnknownOption {
            field: "channel",
            value: channel.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_name(lead: &Lead) -> Vec<ValidationError> {
    if lead.name.trim().is_empty() {
        vec![ValidationError::MissingField { field: "name" }]
    } else {
        vec![]
    }
}

fn validate_contact_method(lead: &Lead) -> Vec<ValidationError> {
    if lead.mobile.is_empty() && lead.email.is_empty() {
        vec![ValidationError::NoContactMethod]
    } else {
        vec![]
    }
}

fn validate_email(lead: &Lead) -> Vec<ValidationError> {
    if !lead.email.is_empty() && !lead.email.contains('@') {
        vec![ValidationError::InvalidEmail {
            email: lead.email.clone(),
        }]
    } else {
        vec![]
    }
}
