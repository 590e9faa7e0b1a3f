//! Form validation rules.
//!
//! Lengths count Unicode scalar values of the raw input. Input that is
//! blank after trimming is reported as empty before any length rule runs.

use std::fmt;

use crate::model::{AnswerDraft, CommentDraft, QuestionDraft};

pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MIN_ANSWER_CHARS: usize = 5;
pub const MIN_COMMENT_CHARS: usize = 2;

/// Form field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Answer,
    Comment,
    Email,
    Password,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Answer => "Answer",
            Field::Comment => "Comment",
            Field::Email => "Email",
            Field::Password => "Password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input rejected before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: Field },
    TooShort { field: Field, min: usize, actual: usize },
    /// One or more of the password-change fields is blank.
    MissingFields,
    /// New password and its confirmation differ.
    PasswordMismatch,
}

impl ValidationError {
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::Empty { field } | ValidationError::TooShort { field, .. } => {
                Some(*field)
            }
            ValidationError::MissingFields | ValidationError::PasswordMismatch => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty { field } => write!(f, "{field} cannot be empty."),
            ValidationError::TooShort { field, min, .. } => {
                write!(f, "{field} must be at least {min} characters.")
            }
            ValidationError::MissingFields => write!(f, "Please fill all fields."),
            ValidationError::PasswordMismatch => write!(f, "New passwords do not match."),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Input that can be checked before submission.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Non-blank and at least `min` characters long.
pub fn require_text(field: Field, text: &str, min: usize) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    let actual = text.chars().count();
    if actual < min {
        return Err(ValidationError::TooShort { field, min, actual });
    }
    Ok(())
}

impl Validate for QuestionDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Field::Title, &self.title, MIN_TITLE_CHARS)?;
        require_text(Field::Description, &self.description, MIN_DESCRIPTION_CHARS)
    }
}

impl Validate for AnswerDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Field::Answer, &self.text, MIN_ANSWER_CHARS)
    }
}

impl Validate for CommentDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Field::Comment, &self.text, MIN_COMMENT_CHARS)
    }
}

/// Credentials for sign-up / sign-in: both fields must be non-blank.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::Empty {
            field: Field::Email,
        });
    }
    if password.is_empty() {
        return Err(ValidationError::Empty {
            field: Field::Password,
        });
    }
    Ok(())
}

pub fn validate_password_change(
    old_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if old_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if new_password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tag;

    #[test]
    fn test_short_title_rejected() {
        let draft = QuestionDraft::new("abc", "short");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::TooShort {
                field: Field::Title,
                min: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn test_short_description_rejected() {
        let draft = QuestionDraft::new("Valid Title", "too short");
        let err = draft.validate().unwrap_err();
        assert_eq!(err.field(), Some(Field::Description));
        assert_eq!(err.to_string(), "Description must be at least 10 characters.");
    }

    #[test]
    fn test_valid_question() {
        let draft =
            QuestionDraft::new("Valid Title", "Valid description text").with_tags([Tag::React]);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_blank_is_empty_not_short() {
        let err = AnswerDraft::new("      ").validate().unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: Field::Answer });
        assert_eq!(err.to_string(), "Answer cannot be empty.");
    }

    #[test]
    fn test_boundaries() {
        assert!(AnswerDraft::new("abcd").validate().is_err());
        assert!(AnswerDraft::new("abcde").validate().is_ok());
        assert!(CommentDraft::new("a").validate().is_err());
        assert!(CommentDraft::new("ok").validate().is_ok());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // Two scalar values, six bytes.
        assert!(CommentDraft::new("日本").validate().is_ok());
        assert!(AnswerDraft::new("日本語").validate().is_err());
    }

    #[test]
    fn test_password_change_rules() {
        assert_eq!(
            validate_password_change("", "new", "new"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_password_change("old", "new1", "new2"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(validate_password_change("old", "new", "new").is_ok());
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials("a@b.c", "secret").is_ok());
        assert_eq!(
            validate_credentials(" ", "secret"),
            Err(ValidationError::Empty { field: Field::Email })
        );
        assert_eq!(
            validate_credentials("a@b.c", ""),
            Err(ValidationError::Empty {
                field: Field::Password
            })
        );
    }
}
