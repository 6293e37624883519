//! Message form state.

use thiserror::Error;

use crate::guestbook::submission::{validate_message, MessageLengthError, MAX_MESSAGE_CHARS};

/// Why the form cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Length(#[from] MessageLengthError),

    #[error("A message is already being sent")]
    Submitting,
}

/// Text input plus submission state.
#[derive(Debug, Clone, Default)]
pub struct MessageForm {
    text: String,
    submitting: bool,
    error: Option<FormError>,
}

impl MessageForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.error = None;
    }

    /// Characters typed so far.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Counter shown under the input, e.g. `12/140`.
    pub fn counter(&self) -> String {
        format!("{}/{}", self.char_count(), MAX_MESSAGE_CHARS)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Last validation error, cleared when the text changes.
    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    /// Validate the current text and return it for submission.
    pub fn validate(&mut self) -> Result<String, FormError> {
        let result = if self.submitting {
            Err(FormError::Submitting)
        } else {
            validate_message(&self.text)
                .map(|()| self.text.clone())
                .map_err(FormError::from)
        };
        self.error = result.as_ref().err().copied();
        result
    }

    pub fn begin_submit(&mut self) {
        self.submitting = true;
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    /// Clear the input after a successful send.
    pub fn reset(&mut self) {
        self.text.clear();
        self.error = None;
        self.submitting = false;
    }
}
