//! Error taxonomy for the form generation pipeline.
//!
//! Every failure leaves the engine as a [`FormError`] value carrying a stable
//! code. Detector logic never fails; the codes below are reserved for empty
//! or unreadable input, malformed caller input, and assembly faults.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::assembler::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Empty input, unreadable rows, or invalid tokenizer options.
    #[error("{message}")]
    Csv { message: String },

    /// Input parsed but holds no data rows to profile.
    #[error("{message}")]
    Analysis { message: String },

    /// Unexpected failure while detecting field types (e.g. malformed overrides).
    #[error("{message}")]
    Detection { message: String },

    /// Failure while assembling the final schema.
    #[error("{message}")]
    Generation { message: String },

    #[error("generation cancelled before {stage} stage")]
    Cancelled { stage: Stage },
}

impl FormError {
    pub fn csv(message: impl Into<String>) -> Self {
        FormError::Csv {
            message: message.into(),
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        FormError::Analysis {
            message: message.into(),
        }
    }

    pub fn detection(message: impl Into<String>) -> Self {
        FormError::Detection {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        FormError::Generation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            FormError::Csv { .. } => "CSV_ERROR",
            FormError::Analysis { .. } => "ANALYSIS_ERROR",
            FormError::Detection { .. } => "DETECTION_ERROR",
            FormError::Generation { .. } => "GENERATION_ERROR",
            FormError::Cancelled { .. } => "CANCELLED",
        }
    }
}

impl Serialize for FormError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("FormError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
