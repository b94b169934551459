//! Application state for the upload → effect → result loop.
//!
//! The controller never blocks: `request_effect` hands back an [`EffectJob`]
//! for the caller to run off the UI thread, and the result comes back
//! through [`Controller::complete`]. Every job is stamped with the
//! generation it was issued under so late answers for a file the user has
//! since replaced or reset are dropped.

use crate::codec::{self, ImageFile};
use crate::effect::Effect;
use crate::error::EditError;
use crate::gemini::{EditOutcome, ImageEditor, InlineImage};

const UPLOAD_FIRST: &str = "Please upload an image first.";
const FALLBACK_RESULT_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file: ImageFile,
    pub preview_data_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub image: InlineImage,
}

impl EditResult {
    pub fn data_url(&self) -> String {
        let mime = if self.image.mime_type.is_empty() {
            FALLBACK_RESULT_MIME
        } else {
            &self.image.mime_type
        };
        codec::to_data_url(mime, &self.image.data)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub is_loading: bool,
    pub loading_message: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Ready,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Identifies the request a completion belongs to.
pub struct JobTicket(u64);

#[derive(Debug, Clone)]
/// Work needed to apply one effect, safe to move to another thread.
pub struct EffectJob {
    pub ticket: JobTicket,
    pub effect: Effect,
    pub file: ImageFile,
}

impl EffectJob {
    /// Encodes the file, asks `editor` for the edit and insists on an image.
    pub fn run(&self, editor: &dyn ImageEditor) -> Result<InlineImage, EditError> {
        let encoded = codec::encode_file(&self.file)?;
        match editor.edit(&encoded, self.effect.instruction())? {
            EditOutcome::Image(image) => Ok(image),
            EditOutcome::Refusal(text) => Err(EditError::Refusal(text)),
            EditOutcome::Empty => Err(EditError::NoImage),
        }
    }
}

#[derive(Debug, Default)]
pub struct Controller {
    uploaded: Option<UploadedImage>,
    result: Option<EditResult>,
    ui: UiState,
    generation: u64,
    revision: u64,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (&self.uploaded, self.ui.is_loading) {
            (None, _) => Phase::Empty,
            (Some(_), true) => Phase::Processing,
            (Some(_), false) => Phase::Ready,
        }
    }

    pub fn uploaded(&self) -> Option<&UploadedImage> {
        self.uploaded.as_ref()
    }

    pub fn preview_data_url(&self) -> Option<&str> {
        self.uploaded.as_ref().map(|u| u.preview_data_url.as_str())
    }

    #[cfg(test)]
    pub fn result(&self) -> Option<&EditResult> {
        self.result.as_ref()
    }

    pub fn edited_image(&self) -> Option<String> {
        self.result.as_ref().map(EditResult::data_url)
    }

    #[cfg(test)]
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn is_loading(&self) -> bool {
        self.ui.is_loading
    }

    pub fn loading_message(&self) -> &str {
        &self.ui.loading_message
    }

    pub fn error(&self) -> Option<&str> {
        self.ui.error.as_deref()
    }

    /// Bumped on every state change the UI might need to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Shows `message` in the error banner without touching anything else.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.ui.error = Some(message.into());
        self.revision += 1;
    }

    /// Replaces the current image. Ignored while a request is in flight.
    pub fn upload(&mut self, file: ImageFile) {
        if self.ui.is_loading {
            tracing::warn!(name = %file.name, "ignoring upload while an effect is running");
            return;
        }
        let preview_data_url = match codec::read_data_url(&file) {
            Ok(url) => url,
            Err(err) => {
                tracing::error!(path = %file.path.display(), %err, "could not read upload");
                self.report_error(err.to_string());
                return;
            }
        };

        tracing::info!(name = %file.name, mime = %file.mime_type, "image uploaded");
        self.uploaded = Some(UploadedImage {
            file,
            preview_data_url,
        });
        self.result = None;
        self.ui = UiState::default();
        self.generation += 1;
        self.revision += 1;
    }

    /// Enters Processing and returns the job to run, or reports that there is
    /// nothing to process.
    pub fn request_effect(&mut self, effect: Effect) -> Option<EffectJob> {
        let Some(uploaded) = &self.uploaded else {
            self.report_error(UPLOAD_FIRST);
            return None;
        };
        let file = uploaded.file.clone();

        self.generation += 1;
        self.revision += 1;
        self.result = None;
        self.ui = UiState {
            is_loading: true,
            loading_message: effect.loading_message(),
            error: None,
        };

        tracing::info!(effect = effect.name(), name = %file.name, "effect requested");
        Some(EffectJob {
            ticket: JobTicket(self.generation),
            effect,
            file,
        })
    }

    /// Applies a finished job. Returns `false` if the job was superseded.
    pub fn complete(&mut self, ticket: JobTicket, outcome: Result<InlineImage, EditError>) -> bool {
        if ticket != JobTicket(self.generation) {
            tracing::debug!(?ticket, current = self.generation, "discarding stale result");
            return false;
        }

        match outcome {
            Ok(image) => {
                self.result = Some(EditResult { image });
                self.ui.error = None;
            }
            Err(err) => {
                tracing::error!(%err, "effect failed");
                self.result = None;
                self.ui.error = Some(err.to_string());
            }
        }
        self.ui.is_loading = false;
        self.ui.loading_message.clear();
        self.revision += 1;
        true
    }

    pub fn reset(&mut self) {
        self.uploaded = None;
        self.result = None;
        self.ui = UiState::default();
        self.generation += 1;
        self.revision += 1;
    }
}
