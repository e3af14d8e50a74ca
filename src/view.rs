//! The view controller: which of the three pages a visitor sees, as a state machine.

use serde::{Deserialize, Serialize};

use crate::generation::GeneratedImage;

/// The active view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewState {
    /// The upload form, with the last failure message if there was one.
    Home {
        /// User-facing failure message.
        error: Option<String>,
    },
    /// A generation is in flight; the form is inert.
    Loading,
    /// A finished memory.
    Result {
        /// The generated image.
        image: GeneratedImage,
    },
    /// The mock admin dashboard.
    Admin,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::Home { error: None }
    }
}

/// Things that move the view controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// A complete form was submitted.
    Submit,
    /// The in-flight generation returned an image.
    Succeeded(GeneratedImage),
    /// The in-flight generation failed, carries the user-facing message.
    Failed(String),
    /// "Create another" on the result page.
    CreateAnother,
    /// The logo link.
    NavigateHome,
    /// The footer admin link.
    OpenAdmin,
}

/// An event that has no meaning in the current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidTransition {
    /// Submit while a generation is already running.
    AlreadyLoading,
    /// Submit from somewhere other than the home form.
    NotOnHome,
    /// A generation outcome arrived with nothing in flight.
    NotLoading,
}

impl std::fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyLoading => write!(f, "a generation is already in flight"),
            Self::NotOnHome => write!(f, "submission is only possible from the home view"),
            Self::NotLoading => write!(f, "no generation is in flight"),
        }
    }
}

impl std::error::Error for InvalidTransition {}

impl ViewState {
    /// Applies one event, returning the next state.
    pub fn apply(self, event: ViewEvent) -> Result<ViewState, InvalidTransition> {
        use ViewEvent as E;
        use ViewState as S;

        match (self, event) {
            (S::Home { .. }, E::Submit) => Ok(S::Loading),
            (S::Loading, E::Submit) => Err(InvalidTransition::AlreadyLoading),
            (S::Result { .. } | S::Admin, E::Submit) => Err(InvalidTransition::NotOnHome),

            (S::Loading, E::Succeeded(image)) => Ok(S::Result { image }),
            (S::Loading, E::Failed(message)) => Ok(S::Home {
                error: Some(message),
            }),
            (_, E::Succeeded(_) | E::Failed(_)) => Err(InvalidTransition::NotLoading),

            (_, E::CreateAnother) => Ok(S::Home { error: None }),
            (S::Home { error }, E::NavigateHome) => Ok(S::Home { error }),
            (_, E::NavigateHome) => Ok(S::Home { error: None }),
            (_, E::OpenAdmin) => Ok(S::Admin),
        }
    }

    /// True while a generation is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure message shown on the home form, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Home { error } => error.as_deref(),
            _ => None,
        }
    }

    /// The finished image, only present on the result view.
    pub fn image(&self) -> Option<&GeneratedImage> {
        match self {
            Self::Result { image } => Some(image),
            _ => None,
        }
    }
}
