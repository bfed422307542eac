//! Classification of silent token failures.
//!
//! Decides whether a silent acquisition failure can be fixed by prompting
//! the user. The default rules look for the identity platform's
//! interaction markers in the error; other backends (or localized error
//! text) plug in their own [`InteractionClassifier`].

use super::provider::ProviderError;

/// Error markers that mean the user has to interact (sign in or consent).
pub const INTERACTION_MARKERS: [&str; 3] =
    ["consent_required", "interaction_required", "login_required"];

/// What a silent acquisition failure means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilentFailure {
    /// Retry once with an interactive prompt.
    InteractionRequired,
    /// Propagate unchanged.
    Other,
}

/// Maps raw provider failures onto [`SilentFailure`].
pub trait InteractionClassifier: Send + Sync {
    fn classify(&self, error: &ProviderError) -> SilentFailure;
}

/// Matches a list of markers against the error code and message.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    markers: Vec<String>,
}

impl MarkerClassifier {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::with_markers(INTERACTION_MARKERS)
    }
}

impl InteractionClassifier for MarkerClassifier {
    fn classify(&self, error: &ProviderError) -> SilentFailure {
        if let Some(code) = error.code.as_deref()
            && self.markers.iter().any(|m| m == code)
        {
            return SilentFailure::InteractionRequired;
        }
        if error.message.is_empty() {
            return SilentFailure::Other;
        }
        if self
            .markers
            .iter()
            .any(|marker| error.message.contains(marker.as_str()))
        {
            SilentFailure::InteractionRequired
        } else {
            SilentFailure::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_marker_in_message_requires_interaction() {
        let classifier = MarkerClassifier::default();
        for marker in INTERACTION_MARKERS {
            let err = ProviderError::new(format!("AADSTS50058: {marker}: silent sign-in failed"));
            assert_eq!(
                classifier.classify(&err),
                SilentFailure::InteractionRequired,
                "marker {marker}"
            );
        }
    }

    #[test]
    fn marker_code_requires_interaction() {
        let classifier = MarkerClassifier::default();
        let err = ProviderError::with_code("consent_required", "The user has not consented");
        assert_eq!(classifier.classify(&err), SilentFailure::InteractionRequired);
    }

    #[test]
    fn unrelated_failure_propagates() {
        let classifier = MarkerClassifier::default();
        let err = ProviderError::with_code("temporarily_unavailable", "network down");
        assert_eq!(classifier.classify(&err), SilentFailure::Other);
    }

    #[test]
    fn empty_message_is_not_interaction() {
        let classifier = MarkerClassifier::default();
        assert_eq!(
            classifier.classify(&ProviderError::new("")),
            SilentFailure::Other
        );
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let classifier = MarkerClassifier::with_markers(["anmeldung_erforderlich"]);
        assert_eq!(
            classifier.classify(&ProviderError::new("anmeldung_erforderlich")),
            SilentFailure::InteractionRequired
        );
        assert_eq!(
            classifier.classify(&ProviderError::new("interaction_required")),
            SilentFailure::Other
        );
    }
}
