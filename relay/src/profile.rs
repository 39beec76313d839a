//! User profile resolution.
//!
//! Failure here is an explicit `Err` arm rather than a silently substituted
//! default: every caller has to decide what to degrade to, which in this
//! daemon is always `UserProfile::fallback()` after logging.

use std::sync::Arc;

use gembot_line::{LineClient, LineError, Profile};
use thiserror::Error;

/// Error type for profile resolution
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile lookup failed: {0}")]
    LookupFailed(#[from] LineError),
}

/// A user's display profile, fetched per event and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: String,
    /// BCP-47-ish language code.
    pub language: String,
}

impl UserProfile {
    /// The profile callers substitute when resolution fails.
    pub fn fallback() -> Self {
        Self {
            display_name: "User".to_string(),
            language: "en".to_string(),
        }
    }

    /// Map a platform profile, degrading missing fields to the fallback
    /// values.
    fn from_platform(profile: Profile) -> Self {
        Self {
            display_name: if profile.display_name.is_empty() {
                "User".to_string()
            } else {
                profile.display_name
            },
            language: profile.language.unwrap_or_else(|| "en".to_string()),
        }
    }
}

/// Resolves display name and language through the platform profile
/// endpoint.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    line: Arc<LineClient>,
}

impl ProfileResolver {
    pub fn new(line: Arc<LineClient>) -> Self {
        Self { line }
    }

    /// Fetch the user's profile. Missing fields inside a successful
    /// response degrade here; transport and API failures surface as the
    /// error arm.
    pub async fn resolve(&self, user_id: &str) -> Result<UserProfile, ProfileError> {
        let profile = self.line.get_profile(user_id).await?;
        Ok(UserProfile::from_platform(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_profile(display_name: &str, language: Option<&str>) -> Profile {
        Profile {
            display_name: display_name.to_string(),
            user_id: "U1".to_string(),
            language: language.map(str::to_string),
            picture_url: None,
            status_message: None,
        }
    }

    #[test]
    fn fallback_profile_is_the_documented_default() {
        let fallback = UserProfile::fallback();

        assert_eq!(fallback.display_name, "User");
        assert_eq!(fallback.language, "en");
    }

    #[test]
    fn complete_platform_profile_maps_through() {
        let profile = UserProfile::from_platform(platform_profile("Alice", Some("ja")));

        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.language, "ja");
    }

    #[test]
    fn missing_fields_degrade_to_fallback_values() {
        let profile = UserProfile::from_platform(platform_profile("", None));

        assert_eq!(profile, UserProfile::fallback());
    }
}
