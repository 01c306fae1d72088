//! Credential lookup from the process environment.

use jobtrail_core::ProviderId;

/// Login credentials for one provider's authenticated view.
///
/// Supplied via `<PROVIDER>_LOGIN_EMAIL` / `<PROVIDER>_LOGIN_PASSWORD`
/// environment variables (e.g. `TIKTOK_LOGIN_EMAIL`). Absence is not an
/// error at load time; adapters report it as "credentials unavailable" when
/// an authenticated fetch is actually attempted.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Login email address
    pub email: String,
    /// Login password
    pub password: String,
}

impl Credentials {
    /// Read credentials for `provider` from the environment, if both
    /// variables are present and non-empty.
    #[must_use]
    pub fn from_env(provider: &ProviderId) -> Option<Self> {
        let email = std::env::var(Self::email_var(provider)).ok()?;
        let password = std::env::var(Self::password_var(provider)).ok()?;

        if email.is_empty() || password.is_empty() {
            return None;
        }

        Some(Self { email, password })
    }

    /// Name of the email environment variable for `provider`.
    #[must_use]
    pub fn email_var(provider: &ProviderId) -> String {
        format!("{}_LOGIN_EMAIL", provider.env_prefix())
    }

    /// Name of the password environment variable for `provider`.
    #[must_use]
    pub fn password_var(provider: &ProviderId) -> String {
        format!("{}_LOGIN_PASSWORD", provider.env_prefix())
    }

    /// Human-readable description of the variables an operator must set.
    #[must_use]
    pub fn required_vars(provider: &ProviderId) -> String {
        format!(
            "{} and {}",
            Self::email_var(provider),
            Self::password_var(provider)
        )
    }
}
