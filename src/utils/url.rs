//! URL utilities for consistent URL handling
//!
//! Base URLs come from the environment or the defaults file and may carry
//! trailing slashes; these helpers keep endpoint construction free of
//! double slashes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use gemichat::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://generativelanguage.googleapis.com/v1beta/"),
///     "https://generativelanguage.googleapis.com/v1beta"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use gemichat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8080/v1beta/", "/models"),
///     "http://localhost:8080/v1beta/models"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// URL of a per-model method such as `generateContent`.
///
/// # Examples
///
/// ```
/// use gemichat::utils::url::model_method_url;
///
/// assert_eq!(
///     model_method_url(
///         "https://generativelanguage.googleapis.com/v1beta",
///         "gemini-1.0-pro",
///         "generateContent"
///     ),
///     "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.0-pro:generateContent"
/// );
/// ```
pub fn model_method_url(base_url: &str, model: &str, method: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    construct_api_url(base_url, &format!("models/{model}:{method}"))
}
