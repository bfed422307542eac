//! Installation id resolution from the page URL.

use tracing::debug;
use url::Url;

/// Query parameter carrying the installation id.
pub const INSTALLATION_ID_PARAM: &str = "installation_id";

/// Read the installation id from `page_url`.
///
/// A missing parameter or an unparsable URL yields an empty string.
pub fn installation_id_from_url(page_url: &str) -> String {
    let url = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            debug!(error = %e, "page URL did not parse, no installation id");
            return String::new();
        }
    };
    url.query_pairs()
        .find(|(key, _)| key == INSTALLATION_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_query_parameter() {
        assert_eq!(
            installation_id_from_url("https://bandhan.azurewebsites.net/?installation_id=1234&setup_action=install"),
            "1234"
        );
    }

    #[test]
    fn decodes_percent_encoding() {
        assert_eq!(
            installation_id_from_url("http://localhost:3000/?installation_id=12%2034"),
            "12 34"
        );
    }

    #[test]
    fn absent_parameter_is_empty() {
        assert_eq!(installation_id_from_url("http://localhost:3000/"), "");
        assert_eq!(
            installation_id_from_url("http://localhost:3000/?other=1"),
            ""
        );
    }

    #[test]
    fn invalid_url_is_empty() {
        assert_eq!(installation_id_from_url("not a url"), "");
    }
}
