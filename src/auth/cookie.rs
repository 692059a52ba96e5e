// Refresh token cookie handling
// The refresh token is only ever sent to the refresh endpoint, never readable from scripts

use axum::http::{header, HeaderMap};

pub const REFRESH_COOKIE_NAME: &str = "rtk";
pub const REFRESH_COOKIE_PATH: &str = "/api/users/refresh";

/// Builds `Set-Cookie` values for the refresh token
#[derive(Debug, Clone, Copy)]
pub struct RefreshCookie {
    secure: bool,
}

impl RefreshCookie {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Cookie carrying a refresh token for `max_age` seconds
    pub fn set(&self, token: &str, max_age: i64) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path={}; Max-Age={}{}",
            REFRESH_COOKIE_NAME,
            token,
            REFRESH_COOKIE_PATH,
            max_age,
            self.secure_suffix()
        )
    }

    /// Cookie that makes the browser drop the refresh token
    pub fn clear(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Strict; Path={}; Max-Age=0{}",
            REFRESH_COOKIE_NAME,
            REFRESH_COOKIE_PATH,
            self.secure_suffix()
        )
    }

    fn secure_suffix(&self) -> &'static str {
        if self.secure {
            "; Secure"
        } else {
            ""
        }
    }
}

/// Reads the refresh token from the request's `Cookie` headers
pub fn read_refresh_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == REFRESH_COOKIE_NAME && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_set_cookie_attributes() {
        let cookie = RefreshCookie::new(false).set("abc.def.ghi", 604_800);

        assert!(cookie.starts_with("rtk=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/api/users/refresh"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_in_production() {
        assert!(RefreshCookie::new(true).set("t", 1).ends_with("; Secure"));
        assert!(RefreshCookie::new(true).clear().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = RefreshCookie::new(false).clear();
        assert!(cookie.starts_with("rtk=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Path=/api/users/refresh"));
    }

    #[test]
    fn test_read_refresh_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; rtk=token-value; lang=en"),
        );
        assert_eq!(read_refresh_token(&headers), Some("token-value".to_string()));
    }

    #[test]
    fn test_read_refresh_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(read_refresh_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("rtk=; other=1"));
        assert_eq!(read_refresh_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("xrtk=nope"));
        assert_eq!(read_refresh_token(&headers), None);
    }
}
