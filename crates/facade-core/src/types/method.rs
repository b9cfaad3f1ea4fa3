//! HTTP methods accepted by routes.

use crate::error::FacadeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP method for route matching
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = FacadeError;

    /// Methods are matched exactly, upper case only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(FacadeError::validation(format!(
                "{other} is not a valid HTTP method."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case("GET", HttpMethod::Get)]
    #[case("POST", HttpMethod::Post)]
    #[case("PUT", HttpMethod::Put)]
    #[case("PATCH", HttpMethod::Patch)]
    #[case("DELETE", HttpMethod::Delete)]
    #[case("HEAD", HttpMethod::Head)]
    fn test_parse_method(#[case] input: &str, #[case] expected: HttpMethod) {
        let method: HttpMethod = input.parse().expect("valid method");
        assert_eq!(method, expected);
        assert_eq!(method.to_string(), input);
    }

    #[rstest]
    #[case("get")]
    #[case("OPTIONS")]
    #[case("FETCH")]
    #[case("")]
    fn test_parse_invalid_method(#[case] input: &str) {
        let err = input.parse::<HttpMethod>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("is not a valid HTTP method"));
    }

    #[rstest]
    fn test_method_serializes_upper_case() {
        let json = serde_json::to_string(&HttpMethod::Delete).expect("Should serialize");
        assert_eq!(json, "\"DELETE\"");
    }
}
