//! Format detection and parsing for fixture files.

use crate::config::error::ConfigError;
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Yaml,
    Json,
    Jsonc,
    Unknown,
}

impl FileType {
    /// Detect the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => FileType::Yaml,
            "json" => FileType::Json,
            "jsonc" => FileType::Jsonc,
            _ => FileType::Unknown,
        }
    }
}

/// Remove `//` and `/* */` comments outside of string literals.
///
/// Line comments keep their terminating newline so error positions still
/// line up with the source.
pub fn strip_json_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|&n| n != '\n' && n != '\r').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

pub fn parse_jsonc<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    parse_json(&strip_json_comments(content))
}

pub fn parse_yaml<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Parse `content` in the format implied by `path`.
pub fn parse_file<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, ConfigError> {
    match FileType::from_path(path) {
        FileType::Yaml => parse_yaml(content),
        FileType::Json => parse_json(content),
        FileType::Jsonc => parse_jsonc(content),
        FileType::Unknown => Err(ConfigError::UnknownFileType(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{json, Value};

    #[rstest]
    #[case("fixtures.yaml", FileType::Yaml)]
    #[case("fixtures.YML", FileType::Yaml)]
    #[case("dir/patients.json", FileType::Json)]
    #[case("patients.JSONC", FileType::Jsonc)]
    #[case("patients.txt", FileType::Unknown)]
    #[case("patients", FileType::Unknown)]
    fn test_file_type(#[case] path: &str, #[case] expected: FileType) {
        assert_eq!(FileType::from_path(Path::new(path)), expected);
    }

    #[rstest]
    #[case(r#"{"a": 1}"#, r#"{"a": 1}"#)]
    #[case("{\"a\": 1} // trailing", "{\"a\": 1} ")]
    #[case("{\"a\": 1} // trailing\n", "{\"a\": 1} \n")]
    #[case("{/* inline */\"a\": 1}", "{\"a\": 1}")]
    #[case(r#"{"url": "http://x//y"}"#, r#"{"url": "http://x//y"}"#)]
    #[case(r#"{"s": "/* kept */"}"#, r#"{"s": "/* kept */"}"#)]
    #[case(r#"{"q": "say \"hi\" // still string"}"#, r#"{"q": "say \"hi\" // still string"}"#)]
    #[case("/* a ** b */{}", "{}")]
    fn test_strip_json_comments(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_json_comments(input), expected);
    }

    #[rstest]
    fn test_parse_jsonc() {
        let content = r#"
            // seed records
            {
                "id": 1, /* primary key */
                "name": "Joe"
            }
        "#;
        let value: Value = parse_jsonc(content).unwrap();
        assert_eq!(value, json!({"id": 1, "name": "Joe"}));
    }

    #[rstest]
    #[case("f.yaml", "id: 1\nname: Joe\n")]
    #[case("f.json", r#"{"id": 1, "name": "Joe"}"#)]
    #[case("f.jsonc", "{\"id\": 1, // id\n\"name\": \"Joe\"}")]
    fn test_parse_file(#[case] path: &str, #[case] content: &str) {
        let value: Value = parse_file(content, Path::new(path)).unwrap();
        assert_eq!(value, json!({"id": 1, "name": "Joe"}));
    }

    #[rstest]
    fn test_parse_file_unknown_type() {
        let err = parse_file::<Value>("{}", Path::new("f.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFileType(p) if p == "f.toml"));
    }

    #[rstest]
    fn test_parse_json_invalid() {
        assert!(matches!(
            parse_json::<Value>("{nope").unwrap_err(),
            ConfigError::Json(_)
        ));
    }
}
