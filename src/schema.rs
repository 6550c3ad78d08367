//! Request body validation for movies.
//!
//! Both entry points take an arbitrary JSON value and either return the typed
//! record or every field-level violation found. Keys the schema does not know
//! about (including `id`) are dropped, never rejected.

use crate::model::{Genre, MoviePatch, NewMovie};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;

pub const DEFAULT_RATE: u8 = 5;
const MIN_YEAR: f64 = 1900.0;
const MAX_YEAR: f64 = 2024.0;
const MAX_RATE: f64 = 10.0;
/// Largest integer a JSON number carries exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidType,
    TooSmall,
    TooBig,
    InvalidString,
    InvalidEnumValue,
    InvalidJson,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub code: ErrorCode,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl FieldError {
    pub fn new<M: Into<String>>(code: ErrorCode, path: Vec<PathSegment>, message: M) -> Self {
        FieldError {
            code,
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .path
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) => key.clone(),
                PathSegment::Index(index) => index.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}: {}", path, self.message)
    }
}

type Checked<T> = Result<T, Vec<FieldError>>;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(path: Vec<PathSegment>, what: &str, value: &Value) -> Vec<FieldError> {
    vec![FieldError::new(
        ErrorCode::InvalidType,
        path,
        format!("Expected {}, received {}", what, type_name(value)),
    )]
}

fn string(path: Vec<PathSegment>, value: &Value) -> Checked<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(expected(path, "string", other)),
    }
}

fn title(path: Vec<PathSegment>, value: &Value) -> Checked<String> {
    match value {
        Value::String(s) if s.is_empty() => Err(vec![FieldError::new(
            ErrorCode::TooSmall,
            path,
            "Movie title must not be empty",
        )]),
        Value::String(s) => Ok(s.clone()),
        _ => Err(vec![FieldError::new(
            ErrorCode::InvalidType,
            path,
            "Movie title must be a string",
        )]),
    }
}

#[derive(Default)]
struct Bounds {
    integer: bool,
    min: Option<(f64, bool)>,
    max: Option<f64>,
}

fn number(path: Vec<PathSegment>, value: &Value, bounds: Bounds) -> Checked<f64> {
    let n = match value.as_f64() {
        Some(n) => n,
        None => return Err(expected(path, "number", value)),
    };
    let mut errors = Vec::new();
    if bounds.integer && n.fract() != 0.0 {
        errors.push(FieldError::new(
            ErrorCode::InvalidType,
            path.clone(),
            "Expected integer, received float",
        ));
    }
    match bounds.min {
        Some((min, true)) if n < min => errors.push(FieldError::new(
            ErrorCode::TooSmall,
            path.clone(),
            format!("Number must be greater than or equal to {}", min),
        )),
        Some((min, false)) if n <= min => errors.push(FieldError::new(
            ErrorCode::TooSmall,
            path.clone(),
            format!("Number must be greater than {}", min),
        )),
        _ => {}
    }
    if let Some(max) = bounds.max {
        if n > max {
            errors.push(FieldError::new(
                ErrorCode::TooBig,
                path,
                format!("Number must be less than or equal to {}", max),
            ));
        }
    }
    if errors.is_empty() {
        Ok(n)
    } else {
        Err(errors)
    }
}

fn year(path: Vec<PathSegment>, value: &Value) -> Checked<u16> {
    let bounds = Bounds {
        integer: true,
        min: Some((MIN_YEAR, true)),
        max: Some(MAX_YEAR),
    };
    number(path, value, bounds).map(|n| n as u16)
}

fn duration(path: Vec<PathSegment>, value: &Value) -> Checked<u64> {
    let bounds = Bounds {
        integer: true,
        min: Some((0.0, false)),
        max: Some(MAX_SAFE_INTEGER),
    };
    number(path, value, bounds).map(|n| n as u64)
}

fn rate(path: Vec<PathSegment>, value: &Value) -> Checked<Number> {
    let bounds = Bounds {
        integer: false,
        min: Some((0.0, true)),
        max: Some(MAX_RATE),
    };
    let rate = match value {
        Value::Number(n) => n.clone(),
        other => return Err(expected(path, "number", other)),
    };
    number(path, value, bounds)?;
    Ok(rate)
}

fn poster(path: Vec<PathSegment>, value: &Value) -> Checked<String> {
    let s = string(path.clone(), value)?;
    match url::Url::parse(&s) {
        Ok(_) => Ok(s),
        Err(_) => Err(vec![FieldError::new(
            ErrorCode::InvalidString,
            path,
            "Poster must be a valid URL",
        )]),
    }
}

fn genre_options() -> String {
    Genre::ALL
        .iter()
        .map(|g| format!("'{}'", g))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn genres(path: Vec<PathSegment>, value: &Value) -> Checked<Vec<Genre>> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(expected(path, "array", other)),
    };
    let mut genres = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let mut item_path = path.clone();
        item_path.push(index.into());
        match item {
            Value::String(name) => match Genre::from_name(name) {
                Some(genre) => genres.push(genre),
                None => errors.push(FieldError::new(
                    ErrorCode::InvalidEnumValue,
                    item_path,
                    format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        genre_options(),
                        name
                    ),
                )),
            },
            other => errors.push(FieldError::new(
                ErrorCode::InvalidType,
                item_path,
                format!("Expected {}, received {}", genre_options(), type_name(other)),
            )),
        }
    }
    if errors.is_empty() {
        Ok(genres)
    } else {
        Err(errors)
    }
}

/// Walks the known keys of one object, collecting errors as it goes.
struct Fields<'a> {
    object: &'a Map<String, Value>,
    required: bool,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn check<T>(
        &mut self,
        key: &str,
        missing: &str,
        check: fn(Vec<PathSegment>, &Value) -> Checked<T>,
    ) -> Option<T> {
        match self.object.get(key) {
            Some(value) => match check(vec![key.into()], value) {
                Ok(parsed) => Some(parsed),
                Err(mut errors) => {
                    self.errors.append(&mut errors);
                    None
                }
            },
            None => {
                if self.required {
                    self.errors.push(FieldError::new(
                        ErrorCode::InvalidType,
                        vec![key.into()],
                        missing,
                    ));
                }
                None
            }
        }
    }

    fn optional<T>(
        &mut self,
        key: &str,
        check: fn(Vec<PathSegment>, &Value) -> Checked<T>,
    ) -> Option<T> {
        let required = self.required;
        self.required = false;
        let parsed = self.check(key, "Required", check);
        self.required = required;
        parsed
    }
}

fn object(input: &Value) -> Checked<&Map<String, Value>> {
    input
        .as_object()
        .ok_or_else(|| expected(Vec::new(), "object", input))
}

fn check_fields(object: &Map<String, Value>, required: bool) -> (MoviePatch, Vec<FieldError>) {
    let mut fields = Fields {
        object,
        required,
        errors: Vec::new(),
    };
    let patch = MoviePatch {
        title: fields.check("title", "Movie title must be required", title),
        year: fields.check("year", "Required", year),
        director: fields.check("director", "Required", string),
        duration: fields.check("duration", "Required", duration),
        rate: fields.optional("rate", rate),
        poster: fields.check("poster", "Required", poster),
        genre: fields.check("genre", "Required", genres),
    };
    (patch, fields.errors)
}

/// Validates a complete movie. `rate` is optional and defaults to 5.
pub fn validate_movie(input: &Value) -> Result<NewMovie, Vec<FieldError>> {
    let (patch, errors) = check_fields(object(input)?, true);
    match patch {
        MoviePatch {
            title: Some(title),
            year: Some(year),
            director: Some(director),
            duration: Some(duration),
            rate,
            poster: Some(poster),
            genre: Some(genre),
        } if errors.is_empty() => Ok(NewMovie {
            title,
            year,
            director,
            duration,
            rate: rate.unwrap_or_else(|| Number::from(DEFAULT_RATE)),
            poster,
            genre,
        }),
        _ => Err(errors),
    }
}

/// Validates a partial update. Every field is optional; an empty object is valid.
pub fn validate_partial_movie(input: &Value) -> Result<MoviePatch, Vec<FieldError>> {
    let (patch, errors) = check_fields(object(input)?, false);
    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "title": "The Matrix",
            "year": 1999,
            "director": "Lana Wachowski",
            "duration": 136,
            "rate": 8.7,
            "poster": "https://i.ebayimg.com/images/g/QFQAAOSwAQpfjaA6/s-l1200.jpg",
            "genre": ["Action", "Sci-fi"]
        })
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors
            .iter()
            .filter_map(|error| match error.path.first() {
                Some(PathSegment::Key(key)) => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn accepts_full_movie() {
        let movie = validate_movie(&valid()).unwrap();
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.year, 1999);
        assert_eq!(movie.duration, 136);
        assert_eq!(movie.rate.as_f64(), Some(8.7));
        assert_eq!(movie.genre, vec![Genre::Action, Genre::SciFi]);
    }

    #[test]
    fn rate_defaults_to_five() {
        let mut input = valid();
        input.as_object_mut().unwrap().remove("rate");
        assert_eq!(
            validate_movie(&input).unwrap().rate,
            Number::from(DEFAULT_RATE)
        );
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = validate_movie(&json!({})).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["title", "year", "director", "duration", "poster", "genre"]
        );
        assert_eq!(errors[0].message, "Movie title must be required");
        assert_eq!(errors[1].message, "Required");
    }

    #[test]
    fn title_messages() {
        let mut input = valid();
        input["title"] = json!(42);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].message, "Movie title must be a string");

        input["title"] = json!("");
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::TooSmall);
    }

    #[test]
    fn year_bounds_and_integrality() {
        let mut input = valid();
        input["year"] = json!(1899);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::TooSmall);
        assert_eq!(
            errors[0].message,
            "Number must be greater than or equal to 1900"
        );

        input["year"] = json!(2025);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::TooBig);

        input["year"] = json!(1999.5);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].message, "Expected integer, received float");

        input["year"] = json!(1999.0);
        assert_eq!(validate_movie(&input).unwrap().year, 1999);

        input["year"] = json!("1999");
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].message, "Expected number, received string");
    }

    #[test]
    fn duration_must_be_positive() {
        let mut input = valid();
        input["duration"] = json!(0);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(fields(&errors), vec!["duration"]);
        assert_eq!(errors[0].message, "Number must be greater than 0");
    }

    #[test]
    fn duration_must_fit_exactly() {
        let mut input = valid();
        input["duration"] = json!(1e300);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(fields(&errors), vec!["duration"]);
        assert_eq!(errors[0].code, ErrorCode::TooBig);

        input["duration"] = json!(9_007_199_254_740_991u64);
        assert_eq!(validate_movie(&input).unwrap().duration, 9_007_199_254_740_991);
    }

    #[test]
    fn rate_keeps_its_representation() {
        let mut input = valid();
        input["rate"] = json!(8);
        let rate = validate_movie(&input).unwrap().rate;
        assert_eq!(serde_json::to_string(&rate).unwrap(), "8");
        input["rate"] = json!(9.0);
        let rate = validate_movie(&input).unwrap().rate;
        assert_eq!(serde_json::to_string(&rate).unwrap(), "9.0");
    }

    #[test]
    fn rate_range() {
        let mut input = valid();
        input["rate"] = json!(10.5);
        assert_eq!(fields(&validate_movie(&input).unwrap_err()), vec!["rate"]);
        input["rate"] = json!(-1);
        assert_eq!(fields(&validate_movie(&input).unwrap_err()), vec!["rate"]);
        input["rate"] = json!(null);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].message, "Expected number, received null");
    }

    #[test]
    fn poster_must_be_url() {
        let mut input = valid();
        input["poster"] = json!("not a url");
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::InvalidString);
        assert_eq!(errors[0].message, "Poster must be a valid URL");
    }

    #[test]
    fn genre_errors_point_at_element() {
        let mut input = valid();
        input["genre"] = json!(["Action", "Western", 3]);
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, vec!["genre".into(), PathSegment::Index(1)]);
        assert_eq!(errors[0].code, ErrorCode::InvalidEnumValue);
        assert!(errors[0].message.ends_with("received 'Western'"));
        assert_eq!(errors[1].path, vec!["genre".into(), PathSegment::Index(2)]);

        input["genre"] = json!("Action");
        let errors = validate_movie(&input).unwrap_err();
        assert_eq!(errors[0].message, "Expected array, received string");
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let mut input = valid();
        input["id"] = json!("client-chosen");
        input["studio"] = json!("Warner");
        assert!(validate_movie(&input).is_ok());
        assert_eq!(
            validate_partial_movie(&json!({"id": "x"})).unwrap(),
            MoviePatch::default()
        );
    }

    #[test]
    fn body_must_be_object() {
        let errors = validate_movie(&json!([1, 2])).unwrap_err();
        assert!(errors[0].path.is_empty());
        assert_eq!(errors[0].message, "Expected object, received array");
        assert!(validate_partial_movie(&json!("x")).is_err());
    }

    #[test]
    fn partial_accepts_empty_and_subsets() {
        assert_eq!(
            validate_partial_movie(&json!({})).unwrap(),
            MoviePatch::default()
        );
        let patch = validate_partial_movie(&json!({"rate": 8})).unwrap();
        assert_eq!(
            patch,
            MoviePatch {
                rate: Some(Number::from(8)),
                ..MoviePatch::default()
            }
        );
    }

    #[test]
    fn partial_checks_present_fields() {
        let errors = validate_partial_movie(&json!({"year": 3000, "genre": ["Nope"]})).unwrap_err();
        assert_eq!(fields(&errors), vec!["year", "genre"]);
    }

    #[test]
    fn errors_serialize_like_issue_lists() {
        let mut input = valid();
        input["genre"] = json!(["Nope"]);
        let errors = validate_movie(&input).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[0]["code"], "invalid_enum_value");
        assert_eq!(json[0]["path"], json!(["genre", 0]));
    }
}
