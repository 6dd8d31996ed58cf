//! Response Normalizer, the trust boundary between free-text model output and
//! `AnalysisResult`.
//!
//! Algorithm:
//! 1. Remove ```` ```json ```` / ```` ``` ```` markers; if a preamble remains,
//!    narrow to the outermost `{ ... }` span
//! 2. Parse JSON (must be an object)
//! 3. Pick the schema: `matchLabel` present → coaching, otherwise screening
//! 4. Required fields present, percentages are integers in [0, 100], enum
//!    fields are members of their set. Nothing is clamped or guessed.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::model::{
    AnalysisResult, CoachingReport, Course, CourseTag, KeywordMatches, MatchLabel,
    ScreeningReport, ScreeningStatus, WireEnum,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("model output is not a JSON object: {0}")]
    MalformedJson(String),

    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` must be between 0 and 100, got {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("field `{field}` has unrecognized value {value:?}")]
    UnknownEnumValue { field: String, value: String },

    #[error("field `{field}` must be {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },
}

/// Parses raw model text into a validated `AnalysisResult`.
pub fn normalize(raw: &str) -> Result<AnalysisResult, ParseError> {
    let text = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(&text).map_err(|e| ParseError::MalformedJson(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ParseError::MalformedJson(format!(
            "expected an object, got {}",
            json_type_name(&value)
        )));
    };

    let fields = Fields::root(&map);
    if map.contains_key("matchLabel") {
        normalize_coaching(&fields).map(AnalysisResult::Coaching)
    } else {
        normalize_screening(&fields).map(AnalysisResult::Screening)
    }
}

/// Removes code-fence markers wherever they appear. Textual, not a Markdown parser.
///
/// Prose around a single object is dropped. A top-level array is left intact so
/// it is rejected rather than unwrapped.
pub fn strip_code_fences(raw: &str) -> String {
    let without = raw.replace("```json", "").replace("```", "");
    let text = without.trim();

    if !text.starts_with('{') && !text.starts_with('[') {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if end > start {
                return text[start..=end].to_string();
            }
        }
    }
    text.to_string()
}

fn normalize_screening(fields: &Fields<'_>) -> Result<ScreeningReport, ParseError> {
    Ok(ScreeningReport {
        match_percentage: fields.percentage("matchPercentage")?,
        status: fields.enum_value::<ScreeningStatus>("status")?,
        matched_skills: fields.string_list("matchedSkills")?,
        missing_skills: fields.string_list("missingSkills")?,
        improvement_suggestions: fields.optional_string("improvementSuggestions")?,
        learning_resources: fields.optional_string("learningResources")?,
    })
}

fn normalize_coaching(fields: &Fields<'_>) -> Result<CoachingReport, ParseError> {
    Ok(CoachingReport {
        match_percentage: fields.percentage("matchPercentage")?,
        match_label: fields.enum_value::<MatchLabel>("matchLabel")?,
        summary: fields.string("summary")?,
        strengths: fields.string_list("strengths")?,
        gaps: fields.string_list("gaps")?,
        recommended_courses: normalize_courses(fields)?,
        keyword_matches: normalize_keyword_matches(fields)?,
        ats_score: fields.optional_percentage("atsScore")?,
        experience_match: fields.optional_percentage("experienceMatch")?,
        skills_match: fields.optional_percentage("skillsMatch")?,
        education_match: fields.optional_percentage("educationMatch")?,
    })
}

fn normalize_courses(fields: &Fields<'_>) -> Result<Vec<Course>, ParseError> {
    let Some(value) = fields.get("recommendedCourses") else {
        return Ok(Vec::new());
    };
    let items = value.as_array().ok_or_else(|| ParseError::InvalidType {
        field: fields.path("recommendedCourses"),
        expected: "an array of courses",
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("{}[{i}]", fields.path("recommendedCourses"));
            let map = item.as_object().ok_or_else(|| ParseError::InvalidType {
                field: path.clone(),
                expected: "an object",
            })?;
            let course = Fields::nested(map, path);
            Ok(Course {
                title: course.string("title")?,
                provider: course.optional_string("provider")?,
                duration: course.optional_string("duration")?,
                url: course.optional_string("url")?,
                tag: course.enum_value::<CourseTag>("tag")?,
            })
        })
        .collect()
}

fn normalize_keyword_matches(fields: &Fields<'_>) -> Result<KeywordMatches, ParseError> {
    let Some(value) = fields.get("keywordMatches") else {
        return Ok(KeywordMatches::default());
    };
    let map = value.as_object().ok_or_else(|| ParseError::InvalidType {
        field: fields.path("keywordMatches"),
        expected: "an object",
    })?;
    let nested = Fields::nested(map, fields.path("keywordMatches"));

    let as_set = |name: &str| -> Result<BTreeSet<String>, ParseError> {
        if nested.get(name).is_none() {
            return Ok(BTreeSet::new());
        }
        Ok(nested.string_list(name)?.into_iter().collect())
    };

    Ok(KeywordMatches {
        matched: as_set("matched")?,
        missing: as_set("missing")?,
    })
}

/// Field accessor over one JSON object that reports errors with a dotted path.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    fn root(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            prefix: String::new(),
        }
    }

    fn nested(map: &'a Map<String, Value>, prefix: String) -> Self {
        Self { map, prefix }
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.prefix)
        }
    }

    /// `null` counts as absent.
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    fn required(&self, name: &str) -> Result<&'a Value, ParseError> {
        self.get(name).ok_or_else(|| ParseError::MissingField {
            field: self.path(name),
        })
    }

    fn percentage(&self, name: &str) -> Result<u8, ParseError> {
        percentage_value(self.required(name)?, &self.path(name))
    }

    fn optional_percentage(&self, name: &str) -> Result<Option<u8>, ParseError> {
        self.get(name)
            .map(|v| percentage_value(v, &self.path(name)))
            .transpose()
    }

    fn string(&self, name: &str) -> Result<String, ParseError> {
        let value = self.required(name)?;
        value
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ParseError::InvalidType {
                field: self.path(name),
                expected: "a string",
            })
    }

    fn optional_string(&self, name: &str) -> Result<String, ParseError> {
        if self.get(name).is_none() {
            return Ok(String::new());
        }
        self.string(name)
    }

    /// Accepts a JSON array of strings or a comma-separated string.
    fn string_list(&self, name: &str) -> Result<Vec<String>, ParseError> {
        let value = self.required(name)?;
        match value {
            Value::String(s) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| match item.as_str() {
                    Some(s) if s.trim().is_empty() => None,
                    Some(s) => Some(Ok(s.trim().to_string())),
                    None => Some(Err(ParseError::InvalidType {
                        field: format!("{}[{i}]", self.path(name)),
                        expected: "a string",
                    })),
                })
                .collect(),
            _ => Err(ParseError::InvalidType {
                field: self.path(name),
                expected: "an array of strings or a comma-separated string",
            }),
        }
    }

    fn enum_value<T: WireEnum>(&self, name: &str) -> Result<T, ParseError> {
        let value = self.required(name)?;
        let raw = value.as_str().ok_or_else(|| ParseError::InvalidType {
            field: self.path(name),
            expected: "a string",
        })?;
        T::from_wire(raw).ok_or_else(|| ParseError::UnknownEnumValue {
            field: self.path(name),
            value: raw.to_string(),
        })
    }
}

fn percentage_value(value: &Value, field: &str) -> Result<u8, ParseError> {
    let invalid = || ParseError::InvalidType {
        field: field.to_string(),
        expected: "an integer",
    };
    let Value::Number(number) = value else {
        return Err(invalid());
    };

    let as_float = if let Some(i) = number.as_i64() {
        i as f64
    } else if let Some(u) = number.as_u64() {
        u as f64
    } else {
        // Whole-number floats like `82.0` are accepted; `82.5` is not.
        let f = number.as_f64().ok_or_else(invalid)?;
        if !f.is_finite() || f.fract() != 0.0 {
            return Err(invalid());
        }
        f
    };

    if (0.0..=100.0).contains(&as_float) {
        Ok(as_float as u8)
    } else {
        Err(ParseError::OutOfRange {
            field: field.to_string(),
            value: as_float,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
