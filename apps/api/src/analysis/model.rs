//! Analysis result data model.
//!
//! Two response schemas are in use: the screening schema keyed by `status`
//! (recruiter dashboard) and the coaching schema keyed by `matchLabel`
//! (candidate-facing page). Both sit behind `AnalysisResult`. Serialization
//! produces each variant's wire shape, so a serialized result normalizes back
//! to an equal value.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Closed set of string values a field may take on the wire.
pub trait WireEnum: Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Exact match after trimming surrounding whitespace.
    fn from_wire(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningStatus {
    Recommended,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Not Matching")]
    NotMatching,
}

impl WireEnum for ScreeningStatus {
    const ALL: &'static [Self] = &[
        ScreeningStatus::Recommended,
        ScreeningStatus::UnderReview,
        ScreeningStatus::NotMatching,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ScreeningStatus::Recommended => "Recommended",
            ScreeningStatus::UnderReview => "Under Review",
            ScreeningStatus::NotMatching => "Not Matching",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLabel {
    #[serde(rename = "Excellent Match")]
    Excellent,
    #[serde(rename = "Strong Match")]
    Strong,
    #[serde(rename = "Good Match")]
    Good,
    #[serde(rename = "Partial Match")]
    Partial,
    #[serde(rename = "Low Match")]
    Low,
}

impl WireEnum for MatchLabel {
    const ALL: &'static [Self] = &[
        MatchLabel::Excellent,
        MatchLabel::Strong,
        MatchLabel::Good,
        MatchLabel::Partial,
        MatchLabel::Low,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            MatchLabel::Excellent => "Excellent Match",
            MatchLabel::Strong => "Strong Match",
            MatchLabel::Good => "Good Match",
            MatchLabel::Partial => "Partial Match",
            MatchLabel::Low => "Low Match",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseTag {
    #[serde(rename = "High Priority")]
    High,
    #[serde(rename = "Medium Priority")]
    Medium,
    #[serde(rename = "Low Priority")]
    Low,
}

impl WireEnum for CourseTag {
    const ALL: &'static [Self] = &[CourseTag::High, CourseTag::Medium, CourseTag::Low];

    fn as_str(&self) -> &'static str {
        match self {
            CourseTag::High => "High Priority",
            CourseTag::Medium => "Medium Priority",
            CourseTag::Low => "Low Priority",
        }
    }
}

/// Recruiter-facing verdict: percentage, status and skill lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningReport {
    pub match_percentage: u8,
    pub status: ScreeningStatus,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub improvement_suggestions: String,
    /// Free text; usually embeds course URLs.
    pub learning_resources: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub provider: String,
    pub duration: String,
    pub url: String,
    pub tag: CourseTag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatches {
    pub matched: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

/// Candidate-facing analysis with a summary, course plan and sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingReport {
    pub match_percentage: u8,
    pub match_label: MatchLabel,
    pub summary: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommended_courses: Vec<Course>,
    pub keyword_matches: KeywordMatches,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ats_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_match: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_match: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_match: Option<u8>,
}

/// A validated model verdict. Produced only by `normalizer::normalize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Screening(ScreeningReport),
    Coaching(CoachingReport),
}

impl AnalysisResult {
    pub fn match_percentage(&self) -> u8 {
        match self {
            AnalysisResult::Screening(r) => r.match_percentage,
            AnalysisResult::Coaching(r) => r.match_percentage,
        }
    }

    /// Skills or strengths the résumé covers.
    pub fn strengths(&self) -> &[String] {
        match self {
            AnalysisResult::Screening(r) => &r.matched_skills,
            AnalysisResult::Coaching(r) => &r.strengths,
        }
    }

    /// Skills or experience the résumé is missing.
    pub fn gaps(&self) -> &[String] {
        match self {
            AnalysisResult::Screening(r) => &r.missing_skills,
            AnalysisResult::Coaching(r) => &r.gaps,
        }
    }

    /// Status for screening results, match label for coaching results.
    pub fn verdict(&self) -> &'static str {
        match self {
            AnalysisResult::Screening(r) => r.status.as_str(),
            AnalysisResult::Coaching(r) => r.match_label.as_str(),
        }
    }

    /// Improvement advice: the screening suggestions or the coaching summary.
    pub fn advice(&self) -> &str {
        match self {
            AnalysisResult::Screening(r) => &r.improvement_suggestions,
            AnalysisResult::Coaching(r) => &r.summary,
        }
    }

    /// Learning material as free text. Coaching courses render one per line.
    pub fn learning_resources(&self) -> String {
        match self {
            AnalysisResult::Screening(r) => r.learning_resources.clone(),
            AnalysisResult::Coaching(r) => r
                .recommended_courses
                .iter()
                .map(|c| {
                    let mut line = format!("{} [{}]", c.title, c.tag.as_str());
                    if !c.provider.is_empty() {
                        line.push_str(&format!(" - {}", c.provider));
                    }
                    if !c.url.is_empty() {
                        line.push_str(&format!(": {}", c.url));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
