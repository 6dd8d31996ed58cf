//! Prompt Builder: turns a résumé/job-description pair into the analysis prompt.

use serde::{Deserialize, Serialize};

use crate::analysis::error::AnalysisError;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, PERCENT_CONSTRAINT};

/// Which response schema the prompt asks the model for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSchema {
    /// Recruiter screening: `status`, skill lists, suggestions, learning resources.
    #[default]
    Screening,
    /// Candidate coaching: `matchLabel`, summary, courses, keyword matches, sub-scores.
    Coaching,
}

/// Builds the prompt for `schema`. Both inputs are embedded verbatim.
///
/// Fails with `InvalidInput` if either input is empty or whitespace only.
pub fn build_prompt(
    resume_text: &str,
    job_description: &str,
    schema: PromptSchema,
) -> Result<String, AnalysisError> {
    if resume_text.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(
            "resume text cannot be empty".to_string(),
        ));
    }
    if job_description.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(
            "job description cannot be empty".to_string(),
        ));
    }

    let instructions = match schema {
        PromptSchema::Screening => screening_instructions(),
        PromptSchema::Coaching => coaching_instructions(),
    };

    Ok(format!(
        "{instructions}\n\nRESUME:\n{resume_text}\n\nJOB DESCRIPTION:\n{job_description}"
    ))
}

fn screening_instructions() -> String {
    format!(
        "Analyze the following resume against the job description. {JSON_ONLY_INSTRUCTION} \
        The JSON must have these exact fields: \
        \"matchPercentage\" ({PERCENT_CONSTRAINT}), \
        \"matchedSkills\" (string - a comma-separated list of technical/soft skills matched), \
        \"missingSkills\" (string - a comma-separated list of critical missing skills), \
        \"improvementSuggestions\" (string - actionable advice), \
        \"learningResources\" (string - a structured career roadmap with course names and their direct clickable URLs like https://coursera.org/...), \
        \"status\" (exactly one of: \"Recommended\", \"Under Review\", \"Not Matching\")."
    )
}

fn coaching_instructions() -> String {
    format!(
        r#"You are an expert HR analyst and career coach. Analyze the following CV against the job description. {JSON_ONLY_INSTRUCTION}
Return a JSON object with this exact structure:

{{
  "matchPercentage": <{PERCENT_CONSTRAINT}>,
  "matchLabel": <exactly one of "Excellent Match" | "Strong Match" | "Good Match" | "Partial Match" | "Low Match">,
  "summary": <2-3 sentence analysis string>,
  "strengths": [<array of 3-6 strength strings from the CV that match the job>],
  "gaps": [<array of 3-6 skill/experience gap strings the CV is missing for this job>],
  "recommendedCourses": [
    {{
      "title": <course title string>,
      "provider": <e.g. "Coursera", "Udemy", "edX", "LinkedIn Learning">,
      "duration": <estimated duration string e.g. "~10 hrs">,
      "url": <course URL string>,
      "tag": <exactly one of "High Priority" | "Medium Priority" | "Low Priority">
    }}
  ],
  "keywordMatches": {{
    "matched": [<keywords/skills found in both the CV and the job description>],
    "missing": [<important job description keywords missing from the CV>]
  }},
  "atsScore": <{PERCENT_CONSTRAINT}, ATS compatibility score>,
  "experienceMatch": <{PERCENT_CONSTRAINT}>,
  "skillsMatch": <{PERCENT_CONSTRAINT}>,
  "educationMatch": <{PERCENT_CONSTRAINT}>
}}

Recommend 3-5 courses targeted at closing the identified skill gaps."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe\nSenior Frontend Engineer\nReact, TypeScript, Node.js";
    const JD: &str = "We need a full-stack engineer with React and GraphQL {experience}.";

    #[test]
    fn test_prompt_embeds_inputs_verbatim() {
        for schema in [PromptSchema::Screening, PromptSchema::Coaching] {
            let prompt = build_prompt(RESUME, JD, schema).unwrap();
            assert!(prompt.contains(RESUME));
            assert!(prompt.contains(JD));
            assert!(prompt.contains("matchPercentage"));
        }
    }

    #[test]
    fn test_screening_prompt_names_every_field() {
        let prompt = build_prompt(RESUME, JD, PromptSchema::Screening).unwrap();
        for field in [
            "matchedSkills",
            "missingSkills",
            "improvementSuggestions",
            "learningResources",
            "\"status\"",
            "Under Review",
        ] {
            assert!(prompt.contains(field), "prompt is missing {field}");
        }
    }

    #[test]
    fn test_coaching_prompt_names_every_field() {
        let prompt = build_prompt(RESUME, JD, PromptSchema::Coaching).unwrap();
        for field in [
            "matchLabel",
            "recommendedCourses",
            "keywordMatches",
            "atsScore",
            "educationMatch",
            "High Priority",
        ] {
            assert!(prompt.contains(field), "prompt is missing {field}");
        }
    }

    #[test]
    fn test_prompt_states_range_constraint() {
        let prompt = build_prompt(RESUME, JD, PromptSchema::Screening).unwrap();
        assert!(prompt.contains("between 0 and 100"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt(RESUME, JD, PromptSchema::Coaching).unwrap();
        let b = build_prompt(RESUME, JD, PromptSchema::Coaching).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_inputs_are_invalid() {
        assert!(matches!(
            build_prompt("", JD, PromptSchema::Screening),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            build_prompt(RESUME, "   \n", PromptSchema::Screening),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_default_schema_is_screening() {
        assert_eq!(PromptSchema::default(), PromptSchema::Screening);
    }
}
