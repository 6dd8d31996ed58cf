// Shared prompt fragments. Feature prompts live next to the feature (see analysis/prompts.rs).

/// Instruction that enforces a bare JSON answer. Models still add fences
/// occasionally; the normalizer strips them.
pub const JSON_ONLY_INSTRUCTION: &str = "Crucially, return ONLY a valid JSON object. \
    Do not include any markdown formatting like ```json, any preamble, or any conversational text.";

/// Range constraint repeated for every numeric field.
pub const PERCENT_CONSTRAINT: &str = "integer between 0 and 100 inclusive";
