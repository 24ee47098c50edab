//! Prompts for diagnostic interpretation.

/// System instruction framing the assistant as a diagnostic expert.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert vehicle diagnostic assistant. \
Provide direct interpretations without disclaimers or recommendations to consult mechanics. \
Provide AI recommendations on next steps.";

/// User message template; `{dtc}` is replaced with the extracted fault text.
pub const USER_PROMPT_TEMPLATE: &str = "What do these diagnostic trouble codes mean: {dtc}?";

/// Render the user message for the given fault text.
pub fn user_prompt(fault_text: &str) -> String {
    USER_PROMPT_TEMPLATE.replace("{dtc}", fault_text)
}
