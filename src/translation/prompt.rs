pub const SYSTEM_PROMPT_TEMPLATE: &str = "You are a professional subtitle translator. \
You receive a JSON array of subtitle lines in {source_language}, each with a `timestamp` and a `text`. \
Translate them into {target_language}. Consecutive lines that form one sentence may be merged \
into a single translated sentence. \
Reply with a JSON object of the form \
{\"translatedSentences\": [{\"sentence\": \"...\", \"relatedInputItems\": [{\"timestamp\": \"...\", \"text\": \"...\"}]}]}. \
List the related input items of each sentence in their original order, copy every timestamp \
exactly as given, and cover every input line. Output only the JSON object.";

/// Fills the language placeholders of `template`.
#[allow(clippy::literal_string_with_formatting_args)]
pub fn build_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    // {source_language} / {target_language} are placeholders for string replacement, not format arguments
    template
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_prompt() {
        let prompt = build_system_prompt(SYSTEM_PROMPT_TEMPLATE, "Japanese", "Chinese");
        assert!(prompt.contains("in Japanese"));
        assert!(prompt.contains("into Chinese"));
        assert!(prompt.contains("translatedSentences"));
        assert!(!prompt.contains("{target_language}"));
    }

    #[test]
    fn test_custom_template_without_placeholders_is_kept() {
        let custom = "Translate to Chinese, keep the JSON format.";
        assert_eq!(build_system_prompt(custom, "Japanese", "Chinese"), custom);
    }

    #[test]
    fn test_system_prompt_template_has_placeholders() {
        assert!(SYSTEM_PROMPT_TEMPLATE.contains("{target_language}"));
        assert!(SYSTEM_PROMPT_TEMPLATE.contains("{source_language}"));
    }
}
