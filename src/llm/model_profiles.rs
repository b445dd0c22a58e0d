//! Model family detection patterns and per-family parameter profiles.
//!
//! Port of `original_source/litassist/llm/model_profiles.py`. Both tables
//! preserve Python dict insertion order as the effective match/lookup
//! order — `MODEL_PATTERNS` is consulted top-to-bottom by
//! `get_model_family`, first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// A family's allowed outbound parameters, any renames applied before
/// sending, and whether the family accepts `system` role messages.
pub struct ParameterProfile {
    pub allowed: &'static [&'static str],
    pub transforms: &'static [(&'static str, &'static str)],
    pub system_message_support: bool,
}

/// `(family, compiled ^-anchored pattern)` pairs, in match-priority order.
/// Patterns are anchored with `^` to reproduce Python's `re.match`
/// (anchored-at-start, not full-match) semantics.
pub static MODEL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("openai_reasoning", r"^openai/o\d+"),
        ("gpt5", r"^openai/gpt-5(-pro)?"),
        ("claude4", r"^anthropic/claude-(opus-4|sonnet-4)(\.\d+)?"),
        ("anthropic", r"^anthropic/claude"),
        ("google", r"^google/(gemini|palm|bard)"),
        ("openai_standard", r"^openai/(gpt|chatgpt)"),
        ("xai", r"^x-ai/grok"),
        ("meta", r"^meta/(llama|codellama)"),
        ("mistral", r"^mistral/"),
        ("cohere", r"^cohere/"),
        ("moonshotai", r"^moonshotai/"),
    ]
    .into_iter()
    .map(|(family, pattern)| (family, Regex::new(pattern).unwrap()))
    .collect()
});

/// Parameter profiles by model family. `gpt5` and `claude4` are valid
/// `MODEL_PATTERNS` identification keys (used by `convert_thinking_effort`)
/// but deliberately have NO entry here — `get_model_parameters` falls back
/// to `"default"` for them, exactly as in the original. This is confirmed
/// upstream behavior, not an omission; see DESIGN.md.
pub static PARAMETER_PROFILES: Lazy<std::collections::HashMap<&'static str, ParameterProfile>> =
    Lazy::new(|| {
        [
            (
                "openai_reasoning",
                ParameterProfile {
                    allowed: &[
                        "max_completion_tokens",
                        "reasoning",
                        "verbosity",
                        "seed",
                        "response_format",
                        "structured_outputs",
                    ],
                    transforms: &[("max_tokens", "max_completion_tokens")],
                    system_message_support: false,
                },
            ),
            (
                "anthropic",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "stop",
                        "top_k",
                        "stream",
                        "metadata",
                        "stop_sequences",
                        "reasoning",
                        "min_p",
                        "top_a",
                        "repetition_penalty",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "google",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "stop",
                        "candidate_count",
                        "top_k",
                        "safety_settings",
                        "stop_sequences",
                        "reasoning",
                        "min_p",
                        "top_a",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "openai_standard",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "frequency_penalty",
                        "presence_penalty",
                        "stop",
                        "logit_bias",
                        "seed",
                        "response_format",
                        "stream",
                        "n",
                        "tools",
                        "tool_choice",
                        "functions",
                        "function_call",
                        "user",
                        "logprobs",
                        "top_logprobs",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "xai",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "stop",
                        "frequency_penalty",
                        "presence_penalty",
                        "stream",
                        "reasoning",
                        "verbosity",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "meta",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "stop",
                        "frequency_penalty",
                        "presence_penalty",
                        "stream",
                        "min_p",
                        "top_a",
                        "repetition_penalty",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "mistral",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "stop",
                        "random_seed",
                        "safe_mode",
                        "stream",
                        "min_p",
                        "top_a",
                        "repetition_penalty",
                    ],
                    transforms: &[("seed", "random_seed")],
                    system_message_support: true,
                },
            ),
            (
                "cohere",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "max_tokens",
                        "k",
                        "p",
                        "stop_sequences",
                        "frequency_penalty",
                        "presence_penalty",
                        "stream",
                    ],
                    transforms: &[("top_k", "k"), ("top_p", "p"), ("stop", "stop_sequences")],
                    system_message_support: true,
                },
            ),
            (
                "moonshotai",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "stop",
                        "frequency_penalty",
                        "presence_penalty",
                        "stream",
                        "min_p",
                        "top_a",
                        "repetition_penalty",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "default",
                ParameterProfile {
                    allowed: &["temperature", "top_p", "max_tokens", "stop"],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
            (
                "openrouter_universal",
                ParameterProfile {
                    allowed: &[
                        "temperature",
                        "top_p",
                        "max_tokens",
                        "reasoning",
                        "verbosity",
                        "min_p",
                        "top_a",
                        "repetition_penalty",
                        "frequency_penalty",
                        "presence_penalty",
                        "response_format",
                        "logit_bias",
                        "logprobs",
                        "top_logprobs",
                        "seed",
                        "stop",
                    ],
                    transforms: &[],
                    system_message_support: true,
                },
            ),
        ]
        .into_iter()
        .collect()
    });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_reasoning_pattern_matches_o_series() {
        assert!(MODEL_PATTERNS[0].1.is_match("openai/o3-pro"));
    }

    #[test]
    fn claude4_pattern_matches_dotted_point_release() {
        let (_, re) = MODEL_PATTERNS
            .iter()
            .find(|(f, _)| *f == "claude4")
            .unwrap();
        assert!(re.is_match("anthropic/claude-opus-4.5"));
    }

    #[test]
    fn gpt5_and_claude4_have_no_profile_entry() {
        assert!(!PARAMETER_PROFILES.contains_key("gpt5"));
        assert!(!PARAMETER_PROFILES.contains_key("claude4"));
    }
}
