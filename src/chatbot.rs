//! A scripted help bot: an ordered table of case-insensitive regular expressions,
//! each with a canned reply. The first matching rule answers.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A rule as written in config.
#[derive(Debug, Clone, Deserialize)]
struct RuleSpec {
    pattern: String,
    response: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// A compiled chatbot rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RuleSpec")]
pub struct ChatRule {
    pattern: Regex,
    response: String,
    suggestions: Vec<String>,
}

impl ChatRule {
    pub fn new(pattern: &str, response: &str, suggestions: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("(?i){pattern}"))?,
            response: response.to_string(),
            suggestions: suggestions.iter().map(ToString::to_string).collect(),
        })
    }

    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }
}

impl TryFrom<RuleSpec> for ChatRule {
    type Error = regex::Error;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        let suggestions = spec.suggestions.iter().map(String::as_str).collect::<Vec<_>>();
        Self::new(&spec.pattern, &spec.response, &suggestions)
    }
}

/// The chatbot's rule table. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    rules: Vec<ChatRule>,
    fallback: String,
    #[serde(default)]
    fallback_suggestions: Vec<String>,
}

impl ChatConfig {
    pub fn rules(&self) -> &[ChatRule] {
        &self.rules
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        let rule = |pattern: &str, response: &str, suggestions: &[&str]| {
            ChatRule::new(pattern, response, suggestions)
                .expect("built-in chatbot patterns are valid")
        };
        Self {
            rules: vec![
                rule(
                    r"\b(hi|hello|hey)\b",
                    "Hello! I can help you with voting, candidacies and results.",
                    &["How do I vote?", "How do I become a candidate?"],
                ),
                rule(
                    r"\b(change|undo|cancel)\b.*\bvote\b",
                    "Ballots are final once cast and cannot be changed.",
                    &[],
                ),
                rule(
                    r"\bhow\b.*\bvote\b",
                    "Open an active election, pick one candidate for each position and submit. \
                     You can vote once per position.",
                    &["Can I change my vote?", "Which elections are open?"],
                ),
                rule(
                    r"\b(candidate|candidacy|stand|run)\b",
                    "Open the election and register for a position. \
                     Your candidacy appears once an administrator approves it.",
                    &["Can I edit my statement?"],
                ),
                rule(
                    r"\bstatement\b",
                    "You can edit your candidate statement at any time from your candidacy page.",
                    &[],
                ),
                rule(
                    r"\b(open|active|current)\b.*\belections?\b|\belections?\b.*\b(open|active|current)\b",
                    "The elections page lists every election open to you, \
                     with how many positions you have voted for.",
                    &[],
                ),
                rule(
                    r"\b(results?|winners?|tally)\b",
                    "Results are published by the club administrators once the election has ended.",
                    &[],
                ),
                rule(
                    r"\b(password|login|log in|sign in)\b",
                    "Log in with the username and password you registered with. \
                     Contact an administrator if you cannot access your account.",
                    &[],
                ),
            ],
            fallback: "Sorry, I didn't understand that. Try asking about voting, \
                       candidacies or results."
                .to_string(),
            fallback_suggestions: vec![
                "How do I vote?".to_string(),
                "How do I become a candidate?".to_string(),
            ],
        }
    }
}

/// The bot's answer to one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub suggestions: Vec<String>,
    /// False if no rule matched and this is the fallback.
    pub matched: bool,
}

/// Answer a message with the first matching rule, or the fallback.
pub fn respond(config: &ChatConfig, message: &str) -> ChatReply {
    match config.rules.iter().find(|rule| rule.matches(message)) {
        Some(rule) => ChatReply {
            reply: rule.response.clone(),
            suggestions: rule.suggestions.clone(),
            matched: true,
        },
        None => ChatReply {
            reply: config.fallback.clone(),
            suggestions: config.fallback_suggestions.clone(),
            matched: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{
        providers::{Format, Toml},
        Figment,
    };

    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let config = ChatConfig::default();
        // Matches both the greeting and the voting rule.
        let reply = respond(&config, "Hello, how do I vote?");
        assert!(reply.matched);
        assert!(reply.reply.starts_with("Hello!"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let config = ChatConfig::default();
        let lower = respond(&config, "how do i vote");
        let upper = respond(&config, "HOW DO I VOTE");
        assert!(lower.matched);
        assert_eq!(lower, upper);
    }

    #[test]
    fn changing_a_vote_is_not_how_to_vote() {
        let config = ChatConfig::default();
        let reply = respond(&config, "How do I change my vote?");
        assert!(reply.reply.starts_with("Ballots are final"));
    }

    #[test]
    fn open_elections_in_either_order() {
        let config = ChatConfig::default();
        let before = respond(&config, "Show me the open elections");
        let after = respond(&config, "Which elections are open?");
        assert!(before.matched);
        assert_eq!(before, after);
    }

    #[test]
    fn built_in_suggestions_are_understood() {
        let config = ChatConfig::default();
        let suggestions = config
            .rules()
            .iter()
            .flat_map(|rule| rule.suggestions.iter())
            .chain(config.fallback_suggestions.iter());
        for suggestion in suggestions {
            let reply = respond(&config, suggestion);
            assert!(reply.matched, "no rule for suggestion {suggestion:?}");
            assert!(
                !reply.suggestions.contains(suggestion),
                "suggestion {suggestion:?} leads back to itself"
            );
        }
    }

    #[test]
    fn unmatched_input_gets_fallback() {
        let config = ChatConfig::default();
        let reply = respond(&config, "What's for lunch?");
        assert!(!reply.matched);
        assert!(reply.reply.starts_with("Sorry"));
        assert!(!reply.suggestions.is_empty());
    }

    #[test]
    fn loads_from_config() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [chat]
            fallback = "Ask a prefect."

            [[chat.rules]]
            pattern = "quidditch"
            response = "Practice is on Tuesdays."
            suggestions = ["Where?"]
            "#,
        ));
        let config: ChatConfig = figment.extract_inner("chat").unwrap();
        assert_eq!(config.rules().len(), 1);

        let reply = respond(&config, "When is QUIDDITCH practice?");
        assert_eq!(reply.reply, "Practice is on Tuesdays.");
        assert_eq!(reply.suggestions, vec!["Where?".to_string()]);
        assert_eq!(respond(&config, "hello").reply, "Ask a prefect.");
    }

    #[test]
    fn invalid_pattern_fails_to_load() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [chat]
            fallback = "?"

            [[chat.rules]]
            pattern = "(unclosed"
            response = "never"
            "#,
        ));
        assert!(figment.extract_inner::<ChatConfig>("chat").is_err());
    }
}
