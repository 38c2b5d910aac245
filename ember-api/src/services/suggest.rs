use regex::Regex;
use serde::Deserialize;

use ember_shared::clients::generation::GenerationClient;

pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Opener,
    Question,
    Response,
    Activity,
    General,
}

impl SuggestionCategory {
    fn instruction(self) -> &'static str {
        match self {
            Self::Opener => {
                "Write 3 short, warm opening messages to start the conversation. \
                 Reference a shared interest when one exists."
            }
            Self::Question => {
                "Write 3 short, curious questions that invite a real answer, \
                 drawing on their bio and interests."
            }
            Self::Response => {
                "Write 3 short, natural replies that keep the conversation going, \
                 building on the recent messages."
            }
            Self::Activity => {
                "Write 3 short messages suggesting a concrete activity to do \
                 together, ideally tied to a shared interest."
            }
            Self::General => {
                "Write 3 short, friendly messages that fit this conversation."
            }
        }
    }
}

/// Profile context both participants contribute to the prompt.
#[derive(Debug, Clone, Default)]
pub struct SuggestionContext {
    pub my_name: String,
    pub their_name: String,
    pub my_bio: Option<String>,
    pub their_bio: Option<String>,
    pub my_interests: Vec<String>,
    pub their_interests: Vec<String>,
    /// (from_me, content) pairs, oldest first.
    pub recent_messages: Vec<(bool, String)>,
}

impl SuggestionContext {
    pub fn shared_interests(&self) -> Vec<String> {
        self.my_interests
            .iter()
            .filter(|m| {
                self.their_interests
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(m))
            })
            .cloned()
            .collect()
    }
}

/// Assemble the single-turn prompt sent to the generation endpoint.
pub fn build_prompt(ctx: &SuggestionContext, category: SuggestionCategory) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are helping {me} write messages to {them} on a dating app.\n",
        me = ctx.my_name,
        them = ctx.their_name,
    ));

    if let Some(bio) = &ctx.my_bio {
        prompt.push_str(&format!("{}'s bio: {}\n", ctx.my_name, bio));
    }
    if let Some(bio) = &ctx.their_bio {
        prompt.push_str(&format!("{}'s bio: {}\n", ctx.their_name, bio));
    }
    if !ctx.their_interests.is_empty() {
        prompt.push_str(&format!(
            "{}'s interests: {}\n",
            ctx.their_name,
            ctx.their_interests.join(", ")
        ));
    }

    let shared = ctx.shared_interests();
    if !shared.is_empty() {
        prompt.push_str(&format!("Shared interests: {}\n", shared.join(", ")));
    }

    if !ctx.recent_messages.is_empty() {
        prompt.push_str("Recent messages:\n");
        for (from_me, content) in &ctx.recent_messages {
            let who = if *from_me { &ctx.my_name } else { &ctx.their_name };
            prompt.push_str(&format!("{who}: {content}\n"));
        }
    }

    prompt.push_str(category.instruction());
    prompt
}

/// Parse the model output into suggestion strings.
///
/// Primary format is a numbered list (`1. text` / `2) text`). When nothing
/// parses, fall back to splitting on sentence punctuation and taking the
/// first fragments.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    let numbered = Regex::new(r"(?m)^\s*\d+[.)]\s*(.+)$").expect("static regex");

    let mut suggestions: Vec<String> = numbered
        .captures_iter(raw)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if suggestions.is_empty() {
        suggestions = raw
            .split(['.', '!', '?'])
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Fixed per-category fallbacks, used whenever generation fails or returns
/// nothing usable.
pub fn fallbacks(category: SuggestionCategory) -> Vec<String> {
    let list: [&str; 3] = match category {
        SuggestionCategory::Opener => [
            "Hey! Your profile caught my eye. How's your week going?",
            "Hi there! What's been the highlight of your day?",
            "Hey! I had to say hi. What are you up to this weekend?",
        ],
        SuggestionCategory::Question => [
            "What's something you're really into right now?",
            "If you had a free day tomorrow, how would you spend it?",
            "What's the best thing that happened to you this week?",
        ],
        SuggestionCategory::Response => [
            "That sounds great! Tell me more.",
            "Ha, I love that. What happened next?",
            "Nice! I've been meaning to try that myself.",
        ],
        SuggestionCategory::Activity => [
            "Want to grab a coffee sometime this week?",
            "There's a great spot nearby I've been wanting to check out. Interested?",
            "How about a walk in the park this weekend?",
        ],
        SuggestionCategory::General => [
            "How's your day going so far?",
            "Any fun plans coming up?",
            "What's keeping you busy these days?",
        ],
    };
    list.iter().map(|s| s.to_string()).collect()
}

/// Turn a generation result into the final suggestion list. Split out from
/// the network call so the fallback behavior is testable.
pub fn suggestions_from(result: Result<String, String>, category: SuggestionCategory) -> Vec<String> {
    match result {
        Ok(raw) => {
            let parsed = parse_suggestions(&raw);
            if parsed.is_empty() {
                fallbacks(category)
            } else {
                parsed
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, category = ?category, "suggestion generation failed, using fallbacks");
            fallbacks(category)
        }
    }
}

pub async fn generate(
    client: &GenerationClient,
    ctx: &SuggestionContext,
    category: SuggestionCategory,
) -> Vec<String> {
    let prompt = build_prompt(ctx, category);
    suggestions_from(client.generate(&prompt).await, category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_list() {
        let raw = "Here you go:\n1. Hey, how was your hike?\n2. Coffee this week?\n3. What's your favorite trail?";
        let parsed = parse_suggestions(raw);
        assert_eq!(
            parsed,
            vec![
                "Hey, how was your hike?",
                "Coffee this week?",
                "What's your favorite trail?"
            ]
        );
    }

    #[test]
    fn parses_paren_numbering_and_quotes() {
        let raw = "1) \"First one\"\n2) Second one";
        assert_eq!(parse_suggestions(raw), vec!["First one", "Second one"]);
    }

    #[test]
    fn caps_at_three() {
        let raw = "1. a\n2. b\n3. c\n4. d\n5. e";
        assert_eq!(parse_suggestions(raw).len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn falls_back_to_sentence_split() {
        let raw = "Ask about the trip! Mention the dog. Suggest tacos?";
        assert_eq!(
            parse_suggestions(raw),
            vec!["Ask about the trip", "Mention the dog", "Suggest tacos"]
        );
    }

    #[test]
    fn generation_error_yields_fixed_fallbacks() {
        let out = suggestions_from(Err("timeout".into()), SuggestionCategory::Opener);
        assert_eq!(out, fallbacks(SuggestionCategory::Opener));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn unparseable_output_yields_fallbacks() {
        let out = suggestions_from(Ok("   ".into()), SuggestionCategory::Question);
        assert_eq!(out, fallbacks(SuggestionCategory::Question));
    }

    #[test]
    fn every_category_has_three_fallbacks() {
        for category in [
            SuggestionCategory::Opener,
            SuggestionCategory::Question,
            SuggestionCategory::Response,
            SuggestionCategory::Activity,
            SuggestionCategory::General,
        ] {
            let list = fallbacks(category);
            assert_eq!(list.len(), 3);
            assert!(list.iter().all(|s| !s.is_empty()));
        }
    }

    #[test]
    fn prompt_includes_shared_interests_and_history() {
        let ctx = SuggestionContext {
            my_name: "Ana".into(),
            their_name: "Ben".into(),
            my_bio: Some("Trail runner".into()),
            their_bio: Some("Coffee nerd".into()),
            my_interests: vec!["hiking".into(), "coffee".into()],
            their_interests: vec!["Coffee".into(), "movies".into()],
            recent_messages: vec![(false, "hey!".into()), (true, "hey, how's it going?".into())],
        };
        let prompt = build_prompt(&ctx, SuggestionCategory::Response);
        assert!(prompt.contains("Shared interests: coffee"));
        assert!(prompt.contains("Ben: hey!"));
        assert!(prompt.contains("Ana: hey, how's it going?"));
        assert!(prompt.contains("replies"));
    }
}
