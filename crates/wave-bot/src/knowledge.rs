// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Canned knowledge and literal keyword routing.
//!
//! A knowledge base is a YAML document:
//!
//! ```yaml
//! name: landing
//! topics:
//!   about: Wave AI is a resurrection engine for abandoned ideas.
//!   steps: ["Submit: enter the idea", "Revive: get a blueprint"]
//!   benefits:
//!     - { label: Teams, text: Learn collectively }
//! rules:
//!   - topic: identity
//!     keywords: ["what is", "about wave"]
//!     template: "🌊 **What is Wave AI?**\n\n{{about}}"
//!   - topic: how_it_works
//!     keywords: ["how does", "process"]
//!     template: "{{steps|numbered}}"
//! default: I can help you with...
//! follow_ups:
//!   - keywords: ["price"]
//!     suggestions: ["Is there a free tier?"]
//! default_follow_ups: ["How do I get started?"]
//! encouragements: ["Every failure is data."]
//! ```
//!
//! Rules are tried in order; the first one with any keyword contained in the
//! lowercased input wins.  Templates are rendered once at load time.
//! `{{name}}` inserts a topic: prose as-is, lists as `•` bullets, labeled
//! items as `• **label**: text`.  The `bullets`, `numbered` and `labeled`
//! filters change the list layout; `labeled` also bolds the `Head:` part of
//! plain list items.
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use wave_config::Persona;

use crate::{Humanizer, KnowledgeError, Style};

const LANDING_YAML: &str = include_str!("../knowledge/landing.yaml");
const SUPPORT_YAML: &str = include_str!("../knowledge/support.yaml");
const APP_YAML: &str = include_str!("../knowledge/app.yaml");

// ─── YAML schema ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KnowledgeDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    topics: BTreeMap<String, TopicDoc>,
    #[serde(default)]
    rules: Vec<RuleDoc>,
    default: String,
    #[serde(default)]
    follow_ups: Vec<FollowUps>,
    #[serde(default)]
    default_follow_ups: Vec<String>,
    #[serde(default)]
    encouragements: Vec<String>,
    #[serde(default)]
    style: Style,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TopicDoc {
    Prose(String),
    Labeled(Vec<LabeledItem>),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct LabeledItem {
    label: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RuleDoc {
    topic: String,
    keywords: Vec<String>,
    template: String,
}

/// Suggestions offered after an answer whose question contains any of
/// `keywords`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FollowUps {
    pub keywords: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Plain,
    Bullets,
    Numbered,
    Labeled,
}

impl Layout {
    fn parse(filter: Option<&str>) -> Option<Self> {
        match filter {
            None => Some(Layout::Plain),
            Some("bullets") => Some(Layout::Bullets),
            Some("numbered") => Some(Layout::Numbered),
            Some("labeled") => Some(Layout::Labeled),
            Some(_) => None,
        }
    }
}

impl TopicDoc {
    fn render(&self, layout: Layout) -> String {
        match self {
            TopicDoc::Prose(text) => text.trim().to_string(),
            TopicDoc::List(items) => list(
                items.iter().map(|item| match layout {
                    Layout::Labeled => bold_head(item),
                    _ => item.clone(),
                }),
                layout,
            ),
            TopicDoc::Labeled(items) => list(
                items.iter().map(|i| format!("**{}**: {}", i.label, i.text)),
                layout,
            ),
        }
    }
}

fn list(lines: impl Iterator<Item = String>, layout: Layout) -> String {
    lines
        .enumerate()
        .map(|(n, line)| match layout {
            Layout::Numbered => format!("{}. {line}", n + 1),
            _ => format!("• {line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bold_head(item: &str) -> String {
    match item.split_once(": ") {
        Some((head, tail)) => format!("**{head}**: {tail}"),
        None => item.to_string(),
    }
}

/// Expand every `{{topic}}` / `{{topic|filter}}` in `template`.  An
/// unterminated `{{` is kept verbatim.
fn render_template(
    rule: &str,
    template: &str,
    topics: &BTreeMap<String, TopicDoc>,
) -> Result<String, KnowledgeError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let inner = after[..end].trim();
        let (name, filter) = match inner.split_once('|') {
            Some((n, f)) => (n.trim(), Some(f.trim())),
            None => (inner, None),
        };
        let topic = topics.get(name).ok_or_else(|| KnowledgeError::UnknownTopic {
            rule: rule.to_string(),
            topic: name.to_string(),
        })?;
        let layout = Layout::parse(filter).ok_or_else(|| KnowledgeError::UnknownFilter {
            rule: rule.to_string(),
            filter: filter.unwrap_or_default().to_string(),
        })?;
        out.push_str(&topic.render(layout));
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

// ─── Public types ────────────────────────────────────────────────────────────

/// A keyword rule with its fully rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub topic: String,
    /// Lowercased keywords; any one contained in the input matches.
    pub keywords: Vec<String>,
    pub response: String,
}

impl Rule {
    /// `lowered` must already be lowercased.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Immutable canned knowledge for one assistant persona.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    name: String,
    rules: Vec<Rule>,
    default_response: String,
    follow_ups: Vec<FollowUps>,
    default_follow_ups: Vec<String>,
    encouragements: Vec<String>,
    style: Style,
    humanizer: Humanizer,
}

impl KnowledgeBase {
    /// The knowledge base embedded for `persona`.
    pub fn builtin(persona: Persona) -> Result<Self, KnowledgeError> {
        match persona {
            Persona::Landing => Self::load(LANDING_YAML),
            Persona::Support => Self::load(SUPPORT_YAML),
            Persona::App => Self::load(APP_YAML),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeError::Io(path.display().to_string(), e))?;
        Self::load(&text)
    }

    pub fn load(yaml: &str) -> Result<Self, KnowledgeError> {
        let doc: KnowledgeDoc = serde_yaml::from_str(yaml)?;

        if doc.default.trim().is_empty() {
            return Err(KnowledgeError::EmptyDefault);
        }

        let rules = doc
            .rules
            .iter()
            .map(|r| {
                let keywords: Vec<String> = r
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                if keywords.is_empty() {
                    return Err(KnowledgeError::EmptyKeywords(r.topic.clone()));
                }
                Ok(Rule {
                    topic: r.topic.clone(),
                    keywords,
                    response: render_template(&r.topic, &r.template, &doc.topics)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let follow_ups = doc
            .follow_ups
            .into_iter()
            .map(|f| FollowUps {
                keywords: f.keywords.iter().map(|k| k.to_lowercase()).collect(),
                suggestions: f.suggestions,
            })
            .collect();

        let humanizer = Humanizer::new(&doc.style.substitutions)?;
        debug!(name = %doc.name, rules = rules.len(), topics = doc.topics.len(), "knowledge base loaded");

        Ok(Self {
            name: doc.name,
            rules,
            default_response: doc.default,
            follow_ups,
            default_follow_ups: doc.default_follow_ups,
            encouragements: doc.encouragements,
            style: doc.style,
            humanizer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn default_response(&self) -> &str {
        &self.default_response
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn humanizer(&self) -> &Humanizer {
        &self.humanizer
    }

    pub fn encouragements(&self) -> &[String] {
        &self.encouragements
    }

    /// First rule with a keyword contained in the lowercased `text`.
    pub fn resolve_keyword_match(&self, text: &str) -> Option<&Rule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|r| r.matches(&lowered))
    }

    /// Raw (unhumanized) response for `text`: the matched rule's response or
    /// the default.  Blank input always gets the default.
    pub fn response_for(&self, text: &str) -> &str {
        if text.trim().is_empty() {
            return &self.default_response;
        }
        self.resolve_keyword_match(text)
            .map_or(self.default_response.as_str(), |r| r.response.as_str())
    }

    pub fn follow_up_suggestions(&self, text: &str) -> &[String] {
        let lowered = text.to_lowercase();
        self.follow_ups
            .iter()
            .find(|f| f.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map_or(self.default_follow_ups.as_slice(), |f| f.suggestions.as_slice())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
name: small
topics:
  about: >-
    Wave AI revives ideas.
  steps:
    - "Submit: enter the idea"
    - "Revive: get a blueprint"
  perks:
    - label: Teams
      text: Learn together
    - label: Solo
      text: Grow alone
rules:
  - topic: identity
    keywords: ["What Is", "about"]
    template: "About: {{about}}"
  - topic: steps
    keywords: ["steps"]
    template: "{{steps|numbered}}\n--\n{{steps|labeled}}\n--\n{{steps}}"
  - topic: perks
    keywords: ["perk", "about perks"]
    template: "{{ perks }}|{{perks|numbered}}"
default: Nothing matched.
follow_ups:
  - keywords: ["Price"]
    suggestions: ["Is it free?"]
default_follow_ups: ["Tell me more"]
encouragements: ["Keep going"]
"#;

    fn small() -> KnowledgeBase {
        KnowledgeBase::load(SMALL).unwrap()
    }

    #[test]
    fn prose_topics_are_inserted_verbatim() {
        let kb = small();
        assert_eq!(kb.resolve_keyword_match("what is this").unwrap().response, "About: Wave AI revives ideas.");
    }

    #[test]
    fn list_layouts() {
        let kb = small();
        let r = kb.resolve_keyword_match("show me the steps").unwrap();
        assert_eq!(
            r.response,
            "1. Submit: enter the idea\n2. Revive: get a blueprint\n--\n\
             • **Submit**: enter the idea\n• **Revive**: get a blueprint\n--\n\
             • Submit: enter the idea\n• Revive: get a blueprint"
        );
    }

    #[test]
    fn labeled_items_and_spaced_placeholders() {
        let kb = small();
        let r = kb.resolve_keyword_match("any perk?").unwrap();
        assert_eq!(
            r.response,
            "• **Teams**: Learn together\n• **Solo**: Grow alone|1. **Teams**: Learn together\n2. **Solo**: Grow alone"
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let kb = small();
        // "about perks" also matches the perks rule, but identity comes first.
        assert_eq!(kb.resolve_keyword_match("ABOUT PERKS").unwrap().topic, "identity");
    }

    #[test]
    fn matching_is_substring_not_word_based() {
        let kb = small();
        assert_eq!(kb.resolve_keyword_match("perks").unwrap().topic, "perks");
        assert_eq!(kb.resolve_keyword_match("whatabout").unwrap().topic, "identity");
    }

    #[test]
    fn no_match_and_blank_input_use_default() {
        let kb = small();
        assert!(kb.resolve_keyword_match("zzz").is_none());
        assert_eq!(kb.response_for("zzz"), "Nothing matched.");
        assert_eq!(kb.response_for("   \n"), "Nothing matched.");
    }

    #[test]
    fn follow_ups_match_case_insensitively() {
        let kb = small();
        assert_eq!(kb.follow_up_suggestions("what's the PRICE"), ["Is it free?".to_string()]);
        assert_eq!(kb.follow_up_suggestions("hello"), ["Tell me more".to_string()]);
    }

    #[test]
    fn omitted_style_uses_builtin_lists() {
        assert_eq!(small().style(), &Style::default());
    }

    #[test]
    fn unknown_topic_is_rejected() {
        let yaml = "rules:\n  - topic: x\n    keywords: [a]\n    template: \"{{missing}}\"\ndefault: d\n";
        match KnowledgeBase::load(yaml) {
            Err(KnowledgeError::UnknownTopic { rule, topic }) => {
                assert_eq!(rule, "x");
                assert_eq!(topic, "missing");
            }
            other => panic!("expected UnknownTopic, got {other:?}"),
        }
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let yaml = "topics:\n  t: hi\nrules:\n  - topic: x\n    keywords: [a]\n    template: \"{{t|shout}}\"\ndefault: d\n";
        assert!(matches!(KnowledgeBase::load(yaml), Err(KnowledgeError::UnknownFilter { .. })));
    }

    #[test]
    fn empty_keywords_and_default_are_rejected() {
        let no_kw = "rules:\n  - topic: x\n    keywords: []\n    template: t\ndefault: d\n";
        assert!(matches!(KnowledgeBase::load(no_kw), Err(KnowledgeError::EmptyKeywords(t)) if t == "x"));
        assert!(matches!(KnowledgeBase::load("default: \"  \"\n"), Err(KnowledgeError::EmptyDefault)));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(KnowledgeBase::load("rules: [ {"), Err(KnowledgeError::Parse(_))));
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        let yaml = "rules:\n  - topic: x\n    keywords: [a]\n    template: \"tail {{oops\"\ndefault: d\n";
        let kb = KnowledgeBase::load(yaml).unwrap();
        assert_eq!(kb.rules()[0].response, "tail {{oops");
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.yaml");
        std::fs::write(&path, SMALL).unwrap();
        let kb = KnowledgeBase::from_file(&path).unwrap();
        assert_eq!(kb.name(), "small");
        assert!(matches!(
            KnowledgeBase::from_file(dir.path().join("missing.yaml")),
            Err(KnowledgeError::Io(..))
        ));
    }

    // ── Built-in knowledge ───────────────────────────────────────────────────

    #[test]
    fn builtins_load() {
        for persona in [Persona::Landing, Persona::Support] {
            let kb = KnowledgeBase::builtin(persona).unwrap();
            assert_eq!(kb.name(), persona.to_string());
            assert!(kb.rules().len() >= 13);
            assert!(kb.rules().iter().all(|r| !r.response.contains("{{")));
            assert!(!kb.follow_up_suggestions("zzz").is_empty());
            assert!(!kb.encouragements().is_empty());
        }
    }

    #[test]
    fn identity_question_routes_to_identity() {
        for persona in [Persona::Landing, Persona::Support] {
            let kb = KnowledgeBase::builtin(persona).unwrap();
            for _ in 0..3 {
                let rule = kb.resolve_keyword_match("What is Wave AI?").unwrap();
                assert_eq!(rule.topic, "identity");
                assert!(rule.response.starts_with("🌊 **What is Wave AI?**"));
                assert!(rule.response.contains("resurrection engine"));
            }
        }
    }

    #[test]
    fn cost_question_routes_to_pricing() {
        for persona in [Persona::Landing, Persona::Support] {
            let kb = KnowledgeBase::builtin(persona).unwrap();
            let rule = kb.resolve_keyword_match("how much does it cost").unwrap();
            assert_eq!(rule.topic, "pricing");
            for needle in ["Free Tier", "Pro Plan", "Enterprise"] {
                assert!(rule.response.contains(needle), "{persona}: missing {needle}");
            }
        }
    }

    #[test]
    fn gibberish_matches_nothing() {
        for persona in [Persona::Landing, Persona::Support] {
            let kb = KnowledgeBase::builtin(persona).unwrap();
            assert!(kb.resolve_keyword_match("asdkjasd random text").is_none());
        }
    }

    #[test]
    fn process_question_renders_numbered_steps() {
        let kb = KnowledgeBase::builtin(Persona::Landing).unwrap();
        let rule = kb.resolve_keyword_match("How does it work?").unwrap();
        assert_eq!(rule.topic, "how_it_works");
        assert!(rule.response.contains("1. Submit: Enter your failed idea"));
        assert!(rule.response.contains("4. Revive:"));
    }

    #[test]
    fn app_builtin_loads() {
        let kb = KnowledgeBase::builtin(Persona::App).unwrap();
        assert_eq!(kb.name(), "app");
        assert_eq!(kb.rules().len(), 6);
        assert!(kb.rules().iter().all(|r| !r.response.contains("{{")));
        assert!(kb.default_response().starts_with("🤖 **Wave AI Assistant Ready!**"));
        assert_eq!(kb.follow_up_suggestions("zzz").len(), 3);
        assert!(!kb.encouragements().is_empty());
    }

    #[test]
    fn app_questions_route_by_phrase() {
        let kb = KnowledgeBase::builtin(Persona::App).unwrap();
        let topic = |q: &str| kb.resolve_keyword_match(q).map(|r| r.topic.clone());
        assert_eq!(topic("What is Wave AI?").as_deref(), Some("identity"));
        assert_eq!(topic("Tell me about Wave").as_deref(), Some("identity"));
        assert_eq!(topic("How does it work?").as_deref(), Some("how_it_works"));
        assert_eq!(topic("how do I use this").as_deref(), Some("how_it_works"));
        assert_eq!(topic("what features do you have").as_deref(), Some("features"));
        assert_eq!(topic("how much does it cost").as_deref(), Some("pricing"));
        assert_eq!(topic("why is it different").as_deref(), Some("differentiation"));
        assert_eq!(topic("I need help").as_deref(), Some("help"));
        assert_eq!(topic("asdkjasd random text"), None);
    }

    #[test]
    fn app_answers_render_labeled_topics() {
        let kb = KnowledgeBase::builtin(Persona::App).unwrap();
        let pricing = kb.resolve_keyword_match("is it free").unwrap();
        assert!(pricing.response.contains("• **Free Tier**: 3 idea resurrections per month"));
        assert!(pricing.response.contains("• **Enterprise**: Custom solutions for teams"));
        let process = kb.resolve_keyword_match("how does it work").unwrap();
        assert!(process.response.contains("1. **Submit**: Enter your failed idea"));
        assert!(process.response.contains("4. **Revive**:"));
        let features = kb.resolve_keyword_match("capabilities?").unwrap();
        assert!(features.response.contains("• **WaveCodeGen**: AI-powered website generation"));
    }
}
