//! Meetup-intent detection for message bodies.
//!
//! Each rule is compiled on its own and evaluated independently; a message
//! has plans when any rule matches. All rules are case-insensitive and
//! anchored on word boundaries so digits buried in longer tokens do not fire.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

const RULES: &[(&str, &str)] = &[
    (
        "clock time",
        r"\b(?:[01]?\d|2[0-3]):[0-5]\d\s?(?:am|pm)?\b",
    ),
    (
        "hour with am/pm",
        r"\b(?:1[0-2]|0?[1-9])\s?(?:am|pm)\b",
    ),
    (
        "at/around a time",
        r"\b(?:at|around)\s+(?:1[0-2]|0?[1-9])(?::[0-5]\d)?\s?(?:am|pm|ish)?\b",
    ),
    (
        "by/after/until a time",
        r"\b(?:by|after|until|til)\s+(?:1[0-2]|0?[1-9])(?::[0-5]\d(?:\s?(?:am|pm))?|\s?(?:am|pm))\b",
    ),
    (
        "relative day",
        r"\b(?:tomorrow|tmrw|tmr|tonight|tonite|this\s+(?:weekend|morning|afternoon|evening)|next\s+weekend|(?:this|next|on)\s+(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday))\b",
    ),
    (
        "let's meet",
        r"\blet['’]?s\s+(?:meet|get\s+together|link\s+up)\b",
    ),
    (
        "grab coffee/drinks/dinner",
        r"\b(?:grab|get|go\s+for)\s+(?:a\s+|some\s+)?(?:coffee|drinks?|dinner|lunch|brunch|breakfast|a\s+bite|food)\b",
    ),
    (
        "hang out",
        r"\b(?:hang\s?out|meet\s?up)\b",
    ),
    (
        "are you free",
        r"\b(?:are|r)\s+(?:you|u)\s+(?:free|available|around|busy)\b",
    ),
    (
        "what time",
        r"\bwhat\s+time\b",
    ),
    (
        "when can we",
        r"\bwhen\s+(?:can|could|should|do|are)\s+(?:we|you|u)\b",
    ),
    (
        "come over",
        r"\bcome\s+over\b",
    ),
    (
        "my/your place",
        r"\b(?:my|your)\s+(?:place|apartment|apt)\b",
    ),
    (
        "first date",
        r"\bfirst\s+date\b",
    ),
    (
        "see you at",
        r"\bsee\s+(?:you|u|ya)\s+(?:at|on|tomorrow|tonight|then|there)\b",
    ),
];

static DETECTOR: Lazy<PlanDetector> =
    Lazy::new(|| PlanDetector::new().expect("built-in plan rules compile"));

#[derive(Debug)]
pub struct PlanRule {
    pub description: &'static str,
    pattern: Regex,
}

impl PlanRule {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

#[derive(Debug)]
pub struct PlanDetector {
    rules: Vec<PlanRule>,
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDetection {
    pub has_plans: bool,
    pub matched_rules: Vec<&'static str>,
}

impl PlanDetector {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|&(description, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|pattern| PlanRule { description, pattern })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Process-wide detector compiled on first use.
    pub fn global() -> &'static PlanDetector {
        &DETECTOR
    }

    pub fn rules(&self) -> &[PlanRule] {
        &self.rules
    }

    pub fn detect(&self, text: &str) -> bool {
        self.rules.iter().any(|r| r.matches(text))
    }

    pub fn matching_rules(&self, text: &str) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| r.matches(text))
            .map(|r| r.description)
            .collect()
    }

    pub fn classify(&self, text: &str) -> PlanDetection {
        let matched_rules = self.matching_rules(text);
        PlanDetection {
            has_plans: !matched_rules.is_empty(),
            matched_rules,
        }
    }

    /// True when any message in the conversation has plans.
    pub fn conversation_has_plans<'a, I>(&self, contents: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        contents.into_iter().any(|c| self.detect(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> &'static PlanDetector {
        PlanDetector::global()
    }

    fn rule(description: &str) -> &'static PlanRule {
        detector()
            .rules()
            .iter()
            .find(|r| r.description == description)
            .unwrap()
    }

    #[test]
    fn all_rules_compile() {
        assert_eq!(PlanDetector::new().unwrap().rules().len(), RULES.len());
    }

    #[test]
    fn reference_messages() {
        assert!(detector().detect("Let's meet tomorrow at 7pm"));
        assert!(!detector().detect("I love hiking and board games"));
        assert!(!detector().detect("hey whats up"));
    }

    #[test]
    fn clock_time_rule() {
        let r = rule("clock time");
        assert!(r.matches("dinner at 7:30pm?"));
        assert!(r.matches("19:45 works"));
        assert!(!r.matches("version 7:30pmx"));
        assert!(!r.matches("ratio 17:3"));
    }

    #[test]
    fn hour_with_am_pm_rule() {
        let r = rule("hour with am/pm");
        assert!(r.matches("8pm?"));
        assert!(r.matches("7 pm works"));
        assert!(r.matches("10AM"));
        assert!(!r.matches("7pmx"));
        assert!(!r.matches("room 8"));
        assert!(!r.matches("a48pm"));
    }

    #[test]
    fn at_around_time_rule() {
        let r = rule("at/around a time");
        assert!(r.matches("see u at 7"));
        assert!(r.matches("around 8pm"));
        assert!(r.matches("at 5ish"));
        assert!(!r.matches("at 70 percent"));
        assert!(!r.matches("at the park"));
    }

    #[test]
    fn by_after_until_need_a_clock_time() {
        let r = rule("by/after/until a time");
        assert!(r.matches("by 9:15"));
        assert!(r.matches("after 9pm"));
        assert!(r.matches("until 10 am"));
        assert!(!r.matches("I moved here after 2 years in Denver"));
        assert!(!r.matches("we finished until 3 days ago"));
        assert!(!r.matches("by 9 people"));

        assert!(!detector().detect("I moved here after 2 years in Denver"));
        assert!(!detector().detect("we finished until 3 days ago"));
    }

    #[test]
    fn relative_day_rule() {
        let r = rule("relative day");
        assert!(r.matches("Tonight?"));
        assert!(r.matches("free this weekend"));
        assert!(r.matches("how about on Friday"));
        assert!(r.matches("next weekend?"));
        assert!(!r.matches("tomorrowland was fun"));
        assert!(!r.matches("I start my new job next week"));
        assert!(!detector().detect("I start my new job next week"));
    }

    #[test]
    fn planning_verbs() {
        assert!(rule("let's meet").matches("Lets meet halfway"));
        assert!(rule("let's meet").matches("let’s link up"));
        assert!(rule("grab coffee/drinks/dinner").matches("wanna grab a drink"));
        assert!(rule("grab coffee/drinks/dinner").matches("go for dinner"));
        assert!(rule("hang out").matches("we should hangout"));
        assert!(!rule("hang out").matches("hangouts app"));
    }

    #[test]
    fn availability_questions() {
        assert!(rule("are you free").matches("r u free sat"));
        assert!(rule("what time").matches("What time works?"));
        assert!(rule("when can we").matches("when can we do this"));
    }

    #[test]
    fn location_and_date_phrasing() {
        assert!(rule("come over").matches("come over later"));
        assert!(rule("my/your place").matches("drinks at my place"));
        assert!(rule("first date").matches("best first date idea"));
        assert!(rule("see you at").matches("see you there!"));
    }

    #[test]
    fn classify_lists_every_matching_rule() {
        let d = detector().classify("Let's meet tomorrow at 7pm");
        assert!(d.has_plans);
        assert!(d.matched_rules.contains(&"let's meet"));
        assert!(d.matched_rules.contains(&"relative day"));
        assert!(d.matched_rules.contains(&"hour with am/pm"));
        assert!(d.matched_rules.contains(&"at/around a time"));

        let none = detector().classify("haha same");
        assert_eq!(none, PlanDetection { has_plans: false, matched_rules: vec![] });
    }

    #[test]
    fn conversation_flag_is_any_message() {
        let convo = ["hi", "how was your week", "are you free friday"];
        assert!(detector().conversation_has_plans(convo));
        assert!(!detector().conversation_has_plans(["hi", "lol"]));
        assert!(!detector().conversation_has_plans(std::iter::empty()));
    }

    #[test]
    fn detection_is_deterministic() {
        let text = "Grab coffee at 10am tomorrow?";
        let first = detector().classify(text);
        for _ in 0..5 {
            assert_eq!(detector().classify(text), first);
        }
    }
}
