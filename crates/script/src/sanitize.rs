use std::sync::LazyLock;

use regex::Regex;

struct Rules {
    stage_direction: Regex,
    parenthetical: Regex,
    heading: Regex,
    emphasis: Regex,
    bullet: Regex,
    horizontal_rule: Regex,
    whitespace: Regex,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| Rules {
    stage_direction: Regex::new(r"\[[^\]]*\]").expect("invalid stage direction regex"),
    parenthetical: Regex::new(r"\([^)]*\)").expect("invalid parenthetical regex"),
    heading: Regex::new(r"#+").expect("invalid heading regex"),
    emphasis: Regex::new(r"[*_]+").expect("invalid emphasis regex"),
    bullet: Regex::new(r"(?m)^\s*(?:[-•]\s+)+").expect("invalid bullet regex"),
    horizontal_rule: Regex::new(r"(?m)^[^\S\n]*-{3,}[^\S\n]*$").expect("invalid rule regex"),
    whitespace: Regex::new(r"\s+").expect("invalid whitespace regex"),
});

/// Removes markup and directions that should not be read aloud.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_for_speech(text: &str) -> String {
    let rules = &*RULES;

    let text = rules.stage_direction.replace_all(text, "");
    let text = rules.parenthetical.replace_all(&text, "");
    let text = rules.heading.replace_all(&text, "");
    let text = rules.emphasis.replace_all(&text, "");
    let text = rules.bullet.replace_all(&text, "");
    let text = rules.horizontal_rule.replace_all(&text, "");
    let text = rules.whitespace.replace_all(&text, " ");

    text.trim().to_string()
}
