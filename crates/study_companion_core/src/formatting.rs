//! crates/study_companion_core/src/formatting.rs
//!
//! Helpers for the source reformatting request.

use regex::Regex;
use std::sync::OnceLock;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[^\n`]*\n(.*?)\n?```").expect("fence pattern is valid")
    })
}

/// Returns the body of the first fenced code block in `reply`, or the trimmed
/// reply when it contains no fence.
pub fn extract_fenced_block(reply: &str) -> String {
    match fence_regex().captures(reply).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().to_string(),
        None => reply.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_body_of_tagged_fence() {
        let reply = "Here you go:\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\nEnjoy!";
        assert_eq!(
            extract_fenced_block(reply),
            "fn main() {\n    println!(\"hi\");\n}"
        );
    }

    #[test]
    fn extracts_first_of_several_fences() {
        let reply = "```\nfirst\n```\n\n```\nsecond\n```";
        assert_eq!(extract_fenced_block(reply), "first");
    }

    #[test]
    fn falls_back_to_trimmed_reply() {
        assert_eq!(extract_fenced_block("  x = 1\n"), "x = 1");
    }
}
