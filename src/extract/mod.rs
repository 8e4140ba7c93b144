//! Cheap place-name detection over free text.
//!
//! Two independent passes feed one ordered candidate list: syntactic pattern
//! rules (a location cue followed by up to four capitalised words) and a
//! gazetteer scan of known city names. Nothing is merged or deduplicated; the
//! first candidate is the one callers geocode.

pub mod gazetteer;

use regex::Regex;
use std::sync::LazyLock;

/// Which rule produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    In,
    At,
    Near,
    Around,
    Of,
    SentenceStart,
    Gazetteer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Low,
    Gazetteer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLocation {
    pub name: String,
    pub source: LocationSource,
    pub confidence: Confidence,
}

/// Capitalised words that start sentences or follow cues without naming a place.
/// Compared case-sensitively against the whole captured phrase.
const STOP_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "There", "Here", "What", "Where", "When", "Why",
    "How", "Which", "Who", "However", "It", "Its", "I", "A", "An", "Is", "Are", "Can", "Could",
    "Would", "Should", "Will", "Please", "My", "Our", "Your", "If", "And", "But", "So", "Also",
    "Then", "Do", "Does", "In", "At", "Of", "Near", "Around", "Based", "According",
];

const PLACE_PHRASE: &str = r"([A-Z][A-Za-z'\-]*(?:[ \t]+[A-Z][A-Za-z'\-]*){0,3})";

fn cue_rule(cue: &str) -> Regex {
    Regex::new(&format!(r"\b(?i:{})[ \t]+{}", cue, PLACE_PHRASE)).expect("Invalid cue regex")
}

static PATTERN_RULES: LazyLock<Vec<(LocationSource, Regex)>> = LazyLock::new(|| {
    vec![
        (LocationSource::In, cue_rule("in")),
        (LocationSource::At, cue_rule("at")),
        (LocationSource::Near, cue_rule("near")),
        (LocationSource::Around, cue_rule("around")),
        (LocationSource::Of, cue_rule("of")),
        (
            LocationSource::SentenceStart,
            Regex::new(&format!(r"(?m)(?:^|[.!?][ \t]+)[ \t]*{}", PLACE_PHRASE))
                .expect("Invalid sentence-start regex"),
        ),
    ]
});

fn is_stop_word(phrase: &str) -> bool {
    STOP_WORDS.contains(&phrase)
}

/// Runs every pattern rule then the gazetteer over `text`.
///
/// Output order is stable for identical input: rules in declaration order,
/// matches left to right within a rule, then gazetteer hits in gazetteer order.
pub fn extract(text: &str) -> Vec<ExtractedLocation> {
    let mut candidates = Vec::new();

    for (source, rule) in PATTERN_RULES.iter() {
        for caps in rule.captures_iter(text) {
            if let Some(phrase) = caps.get(1) {
                let name = phrase.as_str().trim();
                if name.is_empty() || is_stop_word(name) {
                    continue;
                }
                candidates.push(ExtractedLocation {
                    name: name.to_string(),
                    source: *source,
                    confidence: Confidence::Low,
                });
            }
        }
    }

    for city in gazetteer::scan(text) {
        candidates.push(ExtractedLocation {
            name: city.to_string(),
            source: LocationSource::Gazetteer,
            confidence: Confidence::Gazetteer,
        });
    }

    tracing::debug!(count = candidates.len(), "extracted location candidates");
    candidates
}

/// The most likely place mentioned in `text`, if any.
pub fn primary_candidate(text: &str) -> Option<ExtractedLocation> {
    extract(text).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_names(text: &str) -> Vec<String> {
        extract(text).into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn cue_candidate_precedes_gazetteer_hit() {
        let names = extract_names("Flood risk near Mumbai this year");
        assert_eq!(names.first().map(String::as_str), Some("Mumbai"));
        assert!(names.contains(&"mumbai".to_string()));
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Compare rainfall in Pune with Chennai. Kolkata floods too.";
        let first = extract(text);
        for _ in 0..5 {
            assert_eq!(extract(text), first);
        }
    }

    #[test]
    fn gazetteer_is_case_insensitive() {
        let names = extract_names("I live in DELHI");
        assert!(names.contains(&"delhi".to_string()));
    }

    #[test]
    fn stop_words_are_suppressed() {
        let names = extract_names("The analysis shows risk");
        assert!(!names.contains(&"The".to_string()));
        assert!(names.is_empty());
    }

    #[test]
    fn captures_up_to_four_capitalised_words() {
        let found = extract("Hospitals around Navi Mumbai Sector Seventeen Extension");
        let around = found
            .iter()
            .find(|c| c.source == LocationSource::Around)
            .map(|c| c.name.as_str());
        assert_eq!(around, Some("Navi Mumbai Sector Seventeen"));
    }

    #[test]
    fn sentence_start_phrase_is_low_confidence() {
        let found = extract("Shimla gets snow. Where else?");
        assert_eq!(found[0].name, "Shimla");
        assert_eq!(found[0].source, LocationSource::SentenceStart);
        assert_eq!(found[0].confidence, Confidence::Low);
        assert_eq!(found.last().map(|c| c.confidence), Some(Confidence::Gazetteer));
        assert!(!found.iter().any(|c| c.name == "Where"));
    }

    #[test]
    fn cue_words_match_case_insensitively() {
        let names = extract_names("Groundwater AT Jodhpur");
        assert_eq!(names.first().map(String::as_str), Some("Jodhpur"));
    }

    #[test]
    fn no_candidates_in_lowercase_text() {
        assert_eq!(primary_candidate("what is ndvi used for"), None);
    }
}
