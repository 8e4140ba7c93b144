use regex::Regex;
use std::sync::LazyLock;

/// Canonical lowercase names of the cities recognised without a syntactic cue.
/// Iteration order is the order in which gazetteer hits are reported.
pub const KNOWN_CITIES: [&str; 36] = [
    "mumbai",
    "delhi",
    "new delhi",
    "bangalore",
    "bengaluru",
    "hyderabad",
    "chennai",
    "kolkata",
    "pune",
    "ahmedabad",
    "jaipur",
    "lucknow",
    "kanpur",
    "nagpur",
    "indore",
    "bhopal",
    "patna",
    "surat",
    "vadodara",
    "ludhiana",
    "agra",
    "nashik",
    "varanasi",
    "srinagar",
    "amritsar",
    "chandigarh",
    "guwahati",
    "bhubaneswar",
    "thiruvananthapuram",
    "kochi",
    "coimbatore",
    "visakhapatnam",
    "mysore",
    "dehradun",
    "shimla",
    "goa",
];

static CITY_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_CITIES
        .iter()
        .map(|city| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(city).replace(' ', r"\s+"));
            (
                *city,
                Regex::new(&pattern).expect("Invalid gazetteer regex"),
            )
        })
        .collect()
});

/// Returns every gazetteer city mentioned in `text`, in gazetteer order.
pub fn scan(text: &str) -> Vec<&'static str> {
    CITY_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(city, _)| *city)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_words_only() {
        assert_eq!(scan("Punekar is a surname"), Vec::<&str>::new());
        assert_eq!(scan("trains to pune."), vec!["pune"]);
    }

    #[test]
    fn multi_word_city_tolerates_extra_whitespace() {
        assert_eq!(scan("NEW   DELHI metro"), vec!["delhi", "new delhi"]);
    }

    #[test]
    fn reports_in_gazetteer_order() {
        assert_eq!(scan("Goa, then Agra, then Mumbai"), vec!["mumbai", "agra", "goa"]);
    }
}
