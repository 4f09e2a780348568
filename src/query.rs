use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;

static REPEATED_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(" {2,}").unwrap());

/// A sanitized catalog search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Combining marks count as part of the letter they follow, so vowel signs,
// viramas and decomposed accents stay inside their word.
fn is_query_char(c: char) -> bool {
    c == ' ' || c == '\'' || c == '.' || c.is_alphanumeric() || is_combining_mark(c)
}

fn filter_for_query(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_query_char(c) { c } else { ' ' })
        .collect()
}

/// Builds a search query from a title and optional artist.
///
/// Anything other than letters, digits, combining marks, spaces, apostrophes
/// and periods is blanked out, the artist becomes an `artist:` filter, and runs
/// of spaces are collapsed.
pub fn normalize(title: &str, artist: Option<&str>) -> Query {
    let mut query = filter_for_query(title);
    if let Some(artist) = artist {
        query.push_str(" artist:");
        query.push_str(&filter_for_query(artist));
    }

    let query = REPEATED_SPACES.replace_all(&query, " ");
    Query(query.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_artist_filter() {
        let query = normalize("Song\u{2019}s Name!!", Some("A&B"));
        assert_eq!(query.as_str(), "Song s Name artist:A B");
    }

    #[test]
    fn keeps_apostrophes_and_periods() {
        let query = normalize("Don't Stop Me Now", Some("Mr. Mister"));
        assert_eq!(query.as_str(), "Don't Stop Me Now artist:Mr. Mister");
    }

    #[test]
    fn title_only() {
        assert_eq!(normalize("  Hey / Jude  ", None).as_str(), "Hey Jude");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        let query = normalize("Café Ñandú (Live)", Some("東京事変"));
        assert_eq!(query.as_str(), "Café Ñandú Live artist:東京事変");
    }

    #[test]
    fn keeps_combining_marks_inside_words() {
        assert_eq!(normalize("नमस्ते", None).as_str(), "नमस्ते");
        assert_eq!(
            normalize("Cafe\u{301} Society", Some("Ba\u{308}nd")).as_str(),
            "Cafe\u{301} Society artist:Ba\u{308}nd"
        );
    }

    #[test]
    fn tabs_and_newlines_become_single_spaces() {
        assert_eq!(normalize("One\t\tTwo\nThree", None).as_str(), "One Two Three");
    }

    #[test]
    fn punctuation_only_title_leaves_artist_filter() {
        assert_eq!(normalize("!!!", Some("Bob")).as_str(), "artist:Bob");
    }

    #[test]
    fn output_only_contains_query_characters() {
        let samples = [
            ("Song's Name!!", Some("A&B")),
            ("[Intro] - (feat. X) / Y", None),
            ("100% Pure Love", Some("Crystal Waters")),
            ("\u{1F3B5} Emoji \u{1F3B6}", Some("\u{1F600}")),
            ("  leading and trailing  ", Some("  padded  ")),
            ("a\u{0000}b\u{007F}c", None),
            ("", Some("")),
        ];

        for (title, artist) in samples {
            let query = normalize(title, artist);
            let text = query.as_str();

            let without_filter = match artist {
                Some(_) => text.replacen("artist:", "", 1),
                None => text.to_string(),
            };
            assert!(
                without_filter.chars().all(is_query_char),
                "unexpected character in {:?}",
                text
            );
            assert!(!text.contains("  "), "double space in {:?}", text);
            assert_eq!(text, text.trim(), "untrimmed {:?}", text);
            if artist.is_some() {
                assert!(text.contains("artist:"));
            }
        }
    }
}
