use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Stable question identifier; status and answers are keyed by it, never by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionContent {
    Text(String),
    /// Question whose body is an image; `alt` keeps the original text.
    Image { url: String, alt: String },
}

impl QuestionContent {
    pub fn image_url(&self) -> Option<&str> {
        match self {
            QuestionContent::Image { url, .. } => Some(url),
            QuestionContent::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub content: QuestionContent,
    pub options: Vec<String>,
}

impl Question {
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub duration_secs: u64,
    pub questions: Vec<Question>,
}

/// Reference data for one attempt. Fetched once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub id: String,
    pub name: String,
    pub total_duration_secs: u64,
    pub sections: Vec<Section>,
    pub proctoring_enabled: bool,
}

impl Test {
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Every question in test order, paired with its section.
    pub fn questions(&self) -> impl Iterator<Item = (&Section, &Question)> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter().map(move |q| (section, q)))
    }

    pub fn section_lengths(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.questions.len()).collect()
    }
}

const URL_TERMINATORS: &[char] = &['"', '\'', '<', '>'];
const TRAILING_PUNCTUATION: &[char] = &[')', ',', '.', ';', '!', '?'];

/// Classify question text: text carrying an http(s) URL is rendered as an image.
pub fn detect_content(text: &str) -> QuestionContent {
    match find_url(text.trim()) {
        Some(url) => QuestionContent::Image {
            url,
            alt: text.to_string(),
        },
        None => QuestionContent::Text(text.to_string()),
    }
}

fn find_url(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = match (lower.find("https://"), lower.find("http://")) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return None,
    };

    let candidate = text[start..]
        .split(|c: char| c.is_whitespace() || URL_TERMINATORS.contains(&c))
        .next()?
        .trim_end_matches(TRAILING_PUNCTUATION);

    let parsed = Url::parse(candidate).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            content: QuestionContent::Text(format!("text of {id}")),
            options: vec!["a".into(), "b".into()],
        }
    }

    #[test]
    fn questions_iterate_in_test_order() {
        let test = Test {
            id: "t".into(),
            name: "Mock".into(),
            total_duration_secs: 0,
            proctoring_enabled: true,
            sections: vec![
                Section {
                    id: "s1".into(),
                    name: "A".into(),
                    duration_secs: 60,
                    questions: vec![question("q1"), question("q2")],
                },
                Section {
                    id: "s2".into(),
                    name: "B".into(),
                    duration_secs: 30,
                    questions: vec![question("q3")],
                },
            ],
        };

        let order: Vec<(&str, &str)> = test
            .questions()
            .map(|(s, q)| (s.name.as_str(), q.id.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "q1"), ("A", "q2"), ("B", "q3")]);
        assert_eq!(test.question_count(), 3);
        assert_eq!(test.section_lengths(), vec![2, 1]);
    }

    #[test]
    fn plain_text_stays_text() {
        assert_eq!(
            detect_content("What is 2 + 2?"),
            QuestionContent::Text("What is 2 + 2?".into())
        );
    }

    #[test]
    fn url_becomes_image_with_trailing_punctuation_stripped() {
        let content = detect_content("See https://cdn.example.com/q/42.png).");
        assert_eq!(content.image_url(), Some("https://cdn.example.com/q/42.png"));
    }

    #[test]
    fn non_http_schemes_are_ignored() {
        assert!(matches!(
            detect_content("ftp://example.com/file.png"),
            QuestionContent::Text(_)
        ));
    }
}
