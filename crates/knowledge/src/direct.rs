//! Direct answers assembled from school data without a model call.

use crate::document::{KnowledgeDocument, KnowledgeValue};

/// Condition on the lowercased question.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// At least one phrase occurs
    Any(&'static [&'static str]),
    /// Every phrase occurs
    All(&'static [&'static str]),
}

impl Predicate {
    pub fn matches(&self, question: &str) -> bool {
        match self {
            Self::Any(phrases) => phrases.iter().any(|p| question.contains(p)),
            Self::All(phrases) => phrases.iter().all(|p| question.contains(p)),
        }
    }
}

/// Produces the answer text from the document and the school name, or
/// `None` when the backing field is absent or empty.
pub type AnswerFn = fn(&KnowledgeDocument, &str) -> Option<String>;

/// One direct-answer rule.
#[derive(Debug, Clone, Copy)]
pub struct DirectRule {
    pub name: &'static str,
    pub predicate: Predicate,
    pub answer: AnswerFn,
}

/// Ordered direct-answer rules; the first rule that matches and has data wins.
#[derive(Debug, Clone)]
pub struct DirectAnswerMatcher {
    rules: Vec<DirectRule>,
    school_name: String,
}

impl DirectAnswerMatcher {
    pub fn new(rules: Vec<DirectRule>, school_name: impl Into<String>) -> Self {
        Self {
            rules,
            school_name: school_name.into(),
        }
    }

    /// Matcher with the built-in rules.
    pub fn with_default_rules(school_name: impl Into<String>) -> Self {
        Self::new(default_direct_rules(), school_name)
    }

    /// Answer `question` from `document`, if a rule applies.
    ///
    /// A rule whose predicate matches but whose field is missing does not
    /// stop the scan; later rules still get their turn.
    pub fn answer(&self, document: &KnowledgeDocument, question: &str) -> Option<String> {
        let question = question.to_lowercase();

        for rule in &self.rules {
            if !rule.predicate.matches(&question) {
                continue;
            }
            match (rule.answer)(document, &self.school_name) {
                Some(answer) => {
                    tracing::debug!(rule = rule.name, "Direct answer rule fired");
                    return Some(answer);
                }
                None => {
                    tracing::debug!(rule = rule.name, "Direct answer rule matched without data");
                }
            }
        }

        None
    }
}

fn profile_field<'a>(document: &'a KnowledgeDocument, field: &str) -> Option<&'a KnowledgeValue> {
    document.resolve_present(&["profile", field])
}

fn school_name_answer(document: &KnowledgeDocument, _school: &str) -> Option<String> {
    profile_field(document, "nama").map(|nama| nama.to_string())
}

fn address_answer(document: &KnowledgeDocument, school: &str) -> Option<String> {
    profile_field(document, "alamat").map(|alamat| format!("{} berlokasi di {}", school, alamat))
}

fn principal_answer(document: &KnowledgeDocument, school: &str) -> Option<String> {
    profile_field(document, "kepala_sekolah")
        .map(|kepsek| format!("Kepala sekolah {} adalah {}", school, kepsek))
}

fn student_count_answer(document: &KnowledgeDocument, school: &str) -> Option<String> {
    profile_field(document, "jumlah_siswa")
        .map(|siswa| format!("{} memiliki {} siswa", school, siswa))
}

fn teacher_count_answer(document: &KnowledgeDocument, school: &str) -> Option<String> {
    profile_field(document, "jumlah_guru").map(|guru| format!("{} memiliki {} guru", school, guru))
}

fn majors_answer(document: &KnowledgeDocument, school: &str) -> Option<String> {
    let jurusan = document.resolve_present(&["jurusan"])?.as_map()?;
    let codes: Vec<&str> = jurusan.keys().collect();
    Some(format!("Jurusan di {}: {}", school, codes.join(", ")))
}

fn accreditation_answer(document: &KnowledgeDocument, school: &str) -> Option<String> {
    profile_field(document, "akreditasi")
        .map(|akreditasi| format!("{} berakreditasi {}", school, akreditasi))
}

/// The built-in direct-answer rules, in priority order.
pub fn default_direct_rules() -> Vec<DirectRule> {
    vec![
        DirectRule {
            name: "school_name",
            predicate: Predicate::Any(&["nama sekolah", "nama smk"]),
            answer: school_name_answer,
        },
        DirectRule {
            name: "address",
            predicate: Predicate::All(&["alamat", "di mana"]),
            answer: address_answer,
        },
        DirectRule {
            name: "principal",
            predicate: Predicate::Any(&["kepala sekolah", "kepsek"]),
            answer: principal_answer,
        },
        DirectRule {
            name: "student_count",
            predicate: Predicate::Any(&["berapa siswa", "jumlah siswa"]),
            answer: student_count_answer,
        },
        DirectRule {
            name: "teacher_count",
            predicate: Predicate::Any(&["berapa guru", "jumlah guru"]),
            answer: teacher_count_answer,
        },
        DirectRule {
            name: "majors",
            predicate: Predicate::Any(&["jurusan apa", "ada jurusan"]),
            answer: majors_answer,
        },
        DirectRule {
            name: "accreditation",
            predicate: Predicate::Any(&["akreditasi"]),
            answer: accreditation_answer,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHOOL: &str = "SMKN 4 Bojonegoro";

    fn matcher() -> DirectAnswerMatcher {
        DirectAnswerMatcher::with_default_rules(SCHOOL)
    }

    fn document(value: serde_json::Value) -> KnowledgeDocument {
        KnowledgeDocument::from_json(value).unwrap()
    }

    #[test]
    fn test_principal_answer() {
        let doc = document(json!({"profile": {"kepala_sekolah": "Budi"}}));
        let answer = matcher().answer(&doc, "siapa kepala sekolah").unwrap();
        assert_eq!(answer, "Kepala sekolah SMKN 4 Bojonegoro adalah Budi");
        assert!(answer.contains("Budi"));
    }

    #[test]
    fn test_case_insensitive_predicates() {
        let doc = document(json!({"profile": {"kepala_sekolah": "Budi"}}));
        assert!(matcher().answer(&doc, "Siapa KEPSEK sekarang?").is_some());
    }

    #[test]
    fn test_school_name_is_verbatim() {
        let doc = document(json!({"profile": {"nama": "SMK Negeri 4 Bojonegoro"}}));
        assert_eq!(
            matcher().answer(&doc, "apa nama sekolah ini?").as_deref(),
            Some("SMK Negeri 4 Bojonegoro")
        );
    }

    #[test]
    fn test_address_needs_both_phrases() {
        let doc = document(json!({"profile": {"alamat": "Jl. Raya Surabaya"}}));
        assert!(matcher().answer(&doc, "alamat sekolah").is_none());
        assert_eq!(
            matcher().answer(&doc, "alamat sekolah di mana?").as_deref(),
            Some("SMKN 4 Bojonegoro berlokasi di Jl. Raya Surabaya")
        );
    }

    #[test]
    fn test_numeric_fields() {
        let doc = document(json!({"profile": {"jumlah_siswa": 1200, "jumlah_guru": 85}}));
        assert_eq!(
            matcher().answer(&doc, "berapa siswa di sini").as_deref(),
            Some("SMKN 4 Bojonegoro memiliki 1200 siswa")
        );
        assert_eq!(
            matcher().answer(&doc, "jumlah guru?").as_deref(),
            Some("SMKN 4 Bojonegoro memiliki 85 guru")
        );
    }

    #[test]
    fn test_majors_listed_in_document_order() {
        let doc = document(json!({"jurusan": {"TKJ": {}, "RPL": {}, "MM": {}}}));
        assert_eq!(
            matcher().answer(&doc, "ada jurusan apa saja?").as_deref(),
            Some("Jurusan di SMKN 4 Bojonegoro: TKJ, RPL, MM")
        );
    }

    #[test]
    fn test_missing_field_falls_through_to_later_rule() {
        // Principal rule matches but has no data; accreditation still answers
        let doc = document(json!({"profile": {"akreditasi": "A"}}));
        assert_eq!(
            matcher().answer(&doc, "kepala sekolah dan akreditasi").as_deref(),
            Some("SMKN 4 Bojonegoro berakreditasi A")
        );
    }

    #[test]
    fn test_empty_field_does_not_answer() {
        let doc = document(json!({"profile": {"kepala_sekolah": "  "}}));
        assert!(matcher().answer(&doc, "siapa kepsek").is_none());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let doc = document(json!({"profile": {"kepala_sekolah": "Budi", "akreditasi": "A"}}));
        let answer = matcher().answer(&doc, "kepala sekolah dan akreditasi").unwrap();
        assert!(answer.contains("Budi"));
    }

    #[test]
    fn test_generic_facility_question_has_no_direct_answer() {
        let doc = document(json!({"fasilitas": {"lab": 3}}));
        assert!(matcher().answer(&doc, "apa saja fasilitas").is_none());
    }

    #[test]
    fn test_empty_document_never_answers() {
        let doc = KnowledgeDocument::empty();
        assert!(matcher().answer(&doc, "siapa kepala sekolah").is_none());
    }
}
