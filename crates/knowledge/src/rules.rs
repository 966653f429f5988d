//! Keyword rules mapping trigger phrases to document paths.

/// A trigger phrase and the document path it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    /// Lowercase phrase searched for as a substring of the question
    pub trigger: String,

    /// Keys leading from the document root to the section
    pub path: Vec<String>,
}

impl KeywordRule {
    pub fn new(trigger: impl Into<String>, path: &[&str]) -> Self {
        Self {
            trigger: trigger.into().to_lowercase(),
            path: path.iter().map(|key| key.to_string()).collect(),
        }
    }
}

/// The built-in rule list.
///
/// Only the first resolved rule is used, so this order is a priority list:
/// profile fields first, then majors, then facilities. Within a group the
/// broader trigger comes before narrower ones it could shadow (e.g. `jurusan`
/// wins over `rpl` for "jurusan rpl"). Reordering changes which section a
/// question retrieves.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        // Profile
        KeywordRule::new("nama", &["profile", "nama"]),
        KeywordRule::new("alamat", &["profile", "alamat"]),
        KeywordRule::new("kepala sekolah", &["profile", "kepala_sekolah"]),
        KeywordRule::new("kepsek", &["profile", "kepala_sekolah"]),
        KeywordRule::new("siswa", &["profile", "jumlah_siswa"]),
        KeywordRule::new("guru", &["profile", "jumlah_guru"]),
        KeywordRule::new("akreditasi", &["profile", "akreditasi"]),
        KeywordRule::new("visi", &["profile", "visi"]),
        KeywordRule::new("misi", &["profile", "misi"]),
        // Majors
        KeywordRule::new("jurusan", &["jurusan"]),
        KeywordRule::new("tkj", &["jurusan", "TKJ"]),
        KeywordRule::new("rekayasa perangkat lunak", &["jurusan", "RPL"]),
        KeywordRule::new("rpl", &["jurusan", "RPL"]),
        KeywordRule::new("multimedia", &["jurusan", "MM"]),
        KeywordRule::new("mm", &["jurusan", "MM"]),
        KeywordRule::new("teknik komputer", &["jurusan", "TKJ"]),
        // Facilities
        KeywordRule::new("fasilitas", &["fasilitas"]),
        KeywordRule::new("lab", &["fasilitas"]),
        KeywordRule::new("laboratorium", &["fasilitas"]),
        KeywordRule::new("perpustakaan", &["fasilitas"]),
        KeywordRule::new("masjid", &["fasilitas"]),
        KeywordRule::new("wifi", &["fasilitas"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_are_lowercased() {
        let rule = KeywordRule::new("TKJ", &["jurusan", "TKJ"]);
        assert_eq!(rule.trigger, "tkj");
        // Path keys keep their case
        assert_eq!(rule.path, vec!["jurusan".to_string(), "TKJ".to_string()]);
    }

    #[test]
    fn test_default_rule_order_is_stable() {
        let rules = default_rules();
        assert_eq!(rules.first().map(|r| r.trigger.as_str()), Some("nama"));
        assert_eq!(rules.last().map(|r| r.trigger.as_str()), Some("wifi"));

        let position = |trigger: &str| rules.iter().position(|r| r.trigger == trigger);
        assert!(position("visi") < position("jurusan"));
        assert!(position("jurusan") < position("rpl"));
        assert!(position("rpl") < position("fasilitas"));
    }
}
