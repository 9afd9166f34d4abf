//! Pluralization of resource names into collection path segments

/// Irregular plurals checked before the suffix rules
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("datum", "data"),
    ("index", "indices"),
];

/// Nouns whose plural is the singular
const UNCOUNTABLE: &[&str] = &["series", "species", "news", "metadata", "equipment", "feedback"];

/// Converts singular resource names into plural collection names
pub struct Pluralizer;

impl Pluralizer {
    /// Convert a singular English noun to its plural form
    ///
    /// # Examples
    ///
    /// ```
    /// use tenancy::core::pluralize::Pluralizer;
    ///
    /// assert_eq!(Pluralizer::pluralize("article"), "articles");
    /// assert_eq!(Pluralizer::pluralize("category"), "categories");
    /// assert_eq!(Pluralizer::pluralize("address"), "addresses");
    /// assert_eq!(Pluralizer::pluralize("person"), "people");
    /// ```
    pub fn pluralize(singular: &str) -> String {
        if singular.is_empty() || UNCOUNTABLE.contains(&singular) {
            return singular.to_string();
        }
        if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == singular) {
            return plural.to_string();
        }

        let before_last = singular.chars().rev().nth(1);
        let after_vowel = matches!(before_last, Some('a' | 'e' | 'i' | 'o' | 'u'));

        match singular {
            s if s.ends_with('y') && s.len() > 1 && !after_vowel => {
                format!("{}ies", &s[..s.len() - 1])
            }
            s if ["s", "sh", "ch", "x", "z"].iter().any(|end| s.ends_with(end)) => {
                format!("{}es", s)
            }
            s if s.ends_with("fe") && s.len() > 2 => format!("{}ves", &s[..s.len() - 2]),
            s if s.ends_with('f') && !s.ends_with("ff") && s.len() > 1 => {
                format!("{}ves", &s[..s.len() - 1])
            }
            s if s.ends_with('o') && s.len() > 1 && !after_vowel => match s {
                "photo" | "piano" | "halo" | "memo" | "logo" | "video" => format!("{}s", s),
                _ => format!("{}es", s),
            },
            s => format!("{}s", s),
        }
    }

    /// The collection path segment for a resource name
    ///
    /// Only the last word of a snake_case name is pluralized and words are
    /// joined with hyphens: `line_item` becomes `line-items`.
    pub fn path_segment(name: &str) -> String {
        let name = name.to_lowercase();
        match name.rsplit_once('_') {
            Some((head, last)) => format!("{}-{}", head.replace('_', "-"), Self::pluralize(last)),
            None => Self::pluralize(&name),
        }
    }
}
