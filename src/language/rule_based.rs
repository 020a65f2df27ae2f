//! Rule-based English language model.
//!
//! Tokenizes with a regular expression, classifies stop words against a fixed
//! lexicon, and lemmatizes with an irregular-form table followed by suffix
//! rules. The lexicon can be replaced by loading a TOML file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{LanguageError, LanguageModel, LanguageResult, TaggedToken};

/// Word runs (with internal hyphens/apostrophes) or runs of anything else
/// that is not whitespace.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]+")
        .expect("token pattern is valid")
});

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
    "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because",
    "become", "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
    "below", "beside", "besides", "between", "beyond", "both", "bottom", "but", "by", "ca",
    "call", "can", "cannot", "could", "did", "do", "does", "doing", "done", "down", "due",
    "during", "each", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough",
    "even", "ever", "every", "everyone", "everything", "everywhere", "except", "few",
    "fifteen", "fifty", "first", "five", "for", "former", "formerly", "forty", "four",
    "from", "front", "full", "further", "get", "give", "go", "had", "has", "have", "he",
    "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself",
    "him", "himself", "his", "how", "however", "hundred", "i", "if", "in", "indeed", "into",
    "is", "it", "its", "itself", "just", "keep", "last", "latter", "latterly", "least",
    "less", "made", "make", "many", "may", "me", "meanwhile", "might", "mine", "more",
    "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely",
    "neither", "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone",
    "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one",
    "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
    "over", "own", "part", "per", "perhaps", "please", "put", "quite", "rather", "re",
    "really", "regarding", "same", "say", "see", "seem", "seemed", "seeming", "seems",
    "serious", "several", "she", "should", "show", "side", "since", "six", "sixty", "so",
    "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still",
    "such", "take", "ten", "than", "that", "the", "their", "them", "themselves", "then",
    "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon",
    "these", "they", "third", "this", "those", "though", "three", "through", "throughout",
    "thru", "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty",
    "two", "under", "unless", "until", "up", "upon", "us", "used", "using", "various",
    "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

const ENGLISH_IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("women", "woman"),
    ("men", "man"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("people", "person"),
    ("data", "datum"),
    ("criteria", "criterion"),
    ("ran", "run"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("older", "old"),
    ("elderly", "elderly"),
    ("controlled", "control"),
    ("controlling", "control"),
    ("compared", "compare"),
    ("comparing", "compare"),
    ("taping", "tape"),
    ("taped", "tape"),
    ("found", "find"),
    ("underwent", "undergo"),
    ("thighs", "thigh"),
    ("knees", "knee"),
    ("analyses", "analysis"),
    ("diagnoses", "diagnosis"),
    ("prognoses", "prognosis"),
    ("biases", "bias"),
    // same form in singular and plural
    ("diabetes", "diabetes"),
    ("series", "series"),
    ("species", "species"),
    ("bias", "bias"),
    ("herpes", "herpes"),
    ("rabies", "rabies"),
    ("scabies", "scabies"),
    ("measles", "measles"),
    ("mumps", "mumps"),
    ("news", "news"),
    ("pancreas", "pancreas"),
    ("atlas", "atlas"),
];

/// On-disk lexicon format.
///
/// ```toml
/// name = "custom-en"
/// stop_words = ["the", "of"]
///
/// [lemmas]
/// ran = "run"
/// ```
#[derive(Debug, Deserialize)]
struct LexiconFile {
    name: Option<String>,
    stop_words: Vec<String>,
    #[serde(default)]
    lemmas: HashMap<String, String>,
}

/// Rule-based annotation model for English text.
#[derive(Debug, Clone)]
pub struct RuleBasedModel {
    name: String,
    stop_words: HashSet<String>,
    irregular: HashMap<String, String>,
}

impl RuleBasedModel {
    /// Build the model from the built-in English lexicon.
    pub fn english() -> Self {
        Self {
            name: "rule-based-en".to_string(),
            stop_words: ENGLISH_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            irregular: ENGLISH_IRREGULAR_LEMMAS
                .iter()
                .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
                .collect(),
        }
    }

    /// Build a model from explicit stop words and irregular lemmas.
    pub fn with_lexicon(
        name: impl Into<String>,
        stop_words: impl IntoIterator<Item = String>,
        irregular: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
            irregular: irregular
                .into_iter()
                .map(|(form, lemma)| (form.to_lowercase(), lemma.to_lowercase()))
                .collect(),
        }
    }

    /// Load a model from a TOML lexicon file.
    ///
    /// # Errors
    /// Returns `LanguageError::ModelUnavailable` if the file cannot be read or
    /// parsed, or if it contains no stop words.
    pub fn from_lexicon_file(path: impl AsRef<Path>) -> LanguageResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LanguageError::ModelUnavailable(format!("cannot read lexicon {}: {}", path.display(), e))
        })?;
        let lexicon: LexiconFile = toml::from_str(&raw).map_err(|e| {
            LanguageError::ModelUnavailable(format!("malformed lexicon {}: {}", path.display(), e))
        })?;
        if lexicon.stop_words.is_empty() {
            return Err(LanguageError::ModelUnavailable(format!(
                "lexicon {} has no stop words",
                path.display()
            )));
        }

        let name = lexicon
            .name
            .unwrap_or_else(|| path.file_stem().map_or_else(
                || "lexicon".to_string(),
                |s| s.to_string_lossy().to_string(),
            ));
        debug!(
            "Loaded lexicon {}: {} stop words, {} lemmas",
            name,
            lexicon.stop_words.len(),
            lexicon.lemmas.len()
        );
        Ok(Self::with_lexicon(name, lexicon.stop_words, lexicon.lemmas))
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(&word.to_lowercase())
    }

    /// Canonical dictionary form of a single lowercase word.
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.irregular.get(word) {
            return lemma.clone();
        }
        if !word.chars().all(char::is_alphabetic) {
            return word.to_string();
        }
        lemmatize_regular(word)
    }
}

impl Default for RuleBasedModel {
    fn default() -> Self {
        Self::english()
    }
}

impl LanguageModel for RuleBasedModel {
    fn tokenize_and_tag(&self, text: &str) -> LanguageResult<Vec<TaggedToken>> {
        let tokens = TOKEN_RE
            .find_iter(text)
            .map(|m| {
                let surface = m.as_str().to_string();
                let is_punct = !surface.chars().any(char::is_alphanumeric);
                if is_punct {
                    return TaggedToken {
                        lemma: surface.clone(),
                        surface,
                        is_stop: false,
                        is_punct: true,
                    };
                }
                let lower = surface.to_lowercase();
                TaggedToken {
                    is_stop: self.stop_words.contains(&lower),
                    lemma: self.lemmatize(&lower),
                    surface,
                    is_punct: false,
                }
            })
            .collect();
        Ok(tokens)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| is_vowel(c) || c == 'y')
}

/// Suffix rules for plural nouns and -ing/-ed verb forms.
fn lemmatize_regular(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 || !word.is_ascii() {
        return word.to_string();
    }

    // Plurals
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if ["xes", "ches", "shes", "zes"].iter().any(|s| word.ends_with(s)) {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with('s') {
        return word[..word.len() - 1].to_string();
    }

    // Verb forms
    if len > 5 && word.ends_with("ing") {
        return restore_stem(&word[..word.len() - 3], word);
    }
    if len > 4 && word.ends_with("ed") && !word.ends_with("eed") {
        return restore_stem(&word[..word.len() - 2], word);
    }

    word.to_string()
}

/// Undo consonant doubling or restore a silent `e` on a stripped verb stem.
fn restore_stem(stem: &str, original: &str) -> String {
    if stem.len() < 3 || !has_vowel(stem) {
        return original.to_string();
    }
    let chars: Vec<char> = stem.chars().collect();
    let last = chars[chars.len() - 1];
    let prev = chars[chars.len() - 2];

    if last == prev && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z' | 'f') {
        return stem[..stem.len() - 1].to_string();
    }

    let before_at = chars.len() >= 3 && !matches!(chars[chars.len() - 3], 'a' | 'e' | 'o');
    let needs_e = stem.ends_with("iz")
        || stem.ends_with("yz")
        || stem.ends_with("ut")
        || stem.ends_with('v')
        || stem.ends_with("bl")
        || stem.ends_with("pl")
        || stem.ends_with("tl")
        || stem.ends_with("eas")
        || stem.ends_with("aus")
        || (stem.ends_with("at") && before_at);
    if needs_e {
        return format!("{}e", stem);
    }
    stem.to_string()
}
