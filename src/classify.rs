//! Lexical classifiers for inbound text
//!
//! Every check is a case-insensitive substring match against a fixed
//! lexicon. Embedded matches count ("hell" inside "hello"); that is the
//! intended, naive policy rather than a tokenizer.

const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "merhaba",
    "selam",
    "привет",
    "здравствуй",
    "hola",
    "ciao",
    "bonjour",
    "salom",
];

const CUISINE_CHANGE_TRIGGERS: &[&str] = &[
    "change cuisine",
    "mutfak değiştir",
    "сменить кухню",
    "cambiar cocina",
    "cambiare cucina",
];

const LANGUAGE_CHANGE_TRIGGERS: &[&str] = &[
    "change language",
    "dil değiştir",
    "сменить язык",
    "cambiar idioma",
    "cambiare lingua",
];

/// Largest first, so "15" is found before "1" or "5"
const SERVING_SIZES: &[&str] = &[
    "100", "50", "30", "20", "15", "12", "10", "8", "6", "5", "4", "3", "2", "1",
];

pub const DEFAULT_SERVINGS: &str = "2";

fn profanity_lexicon(lang: &str) -> &'static [&'static str] {
    match lang {
        "en" => &["fuck", "shit", "damn", "bitch", "ass", "crap", "hell"],
        "tr" => &[
            "amk", "aq", "sik", "göt", "orospu", "piç", "salak", "aptal", "mal",
        ],
        "ru" => &[
            "блять", "сука", "хуй", "пизда", "дебил", "идиот", "мудак", "говно",
        ],
        "es" => &["mierda", "puto", "idiota", "cabrón"],
        "it" => &["merda", "cazzo", "idiota"],
        "fr" => &["merde", "putain", "con"],
        _ => &[],
    }
}

fn contains_any(text: &str, lexicon: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    lexicon.iter().any(|token| lowered.contains(token))
}

pub fn is_greeting(text: &str) -> bool {
    contains_any(text, GREETINGS)
}

/// Unknown languages have an empty lexicon and never match
pub fn is_profane(text: &str, lang: &str) -> bool {
    contains_any(text, profanity_lexicon(lang))
}

pub fn wants_cuisine_change(text: &str) -> bool {
    contains_any(text, CUISINE_CHANGE_TRIGGERS)
}

pub fn wants_language_change(text: &str) -> bool {
    contains_any(text, LANGUAGE_CHANGE_TRIGGERS)
}

/// First serving-size literal found in the text, or [`DEFAULT_SERVINGS`]
pub fn detect_serving_size(text: &str) -> &'static str {
    SERVING_SIZES
        .iter()
        .copied()
        .find(|size| text.contains(size))
        .unwrap_or(DEFAULT_SERVINGS)
}
