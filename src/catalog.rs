//! Static menu data: supported languages, cuisines, and localized replies
//!
//! Menus are handed to the transport as ordered `(label, id)` pairs. Selection
//! ids are `lang:<code>` and `cuisine:<id>`.

use crate::reply::{Menu, MenuOption};
use thiserror::Error;

const LANGUAGE_PREFIX: &str = "lang:";
const CUISINE_PREFIX: &str = "cuisine:";

/// Greeting shown with the language menu on `/start`
pub const WELCOME_TEXT: &str =
    "🍳 Welcome! I am Chef.AI, your world-class culinary assistant.\n\nChoose your language:";
pub const SELECT_CUISINE_FIRST: &str = "Please select a cuisine first. Use /start";
pub const CHOOSE_NEW_CUISINE: &str = "Choose new cuisine:";
pub const CHOOSE_LANGUAGE: &str = "Choose language:";
pub const TECHNICAL_ISSUE: &str = "Technical issue. Try again.";

const DEFAULT_CUISINE_PROMPT: &str = "Choose a cuisine:";
const DEFAULT_READY: &str = "Ready!";
const DEFAULT_NO_GREETING: &str = "Ask me about cooking.";
const DEFAULT_PROFANITY_REPLIES: &[&str] = &["Be professional."];

/// Replies translated for a language
#[derive(Debug)]
pub struct LocalizedStrings {
    pub cuisine_prompt: &'static str,
    /// Contains a `{cuisine}` placeholder
    pub ready: &'static str,
    pub no_greeting: &'static str,
    pub profanity_replies: &'static [&'static str],
    pub change_cuisine_hint: &'static str,
    pub change_language_hint: &'static str,
}

/// A selectable conversation language
#[derive(Debug)]
pub struct Language {
    pub code: &'static str,
    pub label: &'static str,
    /// English name used inside the system prompt
    pub name: &'static str,
    strings: Option<&'static LocalizedStrings>,
}

impl Language {
    pub fn cuisine_prompt(&self) -> &'static str {
        self.strings.map_or(DEFAULT_CUISINE_PROMPT, |s| s.cuisine_prompt)
    }

    pub fn no_greeting(&self) -> &'static str {
        self.strings.map_or(DEFAULT_NO_GREETING, |s| s.no_greeting)
    }

    pub fn profanity_replies(&self) -> &'static [&'static str] {
        self.strings
            .map_or(DEFAULT_PROFANITY_REPLIES, |s| s.profanity_replies)
    }

    /// Confirmation sent once a cuisine is chosen, followed by the
    /// topic-change hints when the language has them.
    pub fn ready_text(&self, cuisine: &Cuisine) -> String {
        match self.strings {
            Some(strings) => format!(
                "{}\n\n{}\n{}",
                strings.ready.replace("{cuisine}", cuisine.name),
                strings.change_cuisine_hint,
                strings.change_language_hint
            ),
            None => DEFAULT_READY.to_string(),
        }
    }

    pub fn selection_id(&self) -> String {
        format!("{LANGUAGE_PREFIX}{}", self.code)
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Language {}

/// A selectable cuisine
#[derive(Debug)]
pub struct Cuisine {
    pub id: &'static str,
    pub label: &'static str,
    pub name: &'static str,
}

impl Cuisine {
    pub fn selection_id(&self) -> String {
        format!("{CUISINE_PREFIX}{}", self.id)
    }
}

impl PartialEq for Cuisine {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Cuisine {}

// ============================================================================
// Localized strings
// ============================================================================

static ENGLISH: LocalizedStrings = LocalizedStrings {
    cuisine_prompt: "Perfect! Now, which cuisine shall we explore?",
    ready: "Excellent choice! I'm ready. What would you like to know about {cuisine}?",
    no_greeting: "I don't need pleasantries. Ask me anything about cooking.",
    profanity_replies: &[
        "Let's keep it professional. What culinary question do you have?",
        "I prefer civilized conversation. What recipe interests you?",
    ],
    change_cuisine_hint: "Change cuisine anytime by typing \"change cuisine\"",
    change_language_hint: "Change language with \"change language\"",
};

static TURKISH: LocalizedStrings = LocalizedStrings {
    cuisine_prompt: "Mükemmel! Şimdi hangi mutfağı keşfedelim?",
    ready: "Harika seçim! Hazırım. {cuisine} hakkında ne öğrenmek istersin?",
    no_greeting: "Lafa gerek yok. Mutfak hakkında sor bakalım.",
    profanity_replies: &[
        "Profesyonel kalalım. Hangi tarifi merak ediyorsun?",
        "Kibarca konuşalım. Ne pişirmek istersin?",
    ],
    change_cuisine_hint: "\"Mutfak değiştir\" yazarak istediğin zaman mutfak değiştirebilirsin",
    change_language_hint: "\"Dil değiştir\" ile dili değiştirebilirsin",
};

static RUSSIAN: LocalizedStrings = LocalizedStrings {
    cuisine_prompt: "Отлично! Теперь какую кухню будем изучать?",
    ready: "Превосходный выбор! Готов. Что хочешь узнать о {cuisine}?",
    no_greeting: "Без лишних слов. Спрашивай о кулинарии.",
    profanity_replies: &[
        "Держим профессионализм. Какой рецепт интересует?",
        "Давай культурно. Что готовить будем?",
    ],
    change_cuisine_hint: "Смени кухню командой \"сменить кухню\"",
    change_language_hint: "Смени язык командой \"сменить язык\"",
};

static SPANISH: LocalizedStrings = LocalizedStrings {
    cuisine_prompt: "¡Perfecto! ¿Qué cocina exploramos?",
    ready: "¡Excelente elección! Estoy listo. ¿Qué quieres saber sobre {cuisine}?",
    no_greeting: "Sin cumplidos. Pregúntame lo que quieras de cocina.",
    profanity_replies: &[
        "Mantengamos el profesionalismo. ¿Qué receta te interesa?",
        "Hablemos con educación. ¿Qué quieres cocinar?",
    ],
    change_cuisine_hint: "Cambia de cocina escribiendo \"cambiar cocina\"",
    change_language_hint: "Cambia de idioma con \"cambiar idioma\"",
};

static ITALIAN: LocalizedStrings = LocalizedStrings {
    cuisine_prompt: "Perfetto! Quale cucina esploriamo?",
    ready: "Ottima scelta! Sono pronto. Cosa vuoi sapere sulla cucina {cuisine}?",
    no_greeting: "Niente convenevoli. Chiedimi qualsiasi cosa sulla cucina.",
    profanity_replies: &[
        "Restiamo professionali. Quale ricetta ti interessa?",
        "Parliamo in modo civile. Cosa vuoi cucinare?",
    ],
    change_cuisine_hint: "Cambia cucina scrivendo \"cambiare cucina\"",
    change_language_hint: "Cambia lingua con \"cambiare lingua\"",
};

static FRENCH: LocalizedStrings = LocalizedStrings {
    cuisine_prompt: "Parfait ! Quelle cuisine allons-nous explorer ?",
    ready: "Excellent choix ! Je suis prêt. Que veux-tu savoir sur la cuisine {cuisine} ?",
    no_greeting: "Pas besoin de politesses. Pose-moi tes questions de cuisine.",
    profanity_replies: &[
        "Restons professionnels. Quelle recette t'intéresse ?",
        "Parlons poliment. Que veux-tu cuisiner ?",
    ],
    change_cuisine_hint: "Change de cuisine en écrivant \"change cuisine\"",
    change_language_hint: "Change de langue avec \"change language\"",
};

// ============================================================================
// Menus
// ============================================================================

pub static LANGUAGES: [Language; 10] = [
    Language {
        code: "en",
        label: "🇬🇧 English",
        name: "English",
        strings: Some(&ENGLISH),
    },
    Language {
        code: "tr",
        label: "🇹🇷 Türkçe",
        name: "Turkish",
        strings: Some(&TURKISH),
    },
    Language {
        code: "ru",
        label: "🇷🇺 Русский",
        name: "Russian",
        strings: Some(&RUSSIAN),
    },
    Language {
        code: "es",
        label: "🇪🇸 Español",
        name: "Spanish",
        strings: Some(&SPANISH),
    },
    Language {
        code: "it",
        label: "🇮🇹 Italiano",
        name: "Italian",
        strings: Some(&ITALIAN),
    },
    Language {
        code: "fr",
        label: "🇫🇷 Français",
        name: "French",
        strings: Some(&FRENCH),
    },
    Language {
        code: "uz",
        label: "🇺🇿 O'zbek",
        name: "Uzbek",
        strings: None,
    },
    Language {
        code: "kk",
        label: "🇰🇿 Қазақша",
        name: "Kazakh",
        strings: None,
    },
    Language {
        code: "tk",
        label: "🇹🇲 Türkmen",
        name: "Turkmen",
        strings: None,
    },
    Language {
        code: "az",
        label: "🇦🇿 Azərbaycan",
        name: "Azerbaijani",
        strings: None,
    },
];

pub static CUISINES: [Cuisine; 15] = [
    Cuisine {
        id: "turkish",
        label: "🇹🇷 Turkish",
        name: "Turkish",
    },
    Cuisine {
        id: "italian",
        label: "🇮🇹 Italian",
        name: "Italian",
    },
    Cuisine {
        id: "french",
        label: "🇫🇷 French",
        name: "French",
    },
    Cuisine {
        id: "chinese",
        label: "🇨🇳 Chinese",
        name: "Chinese",
    },
    Cuisine {
        id: "japanese",
        label: "🇯🇵 Japanese",
        name: "Japanese",
    },
    Cuisine {
        id: "indian",
        label: "🇮🇳 Indian",
        name: "Indian",
    },
    Cuisine {
        id: "mexican",
        label: "🇲🇽 Mexican",
        name: "Mexican",
    },
    Cuisine {
        id: "russian",
        label: "🇷🇺 Russian",
        name: "Russian",
    },
    Cuisine {
        id: "uzbek",
        label: "🇺🇿 Uzbek",
        name: "Uzbek",
    },
    Cuisine {
        id: "kazakh",
        label: "🇰🇿 Kazakh",
        name: "Kazakh",
    },
    Cuisine {
        id: "kyrgyz",
        label: "🇰🇬 Kyrgyz",
        name: "Kyrgyz",
    },
    Cuisine {
        id: "turkmen",
        label: "🇹🇲 Turkmen",
        name: "Turkmen",
    },
    Cuisine {
        id: "azerbaijani",
        label: "🇦🇿 Azerbaijani",
        name: "Azerbaijani",
    },
    Cuisine {
        id: "greek",
        label: "🇬🇷 Greek",
        name: "Greek",
    },
    Cuisine {
        id: "spanish",
        label: "🇪🇸 Spanish",
        name: "Spanish",
    },
];

/// Language every new session starts with
pub fn default_language() -> &'static Language {
    &LANGUAGES[0]
}

pub fn language_by_code(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

pub fn cuisine_by_id(id: &str) -> Option<&'static Cuisine> {
    CUISINES.iter().find(|c| c.id == id)
}

pub fn language_menu(prompt: impl Into<String>) -> Menu {
    Menu::new(
        prompt,
        LANGUAGES
            .iter()
            .map(|l| MenuOption::new(l.label, l.selection_id()))
            .collect(),
    )
}

pub fn cuisine_menu(prompt: impl Into<String>) -> Menu {
    Menu::new(
        prompt,
        CUISINES
            .iter()
            .map(|c| MenuOption::new(c.label, c.selection_id()))
            .collect(),
    )
}

// ============================================================================
// Selection parsing
// ============================================================================

/// A menu choice made by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Language(&'static Language),
    Cuisine(&'static Cuisine),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown selection: {0}")]
    Unknown(String),
}

/// Resolve a callback payload against the menus that can produce it
pub fn parse_selection(payload: &str) -> Result<Selection, SelectionError> {
    if let Some(code) = payload.strip_prefix(LANGUAGE_PREFIX) {
        if let Some(language) = language_by_code(code) {
            return Ok(Selection::Language(language));
        }
    } else if let Some(id) = payload.strip_prefix(CUISINE_PREFIX) {
        if let Some(cuisine) = cuisine_by_id(id) {
            return Ok(Selection::Cuisine(cuisine));
        }
    }
    Err(SelectionError::Unknown(payload.to_string()))
}
