//! Token and keyword definitions.
//!
//! The tokenizer produces *group* tokens rather than character-level ones:
//! a parenthesis group keeps its entire body as raw text (the parser splits
//! it on top-level commas later), a quote group is already unwrapped and
//! unescaped, and a symbol group is a maximal run of symbol characters.

use phf::phf_map;

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare identifier or unquoted literal.
    Value(String),
    /// Body between matching `(` and `)`, outer parentheses stripped.
    ParenGroup(String),
    /// Body between matching quotes, outer quotes stripped, escapes applied.
    QuoteGroup(String),
    /// Maximal run of symbol characters, e.g. `=`, `!=`, `*`, `;`.
    SymbolGroup(String),
}

impl Token {
    /// The token's textual payload.
    pub fn text(&self) -> &str {
        match self {
            Token::Value(s) | Token::ParenGroup(s) | Token::QuoteGroup(s) | Token::SymbolGroup(s) => {
                s
            }
        }
    }

    /// The keyword this token spells, if it is a bare value naming one.
    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            Token::Value(s) => KEYWORDS.get(s.to_ascii_uppercase().as_str()).copied(),
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }
}

/// The closed keyword set. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    As,
    Table,
    Create,
    Insert,
    Into,
    Values,
    Delete,
    Update,
    Set,
    Where,
    Join,
    On,
    Inner,
    Left,
    Right,
    Outer,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "SELECT" => Keyword::Select,
    "FROM" => Keyword::From,
    "AS" => Keyword::As,
    "TABLE" => Keyword::Table,
    "CREATE" => Keyword::Create,
    "INSERT" => Keyword::Insert,
    "INTO" => Keyword::Into,
    "VALUES" => Keyword::Values,
    "DELETE" => Keyword::Delete,
    "UPDATE" => Keyword::Update,
    "SET" => Keyword::Set,
    "WHERE" => Keyword::Where,
    "JOIN" => Keyword::Join,
    "ON" => Keyword::On,
    "INNER" => Keyword::Inner,
    "LEFT" => Keyword::Left,
    "RIGHT" => Keyword::Right,
    "OUTER" => Keyword::Outer,
};

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::As => "AS",
            Keyword::Table => "TABLE",
            Keyword::Create => "CREATE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Delete => "DELETE",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Where => "WHERE",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Outer => "OUTER",
        }
    }
}

/// Characters that open (and extend) a symbol group.
pub fn is_symbol_char(c: char) -> bool {
    matches!(c, ';' | '*' | ',' | '(' | ')' | '=' | '<' | '>' | '!')
}

pub fn is_quote_char(c: char) -> bool {
    c == '\'' || c == '"'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_ignores_case() {
        assert_eq!(
            Token::Value("select".to_string()).keyword(),
            Some(Keyword::Select)
        );
        assert_eq!(
            Token::Value("SeLeCt".to_string()).keyword(),
            Some(Keyword::Select)
        );
        assert_eq!(Token::Value("users".to_string()).keyword(), None);
    }

    #[test]
    fn quote_groups_never_spell_keywords() {
        assert_eq!(Token::QuoteGroup("select".to_string()).keyword(), None);
    }

    #[test]
    fn symbol_chars_cover_the_operator_alphabet() {
        for c in [';', '*', ',', '(', ')', '=', '<', '>', '!'] {
            assert!(is_symbol_char(c));
        }
        assert!(!is_symbol_char('a'));
        assert!(!is_symbol_char('.'));
    }
}
