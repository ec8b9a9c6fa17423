use std::{iter::Peekable, str::CharIndices};

use derive_more::with_trait::{Display, Error};

#[doc(hidden)]
#[derive(Debug)]
pub struct Lexer<'a> {
    iterator: Peekable<CharIndices<'a>>,
    source: &'a str,
    has_reached_eof: bool,
}

/// A single token of a type hint
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Token<'a> {
    Name(&'a str),
    #[display("|")]
    Pipe,
    #[display("?")]
    QuestionMark,
    #[display("[")]
    BracketOpen,
    #[display("]")]
    BracketClose,
    #[display("(")]
    ParenOpen,
    #[display(")")]
    ParenClose,
    #[display("<")]
    AngleOpen,
    #[display(">")]
    AngleClose,
    #[display(",")]
    Comma,
    #[display("End of type hint")]
    EndOfFile,
}

/// Error when tokenizing a type hint
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum LexerError {
    /// A character that cannot occur in a type hint was found
    #[display("Unknown character \"{_0}\"")]
    UnknownCharacter(#[error(not(source))] char),
}

/// A token, or an error, along with the byte offset it starts at.
pub type LexerResult<'a> = Result<(usize, Token<'a>), (usize, LexerError)>;

impl<'a> Lexer<'a> {
    #[doc(hidden)]
    pub fn new(source: &'a str) -> Self {
        Self {
            iterator: source.char_indices().peekable(),
            source,
            has_reached_eof: false,
        }
    }

    fn scan_over_whitespace(&mut self) {
        while self.iterator.next_if(|&(_, ch)| ch.is_whitespace()).is_some() {}
    }

    fn emit_single_char(&mut self, idx: usize, t: Token<'a>) -> LexerResult<'a> {
        self.iterator.next();
        Ok((idx, t))
    }

    fn scan_name(&mut self, start_idx: usize) -> LexerResult<'a> {
        let mut end_idx = start_idx;
        while let Some((idx, ch)) = self.iterator.next_if(|&(_, ch)| is_name_cont(ch)) {
            end_idx = idx + ch.len_utf8();
        }
        Ok((start_idx, Token::Name(&self.source[start_idx..end_idx])))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexerResult<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_reached_eof {
            return None;
        }

        self.scan_over_whitespace();

        let Some(&(idx, ch)) = self.iterator.peek() else {
            self.has_reached_eof = true;
            return Some(Ok((self.source.len(), Token::EndOfFile)));
        };

        Some(match ch {
            '|' => self.emit_single_char(idx, Token::Pipe),
            '?' => self.emit_single_char(idx, Token::QuestionMark),
            '[' => self.emit_single_char(idx, Token::BracketOpen),
            ']' => self.emit_single_char(idx, Token::BracketClose),
            '(' => self.emit_single_char(idx, Token::ParenOpen),
            ')' => self.emit_single_char(idx, Token::ParenClose),
            '<' => self.emit_single_char(idx, Token::AngleOpen),
            '>' => self.emit_single_char(idx, Token::AngleClose),
            ',' => self.emit_single_char(idx, Token::Comma),
            ch if is_name_start(ch) => self.scan_name(idx),
            ch => {
                self.has_reached_eof = true;
                Err((idx, LexerError::UnknownCharacter(ch)))
            }
        })
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c == '\\' || c.is_ascii_alphabetic()
}

fn is_name_cont(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::{Lexer, LexerError, Token};

    fn tokenize(s: &str) -> Vec<Token<'_>> {
        Lexer::new(s)
            .map(|t| t.unwrap_or_else(|e| panic!("Error in input stream: {e:#?} for {s:#?}")).1)
            .collect()
    }

    #[test]
    fn tokenizes_compound_hints() {
        assert_eq!(
            tokenize(" ?\\App\\User[] | array<int, Foo_2>"),
            vec![
                Token::QuestionMark,
                Token::Name("\\App\\User"),
                Token::BracketOpen,
                Token::BracketClose,
                Token::Pipe,
                Token::Name("array"),
                Token::AngleOpen,
                Token::Name("int"),
                Token::Comma,
                Token::Name("Foo_2"),
                Token::AngleClose,
                Token::EndOfFile,
            ],
        );
    }

    #[test]
    fn reports_unknown_characters() {
        let mut lexer = Lexer::new("User{");

        assert_eq!(lexer.next(), Some(Ok((0, Token::Name("User")))));
        assert_eq!(lexer.next(), Some(Err((4, LexerError::UnknownCharacter('{')))));
        assert_eq!(lexer.next(), None);
    }
}
