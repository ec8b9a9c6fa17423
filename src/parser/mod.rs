//! Type hint parser and language utilities

mod lexer;
mod type_hint;

pub use self::{
    lexer::{Lexer, LexerError, LexerResult, Token},
    type_hint::{MAX_NESTING, TypeHintParseError, parse_type_hint},
};
