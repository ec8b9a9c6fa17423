use std::iter::Peekable;

use derive_more::with_trait::{Display, Error};

use crate::{
    ast::{ScalarHint, TypeHint},
    parser::lexer::{Lexer, LexerError, Token},
    reflection::doc_block::Context,
};

/// Error while parsing a type hint
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum TypeHintParseError {
    /// The type hint could not be tokenized
    #[display("{source} at offset {offset}")]
    Lexer {
        /// Byte offset of the offending character.
        offset: usize,
        /// Underlying error.
        source: LexerError,
    },

    /// A token was found where it doesn't belong
    #[display("Unexpected \"{token}\" at offset {offset}")]
    UnexpectedToken {
        /// Byte offset of the token.
        offset: usize,
        /// The token itself.
        token: String,
    },

    /// `array` or `iterable` without an element type
    #[display("Untyped array at offset {_0}: its element type is unknown")]
    UntypedArray(#[error(not(source))] usize),

    /// The type hint allows `null` only
    #[display("Type hint has no other alternative than \"null\"")]
    OnlyNull,

    /// Groups, generic arguments or array suffixes are nested too deeply
    #[display("Type hint is nested too deeply at offset {_0}")]
    TooDeeplyNested(#[error(not(source))] usize),
}

/// Maximum nesting of groups, generic arguments and array suffixes in a type
/// hint.
pub const MAX_NESTING: usize = 64;

/// Parses a type hint, as written in doc comments, resolving class names in
/// the given naming `context`.
///
/// ```text
/// union := term ('|' term)*
/// term  := '?'? atom ('[' ']')*
/// atom  := '(' union ')'
///        | ('array' | 'iterable') '<' union (',' union)? '>'
///        | 'null' | scalar | name
/// ```
///
/// A `null` alternative makes the whole union nullable.
pub fn parse_type_hint(source: &str, context: &Context) -> Result<TypeHint, TypeHintParseError> {
    let mut parser = Parser {
        tokens: Lexer::new(source).peekable(),
        context,
        depth: 0,
    };
    let hint = parser.parse_union()?;
    match parser.next()? {
        (_, Token::EndOfFile) => Ok(hint),
        (offset, token) => Err(unexpected(offset, token)),
    }
}

struct Parser<'a, 'c> {
    tokens: Peekable<Lexer<'a>>,
    context: &'c Context,
    depth: usize,
}

impl<'a> Parser<'a, '_> {
    fn next(&mut self) -> Result<(usize, Token<'a>), TypeHintParseError> {
        match self.tokens.next() {
            Some(Ok(t)) => Ok(t),
            Some(Err((offset, source))) => Err(TypeHintParseError::Lexer { offset, source }),
            // The lexer always ends with an `EndOfFile` token, and nothing is
            // ever read past it.
            None => Ok((0, Token::EndOfFile)),
        }
    }

    fn peek(&mut self) -> Option<Token<'a>> {
        match self.tokens.peek() {
            Some(Ok((_, t))) => Some(*t),
            _ => None,
        }
    }

    fn skip_if(&mut self, token: Token<'_>) -> bool {
        let found = self.peek() == Some(token);
        if found {
            self.tokens.next();
        }
        found
    }

    fn expect(&mut self, expected: Token<'_>) -> Result<(), TypeHintParseError> {
        match self.next()? {
            (_, t) if t == expected => Ok(()),
            (offset, t) => Err(unexpected(offset, t)),
        }
    }

    fn parse_union(&mut self) -> Result<TypeHint, TypeHintParseError> {
        self.nest()?;
        let hint = self.parse_alternatives();
        self.depth -= 1;
        hint
    }

    /// Enters one more nesting level.
    fn nest(&mut self) -> Result<(), TypeHintParseError> {
        if self.depth == MAX_NESTING {
            let offset = match self.tokens.peek() {
                Some(Ok((offset, _)) | Err((offset, _))) => *offset,
                None => 0,
            };
            return Err(TypeHintParseError::TooDeeplyNested(offset));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_alternatives(&mut self) -> Result<TypeHint, TypeHintParseError> {
        let mut alternatives = vec![];
        let mut is_nullable = false;
        loop {
            match self.parse_term()? {
                Some(hint) => alternatives.push(hint),
                None => is_nullable = true,
            }
            if !self.skip_if(Token::Pipe) {
                break;
            }
        }

        let hint = match alternatives.len() {
            0 => return Err(TypeHintParseError::OnlyNull),
            1 => alternatives.swap_remove(0),
            _ => TypeHint::Compound(alternatives),
        };
        Ok(match hint {
            TypeHint::Nullable(_) => hint,
            hint if is_nullable => TypeHint::nullable(hint),
            hint => hint,
        })
    }

    /// Parses a single alternative, [`None`] standing for `null`.
    fn parse_term(&mut self) -> Result<Option<TypeHint>, TypeHintParseError> {
        let is_nullable = self.skip_if(Token::QuestionMark);
        let (offset, token) = self.next()?;
        let Some(mut hint) = self.parse_atom(offset, token)? else {
            // `?null` and `null[]` make no sense.
            if is_nullable || self.peek() == Some(Token::BracketOpen) {
                return Err(unexpected(offset, token));
            }
            return Ok(None);
        };
        let depth = self.depth;
        while self.skip_if(Token::BracketOpen) {
            self.nest()?;
            self.expect(Token::BracketClose)?;
            hint = TypeHint::array_of(hint);
        }
        self.depth = depth;
        Ok(Some(if is_nullable {
            TypeHint::nullable(hint)
        } else {
            hint
        }))
    }

    fn parse_atom(
        &mut self,
        offset: usize,
        token: Token<'a>,
    ) -> Result<Option<TypeHint>, TypeHintParseError> {
        let name = match token {
            Token::ParenOpen => {
                let hint = self.parse_union()?;
                self.expect(Token::ParenClose)?;
                return Ok(Some(hint));
            }
            Token::Name(name) => name,
            t => return Err(unexpected(offset, t)),
        };

        let keyword = name.to_ascii_lowercase();
        if keyword == "null" {
            return Ok(None);
        }
        if keyword == "array" || keyword == "iterable" {
            if !self.skip_if(Token::AngleOpen) {
                return Err(TypeHintParseError::UntypedArray(offset));
            }
            // `array<Key, Value>`: only the value type matters.
            let mut element = self.parse_union()?;
            if self.skip_if(Token::Comma) {
                element = self.parse_union()?;
            }
            self.expect(Token::AngleClose)?;
            return Ok(Some(TypeHint::array_of(element)));
        }
        if let Some(scalar) = ScalarHint::from_keyword(name) {
            return Ok(Some(TypeHint::Scalar(scalar)));
        }
        Ok(Some(TypeHint::Named(self.context.resolve_class_name(name))))
    }
}

fn unexpected(offset: usize, token: Token<'_>) -> TypeHintParseError {
    TypeHintParseError::UnexpectedToken {
        offset,
        token: token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{MAX_NESTING, TypeHintParseError, parse_type_hint};
    use crate::{
        ast::{ScalarHint, TypeHint},
        parser::lexer::LexerError,
        reflection::{ClassName, doc_block::Context},
    };

    fn context() -> Context {
        Context::new(
            "App\\Controller",
            [("User".into(), ClassName::new("App\\Model\\User"))],
        )
    }

    fn parse(source: &str) -> TypeHint {
        parse_type_hint(source, &context())
            .unwrap_or_else(|e| panic!("Parse error on input {source:#?}: {e}"))
    }

    #[test]
    fn parses_named_and_scalar_hints() {
        assert_eq!(parse("User"), TypeHint::named("App\\Model\\User"));
        assert_eq!(parse("\\Vendor\\Page"), TypeHint::named("Vendor\\Page"));
        assert_eq!(parse("Post"), TypeHint::named("App\\Controller\\Post"));
        assert_eq!(parse("int"), TypeHint::Scalar(ScalarHint::Int));
        assert_eq!(parse("Boolean"), TypeHint::Scalar(ScalarHint::Bool));
    }

    #[test]
    fn parses_arrays() {
        let user = TypeHint::named("App\\Model\\User");

        assert_eq!(parse("User[]"), TypeHint::array_of(user.clone()));
        assert_eq!(parse("array<User>"), TypeHint::array_of(user.clone()));
        assert_eq!(parse("iterable<int, User>"), TypeHint::array_of(user.clone()));
        assert_eq!(
            parse("User[][]"),
            TypeHint::array_of(TypeHint::array_of(user.clone())),
        );
        assert_eq!(
            parse("(User|null)[]"),
            TypeHint::array_of(TypeHint::nullable(user)),
        );
    }

    #[test]
    fn parses_unions_and_nullability() {
        let iterator = TypeHint::named("App\\Controller\\ResultIterator");
        let users = TypeHint::array_of(TypeHint::named("App\\Model\\User"));

        assert_eq!(
            parse("ResultIterator|User[]"),
            TypeHint::Compound(vec![iterator.clone(), users.clone()]),
        );
        assert_eq!(
            parse("ResultIterator | User[] | null"),
            TypeHint::nullable(TypeHint::Compound(vec![iterator.clone(), users.clone()])),
        );
        assert_eq!(parse("?User[]"), TypeHint::nullable(users.clone()));
        assert_eq!(parse("null|User[]"), TypeHint::nullable(users));
        assert_eq!(parse("?ResultIterator|null"), TypeHint::nullable(iterator));
    }

    #[test]
    fn reports_errors() {
        let ctx = context();

        assert_eq!(parse_type_hint("null", &ctx), Err(TypeHintParseError::OnlyNull));
        assert_eq!(
            parse_type_hint("array|User", &ctx),
            Err(TypeHintParseError::UntypedArray(0)),
        );
        assert_eq!(
            parse_type_hint("User[", &ctx),
            Err(TypeHintParseError::UnexpectedToken {
                offset: 5,
                token: "End of type hint".into(),
            }),
        );
        assert_eq!(
            parse_type_hint("User|", &ctx),
            Err(TypeHintParseError::UnexpectedToken {
                offset: 5,
                token: "End of type hint".into(),
            }),
        );
        assert_eq!(
            parse_type_hint("User User", &ctx),
            Err(TypeHintParseError::UnexpectedToken {
                offset: 5,
                token: "User".into(),
            }),
        );
        assert_eq!(
            parse_type_hint("User&Post", &ctx),
            Err(TypeHintParseError::Lexer {
                offset: 4,
                source: LexerError::UnknownCharacter('&'),
            }),
        );
    }

    #[test]
    fn limits_nesting() {
        let ctx = context();
        let nested = |depth: usize| format!("{}User{}", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(parse(&nested(MAX_NESTING - 1)), TypeHint::named("App\\Model\\User"));
        assert_eq!(
            parse_type_hint(&nested(MAX_NESTING), &ctx),
            Err(TypeHintParseError::TooDeeplyNested(MAX_NESTING)),
        );
        assert!(matches!(
            parse_type_hint(&nested(100_000), &ctx),
            Err(TypeHintParseError::TooDeeplyNested(_)),
        ));
        let arrays = format!("{}User{}", "array<".repeat(10_000), ">".repeat(10_000));
        assert!(matches!(
            parse_type_hint(&arrays, &ctx),
            Err(TypeHintParseError::TooDeeplyNested(_)),
        ));
        assert!(matches!(
            parse_type_hint(&format!("User{}", "[]".repeat(10_000)), &ctx),
            Err(TypeHintParseError::TooDeeplyNested(_)),
        ));
        assert_eq!(parse("(User[])[]").to_string(), "\\App\\Model\\User[][]");
    }
}
