//! Doc comments of reflected symbols, and the naming context they are
//! resolved in.

mod cached;

use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    ast::TypeHint,
    parser::{TypeHintParseError, parse_type_hint},
    reflection::{ClassIndex, ClassName, Reflector},
};

pub use self::cached::{CachedDocBlockContextFactory, CachedDocBlockFactory};

/// Naming context of a source file: its namespace and its `use` imports.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Context {
    namespace: String,
    namespace_aliases: IndexMap<ArcStr, ClassName>,
}

impl Context {
    /// Creates a new [`Context`] of the given `namespace` and `use` imports.
    pub fn new(
        namespace: impl Into<String>,
        namespace_aliases: impl IntoIterator<Item = (ArcStr, ClassName)>,
    ) -> Self {
        Self {
            namespace: namespace.into().trim_matches('\\').to_owned(),
            namespace_aliases: namespace_aliases.into_iter().collect(),
        }
    }

    /// Returns the namespace of this context, empty for the global one.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the `use` imports of this context, by alias.
    pub fn namespace_aliases(&self) -> &IndexMap<ArcStr, ClassName> {
        &self.namespace_aliases
    }

    /// Resolves a class name as written in a doc comment into a fully
    /// qualified one.
    ///
    /// A leading `\` marks an already fully qualified name. Otherwise, the
    /// first segment is looked up in the `use` imports, falling back to the
    /// namespace of this context.
    pub fn resolve_class_name(&self, name: &str) -> ClassName {
        if name.starts_with('\\') {
            return ClassName::new(name);
        }
        let (head, tail) = match name.split_once('\\') {
            Some((head, tail)) => (head, Some(tail)),
            None => (name, None),
        };
        if let Some(aliased) = self.namespace_aliases.get(head) {
            return match tail {
                Some(tail) => ClassName::new(format!("{aliased}\\{tail}")),
                None => aliased.clone(),
            };
        }
        if self.namespace.is_empty() {
            ClassName::new(name)
        } else {
            ClassName::new(format!("{}\\{name}", self.namespace))
        }
    }
}

/// A single `@tag` of a doc block.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tag {
    /// Name of the tag, without the `@`.
    pub name: ArcStr,
    /// Everything following the tag name, with continuation lines joined.
    pub body: String,
}

/// A parsed doc comment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DocBlock {
    summary: String,
    description: String,
    tags: Vec<Tag>,
    context: Arc<Context>,
}

impl DocBlock {
    /// Parses the given doc comment, delimiters included or not.
    ///
    /// Parsing is lenient: anything that is not a tag is prose.
    pub fn parse(comment: &str) -> Self {
        let comment = comment.trim();
        let comment = comment.strip_prefix("/**").unwrap_or(comment);
        let comment = comment.strip_suffix("*/").unwrap_or(comment);

        let mut prose: Vec<&str> = vec![];
        let mut tags: Vec<Tag> = vec![];
        for line in comment.lines() {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line).trim();
            if let Some(tag) = line.strip_prefix('@') {
                let (name, body) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
                tags.push(Tag {
                    name: name.into(),
                    body: body.trim().to_owned(),
                });
            } else if let Some(tag) = tags.last_mut() {
                if !line.is_empty() {
                    if !tag.body.is_empty() {
                        tag.body.push(' ');
                    }
                    tag.body.push_str(line);
                }
            } else {
                prose.push(line);
            }
        }

        let prose = prose.join("\n");
        let prose = prose.trim();
        let (summary, description) = prose.split_once("\n\n").unwrap_or((prose, ""));
        Self {
            summary: summary.split_whitespace().collect::<Vec<_>>().join(" "),
            description: description.trim().to_owned(),
            tags,
            context: Arc::default(),
        }
    }

    /// Attaches the naming `context` the types of this doc block are
    /// resolved in.
    #[must_use]
    pub fn with_context(mut self, context: Arc<Context>) -> Self {
        self.context = context;
        self
    }

    /// Returns the first paragraph of the doc comment.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the prose following the summary.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns all the tags, in declaration order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the naming context of this doc block.
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Returns the tags of the given name.
    pub fn tags_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Tag> + 's {
        self.tags.iter().filter(move |t| t.name == name)
    }

    /// Returns the type declared by the `@return` tag, if any.
    pub fn return_type(&self) -> Option<&str> {
        self.tags_named("return").find_map(|t| t.body.split_whitespace().next())
    }

    /// Returns the type declared by the `@var` tag, if any.
    pub fn var_type(&self) -> Option<&str> {
        self.tags_named("var").find_map(|t| t.body.split_whitespace().next())
    }

    /// Returns the type declared for the `$parameter` by a `@param` tag, if
    /// any.
    pub fn param_type(&self, parameter: &str) -> Option<&str> {
        self.tags_named("param").find_map(|t| {
            let mut words = t.body.split_whitespace();
            let ty = words.next()?;
            (words.next()?.strip_prefix('$')? == parameter).then_some(ty)
        })
    }

    /// Parses the `@return` type into a [`TypeHint`], in the context of this
    /// doc block.
    pub fn return_type_hint(&self) -> Option<Result<TypeHint, TypeHintParseError>> {
        self.return_type().map(|ty| parse_type_hint(ty, &self.context))
    }

    /// Parses the type of the `$parameter` into a [`TypeHint`], in the
    /// context of this doc block.
    pub fn param_type_hint(&self, parameter: &str) -> Option<Result<TypeHint, TypeHintParseError>> {
        self.param_type(parameter)
            .map(|ty| parse_type_hint(ty, &self.context))
    }
}

/// Creates the naming [`Context`] of reflected symbols.
pub trait DocBlockContextFactory: Send + Sync {
    /// Creates the [`Context`] the given symbol is declared in.
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<Context>;
}

/// Creates the [`DocBlock`] of reflected symbols.
pub trait DocBlockFactory: Send + Sync {
    /// Creates the [`DocBlock`] of the given symbol.
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<DocBlock>;
}

/// [`DocBlockContextFactory`] reading namespaces and `use` imports out of a
/// [`ClassIndex`].
#[derive(Debug)]
pub struct ReflectionDocBlockContextFactory {
    classes: Arc<ClassIndex>,
}

impl ReflectionDocBlockContextFactory {
    /// Creates a new factory reflecting over the given `classes`.
    pub fn new(classes: Arc<ClassIndex>) -> Self {
        Self { classes }
    }
}

impl DocBlockContextFactory for ReflectionDocBlockContextFactory {
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<Context> {
        let class = reflector.declaring_class();
        let namespace = class.namespace().unwrap_or_default();
        let aliases = match self.classes.reflect(class) {
            Ok(info) => info.uses.clone(),
            Err(e) => {
                tracing::debug!(%e, "no imports known, resolving in the class namespace only");
                IndexMap::new()
            }
        };
        Arc::new(Context::new(namespace, aliases))
    }
}

/// [`DocBlockFactory`] parsing the doc comments stored in a [`ClassIndex`].
pub struct ReflectionDocBlockFactory {
    classes: Arc<ClassIndex>,
    context_factory: Arc<dyn DocBlockContextFactory>,
}

impl ReflectionDocBlockFactory {
    /// Creates a new factory reflecting over the given `classes`, resolving
    /// names with contexts created by `context_factory`.
    pub fn new(classes: Arc<ClassIndex>, context_factory: Arc<dyn DocBlockContextFactory>) -> Self {
        Self {
            classes,
            context_factory,
        }
    }
}

impl DocBlockFactory for ReflectionDocBlockFactory {
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<DocBlock> {
        let doc_block = match self.classes.doc_comment(reflector) {
            Ok(Some(comment)) => DocBlock::parse(comment),
            Ok(None) => DocBlock::default(),
            Err(e) => {
                tracing::debug!(%e, "no doc comment known, using an empty doc block");
                DocBlock::default()
            }
        };
        Arc::new(doc_block.with_context(self.context_factory.create_from_reflector(reflector)))
    }
}
