// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source matching and parsing, composed into handler families.
//!
//! A [`SourceParser`] decides whether a handler accepts a source and turns an
//! accepted source into a [`MessageContext`]. Type-based matching is the
//! usual convention: [`TypeMatched`] accepts a declared dotted type path,
//! either with its subtypes or exactly.

use herald_core::{HandlerDescriptor, HeraldError, MessageContext, Source, TypePath};

/// Field required by type-matching parsers.
pub const TYPE_FIELD: &str = "type";

/// Match and parse half of a handler.
pub trait SourceParser: Send + Sync + 'static {
    /// Adds this parser's required and defined fields to the descriptor.
    fn describe(&self, descriptor: HandlerDescriptor) -> HandlerDescriptor {
        descriptor
    }

    fn matches(&self, source: &Source) -> bool;

    /// Extracts recipients, context, and language. Must not perform I/O.
    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError>;
}

/// How a declared type path is compared with a source's type path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The declared path or anything nested beneath it.
    Subtype,
    /// Only the identical path.
    Exact,
}

/// Parser that accepts sources by type path and parses them with a closure.
pub struct TypeMatched<F> {
    type_path: Option<TypePath>,
    mode: MatchMode,
    parse: F,
}

impl<F> TypeMatched<F>
where
    F: Fn(&Source) -> Result<MessageContext, HeraldError> + Send + Sync + 'static,
{
    /// Accepts `type_path` and every type nested beneath it.
    pub fn subtype(type_path: impl Into<TypePath>, parse: F) -> Self {
        Self {
            type_path: Some(type_path.into()),
            mode: MatchMode::Subtype,
            parse,
        }
    }

    /// Accepts only `type_path` itself.
    pub fn exact(type_path: impl Into<TypePath>, parse: F) -> Self {
        Self {
            type_path: Some(type_path.into()),
            mode: MatchMode::Exact,
            parse,
        }
    }

    /// A parser with no declared type. Registration rejects it.
    pub fn untyped(mode: MatchMode, parse: F) -> Self {
        Self {
            type_path: None,
            mode,
            parse,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

impl<F> SourceParser for TypeMatched<F>
where
    F: Fn(&Source) -> Result<MessageContext, HeraldError> + Send + Sync + 'static,
{
    fn describe(&self, descriptor: HandlerDescriptor) -> HandlerDescriptor {
        descriptor
            .require(&[TYPE_FIELD])
            .define(TYPE_FIELD, self.type_path.as_ref().map(TypePath::as_str))
    }

    fn matches(&self, source: &Source) -> bool {
        let (Some(declared), Some(actual)) = (&self.type_path, source.type_path()) else {
            return false;
        };
        match self.mode {
            MatchMode::Subtype => actual.is_within(declared),
            MatchMode::Exact => actual == *declared,
        }
    }

    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError> {
        (self.parse)(source)
    }
}

/// Parser that accepts every source, including [`herald_core::SourceObject::Nothing`].
pub struct AnySource<F> {
    parse: F,
}

impl<F> AnySource<F>
where
    F: Fn(&Source) -> Result<MessageContext, HeraldError> + Send + Sync + 'static,
{
    pub fn new(parse: F) -> Self {
        Self { parse }
    }
}

impl<F> SourceParser for AnySource<F>
where
    F: Fn(&Source) -> Result<MessageContext, HeraldError> + Send + Sync + 'static,
{
    fn matches(&self, _source: &Source) -> bool {
        true
    }

    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError> {
        (self.parse)(source)
    }
}
