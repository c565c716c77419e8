//! Template Compilation
//!
//! Components may declare a template instead of a render function. The
//! renderer then asks the registered [`TemplateCompiler`] for a render
//! function, once per component definition.
//!
//! # Architecture
//!
//! 1. `parse` turns the template source into a small [`TemplateNode`] tree
//! 2. `codegen` turns the tree into a [`RenderFn`] that rebuilds the
//!    described nodes from the render context on every call
//!
//! [`BasicCompiler`] understands a deliberately small dialect:
//!
//! ```text
//! <div class="card" :title="user.name" @click="select">
//!   Hello {{ user.name }}!
//!   <br/>
//! </div>
//! ```
//!
//! Plain attributes are literal strings, `:attr` binds a context path,
//! `@event` binds a handler from the context to `onEvent`, and `{{ path }}`
//! interpolates a context path as text.

mod codegen;
mod parse;

pub use parse::{Attribute, TemplateNode};

use thiserror::Error;
use tracing::debug;

use crate::component::RenderFn;

/// Errors raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("template is empty")]
    EmptyTemplate,

    #[error("unexpected end of template at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("element <{tag}> opened at offset {offset} is never closed")]
    UnclosedTag { tag: String, offset: usize },

    #[error("expected </{expected}> but found </{found}> at offset {offset}")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("interpolation at offset {offset} is not terminated with `}}}}`")]
    UnterminatedInterpolation { offset: usize },

    #[error("invalid attribute at offset {offset}")]
    InvalidAttribute { offset: usize },
}

/// Turns template source into a render function.
pub trait TemplateCompiler {
    fn compile(&self, source: &str) -> Result<RenderFn, CompileError>;
}

/// The built-in template compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCompiler;

impl BasicCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Parse a template without generating code.
    pub fn parse(&self, source: &str) -> Result<Vec<TemplateNode>, CompileError> {
        parse::parse(source)
    }
}

impl TemplateCompiler for BasicCompiler {
    fn compile(&self, source: &str) -> Result<RenderFn, CompileError> {
        let roots = parse::parse(source)?;
        debug!(roots = roots.len(), "parsed template");
        codegen::generate(roots)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
