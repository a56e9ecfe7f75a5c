//! Core types for the sift expression engine.
//!
//! Shared vocabulary of the pipeline: source spans and line/column
//! rendering, tokens, the expression tree, the runtime value model, and the
//! calling-convention descriptors that make the capability surface
//! auditable data.

pub mod ast;
mod descriptor;
mod keywords;
mod span;
mod token;
mod value;

pub use descriptor::{DescriptorError, FunctionDescriptor, ParamSpec};
pub use keywords::{Keyword, KeywordSet};
pub use span::{LineCol, LineIndex, Span};
pub use token::{Token, TokenKind};
pub use value::{FunctionValue, HostFn, HostObject, Value};
