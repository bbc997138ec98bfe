//! Simple Syntax tokenizer.
//!
//! Splits a syntax string into a token tree: leaves, combinators and
//! parenthesized groups. Quoted spans, bracket spans and function argument
//! lists are opaque to the splitter.

mod token;
mod tokenizer;

pub use token::Token;
pub use tokenizer::{LeafHook, Tokenizer};
