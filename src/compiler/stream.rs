//! Lookahead buffer between the lexer and the parser.
use std::io::BufRead;

use super::code::Listing;
use super::error::{CompileResult, SyntaxError};
use super::lexer::{Lexer, Token, TokenKind};

/// Every token lexed so far, in order, plus a cursor on the current one.
/// Tokens are lexed lazily and never twice.
pub struct TokenStream<R> {
    lexer: Lexer<R>,
    tokens: Vec<Token>,
    /// `None` until the first `advance`.
    cursor: Option<usize>,
}

impl<R: BufRead> TokenStream<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        TokenStream { lexer, tokens: Vec::with_capacity(64), cursor: None }
    }

    /// Moves the cursor one token forward, lexing only if the buffer does
    /// not already hold the next token.
    pub fn advance(&mut self, out: &mut Listing) -> std::io::Result<()> {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.fill(next, out)?;
        self.cursor = Some(next);
        Ok(())
    }

    /// The current token.
    ///
    /// # Panics
    /// If called before the first `advance`.
    pub fn current(&self) -> &Token {
        match self.cursor {
            Some(c) => &self.tokens[c],
            None => panic!("token stream read before the first advance"),
        }
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Returns the current token and advances if it is of the `expected`
    /// kind; fails with a syntax error otherwise.
    pub fn consume(&mut self, expected: TokenKind, out: &mut Listing) -> CompileResult<Token> {
        let tok = self.current().clone();
        if tok.kind != expected {
            return Err(SyntaxError::at(&tok, expected.to_string()).into());
        }
        self.advance(out)?;
        Ok(tok)
    }

    /// `peek(0)` is the most recently consumed token, `peek(1)` the current
    /// one, `peek(2)` the one after it, and so on. The cursor does not move.
    pub fn peek(&mut self, i: usize, out: &mut Listing) -> std::io::Result<Option<&Token>> {
        let cursor = match self.cursor {
            Some(c) => c,
            None => return Ok(None),
        };
        if i == 0 {
            return Ok(match cursor.checked_sub(1) {
                Some(prev) => Some(&self.tokens[prev]),
                None => None,
            });
        }
        let index = cursor + i - 1;
        self.fill(index, out)?;
        Ok(Some(&self.tokens[index]))
    }

    /// Lexes until the buffer holds `index`.
    fn fill(&mut self, index: usize, out: &mut Listing) -> std::io::Result<()> {
        while self.tokens.len() <= index {
            let tok = self.lexer.next_token(out)?;
            self.tokens.push(tok);
        }
        Ok(())
    }
}
