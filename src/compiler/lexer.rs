//! This lexer tokenizes R1.
//!
//! Tokens are produced one at a time, on demand. Source lines are pulled
//! from the reader only when the current one is exhausted, and each line is
//! echoed into the listing as a comment the moment it is read, so the
//! echoed source ends up interleaved with the code generated for it.
use std::fmt;
use std::io::BufRead;

use super::code::Listing;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    End        = 0,
    Println    = 1,
    Unsigned   = 2,
    Id         = 3,
    Assign     = 4,
    Semicolon  = 5,
    LeftParen  = 6,
    RightParen = 7,
    Plus       = 8,
    Minus      = 9,
    Times      = 10,
    Error      = 11,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind::*;
        let image = match self {
            End        => "<END>",
            Println    => "\"println\"",
            Unsigned   => "<UNSIGNED>",
            Id         => "<ID>",
            Assign     => "\"=\"",
            Semicolon  => "\";\"",
            LeftParen  => "\"(\"",
            RightParen => "\")\"",
            Plus       => "\"+\"",
            Minus      => "\"-\"",
            Times      => "\"*\"",
            Error      => "<ERROR>",
        };
        write!(f, "{}", image)
    }
}

/// A classified lexeme. Lines and columns are 1-based; the end position is
/// that of the last character consumed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub image: String,
    pub begin_line: usize,
    pub begin_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

pub struct Lexer<R> {
    reader: R,
    line: Vec<char>,
    /// `None` once the source is exhausted.
    current: Option<char>,
    line_number: usize,
    column: usize,
    trace: bool,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Lexer {
            reader,
            line: Vec::new(),
            // Forces the first line to be read.
            current: Some('\n'),
            line_number: 0,
            column: 0,
            trace: false,
        }
    }

    /// Echo a record of every token into the listing as a comment.
    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Consumes characters up to the end of the next token and returns it.
    /// Once the source is exhausted every call returns an `End` token.
    pub fn next_token(&mut self, out: &mut Listing) -> std::io::Result<Token> {
        while let Some(c) = self.current {
            if !is_space(c) {
                break;
            }
            self.next_char(out)?;
        }

        let begin_line = self.line_number;
        let begin_column = self.column;

        let (kind, image, end_line, end_column) = match self.current {
            None => (TokenKind::End, TokenKind::End.to_string(), begin_line, begin_column),
            Some(c) if c.is_ascii_digit() => {
                let (image, end_line, end_column) = self.run_of(out, |c| c.is_ascii_digit())?;
                (TokenKind::Unsigned, image, end_line, end_column)
            },
            Some(c) if c.is_ascii_alphabetic() => {
                let (image, end_line, end_column) = self.run_of(out, |c| c.is_ascii_alphanumeric())?;
                let kind = if image == "println" { TokenKind::Println } else { TokenKind::Id };
                (kind, image, end_line, end_column)
            },
            Some(c) => {
                let kind = match c {
                    '=' => TokenKind::Assign,
                    ';' => TokenKind::Semicolon,
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Times,
                    _   => TokenKind::Error,
                };
                let end = (self.line_number, self.column);
                self.next_char(out)?;
                (kind, c.to_string(), end.0, end.1)
            },
        };

        let token = Token { kind, image, begin_line, begin_column, end_line, end_column };

        if self.trace {
            out.comment(format!("kd={:3} bL={:3} bC={:3} eL={:3} eC={:3}     im={}",
                token.kind as u8, token.begin_line, token.begin_column,
                token.end_line, token.end_column, token.image));
        }
        debug!("token {:?} `{}` at {}:{}", token.kind, token.image, token.begin_line, token.begin_column);

        Ok(token)
    }

    /// Collects the maximal run of characters matching `pred`, starting with
    /// the current one. Returns the run and the position of its last character.
    fn run_of<F>(&mut self, out: &mut Listing, pred: F) -> std::io::Result<(String, usize, usize)>
    where F: Fn(char) -> bool
    {
        let mut sb = String::new();
        let mut end = (self.line_number, self.column);
        while let Some(c) = self.current {
            if !pred(c) {
                break;
            }
            sb.push(c);
            end = (self.line_number, self.column);
            self.next_char(out)?;
        }
        Ok((sb, end.0, end.1))
    }

    fn next_char(&mut self, out: &mut Listing) -> std::io::Result<()> {
        match self.current {
            None => return Ok(()),
            Some('\n') => {
                let mut bytes = Vec::new();
                if self.reader.read_until(b'\n', &mut bytes)? == 0 {
                    self.current = None;
                    return Ok(());
                }
                // Undecodable bytes become U+FFFD and lex as `Error` tokens.
                let buf = String::from_utf8_lossy(&bytes);
                out.comment(buf.trim_end_matches(&['\n', '\r'][..]));
                self.line = buf.chars().collect();
                self.line_number += 1;
                self.column = 0;
            },
            Some(_) => {},
        }

        // A last line without a newline runs straight into the end of input.
        self.current = self.line.get(self.column).copied();
        self.column += 1;
        Ok(())
    }
}

/// Space, tab, newline, carriage return, form feed and vertical tab.
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0B'
}
