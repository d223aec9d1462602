//! The Parser module recognizes R1 and emits code as it goes.
//!
//! There is one routine per grammar rule:
//!
//! ```text
//! program             := statement_list
//! statement_list      := statement*               (until <END>)
//! statement           := assignment_statement | println_statement
//! assignment_statement:= ID "=" expr ";"
//! println_statement   := "println" "(" expr ")" ";"
//! expr                := term ("+" term)*
//! term                := factor ("*" factor)*
//! factor              := UNSIGNED | "+" UNSIGNED | "-" UNSIGNED | ID | "(" expr ")"
//! ```
//!
//! No tree is built. Each expression routine returns the `Location` holding
//! its value, and every `+` or `*` is translated on the spot into
//! `ld`/`add|mult`/`st` through a fresh temporary.
use std::io::BufRead;

use super::code::{Instruction, Listing};
use super::error::{CompileError, CompileResult, SyntaxError};
use super::lexer::{Lexer, Token, TokenKind};
use super::stream::TokenStream;
use super::symbols::{Location, SymbolTable};

/// What a compilation leaves behind. The listing is kept even when
/// compilation stops early, since it shows how far the compiler got.
#[derive(Debug)]
pub struct Outcome {
    pub listing: Listing,
    pub symbols: SymbolTable,
    pub error: Option<CompileError>,
}

pub struct Parser<R> {
    tokens: TokenStream<R>,
    symbols: SymbolTable,
    listing: Listing,
}

impl<R: BufRead> Parser<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        Parser {
            tokens: TokenStream::new(lexer),
            symbols: SymbolTable::new(),
            listing: Listing::new(),
        }
    }

    /// Run the parser, consuming itself and returning everything emitted.
    pub fn run(mut self) -> Outcome {
        let result = self.parse();
        if let Err(ref e) = result {
            debug!("compilation stopped: {}", e);
        }
        Outcome {
            listing: self.listing,
            symbols: self.symbols,
            error: result.err(),
        }
    }

    fn parse(&mut self) -> CompileResult<()> {
        self.tokens.advance(&mut self.listing)?;
        self.program()
    }

    fn program(&mut self) -> CompileResult<()> {
        self.listing.emit(Instruction::Register);
        self.statement_list()?;
        self.end_code();
        Ok(())
    }

    fn end_code(&mut self) {
        self.listing.blank();
        self.listing.emit(Instruction::Halt);
        self.listing.blank();

        for sym in self.symbols.data_words() {
            self.listing.data_word(&sym.name, &sym.value);
        }
    }

    fn statement_list(&mut self) -> CompileResult<()> {
        loop {
            match self.kind() {
                TokenKind::Id | TokenKind::Println => self.statement()?,
                TokenKind::End => return Ok(()),
                _ => return Err(self.unexpected("statement or end of file")),
            }
        }
    }

    fn statement(&mut self) -> CompileResult<()> {
        match self.kind() {
            TokenKind::Id => self.assignment_statement(),
            TokenKind::Println => self.println_statement(),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn assignment_statement(&mut self) -> CompileResult<()> {
        let target = self.consume(TokenKind::Id)?;
        let target = self.symbols.variable(&target.image);
        self.consume(TokenKind::Assign)?;
        let value = self.expr()?;
        self.emit_ld(value);
        let label = self.label(target);
        self.listing.emit(Instruction::St(label));
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn println_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Println)?;
        self.consume(TokenKind::LeftParen)?;
        let value = self.expr()?;
        self.emit_ld(value);
        self.listing.emit(Instruction::Dout);
        self.listing.emit(Instruction::Ldc('\n'));
        self.listing.emit(Instruction::Aout);
        self.consume(TokenKind::RightParen)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn expr(&mut self) -> CompileResult<Location> {
        let left = self.term()?;
        self.term_list(left)
    }

    /// Folds `+ term` onto `left` until a `)` or `;`.
    fn term_list(&mut self, mut left: Location) -> CompileResult<Location> {
        loop {
            match self.kind() {
                TokenKind::Plus => {
                    self.consume(TokenKind::Plus)?;
                    let right = self.term()?;
                    left = self.binary(Instruction::Add, left, right);
                },
                TokenKind::RightParen | TokenKind::Semicolon => return Ok(left),
                _ => return Err(self.unexpected("\"+\", \")\", or \";\"")),
            }
        }
    }

    fn term(&mut self) -> CompileResult<Location> {
        let left = self.factor()?;
        self.factor_list(left)
    }

    /// Folds `* factor` onto `left` until a `+`, `)` or `;`.
    fn factor_list(&mut self, mut left: Location) -> CompileResult<Location> {
        loop {
            match self.kind() {
                TokenKind::Times => {
                    self.consume(TokenKind::Times)?;
                    let right = self.factor()?;
                    left = self.binary(Instruction::Mult, left, right);
                },
                TokenKind::Plus | TokenKind::RightParen | TokenKind::Semicolon => return Ok(left),
                _ => return Err(self.unexpected("op, \")\", or \";\"")),
            }
        }
    }

    fn factor(&mut self) -> CompileResult<Location> {
        match self.kind() {
            TokenKind::Unsigned => {
                let t = self.consume(TokenKind::Unsigned)?;
                Ok(self.symbols.literal(&t.image, false))
            },
            TokenKind::Plus => {
                self.consume(TokenKind::Plus)?;
                let t = self.consume(TokenKind::Unsigned)?;
                Ok(self.symbols.literal(&t.image, false))
            },
            TokenKind::Minus => {
                self.consume(TokenKind::Minus)?;
                let t = self.consume(TokenKind::Unsigned)?;
                Ok(self.symbols.literal(&t.image, true))
            },
            TokenKind::Id => {
                let t = self.consume(TokenKind::Id)?;
                Ok(self.symbols.variable(&t.image))
            },
            TokenKind::LeftParen => {
                self.consume(TokenKind::LeftParen)?;
                let inner = self.expr()?;
                self.consume(TokenKind::RightParen)?;
                Ok(inner)
            },
            _ => Err(self.unexpected("factor")),
        }
    }

    /// Emits `ld left; <op> right; st temp` and returns the temporary.
    fn binary<F>(&mut self, op: F, left: Location, right: Location) -> Location
    where F: FnOnce(String) -> Instruction
    {
        self.emit_ld(left);
        let right = self.label(right);
        self.listing.emit(op(right));
        let temp = self.symbols.fresh_temporary();
        let label = self.label(temp);
        self.listing.emit(Instruction::St(label));
        temp
    }

    fn emit_ld(&mut self, loc: Location) {
        let label = self.label(loc);
        self.listing.emit(Instruction::Ld(label));
    }

    fn label(&self, loc: Location) -> String {
        self.symbols.name(loc).to_owned()
    }

    #[inline]
    fn kind(&self) -> TokenKind {
        self.tokens.current_kind()
    }

    #[inline]
    fn consume(&mut self, expected: TokenKind) -> CompileResult<Token> {
        self.tokens.consume(expected, &mut self.listing)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        SyntaxError::at(self.tokens.current(), expected).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::code::Line;
    use regex::Regex;

    fn compile(src: &str) -> Outcome {
        Parser::new(Lexer::new(src.as_bytes())).run()
    }

    fn compile_ok(src: &str) -> Listing {
        let outcome = compile(src);
        if let Some(e) = outcome.error {
            panic!("unexpected error compiling {:?}: {}", src, e);
        }
        outcome.listing
    }

    fn syntax_error(src: &str) -> SyntaxError {
        match compile(src).error {
            Some(CompileError::Syntax(e)) => e,
            other => panic!("expected a syntax error compiling {:?}, got {:?}", src, other),
        }
    }

    /// Pulls the `label: dw value` pairs back out of the rendered text.
    fn rendered_data_words(listing: &Listing) -> Vec<(String, String)> {
        let re = Regex::new(r"^(\S+):\s+dw\s+(\S+)$").unwrap();
        listing.to_string().lines()
            .filter_map(|line| re.captures(line))
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect()
    }

    fn count(listing: &Listing, mnemonic: &str) -> usize {
        listing.instructions().filter(|i| i.mnemonic() == mnemonic).count()
    }

    fn ld(s: &str) -> Instruction { Instruction::Ld(s.to_owned()) }
    fn st(s: &str) -> Instruction { Instruction::St(s.to_owned()) }

    #[test]
    fn test_assignment() {
        let listing = compile_ok("x = 5 + 5;\n");
        assert_eq!(listing.lines(), &[
            Line::Comment("x = 5 + 5;".to_owned()),
            Line::Code(Instruction::Register),
            Line::Code(ld("@5")),
            Line::Code(Instruction::Add("@5".to_owned())),
            Line::Code(st("@t0")),
            Line::Code(ld("@t0")),
            Line::Code(st("x")),
            Line::Blank,
            Line::Code(Instruction::Halt),
            Line::Blank,
            Line::DataWord { label: "x".to_owned(), value: "0".to_owned() },
            Line::DataWord { label: "@5".to_owned(), value: "5".to_owned() },
            Line::DataWord { label: "@t0".to_owned(), value: "0".to_owned() },
        ][..]);
    }

    #[test]
    fn test_println() {
        let listing = compile_ok("println(-3);\n");
        let code: Vec<&Instruction> = listing.instructions().collect();
        assert_eq!(code, vec![
            &Instruction::Register,
            &ld("@_3"),
            &Instruction::Dout,
            &Instruction::Ldc('\n'),
            &Instruction::Aout,
            &Instruction::Halt,
        ]);
        assert_eq!(rendered_data_words(&listing), vec![("@_3".to_string(), "-3".to_string())]);
    }

    #[test]
    fn test_source_echo_interleaves_with_code() {
        let listing = compile_ok("a = 1;\nprintln(a);\n");
        let text = listing.to_string();
        let first = text.find("; a = 1;").unwrap();
        let store = text.find("st        a").unwrap();
        let second = text.find("; println(a);").unwrap();
        let dout = text.find("dout").unwrap();
        assert!(first < store && store < second && second < dout);
    }

    #[test]
    fn test_literal_dedup() {
        let same = compile_ok("x = 5 + 5;");
        let literals: Vec<_> = rendered_data_words(&same).into_iter()
            .filter(|(label, _)| label == "@5").collect();
        assert_eq!(literals.len(), 1);

        let different = compile_ok("x = 5 + 6;");
        let labels: Vec<String> = rendered_data_words(&different).into_iter().map(|(l, _)| l).collect();
        assert!(labels.contains(&"@5".to_string()));
        assert!(labels.contains(&"@6".to_string()));

        // A signed and an unsigned literal are distinct cells, but `+5` is `5`.
        let signed = compile_ok("x = -5 + +5 + 5;");
        let labels: Vec<String> = rendered_data_words(&signed).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["x", "@_5", "@5", "@t0", "@t1"]);
    }

    #[test]
    fn test_temporaries_never_shared() {
        let listing = compile_ok("x = (1+2)*(3+4);");
        let temps: Vec<String> = rendered_data_words(&listing).into_iter()
            .map(|(l, _)| l)
            .filter(|l| l.starts_with("@t"))
            .collect();
        // Two additions and one multiplication.
        assert_eq!(temps, vec!["@t0", "@t1", "@t2"]);
        assert_eq!(count(&listing, "add"), 2);
        assert_eq!(count(&listing, "mult"), 1);

        let listing = compile_ok("x = 1 + 1;\ny = 1 + 1;\n");
        assert_eq!(count(&listing, "st"), 4);
        assert!(rendered_data_words(&listing).iter().any(|(l, _)| l == "@t1"));
    }

    #[test]
    fn test_left_to_right() {
        let listing = compile_ok("x = a * b * c + d;");
        let code: Vec<&Instruction> = listing.instructions().collect();
        assert_eq!(code, vec![
            &Instruction::Register,
            &ld("a"), &Instruction::Mult("b".to_owned()), &st("@t0"),
            &ld("@t0"), &Instruction::Mult("c".to_owned()), &st("@t1"),
            &ld("@t1"), &Instruction::Add("d".to_owned()), &st("@t2"),
            &ld("@t2"), &st("x"),
            &Instruction::Halt,
        ]);
    }

    #[test]
    fn test_parenthesized_factor_passes_location_through() {
        let listing = compile_ok("y = ((7));");
        let code: Vec<&Instruction> = listing.instructions().collect();
        assert_eq!(code, vec![&Instruction::Register, &ld("@7"), &st("y"), &Instruction::Halt]);
    }

    #[test]
    fn test_binary_minus_rejected() {
        let e = syntax_error("x = 1 - 2 * 3;");
        assert_eq!(e.image, "-");
        assert_eq!((e.line, e.column), (1, 7));
        assert_eq!(e.expected, "op, \")\", or \";\"");
    }

    #[test]
    fn test_undeclared_read() {
        let listing = compile_ok("println(x);\n");
        assert_eq!(rendered_data_words(&listing), vec![("x".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_first_declaration_wins() {
        let listing = compile_ok("x = 3;\nx = x + 1;\n");
        let words = rendered_data_words(&listing);
        let xs: Vec<_> = words.iter().filter(|(l, _)| l == "x").collect();
        assert_eq!(xs, vec![&("x".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_missing_semicolon() {
        let e = syntax_error("x = 1 + 1\n");
        assert_eq!((e.line, e.column), (1, 10));
        assert_eq!(e.image, "<END>");
        assert!(e.expected.contains("\";\""));
    }

    #[test]
    fn test_error_keeps_partial_listing() {
        let outcome = compile("x = 2;\ny = 3 $ 4;\n");
        assert!(outcome.error.is_some());
        assert_eq!(count(&outcome.listing, "halt"), 0);
        assert!(outcome.listing.instructions().any(|i| *i == st("x")));
        assert_eq!(outcome.symbols.len(), 4);
    }

    #[test]
    fn test_undecodable_source_is_syntax_error() {
        let outcome = Parser::new(Lexer::new(&b"x = 1;\ny = 2 \xff;\n"[..])).run();
        match outcome.error {
            Some(CompileError::Syntax(e)) => {
                assert_eq!((e.line, e.column), (2, 7));
                assert_eq!(e.image, "\u{FFFD}");
                assert_eq!(e.expected, "op, \")\", or \";\"");
            },
            other => panic!("expected a syntax error, got {:?}", other),
        }
        // The offending line is still echoed for diagnosis.
        assert!(outcome.listing.lines().contains(&Line::Comment("y = 2 \u{FFFD};".to_owned())));
        assert!(outcome.listing.instructions().any(|i| *i == st("x")));
    }

    #[test]
    fn test_error_messages() {
        let e = syntax_error("= 1;");
        assert_eq!(e.expected, "statement or end of file");

        let e = syntax_error("x = ;");
        assert_eq!(e.expected, "factor");
        assert_eq!(e.image, ";");

        let e = syntax_error("x = - y;");
        assert_eq!(e.expected, "<UNSIGNED>");

        let e = syntax_error("println 1;");
        assert_eq!(e.expected, "\"(\"");

        let e = syntax_error("x = (1 + 2;");
        assert_eq!(e.expected, "\")\"");

        let e = syntax_error("x = 1 2;");
        assert_eq!(e.expected, "op, \")\", or \";\"");

        let e = syntax_error("x = 1 * 2 3;");
        assert_eq!(e.expected, "op, \")\", or \";\"");

        let e = syntax_error("x = 1; #");
        assert_eq!(e.image, "#");
        assert_eq!((e.line, e.column), (1, 8));
    }

    #[test]
    fn test_empty_program() {
        let listing = compile_ok("");
        let code: Vec<&Instruction> = listing.instructions().collect();
        assert_eq!(code, vec![&Instruction::Register, &Instruction::Halt]);
        assert_eq!(listing.data_words().count(), 0);
    }

    #[test]
    fn test_structural_properties() {
        let programs = [
            "x = 1;",
            "println(1 + 2 * 3);",
            "a = 4;\nb = a * a + -2;\nprintln(b);\nprintln((a + b) * (a + +1));\n",
            "x = (1+2)*(3+4);\nprintln(x * x * x);\n",
        ];
        for src in programs.iter() {
            let listing = compile_ok(src);

            assert_eq!(count(&listing, "halt"), 1);
            assert_eq!(count(&listing, "!register"), 1);
            assert_eq!(count(&listing, "ld"), count(&listing, "st") + count(&listing, "dout"));

            let words = rendered_data_words(&listing);
            let mut labels: Vec<&String> = words.iter().map(|(l, _)| l).collect();
            let total = labels.len();
            labels.sort();
            labels.dedup();
            assert_eq!(labels.len(), total, "duplicate labels in {:?}", src);

            // Every operand refers to a declared cell.
            for ins in listing.instructions() {
                if let Instruction::Ld(l) | Instruction::St(l) | Instruction::Add(l) | Instruction::Mult(l) = ins {
                    assert!(labels.contains(&l), "undeclared operand {} in {:?}", l, src);
                }
            }
        }
    }
}
