//! Output model for the accumulator machine.
//!
//! A compilation produces a `Listing`: comment lines echoing the source,
//! instruction lines, and the data-word declarations that back every
//! symbol. Rendering follows the machine's assembler layout:
//!
//! ```nasm
//! ; x = 5 + 5;
//!           ld        @5
//!           add       @5
//!           st        @t0
//! x:        dw        0
//! ```

use std::fmt;

/// Indentation before every instruction line.
const INDENT: &str = "          ";

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    Register,
    Ld  (String),
    St  (String),
    Add (String),
    Mult(String),
    Dout,
    Ldc (char),
    Aout,
    Halt,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            Register  => "!register",
            Ld(_)     => "ld",
            St(_)     => "st",
            Add(_)    => "add",
            Mult(_)   => "mult",
            Dout      => "dout",
            Ldc(_)    => "ldc",
            Aout      => "aout",
            Halt      => "halt",
        }
    }

    /// Returns the rendered operand, if the instruction takes one.
    pub fn operand(&self) -> Option<String> {
        use Instruction::*;
        match self {
            Ld(label) |
            St(label) |
            Add(label)|
            Mult(label)        => Some(label.clone()),
            Ldc(c)             => Some(format!("'{}'", c.escape_default())),
            Register | Dout |
            Aout | Halt        => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.operand() {
            Some(opnd) => write!(f, "{:<4}      {}", self.mnemonic(), opnd),
            None => write!(f, "{}", self.mnemonic()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Line {
    Comment(String),
    Blank,
    Code(Instruction),
    DataWord { label: String, value: String },
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Line::Comment(text) => write!(f, "; {}", text),
            Line::Blank => Ok(()),
            Line::Code(ins) => write!(f, "{}{}", INDENT, ins),
            Line::DataWord { label, value } =>
                write!(f, "{:<9} dw        {}", format!("{}:", label), value),
        }
    }
}

/// Everything emitted so far, in output order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Listing {
    lines: Vec<Line>,
}

impl Listing {
    pub fn new() -> Self {
        Listing { lines: Vec::with_capacity(64) }
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Comment(text.into()));
    }

    pub fn blank(&mut self) {
        self.lines.push(Line::Blank);
    }

    pub fn emit(&mut self, ins: Instruction) {
        trace!("emit {}", ins);
        self.lines.push(Line::Code(ins));
    }

    pub fn data_word(&mut self, label: &str, value: &str) {
        self.lines.push(Line::DataWord { label: label.to_owned(), value: value.to_owned() });
    }
}

#[cfg(test)]
impl Listing {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(|line| match line {
            Line::Code(ins) => Some(ins),
            _ => None,
        })
    }

    /// Yields `(label, value)` for each data-word declaration.
    pub fn data_words(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::DataWord { label, value } => Some((label.as_str(), value.as_str())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
