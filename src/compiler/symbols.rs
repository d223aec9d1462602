//! Flat symbol table backing every memory cell a program uses.
//!
//! Three kinds of names share the table: user variables (their source name),
//! literal aliases (`@5` for `5`, `@_5` for `-5`) and temporaries (`@t0`,
//! `@t1`, ...). None of these can collide since identifiers never start
//! with `@`.

/// Index of a symbol; also where an expression's value lives at run time.
pub type Location = usize;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub name: String,
    /// Initial value, emitted verbatim in the data-word declaration.
    pub value: String,
    pub needs_data_word: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
    next_temp: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { entries: Vec::with_capacity(32), next_temp: 0 }
    }

    /// Returns the location of `name`, appending it first if it is new.
    /// An existing entry is never overwritten.
    pub fn intern(&mut self, name: &str, value: &str, needs_data_word: bool) -> Location {
        if let Some(index) = self.entries.iter().position(|s| s.name == name) {
            return index;
        }

        let index = self.entries.len();
        self.entries.push(Symbol {
            name: name.to_owned(),
            value: value.to_owned(),
            needs_data_word,
        });
        debug!("adding {} to {}", name, index);
        index
    }

    /// Allocates a temporary that no other expression will ever share.
    pub fn fresh_temporary(&mut self) -> Location {
        let name = format!("@t{}", self.next_temp);
        self.next_temp += 1;
        self.intern(&name, "0", true)
    }

    /// Interns the alias for an unsigned literal, optionally negated.
    pub fn literal(&mut self, digits: &str, negative: bool) -> Location {
        if negative {
            self.intern(&format!("@_{}", digits), &format!("-{}", digits), true)
        } else {
            self.intern(&format!("@{}", digits), digits, true)
        }
    }

    /// Interns a user variable. Variables start out as zero.
    pub fn variable(&mut self, name: &str) -> Location {
        self.intern(name, "0", true)
    }

    /// Name of the symbol at `loc`. Locations only ever come from this
    /// table, so an out-of-range one is a bug.
    pub fn name(&self, loc: Location) -> &str {
        &self.entries[loc].name
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter()
    }

    /// Symbols that need storage, in insertion order.
    pub fn data_words(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().filter(|s| s.needs_data_word)
    }
}

#[cfg(test)]
impl SymbolTable {
    pub fn get(&self, loc: Location) -> Option<&Symbol> {
        self.entries.get(loc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
