/* Static facts about the .aa language: reserved keywords, keywords which must be called with
 * parentheses, and the symbol table of built in names. Built once and only ever read after. */

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::warn;

pub const KEYWORDS: [&str; 10] = [
    "grab", "shout", "numba", "floatie", "chary", "nocap", "cap", "constg", "constl", "bool",
];

pub const CALL_KEYWORDS: [&str; 1] = ["shout"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolCategory {
    DataType,
    Input,
    Output,
    Constant,
    ArithmeticOp,
}

impl fmt::Display for SymbolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolCategory::DataType => "DATATYPE",
            SymbolCategory::Input => "INPUT",
            SymbolCategory::Output => "OUTPUT",
            SymbolCategory::Constant => "CONSTANT",
            SymbolCategory::ArithmeticOp => "ARITHMETIC_OP",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    Global,
    Local,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "GLOBAL"),
            Scope::Local => write!(f, "LOCAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolTableEntry {
    name: String,
    category: SymbolCategory,
    value: String,
    scope: Scope,
}

impl SymbolTableEntry {
    pub fn new(name: &str, category: SymbolCategory, value: &str, scope: Scope) -> Self {
        SymbolTableEntry {
            name: name.to_string(),
            category,
            value: value.to_string(),
            scope,
        }
    }

    pub fn get_name(&self) -> &String {
        &self.name
    }

    pub fn get_category(&self) -> SymbolCategory {
        self.category
    }

    pub fn get_scope(&self) -> Scope {
        self.scope
    }
}

impl fmt::Display for SymbolTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Type: {}, Value: {}, Scope: {}",
            self.name, self.category, self.value, self.scope
        )
    }
}

/// List of possible errors while building the language facts
#[derive(Debug, PartialEq, Eq)]
pub enum LexiconError {
    /// The name is already present in the symbol table
    DuplicateSymbol(String),
}

impl fmt::Display for LexiconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexiconError::DuplicateSymbol(name) => {
                write!(f, "Error: Duplicate entry for {}", name)
            }
        }
    }
}

impl std::error::Error for LexiconError {}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SymbolTable {
    entries: BTreeMap<String, SymbolTableEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Register a new entry. The first registration of a name wins.
    pub fn add_entry(&mut self, entry: SymbolTableEntry) -> Result<(), LexiconError> {
        if self.entries.contains_key(&entry.name) {
            return Err(LexiconError::DuplicateSymbol(entry.name));
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &SymbolTableEntry> {
        self.entries.values()
    }
}

/// Everything the scanner needs to know about the language's vocabulary
#[derive(Debug, Clone)]
pub struct Lexicon {
    keywords: HashSet<String>,
    call_keywords: HashSet<String>,
    symbols: SymbolTable,
}

impl Lexicon {
    /// Build the lexicon from a list of symbol entries. Duplicates are reported and skipped.
    pub fn new(keywords: &[&str], call_keywords: &[&str], entries: Vec<SymbolTableEntry>) -> Self {
        let mut symbols = SymbolTable::new();

        for entry in entries {
            if let Err(err) = symbols.add_entry(entry) {
                warn!(%err, "skipping symbol table entry");
            }
        }

        Lexicon {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            call_keywords: call_keywords.iter().map(|k| k.to_string()).collect(),
            symbols,
        }
    }

    /// The lexicon of the .aa language
    pub fn aa() -> Self {
        use Scope::{Global, Local};
        use SymbolCategory::*;

        let entries = vec![
            SymbolTableEntry::new("numba", DataType, "-", Global),
            SymbolTableEntry::new("floatie", DataType, "-", Global),
            SymbolTableEntry::new("chary", DataType, "-", Global),
            SymbolTableEntry::new("nocap", DataType, "-", Global),
            SymbolTableEntry::new("grab", Input, "-", Global),
            SymbolTableEntry::new("shout", Output, "-", Global),
            SymbolTableEntry::new("constg", Constant, "-", Global),
            SymbolTableEntry::new("constl", Constant, "-", Local),
            SymbolTableEntry::new("+", ArithmeticOp, "-", Global),
            SymbolTableEntry::new("-", ArithmeticOp, "-", Global),
            SymbolTableEntry::new("*", ArithmeticOp, "-", Global),
            SymbolTableEntry::new("/", ArithmeticOp, "-", Global),
            SymbolTableEntry::new("%", ArithmeticOp, "-", Global),
        ];

        Lexicon::new(&KEYWORDS, &CALL_KEYWORDS, entries)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    /// Whether the keyword must be directly followed by a parenthesised argument list
    pub fn requires_call_parens(&self, word: &str) -> bool {
        self.call_keywords.contains(word)
    }

    pub fn get_symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon::aa()
    }
}
