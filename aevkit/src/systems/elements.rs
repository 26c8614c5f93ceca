use indexmap::IndexSet;

use crate::Error;

/// Ordered table of chemical elements, mapping element symbols to the 0-based
/// species codes used everywhere else in this crate.
///
/// The species code of an element is its position in the table, so the table
/// must be the same when creating training data and when evaluating a model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementTable {
    symbols: IndexSet<String>,
}

impl ElementTable {
    /// Create a table from a list of symbols. Symbols must be unique.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<ElementTable, Error> {
        let mut table = ElementTable::default();
        for symbol in symbols {
            let symbol = symbol.as_ref();
            if !table.symbols.insert(symbol.to_owned()) {
                return Err(Error::InvalidParameter(format!(
                    "element '{}' is present multiple times in the element table", symbol
                )));
            }
        }
        return Ok(table);
    }

    /// Number of elements in this table
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Is this table empty?
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get the species code associated with the element `symbol`
    pub fn species(&self, symbol: &str) -> Result<usize, Error> {
        self.symbols.get_index_of(symbol.trim()).ok_or_else(|| Error::InvalidParameter(
            format!("unknown element '{}' in this element table", symbol.trim())
        ))
    }

    /// Get the element symbol associated with the `species` code
    pub fn symbol(&self, species: usize) -> Option<&str> {
        self.symbols.get_index(species).map(|s| s.as_str())
    }

    /// Iterate over the symbols in this table, in species code order
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.iter().map(|s| s.as_str())
    }
}
