//! Identifier analysis of a statement block.

use indexmap::{IndexMap, IndexSet};

use crate::error::CompileError;
use crate::parser::parse_statements;
use crate::symbols::SymbolTable;

/// A set of names that count as "known" during identifier analysis.
pub trait KnownNames {
    /// Whether `name` is known.
    fn is_known(&self, name: &str) -> bool;
}

impl KnownNames for SymbolTable {
    fn is_known(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl KnownNames for IndexSet<String> {
    fn is_known(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<V> KnownNames for IndexMap<String, V> {
    fn is_known(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl KnownNames for [&str] {
    fn is_known(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

impl<const N: usize> KnownNames for [&str; N] {
    fn is_known(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

/// Result of [`analyse_identifiers`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentifierSets {
    /// Every assignment target in the block.
    pub defined: IndexSet<String>,
    /// Identifiers (targets included) that are known.
    pub used_known: IndexSet<String>,
    /// Identifiers that are neither defined in the block nor known.
    pub dependent: IndexSet<String>,
}

/// Classify the identifiers of a statement block.
///
/// Function-call heads and keywords are not identifiers. A known name that
/// only appears as an assignment target still counts as used.
pub fn analyse_identifiers<K>(code: &str, known: &K) -> Result<IdentifierSets, CompileError>
where
    K: KnownNames + ?Sized,
{
    let statements = parse_statements(code)?;
    let mut sets = IdentifierSets::default();
    let mut all = IndexSet::new();
    for stmt in &statements {
        sets.defined.insert(stmt.target.clone());
        all.insert(stmt.target.clone());
        stmt.value.collect_identifiers(&mut all);
    }
    for name in all {
        if known.is_known(&name) {
            sets.used_known.insert(name);
        } else if !sets.defined.contains(&name) {
            sets.dependent.insert(name);
        }
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classifies_defined_known_and_dependent() {
        let code = "
            a = b+c
            d = e+f
        ";
        let sets = analyse_identifiers(code, &["b", "c", "d", "g"]).unwrap();
        assert!(sets.defined.contains("a"));
        assert_eq!(sets.used_known, set(&["b", "c", "d"]));
        assert_eq!(sets.dependent, set(&["e", "f"]));
    }

    #[test]
    fn call_heads_and_keywords_are_ignored() {
        let sets = analyse_identifiers("y = exp(x) + clip(z, 0, 1)\nflag = not y > 0 and True", &["x"])
            .unwrap();
        assert_eq!(sets.used_known, set(&["x"]));
        assert_eq!(sets.dependent, set(&["z"]));
        assert!(!sets.dependent.contains("exp"));
        assert!(!sets.dependent.contains("clip"));
    }

    #[test]
    fn reading_a_defined_name_is_not_dependent() {
        let sets = analyse_identifiers("t1 = v * 2\nv = t1 + 1", &["v"]).unwrap();
        assert_eq!(sets.defined, set(&["t1", "v"]));
        assert_eq!(sets.used_known, set(&["v"]));
        assert!(sets.dependent.is_empty());
    }

    #[test]
    fn malformed_code_is_a_syntax_error() {
        assert!(matches!(
            analyse_identifiers("a = = b", &["b"]),
            Err(CompileError::Syntax { .. })
        ));
    }
}
