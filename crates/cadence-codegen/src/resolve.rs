//! Subexpression dependency graph.
//!
//! Subexpressions may reference other subexpressions. The graph records, for
//! every subexpression in a [`SymbolTable`], which subexpressions it reads
//! directly and which primitive names it reads directly. Traversal is
//! depth-first with an explicit path stack so that a cycle is reported with
//! the exact path that closes it.

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::trace;

use crate::error::CompileError;
use crate::parser::{parse_expression, parse_statements};
use crate::symbols::{Symbol, SymbolTable};

#[derive(Debug, Default)]
struct Edges {
    subexpressions: SmallVec<[String; 4]>,
    primitives: SmallVec<[String; 4]>,
}

/// Direct dependencies between the subexpressions of one symbol table.
#[derive(Debug)]
pub struct SubexpressionGraph {
    edges: IndexMap<String, Edges>,
}

impl SubexpressionGraph {
    /// Build the graph for every subexpression in `table`.
    ///
    /// Construction never fails; cycles are reported when a traversal
    /// reaches them.
    pub fn new(table: &SymbolTable) -> Self {
        let mut edges = IndexMap::new();
        for symbol in table.iter() {
            let Symbol::Subexpression(sub) = symbol else {
                continue;
            };
            let mut e = Edges::default();
            for id in sub.expr().identifiers() {
                if table.subexpression(&id).is_some() {
                    e.subexpressions.push(id);
                } else {
                    e.primitives.push(id);
                }
            }
            edges.insert(sub.name.clone(), e);
        }
        Self { edges }
    }

    /// Whether `name` is a subexpression of the table.
    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// All subexpressions reachable from `roots`, dependencies first.
    ///
    /// Roots that are not subexpressions are ignored. Fails with
    /// [`CompileError::CyclicDependency`] if any reachable subexpression
    /// references itself.
    pub fn dependency_order<'a, I>(&self, roots: I) -> Result<Vec<String>, CompileError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut order = IndexSet::new();
        let mut path = Vec::new();
        for root in roots {
            if self.contains(root) {
                self.visit(root, &mut path, &mut order)?;
            }
        }
        Ok(order.into_iter().collect())
    }

    fn visit(
        &self,
        name: &str,
        path: &mut Vec<String>,
        done: &mut IndexSet<String>,
    ) -> Result<(), CompileError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = path.iter().position(|p| p == name) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(CompileError::CyclicDependency { cycle });
        }
        path.push(name.to_string());
        if let Some(edges) = self.edges.get(name) {
            for dep in &edges.subexpressions {
                self.visit(dep, path, done)?;
            }
        }
        path.pop();
        done.insert(name.to_string());
        Ok(())
    }

    /// Transitive primitive (non-subexpression) inputs of `name`.
    ///
    /// For a name that is not a subexpression this is the name itself.
    pub fn primitive_inputs(&self, name: &str) -> IndexSet<String> {
        let mut out = IndexSet::new();
        let mut seen = IndexSet::new();
        self.collect_primitives(name, &mut seen, &mut out);
        out
    }

    fn collect_primitives(
        &self,
        name: &str,
        seen: &mut IndexSet<String>,
        out: &mut IndexSet<String>,
    ) {
        if !seen.insert(name.to_string()) {
            return;
        }
        match self.edges.get(name) {
            Some(edges) => {
                for p in &edges.primitives {
                    out.insert(p.clone());
                }
                for dep in &edges.subexpressions {
                    self.collect_primitives(dep, seen, out);
                }
            }
            None => {
                out.insert(name.to_string());
            }
        }
    }
}

/// Parse one source string as a statement block, or as a bare expression
/// when it contains no assignment.
fn source_identifiers(source: &str, out: &mut IndexSet<String>) -> Result<(), CompileError> {
    match parse_statements(source) {
        Ok(statements) => {
            for stmt in &statements {
                out.insert(stmt.target.clone());
                stmt.value.collect_identifiers(out);
            }
            Ok(())
        }
        Err(err) => match parse_expression(source) {
            Ok(expr) => {
                expr.collect_identifiers(out);
                Ok(())
            }
            Err(_) => Err(err),
        },
    }
}

/// Every identifier used by `statements`, including those reached through
/// subexpressions.
///
/// Targets count as identifiers. Subexpressions are expanded depth-first,
/// each body traversed once.
pub fn get_identifiers_recursively(
    statements: &[&str],
    table: &SymbolTable,
) -> Result<IndexSet<String>, CompileError> {
    let mut identifiers = IndexSet::new();
    for source in statements {
        source_identifiers(source, &mut identifiers)?;
    }
    let graph = SubexpressionGraph::new(table);
    let order = graph.dependency_order(identifiers.iter().map(String::as_str))?;
    for name in order {
        if let Some(sub) = table.subexpression(&name) {
            trace!(subexpression = %name, "expanding");
            sub.expr().collect_identifiers(&mut identifiers);
        }
    }
    Ok(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Variable;
    use cadence_core::Dtype;

    fn set(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn nested_table() -> SymbolTable {
        SymbolTable::new()
            .with_subexpression("sub1", "sub2 * z", Dtype::Float32)
            .unwrap()
            .with_subexpression("sub2", "5 + y", Dtype::Float32)
            .unwrap()
            .with_variable(Variable::vector("x", Dtype::Float64))
    }

    #[test]
    fn closure_follows_nested_subexpressions() {
        let ids = get_identifiers_recursively(&["_x = sub1 + x"], &nested_table()).unwrap();
        let mut got: Vec<_> = ids.into_iter().collect();
        got.sort();
        let mut want: Vec<_> = set(&["x", "_x", "y", "z", "sub1", "sub2"]).into_iter().collect();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn bare_expressions_are_accepted() {
        let ids = get_identifiers_recursively(&["sub1 * 2"], &nested_table()).unwrap();
        assert!(ids.contains("y"));
        assert!(ids.contains("z"));
    }

    #[test]
    fn dependency_order_puts_dependencies_first() {
        let table = nested_table();
        let graph = SubexpressionGraph::new(&table);
        assert_eq!(graph.dependency_order(["sub1"]).unwrap(), vec!["sub2", "sub1"]);
        assert_eq!(graph.dependency_order(["x"]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn primitive_inputs_are_transitive() {
        let table = nested_table();
        let graph = SubexpressionGraph::new(&table);
        assert_eq!(graph.primitive_inputs("sub1"), set(&["z", "y"]));
        assert_eq!(graph.primitive_inputs("x"), set(&["x"]));
    }

    #[test]
    fn cycle_is_reported_with_its_path() {
        let table = SymbolTable::new()
            .with_subexpression("a", "b + 1", Dtype::Float64)
            .unwrap()
            .with_subexpression("b", "a * 2", Dtype::Float64)
            .unwrap();
        match get_identifiers_recursively(&["x = a"], &table) {
            Err(CompileError::CyclicDependency { cycle }) => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn unreached_cycle_is_not_an_error() {
        let table = SymbolTable::new()
            .with_subexpression("a", "a + 1", Dtype::Float64)
            .unwrap();
        assert!(get_identifiers_recursively(&["x = y"], &table).is_ok());
    }
}
