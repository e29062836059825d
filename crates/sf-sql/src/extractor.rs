//! Table dependency extraction from SQL AST

use sqlparser::ast::{visit_relations, ObjectName, ObjectNamePart, Statement};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// Extract all table references from SQL statements
///
/// Uses `visit_relations` to walk the AST and collect every relation named in
/// FROM clauses, JOINs and subqueries. Names are returned
/// unquoted and dot-joined (`public.songs`), sorted.
pub fn extract_dependencies(statements: &[Statement]) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();

    for stmt in statements {
        let _ = visit_relations(stmt, |relation| {
            deps.insert(relation_name(relation));
            ControlFlow::<()>::Continue(())
        });
    }

    deps
}

fn relation_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| match part {
            ObjectNamePart::Identifier(ident) => ident.value.clone(),
            #[allow(unreachable_patterns)]
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Strip a schema qualifier: `public.songs` -> `songs`
pub fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
