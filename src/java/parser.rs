#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Formatter;

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Query, QueryCursor, StreamingIterator, Tree};

use crate::Dict;

#[derive(Clone)]
/// A struct that wraps a tree-sitter parser object and source code
pub struct Parser {
    /// the source code being parsed
    code: String,
    /// the parse tree
    tree: Tree,
    /// the tree-sitter java grammar language
    lang: tree_sitter::Language,
}

/// Returns the compiled tree-sitter Java language.
fn java_language() -> tree_sitter::Language {
    tree_sitter_java::LANGUAGE.into()
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

impl Parser {
    /// Returns a new parser object
    ///
    /// * `source_code`: the source code to be parsed
    pub fn new(source_code: String) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        let language = java_language();

        parser
            .set_language(&language)
            .with_context(|| "Failed to load Java grammar")?;
        let tree = parser
            .parse(source_code.as_str(), None)
            .ok_or_else(|| anyhow!("Error parsing Java code"))?;

        Ok(Self {
            code: source_code,
            tree,
            lang: language,
        })
    }

    /// A getter for parser's source code
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Applies a tree sitter query and returns the result as a collection of
    /// HashMaps
    ///
    /// * `q`: the tree-sitter query to be applied
    pub fn query(&self, q: &str) -> Result<Vec<Dict>> {
        let mut results = vec![];

        let query = Query::new(&self.lang, q)
            .with_context(|| format!("Failed to compile tree-sitter query: {q}"))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.tree.root_node(), self.code.as_bytes());
        let mut capture_indices = Vec::new();

        for name in query.capture_names() {
            let index = query
                .capture_index_for_name(name)
                .ok_or_else(|| anyhow!("Capture name {name} has no index associated."))?;
            capture_indices.push((index, name.to_string()));
        }

        while let Some(m) = matches.next() {
            let mut result = Dict::new();

            for (index, name) in &capture_indices {
                let value = match m.captures.iter().find(|c| c.index == *index) {
                    Some(v) => v,
                    None => continue,
                };

                let value = value
                    .node
                    .utf8_text(self.code.as_bytes())
                    .with_context(|| {
                        format!(
                            "Cannot match query result indices with source code for capture name: \
                             {name}."
                        )
                    })?;

                result.insert(name.clone(), value.to_string());
            }
            results.push(result);
        }

        Ok(results)
    }
}
