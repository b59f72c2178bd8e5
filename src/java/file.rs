#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{
    parser::Parser,
    queries::{CLASSNAME_QUERY, ENTRY_POINT_QUERY, INTERFACENAME_QUERY, PACKAGE_QUERY},
};

/// Kinds of Java source units the grader distinguishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileType {
    /// An interface declaration.
    Interface,
    /// A class without an entry point.
    Class,
    /// A class declaring `public static void main(String[])`.
    ClassWithMain,
}

/// One parsed Java source file belonging to a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path to the `.java` file on disk.
    path:         PathBuf,
    /// File name including the `.java` extension.
    file_name:    String,
    /// Package the source file belongs to, if declared.
    package_name: Option<String>,
    /// Simple name of the primary class or interface.
    name:         String,
    /// Fully qualified name (`package.Class`), as expected by `java`.
    qualified:    String,
    /// What kind of source unit this is.
    kind:         FileType,
    /// Qualified names of classes in this file that enclose a `main` method.
    main_classes: Vec<String>,
    #[serde(skip)]
    /// The parser (and source text) for this file.
    parser:       Option<Parser>,
}

/// Returns true when the captured method looks like a Java entry point:
/// named `main`, static, and taking a single `String[]`/`String...` argument.
/// A plain `String` (or `StringBuilder` etc.) parameter does not qualify.
fn is_entry_point(method: &str, modifiers: &str, params: &str) -> bool {
    // Whitespace inside the parameter text (`String [] args`) is legal Java.
    let params: String = params.chars().filter(|c| !c.is_whitespace()).collect();
    method == "main"
        && modifiers.contains("static")
        && (params.contains("String[]") || params.contains("String..."))
}

impl SourceFile {
    /// Reads and parses the Java file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let source_code = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read file: {:?}", &path))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid file name: {:?}", &path))?
            .to_string();

        let parser = Parser::new(source_code)?;

        let package_name = {
            let package_name = parser.query(PACKAGE_QUERY)?;

            if package_name.is_empty() {
                None
            } else {
                package_name[0].get("name").map(String::to_owned)
            }
        };

        let qualify = |simple: &str| match package_name.as_deref() {
            Some(pkg) => format!("{pkg}.{simple}"),
            None => simple.to_string(),
        };

        let main_classes: Vec<String> = parser
            .query(ENTRY_POINT_QUERY)?
            .iter()
            .filter(|m| {
                let method = m.get("method").map(String::as_str).unwrap_or_default();
                let modifiers = m.get("modifiers").map(String::as_str).unwrap_or_default();
                let params = m.get("params").map(String::as_str).unwrap_or_default();
                is_entry_point(method, modifiers, params)
            })
            .filter_map(|m| m.get("class"))
            .map(|class| qualify(class))
            .collect();

        let (kind, name) = {
            let interfaces = parser.query(INTERFACENAME_QUERY)?;
            if let Some(first) = interfaces.first().and_then(|i| i.get("name")) {
                (FileType::Interface, first.to_string())
            } else {
                let classes = parser.query(CLASSNAME_QUERY)?;
                let name = classes
                    .first()
                    .and_then(|c| c.get("name"))
                    .map(String::to_owned)
                    // Best effort for files tree-sitter cannot make sense of.
                    .unwrap_or_else(|| file_name.trim_end_matches(".java").to_string());
                let kind = if main_classes.is_empty() {
                    FileType::Class
                } else {
                    FileType::ClassWithMain
                };
                (kind, name)
            }
        };

        let qualified = qualify(&name);

        Ok(Self {
            path,
            file_name,
            package_name,
            name,
            qualified,
            kind,
            main_classes,
            parser: Some(parser),
        })
    }

    /// Get a reference to the file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the file's file name.
    pub fn file_name(&self) -> &str {
        self.file_name.as_ref()
    }

    /// Returns the package this file declares, if any.
    pub fn package_name(&self) -> Option<&String> {
        self.package_name.as_ref()
    }

    /// Returns the simple, unqualified name of the primary type.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Returns the fully qualified name of the primary type.
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    /// Get the file's kind.
    pub fn kind(&self) -> FileType {
        self.kind
    }

    /// Returns true when this file declares at least one entry point.
    pub fn has_main(&self) -> bool {
        !self.main_classes.is_empty()
    }

    /// Qualified names of classes in this file enclosing a `main` method.
    pub fn main_classes(&self) -> &[String] {
        &self.main_classes
    }

    /// Returns the source code of this file.
    pub fn code(&self) -> &str {
        self.parser.as_ref().map(Parser::code).unwrap_or_default()
    }
}
