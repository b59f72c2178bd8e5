//! Tree-sitter query strings used by the Java source analyzer.

/// Tree-sitter query that returns the name of the package
/// * `name`: name of the package
pub const PACKAGE_QUERY: &str = r#"
(package_declaration
  [(scoped_identifier) (identifier)] @name)
"#;

/// Tree-sitter query that returns names of top-level classes
/// * `name`: name of the class
pub const CLASSNAME_QUERY: &str = r#"
(class_declaration
  name: (identifier) @name)
"#;

/// Tree-sitter query that returns name of the interface
/// * `name`: name of the interface
pub const INTERFACENAME_QUERY: &str = r#"
(interface_declaration
  name: (identifier) @name)
"#;

/// Tree-sitter query matching every method that could be a program entry
/// point, together with the class that encloses it.
///
/// Captures:
/// * `class`: name of the enclosing class
/// * `modifiers`: the method's modifier list
/// * `method`: the method name
/// * `params`: the method's formal parameters
///
/// Candidate filtering (name is `main`, modifiers include `static`, single
/// `String[]`/`String...` parameter) happens in Rust because the Rust
/// tree-sitter binding does not evaluate `#eq?` predicates.
pub const ENTRY_POINT_QUERY: &str = r#"
(class_declaration
  name: (identifier) @class
  body: (class_body
    (method_declaration
      (modifiers) @modifiers
      type: (void_type)
      name: (identifier) @method
      parameters: (formal_parameters) @params)))
"#;
