// src/evaluator/languages/python.rs — Python binding
//
// Variables are the identifier references of the syntax tree (names read,
// written or deleted in expressions). Linting runs pylint with a one-code-
// per-line message template and buckets codes by their leading letter.

use std::collections::{BTreeMap, BTreeSet};
use tree_sitter::{Node, Parser};

use super::{first_error_line, lint_each, vocabulary, walk_tree, Language, LanguageBinding};
use crate::evaluator::reconstruct;
use crate::evaluator::static_analysis::{
    classify_message_code, parse_message_codes, ExternalTool, ScratchDir,
};
use crate::evaluator::types::{
    EvaluationItem, LintDiagnostic, LintResult, LinterSummary, Severity,
};
use crate::infra::config::PythonConfig;
use crate::infra::errors::EvalError;

/// Reserved words plus builtin names.
pub const PYTHON_KEYWORDS: &[&str] = &[
    // keywords
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
    // builtins
    "abs", "all", "any", "ascii", "bin", "bool", "breakpoint", "bytearray", "bytes",
    "callable", "chr", "classmethod", "compile", "complex", "delattr", "dict", "dir",
    "divmod", "enumerate", "eval", "exec", "filter", "float", "format", "frozenset",
    "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
    "isinstance", "issubclass", "iter", "len", "list", "locals", "map", "max", "memoryview",
    "min", "next", "object", "oct", "open", "ord", "pow", "print", "property", "range",
    "repr", "reversed", "round", "set", "setattr", "slice", "sorted", "staticmethod", "str",
    "sum", "super", "tuple", "type", "vars", "zip",
];

/// Python 2 statement forms the grammar still accepts but Python 3 rejects.
const PYTHON2_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

pub struct PythonBinding {
    keywords: BTreeSet<String>,
    linter: String,
    linter_args: Vec<String>,
}

impl Default for PythonBinding {
    fn default() -> Self {
        Self::from_config(&PythonConfig::default())
    }
}

impl PythonBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PythonConfig) -> Self {
        Self {
            keywords: vocabulary(PYTHON_KEYWORDS),
            linter: config.linter.clone(),
            linter_args: config.linter_args.clone(),
        }
    }
}

impl LanguageBinding for PythonBinding {
    fn language(&self) -> Language {
        Language::Python
    }

    fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Every identifier reference in visitation order, duplicates included.
    fn extract_variables(&self, program: &str) -> Result<Vec<String>, EvalError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| EvalError::parse("python", e.to_string()))?;
        let tree = parser
            .parse(program, None)
            .ok_or_else(|| EvalError::parse("python", "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(EvalError::parse(
                "python",
                format!("invalid syntax near line {line}"),
            ));
        }

        let source = program.as_bytes();
        let mut names = Vec::new();
        let mut bad_utf8 = false;
        let mut python2_line = None;
        walk_tree(root, |node| {
            if python2_line.is_none() && PYTHON2_STATEMENTS.contains(&node.kind()) {
                python2_line = Some(node.start_position().row + 1);
            }
            if node.kind() == "identifier" && is_name_reference(node) {
                match node.utf8_text(source) {
                    Ok(text) => names.push(text.to_string()),
                    Err(_) => bad_utf8 = true,
                }
            }
        });
        if let Some(line) = python2_line {
            return Err(EvalError::parse(
                "python",
                format!("Python 2 statement near line {line}"),
            ));
        }
        if bad_utf8 {
            return Err(EvalError::parse("python", "identifier is not valid UTF-8"));
        }
        Ok(names)
    }

    fn lint(&self, chunk: &[EvaluationItem]) -> Result<Vec<LintResult>, EvalError> {
        let tool = ExternalTool::resolve(&self.linter, &self.linter_args)?;
        let scratch = ScratchDir::new("tailscore-py-")?;

        lint_each(chunk, |index, item| {
            let program = reconstruct::reconstruct_script(item)?;
            let path = scratch.write_item(index, "py", &program)?;
            let output = tool.run(&path, scratch.path())?;

            let diagnostics = parse_message_codes(&output.stdout)
                .into_iter()
                .map(|code| {
                    let severity = classify_message_code(&code);
                    LintDiagnostic::new(code, severity)
                })
                .collect();
            Ok(LintResult::new(diagnostics))
        })
    }

    fn summarize_lint_results(&self, results: &[LintResult]) -> Option<LinterSummary> {
        if results.is_empty() {
            return None;
        }

        let mut style_fails: BTreeMap<String, u64> = BTreeMap::new();
        let mut warnings: BTreeMap<String, u64> = BTreeMap::new();
        let mut fatal_errors: BTreeMap<String, u64> = BTreeMap::new();
        let mut erroneous = 0usize;

        for result in results {
            let mut executable = true;
            for diag in &result.diagnostics {
                let bucket = match diag.severity {
                    Some(Severity::Style) => &mut style_fails,
                    Some(Severity::Warning) => &mut warnings,
                    Some(Severity::Fatal) => {
                        executable = false;
                        &mut fatal_errors
                    }
                    None => {
                        tracing::warn!("invalid prefix: {}", diag.code);
                        continue;
                    }
                };
                *bucket.entry(diag.code.clone()).or_insert(0) += 1;
            }
            if !executable {
                erroneous += 1;
            }
        }

        Some(LinterSummary {
            style_fails,
            warnings,
            fatal_errors,
            executable_files: (results.len() - erroneous) as f64 / results.len() as f64,
            errored_items: 0,
            errors: None,
        })
    }
}

/// Whether an `identifier` node is a name reference rather than a binding
/// label (function/class/parameter names, attributes, keyword-argument
/// names, import paths, global/nonlocal declarations, exception aliases).
fn is_name_reference(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    let is_field = |field: &str| parent.child_by_field_name(field) == Some(node);

    match parent.kind() {
        "function_definition" | "class_definition" => !is_field("name"),
        "attribute" => !is_field("attribute"),
        "keyword_argument" | "default_parameter" | "typed_default_parameter" => {
            !is_field("name")
        }
        "parameters" | "lambda_parameters" | "typed_parameter" => false,
        "list_splat_pattern" | "dictionary_splat_pattern" => !matches!(
            parent.parent().map(|g| g.kind()),
            Some("parameters" | "lambda_parameters" | "typed_parameter")
        ),
        "dotted_name" | "aliased_import" | "import_from_statement" | "import_statement"
        | "global_statement" | "nonlocal_statement" => false,
        "except_clause" => parent.named_child(0) == Some(node),
        "as_pattern_target" => !is_exception_alias(parent),
        "as_pattern" => !(is_field("alias") && is_exception_alias(parent)),
        _ => true,
    }
}

/// `except E as name:` binds a plain string in the AST, not a name node.
fn is_exception_alias(node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "except_clause" | "except_group_clause" => return true,
            "as_pattern" | "as_pattern_target" => current = n.parent(),
            _ => return false,
        }
    }
    false
}
