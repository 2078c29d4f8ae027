// src/evaluator/languages/c.rs — C binding
//
// Variables are identifier tokens in order of first appearance. Linting
// compiles each reconstructed (brace-balanced) program in syntax-check mode;
// any non-blank line on stderr makes the item non-executable.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tree_sitter::Parser;

use super::{lint_each, walk_tree, Language, LanguageBinding};
use crate::evaluator::reconstruct;
use crate::evaluator::static_analysis::{
    is_clean_stream, split_diagnostic_lines, ExternalTool, ScratchDir,
};
use crate::evaluator::types::{EvaluationItem, LintDiagnostic, LintResult, LinterSummary};
use crate::infra::config::CConfig;
use crate::infra::errors::EvalError;

/// Reserved words of the language (C89 / C99 / C11).
pub const C_RESERVED_WORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "typedef", "union", "unsigned", "void", "volatile", "while", "_Alignas", "_Alignof",
    "_Atomic", "_Bool", "_Complex", "_Generic", "_Imaginary", "_Noreturn", "_Static_assert",
    "_Thread_local",
];

/// Preprocessor directive names and a few ubiquitous standard-library names,
/// counted as keywords alongside the reserved words.
pub const C_LIBRARY_WORDS: &[&str] = &[
    // preprocessor
    "include", "define", "undef", "ifdef", "ifndef", "endif", "elif", "pragma", "defined",
    // library
    "NULL", "printf", "scanf", "malloc", "calloc", "realloc", "free", "main",
];

/// Identifier-like token kinds in the C grammar.
const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "field_identifier",
    "type_identifier",
    "statement_identifier",
];

static MACRO_TOKEN_RE: OnceLock<Regex> = OnceLock::new();

/// Identifier tokens of a macro body (`preproc_arg`, which the grammar keeps
/// as one opaque leaf). Literals and comments are consumed whole so nothing
/// inside them is reported; reserved words are not identifiers.
fn macro_body_identifiers(body: &str) -> impl Iterator<Item = &str> {
    let re = MACRO_TOKEN_RE.get_or_init(|| {
        Regex::new(
            r#""(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|/\*(?s:.)*?\*/|//[^\n]*|[0-9][\w.]*|(?P<ident>[A-Za-z_]\w*)"#,
        )
        .expect("macro token pattern is valid")
    });
    re.captures_iter(body)
        .filter_map(|caps| caps.name("ident"))
        .map(|m| m.as_str())
        .filter(|word| !C_RESERVED_WORDS.contains(word))
}

pub struct CBinding {
    keywords: BTreeSet<String>,
    compiler: String,
    compiler_args: Vec<String>,
}

impl Default for CBinding {
    fn default() -> Self {
        Self::from_config(&CConfig::default())
    }
}

impl CBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CConfig) -> Self {
        Self {
            keywords: C_RESERVED_WORDS
                .iter()
                .chain(C_LIBRARY_WORDS)
                .map(|w| w.to_string())
                .collect(),
            compiler: config.compiler.clone(),
            compiler_args: config.compiler_args.clone(),
        }
    }
}

impl LanguageBinding for CBinding {
    fn language(&self) -> Language {
        Language::C
    }

    fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Distinct identifier tokens in order of first appearance.
    ///
    /// Tokenizing is tolerant: syntax errors do not fail extraction, the
    /// identifiers inside recovered regions are still collected. Macro
    /// bodies are lexed separately since the grammar does not parse them.
    fn extract_variables(&self, program: &str) -> Result<Vec<String>, EvalError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| EvalError::parse("c", e.to_string()))?;
        let tree = parser
            .parse(program, None)
            .ok_or_else(|| EvalError::parse("c", "parser produced no tree"))?;

        let source = program.as_bytes();
        let mut seen = BTreeSet::new();
        let mut identifiers = Vec::new();
        let mut bad_utf8 = false;
        walk_tree(tree.root_node(), |node| {
            if node.child_count() != 0 {
                return;
            }
            let is_macro_body = node.kind() == "preproc_arg";
            if !is_macro_body && !IDENTIFIER_KINDS.contains(&node.kind()) {
                return;
            }
            let text = match node.utf8_text(source) {
                Ok(text) => text,
                Err(_) => {
                    bad_utf8 = true;
                    return;
                }
            };
            let mut record = |name: &str| {
                if seen.insert(name.to_string()) {
                    identifiers.push(name.to_string());
                }
            };
            if is_macro_body {
                macro_body_identifiers(text).for_each(&mut record);
            } else {
                record(text);
            }
        });
        if bad_utf8 {
            return Err(EvalError::parse("c", "identifier is not valid UTF-8"));
        }
        Ok(identifiers)
    }

    fn lint(&self, chunk: &[EvaluationItem]) -> Result<Vec<LintResult>, EvalError> {
        let tool = ExternalTool::resolve(&self.compiler, &self.compiler_args)?;
        let scratch = ScratchDir::new("tailscore-c-")?;

        lint_each(chunk, |index, item| {
            let program = reconstruct::reconstruct_braced(item)?;
            let path = scratch.write_item(index, "c", &program)?;
            let output = tool.run(&path, scratch.path())?;

            let diagnostics = split_diagnostic_lines(&output.stderr)
                .into_iter()
                .map(|line| LintDiagnostic::new(line, None))
                .collect();
            Ok(LintResult::new(diagnostics))
        })
    }

    fn summarize_lint_results(&self, results: &[LintResult]) -> Option<LinterSummary> {
        if results.is_empty() {
            return None;
        }

        let raw: Vec<Vec<String>> = results
            .iter()
            .map(|r| r.diagnostics.iter().map(|d| d.code.clone()).collect())
            .collect();
        let unexecutable = raw.iter().filter(|lines| !is_clean_stream(lines)).count();

        Some(LinterSummary {
            executable_files: (results.len() - unexecutable) as f64 / results.len() as f64,
            errors: Some(raw),
            ..LinterSummary::default()
        })
    }
}
