// src/evaluator/reconstruct.rs — Rebuild candidate programs from an original
// plus generated tail lines.
//
// Tail removal is a global literal replace: every occurrence of every tail
// line is deleted anywhere in the program, not just the trailing block.
// Lines that also appear earlier in the file (`}`, `return 0;`, `else:`) are
// therefore removed from the body too, and a tail line that is a substring
// of an unrelated line cuts into it. Metrics computed so far depend on this
// behavior, so it is kept as is.

use regex::Regex;

use super::types::EvaluationItem;

/// Remove every literal occurrence of every tail line from `program`.
///
/// The tail lines are matched verbatim (regex metacharacters are escaped)
/// and combined into one leftmost-first alternation, so the program is
/// scanned once regardless of how many lines the tail has.
///
/// Blank tail lines remove nothing. They are left out of the alternation,
/// where an empty branch would match at every position and shadow the
/// branches after it.
pub fn strip_tail(program: &str, tail_lines: &[String]) -> Result<String, regex::Error> {
    let literals: Vec<String> = tail_lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| regex::escape(line))
        .collect();
    if literals.is_empty() {
        return Ok(program.to_string());
    }
    let pattern = literals.join("|");
    let re = Regex::new(&pattern)?;
    Ok(re.replace_all(program, "").into_owned())
}

/// Append the generated lines after a newline.
pub fn reattach_tail(stripped: &str, generated_lines: &[String]) -> String {
    format!("{}\n{}", stripped, generated_lines.join("\n"))
}

/// Drop trailing `}`, space and newline characters.
///
/// The withheld tail usually closed the scopes that were open, so leaving
/// these in place would close them twice once the generated lines are
/// appended.
pub fn trim_trailing_close_braces(program: &str) -> &str {
    program.trim_end_matches(['}', ' ', '\n'])
}

/// Net `{` minus `}` count over the whole text.
pub fn brace_depth(program: &str) -> i64 {
    program.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

/// Append exactly enough `}` to bring the net depth to zero.
///
/// Never removes characters; a negative depth is left alone.
pub fn balance_braces(program: &str) -> String {
    let depth = brace_depth(program);
    let mut out = program.to_string();
    if depth > 0 {
        out.extend(std::iter::repeat('}').take(depth as usize));
    }
    out
}

/// Candidate program for indentation-delimited languages.
pub fn reconstruct_script(item: &EvaluationItem) -> Result<String, regex::Error> {
    let stripped = strip_tail(&item.original_program, &item.original_lines)?;
    Ok(reattach_tail(&stripped, &item.generated_lines))
}

/// Candidate program for brace-delimited languages: closing braces are
/// trimmed before tail removal and rebalanced after reattachment.
pub fn reconstruct_braced(item: &EvaluationItem) -> Result<String, regex::Error> {
    let trimmed = trim_trailing_close_braces(&item.original_program);
    let stripped = strip_tail(trimmed, &item.original_lines)?;
    Ok(balance_braces(&reattach_tail(&stripped, &item.generated_lines)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_tail_removes_every_occurrence() {
        assert_eq!(strip_tail("a\nb\nc\n", &lines(&["b"])).unwrap(), "a\n\nc\n");
        // Over-broad on purpose: substrings of unrelated lines go too.
        assert_eq!(
            strip_tail("abc\nb\nbob\n", &lines(&["b"])).unwrap(),
            "ac\n\no\n"
        );
    }

    #[test]
    fn test_strip_tail_is_literal() {
        let program = "x = a.b\nprint(x*2)\naxb\n";
        let stripped = strip_tail(program, &lines(&["print(x*2)", "a.b"])).unwrap();
        assert_eq!(stripped, "x = \n\naxb\n");
    }

    #[test]
    fn test_strip_tail_empty_tail_is_identity() {
        assert_eq!(strip_tail("keep me", &[]).unwrap(), "keep me");
        assert_eq!(strip_tail("keep me", &lines(&["", ""])).unwrap(), "keep me");
    }

    #[test]
    fn test_strip_tail_with_blank_tail_lines() {
        assert_eq!(
            strip_tail("def f():\n    return 1\n", &lines(&["", "    return 1"])).unwrap(),
            "def f():\n\n"
        );
        assert_eq!(strip_tail("abc", &lines(&["", "b"])).unwrap(), "ac");
        assert_eq!(strip_tail("abc", &lines(&["b", "", "c"])).unwrap(), "a");
    }

    #[test]
    fn test_reconstruct_script_with_blank_tail_line() {
        let item = EvaluationItem::new(
            "x = 1\n\ny = x\n",
            lines(&["", "y = x"]),
            lines(&["", "y = 2"]),
        );
        assert_eq!(reconstruct_script(&item).unwrap(), "x = 1\n\n\n\n\ny = 2");
    }

    #[test]
    fn test_reattach_tail() {
        assert_eq!(
            reattach_tail("x = 1\n", &lines(&["y = 2", "z = 3"])),
            "x = 1\n\ny = 2\nz = 3"
        );
    }

    #[test]
    fn test_trim_trailing_close_braces() {
        assert_eq!(
            trim_trailing_close_braces("int main() {\n  return 0;\n}\n"),
            "int main() {\n  return 0;"
        );
        assert_eq!(trim_trailing_close_braces("} }\n"), "");
        assert_eq!(trim_trailing_close_braces("x;\t"), "x;\t");
    }

    #[test]
    fn test_balance_braces_appends_only() {
        let program = "int f() {\n if (x) {\n y();";
        let balanced = balance_braces(program);
        assert_eq!(balanced, format!("{program}}}}}"));
        assert_eq!(brace_depth(&balanced), 0);
    }

    #[test]
    fn test_balance_braces_leaves_negative_depth() {
        assert_eq!(balance_braces("}}"), "}}");
        assert_eq!(balance_braces("{}"), "{}");
    }

    #[test]
    fn test_reconstruct_braced_two_open_scopes() {
        let item = EvaluationItem::new(
            "int main() {\n  for (;;) {\n    x++;\n    break;\n  }\n}\n",
            lines(&["    break;", "  }"]),
            lines(&["    x--;", "    y++;"]),
        );
        let program = reconstruct_braced(&item).unwrap();
        assert_eq!(
            program,
            "int main() {\n  for (;;) {\n    x++;\n\n    x--;\n    y++;}}"
        );
        assert_eq!(brace_depth(&program), 0);
    }

    #[test]
    fn test_reconstruct_script() {
        let item = EvaluationItem::new(
            "def f():\n    return 1\n",
            lines(&["    return 1"]),
            lines(&["    return 2"]),
        );
        assert_eq!(
            reconstruct_script(&item).unwrap(),
            "def f():\n\n\n    return 2"
        );
    }
}
