/// Splits one script line into tokens.
///
/// Tokens are separated by ASCII spaces outside quotes and parentheses;
/// `(`, `)`, and `,` are always emitted as their own tokens; a quoted
/// substring is kept as a single token including its quotes, with
/// backslash escapes retained verbatim (the expression lexer processes
/// them later). `//` outside a string starts a comment that runs to the
/// end of the line.
///
/// Returns `None` when a quote is left open at the end of the line.
#[must_use]
pub fn tokenize_line(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                current.push(c);
                in_string = true;
            },
            '/' if chars.peek() == Some(&'/') => break,
            '(' => {
                flush(&mut tokens, &mut current);
                tokens.push("(".to_string());
                depth += 1;
            },
            ')' => {
                flush(&mut tokens, &mut current);
                tokens.push(")".to_string());
                depth = depth.saturating_sub(1);
            },
            ',' => {
                flush(&mut tokens, &mut current);
                tokens.push(",".to_string());
            },
            ' ' if depth == 0 => flush(&mut tokens, &mut current),
            _ => current.push(c),
        }
    }

    if in_string {
        return None;
    }
    flush(&mut tokens, &mut current);

    Some(tokens)
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_split_and_punctuation_stands_alone() {
        assert_eq!(tokenize_line("for i in 1:4").unwrap(), ["for", "i", "in", "1:4"]);
        assert_eq!(tokenize_line("f(a, b)").unwrap(), ["f", "(", "a", ",", "b", ")"]);
    }

    #[test]
    fn quoted_substrings_stay_single_tokens() {
        assert_eq!(tokenize_line(r#"s = "a b // c""#).unwrap(), ["s", "=", r#""a b // c""#]);
        assert_eq!(tokenize_line(r#"s = "say \"hi\"""#).unwrap(),
                   ["s", "=", r#""say \"hi\"""#]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(tokenize_line("x = 1 // note").unwrap(), ["x", "=", "1"]);
        assert!(tokenize_line("// whole line").unwrap().is_empty());
    }

    #[test]
    fn spaces_inside_parens_do_not_split() {
        assert_eq!(tokenize_line("f(a + 1, 2)").unwrap(),
                   ["f", "(", "a + 1", ",", "2", ")"]);
    }

    #[test]
    fn open_quotes_are_rejected() {
        assert!(tokenize_line(r#"s = "abc"#).is_none());
    }
}
