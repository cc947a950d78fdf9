use crate::error::SyntaxError;

pub const OPEN: &str = "(";
pub const CLOSE: &str = ")";

/// Split command text into a flat token list.
///
/// Words are split on whitespace. A word with an odd number of `"` opens a
/// string region that runs until the next word with an odd count; its words
/// are rejoined with single spaces. Afterwards leading `(` and trailing `)`
/// are peeled off every non-string word, and trailing `)` off string words.
pub fn tokenize(text: &str) -> Result<Vec<String>, SyntaxError> {
    let mut words: Vec<String> = Vec::new();
    let mut in_string = false;
    for word in text.split_whitespace() {
        let odd_quotes = word.matches('"').count() % 2 == 1;
        match (in_string, odd_quotes) {
            (true, _) => {
                if let Some(last) = words.last_mut() {
                    last.push(' ');
                    last.push_str(word);
                }
                if odd_quotes {
                    in_string = false;
                }
            }
            (false, true) => {
                words.push(word.to_string());
                in_string = true;
            }
            (false, false) => words.push(word.to_string()),
        }
    }
    if in_string {
        return Err(SyntaxError::UnterminatedString);
    }

    let mut tokens = Vec::with_capacity(words.len() * 2);
    for word in &words {
        let mut rest = word.as_str();
        if !rest.starts_with('"') {
            while let Some(stripped) = rest.strip_prefix('(') {
                tokens.push(OPEN.to_string());
                rest = stripped;
            }
        }
        let body = rest.trim_end_matches(')');
        let closes = rest.len() - body.len();
        if !body.is_empty() {
            tokens.push(body.to_string());
        }
        tokens.extend(std::iter::repeat_n(CLOSE.to_string(), closes));
    }
    Ok(tokens)
}

/// Join tokens back into text: one space between tokens, none after `(` or
/// before `)`.
pub fn detokenize(tokens: &[String]) -> String {
    let mut text = String::new();
    for token in tokens {
        if !text.is_empty() && token != CLOSE && !text.ends_with('(') {
            text.push(' ');
        }
        text.push_str(token);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"(set-name (interval 3 4.7 5.0 "d" "focus_bird") "b")"#;

    #[test]
    fn splits_parens_from_words() -> Result<(), SyntaxError> {
        let tokens = tokenize(SAMPLE)?;
        assert_eq!(tokens.len(), 12);
        assert_eq!(tokens[0], "(");
        assert_eq!(tokens[1], "set-name");
        assert_eq!(tokens[5], "4.7");
        assert_eq!(tokens[8], "\"focus_bird\"");
        assert_eq!(tokens[9], ")");
        assert_eq!(tokens[11], ")");
        Ok(())
    }

    #[test]
    fn keeps_spaces_inside_strings() -> Result<(), SyntaxError> {
        let tokens = tokenize(r#"string "spaces   preserved""#)?;
        assert_eq!(tokens, vec!["string", "\"spaces preserved\""]);

        let tokens = tokenize(r#"(x "a (b c)")"#)?;
        assert_eq!(tokens, vec!["(", "x", "\"a (b c)\"", ")"]);
        Ok(())
    }

    #[test]
    fn splits_stacked_parens() -> Result<(), SyntaxError> {
        let tokens = tokenize("((a)) ()")?;
        assert_eq!(tokens, vec!["(", "(", "a", ")", ")", "(", ")"]);
        Ok(())
    }

    #[test]
    fn unterminated_string_fails() {
        assert_eq!(
            tokenize(r#"(set-name "open string)"#),
            Err(SyntaxError::UnterminatedString)
        );
    }

    #[test]
    fn detokenize_is_read_back_by_tokenize() -> Result<(), SyntaxError> {
        let tokens: Vec<String> = [
            "(", "merge-next", "#:target", "(", "interval-pair", "#:index", "0", "#:name",
            "null", "#:next-name", "null", ")", "#:new-name", "\"b c\"", ")",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let text = detokenize(&tokens);
        assert_eq!(
            text,
            r#"(merge-next #:target (interval-pair #:index 0 #:name null #:next-name null) #:new-name "b c")"#
        );
        assert_eq!(tokenize(&text)?, tokens);
        Ok(())
    }
}
