/// Characters that always form a token of their own outside quotes.
const PUNCTUATION: [char; 4] = ['(', ')', ',', ';'];

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// Splits statement text into tokens.
///
/// Whitespace separates tokens, `(` `)` `,` `;` are single-character
/// tokens, and a quoted run (closed by the same quote character) is one
/// token that keeps its quotes.
///
/// ```
/// # use minidb::tokenizer::tokenize;
/// assert_eq!(tokenize("col1, col2 FROM t"), vec!["col1", ",", "col2", "FROM", "t"]);
/// ```
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }

        match c {
            c if is_quote(c) => {
                flush(&mut current, &mut tokens);
                quote = Some(c);
                current.push(c);
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c if PUNCTUATION.contains(&c) => {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);

    tokens
}

/// Splits a whole script on `;` outside quoted runs. Each statement is
/// trimmed, empty ones are dropped, and a trailing statement without `;`
/// is kept.
pub fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in content.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None if is_quote(c) => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ';' => {
                push_trimmed(&mut current, &mut statements);
            }
            None => current.push(c),
        }
    }
    push_trimmed(&mut current, &mut statements);

    statements
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn push_trimmed(current: &mut String, statements: &mut Vec<String>) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// True for a token written as `'...'` or `"..."`.
pub fn is_quoted(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => is_quote(first) && first == last,
        _ => false,
    }
}

/// Removes one layer of matching surrounding quotes, if present.
pub fn unquote(token: &str) -> &str {
    if is_quoted(token) {
        &token[1..token.len() - 1]
    } else {
        token
    }
}
