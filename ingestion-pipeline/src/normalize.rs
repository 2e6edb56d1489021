/// Normalises corpus whitespace ahead of tokenisation: Windows line endings
/// become `\n`, tabs become single spaces, and runs of spaces collapse to one.
/// Newlines are preserved so article boundaries stay visible in chunk text.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\t', " ");

    let mut normalized = String::with_capacity(text.len());
    let mut previous_was_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !previous_was_space {
                normalized.push(ch);
            }
            previous_was_space = true;
        } else {
            normalized.push(ch);
            previous_was_space = false;
        }
    }

    normalized
}
