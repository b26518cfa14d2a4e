const MAX_LEN: usize = 500;

/// Escapes angle brackets and caps the result at 500 characters.
///
/// Everything else, whitespace included, is preserved as typed.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_LEN));
    let mut count = 0;
    for c in input.chars() {
        let piece = match c {
            '<' => "&lt;",
            '>' => "&gt;",
            _ => {
                if count == MAX_LEN {
                    break;
                }
                out.push(c);
                count += 1;
                continue;
            }
        };
        for p in piece.chars() {
            if count == MAX_LEN {
                return out;
            }
            out.push(p);
            count += 1;
        }
    }
    out
}
