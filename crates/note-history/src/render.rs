//! Rendering of edit scripts for history views.

use crate::diff::{EditKind, EditOp};

/// Render a script as an HTML fragment with `<del>`/`<ins>` highlights.
pub fn diff_html(script: &[EditOp]) -> String {
    script
        .iter()
        .map(|op| {
            let escaped = html_escape(&op.text);
            match op.kind {
                EditKind::Delete => format!(r#"<del class="diff-delete">{}</del>"#, escaped),
                EditKind::Insert => format!(r#"<ins class="diff-insert">{}</ins>"#, escaped),
                EditKind::Equal => escaped,
            }
        })
        .collect()
}

/// Render a script as plain text, marking deletions `[-like this-]` and
/// insertions `{+like this+}`.
pub fn diff_markers(script: &[EditOp]) -> String {
    let mut out = String::new();
    for op in script {
        match op.kind {
            EditKind::Delete => {
                out.push_str("[-");
                out.push_str(&op.text);
                out.push_str("-]");
            }
            EditKind::Insert => {
                out.push_str("{+");
                out.push_str(&op.text);
                out.push_str("+}");
            }
            EditKind::Equal => out.push_str(&op.text),
        }
    }
    out
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_html_marks_changes() {
        let script = vec![EditOp::equal("a "), EditOp::delete("b"), EditOp::insert("c")];
        assert_eq!(
            diff_html(&script),
            r#"a <del class="diff-delete">b</del><ins class="diff-insert">c</ins>"#
        );
    }

    #[test]
    fn test_diff_html_escapes_text() {
        let script = vec![EditOp::insert("<b>\"x\" & 'y'</b>")];
        assert_eq!(
            diff_html(&script),
            r#"<ins class="diff-insert">&lt;b&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/b&gt;</ins>"#
        );
    }

    #[test]
    fn test_diff_markers() {
        let script = vec![EditOp::equal("a "), EditOp::delete("b"), EditOp::insert("c")];
        assert_eq!(diff_markers(&script), "a [-b-]{+c+}");
    }
}
