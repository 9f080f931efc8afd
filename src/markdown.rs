//! A deliberately small Markdown subset for article bodies.
//!
//! Input is escaped exactly once up front; every rule after that only wraps
//! already-escaped text in fixed tags, so neither captured text nor a
//! replacement template can introduce markup of its own.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

enum Rule {
    /// `$n` in the template refers to (escaped) capture groups.
    Replace(Regex, &'static str),
    /// Each run of matching lines becomes one `tag` element with an `<li>`
    /// per line, `marker` stripped.
    List {
        run: Regex,
        marker: Regex,
        tag: &'static str,
    },
}

impl Rule {
    fn apply(&self, html: &str) -> String {
        match self {
            Rule::Replace(pattern, template) => pattern.replace_all(html, *template).into_owned(),
            Rule::List { run, marker, tag } => run
                .replace_all(html, |caps: &Captures| wrap_list(&caps[0], marker, tag))
                .into_owned(),
        }
    }
}

/// Paragraphs starting with one of these are already blocks and stay unwrapped.
const BLOCK_TAGS: [&str; 7] = ["<h1>", "<h2>", "<h3>", "<hr>", "<ul>", "<ol>", "<pre>"];

lazy_static! {
    static ref CODE_BLOCK: Regex = Regex::new(r"(?s)```(.*?)```").unwrap();
    static ref RULES: Vec<Rule> = vec![
        Rule::Replace(Regex::new(r"(?m)^### (.*)$").unwrap(), "<h3>$1</h3>"),
        Rule::Replace(Regex::new(r"(?m)^## (.*)$").unwrap(), "<h2>$1</h2>"),
        Rule::Replace(Regex::new(r"(?m)^# (.*)$").unwrap(), "<h1>$1</h1>"),
        Rule::Replace(Regex::new(r"(?m)^---$").unwrap(), "<hr>"),
        Rule::List {
            run: Regex::new(r"(?m)(?:^(?:- |• ).*(?:\n|$))+").unwrap(),
            marker: Regex::new(r"^(?:- |• )").unwrap(),
            tag: "ul",
        },
        Rule::List {
            run: Regex::new(r"(?m)(?:^\d+\. .*(?:\n|$))+").unwrap(),
            marker: Regex::new(r"^\d+\. ").unwrap(),
            tag: "ol",
        },
        Rule::Replace(Regex::new(r"\*\*(.+?)\*\*").unwrap(), "<strong>$1</strong>"),
        Rule::Replace(Regex::new(r"__(.+?)__").unwrap(), "<strong>$1</strong>"),
        Rule::Replace(Regex::new(r"\*([^*\n]+?)\*").unwrap(), "<em>$1</em>"),
        Rule::Replace(Regex::new(r"\b_([^_\n]+?)_\b").unwrap(), "<em>$1</em>"),
        Rule::Replace(
            Regex::new(r"\[([^\]\n]*)\]\((https?://[^)\s]+)\)").unwrap(),
            r#"<a href="$2" target="_blank" rel="noopener noreferrer">$1</a>"#,
        ),
    ];
}

fn wrap_list(run: &str, marker: &Regex, tag: &str) -> String {
    let items: String = run
        .lines()
        .map(|line| format!("<li>{}</li>", marker.replace(line, "")))
        .collect();
    let tail = if run.ends_with('\n') { "\n" } else { "" };
    format!("<{tag}>{items}</{tag}>{tail}", tag = tag, items = items, tail = tail)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_prose(text: &str, out: &mut String) {
    let mut html = text.to_string();
    for rule in RULES.iter() {
        html = rule.apply(&html);
    }
    for block in html.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
        if BLOCK_TAGS.iter().any(|tag| block.starts_with(tag)) {
            out.push_str(block);
        } else {
            out.push_str("<p>");
            out.push_str(block);
            out.push_str("</p>");
        }
    }
}

/// Fenced code is cut out first and kept verbatim; the rules only see the
/// prose between fences.
pub fn to_html(markdown: &str) -> String {
    let text = escape_html(&markdown.replace("\r\n", "\n"));
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    for caps in CODE_BLOCK.captures_iter(&text) {
        let (fence, code) = match (caps.get(0), caps.get(1)) {
            (Some(fence), Some(code)) => (fence, code),
            _ => continue,
        };
        render_prose(&text[rest..fence.start()], &mut out);
        out.push_str("<pre><code>");
        out.push_str(code.as_str());
        out.push_str("</code></pre>");
        rest = fence.end();
    }
    render_prose(&text[rest..], &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_rules() {
        assert_eq!(
            to_html("# One\n\n## Two\n\n### Three\n\n---"),
            "<h1>One</h1><h2>Two</h2><h3>Three</h3><hr>"
        );
    }

    #[test]
    fn inline_emphasis() {
        assert_eq!(
            to_html("**bold** __also__ *it* _em_ snake_case_name"),
            "<p><strong>bold</strong> <strong>also</strong> <em>it</em> <em>em</em> snake_case_name</p>"
        );
    }

    #[test]
    fn bullet_and_numbered_lists_are_wrapped() {
        assert_eq!(
            to_html("- a\n• b\n\n1. one\n2. two"),
            "<ul><li>a</li><li>b</li></ul><ol><li>one</li><li>two</li></ol>"
        );
    }

    #[test]
    fn links_only_for_web_targets() {
        assert_eq!(
            to_html("[site](https://example.com/a)"),
            "<p><a href=\"https://example.com/a\" target=\"_blank\" rel=\"noopener noreferrer\">site</a></p>"
        );
        assert_eq!(
            to_html("[x](javascript:alert(1))"),
            "<p>[x](javascript:alert(1))</p>"
        );
    }

    #[test]
    fn markup_in_input_is_escaped_before_rules() {
        assert_eq!(
            to_html("<script>alert('x')</script> **&**"),
            "<p>&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; <strong>&amp;</strong></p>"
        );
        assert_eq!(
            to_html("[a\"b](https://e.com/\"onmouseover)"),
            "<p><a href=\"https://e.com/&quot;onmouseover\" target=\"_blank\" rel=\"noopener noreferrer\">a&quot;b</a></p>"
        );
    }

    #[test]
    fn code_blocks_and_paragraphs() {
        assert_eq!(
            to_html("```let x = 1;```\r\n\r\nsecond\n\n\n\nthird"),
            "<pre><code>let x = 1;</code></pre><p>second</p><p>third</p>"
        );
    }

    #[test]
    fn code_is_left_alone_by_inline_rules() {
        assert_eq!(to_html("```**x** _y_```"), "<pre><code>**x** _y_</code></pre>");
        assert_eq!(
            to_html("before **b**\n\n```\n# not a heading\n\n- nor a list\n```\n\nafter"),
            "<p>before <strong>b</strong></p><pre><code>\n# not a heading\n\n- nor a list\n</code></pre><p>after</p>"
        );
    }

    #[test]
    fn heading_followed_by_prose_in_separate_blocks() {
        assert_eq!(
            to_html("## Verdict\n\nWorth it."),
            "<h2>Verdict</h2><p>Worth it.</p>"
        );
    }
}
