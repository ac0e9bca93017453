//! JavaScript evaluated inside the focused tab.
//!
//! XPath lookups go through `document.evaluate` so the locators used by the
//! crawler stay plain XPath strings.

#![cfg_attr(not(feature = "browser"), allow(dead_code))]

/// Serialize every anchor matching an XPath expression as `{href, text}`.
pub fn find_anchors(xpath: &str) -> String {
    format!(
        r#"
        (() => {{
            const snapshot = document.evaluate(
                {xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            const anchors = [];
            for (let i = 0; i < snapshot.snapshotLength; i++) {{
                const el = snapshot.snapshotItem(i);
                anchors.push({{
                    href: el.href || el.getAttribute('href'),
                    text: (el.innerText || el.textContent || '').trim()
                }});
            }}
            return anchors;
        }})()
        "#,
        xpath = js_string(xpath)
    )
}

/// Return the first clickable anchor matching an XPath expression, or null.
///
/// Clickable means attached, rendered with a non-empty box, and not disabled.
pub fn first_clickable(xpath: &str) -> String {
    format!(
        r#"
        (() => {{
            const snapshot = document.evaluate(
                {xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            for (let i = 0; i < snapshot.snapshotLength; i++) {{
                const el = snapshot.snapshotItem(i);
                const rect = el.getBoundingClientRect();
                const rendered = el.isConnected && el.getClientRects().length > 0
                    && rect.width > 0 && rect.height > 0;
                const disabled = el.hasAttribute('disabled')
                    || el.getAttribute('aria-disabled') === 'true';
                if (rendered && !disabled) {{
                    return {{
                        href: el.href || el.getAttribute('href'),
                        text: (el.innerText || el.textContent || '').trim()
                    }};
                }}
            }}
            return null;
        }})()
        "#,
        xpath = js_string(xpath)
    )
}

pub const SCROLL_HEIGHT: &str = "document.body.scrollHeight";

pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Quote a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_is_quoted() {
        let script = find_anchors("//a[contains(@class, 'btn')]");
        assert!(script.contains(r#""//a[contains(@class, 'btn')]""#));
    }

    #[test]
    fn test_quotes_in_xpath_are_escaped() {
        let script = first_clickable(r#"//a[@title="x"]"#);
        assert!(script.contains(r#""//a[@title=\"x\"]""#));
    }
}
