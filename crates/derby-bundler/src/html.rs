//! HTML injector: the `<script>` tag that boots the app in the browser.

use std::fmt::Write;

use crate::app::App;
use crate::{Error, Result};

/// Render the app script tag.
///
/// ```
/// use derby_bundler::script_tag;
///
/// assert_eq!(
///     script_tag("/derby/app-abc.js", false),
///     r#"<script async data-derby-app src="/derby/app-abc.js"></script>"#
/// );
/// ```
pub fn script_tag(url: &str, cross_origin: bool) -> String {
    let mut tag = String::with_capacity(url.len() + 64);
    tag.push_str("<script async data-derby-app src=\"");
    escape_attribute(url, &mut tag);
    tag.push('"');
    if cross_origin {
        // The script host must send Access-Control-Allow-Origin or the
        // browser refuses to run it.
        tag.push_str(" crossorigin");
    }
    tag.push_str("></script>");
    tag
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

impl App {
    /// Script tag for the most recently written bundle.
    pub fn script_tag(&self) -> Result<String> {
        let artifact = self
            .artifact()
            .ok_or_else(|| Error::NotBundled(self.name().to_string()))?;
        Ok(script_tag(
            &artifact.script_url,
            self.config().script_cross_origin,
        ))
    }

    /// Page hook run once the markup is fully rendered: appends the script
    /// tag to the response.
    pub fn on_html_done<W: Write>(&self, res: &mut W) -> Result<()> {
        let tag = self.script_tag()?;
        res.write_str(&tag)?;
        Ok(())
    }
}
