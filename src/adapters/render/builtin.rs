//! Self-contained HTML portfolio page
//!
//! Emits one HTML document with inline CSS; no scripts and no external
//! resources besides the copied images.

use crate::adapters::render::traits::{PortfolioAsset, PortfolioRenderer};
use crate::domain::options::{LayoutStyle, PortfolioOptions, PortfolioTheme};
use crate::domain::Result;
use async_trait::async_trait;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPortfolioRenderer;

#[async_trait]
impl PortfolioRenderer for BuiltinPortfolioRenderer {
    async fn render(&self, assets: &[PortfolioAsset], options: &PortfolioOptions) -> Result<String> {
        Ok(render_page(assets, options))
    }
}

struct Palette {
    primary: &'static str,
    accent: &'static str,
    background: &'static str,
    text: &'static str,
    card: &'static str,
}

fn palette(theme: PortfolioTheme) -> Palette {
    match theme {
        PortfolioTheme::Professional => Palette {
            primary: "#2563eb",
            accent: "#f59e0b",
            background: "#ffffff",
            text: "#1e293b",
            card: "#ffffff",
        },
        PortfolioTheme::Creative => Palette {
            primary: "#db2777",
            accent: "#7c3aed",
            background: "#fdf4ff",
            text: "#3b0764",
            card: "#ffffff",
        },
        PortfolioTheme::Minimal => Palette {
            primary: "#000000",
            accent: "#525252",
            background: "#ffffff",
            text: "#171717",
            card: "#fafafa",
        },
        PortfolioTheme::Dark => Palette {
            primary: "#38bdf8",
            accent: "#a78bfa",
            background: "#0f172a",
            text: "#f1f5f9",
            card: "#1e293b",
        },
        PortfolioTheme::Gallery => Palette {
            primary: "#111827",
            accent: "#9ca3af",
            background: "#f3f4f6",
            text: "#111827",
            card: "#ffffff",
        },
    }
}

fn layout_css(layout: LayoutStyle) -> &'static str {
    match layout {
        LayoutStyle::Grid => {
            ".assets { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1.5rem; }"
        }
        LayoutStyle::Masonry => {
            ".assets { column-count: 3; column-gap: 1.5rem; } .asset { break-inside: avoid; margin-bottom: 1.5rem; }"
        }
        LayoutStyle::List => {
            ".assets { display: flex; flex-direction: column; gap: 1rem; } .asset { display: flex; gap: 1rem; } .asset img { max-width: 320px; }"
        }
    }
}

fn render_page(assets: &[PortfolioAsset], options: &PortfolioOptions) -> String {
    let colors = palette(options.theme);
    let title = escape_html(&options.title);
    let mut html = String::new();

    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">\n<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    let _ = writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    );
    let _ = writeln!(html, "<title>{title}</title>");
    let _ = writeln!(html, "<style>");
    let _ = writeln!(
        html,
        ":root {{ --primary: {}; --accent: {}; --background: {}; --text: {}; --card: {}; }}",
        colors.primary, colors.accent, colors.background, colors.text, colors.card
    );
    html.push_str(
        "body { margin: 0; font-family: system-ui, sans-serif; background: var(--background); color: var(--text); }\n\
         header { padding: 3rem 2rem; background: linear-gradient(135deg, var(--primary), var(--accent)); color: #fff; }\n\
         main { padding: 2rem; }\n\
         .asset { background: var(--card); border-radius: 8px; overflow: hidden; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }\n\
         .asset img { width: 100%; display: block; }\n\
         .asset .info { padding: 0.75rem 1rem; }\n\
         .asset dl { font-size: 0.85rem; margin: 0.5rem 0 0; }\n\
         footer { padding: 2rem; text-align: center; font-size: 0.85rem; }\n",
    );
    let _ = writeln!(html, "{}", layout_css(options.layout));
    let _ = writeln!(html, "</style>\n</head>");
    let _ = writeln!(
        html,
        "<body class=\"theme-{} layout-{}\">",
        options.theme.as_str(),
        options.layout.as_str()
    );

    let _ = writeln!(html, "<header>\n<h1>{title}</h1>");
    if let Some(subtitle) = &options.subtitle {
        let _ = writeln!(html, "<p class=\"subtitle\">{}</p>", escape_html(subtitle));
    }
    if let Some(description) = &options.description {
        let _ = writeln!(html, "<p class=\"description\">{}</p>", escape_html(description));
    }
    let _ = writeln!(html, "</header>");

    let _ = writeln!(html, "<main>\n<section class=\"assets\">");
    for asset in assets {
        render_asset(&mut html, asset, options.show_metadata);
    }
    let _ = writeln!(html, "</section>\n</main>");

    let footer = options
        .footer_text
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| format!("{} assets", assets.len()));
    let _ = writeln!(html, "<footer>{footer}</footer>");
    let _ = writeln!(html, "</body>\n</html>");

    html
}

fn render_asset(html: &mut String, asset: &PortfolioAsset, show_metadata: bool) {
    let title = escape_html(&asset.title);
    let _ = writeln!(html, "<article class=\"asset\" id=\"asset-{}\">", escape_html(&asset.file_id));
    let _ = writeln!(
        html,
        "<img src=\"{}\" alt=\"{title}\" loading=\"lazy\">",
        escape_html(&asset.image_path)
    );
    let _ = writeln!(html, "<div class=\"info\">\n<h2>{title}</h2>");

    if show_metadata {
        let _ = writeln!(html, "<dl>");
        let _ = writeln!(
            html,
            "<dt>Created</dt><dd>{}</dd>",
            asset.created_at.format("%Y-%m-%d")
        );
        let _ = writeln!(html, "<dt>Size</dt><dd>{:.1} KB</dd>", asset.size as f64 / 1024.0);
        for (key, value) in &asset.metadata {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let _ = writeln!(
                html,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(key),
                escape_html(&value)
            );
        }
        let _ = writeln!(html, "</dl>");
    }

    let _ = writeln!(html, "</div>\n</article>");
}

/// Escapes text for use in HTML content and quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
