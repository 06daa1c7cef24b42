//! # 마크다운 렌더링 서비스
//!
//! 마크다운 → HTML 변환은 `pulldown-cmark`에 맡기고, 이 모듈은 옵션과 후처리만 담당합니다.
//!
//! 이 모듈의 함수들:
//! - `render_markdown()`: GFM 확장, 줄바꿈 처리, 코드 하이라이트를 적용해 HTML 생성
//! - `is_safe_url()`: 링크/이미지 주소가 스크립트를 실행할 수 없는 주소인지 확인
//! - `escape_html()`: HTML 특수문자 이스케이프
//! - `page_title()`: 문서 첫 줄로 페이지 제목 생성
//! - `download_filename()`: 문서 첫 줄로 다운로드 파일 이름 생성
//! - `is_markdown_file()`: 불러온 파일이 마크다운 파일인지 확인

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::sync::Arc;
use thiserror::Error;

/// 코드 하이라이트 실패. 실패해도 코드 블록은 하이라이트 없이 그대로 표시됩니다.
#[derive(Debug, Error)]
#[error("cannot highlight code block: {0}")]
pub struct HighlightError(pub String);

/// 코드 블록 하이라이터
///
/// 반환하는 문자열은 이미 이스케이프된 HTML이어야 합니다.
pub trait CodeHighlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: Option<&str>) -> Result<String, HighlightError>;
}

/// 렌더링 옵션
///
/// 같은 내용과 같은 옵션이면 항상 같은 HTML이 나옵니다.
#[derive(Clone)]
pub struct RenderOptions {
    /// 표, 취소선, 체크리스트, 각주 (GitHub Flavored Markdown)
    pub gfm: bool,
    /// 문단 안의 단일 개행을 `<br />`로 변환
    pub breaks: bool,
    /// false면 문서 안의 원시 HTML을 텍스트로 이스케이프합니다.
    pub allow_raw_html: bool,
    /// 없으면 `language-*` 클래스만 붙여 브라우저 쪽 하이라이터에 맡깁니다.
    pub highlighter: Option<Arc<dyn CodeHighlighter>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: true,
            allow_raw_html: false,
            highlighter: None,
        }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("gfm", &self.gfm)
            .field("breaks", &self.breaks)
            .field("allow_raw_html", &self.allow_raw_html)
            .field("highlighter", &self.highlighter.is_some())
            .finish()
    }
}

impl RenderOptions {
    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
        } else {
            Options::empty()
        }
    }
}

/// 마크다운을 HTML로 렌더링합니다.
///
/// pulldown-cmark의 이벤트 스트림을 한 번 걸러서:
/// - 코드 블록은 하이라이터를 거쳐 직접 HTML로 만들고
/// - `breaks`가 켜져 있으면 SoftBreak를 HardBreak로 바꾸고
/// - 원시 HTML을 허용하지 않으면 텍스트로 바꿉니다 (push_html이 이스케이프함).
/// - 허용되지 않은 스킴의 링크/이미지 주소는 `#`으로 바꿉니다.
pub fn render_markdown(content: &str, options: &RenderOptions) -> String {
    let parser = Parser::new_ext(content, options.parser_options());

    let mut events = Vec::new();
    // 코드 블록 안에 있는 동안 (언어, 누적된 코드)를 들고 있습니다.
    let mut code_block: Option<(Option<String>, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                code_block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = code_block.take() {
                    let block = code_block_html(&code, lang.as_deref(), options);
                    events.push(Event::Html(block.into()));
                }
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Link {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            })),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Image {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            })),
            Event::SoftBreak if options.breaks => events.push(Event::HardBreak),
            Event::Html(raw) | Event::InlineHtml(raw) if !options.allow_raw_html => {
                events.push(Event::Text(raw));
            }
            other => events.push(other),
        }
    }

    let mut output = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());
    output
}

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// 상대 경로, `#` 앵커, http/https/mailto 주소만 허용합니다.
///
/// 브라우저는 스킴 앞뒤의 공백과 제어 문자를 무시하므로 그것들을 빼고 비교합니다.
pub fn is_safe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect();

    // 첫 `/ ? #` 앞에 `:`이 없으면 스킴이 없는 상대 주소입니다.
    let head_end = normalized
        .find(['/', '?', '#'])
        .unwrap_or(normalized.len());
    match normalized[..head_end].find(':') {
        None => true,
        Some(colon) => {
            let scheme = &normalized[..colon];
            SAFE_SCHEMES
                .iter()
                .any(|safe| scheme.eq_ignore_ascii_case(safe))
        }
    }
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        tracing::debug!("Dropped unsafe link target");
        CowStr::Borrowed("#")
    }
}

fn code_block_html(code: &str, lang: Option<&str>, options: &RenderOptions) -> String {
    let class = lang
        .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
        .unwrap_or_default();

    let highlighted = options.highlighter.as_ref().and_then(|highlighter| {
        highlighter
            .highlight(code, lang)
            .map_err(|e| tracing::debug!("{}", e))
            .ok()
    });

    match highlighted {
        Some(body) => format!("<pre><code{} data-highlighted=\"yes\">{}</code></pre>\n", class, body),
        None => format!("<pre><code{}>{}</code></pre>\n", class, escape_html(code)),
    }
}

/// HTML 특수문자(`& < > " '`)를 엔티티로 바꿉니다.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// 첫 줄에서 앞쪽 `#` 제목 표시와 공백을 제거합니다.
fn first_line_heading(content: &str) -> &str {
    content
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim_start_matches('#')
        .trim_start()
}

/// 페이지 제목: 첫 줄 앞 50자 + " - mdspace"
pub fn page_title(content: &str) -> String {
    let heading: String = first_line_heading(content).chars().take(50).collect();
    format!("{} - mdspace", heading)
}

/// 다운로드 파일 이름
///
/// 첫 줄 앞 50자에서 영문자/숫자가 아닌 문자를 `_`로 바꾸고 `.md`를 붙입니다.
/// 첫 줄이 비어 있으면 `markdown.md`가 됩니다.
pub fn download_filename(content: &str) -> String {
    let stem: String = first_line_heading(content)
        .trim()
        .chars()
        .take(50)
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();

    if stem.is_empty() {
        "markdown.md".to_string()
    } else {
        format!("{}.md", stem)
    }
}

/// 확장자(`.md`, `.markdown`, 대소문자 무관)나 `text/markdown` 타입이면 마크다운 파일로 봅니다.
pub fn is_markdown_file(file_name: &str, content_type: Option<&str>) -> bool {
    let by_type = content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/markdown"));

    let by_extension = file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"));

    by_type || by_extension
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UppercaseHighlighter;

    impl CodeHighlighter for UppercaseHighlighter {
        fn highlight(&self, code: &str, _lang: Option<&str>) -> Result<String, HighlightError> {
            Ok(escape_html(&code.to_uppercase()))
        }
    }

    struct BrokenHighlighter;

    impl CodeHighlighter for BrokenHighlighter {
        fn highlight(&self, _code: &str, lang: Option<&str>) -> Result<String, HighlightError> {
            Err(HighlightError(lang.unwrap_or("auto").to_string()))
        }
    }

    #[test]
    fn renders_gfm_tables_and_strikethrough() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~", &RenderOptions::default());
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn single_newlines_become_breaks() {
        let html = render_markdown("first\nsecond", &RenderOptions::default());
        assert!(html.contains("first<br />"));

        let options = RenderOptions {
            breaks: false,
            ..RenderOptions::default()
        };
        assert!(!render_markdown("first\nsecond", &options).contains("<br"));
    }

    #[test]
    fn raw_html_is_escaped_by_default() {
        let html = render_markdown("<script>alert(1)</script>", &RenderOptions::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    /// `href="..."`, `src="..."` 속성 값들
    fn link_targets(html: &str) -> Vec<String> {
        let mut targets = Vec::new();
        for attr in ["href=\"", "src=\""] {
            let mut rest = html;
            while let Some(start) = rest.find(attr) {
                rest = &rest[start + attr.len()..];
                let end = rest.find('"').unwrap();
                targets.push(rest[..end].to_string());
                rest = &rest[end..];
            }
        }
        targets
    }

    #[test]
    fn script_links_are_neutralized() {
        let options = RenderOptions::default();
        for source in [
            "[click](javascript:alert(document.domain))",
            "[click](JavaScript:alert(1))",
            "<javascript:alert(1)>",
            "![img](data:text/html;base64,PHNjcmlwdD4=)",
            "[x](vbscript:msgbox)",
            "[ref]\n\n[ref]: javascript:alert(1)",
        ] {
            let html = render_markdown(source, &options);
            let targets = link_targets(&html);
            assert!(!targets.is_empty(), "{} -> {}", source, html);
            assert!(targets.iter().all(|t| t == "#"), "{} -> {}", source, html);
        }
        assert_eq!(
            render_markdown("[click](javascript:alert(1))", &options),
            "<p><a href=\"#\">click</a></p>\n"
        );
    }

    #[test]
    fn ordinary_links_are_kept() {
        let html = render_markdown(
            "[a](https://example.com/x?y=1) [b](/view/abcd1234) [c](#top) [d](mailto:me@example.com) [e](notes/a:b.md)",
            &RenderOptions::default(),
        );
        assert!(html.contains("href=\"https://example.com/x?y=1\""));
        assert!(html.contains("href=\"/view/abcd1234\""));
        assert!(html.contains("href=\"#top\""));
        assert!(html.contains("href=\"mailto:me@example.com\""));
        assert!(html.contains("href=\"notes/a:b.md\""));
    }

    #[test]
    fn safe_url_rules() {
        assert!(is_safe_url("HTTPS://example.com"));
        assert!(is_safe_url("relative/path"));
        assert!(is_safe_url(""));
        assert!(!is_safe_url(" javascript:alert(1)"));
        assert!(!is_safe_url("file:///etc/passwd"));
    }

    #[test]
    fn code_blocks_keep_language_class() {
        let html = render_markdown("```rust\nlet x = 1 < 2;\n```", &RenderOptions::default());
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">let x = 1 &lt; 2;\n</code></pre>\n"
        );
    }

    #[test]
    fn highlighter_output_is_used() {
        let options = RenderOptions {
            highlighter: Some(Arc::new(UppercaseHighlighter)),
            ..RenderOptions::default()
        };
        let html = render_markdown("```\nabc\n```", &options);
        assert!(html.contains("ABC"));
        assert!(html.contains("data-highlighted"));
    }

    #[test]
    fn failing_highlighter_falls_back_to_plain_code() {
        let options = RenderOptions {
            highlighter: Some(Arc::new(BrokenHighlighter)),
            ..RenderOptions::default()
        };
        let html = render_markdown("```js\nconst a = '<b>';\n```", &options);
        assert!(html.contains("const a = &#39;&lt;b&gt;&#39;;"));
        assert!(!html.contains("data-highlighted"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let content = "# T\n\n- [x] done\n- [ ] todo\n\n```py\nprint(1)\n```";
        let options = RenderOptions::default();
        assert_eq!(render_markdown(content, &options), render_markdown(content, &options));
    }

    #[test]
    fn page_title_strips_heading_markers() {
        assert_eq!(page_title("## Release notes\nbody"), "Release notes - mdspace");
        assert_eq!(page_title(&"x".repeat(80)), format!("{} - mdspace", "x".repeat(50)));
    }

    #[test]
    fn download_filename_replaces_unsafe_characters() {
        assert_eq!(download_filename("# My Notes: v2!\nrest"), "My_Notes__v2_.md");
        assert_eq!(download_filename("###\nbody"), "markdown.md");
        assert_eq!(download_filename(""), "markdown.md");
        assert_eq!(download_filename("# 회의록"), "___.md");
    }

    #[test]
    fn markdown_files_are_recognized_by_extension_or_type() {
        assert!(is_markdown_file("notes.md", None));
        assert!(is_markdown_file("README.MARKDOWN", Some("application/octet-stream")));
        assert!(is_markdown_file("paste", Some("text/markdown; charset=utf-8")));
        assert!(!is_markdown_file("notes.txt", Some("text/plain")));
        assert!(!is_markdown_file("md", None));
    }
}
