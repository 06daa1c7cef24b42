//! # 서버 렌더링 페이지
//!
//! 작성 페이지(composer)와 뷰어 페이지(viewer)의 HTML을 만듭니다.
//! 사용자 입력은 모두 `escape_html`을 거쳐 들어가고, 마크다운 렌더링 결과만 그대로 삽입됩니다.

use crate::models::{Comment, MarkdownResponse, ShareResponse, UserStats};
use crate::services::lines::{LineAnchoredDocument, RenderedView};
use crate::services::markdown::{escape_html, page_title};
use crate::services::viewer::{Notice, NoticeKind, ViewTab, ViewerState};
use chrono::{DateTime, Utc};
use std::fmt::Write;

const HIGHLIGHT_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/highlight.min.js";
const HIGHLIGHT_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/styles/github-dark.min.css";

/// 저장된 시각 문자열을 읽습니다. 형식이 틀리면 None.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// 만료까지 남은 시간: `in 3h 12m`, `in 5m`, 이미 지났으면 `expired`
pub fn format_relative_time(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = target - now;
    if remaining < chrono::Duration::zero() {
        return "expired".to_string();
    }

    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("in {}h {}m", hours, minutes)
    } else {
        format!("in {}m", minutes)
    }
}

fn relative_or_raw(value: &str, now: DateTime<Utc>) -> String {
    parse_timestamp(value)
        .map(|at| format_relative_time(at, now))
        .unwrap_or_else(|| value.to_string())
}

fn short_time(value: &str) -> String {
    parse_timestamp(value)
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| value.to_string())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
<link rel="stylesheet" href="{css}">
</head>
<body>
<header class="site-header"><a class="brand" href="/">mdspace</a></header>
<main>
{body}
</main>
<script src="{js}"></script>
<script>hljs.highlightAll();</script>
</body>
</html>
"#,
        title = escape_html(title),
        css = HIGHLIGHT_CSS,
        js = HIGHLIGHT_JS,
        body = body,
    )
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        None => String::new(),
        Some(notice) => {
            let class = match notice.kind {
                NoticeKind::Success => "success",
                NoticeKind::Error(_) => "error",
            };
            format!(
                "<div class=\"toast {}\" role=\"status\">{}</div>\n",
                class,
                escape_html(&notice.message)
            )
        }
    }
}

/// 작성 페이지 입력
pub struct ComposerPage<'a> {
    pub content: &'a str,
    pub preview_html: Option<String>,
    pub share: Option<&'a ShareResponse>,
    pub stats: &'a UserStats,
    pub notice: Option<&'a Notice>,
    pub now: DateTime<Utc>,
}

pub fn render_composer(page: &ComposerPage<'_>) -> String {
    let mut body = notice_html(page.notice);

    write!(
        body,
        r#"<section class="composer">
<div class="quota">Files: <span id="files-count">{count}</span> / <span id="files-limit">{limit}</span></div>
<form method="post" action="/load" enctype="multipart/form-data" class="drop-zone" id="drop-zone">
<span>Drop a .md file here or</span>
<input type="file" name="file" id="file-input" accept=".md,.markdown,text/markdown">
<button type="submit">Load file</button>
</form>
<form method="post" action="/" class="editor">
<textarea name="content" id="markdown-input" placeholder="Paste or type markdown here...">{content}</textarea>
<div class="actions">
<button type="submit" name="action" value="preview">Preview</button>
<button type="submit" name="action" value="share" class="primary">Share</button>
<a class="button" href="/">Clear</a>
</div>
</form>
"#,
        count = page.stats.files_count,
        limit = page.stats.files_limit,
        content = escape_html(page.content),
    )
    .ok();

    if let Some(share) = page.share {
        write!(
            body,
            r#"<div class="share-result">
<label for="share-link">Share link</label>
<input id="share-link" readonly value="{url}">
<a class="button" href="{url}" target="_blank" rel="noopener">View</a>
<p class="expires-info">Expires {expires}</p>
</div>
"#,
            url = escape_html(&share.share_url),
            expires = relative_or_raw(&share.expires_at, page.now),
        )
        .ok();
    }

    match &page.preview_html {
        Some(html) if !page.content.trim().is_empty() => {
            write!(
                body,
                "<div class=\"preview\" id=\"preview-content\"><div class=\"markdown-body\">{}</div></div>\n",
                html
            )
            .ok();
        }
        _ => body.push_str(
            "<div class=\"preview\" id=\"preview-content\"><div class=\"preview-placeholder\">Your markdown preview will appear here...</div></div>\n",
        ),
    }
    body.push_str("</section>\n<script src=\"/static/composer.js\"></script>\n");

    layout("mdspace", &body)
}

/// 뷰어 페이지 입력
pub struct ViewerPage<'a> {
    pub markdown: &'a MarkdownResponse,
    pub document: &'a LineAnchoredDocument<'a>,
    pub view: &'a RenderedView,
    /// 작성 순서 그대로
    pub comments: &'a [Comment],
    /// 복사용 절대 주소 (`BASE_URL` 기준)
    pub share_url: &'a str,
    pub state: &'a ViewerState,
    pub now: DateTime<Utc>,
}

fn tab_link(id: &str, tab: ViewTab, current: ViewTab, label: &str) -> String {
    format!(
        "<a class=\"view-tab{}\" data-view=\"{}\" href=\"/view/{}?tab={}\">{}</a>",
        if tab == current { " active" } else { "" },
        tab.as_str(),
        escape_html(id),
        tab.as_str(),
        label
    )
}

pub fn render_viewer(page: &ViewerPage<'_>) -> String {
    let markdown = page.markdown;
    let state = page.state;
    let id = escape_html(&markdown.id);
    let mut body = notice_html(state.notice.as_ref());

    // ── 문서 정보와 동작 버튼 ──
    write!(
        body,
        r#"<section class="viewer-meta">
<span>Views: <span id="view-count">{views}</span></span>
<span>Expires: <span id="expires-at">{expires}</span></span>
<div class="actions">
<input class="copy-link" readonly value="{share_url}" aria-label="Link">
<a class="button" id="download-btn" href="/view/{id}/raw">Download</a>
"#,
        views = markdown.views,
        expires = relative_or_raw(&markdown.expires_at, page.now),
        share_url = escape_html(page.share_url),
        id = id,
    )
    .ok();
    if markdown.is_owner {
        write!(
            body,
            "<form method=\"post\" action=\"/view/{}/delete\" class=\"inline\"><button type=\"submit\" id=\"delete-btn\" class=\"danger\">Delete</button></form>\n",
            id
        )
        .ok();
    }
    body.push_str("</div>\n</section>\n");

    // ── 렌더링 / 원문 탭 ──
    write!(
        body,
        "<div class=\"view-tabs\">{}{}</div>\n",
        tab_link(&markdown.id, ViewTab::Rendered, state.tab, "Rendered"),
        tab_link(&markdown.id, ViewTab::Source, state.tab, "Source (for comments)"),
    )
    .ok();
    write!(
        body,
        "<div class=\"view-panel{}\" id=\"rendered-view\"><div class=\"markdown-body\">{}</div></div>\n",
        if state.tab == ViewTab::Rendered { " active" } else { "" },
        page.view.html
    )
    .ok();

    write!(
        body,
        "<div class=\"view-panel{}\" id=\"source-view\"><div class=\"line-numbered-content\">\n",
        if state.tab == ViewTab::Source { " active" } else { "" },
    )
    .ok();
    for line in &page.view.lines {
        let mut classes = String::from("code-line");
        if line.annotated {
            classes.push_str(" has-comment");
        }
        if state.focus_line == Some(line.number) {
            classes.push_str(" focused");
        }
        let text = if line.text.is_empty() {
            " ".to_string()
        } else {
            escape_html(&line.text)
        };
        writeln!(
            body,
            "<div class=\"{classes}\" id=\"L{n}\" data-line=\"{n}\"><a class=\"line-number\" href=\"/view/{id}?tab=source&amp;line={n}#L{n}\">{n}</a><span class=\"line-content\">{text}</span></div>",
            classes = classes,
            n = line.number,
            id = id,
            text = text,
        )
        .ok();
    }
    body.push_str("</div></div>\n");

    // ── 댓글 ──
    write!(
        body,
        "<aside class=\"comments\"><h2>Comments <span id=\"comment-count\">{}</span></h2>\n<div id=\"comments-list\">\n",
        page.comments.len()
    )
    .ok();
    if page.comments.is_empty() {
        body.push_str(
            "<div class=\"comments-empty\">Click on a line number in Source view to add a comment</div>\n",
        );
    }
    for comment in page.comments {
        // 문서에 없는 줄을 가리키는 댓글은 이동 링크 없이 표시합니다.
        let line_label = match page.document.project_comment_to_line(comment) {
            Some(n) => format!(
                "<a class=\"comment-line\" data-line=\"{n}\" href=\"/view/{id}?tab=source&amp;goto={n}#L{n}\">Line {n}</a>",
                n = n,
                id = id
            ),
            None => format!("<span class=\"comment-line missing\">Line {}</span>", comment.line),
        };
        writeln!(
            body,
            "<div class=\"comment-item\" data-line=\"{line}\"><div class=\"comment-meta\">{label}<span>{author} • {created}</span></div><div class=\"comment-text\">{text}</div></div>",
            line = comment.line,
            label = line_label,
            author = escape_html(&comment.author),
            created = short_time(&comment.created_at),
            text = escape_html(&comment.text),
        )
        .ok();
    }
    body.push_str("</div>\n");

    if let Some(line) = state.selected_line {
        write!(
            body,
            r#"<form method="post" action="/view/{id}/comments" id="comment-form" class="comment-form">
<div>Comment on line <span id="comment-line-num">{line}</span></div>
<input type="hidden" name="line" value="{line}">
<input type="text" name="author" id="comment-author" placeholder="Your name (optional)" value="{author}">
<textarea name="text" id="comment-text" placeholder="Write a comment..." autofocus>{text}</textarea>
<div class="actions">
<button type="submit" id="submit-comment-btn" class="primary"{disabled}>{label}</button>
<a class="button" id="cancel-comment-btn" href="/view/{id}?tab=source&amp;goto={line}&amp;cancel=1#L{line}">Cancel</a>
</div>
</form>
"#,
            id = id,
            line = line,
            author = escape_html(&state.draft.author),
            text = escape_html(&state.draft.text),
            disabled = if state.submitting { " disabled" } else { "" },
            label = if state.submitting { "Submitting..." } else { "Submit" },
        )
        .ok();
    }
    body.push_str("</aside>\n");

    layout(&page_title(&markdown.content), &body)
}

pub fn render_not_found() -> String {
    layout(
        "Not found - mdspace",
        r#"<section class="not-found" id="not-found-state">
<h1>Markdown not found</h1>
<p>This document does not exist, has expired, or was deleted.</p>
<a class="button" href="/">Create a new one</a>
</section>
"#,
    )
}
