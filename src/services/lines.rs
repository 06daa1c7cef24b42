//! # 줄 단위 문서 뷰 (line-anchored document)
//!
//! 문서 내용, 줄 번호, 줄에 붙은 댓글이 항상 같은 줄을 가리키도록 유지하는 모듈입니다.
//!
//! 규칙:
//! - 줄 번호는 저장하지 않습니다. 렌더링할 때마다 `content.split('\n')`으로 새로 계산합니다.
//! - 렌더링된 HTML과 줄 번호가 붙은 원문은 같은 `split_lines` 결과에서 만들어집니다.
//! - 댓글이 달린 줄 집합은 댓글 목록이 바뀔 때마다 처음부터 다시 계산합니다.
//! - 문서에 없는 줄 번호를 가리키는 댓글도 허용합니다. 강조/이동만 하지 않습니다.
//!
//! 이 모듈의 함수는 모두 동기 함수이며 부수효과가 없습니다.

use crate::error::AppError;
use crate::models::{Comment, NewComment};
use crate::services::markdown::{render_markdown, RenderOptions};
use serde::Serialize;
use std::collections::BTreeSet;

/// 원문의 한 줄. 문서 내용을 빌려 쓰므로 복사가 일어나지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1부터 시작하는 줄 번호
    pub number: u32,
    /// 줄 내용 (`\n` 제외, 빈 문자열일 수 있음)
    pub text: &'a str,
}

/// 내용을 줄 단위로 나눕니다.
///
/// 빈 문자열은 빈 줄 하나가 되고, 끝의 개행 뒤에도 빈 줄이 하나 생깁니다.
/// 같은 입력에는 항상 같은 결과를 돌려줍니다.
pub fn split_lines(content: &str) -> Vec<Line<'_>> {
    content
        .split('\n')
        .zip(1u32..)
        .map(|(text, number)| Line { number, text })
        .collect()
}

/// 줄 번호를 가진 대상 (댓글 등)
pub trait LineAnchor {
    fn anchor_line(&self) -> i64;
}

impl LineAnchor for Comment {
    fn anchor_line(&self) -> i64 {
        self.line
    }
}

impl LineAnchor for NewComment {
    fn anchor_line(&self) -> i64 {
        self.line
    }
}

impl LineAnchor for i64 {
    fn anchor_line(&self) -> i64 {
        *self
    }
}

impl LineAnchor for u32 {
    fn anchor_line(&self) -> i64 {
        i64::from(*self)
    }
}

/// 원문 보기의 한 줄 (API 응답, 페이지 템플릿에서 사용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
    pub number: u32,
    pub text: String,
    /// 이 줄에 댓글이 하나 이상 있는지
    pub annotated: bool,
}

/// 같은 줄 나누기 결과에서 만든 두 가지 보기
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    /// 마크다운 엔진이 만든 HTML
    pub html: String,
    /// 줄 번호가 붙은 원문. `lines[i].number == i + 1`
    pub lines: Vec<SourceLine>,
}

impl RenderedView {
    /// 원문 보기의 줄을 다시 이어 붙입니다. 항상 원래 내용과 같아야 합니다.
    pub fn source_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 댓글이 달린 줄 표시를 다시 계산합니다. 이전 표시는 모두 지워집니다.
    pub fn apply_annotations(&mut self, annotated: &AnnotatedView) {
        for line in &mut self.lines {
            line.annotated = annotated.is_annotated(line.number);
        }
    }
}

/// 줄 선택 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub line: u32,
    /// 선택한 줄이 현재 문서에 실제로 있는지. false면 강조는 하지 않습니다.
    pub resolved: bool,
}

/// 댓글이 달린 줄 번호 집합
///
/// 문서 범위를 벗어난 번호도 그대로 포함합니다. 해당 줄이 없으니 표시만 되지 않을 뿐입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotatedView {
    lines: BTreeSet<i64>,
}

impl AnnotatedView {
    pub fn is_annotated(&self, line: u32) -> bool {
        self.lines.contains(&i64::from(line))
    }

    /// 오름차순 줄 번호
    pub fn lines(&self) -> impl Iterator<Item = i64> + '_ {
        self.lines.iter().copied()
    }
}

/// 문서 내용 하나에 대한 줄 단위 보기
#[derive(Debug, Clone)]
pub struct LineAnchoredDocument<'a> {
    content: &'a str,
    lines: Vec<Line<'a>>,
}

impl<'a> LineAnchoredDocument<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            lines: split_lines(content),
        }
    }

    pub fn content(&self) -> &'a str {
        self.content
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 줄 번호로 줄을 찾습니다. 범위를 벗어나면 None.
    pub fn line(&self, number: i64) -> Option<&Line<'a>> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.lines.get(index)
    }

    /// HTML과 줄 번호 원문을 함께 만듭니다. 댓글 표시는 아직 비어 있습니다.
    pub fn render(&self, options: &RenderOptions) -> RenderedView {
        RenderedView {
            html: render_markdown(self.content, options),
            lines: self
                .lines
                .iter()
                .map(|line| SourceLine {
                    number: line.number,
                    text: line.text.to_string(),
                    annotated: false,
                })
                .collect(),
        }
    }

    /// 줄을 선택합니다.
    ///
    /// 1 미만은 잘못된 입력입니다. 문서에 없는 양수 줄 번호는 성공하되 `resolved`가 false입니다.
    pub fn select_line(&self, number: i64) -> Result<Selection, AppError> {
        let line = u32::try_from(number)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| AppError::BadRequest("Line number must be positive".to_string()))?;

        Ok(Selection {
            line,
            resolved: self.line(number).is_some(),
        })
    }

    /// 댓글 목록 전체로 댓글 달린 줄 집합을 계산합니다.
    ///
    /// 이전 결과를 재사용하지 않으므로 같은 목록에는 항상 같은 집합이 나옵니다.
    pub fn attach_comments<A: LineAnchor>(&self, comments: &[A]) -> AnnotatedView {
        AnnotatedView {
            lines: comments.iter().map(LineAnchor::anchor_line).collect(),
        }
    }

    /// 댓글을 현재 문서의 줄로 옮깁니다. 해당 줄이 없으면 None이며, 호출자는 아무것도 하지 않습니다.
    pub fn project_comment_to_line<A: LineAnchor>(&self, comment: &A) -> Option<u32> {
        self.line(comment.anchor_line()).map(|line| line.number)
    }

    /// 렌더링과 댓글 표시를 한 번에 수행합니다.
    pub fn render_annotated<A: LineAnchor>(
        &self,
        comments: &[A],
        options: &RenderOptions,
    ) -> (RenderedView, AnnotatedView) {
        let annotated = self.attach_comments(comments);
        let mut view = self.render(options);
        view.apply_annotations(&annotated);
        (view, annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn comment(line: i64, text: &str) -> Comment {
        Comment {
            id: format!("c{}", line),
            line,
            text: text.to_string(),
            author: "Anonymous".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn title_and_body_become_two_lines() {
        let lines = split_lines("# Title\nBody text");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Line { number: 1, text: "# Title" });
        assert_eq!(lines[1], Line { number: 2, text: "Body text" });
    }

    #[test]
    fn empty_content_is_one_empty_line() {
        let lines = split_lines("");
        assert_eq!(lines, vec![Line { number: 1, text: "" }]);
    }

    #[test]
    fn line_count_matches_newline_split() {
        for content in ["a", "a\n", "\n\n", "a\r\nb", "x\n\ny\n", "한글\n줄"] {
            let lines = split_lines(content);
            assert_eq!(lines.len(), content.split('\n').count(), "{:?}", content);
            for (index, line) in lines.iter().enumerate() {
                assert_eq!(line.number as usize, index + 1);
            }
        }
    }

    #[test]
    fn trailing_newline_yields_trailing_empty_line() {
        let lines = split_lines("one\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn splitting_is_idempotent() {
        let content = "# Doc\n\n- a\n- b";
        assert_eq!(split_lines(content), split_lines(content));
    }

    #[test]
    fn source_view_round_trips_content() {
        let content = "# Title\n\n```rust\nfn main() {}\n```\nlast";
        let document = LineAnchoredDocument::new(content);
        let view = document.render(&RenderOptions::default());
        assert_eq!(view.source_text(), content);
        assert_eq!(view.lines.len(), document.line_count());
        assert!(view.html.contains("<h1>Title</h1>"));
    }

    #[test]
    fn select_line_rejects_non_positive_numbers() {
        let document = LineAnchoredDocument::new("a\nb");
        assert_eq!(
            document.select_line(0).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert!(document.select_line(-1).is_err());
    }

    #[test]
    fn select_line_beyond_document_still_succeeds() {
        let document = LineAnchoredDocument::new("a\nb");
        assert_eq!(
            document.select_line(2).unwrap(),
            Selection { line: 2, resolved: true }
        );
        assert_eq!(
            document.select_line(9).unwrap(),
            Selection { line: 9, resolved: false }
        );
    }

    #[test]
    fn duplicate_comment_lines_collapse() {
        let document = LineAnchoredDocument::new("1\n2\n3\n4\n5");
        let comments = vec![comment(2, "a"), comment(2, "b"), comment(5, "c")];
        let annotated = document.attach_comments(&comments);
        assert_eq!(annotated.lines().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn annotation_ignores_order_and_repetition() {
        let document = LineAnchoredDocument::new("1\n2\n3");
        let forward = vec![comment(3, "late"), comment(1, "early")];
        let backward = vec![comment(1, "early"), comment(3, "late")];
        let first = document.attach_comments(&forward);
        assert_eq!(first, document.attach_comments(&forward));
        assert_eq!(first, document.attach_comments(&backward));
    }

    #[test]
    fn annotation_set_keeps_lines_outside_document() {
        let document = LineAnchoredDocument::new("only line");
        let annotated = document.attach_comments(&[1i64, 40]);
        assert_eq!(annotated.lines().collect::<Vec<_>>(), vec![1, 40]);

        let (view, _) = document.render_annotated(&[1i64, 40], &RenderOptions::default());
        assert_eq!(view.lines.len(), 1);
        assert!(view.lines[0].annotated);
    }

    #[test]
    fn refreshing_annotations_clears_stale_marks() {
        let document = LineAnchoredDocument::new("a\nb\nc");
        let (mut view, _) = document.render_annotated(&[1i64, 2], &RenderOptions::default());
        view.apply_annotations(&document.attach_comments(&[3i64]));
        let marked: Vec<u32> = view
            .lines
            .iter()
            .filter(|line| line.annotated)
            .map(|line| line.number)
            .collect();
        assert_eq!(marked, vec![3]);
    }

    #[test]
    fn projecting_missing_line_is_not_found() {
        let content = "# Title\nBody text";
        let document = LineAnchoredDocument::new(content);
        assert_eq!(document.project_comment_to_line(&comment(2, "ok")), Some(2));
        assert_eq!(document.project_comment_to_line(&comment(3, "gone")), None);
        assert_eq!(document.project_comment_to_line(&comment(0, "zero")), None);
        assert_eq!(document.content(), content);
        assert_eq!(document.line_count(), 2);
    }
}
