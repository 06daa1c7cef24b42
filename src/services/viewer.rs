//! # 뷰어 화면 상태
//!
//! 뷰어 페이지의 화면 상태(선택한 탭, 선택한 줄, 댓글 폼, 알림)를 명시적인 구조체로 다룹니다.
//! 페이지 핸들러는 요청(쿼리 파라미터, 폼 제출, 저장 결과)을 `ViewerEvent`로 바꿔
//! `ViewerState::apply`에 넘기고, 최종 상태로 페이지를 그립니다.
//!
//! 상태는 요청마다 새로 만들어지며 전역으로 보관하지 않습니다.

use crate::error::{AppError, ErrorKind};
use crate::models::CreateCommentRequest;
use crate::services::lines::{LineAnchor, LineAnchoredDocument};
use serde::Deserialize;

/// 렌더링 보기 / 원문(줄 번호) 보기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewTab {
    #[default]
    Rendered,
    Source,
}

impl ViewTab {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewTab::Rendered => "rendered",
            ViewTab::Source => "source",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error(ErrorKind),
}

/// 화면 상단에 잠깐 보여주는 알림
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            kind: NoticeKind::Error(err.kind()),
            message: err.public_message(),
        }
    }
}

/// 작성 중인 댓글
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub author: String,
    pub text: String,
}

/// 뷰어에서 일어나는 사용자 동작과 저장 결과
#[derive(Debug)]
pub enum ViewerEvent {
    SwitchTab(ViewTab),
    /// 원문 보기에서 줄 번호를 누름: 댓글 폼을 열고 그 줄로 이동
    ClickLineNumber(i64),
    /// 댓글 목록의 "Line N"을 누름: 그 줄이 있으면 이동
    JumpToComment(i64),
    EditDraft(CommentDraft),
    CancelComment,
    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed(AppError),
    Notify(Notice),
}

/// 뷰어 화면 상태
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub tab: ViewTab,
    /// 댓글을 달 줄. 폼이 닫혀 있으면 None
    pub selected_line: Option<u32>,
    /// 스크롤/강조할 줄. 문서에 실제로 있는 줄만 들어갑니다.
    pub focus_line: Option<u32>,
    pub draft: CommentDraft,
    /// 제출이 진행 중인 동안 true. 이 동안 새 제출은 받지 않습니다.
    pub submitting: bool,
    pub notice: Option<Notice>,
}

impl ViewerState {
    pub fn form_open(&self) -> bool {
        self.selected_line.is_some()
    }

    /// 이벤트를 적용합니다. 받아들이지 않은 이벤트(진행 중 중복 제출 등)는 false를 돌려줍니다.
    pub fn apply(&mut self, document: &LineAnchoredDocument<'_>, event: ViewerEvent) -> bool {
        match event {
            ViewerEvent::SwitchTab(tab) => {
                self.tab = tab;
            }
            ViewerEvent::ClickLineNumber(line) => match document.select_line(line) {
                Ok(selection) => {
                    self.selected_line = Some(selection.line);
                    self.tab = ViewTab::Source;
                    self.focus_line = selection.resolved.then_some(selection.line);
                }
                Err(err) => {
                    self.notice = Some(Notice::error(&err));
                    return false;
                }
            },
            ViewerEvent::JumpToComment(line) => {
                self.tab = ViewTab::Source;
                // 없는 줄이면 아무것도 하지 않습니다.
                if let Some(number) = document.project_comment_to_line(&line) {
                    self.focus_line = Some(number);
                }
            }
            ViewerEvent::EditDraft(draft) => {
                self.draft = draft;
            }
            ViewerEvent::CancelComment => {
                self.selected_line = None;
                self.draft = CommentDraft::default();
            }
            ViewerEvent::SubmitStarted => {
                if self.submitting || self.selected_line.is_none() {
                    return false;
                }
                self.submitting = true;
            }
            ViewerEvent::SubmitSucceeded => {
                self.submitting = false;
                self.selected_line = None;
                self.draft = CommentDraft::default();
                self.notice = Some(Notice::success("Comment added!"));
            }
            ViewerEvent::SubmitFailed(err) => {
                // 폼과 입력 내용은 그대로 둡니다.
                self.submitting = false;
                self.notice = Some(Notice::error(&err));
            }
            ViewerEvent::Notify(notice) => {
                self.notice = Some(notice);
            }
        }
        true
    }

    /// 현재 폼 내용을 댓글 요청으로 바꿉니다. 폼이 닫혀 있으면 None.
    pub fn comment_request(&self) -> Option<CreateCommentRequest> {
        self.selected_line.map(|line| CreateCommentRequest {
            line: line.anchor_line(),
            text: self.draft.text.clone(),
            author: self.draft.author.clone(),
        })
    }
}
