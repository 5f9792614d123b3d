//! crates/mooproof_core/src/ui/state.rs
//!
//! The event-driven controller behind the proofreading page.
//!
//! The page owns a single `UiState` and feeds every user action and network
//! completion through `transition`. The returned effects are the calls the
//! page must make and the alerts it must show; the state itself never talks
//! to the network.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::chat_session::ChatSession;
use crate::domain::ChatRole;
use crate::extract::{self, FileKind};
use crate::word_count;

use super::render::render_feedback;

const ERROR_TITLE: &str = "Error";
const LIMIT_TITLE: &str = "Limit reached";
const ENTER_TEXT: &str = "Please enter some text to proof.";
const SELECT_FILE: &str = "Please select a file to upload.";
const SUBMIT_UNREACHABLE: &str = "Failed to connect to the proofing service. Please try again.";
const CHAT_UNREACHABLE: &str = "Failed to connect to the chat service. Please try again.";
const CHAT_LIMIT: &str = "You have reached the maximum number of questions for this submission.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Paste,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    ResultsShown,
    ErrorShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Hidden,
    Idle,
    Sending,
    Exhausted,
}

/// A file read in the browser and waiting to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    /// Decoded text for `.txt`, base64 for everything else.
    pub payload: String,
}

/// The body of a submit response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReply {
    pub success: bool,
    pub error: String,
    pub feedback: String,
    pub remaining: i64,
    pub word_count: u32,
    pub paper_text: String,
}

/// The body of a chat response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub success: bool,
    pub error: String,
    pub reply: String,
    pub remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    TabSelected(Tab),
    TextEdited(String),
    FileChosen { name: String, bytes: Vec<u8> },
    SubmitClicked,
    SubmitCompleted(SubmitReply),
    /// The submit call never produced a response.
    SubmitFailed,
    ChatSendClicked(String),
    ChatCompleted(ChatReply),
    /// The chat call never produced a response.
    ChatFailed,
    ResetClicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    CallSubmitPaper {
        paper_text: String,
        filename: Option<String>,
    },
    CallSendChat {
        message: String,
        paper_text: String,
        feedback: String,
        /// Prior turns only; the new question travels in `message`.
        chat_history: String,
    },
    Alert {
        title: String,
        message: String,
    },
}

impl UiEffect {
    fn alert(title: &str, message: impl Into<String>) -> Self {
        UiEffect::Alert {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub tab: Tab,
    pub phase: Phase,
    pub chat_phase: ChatPhase,
    pub max_words: u32,
    pub draft: String,
    pub word_count: u32,
    pub staged_file: Option<StagedFile>,
    pub submit_enabled: bool,
    /// Last quota figure the server reported; `None` when unlimited or unknown.
    pub submissions_remaining: Option<u32>,
    pub feedback: String,
    pub feedback_html: String,
    /// The text the follow-up chat is grounded on.
    pub paper_text: String,
    pub chat: ChatSession,
    in_flight_text: Option<String>,
}

impl UiState {
    /// Creates the state for a freshly loaded page.
    pub fn new(max_words: u32, chat_limit: u32) -> Self {
        Self {
            tab: Tab::Paste,
            phase: Phase::Idle,
            chat_phase: ChatPhase::Hidden,
            max_words,
            draft: String::new(),
            word_count: 0,
            staged_file: None,
            submit_enabled: true,
            submissions_remaining: None,
            feedback: String::new(),
            feedback_html: String::new(),
            paper_text: String::new(),
            chat: ChatSession::new(chat_limit),
            in_flight_text: None,
        }
    }

    /// Whether the live word counter should be flagged.
    pub fn is_over_word_limit(&self) -> bool {
        self.max_words > 0 && self.word_count > self.max_words
    }

    pub fn input_visible(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::ErrorShown)
    }

    pub fn chat_input_enabled(&self) -> bool {
        self.chat_phase == ChatPhase::Idle
    }

    pub fn chat_remaining(&self) -> u32 {
        self.chat.remaining()
    }

    /// The conversation as rendered message bubbles.
    pub fn chat_messages_html(&self) -> Vec<(ChatRole, String)> {
        self.chat
            .history()
            .iter()
            .filter(|turn| turn.role != ChatRole::Other)
            .map(|turn| (turn.role, render_feedback(&turn.content)))
            .collect()
    }
}

/// Applies one event, returning the next state and the effects to run.
pub fn transition(mut state: UiState, event: UiEvent) -> (UiState, Vec<UiEffect>) {
    let mut effects = Vec::new();

    match event {
        UiEvent::TabSelected(tab) => {
            if state.input_visible() {
                state.tab = tab;
            }
        }

        UiEvent::TextEdited(text) => {
            state.word_count = word_count::count_words(&text);
            state.draft = text;
        }

        UiEvent::FileChosen { name, bytes } => match FileKind::from_filename(&name) {
            Ok(kind) => {
                let payload = match kind {
                    FileKind::Txt => extract::decode_text(&bytes),
                    FileKind::Docx => STANDARD.encode(&bytes),
                };
                state.staged_file = Some(StagedFile { name, payload });
            }
            Err(err) => {
                state.staged_file = None;
                effects.push(UiEffect::alert(ERROR_TITLE, err.to_string()));
            }
        },

        UiEvent::SubmitClicked => {
            if !state.input_visible() || !state.submit_enabled {
                return (state, effects);
            }

            let (paper_text, filename) = match state.tab {
                Tab::Paste => {
                    let text = state.draft.trim();
                    if text.is_empty() {
                        effects.push(UiEffect::alert(ERROR_TITLE, ENTER_TEXT));
                        return (state, effects);
                    }
                    (text.to_string(), None)
                }
                Tab::Upload => match state
                    .staged_file
                    .as_ref()
                    .map(|file| (file.payload.clone(), Some(file.name.clone())))
                {
                    Some(staged) => staged,
                    None => {
                        effects.push(UiEffect::alert(ERROR_TITLE, SELECT_FILE));
                        return (state, effects);
                    }
                },
            };

            state.phase = Phase::Submitting;
            state.submit_enabled = false;
            state.in_flight_text = filename.is_none().then(|| paper_text.clone());
            effects.push(UiEffect::CallSubmitPaper {
                paper_text,
                filename,
            });
        }

        UiEvent::SubmitCompleted(reply) => {
            if state.phase != Phase::Submitting {
                return (state, effects);
            }
            let sent_text = state.in_flight_text.take();
            if reply.remaining >= 0 {
                state.submissions_remaining = Some(reply.remaining as u32);
            }
            state.submit_enabled = reply.remaining != 0;

            if !reply.success || !reply.error.is_empty() {
                state.phase = Phase::ErrorShown;
                effects.push(UiEffect::alert(ERROR_TITLE, reply.error));
            } else {
                state.phase = Phase::ResultsShown;
                state.feedback_html = render_feedback(&reply.feedback);
                state.feedback = reply.feedback;
                state.paper_text = if reply.paper_text.is_empty() {
                    sent_text.unwrap_or_default()
                } else {
                    reply.paper_text
                };
                state.chat.clear();
                state.chat_phase = if state.chat.is_exhausted() {
                    ChatPhase::Exhausted
                } else {
                    ChatPhase::Idle
                };
            }
        }

        UiEvent::SubmitFailed => {
            if state.phase != Phase::Submitting {
                return (state, effects);
            }
            state.in_flight_text = None;
            state.phase = Phase::ErrorShown;
            state.submit_enabled = true;
            effects.push(UiEffect::alert(ERROR_TITLE, SUBMIT_UNREACHABLE));
        }

        UiEvent::ChatSendClicked(message) => {
            let message = message.trim();
            if message.is_empty() || state.chat_phase != ChatPhase::Idle {
                return (state, effects);
            }

            let chat_history = state.chat.to_json();
            if state.chat.begin_turn(message).is_err() {
                state.chat_phase = ChatPhase::Exhausted;
                effects.push(UiEffect::alert(LIMIT_TITLE, CHAT_LIMIT));
                return (state, effects);
            }

            state.chat_phase = ChatPhase::Sending;
            effects.push(UiEffect::CallSendChat {
                message: message.to_string(),
                paper_text: state.paper_text.clone(),
                feedback: state.feedback.clone(),
                chat_history,
            });
        }

        UiEvent::ChatCompleted(reply) => {
            if state.chat_phase != ChatPhase::Sending {
                return (state, effects);
            }
            if !reply.success || !reply.error.is_empty() {
                state.chat.abandon_turn();
                effects.push(UiEffect::alert(ERROR_TITLE, reply.error));
            } else {
                state.chat.complete_turn(reply.reply);
            }
            state.chat_phase = settled_chat_phase(&state.chat);
        }

        UiEvent::ChatFailed => {
            if state.chat_phase != ChatPhase::Sending {
                return (state, effects);
            }
            state.chat.abandon_turn();
            state.chat_phase = settled_chat_phase(&state.chat);
            effects.push(UiEffect::alert(ERROR_TITLE, CHAT_UNREACHABLE));
        }

        UiEvent::ResetClicked => {
            if !matches!(state.phase, Phase::ResultsShown | Phase::ErrorShown) {
                return (state, effects);
            }
            let limit = state.chat.limit();
            let remaining = state.submissions_remaining;
            state = UiState::new(state.max_words, limit);
            state.submissions_remaining = remaining;
            state.submit_enabled = remaining != Some(0);
        }
    }

    (state, effects)
}

fn settled_chat_phase(chat: &ChatSession) -> ChatPhase {
    if chat.is_exhausted() {
        ChatPhase::Exhausted
    } else {
        ChatPhase::Idle
    }
}
