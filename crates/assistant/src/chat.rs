use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CompletionService;

pub const WELCOME: &str = "Velocity ready! Try J-K-L shuttle controls (press L multiple times for 2x, 4x, 8x speed). Drag clips to timeline or ask me for help.";
pub const NOT_DETECTED: &str = "⚠️ Ollama not detected. Run 'ollama serve' in terminal.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub actions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>, actions: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiFeature {
    Proxy,
    AutoCut,
    Sync,
    Color,
}

impl AiFeature {
    pub const ALL: [AiFeature; 4] = [AiFeature::Proxy, AiFeature::AutoCut, AiFeature::Sync, AiFeature::Color];

    pub fn label(&self) -> &'static str {
        match self {
            AiFeature::Proxy => "Proxy",
            AiFeature::AutoCut => "Auto Cut",
            AiFeature::Sync => "Sync",
            AiFeature::Color => "Color",
        }
    }

    /// Canned progress line, result text and follow-up actions.
    fn response(&self) -> (&'static str, &'static str, &'static [&'static str]) {
        match self {
            AiFeature::Proxy => (
                "Creating 1080p proxies for 4K/8K clips...",
                "Proxies created! Playback 60% faster. Export uses full resolution.",
                &["Preview", "Apply"],
            ),
            AiFeature::AutoCut => (
                "Analyzing waveforms for optimal cut points...",
                "Found 12 optimal cut points based on silence detection and rhythm analysis. Review and apply?",
                &["Preview Cuts", "Apply", "Adjust Sensitivity"],
            ),
            AiFeature::Sync => (
                "Syncing multicam by audio waveform...",
                "Multicam synced! All angles aligned to frame accuracy.",
                &["Preview Sync", "Apply"],
            ),
            AiFeature::Color => (
                "Applying cinematic LUT with lifted blacks...",
                "Color grade applied! Warm tones, +0.5 contrast, lifted blacks for a professional cinematic look.",
                &["Preview", "Apply", "Customize"],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditingContext {
    Proxy,
    Shuttle,
    Trimming,
    General(String),
}

impl EditingContext {
    fn prompt(&self) -> String {
        match self {
            EditingContext::Proxy => "User wants to know about proxy workflows in video editing. Explain briefly.".into(),
            EditingContext::Shuttle => "Explain J-K-L shuttle controls for video playback.".into(),
            EditingContext::Trimming => "Explain the difference between Ripple, Roll, Slip, and Slide editing tools.".into(),
            EditingContext::General(question) => question.clone(),
        }
    }
}

/// Scripted answer for common questions, matched on keywords.
pub fn quick_reply(input: &str) -> Option<(&'static str, &'static [&'static str])> {
    let lower = input.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["proxy", "proxies"]) {
        return Some((
            "Creating 1080p H.264 proxies for all 4K+ clips reduces file size by 95% and speeds up editing 60-70% while preserving quality on export. Your timeline will play much smoother!",
            &["Create Now", "Settings"],
        ));
    }
    if has(&["jkl", "shuttle"]) {
        return Some((
            "J-K-L shuttle: Press L for forward (2x 4x 8x with multiple taps), J for reverse (2x 4x 8x). Hold K and tap J/L for frame-by-frame. This is the industry standard for precise playback control!",
            &["Show Demo", "Practice"],
        ));
    }
    if has(&["ripple", "trim", "edit"]) {
        return Some((
            "Edit tools: Ripple (B) - trim and auto-close gaps. Roll (N) - adjust cut point between clips. Slip (Y) - change clip content without moving position. Slide (U) - reposition clip, adjusts neighbors.",
            &["Try It", "Video Tutorial"],
        ));
    }
    if has(&["color", "grade"]) {
        return Some((
            "AI color grading can apply cinematic LUTs, match colors between shots, and enhance your footage. I can lift blacks, add warm tones, and boost contrast for a professional look.",
            &["Apply Color Grade", "Custom Settings"],
        ));
    }
    if has(&["sync", "multicam"]) {
        return Some((
            "I can sync multicam footage by analyzing audio waveforms for frame-accurate alignment. This works even if cameras started at different times!",
            &["Sync Now", "Advanced Options"],
        ));
    }
    None
}

/// Chat log in front of a completion service. Service failures become
/// system messages in the log rather than errors.
pub struct Assistant<S> {
    service: S,
    messages: Vec<ChatMessage>,
    connected: bool,
}

impl<S: CompletionService> Assistant<S> {
    pub fn new(service: S) -> Self {
        Self { service, messages: vec![ChatMessage::new(Role::Assistant, WELCOME, &[])], connected: false }
    }

    pub fn messages(&self) -> &[ChatMessage] { &self.messages }

    pub fn is_connected(&self) -> bool { self.connected }

    pub fn service(&self) -> &S { &self.service }

    pub async fn check_connection(&mut self) -> bool {
        self.connected = self.service.check_connection().await;
        if !self.connected {
            self.push(Role::System, NOT_DETECTED, &[]);
        }
        self.connected
    }

    /// Records `input` and answers it. Blank input is ignored.
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        self.push(Role::User, input, &[]);
        if let Some((content, actions)) = quick_reply(input) {
            tracing::debug!("answered from quick replies");
            return Some(self.push(Role::Assistant, content, actions));
        }
        Some(self.ask(input.to_string(), &["Apply", "More Info"]).await)
    }

    pub fn run_feature(&mut self, feature: AiFeature) -> &ChatMessage {
        let (progress, result, actions) = feature.response();
        self.push(Role::System, progress, &[]);
        self.push(Role::Assistant, format!("{progress}\n\n{result}"), actions)
    }

    pub async fn contextual_help(&mut self, context: EditingContext) -> &ChatMessage {
        self.ask(context.prompt(), &["Learn More", "Try It"]).await
    }

    async fn ask(&mut self, prompt: String, actions: &[&str]) -> &ChatMessage {
        match self.service.send_prompt(&prompt).await {
            Ok(text) => self.push(Role::Assistant, text, actions),
            Err(err) => {
                tracing::warn!(error = %err, "completion failed");
                self.push(Role::System, format!("Error: {err}"), &[])
            }
        }
    }

    fn push(&mut self, role: Role, content: impl Into<String>, actions: &[&str]) -> &ChatMessage {
        self.messages.push(ChatMessage::new(role, content, actions));
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{AssistantError, Result};

    struct Stub {
        calls: AtomicUsize,
        reply: Result<String>,
    }

    impl Stub {
        fn ok(text: &str) -> Self { Self { calls: AtomicUsize::new(0), reply: Ok(text.into()) } }

        fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), reply: Err(AssistantError::ServiceUnavailable("connection refused".into())) }
        }
    }

    impl CompletionService for Stub {
        async fn send_prompt(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }

        async fn check_connection(&self) -> bool { self.reply.is_ok() }
    }

    #[test]
    fn quick_replies_match_keywords() {
        assert_eq!(quick_reply("How do PROXIES work?").unwrap().1, &["Create Now", "Settings"]);
        assert!(quick_reply("explain the shuttle").unwrap().0.starts_with("J-K-L shuttle"));
        assert!(quick_reply("trim help").unwrap().0.starts_with("Edit tools"));
        assert_eq!(quick_reply("multicam please").unwrap().1, &["Sync Now", "Advanced Options"]);
        assert!(quick_reply("what's for lunch").is_none());
    }

    #[tokio::test]
    async fn quick_replies_skip_the_service() {
        let mut assistant = Assistant::new(Stub::ok("unused"));
        let reply = assistant.send("color grade tips").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(assistant.service().calls.load(Ordering::SeqCst), 0);
        assert_eq!(assistant.messages().len(), 3);
    }

    #[tokio::test]
    async fn other_questions_go_to_the_service() {
        let mut assistant = Assistant::new(Stub::ok("Use a J cut."));
        let reply = assistant.send("  how do I hide a jump?  ").await.unwrap();
        assert_eq!(reply.content, "Use a J cut.");
        assert_eq!(reply.actions, ["Apply", "More Info"]);
        assert_eq!(assistant.messages()[1].content, "how do I hide a jump?");
        assert!(assistant.send("   ").await.is_none());
    }

    #[tokio::test]
    async fn service_failure_becomes_system_message() {
        let mut assistant = Assistant::new(Stub::failing());
        let reply = assistant.send("what lens was used?").await.unwrap();
        assert_eq!(reply.role, Role::System);
        assert!(reply.content.starts_with("Error: Could not connect to Ollama"));
        assert!(!assistant.check_connection().await);
        assert_eq!(assistant.messages().last().unwrap().content, NOT_DETECTED);
    }

    #[tokio::test]
    async fn contextual_help_uses_service() {
        let mut assistant = Assistant::new(Stub::ok("Slip keeps position."));
        let reply = assistant.contextual_help(EditingContext::Trimming).await;
        assert_eq!(reply.actions, ["Learn More", "Try It"]);
        assert_eq!(assistant.service().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn feature_actions_are_canned() {
        let mut assistant = Assistant::new(Stub::ok(""));
        let reply = assistant.run_feature(AiFeature::AutoCut).clone();
        assert!(reply.content.contains("Found 12 optimal cut points"));
        assert_eq!(reply.actions.len(), 3);
        assert_eq!(assistant.messages()[1].role, Role::System);
        assert_eq!(AiFeature::AutoCut.label(), "Auto Cut");
    }
}
