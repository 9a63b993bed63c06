//! Events that drive the conversation

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Transport events
    /// User asked to (re)start the flow
    Start,
    UserText {
        text: String,
    },
    /// Menu button pressed; payload is the option id
    Selection {
        payload: String,
    },

    // Generation events
    GenerationComplete {
        user_text: String,
        reply: String,
    },
    GenerationFailed {
        message: String,
    },
}

#[cfg(test)]
impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Event::UserText { text: text.into() }
    }

    pub fn selection(payload: impl Into<String>) -> Self {
        Event::Selection {
            payload: payload.into(),
        }
    }
}

impl Event {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::UserText { .. } => "user_text",
            Event::Selection { .. } => "selection",
            Event::GenerationComplete { .. } => "generation_complete",
            Event::GenerationFailed { .. } => "generation_failed",
        }
    }
}
