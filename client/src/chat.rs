pub const WELCOME_MESSAGE: &str = "Hello! I'm your AI traffic assistant. I can help you with:\n\
• Current traffic conditions\n\
• Route planning\n\
• Incident updates\n\
• Best travel times\n\
\n\
Just ask me anything!";
pub const NO_CITY_MESSAGE: &str =
    "Please select a city first so I can provide you with accurate traffic information.";
pub const APOLOGY_MESSAGE: &str = "Sorry, I'm having trouble connecting right now. Please try again.";

pub fn city_switched_message(city: &str) -> String {
    format!(
        "Switched to {city}. I'm now showing you real-time traffic data for this area. \
         What would you like to know?"
    )
}

pub fn location_found_message(display_name: &str) -> String {
    format!("Found \"{display_name}\". I've zoomed to this location on the map.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Append-only transcript plus the number of assistant requests still in
/// flight. One placeholder shows while that number is above zero.
#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatTurn>,
    pending: usize,
}

impl ChatSession {
    /// Append a turn. The typing placeholder is left alone.
    pub fn push(&mut self, turn: ChatTurn) -> &ChatTurn {
        self.transcript.push(turn);
        &self.transcript[self.transcript.len() - 1]
    }

    /// Register a request. Returns `true` if the placeholder should appear.
    pub fn begin_typing(&mut self) -> bool {
        self.pending += 1;
        self.pending == 1
    }

    /// Resolve a request. Returns `true` if the placeholder should go away.
    pub fn end_typing(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        self.pending == 0
    }

    #[cfg(test)]
    pub fn is_typing(&self) -> bool {
        self.pending > 0
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }
}
