pub const DEFAULT_ECHO_PREFIX: &str = "Echo: ";

/// Maps a user message to the reply text.
///
/// Implementations must be pure: no side effects and no suspension. This is
/// the seam a real model client would plug into.
pub trait ReplyGenerator: Send + Sync {
    fn reply(&self, text: &str) -> String;
}

impl<F> ReplyGenerator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn reply(&self, text: &str) -> String {
        self(text)
    }
}

/// Default responder that prefixes the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResponder {
    prefix: String,
}

impl EchoResponder {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ECHO_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EchoResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyGenerator for EchoResponder {
    fn reply(&self, text: &str) -> String {
        format!("{}{}", self.prefix, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_prefixes_input() {
        assert_eq!(EchoResponder::new().reply("hi"), "Echo: hi");
        assert_eq!(EchoResponder::with_prefix(">> ").reply("hi"), ">> hi");
    }

    #[test]
    fn closures_are_generators() {
        let shout = |text: &str| text.to_uppercase();
        let generator: &dyn ReplyGenerator = &shout;
        assert_eq!(generator.reply("hello"), "HELLO");
    }
}
