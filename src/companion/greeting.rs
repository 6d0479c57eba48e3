use crate::companion::random::{choose, RandomSource};
use crate::companion::responder::Emotion;
use serde::Serialize;

pub const GREETINGS: [&str; 3] = [
    "Hello! I'm Khushi, your AI companion for this mission. How are you feeling today? May I help you with anything?",
    "Good to see you! I'm Khushi, here to support your mental health. How can I assist you today?",
    "Welcome! I'm Khushi, your personal AI assistant. How are you feeling? I'm here to help in any way I can.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Greeting {
    pub text: String,
    pub emotion: Emotion,
}

/// One of [`GREETINGS`], chosen uniformly. Always `happy`.
pub fn pick_greeting(random: &dyn RandomSource) -> Greeting {
    let text = choose(random, &GREETINGS).copied().unwrap_or(GREETINGS[0]);
    Greeting {
        text: text.to_string(),
        emotion: Emotion::Happy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::random::FixedRandom;

    #[test]
    fn test_pick_greeting() {
        assert_eq!(pick_greeting(&FixedRandom(0.0)).text, GREETINGS[0]);
        assert_eq!(pick_greeting(&FixedRandom(0.4)).text, GREETINGS[1]);
        let last = pick_greeting(&FixedRandom(0.9));
        assert_eq!(last.text, GREETINGS[2]);
        assert_eq!(last.emotion, Emotion::Happy);
    }
}
