// File: src/services/prompt.rs

use nafanya_common::models::chat::EMOTION_TOKEN;
use nafanya_common::models::InboundMessage;
use crate::crypto::RandomSource;
use crate::Error;

/// Moods a reply can be written in.
pub const EMOTIONS: [&str; 6] = [
    "с нейтральным отношением",
    "с пессимизмом",
    "с оптимизмом",
    "с сарказмом",
    "с раздражением",
    "с жестким негативом",
];

pub fn roll_emotion(rng: &dyn RandomSource) -> Result<&'static str, Error> {
    let idx = rng.below(EMOTIONS.len() as u32)? as usize;
    Ok(EMOTIONS[idx])
}

/// Fills every `{emotion}` token of `template` with one freshly rolled mood.
pub fn compile_system_prompt(template: &str, rng: &dyn RandomSource) -> Result<String, Error> {
    let emotion = roll_emotion(rng)?;
    Ok(template.replace(EMOTION_TOKEN, emotion))
}

/// `"First Last: text"`, preceded by the message being replied to.
/// Bots are shown by first name only.
pub fn build_user_input(msg: &InboundMessage, text: &str) -> String {
    let mut input = String::new();
    if let Some(reply) = &msg.reply_to {
        if !reply.text.is_empty() {
            match &reply.from {
                Some(author) if author.is_bot => {
                    input.push_str(&format!("{}: {}\n", author.first_name, reply.text));
                }
                Some(author) => {
                    input.push_str(&format!("{}: {}\n", author.full_name(), reply.text));
                }
                None => {
                    input.push_str(&reply.text);
                    input.push('\n');
                }
            }
        }
    }
    input.push_str(&format!("{}: {}", msg.from.full_name(), text));
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use nafanya_common::models::{ChatKind, MessageAuthor, RepliedMessage};
    use crate::test_utils::fakes::ScriptedRandom;

    fn author(first: &str, last: Option<&str>, is_bot: bool) -> MessageAuthor {
        MessageAuthor {
            user_id: 7,
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
            username: None,
            is_bot,
        }
    }

    fn message(text: &str, reply_to: Option<RepliedMessage>) -> InboundMessage {
        InboundMessage {
            message_id: 10,
            chat_id: -1,
            chat_kind: ChatKind::Group,
            chat_title: Some("chat".into()),
            chat_first_name: None,
            chat_last_name: None,
            from: author("Ivan", Some("Petrov"), false),
            text: text.to_string(),
            command: None,
            reply_to,
        }
    }

    #[test]
    fn every_emotion_token_gets_the_same_mood() {
        let rng = ScriptedRandom::always(3);
        let out = compile_system_prompt("Answer {emotion}. Really {emotion}!", &rng).unwrap();
        assert_eq!(out, "Answer с сарказмом. Really с сарказмом!");
    }

    #[test]
    fn template_without_token_is_unchanged() {
        let rng = ScriptedRandom::always(0);
        assert_eq!(compile_system_prompt("plain prompt", &rng).unwrap(), "plain prompt");
    }

    #[test]
    fn user_input_names_the_author() {
        let msg = message("how are you?", None);
        assert_eq!(build_user_input(&msg, &msg.text), "Ivan Petrov: how are you?");
    }

    #[test]
    fn replied_message_is_prepended() {
        let reply = RepliedMessage {
            message_id: 9,
            from: Some(author("Нафаня", Some("Bot"), true)),
            text: "I am here".to_string(),
        };
        let msg = message("prove it", Some(reply));
        assert_eq!(build_user_input(&msg, &msg.text), "Нафаня: I am here\nIvan Petrov: prove it");

        let reply = RepliedMessage {
            message_id: 9,
            from: Some(author("Olga", None, false)),
            text: "hi".to_string(),
        };
        let msg = message("hello", Some(reply));
        assert_eq!(build_user_input(&msg, &msg.text), "Olga: hi\nIvan Petrov: hello");
    }
}
