use rand::Rng;

/// Canned responses served when no live backend is reachable, so the UI
/// always gets an answer during local development without credentials.
pub struct FallbackResponder;

const STUDY_BUDDY_RESPONSES: &[&str] = &[
    "Great question! Let me help you understand that concept. As your study companion, I'll break this down step by step for you.",
    "I can explain that! Let's start with the fundamentals and build up from there.",
    "That's an interesting topic to explore. Here's how I'd approach learning this...",
    "Let me help clarify that for you. Think of it this way...",
];

const IDEA_FORGE_RESPONSES: &[&str] = &[
    "Interesting idea! Let me help you develop that further. Here are some angles to consider...",
    "I love where you're going with this! Let's brainstorm how to make it even stronger.",
    "That's a solid foundation. Let's explore the possibilities together.",
    "Great thinking! Here's how we could expand on that concept...",
];

impl FallbackResponder {
    /// One pseudo-randomly chosen canned string from the app's list, or a
    /// generic line for unrecognized app ids.
    pub fn respond(&self, app_id: &str) -> String {
        let responses = match app_id {
            "study-buddy" => STUDY_BUDDY_RESPONSES,
            "idea-forge" => IDEA_FORGE_RESPONSES,
            _ => return format!("Thanks for your message! I'm here to help you with {app_id}."),
        };
        let pick = rand::thread_rng().gen_range(0..responses.len());
        responses[pick].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_apps_answer_from_their_own_list() {
        let responder = FallbackResponder;
        let text = responder.respond("study-buddy");
        assert!(STUDY_BUDDY_RESPONSES.contains(&text.as_str()));

        let text = responder.respond("idea-forge");
        assert!(IDEA_FORGE_RESPONSES.contains(&text.as_str()));
    }

    #[test]
    fn unknown_app_gets_generic_line() {
        let responder = FallbackResponder;
        let text = responder.respond("career-navigator");
        assert!(text.contains("career-navigator"));
    }
}
