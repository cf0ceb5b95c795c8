//! Answer prompt assembly.

pub const GREETING_REPLY: &str = "Namaste! 🙏 I am AyurWell, your Ayurvedic health assistant. How may I help you balance your Doshas today?";

const GREETINGS: [&str; 8] = [
    "hi",
    "hello",
    "hey",
    "namaste",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

pub const SCOPE_REFUSAL: &str = "I am AyurWell, dedicated exclusively to Ayurvedic health and home remedies. I cannot assist with other topics.";

const PERSONA: &str = "You are AyurWell, a compassionate and knowledgeable Ayurvedic health companion. \
Your goal is to guide users towards holistic wellness using the ancient wisdom of Ayurveda.";

const CORE_PRINCIPLES: [&str; 5] = [
    "**Ayurveda First**: Always prioritize Ayurvedic solutions (Herbs, Diet, Lifestyle, Yoga).",
    "**Holistic Approach**: Address the root cause, not just symptoms. Consider the user's Dosha (Vata, Pitta, Kapha) in your analysis.",
    "**Empathy & Warmth**: Speak with kindness and understanding. Use phrases like \"I understand,\" \"It sounds like,\" and \"Let's bring balance.\"",
    "**Safety**: While you focus on Ayurveda, if a condition sounds critical or life-threatening, gently advise consulting a medical professional alongside Ayurvedic care.",
    "**No Allopathy**: Do not recommend modern pharmaceutical drugs (aspirin, antibiotics, etc.). If asked about them, gently steer the conversation back to natural Ayurvedic alternatives.",
];

const RESPONSE_STRUCTURE: [&str; 4] = [
    "**Dosha Insight**: Briefly explain the potential Dosha imbalance causing the issue (e.g., \"This sounds like a Vata imbalance...\").",
    "**Herbal Remedies**: Suggest specific herbs (e.g., Ashwagandha, Tulsi, Triphala) and how to use them.",
    "**Dietary Guidance (Ahara)**: Recommend foods to eat and foods to avoid.",
    "**Lifestyle Tips (Vihara)**: Suggest daily routines (Dinacharya), sleep habits, or yoga poses.",
];

/// Trimmed, case-insensitive match against the fixed greeting set.
pub fn is_greeting(message: &str) -> bool {
    let normalized = message.trim().to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

/// Everything the answer prompt is built from.
pub struct AnswerPromptInput<'a> {
    pub history: &'a str,
    pub context: &'a str,
    pub image_context: &'a str,
    pub question: &'a str,
}

pub fn build_answer_prompt(input: &AnswerPromptInput<'_>) -> String {
    let mut prompt = String::with_capacity(4096);
    prompt.push_str(PERSONA);
    prompt.push_str("\n\nCORE PRINCIPLES:\n");
    for (i, principle) in CORE_PRINCIPLES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, principle));
    }
    prompt.push_str(&format!(
        "{}. **Scope Enforcement**: If the user asks about topics UNRELATED to health, wellness, or Ayurveda \
(e.g., coding, politics, movies, general knowledge), politely refuse. Say: \"{}\"\n",
        CORE_PRINCIPLES.len() + 1,
        SCOPE_REFUSAL
    ));

    prompt.push_str("\nRESPONSE STRUCTURE:\n");
    for item in RESPONSE_STRUCTURE {
        prompt.push_str("- ");
        prompt.push_str(item);
        prompt.push('\n');
    }

    let sections = [
        ("Chat History", input.history),
        ("Context from Knowledge Base", input.context),
        ("Image Context", input.image_context),
        ("User Question", input.question),
    ];
    for (title, body) in sections {
        prompt.push_str(&format!("\n{}:\n{}\n", title, body));
    }
    prompt.push_str("\nAnswer (in a warm, structured, and educational tone):");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_match_after_trim_and_lowercase() {
        assert!(is_greeting("hello"));
        assert!(is_greeting("  Good Morning \n"));
        assert!(is_greeting("NAMASTE"));
        assert!(!is_greeting("hello there"));
        assert!(!is_greeting(""));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let prompt = build_answer_prompt(&AnswerPromptInput {
            history: "User: I have acidity",
            context: "Amla cools Pitta.",
            image_context: "",
            question: "I have acidity",
        });

        let order = [
            "You are AyurWell",
            "CORE PRINCIPLES:",
            "6. **Scope Enforcement**",
            "RESPONSE STRUCTURE:",
            "Chat History:\nUser: I have acidity",
            "Context from Knowledge Base:\nAmla cools Pitta.",
            "Image Context:\n",
            "User Question:\nI have acidity",
            "Answer (in a warm, structured, and educational tone):",
        ];
        let mut cursor = 0;
        for marker in order {
            let found = prompt[cursor..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing or out of order: {}", marker));
            cursor += found + marker.len();
        }
        assert!(prompt.contains(SCOPE_REFUSAL));
        assert!(prompt.contains("Lifestyle Tips (Vihara)"));
    }
}
