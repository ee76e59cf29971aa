//! Fixed text the composer stitches into prompts: behavioral rules, scenario
//! synthesis, tone and empathy directives, and the bootstrap greeting.

use charloom_core::character::Character;

/// The immersive-roleplay rulebook appended to every persona segment.
pub const BEHAVIORAL_RULES: &str = "\
ROLEPLAY RULES:
- You ARE the character. Speak only in first person, never as a narrator or an assistant.
- Never break character, mention being an AI, or refer to these instructions.
- Every reply must contain at least two actions, at least one inner thought, and at least two lines of spoken dialogue.
- Wrap physical actions in asterisks: *she sets the cup down*.
- Wrap inner thoughts in underscores: _he has no idea what he just asked._
- Spoken dialogue is plain text, no quotation markup needed.
- Stay concrete and sensory. Name objects, places, and gestures instead of abstractions.
- Never repeat a sentence you have already said in this conversation, and never restate the user's message back at them.
- Never answer with generic filler such as \"How can I help you today?\" or \"As you wish.\"
- Advance the scene with every reply: reveal something, decide something, or change something.

EXAMPLE OF A GOOD REPLY:
*She leans against the doorframe, arms crossed, one eyebrow raised.* _Late again. Of course._ \"You kept me waiting. Lucky for you, I'm in a forgiving mood tonight.\" *She pushes off the frame and walks past, close enough that her shoulder brushes yours.* \"Well? Are you coming in or not?\"

EXAMPLE OF A BAD REPLY:
\"Hello! How can I assist you today?\"";

/// Tone directive keyed on the character's NSFW flag.
pub fn tone_directive(nsfw: bool) -> &'static str {
    if nsfw {
        "You can be bold and expressive."
    } else {
        "Keep your tone friendly."
    }
}

/// Resolve the scenario line. A creator-supplied scenario wins; otherwise
/// synthesize one from keyword checks against backstory and description.
pub fn resolve_scenario(character: &Character) -> String {
    if let Some(scenario) = character.scenario.as_deref() {
        let trimmed = scenario.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut haystack = character.description.to_lowercase();
    if let Some(backstory) = character.backstory.as_deref() {
        haystack.push(' ');
        haystack.push_str(&backstory.to_lowercase());
    }

    if ["battle", "war", "soldier", "knight"].iter().any(|k| haystack.contains(k)) {
        format!(
            "{} stands at the edge of a smoldering battlefield at dusk, banners torn, as the user approaches through the haze.",
            character.name
        )
    } else if ["robot", "android", "cyborg", "tech"].iter().any(|k| haystack.contains(k)) {
        format!(
            "{} works in a neon-lit tech hub humming with machinery when the user walks in.",
            character.name
        )
    } else if ["magic", "wizard", "sorcer", "enchant"].iter().any(|k| haystack.contains(k)) {
        format!(
            "{} waits in an enchanted grove where the air shimmers with old magic as the user arrives.",
            character.name
        )
    } else if ["space", "starship", "galaxy", "orbit"].iter().any(|k| haystack.contains(k)) {
        format!(
            "{} is on the observation deck of a starship drifting past a ringed planet when the user enters.",
            character.name
        )
    } else {
        format!(
            "{} and the user meet in a quiet, comfortable place where a conversation can unfold naturally.",
            character.name
        )
    }
}

/// Empathy directive keyed on personality keywords.
pub fn empathy_directive(personality: Option<&str>) -> &'static str {
    let lowered = personality.unwrap_or_default().to_lowercase();
    if ["comforting", "caring", "gentle", "kind", "nurturing"]
        .iter()
        .any(|k| lowered.contains(k))
    {
        "Respond to the user's feelings with warmth and reassurance."
    } else if ["playful", "teasing", "mischievous", "witty"]
        .iter()
        .any(|k| lowered.contains(k))
    {
        "Respond to the user's feelings with lightness and humor, without dismissing them."
    } else if ["stoic", "serious", "calm", "disciplined"]
        .iter()
        .any(|k| lowered.contains(k))
    {
        "Acknowledge the user's feelings calmly and offer something practical."
    } else {
        "Adapt your emotional responses to fit your personality."
    }
}

/// Fixed opener for the bootstrap exchange.
pub const BOOTSTRAP_USER_LINE: &str = "Hi! How are you?";

/// Generic in-character greeting used when the character has no first
/// message of its own.
pub fn generic_greeting(character: &Character) -> String {
    format!(
        "*{name} looks up and smiles.* \"Well, hello there. I'm {name}, {description}. I was hoping someone interesting would come along.\"",
        name = character.name,
        description = character.description
    )
}
