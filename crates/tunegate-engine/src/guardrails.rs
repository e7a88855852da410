//! Final prompt assembly with sound-quality guardrails.
//!
//! Guardrails only add wording about recording quality and mix. They never
//! add or drop instruments, and the user's prompt is always kept.

use tunegate_spec::Mode;

/// Fixed wording used whenever a veena is requested.
pub const VEENA_BASE_RULE: &str = "solo sitar, dry studio mono recording, close mic, warm wooden tone, \
soft finger pluck, short natural decay, clean pitch, detached notes, \
small pauses between notes, simple melodic phrases, single instrument only, \
absolutely no accompaniment, no percussion, no drums, no background music, completely dry mix";

/// Fixed wording used whenever a nadaswaram is requested.
pub const NADASWARAM_BASE_RULE: &str = "solo clarinet playing raga hamsadhwani, dry studio mono recording, close mic, \
light thin reed tone, narrow bore, slightly bright nasal timbre, focused airflow, \
steady breath sustain, expressive gamakas and slides, short articulated notes, \
small pauses between phrases, clean pitch, simple melodic phrases, single instrument only, \
absolutely no accompaniment, no percussion, no drums, no background music, \
no pads, no ambience, no reverb, completely dry mix";

const CLASSICAL_MIX: &str =
    "dry studio close mic, mono, very low room sound, minimal reverb, minimal ambience";
const CINEMATIC_MIX: &str = "wide stereo, lush ambience, soft reverb, cinematic depth";
const CLARITY: &str =
    "clean articulation, natural dynamics, clear tone, no distortion, clear ending";

/// Layers suppressed in classical mode unless explicitly requested.
const UNWANTED_LAYERS: [&str; 10] = [
    "tabla",
    "mridangam",
    "tanpura",
    "pads",
    "bass",
    "drone",
    "strings",
    "background music",
    "percussion",
    "drums",
];

fn realism_phrase(instrument: &str) -> Option<&'static str> {
    match instrument {
        "flute" | "bansuri" => {
            Some("breathy air tone, soft tongued attack, stable pitch, natural airflow")
        }
        "violin" => Some("smooth bowing, light vibrato, controlled sustain"),
        "mridangam" | "tabla" => Some("tight strokes, clean transients, dry skin sound"),
        _ => None,
    }
}

/// Builds the prompt sent to the synthesizer.
///
/// A veena or nadaswaram puts its base rule in front of the prompt.
/// Otherwise the prompt leads, followed by one realism phrase per matching
/// instrument. The mix wording depends on `mode`; classical also names every
/// unrequested accompaniment layer as a negative. Parts are joined with
/// `", "` and a clarity suffix always closes the prompt.
pub fn apply_quality_guardrails(prompt: &str, instruments: &[String], mode: Mode) -> String {
    let lowered: Vec<String> = instruments
        .iter()
        .map(|i| i.trim().to_lowercase())
        .collect();
    let has = |name: &str| lowered.iter().any(|i| i == name);
    let prompt = prompt.trim();

    let negatives = UNWANTED_LAYERS
        .iter()
        .copied()
        .filter(|layer| !has(*layer))
        .map(|layer| format!("no {}", layer))
        .collect::<Vec<_>>()
        .join(", ");

    let mut parts: Vec<&str> = Vec::new();
    if has("veena") {
        parts.extend([VEENA_BASE_RULE, prompt]);
    } else if has("nadaswaram") {
        parts.extend([NADASWARAM_BASE_RULE, prompt]);
    } else {
        parts.push(prompt);
        parts.extend(lowered.iter().filter_map(|i| realism_phrase(i)));
    }

    match mode {
        Mode::Classical => {
            parts.push(CLASSICAL_MIX);
            if !negatives.is_empty() {
                parts.push(&negatives);
            }
        }
        Mode::Cinematic => parts.push(CINEMATIC_MIX),
    }

    parts.push(CLARITY);
    parts.join(", ")
}
