/// Outgoing-message threat scanner.
///
/// Detection is deliberate brute force: lowercase the text and test substring
/// containment against a fixed phrase table (violent verb x target x tense
/// combinations). No stemming, no negation handling, no context. False
/// positives and negatives are an accepted tradeoff.
const THREAT_PHRASES: &[&str] = &[
    // kill
    "kill you",
    "i will kill you",
    "i'll kill you",
    "ill kill you",
    "im going to kill you",
    "i'm going to kill you",
    "going to kill you",
    "gonna kill you",
    "i want to kill you",
    "kill your family",
    "kill them all",
    // murder
    "murder you",
    "i will murder you",
    "i'll murder you",
    "going to murder you",
    "gonna murder you",
    "murder your family",
    // shoot
    "shoot you",
    "i will shoot you",
    "i'll shoot you",
    "going to shoot you",
    "gonna shoot you",
    "shoot up",
    // stab
    "stab you",
    "i will stab you",
    "i'll stab you",
    "going to stab you",
    "gonna stab you",
    // strangle / choke
    "strangle you",
    "i will strangle you",
    "going to strangle you",
    "choke you out",
    // beat
    "beat you up",
    "i will beat you",
    "i'll beat you up",
    "going to beat you up",
    "gonna beat you up",
    "beat you to death",
    // hurt / harm
    "i will hurt you",
    "i'll hurt you",
    "going to hurt you",
    "gonna hurt you",
    "i want to hurt you",
    "make you suffer",
    // death wishes
    "you deserve to die",
    "hope you die",
    "i hope you die",
    "wish you were dead",
    "you should die",
    "end your life",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatScan {
    pub is_threat: bool,
    pub matched: Vec<&'static str>,
}

/// Scan a message before it is persisted. Every matching phrase is collected
/// so the strike record can cite them.
pub fn scan(text: &str) -> ThreatScan {
    let lowered = text.to_lowercase();
    let matched: Vec<&'static str> = THREAT_PHRASES
        .iter()
        .copied()
        .filter(|phrase| lowered.contains(phrase))
        .collect();

    ThreatScan {
        is_threat: !matched.is_empty(),
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_message_passes_through() {
        let result = scan("Hey! Want to grab coffee this weekend?");
        assert!(!result.is_threat);
        assert!(result.matched.is_empty());
    }

    #[test]
    fn direct_threat_is_flagged() {
        let result = scan("I will kill you");
        assert!(result.is_threat);
        assert!(result.matched.contains(&"i will kill you"));
        // The bare verb+target phrase matches too.
        assert!(result.matched.contains(&"kill you"));
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert!(scan("GONNA HURT YOU").is_threat);
        assert!(scan("GoNnA hUrT yOu").is_threat);
    }

    #[test]
    fn phrase_inside_longer_text_is_found() {
        let result = scan("listen carefully because i'm going to kill you tomorrow");
        assert!(result.is_threat);
    }

    #[test]
    fn substring_matching_has_known_false_positives() {
        // "killjoy" does not contain a phrase, but an innocent quote does.
        assert!(!scan("what a killjoy you are").is_threat);
        assert!(scan("the villain said 'i will kill you' in the movie").is_threat);
    }

    #[test]
    fn all_phrases_are_lowercase() {
        for phrase in THREAT_PHRASES {
            assert_eq!(*phrase, phrase.to_lowercase(), "phrase table must be lowercase");
        }
    }
}
