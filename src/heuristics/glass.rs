use super::DamageKeywords;

/// Classify damage text as glass-only
///
/// Glass-only means at least one glass term or glass phrase and no
/// body-part term outside a glass phrase. The text is split on anything
/// that isn't a letter so "windshield-crack" and "windshield, crack" read
/// the same.
pub fn is_glass_only(text: &str, keywords: &DamageKeywords) -> bool {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let mut in_phrase = vec![false; words.len()];
    for phrase in &keywords.glass_phrases {
        let parts: Vec<&str> = phrase.split_whitespace().collect();
        if parts.is_empty() || parts.len() > words.len() {
            continue;
        }
        for start in 0..=words.len() - parts.len() {
            let matches = parts
                .iter()
                .zip(&words[start..])
                .all(|(p, w)| *p == w.as_str());
            if matches {
                in_phrase[start..start + parts.len()].fill(true);
            }
        }
    }

    let mentions_glass = in_phrase.iter().any(|&p| p)
        || words
            .iter()
            .any(|w| keywords.glass_terms.iter().any(|g| g == w));
    let mentions_body = words
        .iter()
        .zip(&in_phrase)
        .filter(|(_, in_phrase)| !**in_phrase)
        .any(|(w, _)| keywords.body_terms.iter().any(|b| b == w));

    mentions_glass && !mentions_body
}
