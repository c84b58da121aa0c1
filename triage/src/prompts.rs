//! Prompt construction for the two oracle calls.
//!
//! The reasoning prompt embeds the full context bundle and spells out the
//! escalation rules the oracle must honor; the synthesis prompt combines the
//! symptoms, the ESI classification, and the reasoning trace into a request
//! for the final recommendation. Both demand a strict JSON shape.

use crate::context::ReasoningContext;
use crate::model::{EsiLevel, SymptomRecord};
use crate::reasoning::ReasoningOutcome;

fn format_record_line(record: &SymptomRecord, with_status: bool) -> String {
    let date = record.recorded_at.format("%Y-%m-%d");
    if with_status {
        format!(
            "- {} ({}, {}, {})",
            record.free_text, record.urgency_level, record.resolution_status, date
        )
    } else {
        format!("- {} ({}, {})", record.free_text, record.urgency_level, date)
    }
}

fn section_or_placeholder(lines: Vec<String>, placeholder: &str) -> String {
    if lines.is_empty() {
        placeholder.to_string()
    } else {
        lines.join("\n")
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Chain-of-thought reasoning prompt over the full context bundle.
pub fn reasoning_prompt(ctx: &ReasoningContext) -> String {
    let unresolved = section_or_placeholder(
        ctx.unresolved_history
            .iter()
            .take(3)
            .map(|r| format_record_line(r, true))
            .collect(),
        "No unresolved symptoms",
    );
    let related = section_or_placeholder(
        ctx.related_history
            .iter()
            .take(3)
            .map(|r| format_record_line(r, false))
            .collect(),
        "No related symptoms found",
    );
    let recent = section_or_placeholder(
        ctx.recent_history
            .iter()
            .take(5)
            .map(|r| format!("- {}", r.free_text))
            .collect(),
        "No previous history available",
    );
    let guidelines = section_or_placeholder(
        ctx.reference_snippets
            .iter()
            .take(3)
            .map(|s| format!("- {}", truncate_chars(&s.text, 200)))
            .collect(),
        "No reference material found for these symptoms",
    );
    let coded_terms = ctx
        .signals
        .coded_terms
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::new();
    prompt.push_str(
        "You are an expert medical triage assistant. Analyze the following case using \
         step-by-step reasoning.\n\n",
    );
    prompt.push_str(&format!("CURRENT SYMPTOMS: {}\n\n", ctx.current_symptoms));
    prompt.push_str(&format!(
        "UNRESOLVED SYMPTOMS (CRITICAL - these may be related or worsening):\n{unresolved}\n\n"
    ));
    prompt.push_str(&format!("RELATED SYMPTOMS FROM HISTORY:\n{related}\n\n"));
    prompt.push_str(&format!("PATIENT HISTORY (most recent assessments):\n{recent}\n\n"));
    prompt.push_str(&format!("RELEVANT CLINICAL GUIDELINES:\n{guidelines}\n\n"));
    prompt.push_str(&format!("CODED TERMS IDENTIFIED: {coded_terms}\n\n"));
    prompt.push_str(
        "CRITICAL SAFETY CONSIDERATIONS:\n\
         - If current symptoms could be related to unresolved symptoms, consider escalation\n\
         - Coffee ground stool + dizziness/weakness = EMERGENCY (GI bleeding)\n\
         - Blood symptoms + hemodynamic instability = EMERGENCY\n\
         - Worsening of previously unresolved symptoms = higher urgency\n\n",
    );
    prompt.push_str(
        "Provide a structured analysis as JSON with exactly this shape:\n\
         {\n\
         \x20   \"reasoning_steps\": [\n\
         \x20       {\"step\": 1, \"analysis\": \"Initial symptom assessment and red flag identification\", \"findings\": \"...\"},\n\
         \x20       {\"step\": 2, \"analysis\": \"Unresolved symptom correlation and progression analysis\", \"findings\": \"...\"},\n\
         \x20       {\"step\": 3, \"analysis\": \"Clinical guideline application and risk stratification\", \"findings\": \"...\"},\n\
         \x20       {\"step\": 4, \"analysis\": \"Differential diagnosis consideration with historical context\", \"findings\": \"...\"}\n\
         \x20   ],\n\
         \x20   \"red_flags\": [\"list of concerning symptoms including GI bleeding indicators\"],\n\
         \x20   \"risk_factors\": [\"list of risk factors from history and unresolved symptoms\"],\n\
         \x20   \"preliminary_urgency\": \"Emergency|Urgent|Primary Care|Telehealth|Self-Care\",\n\
         \x20   \"confidence\": 0.0\n\
         }\n\n\
         Think through each step carefully, prioritizing patient safety and considering \
         symptom progression.\n",
    );
    prompt
}

/// Final synthesis prompt: symptoms + ESI classification + reasoning trace.
pub fn synthesis_prompt(symptoms: &str, esi: EsiLevel, reasoning: &ReasoningOutcome) -> String {
    let reasoning_json = serde_json::to_string_pretty(reasoning)
        .unwrap_or_else(|_| "(reasoning unavailable)".to_string());

    let mut prompt = String::new();
    prompt.push_str(
        "Based on the comprehensive analysis, provide the final triage recommendation.\n\n",
    );
    prompt.push_str(&format!("SYMPTOMS: {symptoms}\n"));
    prompt.push_str(&format!(
        "ESI CLASSIFICATION: {} - {}\n",
        esi.label(),
        esi.description()
    ));
    prompt.push_str(&format!("REASONING ANALYSIS: {reasoning_json}\n\n"));
    prompt.push_str(
        "Respond as JSON with exactly this shape:\n\
         {\n\
         \x20   \"urgency_level\": \"Emergency|Urgent|Primary Care|Telehealth|Self-Care\",\n\
         \x20   \"explanation\": \"Comprehensive explanation incorporating patient history, clinical guidelines, and ESI classification\",\n\
         \x20   \"confidence\": 0.0,\n\
         \x20   \"next_steps\": {\n\
         \x20       \"action\": \"Specific recommended action\",\n\
         \x20       \"timeframe\": \"When to seek care\",\n\
         \x20       \"additional_info\": \"Additional guidance and precautions\",\n\
         \x20       \"booking_url\": \"Appropriate care booking URL\"\n\
         \x20   }\n\
         }\n\n\
         Ensure the recommendation is consistent with the ESI classification and incorporates \
         patient history patterns.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_signals;
    use crate::model::{ResolutionStatus, RetrievedSnippet, UrgencyLevel};
    use crate::reasoning::fallback_reasoning;
    use chrono::Utc;

    fn sample_context() -> ReasoningContext {
        ReasoningContext {
            current_symptoms: "chest tightness and fatigue".to_string(),
            recent_history: vec![],
            unresolved_history: vec![SymptomRecord {
                id: "u1".to_string(),
                reporter_id: "r1".to_string(),
                free_text: "chest discomfort".to_string(),
                urgency_level: UrgencyLevel::Urgent,
                esi_level: None,
                confidence: None,
                explanation: String::new(),
                resolution_status: ResolutionStatus::Worsened,
                recorded_at: Utc::now(),
            }],
            related_history: vec![],
            reference_snippets: vec![RetrievedSnippet {
                text: "x".repeat(400),
                metadata: serde_json::Value::Null,
                distance: 0.1,
            }],
            similar_case_snippets: vec![],
            signals: extract_signals("chest tightness and fatigue"),
        }
    }

    #[test]
    fn test_reasoning_prompt_sections() {
        let prompt = reasoning_prompt(&sample_context());
        assert!(prompt.contains("CURRENT SYMPTOMS: chest tightness and fatigue"));
        assert!(prompt.contains("chest discomfort (Urgent, Worsened,"));
        assert!(prompt.contains("No related symptoms found"));
        assert!(prompt.contains("No previous history available"));
        assert!(prompt.contains("Coffee ground stool + dizziness/weakness = EMERGENCY"));
        assert!(prompt.contains("\"reasoning_steps\""));
        // Long snippets are truncated for the prompt.
        assert!(prompt.contains(&format!("{}...", "x".repeat(200))));
    }

    #[test]
    fn test_reasoning_prompt_includes_coded_terms() {
        let prompt = reasoning_prompt(&sample_context());
        assert!(prompt.contains("fatigue:84229001"));
    }

    #[test]
    fn test_synthesis_prompt_sections() {
        let reasoning = fallback_reasoning("chest tightness");
        let prompt = synthesis_prompt("chest tightness", EsiLevel::Emergent, &reasoning);
        assert!(prompt.contains("SYMPTOMS: chest tightness"));
        assert!(prompt.contains("ESI CLASSIFICATION: ESI-2"));
        assert!(prompt.contains("\"urgency_level\""));
        assert!(prompt.contains("\"next_steps\""));
        assert!(prompt.contains("Cardiopulmonary symptom detected"));
    }
}
