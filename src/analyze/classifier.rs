//! Headline classification: ask the reasoning service for a judgment and
//! collapse either reply shape into one [`SentimentRecord`].
//!
//! The service may answer with a flat judgment
//! `{"impact": .., "reasoning": .., "confidence": ..}` or, for headlines
//! naming several companies, with `{"entities": {"<name>": <flat judgment>, ..}}`.
//! The shape is decided once in [`parse_judgment`]; everything downstream
//! sees only [`RawJudgment`] and then the canonical record.

use serde_json::{Map, Value};

use crate::analyze::ai_adapter::DynReasoningClient;
use crate::error::ClassificationError;
use crate::model::{Impact, SentimentRecord};

pub const SYSTEM_PROMPT: &str = r#"You are a financial analyst providing data for an API. Analyze the news headline and provide a structured JSON response.
- 'impact' must be "Positive", "Negative", or "Neutral".
- 'reasoning' must be a direct, concise financial reason for the impact.
- 'confidence' must be a number between 0.0 and 1.0.
If the headline concerns a single subject, answer {"impact": ..., "reasoning": ..., "confidence": ...}.
If it names several companies, answer {"entities": {"<company>": {"impact": ..., "reasoning": ..., "confidence": ...}, ...}}.
Output only the raw JSON object."#;

pub fn user_message(headline: &str) -> String {
    format!("Analyze this headline: \"{headline}\"")
}

/// One validated flat judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub impact: Impact,
    pub reasoning: String,
    pub confidence: f64,
}

/// Reply shape, resolved at the parse boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawJudgment {
    Flat(Judgment),
    /// Entity name and judgment, in reply order.
    Entities(Vec<(String, Judgment)>),
}

fn has_flat_fields(obj: &Map<String, Value>) -> bool {
    obj.contains_key("impact")
        && obj.contains_key("reasoning")
        && obj.get("confidence").is_some_and(Value::is_number)
}

fn judgment_from(obj: &Map<String, Value>, ctx: &str) -> Result<Judgment, ClassificationError> {
    let invalid = |what: String| ClassificationError::InvalidSchema(format!("{ctx}: {what}"));

    let impact = obj
        .get("impact")
        .and_then(Value::as_str)
        .and_then(Impact::from_label)
        .ok_or_else(|| invalid(format!("impact {:?} not in enumerated set", obj.get("impact"))))?;
    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| invalid("reasoning missing or empty".to_string()))?;
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("confidence is not numeric".to_string()))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(invalid(format!("confidence {confidence} outside 0.0..=1.0")));
    }

    Ok(Judgment {
        impact,
        reasoning: reasoning.to_string(),
        confidence,
    })
}

/// Parse reply text into one of the two accepted shapes.
pub fn parse_judgment(text: &str) -> Result<RawJudgment, ClassificationError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| ClassificationError::InvalidSchema("reply is not a JSON object".into()))?;

    if has_flat_fields(obj) {
        return judgment_from(obj, "top level").map(RawJudgment::Flat);
    }

    match obj.get("entities") {
        Some(Value::Object(entities)) if entities.is_empty() => Err(ClassificationError::EmptyEntities),
        Some(Value::Object(entities)) => {
            let mut out = Vec::with_capacity(entities.len());
            for (name, v) in entities {
                let inner = v.as_object().ok_or_else(|| {
                    ClassificationError::InvalidSchema(format!("entity {name}: not an object"))
                })?;
                out.push((name.clone(), judgment_from(inner, &format!("entity {name}"))?));
            }
            Ok(RawJudgment::Entities(out))
        }
        _ => Err(ClassificationError::InvalidSchema(
            "neither a flat judgment nor an entities mapping".into(),
        )),
    }
}

/// Majority between Positive and Negative; equal counts resolve to Neutral.
/// Neutral entries never win on count.
pub fn overall_impact<'a, I>(impacts: I) -> Impact
where
    I: IntoIterator<Item = &'a Impact>,
{
    let (mut pos, mut neg) = (0usize, 0usize);
    for i in impacts {
        match i {
            Impact::Positive => pos += 1,
            Impact::Negative => neg += 1,
            Impact::Neutral => {}
        }
    }
    if pos > neg {
        Impact::Positive
    } else if neg > pos {
        Impact::Negative
    } else {
        Impact::Neutral
    }
}

impl RawJudgment {
    /// Collapse into the canonical record.
    pub fn into_record(self) -> Result<SentimentRecord, ClassificationError> {
        match self {
            RawJudgment::Flat(j) => Ok(SentimentRecord {
                impact: j.impact,
                reasoning: j.reasoning,
                confidence: j.confidence,
            }),
            RawJudgment::Entities(entities) => {
                if entities.is_empty() {
                    return Err(ClassificationError::EmptyEntities);
                }
                let impact = overall_impact(entities.iter().map(|(_, j)| &j.impact));
                let reasoning = entities
                    .iter()
                    .map(|(name, j)| format!("{name}: {}", j.reasoning))
                    .collect::<Vec<_>>()
                    .join("; ");
                let confidence =
                    entities.iter().map(|(_, j)| j.confidence).sum::<f64>() / entities.len() as f64;
                Ok(SentimentRecord {
                    impact,
                    reasoning,
                    confidence: confidence.clamp(0.0, 1.0),
                })
            }
        }
    }
}

/// Parse and normalize a raw reply in one step.
pub fn normalize_reply(text: &str) -> Result<SentimentRecord, ClassificationError> {
    parse_judgment(text)?.into_record()
}

#[derive(Clone)]
pub struct SentimentClassifier {
    client: DynReasoningClient,
}

impl SentimentClassifier {
    pub fn new(client: DynReasoningClient) -> Self {
        Self { client }
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    pub async fn classify(&self, headline: &str) -> Result<SentimentRecord, ClassificationError> {
        let reply = self
            .client
            .complete(SYSTEM_PROMPT, &user_message(headline))
            .await?;
        let record = normalize_reply(&reply)?;
        tracing::debug!(
            target: "analyze",
            impact = %record.impact,
            confidence = record.confidence,
            "headline classified"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_reply_passes_through_unchanged() {
        let r = normalize_reply(r#"{"impact":"Positive","reasoning":"r","confidence":0.8}"#).unwrap();
        assert_eq!(
            r,
            SentimentRecord {
                impact: Impact::Positive,
                reasoning: "r".into(),
                confidence: 0.8,
            }
        );
    }

    #[test]
    fn integer_confidence_is_numeric() {
        let r = normalize_reply(r#"{"impact":"Negative","reasoning":"r","confidence":1}"#).unwrap();
        assert_eq!(r.confidence, 1.0);
    }

    #[test]
    fn flat_with_unknown_impact_is_invalid() {
        let err = normalize_reply(r#"{"impact":"Bullish","reasoning":"r","confidence":0.8}"#).unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidSchema(_)));
    }

    #[test]
    fn string_confidence_is_not_flat() {
        let err = normalize_reply(r#"{"impact":"Positive","reasoning":"r","confidence":"0.8"}"#).unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidSchema(_)));
    }

    #[test]
    fn entities_tie_resolves_neutral_and_averages() {
        let text = r#"{"entities":{
            "A":{"impact":"Positive","confidence":0.9,"reasoning":"x"},
            "B":{"impact":"Negative","confidence":0.5,"reasoning":"y"}}}"#;
        let r = normalize_reply(text).unwrap();
        assert_eq!(r.impact, Impact::Neutral);
        assert!((r.confidence - 0.7).abs() < 1e-9);
        assert_eq!(r.reasoning, "A: x; B: y");
    }

    #[test]
    fn entities_keep_reply_order_not_alphabetical() {
        let text = r#"{"entities":{
            "Zomato":{"impact":"Negative","confidence":0.6,"reasoning":"loss"},
            "Adani":{"impact":"Negative","confidence":0.8,"reasoning":"probe"}}}"#;
        let r = normalize_reply(text).unwrap();
        assert_eq!(r.reasoning, "Zomato: loss; Adani: probe");
        assert_eq!(r.impact, Impact::Negative);
    }

    #[test]
    fn neutral_majority_does_not_override_positive_lead() {
        let impacts = [Impact::Neutral, Impact::Neutral, Impact::Neutral, Impact::Positive];
        assert_eq!(overall_impact(impacts.iter()), Impact::Positive);
        let tie = [Impact::Neutral, Impact::Positive, Impact::Negative];
        assert_eq!(overall_impact(tie.iter()), Impact::Neutral);
    }

    #[test]
    fn empty_entities_is_its_own_error() {
        assert_eq!(
            normalize_reply(r#"{"entities":{}}"#).unwrap_err(),
            ClassificationError::EmptyEntities
        );
    }

    #[test]
    fn non_json_is_malformed() {
        let err = normalize_reply("Sure! The impact is positive.").unwrap_err();
        assert!(matches!(err, ClassificationError::MalformedResponse(_)));
    }

    #[test]
    fn json_without_either_shape_is_invalid() {
        for text in [r#"{"verdict":"up"}"#, r#"[1,2]"#, r#"{"entities":[]}"#] {
            let err = normalize_reply(text).unwrap_err();
            assert!(matches!(err, ClassificationError::InvalidSchema(_)), "{text}");
        }
    }

    #[test]
    fn bad_entity_fails_whole_reply() {
        let text = r#"{"entities":{"A":{"impact":"Positive","confidence":0.9,"reasoning":"x"},"B":{"impact":"Up"}}}"#;
        assert!(matches!(
            normalize_reply(text).unwrap_err(),
            ClassificationError::InvalidSchema(_)
        ));
    }
}
